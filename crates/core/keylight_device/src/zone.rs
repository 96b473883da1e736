use crate::ControlWriter;
use crate::DeviceError;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use std::sync::Arc;

/// Files named `color_<id>` hold the color of one zone.
pub const ZONE_FILE_PREFIX: &str = "color_";

/// A region of the keyboard with its own color.
#[derive(Clone)]
pub struct Zone {
    id: String,
    path: Utf8PathBuf,
    writer: Arc<dyn ControlWriter>,
}

impl std::fmt::Debug for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Zone")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Zone {
    pub(crate) fn new(id: &str, path: Utf8PathBuf, writer: Arc<dyn ControlWriter>) -> Self {
        Zone {
            id: id.to_string(),
            path,
            writer,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The current color, as the first line of the zone file.
    pub fn color(&self) -> Result<String, DeviceError> {
        let content = std::fs::read_to_string(&self.path).map_err(DeviceError::io(&self.path))?;
        Ok(content.lines().next().unwrap_or_default().trim().to_string())
    }

    /// Asks for `value` to be written verbatim to the zone file.
    pub async fn set_color(&self, value: &str) -> Result<(), DeviceError> {
        self.writer.set_color(&self.path, value).await
    }
}

/// The zone id of a file name, if it is a zone file.
pub(crate) fn zone_id(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(ZONE_FILE_PREFIX)
        .filter(|id| !id.is_empty())
}
