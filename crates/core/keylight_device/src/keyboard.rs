use crate::percent_to_raw;
use crate::raw_to_percent;
use crate::zone::zone_id;
use crate::ControlWriter;
use crate::DeviceError;
use crate::KeyboardKind;
use crate::KeyboardProfile;
use crate::Zone;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use std::sync::Arc;
use tracing::warn;

const BRIGHTNESS: &str = "brightness";
const MAX_BRIGHTNESS: &str = "max_brightness";

/// A backlit keyboard exposed as an LED class directory.
///
/// The state is read from the directory on each call, never cached.
pub struct Keyboard {
    dir: Utf8PathBuf,
    profile: KeyboardProfile,
    writer: Arc<dyn ControlWriter>,
}

impl Keyboard {
    pub fn new(dir: impl Into<Utf8PathBuf>, writer: impl ControlWriter + 'static) -> Self {
        Keyboard {
            dir: dir.into(),
            profile: KeyboardProfile::default(),
            writer: Arc::new(writer),
        }
    }

    pub fn with_profile(self, profile: KeyboardProfile) -> Self {
        Keyboard { profile, ..self }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn kind(&self) -> KeyboardKind {
        self.profile.kind
    }

    pub fn profile(&self) -> &KeyboardProfile {
        &self.profile
    }

    pub fn max_brightness(&self) -> Result<u32, DeviceError> {
        self.read_number(MAX_BRIGHTNESS)
    }

    pub fn raw_brightness(&self) -> Result<u32, DeviceError> {
        self.read_number(BRIGHTNESS)
    }

    /// The brightness as a percentage of the max brightness.
    pub fn brightness(&self) -> Result<u8, DeviceError> {
        let max = self.max_brightness()?;
        let raw = self.raw_brightness()?;
        Ok(raw_to_percent(raw, max))
    }

    /// Sets the brightness to `percent` of the max brightness.
    ///
    /// Values outside `[0, 100]` are clamped. Returns the raw value sent to the broker.
    pub async fn set_brightness(&self, percent: i64) -> Result<u32, DeviceError> {
        if !(0..=100).contains(&percent) {
            warn!(percent, "Brightness out of range, clamped to [0, 100]");
        }
        let max = self.max_brightness()?;
        let raw = percent_to_raw(percent, max);
        self.writer
            .set_brightness(&self.dir.join(BRIGHTNESS), raw)
            .await?;
        Ok(raw)
    }

    /// Sets the raw brightness, clamped to `[0, max_brightness]`.
    pub async fn set_raw_brightness(&self, raw: i64) -> Result<u32, DeviceError> {
        let max = self.max_brightness()?;
        let clamped = raw.clamp(0, i64::from(max)) as u32;
        if i64::from(clamped) != raw {
            warn!(raw, max, "Raw brightness out of range, clamped to {clamped}");
        }
        self.writer
            .set_brightness(&self.dir.join(BRIGHTNESS), clamped)
            .await?;
        Ok(clamped)
    }

    /// The color zones found in the directory, sorted by id.
    pub fn zones(&self) -> Result<Vec<Zone>, DeviceError> {
        if !self.kind().has_color() {
            return Ok(vec![]);
        }

        let mut zones = Vec::new();
        for entry in self.dir.read_dir_utf8().map_err(DeviceError::io(&self.dir))? {
            let entry = entry.map_err(DeviceError::io(&self.dir))?;
            if let Some(id) = zone_id(entry.file_name()) {
                zones.push(Zone::new(id, entry.path().to_owned(), self.writer.clone()));
            }
        }
        zones.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(zones)
    }

    pub fn zone(&self, id: &str) -> Result<Zone, DeviceError> {
        self.zones()?
            .into_iter()
            .find(|zone| zone.id() == id)
            .ok_or_else(|| DeviceError::UnknownZone(id.to_string()))
    }

    /// Sets every zone to `value`, with one broker call per zone.
    pub async fn set_color(&self, value: &str) -> Result<(), DeviceError> {
        let zones = self.zones()?;
        if zones.is_empty() {
            return Err(DeviceError::NoColor);
        }
        for zone in zones {
            zone.set_color(value).await?;
        }
        Ok(())
    }

    fn read_number(&self, file_name: &str) -> Result<u32, DeviceError> {
        let path = self.dir.join(file_name);
        let content = std::fs::read_to_string(&path).map_err(DeviceError::io(&path))?;
        content
            .trim()
            .parse()
            .map_err(|_| DeviceError::Parse { path, content })
    }
}
