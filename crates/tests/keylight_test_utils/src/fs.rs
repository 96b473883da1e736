use camino::Utf8Path;
use camino::Utf8PathBuf;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary stand-in for an LED class directory such as
/// `/sys/class/leds/system76::kbd_backlight`.
#[derive(Debug, Clone)]
pub struct TempSysfs {
    _temp_dir: Arc<TempDir>,
    current_path: Utf8PathBuf,
}

#[derive(Debug, Clone)]
pub struct TempSysfsFile {
    file_path: Utf8PathBuf,
}

impl Default for TempSysfs {
    fn default() -> Self {
        let temp_dir = if let Ok(dir) = std::env::var("TEMP_DIR_ROOT") {
            TempDir::new_in(dir).unwrap()
        } else {
            TempDir::new().unwrap()
        };
        let current_path = Utf8Path::from_path(temp_dir.path()).unwrap().to_owned();
        TempSysfs {
            _temp_dir: Arc::new(temp_dir),
            current_path,
        }
    }
}

impl TempSysfs {
    pub fn new() -> Self {
        Self::default()
    }

    /// A three-zone RGB keyboard, half lit, with every zone white.
    pub fn rgb_keyboard(max_brightness: u32) -> Self {
        let sysfs = Self::new();
        sysfs
            .file("max_brightness")
            .with_raw_content(&format!("{max_brightness}\n"));
        sysfs
            .file("brightness")
            .with_raw_content(&format!("{}\n", max_brightness / 2));
        for zone in ["left", "center", "right"] {
            sysfs
                .file(&format!("color_{zone}"))
                .with_raw_content("FFFFFF\n");
        }
        sysfs
    }

    pub fn file(&self, file_name: &str) -> TempSysfsFile {
        let path = self.current_path.join(file_name);

        if !path.exists() {
            let file = fs::File::create(&path).unwrap();
            file.sync_all().unwrap();
        };
        TempSysfsFile { file_path: path }
    }

    pub fn utf8_path(&self) -> &Utf8Path {
        self.current_path.as_path()
    }

    /// Reads a file of this directory, panicking if it doesn't exist.
    pub fn read(&self, file_name: &str) -> String {
        fs::read_to_string(self.current_path.join(file_name)).unwrap()
    }
}

impl TempSysfsFile {
    /// Replaces the content of the file.
    pub fn with_raw_content(self, content: &str) -> Self {
        fs::write(&self.file_path, content).unwrap();
        self
    }

    pub fn utf8_path(&self) -> &Utf8Path {
        self.file_path.as_path()
    }

    pub fn utf8_path_buf(&self) -> Utf8PathBuf {
        self.file_path.clone()
    }

    pub fn content(&self) -> String {
        fs::read_to_string(&self.file_path).unwrap()
    }
}
