pub mod fs;

pub use fs::TempSysfs;
pub use fs::TempSysfsFile;
