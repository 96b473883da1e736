mod cli;
mod keylight_toml;
mod log_level;

pub use self::cli::*;
pub use self::keylight_toml::*;
pub use self::log_level::*;
pub use camino::Utf8Path as Path;
pub use camino::Utf8PathBuf as PathBuf;

/// Default location of `keylight.toml`
pub const DEFAULT_CONFIG_DIR: &str = "/etc/keylight";

/// Environment variable overriding [DEFAULT_CONFIG_DIR]
pub const CONFIG_DIR_ENV: &str = "KEYLIGHT_CONFIG_DIR";

pub fn get_config_dir() -> PathBuf {
    std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR))
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Toml syntax error in the config file '{path}': {reason}")]
    InvalidSyntax { path: PathBuf, reason: String },

    #[error("Invalid log level: {name:?}, supported levels are info, warn, error and debug")]
    InvalidLogLevel { name: String },

    #[error("Failed to open the audit log '{path}'")]
    AuditLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
