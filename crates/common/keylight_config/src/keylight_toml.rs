use crate::ConfigError;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::time::Duration;

pub const CONFIG_FILE: &str = "keylight.toml";

/// LED class directory of the System76 three-zone keyboard backlight.
pub const DEFAULT_DEVICE_PATH: &str = "/sys/class/leds/system76::kbd_backlight";

#[derive(Deserialize, Debug, Default, Eq, PartialEq)]
pub struct KeylightConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub log: HashMap<String, String>,
}

impl KeylightConfig {
    /// Reads `keylight.toml` from the given directory.
    ///
    /// A missing file is not an error: all the settings then have their default values.
    pub fn try_new(config_root: &Utf8Path) -> Result<Self, ConfigError> {
        let config_path = config_root.join(CONFIG_FILE);

        match fs::read_to_string(&config_path) {
            Ok(contents) => {
                toml::from_str(contents.as_str()).map_err(|e| ConfigError::InvalidSyntax {
                    path: config_path,
                    reason: e.to_string(),
                })
            }
            Err(_) => Ok(Self::default()),
        }
    }
}

/// Which message bus the broker is exported on.
#[derive(Deserialize, Debug, Default, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    #[default]
    System,
    Session,
}

#[derive(Deserialize, Debug, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    #[serde(default)]
    pub bus: BusKind,

    /// When `false`, every remote caller is treated as authorized.
    ///
    /// Only meant for development on the session bus.
    #[serde(default = "BrokerConfig::default_enforce_authorization")]
    pub enforce_authorization: bool,

    #[serde(default = "BrokerConfig::default_authority_timeout_seconds")]
    pub authority_timeout_seconds: u64,
}

impl BrokerConfig {
    pub fn default_enforce_authorization() -> bool {
        true
    }

    pub fn default_authority_timeout_seconds() -> u64 {
        // Long enough for a user to answer an interactive authentication prompt
        600
    }

    pub fn authority_timeout(&self) -> Duration {
        Duration::from_secs(self.authority_timeout_seconds)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bus: BusKind::default(),
            enforce_authorization: BrokerConfig::default_enforce_authorization(),
            authority_timeout_seconds: BrokerConfig::default_authority_timeout_seconds(),
        }
    }
}

#[derive(Deserialize, Debug, Default, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// File receiving a copy of the denied requests, readable by root only.
    pub file: Option<Utf8PathBuf>,
}

#[derive(Deserialize, Debug, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    #[serde(default = "DeviceConfig::default_path")]
    pub path: Utf8PathBuf,
}

impl DeviceConfig {
    pub fn default_path() -> Utf8PathBuf {
        Utf8PathBuf::from(DEFAULT_DEVICE_PATH)
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            path: DeviceConfig::default_path(),
        }
    }
}
