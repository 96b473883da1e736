use crate::BrokerFailure;
use crate::DeviceError;
use camino::Utf8Path;
use std::str::FromStr;
use tokio::sync::OnceCell;
use tracing::debug;

const ERROR_PREFIX: &str = "org.keylight.Broker1.Error.";

/// Applies writes to the keyboard control files.
#[async_trait::async_trait]
pub trait ControlWriter: Send + Sync {
    async fn set_color(&self, path: &Utf8Path, value: &str) -> Result<(), DeviceError>;

    async fn set_brightness(&self, path: &Utf8Path, raw: u32) -> Result<(), DeviceError>;
}

#[zbus::proxy(
    interface = "org.keylight.Broker1",
    default_service = "org.keylight.Broker",
    default_path = "/org/keylight/Broker"
)]
trait Broker {
    fn set_color(&self, path: &str, value: &str) -> zbus::Result<i32>;

    fn set_brightness(&self, path: &str, value: i32) -> zbus::Result<i32>;
}

/// The bus on which `keylightd` is expected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    #[default]
    System,
    Session,
}

/// Sends the writes to `keylightd` over D-Bus.
///
/// The bus connection is only opened on the first write.
pub struct BrokerClient {
    bus: Bus,
    proxy: OnceCell<BrokerProxy<'static>>,
}

impl BrokerClient {
    pub fn new(bus: Bus) -> Self {
        BrokerClient {
            bus,
            proxy: OnceCell::new(),
        }
    }

    async fn proxy(&self) -> Result<&BrokerProxy<'static>, DeviceError> {
        self.proxy
            .get_or_try_init(|| async {
                let connection = match self.bus {
                    Bus::System => zbus::Connection::system().await,
                    Bus::Session => zbus::Connection::session().await,
                }
                .map_err(broker_error)?;
                BrokerProxy::new(&connection).await.map_err(broker_error)
            })
            .await
    }
}

#[async_trait::async_trait]
impl ControlWriter for BrokerClient {
    async fn set_color(&self, path: &Utf8Path, value: &str) -> Result<(), DeviceError> {
        debug!(%path, value, "SetColor");
        self.proxy()
            .await?
            .set_color(path.as_str(), value)
            .await
            .map_err(broker_error)?;
        Ok(())
    }

    async fn set_brightness(&self, path: &Utf8Path, raw: u32) -> Result<(), DeviceError> {
        debug!(%path, raw, "SetBrightness");
        let value = wire_brightness(raw)?;
        self.proxy()
            .await?
            .set_brightness(path.as_str(), value)
            .await
            .map_err(broker_error)?;
        Ok(())
    }
}

/// `SetBrightness` takes a signed 32-bit value.
fn wire_brightness(raw: u32) -> Result<i32, DeviceError> {
    i32::try_from(raw).map_err(|_| DeviceError::OutOfRange(raw))
}

fn broker_error(err: zbus::Error) -> DeviceError {
    match err {
        zbus::Error::MethodError(name, message, _) => {
            let kind = name
                .as_str()
                .strip_prefix(ERROR_PREFIX)
                .and_then(|kind| BrokerFailure::from_str(kind).ok())
                .unwrap_or(BrokerFailure::Unavailable);
            let reason = message.unwrap_or_else(|| name.to_string());
            DeviceError::Broker { kind, reason }
        }
        err => DeviceError::Broker {
            kind: BrokerFailure::Unavailable,
            reason: format!("Cannot reach the keylight broker: {err}"),
        },
    }
}

/// Writes the control files directly, without any broker.
///
/// Only works for a process allowed to write the files.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectWriter;

#[async_trait::async_trait]
impl ControlWriter for DirectWriter {
    async fn set_color(&self, path: &Utf8Path, value: &str) -> Result<(), DeviceError> {
        write_existing(path, value)
    }

    async fn set_brightness(&self, path: &Utf8Path, raw: u32) -> Result<(), DeviceError> {
        write_existing(path, &raw.to_string())
    }
}

fn write_existing(path: &Utf8Path, value: &str) -> Result<(), DeviceError> {
    use std::io::Write;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(DeviceError::write(path))?;
    file.write_all(value.as_bytes())
        .map_err(DeviceError::write(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use keylight_test_utils::TempSysfs;

    #[test]
    fn broker_failures_are_named_after_the_dbus_errors() {
        assert_eq!(
            BrokerFailure::from_str("PathNotAllowed").unwrap(),
            BrokerFailure::PathNotAllowed
        );
        assert_eq!(
            BrokerFailure::from_str("PathNotFound").unwrap(),
            BrokerFailure::PathNotFound
        );
        assert!(BrokerFailure::from_str("Unavailable").is_err());
    }

    #[test]
    fn transport_errors_mean_the_broker_is_unavailable() {
        let err = broker_error(zbus::Error::InvalidReply);
        assert_eq!(err.broker_failure(), Some(BrokerFailure::Unavailable));
    }

    #[tokio::test]
    async fn direct_writer_replaces_the_content() {
        let sysfs = TempSysfs::rgb_keyboard(255);
        let path = sysfs.utf8_path().join("color_left");

        DirectWriter.set_color(&path, "00FF00").await.unwrap();

        assert_eq!(sysfs.read("color_left"), "00FF00");
    }

    #[tokio::test]
    async fn direct_writer_does_not_create_files() {
        let sysfs = TempSysfs::new();
        let path = sysfs.utf8_path().join("brightness");

        let res = DirectWriter.set_brightness(&path, 12).await;

        assert_matches!(res, Err(DeviceError::Write { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn write_failures_are_reported_as_such() {
        let sysfs = TempSysfs::new();
        let path = sysfs.utf8_path().join("brightness");

        let err = write_existing(&path, "12").unwrap_err();

        assert_eq!(err.to_string(), format!("Failed to write to '{path}'"));
    }

    #[test]
    fn brightness_beyond_the_wire_range_is_rejected() {
        assert_eq!(wire_brightness(255).unwrap(), 255);
        assert_eq!(wire_brightness(i32::MAX as u32).unwrap(), i32::MAX);
        assert_matches!(
            wire_brightness(i32::MAX as u32 + 1),
            Err(DeviceError::OutOfRange(raw)) if raw == 2_147_483_648
        );
    }
}
