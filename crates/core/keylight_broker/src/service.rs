use crate::BrokerError;
use crate::WriteBroker;
use camino::Utf8Path;
use std::sync::Arc;
use tracing::warn;
use zbus::message::Header;

/// Errors returned to the D-Bus callers.
///
/// Messages are kept generic: the authority details of a denial are only logged.
#[derive(zbus::DBusError, Debug)]
#[zbus(prefix = "org.keylight.Broker1.Error")]
pub enum ServiceError {
    #[zbus(error)]
    ZBus(zbus::Error),
    PathNotAllowed(String),
    PermissionDenied(String),
    PathNotFound(String),
    IdentityUnavailable(String),
    WriteFailed(String),
}

impl From<BrokerError> for ServiceError {
    fn from(err: BrokerError) -> Self {
        match err {
            err @ BrokerError::PathNotAllowed(_) => ServiceError::PathNotAllowed(err.to_string()),
            err @ BrokerError::PermissionDenied => ServiceError::PermissionDenied(err.to_string()),
            err @ BrokerError::PathNotFound(_) => ServiceError::PathNotFound(err.to_string()),
            BrokerError::IdentityUnavailable { .. } => {
                ServiceError::IdentityUnavailable("Cannot identify the caller".to_string())
            }
            BrokerError::WriteFailed { path, source } => {
                ServiceError::WriteFailed(format!("Failed to write to '{path}': {source}"))
            }
        }
    }
}

/// The D-Bus face of the [WriteBroker].
pub struct BrokerService {
    broker: Arc<WriteBroker>,
}

impl BrokerService {
    pub fn new(broker: impl Into<Arc<WriteBroker>>) -> Self {
        BrokerService {
            broker: broker.into(),
        }
    }
}

#[zbus::interface(name = "org.keylight.Broker1")]
impl BrokerService {
    /// Writes a color to a keyboard zone file. Returns 0 on success.
    async fn set_color(
        &self,
        #[zbus(header)] header: Header<'_>,
        path: String,
        value: String,
    ) -> Result<i32, ServiceError> {
        let sender = remote_sender(&header)?;
        self.broker
            .set_control_value(Utf8Path::new(&path), &value, Some(&sender))
            .await?;
        Ok(0)
    }

    /// Writes a raw brightness value. Returns 0 on success.
    async fn set_brightness(
        &self,
        #[zbus(header)] header: Header<'_>,
        path: String,
        value: i32,
    ) -> Result<i32, ServiceError> {
        let sender = remote_sender(&header)?;
        self.broker
            .set_brightness(Utf8Path::new(&path), i64::from(value), Some(&sender))
            .await?;
        Ok(0)
    }
}

/// A message without sender cannot be attributed to any process.
///
/// It is rejected rather than served as a local call.
fn remote_sender(header: &Header<'_>) -> Result<String, ServiceError> {
    match header.sender() {
        Some(sender) => Ok(sender.to_string()),
        None => {
            warn!("Rejecting a request without sender");
            Err(BrokerError::IdentityUnavailable {
                sender: String::new(),
                reason: "no sender in the message header".to_string(),
            }
            .into())
        }
    }
}
