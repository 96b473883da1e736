use camino::Utf8PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum DeviceError {
    #[error("Failed to read '{path}'")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to '{path}'")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Brightness {0} does not fit in the broker interface")]
    OutOfRange(u32),

    #[error("Unexpected content in '{path}': {content:?}")]
    Parse { path: Utf8PathBuf, content: String },

    #[error("No zone named '{0}'")]
    UnknownZone(String),

    #[error("This keyboard has no color zones")]
    NoColor,

    #[error("{reason}")]
    Broker {
        kind: BrokerFailure,
        reason: String,
    },
}

/// Why the broker refused or failed a write.
///
/// Derived from the name of the D-Bus error returned by `keylightd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::EnumString)]
pub enum BrokerFailure {
    PathNotAllowed,
    PermissionDenied,
    PathNotFound,
    IdentityUnavailable,
    WriteFailed,
    /// The broker could not be reached or answered with an unknown error.
    #[strum(disabled)]
    Unavailable,
}

impl DeviceError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>) -> impl FnOnce(std::io::Error) -> DeviceError {
        let path = path.into();
        move |source| DeviceError::Io { path, source }
    }

    pub(crate) fn write(
        path: impl Into<Utf8PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> DeviceError {
        let path = path.into();
        move |source| DeviceError::Write { path, source }
    }

    /// The broker failure behind this error, if any.
    pub fn broker_failure(&self) -> Option<BrokerFailure> {
        match self {
            DeviceError::Broker { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
