use camino::Utf8PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum BrokerError {
    #[error("'{0}' is not a keyboard backlight control file")]
    PathNotAllowed(Utf8PathBuf),

    #[error("Not authorized to change the keyboard backlight")]
    PermissionDenied,

    #[error("Control file '{0}' does not exist")]
    PathNotFound(Utf8PathBuf),

    #[error("Cannot identify the sender {sender}: {reason}")]
    IdentityUnavailable { sender: String, reason: String },

    #[error("Failed to write to '{path}'")]
    WriteFailed {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
