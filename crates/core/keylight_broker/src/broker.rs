use crate::authority::AuthorityContext;
use crate::authority::AuthorizationClient;
use crate::authority::AuthorizationSettings;
use crate::guard::PathGuard;
use crate::identity::CallerIdentity;
use crate::identity::PeerIdentityResolver;
use crate::BrokerError;
use crate::SET_COLOR_PERMISSION;
use camino::Utf8Path;
use keylight_config::AUDIT_TARGET;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::error;
use tracing::info;
use tracing::warn;

/// Writes keyboard control files on behalf of authorized callers.
///
/// Before any write, in this order:
/// - the sender of the request is identified,
/// - the path must be allow-listed, unless the sender runs as root,
/// - the authority must grant [SET_COLOR_PERMISSION] to the sender.
///
/// Passing the authorization step is not enough: the path check is applied independently.
pub struct WriteBroker {
    guard: PathGuard,
    identity: PeerIdentityResolver,
    authorization: AuthorizationClient,
}

impl WriteBroker {
    pub fn new(
        guard: PathGuard,
        context: Arc<AuthorityContext>,
        settings: AuthorizationSettings,
    ) -> Self {
        WriteBroker {
            guard,
            identity: PeerIdentityResolver::new(context.clone()),
            authorization: AuthorizationClient::new(context, settings),
        }
    }

    /// Writes `value` to the control file at `path`.
    ///
    /// `sender` is the unique bus name of the caller; `None` for calls made from within
    /// the broker process, which are not submitted to the authority but are still
    /// restricted to the allow-listed paths.
    pub async fn set_control_value(
        &self,
        path: &Utf8Path,
        value: &str,
        sender: Option<&str>,
    ) -> Result<(), BrokerError> {
        let caller = match sender {
            Some(sender) => Some(self.identity.resolve(sender).await?),
            None => None,
        };

        self.check_path(path, caller.as_ref())?;
        self.check_permission(caller.as_ref()).await?;

        write_control_file(path, value).await?;
        info!(
            %path,
            value,
            sender = sender.unwrap_or("local"),
            "Control file updated"
        );
        Ok(())
    }

    /// Writes a raw brightness value to the control file at `path`.
    pub async fn set_brightness(
        &self,
        path: &Utf8Path,
        value: i64,
        sender: Option<&str>,
    ) -> Result<(), BrokerError> {
        self.set_control_value(path, &value.to_string(), sender)
            .await
    }

    fn check_path(
        &self,
        path: &Utf8Path,
        caller: Option<&CallerIdentity>,
    ) -> Result<(), BrokerError> {
        let is_superuser = caller.is_some_and(CallerIdentity::is_superuser);
        self.guard.validate(path, is_superuser).inspect_err(|_| {
            warn!(
                target: AUDIT_TARGET,
                %path,
                sender = caller.map(|c| c.sender.as_str()).unwrap_or("local"),
                pid = caller.map(|c| c.pid),
                "Write to a path outside of the allow-list rejected"
            );
        })
    }

    async fn check_permission(&self, caller: Option<&CallerIdentity>) -> Result<(), BrokerError> {
        match self
            .authorization
            .authorize(caller, SET_COLOR_PERMISSION)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(BrokerError::PermissionDenied),
            Err(err) => {
                error!(
                    sender = caller.map(|c| c.sender.as_str()),
                    permission = SET_COLOR_PERMISSION,
                    "Denying request, no answer from the authority: {:#}",
                    anyhow::Error::from(err)
                );
                Err(BrokerError::PermissionDenied)
            }
        }
    }
}

/// Replaces the content of an existing file.
///
/// The file is never created: a missing control file means the hardware attribute is absent.
async fn write_control_file(path: &Utf8Path, value: &str) -> Result<(), BrokerError> {
    let write_error = |source: std::io::Error| {
        if source.kind() == ErrorKind::NotFound {
            BrokerError::PathNotFound(path.to_owned())
        } else {
            BrokerError::WriteFailed {
                path: path.to_owned(),
                source,
            }
        }
    };

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(write_error)?;
    file.write_all(value.as_bytes()).await.map_err(write_error)?;
    file.flush().await.map_err(write_error)?;
    Ok(())
}
