use crate::authority::AuthorityContext;
use crate::BrokerError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// The process behind a D-Bus request.
///
/// Created for each request and dropped once the request has been served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The unique bus name of the caller, e.g. `:1.42`
    pub sender: String,
    pub pid: u32,
    pub uid: u32,
}

impl CallerIdentity {
    pub fn is_superuser(&self) -> bool {
        self.uid == 0
    }
}

/// Queries the message bus about the peers connected to it.
#[async_trait]
pub trait PeerIntrospection: Send + Sync {
    /// Returns the process id of the connection owning the given unique name.
    async fn process_id(&self, sender: &str) -> anyhow::Result<u32>;

    /// Returns the uid of the connection owning the given unique name.
    async fn user_id(&self, sender: &str) -> anyhow::Result<u32>;
}

/// Resolves the identity of a sender using the bus daemon handle cached by the
/// [AuthorityContext].
///
/// The authority handle is never opened here.
pub struct PeerIdentityResolver {
    context: Arc<AuthorityContext>,
}

impl PeerIdentityResolver {
    pub fn new(context: Arc<AuthorityContext>) -> Self {
        PeerIdentityResolver { context }
    }

    pub async fn resolve(&self, sender: &str) -> Result<CallerIdentity, BrokerError> {
        let unavailable = |reason: String| BrokerError::IdentityUnavailable {
            sender: sender.to_string(),
            reason,
        };

        let introspection = self
            .context
            .introspection()
            .await
            .map_err(|err| unavailable(err.to_string()))?;

        let pid = introspection
            .process_id(sender)
            .await
            .map_err(|err| unavailable(format!("{err:#}")))?;
        let uid = introspection
            .user_id(sender)
            .await
            .map_err(|err| unavailable(format!("{err:#}")))?;

        debug!(sender, pid, uid, "Resolved caller identity");
        Ok(CallerIdentity {
            sender: sender.to_string(),
            pid,
            uid,
        })
    }
}
