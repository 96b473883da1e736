use crate::identity::CallerIdentity;
use crate::identity::PeerIntrospection;
use async_trait::async_trait;
use keylight_config::AUDIT_TARGET;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::sync::OnceCell;
use tracing::warn;

/// The answer of the authority for one (process, permission) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationResult {
    pub is_authorized: bool,
    pub is_challenge: bool,
    pub details: HashMap<String, String>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorityError {
    /// The authority has no owner on the bus, typically because polkitd has been restarted.
    ///
    /// This is the only failure that causes the authority handle to be recreated.
    #[error("The authority service is not on the bus")]
    ServiceGone,

    #[error("The authority did not answer within {0:?}")]
    Timeout(Duration),

    #[error("The authority query failed: {0}")]
    Failed(String),
}

/// Returned when no decision could be obtained from the authority, even after reconnecting.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("The authority is unreachable")]
pub struct AuthorityUnreachable(#[source] pub AuthorityError);

/// The system-wide policy engine.
#[async_trait]
pub trait Authority: Send + Sync {
    /// Checks whether the process `pid` holds `permission`, allowing the authority to
    /// interactively authenticate the user.
    async fn check_authorization(
        &self,
        pid: u32,
        permission: &str,
    ) -> Result<AuthorizationResult, AuthorityError>;
}

/// Opens the bus handles of the broker.
///
/// The two handles are independent: identifying callers never requires the authority.
#[async_trait]
pub trait BusConnector: Send + Sync {
    /// Connects to the bus daemon, to identify the callers.
    async fn introspection(&self) -> Result<Arc<dyn PeerIntrospection>, AuthorityError>;

    /// Connects to the authority.
    async fn authority(&self) -> Result<Arc<dyn Authority>, AuthorityError>;
}

/// Owns the lazily created bus handles shared by all requests.
pub struct AuthorityContext {
    connector: Box<dyn BusConnector>,
    introspection: OnceCell<Arc<dyn PeerIntrospection>>,
    authority: Mutex<Option<Arc<dyn Authority>>>,
}

impl AuthorityContext {
    pub fn new(connector: impl BusConnector + 'static) -> Self {
        AuthorityContext {
            connector: Box::new(connector),
            introspection: OnceCell::new(),
            authority: Mutex::new(None),
        }
    }

    /// Returns the bus daemon handle, connecting on first use.
    pub async fn introspection(&self) -> Result<Arc<dyn PeerIntrospection>, AuthorityError> {
        self.introspection
            .get_or_try_init(|| self.connector.introspection())
            .await
            .cloned()
    }

    /// Returns the current authority handle, connecting first if there is none.
    ///
    /// The lock is held while connecting, so concurrent callers share a single connection attempt.
    pub async fn authority(&self) -> Result<Arc<dyn Authority>, AuthorityError> {
        let mut authority = self.authority.lock().await;
        if let Some(current) = authority.as_ref() {
            return Ok(current.clone());
        }

        let fresh = self.connector.authority().await?;
        *authority = Some(fresh.clone());
        Ok(fresh)
    }

    /// Drops the cached authority handle, unless it has already been replaced since `stale`
    /// was obtained.
    pub async fn invalidate(&self, stale: &Arc<dyn Authority>) {
        let mut authority = self.authority.lock().await;
        if authority
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, stale))
        {
            *authority = None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationSettings {
    /// When `false`, every caller is authorized without asking the authority.
    pub enforce: bool,
    /// Upper bound on a single authority query.
    pub timeout: Duration,
}

impl Default for AuthorizationSettings {
    fn default() -> Self {
        AuthorizationSettings {
            enforce: true,
            timeout: Duration::from_secs(600),
        }
    }
}

pub struct AuthorizationClient {
    context: Arc<AuthorityContext>,
    settings: AuthorizationSettings,
}

impl AuthorizationClient {
    pub fn new(context: Arc<AuthorityContext>, settings: AuthorizationSettings) -> Self {
        AuthorizationClient { context, settings }
    }

    /// Asks the authority whether `caller` holds `permission`.
    ///
    /// A request without caller comes from within the broker process and is always authorized.
    /// A fresh decision is requested on each call.
    pub async fn authorize(
        &self,
        caller: Option<&CallerIdentity>,
        permission: &str,
    ) -> Result<bool, AuthorityUnreachable> {
        let Some(caller) = caller else {
            return Ok(true);
        };
        if !self.settings.enforce {
            return Ok(true);
        }

        let mut reconnected = false;
        loop {
            let authority = self
                .context
                .authority()
                .await
                .map_err(AuthorityUnreachable)?;

            match self.check(authority.as_ref(), caller.pid, permission).await {
                Ok(result) => {
                    // is_challenge is ignored: interaction has been allowed already
                    if !result.is_authorized {
                        warn!(
                            target: AUDIT_TARGET,
                            sender = %caller.sender,
                            pid = caller.pid,
                            permission,
                            details = ?result.details,
                            "Caller is not authorized"
                        );
                    }
                    return Ok(result.is_authorized);
                }
                Err(AuthorityError::ServiceGone) if !reconnected => {
                    warn!("The authority has left the bus, reconnecting");
                    self.context.invalidate(&authority).await;
                    reconnected = true;
                }
                Err(err) => return Err(AuthorityUnreachable(err)),
            }
        }
    }

    async fn check(
        &self,
        authority: &dyn Authority,
        pid: u32,
        permission: &str,
    ) -> Result<AuthorizationResult, AuthorityError> {
        let timeout = self.settings.timeout;
        tokio::time::timeout(
            timeout,
            authority.check_authorization(pid, permission),
        )
        .await
        .map_err(|_| AuthorityError::Timeout(timeout))?
    }
}
