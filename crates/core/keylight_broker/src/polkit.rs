//! References:
//!  - https://www.freedesktop.org/software/polkit/docs/latest/eggdbus-interface-org.freedesktop.PolicyKit1.Authority.html
//!  - https://dbus.freedesktop.org/doc/dbus-specification.html#bus-messages-get-connection-unix-process-id

use crate::authority::Authority;
use crate::authority::AuthorityError;
use crate::authority::AuthorizationResult;
use crate::authority::BusConnector;
use crate::identity::PeerIntrospection;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use zbus::fdo::DBusProxy;
use zbus::names::BusName;
use zbus::proxy::CacheProperties;
use zbus::zvariant::Value;
use zbus::Connection;

/// D-Bus errors meaning that nobody owns the authority name anymore.
const SERVICE_GONE_ERRORS: &[&str] = &[
    "org.freedesktop.DBus.Error.ServiceUnknown",
    "org.freedesktop.DBus.Error.NameHasNoOwner",
];

/// If the subject can obtain the authorization through authentication, and an authentication
/// agent is available, then attempt to do so.
const ALLOW_USER_INTERACTION: u32 = 1;

#[zbus::proxy(
    interface = "org.freedesktop.PolicyKit1.Authority",
    default_service = "org.freedesktop.PolicyKit1",
    default_path = "/org/freedesktop/PolicyKit1/Authority"
)]
trait PolicyKitAuthority {
    /// CheckAuthorization method
    fn check_authorization(
        &self,
        subject: &(&str, HashMap<&str, Value<'_>>),
        action_id: &str,
        details: HashMap<&str, &str>,
        flags: u32,
        cancellation_id: &str,
    ) -> zbus::Result<(bool, bool, HashMap<String, String>)>;
}

impl From<zbus::Error> for AuthorityError {
    fn from(err: zbus::Error) -> Self {
        let service_gone = match &err {
            zbus::Error::MethodError(name, _, _) => SERVICE_GONE_ERRORS.contains(&name.as_str()),
            zbus::Error::FDO(fdo) => matches!(
                **fdo,
                zbus::fdo::Error::ServiceUnknown(_) | zbus::fdo::Error::NameHasNoOwner(_)
            ),
            _ => false,
        };

        if service_gone {
            AuthorityError::ServiceGone
        } else {
            AuthorityError::Failed(err.to_string())
        }
    }
}

/// The polkit authority, reached over the system bus.
pub struct PolkitAuthority {
    proxy: PolicyKitAuthorityProxy<'static>,
}

impl PolkitAuthority {
    pub async fn new(connection: &Connection) -> Result<Self, AuthorityError> {
        let proxy = PolicyKitAuthorityProxy::builder(connection)
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(PolkitAuthority { proxy })
    }
}

#[async_trait]
impl Authority for PolkitAuthority {
    async fn check_authorization(
        &self,
        pid: u32,
        permission: &str,
    ) -> Result<AuthorizationResult, AuthorityError> {
        // The start time is left to polkit, which looks it up from the pid
        let subject_details = HashMap::from([
            ("pid", Value::from(pid)),
            ("start-time", Value::from(0u64)),
        ]);
        let subject = ("unix-process", subject_details);

        let (is_authorized, is_challenge, details) = self
            .proxy
            .check_authorization(
                &subject,
                permission,
                HashMap::new(),
                ALLOW_USER_INTERACTION,
                "",
            )
            .await?;

        debug!(pid, permission, is_authorized, "Authority answered");
        Ok(AuthorizationResult {
            is_authorized,
            is_challenge,
            details,
        })
    }
}

/// The bus daemon itself, used to identify the peers.
pub struct DBusIntrospection {
    proxy: DBusProxy<'static>,
}

impl DBusIntrospection {
    pub async fn new(connection: &Connection) -> zbus::Result<Self> {
        let proxy = DBusProxy::builder(connection)
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(DBusIntrospection { proxy })
    }
}

#[async_trait]
impl PeerIntrospection for DBusIntrospection {
    async fn process_id(&self, sender: &str) -> anyhow::Result<u32> {
        let name = BusName::try_from(sender)?;
        Ok(self.proxy.get_connection_unix_process_id(name).await?)
    }

    async fn user_id(&self, sender: &str) -> anyhow::Result<u32> {
        let name = BusName::try_from(sender)?;
        Ok(self.proxy.get_connection_unix_user(name).await?)
    }
}

/// Connects the broker to polkit and to the bus daemon.
pub struct ZbusConnector {
    connection: Connection,
    authority_on_system_bus: bool,
}

impl ZbusConnector {
    /// Both polkit and the callers are reached through the given connection.
    pub fn new(connection: Connection) -> Self {
        ZbusConnector {
            connection,
            authority_on_system_bus: false,
        }
    }

    /// The callers are on the given connection, but polkit is reached through a system bus
    /// connection opened on demand.
    ///
    /// Used when the broker is exported on the session bus.
    pub fn with_system_authority(connection: Connection) -> Self {
        ZbusConnector {
            connection,
            authority_on_system_bus: true,
        }
    }
}

#[async_trait]
impl BusConnector for ZbusConnector {
    async fn introspection(&self) -> Result<Arc<dyn PeerIntrospection>, AuthorityError> {
        let introspection = DBusIntrospection::new(&self.connection).await?;
        debug!("Created the bus daemon handle");
        Ok(Arc::new(introspection))
    }

    async fn authority(&self) -> Result<Arc<dyn Authority>, AuthorityError> {
        let authority = if self.authority_on_system_bus {
            let system_bus = Connection::system().await?;
            PolkitAuthority::new(&system_bus).await?
        } else {
            PolkitAuthority::new(&self.connection).await?
        };
        debug!("Created the authority handle");
        Ok(Arc::new(authority))
    }
}
