//! In-memory stand-ins for polkit, the bus daemon and the log sink.

use crate::authority::Authority;
use crate::authority::AuthorityError;
use crate::authority::AuthorizationResult;
use crate::authority::BusConnector;
use crate::identity::PeerIntrospection;
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use tracing::field::Field;
use tracing::field::Visit;
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

#[derive(Default)]
pub struct FakeIntrospection {
    peers: HashMap<String, (u32, u32)>,
}

impl FakeIntrospection {
    pub fn with_peer(mut self, sender: &str, pid: u32, uid: u32) -> Self {
        self.peers.insert(sender.to_string(), (pid, uid));
        self
    }

    fn peer(&self, sender: &str) -> anyhow::Result<(u32, u32)> {
        self.peers
            .get(sender)
            .copied()
            .ok_or_else(|| anyhow!("The connection does not exist: {sender}"))
    }
}

#[async_trait]
impl PeerIntrospection for FakeIntrospection {
    async fn process_id(&self, sender: &str) -> anyhow::Result<u32> {
        Ok(self.peer(sender)?.0)
    }

    async fn user_id(&self, sender: &str) -> anyhow::Result<u32> {
        Ok(self.peer(sender)?.1)
    }
}

enum Behaviour {
    Answer,
    Fail(AuthorityError),
    Hang,
}

struct FakeAuthorityState {
    behaviour: Behaviour,
    granted: Mutex<HashSet<u32>>,
    queries: Mutex<Vec<(u32, String)>>,
}

/// A polkit double. Clones share their state.
#[derive(Clone)]
pub struct FakeAuthority {
    state: Arc<FakeAuthorityState>,
}

impl FakeAuthority {
    fn with_behaviour(behaviour: Behaviour, granted: HashSet<u32>) -> Self {
        FakeAuthority {
            state: Arc::new(FakeAuthorityState {
                behaviour,
                granted: Mutex::new(granted),
                queries: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn granting(pids: impl IntoIterator<Item = u32>) -> Self {
        Self::with_behaviour(Behaviour::Answer, pids.into_iter().collect())
    }

    pub fn failing(error: AuthorityError) -> Self {
        Self::with_behaviour(Behaviour::Fail(error), HashSet::new())
    }

    pub fn hanging() -> Self {
        Self::with_behaviour(Behaviour::Hang, HashSet::new())
    }

    pub fn revoke(&self, pid: u32) {
        self.state.granted.lock().unwrap().remove(&pid);
    }

    pub fn queries(&self) -> Vec<(u32, String)> {
        self.state.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Authority for FakeAuthority {
    async fn check_authorization(
        &self,
        pid: u32,
        permission: &str,
    ) -> Result<AuthorizationResult, AuthorityError> {
        self.state
            .queries
            .lock()
            .unwrap()
            .push((pid, permission.to_string()));

        // Give concurrent requests a chance to interleave
        tokio::task::yield_now().await;

        match &self.state.behaviour {
            Behaviour::Answer => {
                let is_authorized = self.state.granted.lock().unwrap().contains(&pid);
                Ok(AuthorizationResult {
                    is_authorized,
                    is_challenge: false,
                    details: HashMap::from([(
                        "polkit.dismissed".to_string(),
                        (!is_authorized).to_string(),
                    )]),
                })
            }
            Behaviour::Fail(error) => Err(error.clone()),
            Behaviour::Hang => std::future::pending().await,
        }
    }
}

#[derive(Clone, Default)]
pub struct ConnectCount(Arc<AtomicUsize>);

impl ConnectCount {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out the given authorities in order, one per authority connection.
///
/// The bus daemon handle is always available.
pub struct FakeConnector {
    introspection: Arc<FakeIntrospection>,
    authorities: Mutex<VecDeque<FakeAuthority>>,
    introspection_connects: ConnectCount,
    authority_connects: ConnectCount,
}

impl FakeConnector {
    pub fn new(
        introspection: FakeIntrospection,
        authorities: impl IntoIterator<Item = FakeAuthority>,
    ) -> Self {
        FakeConnector {
            introspection: Arc::new(introspection),
            authorities: Mutex::new(authorities.into_iter().collect()),
            introspection_connects: ConnectCount::default(),
            authority_connects: ConnectCount::default(),
        }
    }

    /// Counts the authority connections.
    pub fn connect_count(&self) -> ConnectCount {
        self.authority_connects.clone()
    }

    pub fn introspection_count(&self) -> ConnectCount {
        self.introspection_connects.clone()
    }
}

#[async_trait]
impl BusConnector for FakeConnector {
    async fn introspection(&self) -> Result<Arc<dyn PeerIntrospection>, AuthorityError> {
        self.introspection_connects.increment();
        let introspection: Arc<dyn PeerIntrospection> = self.introspection.clone();
        Ok(introspection)
    }

    async fn authority(&self) -> Result<Arc<dyn Authority>, AuthorityError> {
        self.authority_connects.increment();
        let authority = self
            .authorities
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AuthorityError::Failed("no authority on the bus".into()))?;
        let authority: Arc<dyn Authority> = Arc::new(authority);
        Ok(authority)
    }
}

/// An event recorded by [CapturedEvents].
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub target: String,
    pub fields: HashMap<String, String>,
}

/// A tracing layer keeping every event in memory.
#[derive(Clone, Default)]
pub struct CapturedEvents(Arc<Mutex<Vec<CapturedEvent>>>);

impl CapturedEvents {
    /// Makes this layer the default subscriber of the current thread until the guard is dropped.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn with_target(&self, target: &str) -> Vec<CapturedEvent> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.target == target)
            .cloned()
            .collect()
    }
}

impl<S: tracing::Subscriber> Layer<S> for CapturedEvents {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = FieldRecorder::default();
        event.record(&mut fields);
        self.0.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            fields: fields.0,
        });
    }
}

#[derive(Default)]
struct FieldRecorder(HashMap<String, String>);

impl Visit for FieldRecorder {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}
