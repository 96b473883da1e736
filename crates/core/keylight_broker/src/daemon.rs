use crate::authority::AuthorityContext;
use crate::authority::AuthorizationSettings;
use crate::guard::PathGuard;
use crate::polkit::ZbusConnector;
use crate::BrokerService;
use crate::WriteBroker;
use crate::BUS_NAME;
use crate::OBJECT_PATH;
use anyhow::Context;
use futures::StreamExt;
use keylight_config::get_config_dir;
use keylight_config::log_init;
use keylight_config::BusKind;
use keylight_config::KeylightConfig;
use keylight_config::LogConfigArgs;
use keylight_config::PathBuf;
use signal_hook::consts::signal::*;
use signal_hook_tokio::Signals;
use std::sync::Arc;
use tracing::debug;
use tracing::info;
use tracing::warn;
use zbus::Connection;

#[derive(Debug, clap::Parser)]
#[clap(
    name = "keylightd",
    version = clap::crate_version!(),
    about = clap::crate_description!()
)]
pub struct DaemonOpt {
    #[command(flatten)]
    pub log_args: LogConfigArgs,

    /// Start the broker from custom path
    ///
    /// [env: KEYLIGHT_CONFIG_DIR, default: /etc/keylight]
    #[clap(
        long = "config-dir",
        default_value = get_config_dir().into_string(),
        hide_env_values = true,
        hide_default_value = true,
    )]
    pub config_dir: PathBuf,

    /// Export the broker on the session bus instead of the system bus
    #[clap(long)]
    pub session: bool,

    /// Accept every request without asking polkit
    ///
    /// WARNING: any local user can then change the keyboard backlight.
    #[clap(long)]
    pub no_enforce: bool,
}

pub async fn run(opt: DaemonOpt) -> anyhow::Result<()> {
    let config = KeylightConfig::try_new(&opt.config_dir)?;
    log_init("keylightd", &opt.log_args, &opt.config_dir)?;

    let bus = if opt.session {
        BusKind::Session
    } else {
        config.broker.bus
    };
    let settings = AuthorizationSettings {
        enforce: config.broker.enforce_authorization && !opt.no_enforce,
        timeout: config.broker.authority_timeout(),
    };
    if !nix::unistd::Uid::effective().is_root() {
        warn!("Not running as root: the keyboard control files are likely read-only");
    }
    if !settings.enforce {
        warn!("Authorization is not enforced: every caller may change the keyboard backlight");
    }

    let (connection, connector) = match bus {
        BusKind::System => {
            let connection = Connection::system()
                .await
                .context("Failed to connect to the system bus")?;
            (connection.clone(), ZbusConnector::new(connection))
        }
        BusKind::Session => {
            let connection = Connection::session()
                .await
                .context("Failed to connect to the session bus")?;
            (
                connection.clone(),
                ZbusConnector::with_system_authority(connection),
            )
        }
    };

    let guard = PathGuard::default();
    for path in guard.allowed_paths() {
        debug!(%path, "Control file open to authorized callers");
    }

    let context = Arc::new(AuthorityContext::new(connector));
    let broker = WriteBroker::new(guard, context, settings);

    connection
        .object_server()
        .at(OBJECT_PATH, BrokerService::new(broker))
        .await
        .with_context(|| format!("Failed to export the broker at {OBJECT_PATH}"))?;
    connection
        .request_name(BUS_NAME)
        .await
        .with_context(|| format!("Failed to acquire the bus name {BUS_NAME}"))?;
    info!(bus_name = BUS_NAME, ?bus, "Broker ready");

    wait_for_termination().await?;
    info!("Shutting down");
    Ok(())
}

async fn wait_for_termination() -> anyhow::Result<()> {
    let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT])
        .context("Failed to register the signal handlers")?;
    if let Some(signal) = signals.next().await {
        info!(signal, "Received termination signal");
    }
    Ok(())
}
