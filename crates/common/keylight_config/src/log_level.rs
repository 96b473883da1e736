use crate::ConfigError;
use crate::KeylightConfig;
use crate::LogConfigArgs;
use camino::Utf8Path;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::fs::PermissionsExt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

/// Target of the events recording denied requests.
///
/// When `audit.file` is configured these events are also appended to that file.
pub const AUDIT_TARGET: &str = "keylight::audit";

const DEFAULT_MAX_LEVEL: tracing::Level = tracing::Level::INFO;

/// Configures and enables logging taking into account flags, env variables and file config.
///
/// 1. Log config is taken from the file configuration first
/// 2. If `RUST_LOG` variable is set, it overrides file-based configuration
/// 3. If `--debug` or `--log-level` flags are set, they override previous steps
///
/// Independently of the level, audit events are copied to the audit file if one is configured.
pub fn log_init(
    sname: &str,
    flags: &LogConfigArgs,
    config_dir: &Utf8Path,
) -> Result<(), ConfigError> {
    let config = KeylightConfig::try_new(config_dir)?;
    let audit_file = match config.audit.file.as_deref() {
        Some(path) => Some(open_audit_file(path)?),
        None => None,
    };
    logger(sname, flags, Some(&config), audit_file)?.init();
    Ok(())
}

/// Configures logging for a command line tool: only the console, never the audit file.
pub fn console_log_init(
    sname: &str,
    flags: &LogConfigArgs,
    config: &KeylightConfig,
) -> Result<(), ConfigError> {
    logger(sname, flags, Some(config), None)?.init();
    Ok(())
}

fn logger(
    sname: &str,
    flags: &LogConfigArgs,
    config: Option<&KeylightConfig>,
    audit_file: Option<File>,
) -> Result<Arc<dyn tracing::Subscriber + Send + Sync>, ConfigError> {
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal() && yansi::Condition::no_color())
        .with_timer(UtcTime::rfc_3339());

    let log_level = flags
        .log_level
        .or(flags.debug.then_some(tracing::Level::DEBUG));

    let filter = if let Some(log_level) = log_level {
        level_filter(log_level)
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if let Some(log_level) = config
        .map(|config| get_log_level(sname, config))
        .transpose()?
        .flatten()
    {
        level_filter(log_level)
    } else {
        level_filter(DEFAULT_MAX_LEVEL)
    };

    let audit = audit_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_timer(UtcTime::rfc_3339())
            .with_filter(filter_fn(|metadata| metadata.target() == AUDIT_TARGET))
    });

    Ok(Arc::new(
        tracing_subscriber::registry()
            .with(console.with_filter(filter))
            .with(audit),
    ))
}

fn level_filter(log_level: tracing::Level) -> EnvFilter {
    EnvFilter::default().add_directive(LevelFilter::from_level(log_level).into())
}

/// Return the log level for a given service, if it's defined in the config. Otherwise return `None`.
pub fn get_log_level(
    sname: &str,
    config: &KeylightConfig,
) -> Result<Option<tracing::Level>, ConfigError> {
    match config.log.get(sname) {
        Some(ll) => {
            let ll = tracing::Level::from_str(&ll.to_uppercase()).map_err(|_| {
                ConfigError::InvalidLogLevel {
                    name: ll.to_string(),
                }
            })?;
            Ok(Some(ll))
        }
        None => Ok(None),
    }
}

/// Opens the audit log for appending, making sure only its owner can read it.
pub fn open_audit_file(path: &Utf8Path) -> Result<File, ConfigError> {
    let audit_error = |source| ConfigError::AuditLog {
        path: path.to_owned(),
        source,
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o600)
        .open(path)
        .map_err(audit_error)?;

    // mode() only applies when the file is created
    let mut permissions = file.metadata().map_err(audit_error)?.permissions();
    if permissions.mode() & 0o077 != 0 {
        permissions.set_mode(0o600);
        file.set_permissions(permissions).map_err(audit_error)?;
    }

    Ok(file)
}
