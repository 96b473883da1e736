/// Logging flags shared by the `keylight` and `keylightd` command lines.
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfigArgs {
    /// Turn-on the DEBUG log level.
    ///
    /// If off only reports ERROR, WARN, and INFO, if on also reports DEBUG
    #[clap(long, global = true)]
    pub debug: bool,

    /// Configures the logging level.
    ///
    /// One of error/warn/info/debug/trace.
    /// Takes precedence over the `--debug` flag.
    #[clap(long, global = true)]
    pub log_level: Option<tracing::Level>,
}
