use keylight_config::get_config_dir;
use keylight_config::LogConfigArgs;
use keylight_config::PathBuf;

#[derive(clap::Parser, Debug)]
#[clap(
    name = clap::crate_name!(),
    version = clap::crate_version!(),
    about = clap::crate_description!(),
    arg_required_else_help(true)
)]
pub struct Opt {
    #[command(flatten)]
    pub log_args: LogConfigArgs,

    /// [env: KEYLIGHT_CONFIG_DIR, default: /etc/keylight]
    #[clap(
        long = "config-dir",
        default_value = get_config_dir().into_string(),
        hide_env_values = true,
        hide_default_value = true,
        global = true
    )]
    pub config_dir: PathBuf,

    /// LED class directory of the keyboard, overriding `device.path`
    #[clap(long, global = true)]
    pub device: Option<PathBuf>,

    /// Reach the broker on the session bus instead of the system bus
    #[clap(long, global = true)]
    pub session: bool,

    #[clap(subcommand)]
    pub command: KeylightOpt,
}

#[derive(clap::Subcommand, Debug)]
pub enum KeylightOpt {
    /// Print the brightness percentage, or set it
    Brightness {
        /// New brightness in percent, clamped to [0, 100]
        #[clap(allow_negative_numbers = true)]
        percent: Option<i64>,
    },

    /// Print the color of each zone, or set it
    Color {
        /// New color, written as is (e.g. FF0000)
        value: Option<String>,

        /// Only change this zone
        #[clap(long, requires = "value")]
        zone: Option<String>,
    },

    /// List the color zones
    Zones,

    /// Describe the keyboard
    Info,
}
