#![forbid(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use keylight_config::console_log_init;
use keylight_config::KeylightConfig;

mod cli;
mod command;

use command::BuildCommand;
use command::BuildContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = cli::Opt::parse();
    let config = KeylightConfig::try_new(&opt.config_dir)?;
    console_log_init("keylight", &opt.log_args, &config)?;

    let context = BuildContext::new(&opt, &config);
    let cmd = opt.command.build_command(context);
    cmd.execute()
        .await
        .with_context(|| format!("failed to {}", cmd.description()))
}
