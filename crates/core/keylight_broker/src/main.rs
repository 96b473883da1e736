use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = keylight_broker::DaemonOpt::parse();
    keylight_broker::run(opt).await
}
