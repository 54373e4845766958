use anyhow::Result;
use clap::Parser;

use intel_desk::{config::Settings, server};

#[derive(Debug, Parser)]
#[command(name = "intel-desk", version)]
struct Cli {
    /// Override HOST
    #[arg(long)]
    host: Option<String>,
    /// Override PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(h) = cli.host {
        settings.host = h;
    }
    if let Some(p) = cli.port {
        settings.port = p;
    }
    settings.validate()?;

    log::info!(
        "app.start addr={} moralis={} rpc={} model={}",
        settings.bind_addr(),
        settings.moralis_base_url,
        settings.solana_rpc_url,
        settings.gemini_model
    );

    server::serve(settings).await
}
