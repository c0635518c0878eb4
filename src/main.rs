use agri_assist_relay::app::App;
use agri_assist_relay::models::Config;
use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "agri-assist-relay")]
#[command(about = "Relay farmer chat questions to Gemini")]
struct CliArgs {
    /// Address to bind; overrides HOST.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on; overrides PORT.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let mut config = Config::from_env()?;

    let default_filter = if config.debug {
        "agri_assist_relay=debug,tower_http=debug"
    } else {
        "agri_assist_relay=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting agri-assist-relay");

    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let app = App::new(&config);
    if let Err(e) = app.run(&config.host, config.port).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
