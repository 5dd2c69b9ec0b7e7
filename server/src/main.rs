use anyhow::Result;
use clap::Parser;
use config::{CliOverrides, ProviderKind, load_layered};
use config_server::ConfigServer;
use config_server::server::init_tracing;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "config-server",
    version,
    about = "Serves merged service configuration from Vault, Git, MongoDB, a URL or the filesystem"
)]
struct Args {
    /// Configuration file (TOML or YAML)
    #[arg(short, long, env = "CS_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Listen host, overrides configuration
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Active provider: filesystem, git, vault, mongodb or url
    #[arg(long)]
    provider: Option<ProviderKind>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let layered = load_layered(
        args.config.as_deref(),
        CliOverrides {
            host: args.host,
            port: args.port,
            provider: args.provider,
        },
    )?;

    init_tracing(&layered.config.observability.logging_level)?;
    layered.log_sources();

    ConfigServer::new(layered.config).await?.run().await?;
    Ok(())
}
