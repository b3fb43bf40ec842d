use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use vault_migrator::{CliError, Config};

/// vault-migrator - copy every key of one storage backend into another
#[derive(Parser, Debug)]
#[command(name = "vault-migrator")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file
    #[arg(short, long, env = "VAULT_MIGRATOR_CONFIG_FILE")]
    config: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let config = Config::load(&args.config)?.validate()?;
    vault_migrator::run(config, shutdown_signal()).await
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing();

    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
