use clap::Parser;
use stake_scripts::{
    cli::{load_env_file, Cli},
    errors::ScriptError,
};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let env_file = load_env_file(None)?;
    let cli = Cli::parse();

    tracing_subscriber::fmt().pretty().init();
    if let Some(path) = env_file {
        debug!("loaded environment from {}", path.display());
    }

    cli.run().await
}
