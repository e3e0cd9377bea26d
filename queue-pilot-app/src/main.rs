use anyhow::{Context, Result};
use queue_pilot_app::commands::{self, Command, USAGE};
use queue_pilot_app::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!();
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let path = Config::path();
    let config = Config::load_from(&path)?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    match command {
        Command::Run => commands::run::execute(config).await,
        Command::Login { account_id } => commands::login::execute(config, &account_id).await,
        Command::Status => commands::status::execute(config).await,
        Command::Help => Ok(()),
    }
}
