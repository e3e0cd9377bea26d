pub mod login;
pub mod run;
pub mod status;

use crate::config::Config;
use anyhow::Result;
use queue_pilot_automation::SharedSettings;
use queue_pilot_client::{ClientConnection, CredentialProvider, HttpServiceClient};
use queue_pilot_desktop::SystemProcesses;
use std::sync::Arc;

pub const USAGE: &str = "\
Usage: queue-pilot [COMMAND]

Commands:
  run                 Start the automations and stream status until Ctrl-C (default)
  login <account-id>  Sign in to the client with a configured account
  status              Show the client connection and signed-in account
  help                Show this message

Configuration is read from queue-pilot.yaml, or the file named by QUEUE_PILOT_CONFIG.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Login { account_id: String },
    Status,
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        match args.first().map(String::as_str) {
            None | Some("run") => Ok(Command::Run),
            Some("login") => match args.get(1).map(|id| id.trim()) {
                Some(id) if !id.is_empty() => Ok(Command::Login {
                    account_id: id.to_string(),
                }),
                _ => anyhow::bail!("Missing account id. Usage: queue-pilot login <account-id>"),
            },
            Some("status") => Ok(Command::Status),
            Some("help" | "-h" | "--help") => Ok(Command::Help),
            Some(other) => {
                anyhow::bail!("Unknown command '{}'. Run 'queue-pilot help' for usage.", other)
            }
        }
    }
}

pub fn connect(config: &Config) -> Result<ClientConnection> {
    let mut credentials = CredentialProvider::new(Arc::new(SystemProcesses::new()));
    if let Some(name) = config.process_name.as_deref().filter(|n| !n.trim().is_empty()) {
        credentials = credentials.with_executable(name.trim());
    }
    let client = HttpServiceClient::new()?;
    Ok(ClientConnection::new(Arc::new(credentials), Arc::new(client)))
}

pub fn settings_from(config: &Config) -> SharedSettings {
    let settings = SharedSettings::new();
    settings.set_client_path(config.client_path.clone());
    settings.set_auto_accept(config.auto_accept);
    settings.set_selection(config.selection.clone());
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Run);
        assert_eq!(Command::parse(&args(&["status"])).unwrap(), Command::Status);
        assert_eq!(Command::parse(&args(&["--help"])).unwrap(), Command::Help);
        assert_eq!(
            Command::parse(&args(&["login", "smurf"])).unwrap(),
            Command::Login {
                account_id: "smurf".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(&args(&["login"])).is_err());
        assert!(Command::parse(&args(&["login", "  "])).is_err());
        assert!(Command::parse(&args(&["dance"])).is_err());
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            client_path: Some("\"C:\\Riot Games\\Riot Client\\RiotClientServices.exe\"".into()),
            auto_accept: true,
            ..Config::default()
        };
        let settings = settings_from(&config);
        assert!(settings.auto_accept());
        assert_eq!(
            settings.client_path().unwrap().to_string_lossy(),
            "C:\\Riot Games\\Riot Client\\RiotClientServices.exe"
        );
    }
}
