use super::connect;
use super::run::render_account;
use crate::config::Config;
use anyhow::Result;
use queue_pilot_automation::account::build_snapshot;
use queue_pilot_client::endpoints::{CURRENT_SUMMONER, RANKED_STATS};
use queue_pilot_client::models::{CurrentSummoner, RankedStats};

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

pub async fn execute(config: Config) -> Result<()> {
    match &config.client_path {
        Some(path) => println!("Client path:    {}", path.display()),
        None => println!("Client path:    (not set)"),
    }
    println!("Auto-accept:    {}", on_off(config.auto_accept));
    println!(
        "Champ select:   {} (pick: {}, ban: {})",
        on_off(config.selection.enabled),
        config.selection.pick.map_or("-".to_string(), |id| id.to_string()),
        config.selection.ban.map_or("-".to_string(), |id| id.to_string())
    );
    println!("Accounts:       {}", config.accounts.len());

    let connection = connect(&config)?;
    let Some(credential) = connection.credential().await else {
        println!("Client service: not running");
        return Ok(());
    };
    println!("Client service: {}", credential.base_url());

    match connection
        .get::<CurrentSummoner>(&credential, CURRENT_SUMMONER)
        .await
    {
        Ok(Some(summoner)) if !summoner.puuid.is_empty() => {
            let ranked = connection
                .get::<RankedStats>(&credential, RANKED_STATS)
                .await
                .ok()
                .flatten()
                .unwrap_or_default();
            println!("{}", render_account(&build_snapshot(&summoner, &ranked)));
        }
        Ok(_) => println!("Account: not signed in"),
        Err(err) => println!("Account: unavailable ({})", err),
    }
    Ok(())
}
