use crate::config::{AccountEntry, Config};
use anyhow::{Context, Result};
use queue_pilot_automation::{LoginAutomator, LoginRequest, TracingSink};
use queue_pilot_desktop::{HyprlandWindows, OcrProbe, SystemProcesses, WtypeKeyboard};
use std::sync::Arc;

fn secret_for(account: &AccountEntry) -> Result<String> {
    match account.password.as_deref() {
        Some(password) if !password.is_empty() => Ok(password.to_string()),
        _ => rpassword::prompt_password(format!("Password for {}: ", account.id))
            .context("Failed to read password"),
    }
}

pub async fn execute(config: Config, account_id: &str) -> Result<()> {
    let account = config
        .account(account_id)
        .with_context(|| format!("Unknown account '{}'", account_id))?;
    let secret = secret_for(account)?;

    let automator = LoginAutomator::new(
        Arc::new(SystemProcesses::new()),
        Arc::new(HyprlandWindows::new()),
        Arc::new(WtypeKeyboard::new()),
        Arc::new(TracingSink),
    )
    .with_probe(Arc::new(OcrProbe::new(config.visual_marker.clone())))
    .with_focus_policy(config.focus_policy);

    automator
        .login(LoginRequest {
            account_id: account.id.clone(),
            username: account.username.clone(),
            secret,
            client_path: config.client_path.clone(),
        })
        .await?;

    println!(
        "Credentials submitted for '{}'. Finish any extra verification in the client.",
        account.id
    );
    Ok(())
}
