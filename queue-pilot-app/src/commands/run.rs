use super::{connect, settings_from};
use crate::config::Config;
use anyhow::Result;
use queue_pilot_automation::{
    AccountSnapshot, AutomationHub, BroadcastSink, StatusKind, StatusUpdate,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

fn decay(days: i64) -> String {
    if days < 0 {
        "n/a".to_string()
    } else {
        format!("{days} days")
    }
}

pub fn render_account(snapshot: &AccountSnapshot) -> String {
    format!(
        "Account: {}#{} (solo decay: {}, flex decay: {})",
        snapshot.game_name,
        snapshot.tag_line,
        decay(snapshot.solo_decay_days),
        decay(snapshot.flex_decay_days)
    )
}

pub fn render(update: &StatusUpdate) -> String {
    match update {
        StatusUpdate::Status(event) => {
            let kind = match event.kind {
                StatusKind::Info => "info",
                StatusKind::Success => "ok",
                StatusKind::Error => "error",
            };
            format!("[{}] {}: {}", event.step, kind, event.message)
        }
        StatusUpdate::Account(snapshot) => render_account(snapshot),
    }
}

pub async fn execute(config: Config) -> Result<()> {
    let connection = connect(&config)?;
    let settings = settings_from(&config);
    if settings.client_path().is_none() {
        warn!("client_path is not set; automations stay idle until it is configured");
    }

    let sink = BroadcastSink::new(64);
    let mut updates = sink.subscribe();
    let hub = AutomationHub::new(connection, settings, Arc::new(sink));
    hub.start();
    println!(
        "Automations running (auto-accept: {}, champion select: {}). Press Ctrl-C to stop.",
        hub.auto_accept(),
        hub.selection().enabled
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => println!("{}", render(&update)),
                Err(RecvError::Lagged(skipped)) => warn!("Dropped {} status updates", skipped),
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown => break,
        }
    }

    hub.shutdown().await;
    Ok(())
}
