//! Watches which account is signed in and publishes its ranked summary.

use crate::poller::Automaton;
use crate::status::{AccountSnapshot, StatusSink};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use queue_pilot_client::endpoints::{CURRENT_SUMMONER, RANKED_STATS};
use queue_pilot_client::models::{CurrentSummoner, RankedStats, FLEX_QUEUE, SOLO_QUEUE};
use queue_pilot_client::{ClientConnection, Credential, ServiceError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const ACCOUNT_INTERVAL: Duration = Duration::from_secs(10);

pub fn build_snapshot(summoner: &CurrentSummoner, ranked: &RankedStats) -> AccountSnapshot {
    let game_name = if summoner.game_name.is_empty() {
        summoner.display_name.clone()
    } else {
        summoner.game_name.clone()
    };
    AccountSnapshot {
        summoner_name: summoner.display_name.clone(),
        game_name,
        tag_line: summoner.tag_line.clone(),
        puuid: summoner.puuid.clone(),
        solo_decay_days: ranked.days_until_decay(SOLO_QUEUE),
        flex_decay_days: ranked.days_until_decay(FLEX_QUEUE),
        timestamp: Utc::now(),
    }
}

/// Errors never surface as status events; the next tick simply tries again.
pub struct AccountWatcher {
    connection: ClientConnection,
    sink: Arc<dyn StatusSink>,
    last_puuid: Mutex<Option<String>>,
}

impl AccountWatcher {
    pub fn new(connection: ClientConnection, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            connection,
            sink,
            last_puuid: Mutex::new(None),
        }
    }

    pub fn last_puuid(&self) -> Option<String> {
        self.last_puuid.lock().clone()
    }

    async fn check(&self, credential: &Credential) -> Result<(), ServiceError> {
        let Some(summoner) = self
            .connection
            .get::<CurrentSummoner>(credential, CURRENT_SUMMONER)
            .await?
        else {
            return Ok(());
        };
        if summoner.puuid.is_empty() || self.last_puuid().as_deref() == Some(&summoner.puuid) {
            return Ok(());
        }

        let ranked = self
            .connection
            .get::<RankedStats>(credential, RANKED_STATS)
            .await?
            .unwrap_or_default();
        let snapshot = build_snapshot(&summoner, &ranked);
        info!(puuid = %snapshot.puuid, "Signed-in account changed");
        *self.last_puuid.lock() = Some(summoner.puuid);
        self.sink.account_changed(snapshot);
        Ok(())
    }
}

#[async_trait]
impl Automaton for AccountWatcher {
    fn name(&self) -> &'static str {
        "account"
    }

    async fn tick(&self) {
        let Some(credential) = self.connection.credential().await else {
            if self.last_puuid.lock().take().is_some() {
                debug!("Client gone, forgetting signed-in account");
            }
            return;
        };
        if let Err(err) = self.check(&credential).await {
            debug!("Account check failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_defaults() {
        let summoner: CurrentSummoner = serde_json::from_value(json!({
            "puuid": "p-1", "displayName": "Old Name", "tagLine": "EUW"
        }))
        .unwrap();
        let ranked: RankedStats = serde_json::from_value(json!({
            "queueMap": {"RANKED_SOLO_5x5": {"warnings": {"daysUntilDecay": 7}}}
        }))
        .unwrap();
        let snapshot = build_snapshot(&summoner, &ranked);
        assert_eq!(snapshot.game_name, "Old Name");
        assert_eq!(snapshot.summoner_name, "Old Name");
        assert_eq!(snapshot.solo_decay_days, 7);
        assert_eq!(snapshot.flex_decay_days, -1);
    }

    #[test]
    fn test_summoner_name_is_display_name() {
        let summoner: CurrentSummoner = serde_json::from_value(json!({
            "puuid": "p-2", "gameName": "Hide on bush", "displayName": "Legacy", "tagLine": "KR1"
        }))
        .unwrap();
        let snapshot = build_snapshot(&summoner, &RankedStats::default());
        assert_eq!(snapshot.game_name, "Hide on bush");
        assert_eq!(snapshot.summoner_name, "Legacy");
        assert_eq!(snapshot.solo_decay_days, -1);
    }
}
