//! Status events published to the front-end.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub step: String,
    pub kind: StatusKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl StatusEvent {
    pub fn new(step: impl Into<String>, kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            account_id: None,
            step: step.into(),
            kind,
            message: message.into(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn info(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(step, StatusKind::Info, message)
    }

    pub fn success(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(step, StatusKind::Success, message)
    }

    pub fn error(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(step, StatusKind::Error, message)
    }

    pub fn for_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }
}

/// Ranked summary of the account currently signed in to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub game_name: String,
    pub tag_line: String,
    pub summoner_name: String,
    pub puuid: String,
    pub solo_decay_days: i64,
    pub flex_decay_days: i64,
    pub timestamp: DateTime<Utc>,
}

pub trait StatusSink: Send + Sync {
    fn emit(&self, event: StatusEvent);

    fn account_changed(&self, _snapshot: AccountSnapshot) {}
}

/// Sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn emit(&self, event: StatusEvent) {
        let account = event.account_id.as_deref().unwrap_or("-");
        match event.kind {
            StatusKind::Error => warn!(account, step = %event.step, "{}", event.message),
            _ => info!(account, step = %event.step, "{}", event.message),
        }
    }

    fn account_changed(&self, snapshot: AccountSnapshot) {
        info!(
            puuid = %snapshot.puuid,
            "Connected account {}#{} (solo decay {}, flex decay {})",
            snapshot.game_name,
            snapshot.tag_line,
            snapshot.solo_decay_days,
            snapshot.flex_decay_days
        );
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum StatusUpdate {
    Status(StatusEvent),
    Account(AccountSnapshot),
}

/// Fan-out sink for front-ends; events are dropped while nobody listens.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<StatusUpdate>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.sender.subscribe()
    }
}

impl StatusSink for BroadcastSink {
    fn emit(&self, event: StatusEvent) {
        let _ = self.sender.send(StatusUpdate::Status(event));
    }

    fn account_changed(&self, snapshot: AccountSnapshot) {
        let _ = self.sender.send(StatusUpdate::Account(snapshot));
    }
}

/// Lets one report through per window.
#[derive(Debug)]
pub struct ErrorThrottle {
    window: Duration,
    last: Mutex<Option<Instant>>,
}

pub const ERROR_LOG_WINDOW: Duration = Duration::from_secs(5);

impl ErrorThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    pub fn allow(&self) -> bool {
        let mut last = self.last.lock();
        let now = Instant::now();
        match *last {
            Some(at) if now.duration_since(at) <= self.window => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

impl Default for ErrorThrottle {
    fn default() -> Self {
        Self::new(ERROR_LOG_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = StatusEvent::success("ready-check", "Match accepted").for_account("acc-1");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["accountId"], "acc-1");
        assert_eq!(value["kind"], "success");
        assert_eq!(value["step"], "ready-check");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_throttle_window() {
        let throttle = ErrorThrottle::new(Duration::from_secs(60));
        assert!(throttle.allow());
        assert!(!throttle.allow());

        let open = ErrorThrottle::new(Duration::ZERO);
        assert!(open.allow());
        std::thread::sleep(Duration::from_millis(2));
        assert!(open.allow());
    }

    #[tokio::test]
    async fn test_broadcast_sink_delivers() {
        let sink = BroadcastSink::new(8);
        let mut rx = sink.subscribe();
        sink.emit(StatusEvent::info("x", "hello"));
        match rx.recv().await.unwrap() {
            StatusUpdate::Status(event) => assert_eq!(event.message, "hello"),
            other => panic!("unexpected update {other:?}"),
        }
    }
}
