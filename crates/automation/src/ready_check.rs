//! Automatic acceptance of the matchmaking ready-check.

use crate::poller::Automaton;
use crate::settings::SharedSettings;
use crate::status::{ErrorThrottle, StatusEvent, StatusSink};
use async_trait::async_trait;
use parking_lot::Mutex;
use queue_pilot_client::endpoints::{READY_CHECK, READY_CHECK_ACCEPT};
use queue_pilot_client::models::ReadyCheck;
use queue_pilot_client::{ClientConnection, ServiceError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const READY_CHECK_INTERVAL: Duration = Duration::from_secs(4);

pub const STEP: &str = "ready-check";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadyCheckState {
    #[default]
    Idle,
    /// Accept sent for the current check; cleared once the check goes away.
    Accepted,
}

/// What the service reports about the ready-check this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// No check, or one that is not in progress.
    Absent,
    /// In progress and still waiting for the local player.
    Pending,
    /// In progress and already accepted server-side.
    Answered,
}

impl Observation {
    pub fn from_check(check: Option<&ReadyCheck>) -> Self {
        match check {
            Some(check) if check.is_in_progress() => {
                if check.is_accepted() {
                    Observation::Answered
                } else {
                    Observation::Pending
                }
            }
            _ => Observation::Absent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Hold(ReadyCheckState),
}

pub fn decide(state: ReadyCheckState, observation: Observation) -> Decision {
    match (state, observation) {
        (_, Observation::Absent) => Decision::Hold(ReadyCheckState::Idle),
        (_, Observation::Answered) => Decision::Hold(ReadyCheckState::Accepted),
        (ReadyCheckState::Idle, Observation::Pending) => Decision::Accept,
        (ReadyCheckState::Accepted, Observation::Pending) => {
            Decision::Hold(ReadyCheckState::Accepted)
        }
    }
}

pub struct ReadyCheckAutomaton {
    connection: ClientConnection,
    settings: SharedSettings,
    sink: Arc<dyn StatusSink>,
    state: Mutex<ReadyCheckState>,
    throttle: ErrorThrottle,
}

impl ReadyCheckAutomaton {
    pub fn new(
        connection: ClientConnection,
        settings: SharedSettings,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            connection,
            settings,
            sink,
            state: Mutex::new(ReadyCheckState::Idle),
            throttle: ErrorThrottle::default(),
        }
    }

    pub fn state(&self) -> ReadyCheckState {
        *self.state.lock()
    }

    /// One polling step from `state`; returns the state for the next tick.
    pub async fn step(&self, state: ReadyCheckState) -> ReadyCheckState {
        if !self.settings.auto_accept() || self.settings.client_path().is_none() {
            return ReadyCheckState::Idle;
        }
        let Some(credential) = self.connection.credential().await else {
            return ReadyCheckState::Idle;
        };

        let check = match self
            .connection
            .get::<ReadyCheck>(&credential, READY_CHECK)
            .await
        {
            Ok(check) => check,
            Err(err) if err.is_not_found() => return ReadyCheckState::Idle,
            Err(err) => {
                self.report("Ready-check polling failed", &err);
                return state;
            }
        };

        match decide(state, Observation::from_check(check.as_ref())) {
            Decision::Hold(next) => next,
            Decision::Accept => match self.connection.post(&credential, READY_CHECK_ACCEPT).await {
                Ok(_) => {
                    info!("Ready-check accepted");
                    self.sink
                        .emit(StatusEvent::success(STEP, "Match accepted automatically."));
                    ReadyCheckState::Accepted
                }
                Err(err) => {
                    self.report("Ready-check accept failed", &err);
                    ReadyCheckState::Idle
                }
            },
        }
    }

    fn report(&self, context: &str, err: &ServiceError) {
        if self.throttle.allow() {
            match err.body() {
                Some(body) => warn!("{}: {} {}", context, err, body),
                None => warn!("{}: {}", context, err),
            }
        } else {
            debug!("{}: {}", context, err);
        }
    }
}

#[async_trait]
impl Automaton for ReadyCheckAutomaton {
    fn name(&self) -> &'static str {
        "ready-check"
    }

    async fn tick(&self) {
        let current = self.state();
        let next = self.step(current).await;
        *self.state.lock() = next;
    }
}
