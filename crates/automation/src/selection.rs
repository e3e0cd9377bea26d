//! Champion selection: ban, pre-pick, pick and lock for the local seat.
//!
//! Each tick reads the session once and walks the stages in order. Progress
//! lives in a [`SelectionState`] value that the tick returns whole; a new
//! session (different server marker) starts from a fresh value with a bumped
//! version.
//!
//! Locking requires a [`ConfirmedPick`], which only the verification read
//! (or the already-selected shortcut) can produce, so a lock can never be
//! sent for a champion the service has not shown in the pick action.

use crate::poller::Automaton;
use crate::settings::{AutomationSettings, SharedSettings};
use crate::status::{ErrorThrottle, StatusEvent, StatusSink};
use async_trait::async_trait;
use parking_lot::Mutex;
use queue_pilot_client::endpoints::{self, MY_SELECTION, SELECTION_SESSION};
use queue_pilot_client::models::{
    ActionId, ActionKind, ChampionId, SelectionSnapshot, SessionAction, SessionPhase,
};
use queue_pilot_client::{ClientConnection, Credential, ServiceError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const SELECTION_INTERVAL: Duration = Duration::from_secs(1);

pub const STEP: &str = "champion-select";

#[derive(Debug, Clone)]
pub struct SelectionTimings {
    /// Wait between writing the pick and reading it back.
    pub convergence_delay: Duration,
}

impl Default for SelectionTimings {
    fn default() -> Self {
        Self {
            convergence_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStage {
    NoSession,
    Planning,
    Banning,
    Picking,
    Locked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub version: u64,
    pub session_id: Option<i64>,
    /// Phase seen on the last read; `None` outside a session.
    pub phase: Option<SessionPhase>,
    pub has_banned: bool,
    pub has_pre_picked: bool,
    pub has_picked: bool,
    pub has_locked: bool,
}

impl SelectionState {
    fn is_pristine(&self) -> bool {
        self.session_id.is_none()
            && self.phase.is_none()
            && !self.has_banned
            && !self.has_pre_picked
            && !self.has_picked
            && !self.has_locked
    }

    /// State for "no session". Bumps the version only when something is
    /// actually discarded.
    pub fn reset(&self) -> Self {
        if self.is_pristine() {
            return self.clone();
        }
        Self {
            version: self.version + 1,
            ..Self::default()
        }
    }

    /// Fold in a freshly read session: a changed marker starts over, a
    /// missing marker keeps the current identity.
    pub fn observe(&self, session: &SelectionSnapshot) -> Self {
        let mut next = match session.session_marker() {
            Some(marker) if self.session_id != Some(marker) => {
                debug!(marker, "New selection session");
                Self {
                    version: self.version + 1,
                    session_id: Some(marker),
                    ..Self::default()
                }
            }
            _ => self.clone(),
        };
        next.phase = Some(session.phase());
        next
    }

    pub fn stage(&self, settings: &AutomationSettings) -> SelectionStage {
        let Some(phase) = self.phase else {
            return SelectionStage::NoSession;
        };
        if self.has_locked {
            return SelectionStage::Locked;
        }
        match phase {
            SessionPhase::BanPick if settings.ban.is_some() && !self.has_banned => {
                SelectionStage::Banning
            }
            SessionPhase::BanPick => SelectionStage::Picking,
            _ => SelectionStage::Planning,
        }
    }
}

/// A pick the service has been seen to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedPick {
    action_id: ActionId,
    champion: ChampionId,
}

impl ConfirmedPick {
    pub fn action_id(&self) -> ActionId {
        self.action_id
    }

    pub fn champion(&self) -> ChampionId {
        self.champion
    }
}

/// Confirm from a fresh session read that action `action_id` holds `champion`.
pub fn confirm_pick(
    session: &SelectionSnapshot,
    action_id: ActionId,
    champion: ChampionId,
) -> Option<ConfirmedPick> {
    session
        .action(action_id)
        .filter(|action| action.champion_id == champion)
        .map(|_| ConfirmedPick {
            action_id,
            champion,
        })
}

fn already_selected(action: &SessionAction, champion: ChampionId) -> Option<ConfirmedPick> {
    (action.champion_id == champion).then_some(ConfirmedPick {
        action_id: action.id,
        champion,
    })
}

/// Where a tick stopped. Only a failed session read says anything about the
/// session itself; a rejected write leaves the recorded progress alone.
enum StepError {
    Read(ServiceError),
    Write(ServiceError),
}

pub struct SelectionAutomaton {
    connection: ClientConnection,
    settings: SharedSettings,
    sink: Arc<dyn StatusSink>,
    timings: SelectionTimings,
    state: Mutex<SelectionState>,
    log_throttle: ErrorThrottle,
    status_throttle: ErrorThrottle,
}

impl SelectionAutomaton {
    pub fn new(
        connection: ClientConnection,
        settings: SharedSettings,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            connection,
            settings,
            sink,
            timings: SelectionTimings::default(),
            state: Mutex::new(SelectionState::default()),
            log_throttle: ErrorThrottle::default(),
            status_throttle: ErrorThrottle::default(),
        }
    }

    pub fn with_timings(mut self, timings: SelectionTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn state(&self) -> SelectionState {
        self.state.lock().clone()
    }

    pub fn stage(&self) -> SelectionStage {
        self.state().stage(&self.settings.selection())
    }

    /// One polling step from `state`; returns the state for the next tick.
    pub async fn step(&self, state: SelectionState) -> SelectionState {
        let settings = self.settings.selection();
        if !settings.enabled || self.settings.client_path().is_none() {
            return state;
        }
        let Some(credential) = self.connection.credential().await else {
            return state;
        };

        let mut next = state;
        match self.advance(&credential, &settings, &mut next).await {
            Ok(()) => next,
            Err(StepError::Read(err)) if err.is_not_found() => {
                debug!("Selection session ended");
                next.reset()
            }
            Err(StepError::Read(err) | StepError::Write(err)) => {
                self.report("Selection polling failed", &err);
                next
            }
        }
    }

    async fn advance(
        &self,
        credential: &Credential,
        settings: &AutomationSettings,
        state: &mut SelectionState,
    ) -> Result<(), StepError> {
        let Some(session) = self.read_session(credential).await? else {
            *state = state.reset();
            return Ok(());
        };
        *state = state.observe(&session);

        if session.local_member().is_none() {
            debug!("Local seat not in team yet");
            return Ok(());
        }
        let phase = session.phase();

        if let Some(ban) = settings.ban {
            if phase == SessionPhase::BanPick && !state.has_banned {
                if let Some(action) = session.pending_local_action(ActionKind::Ban) {
                    self.ban(credential, action.id, ban).await.map_err(StepError::Write)?;
                    state.has_banned = true;
                }
            }
        }

        let Some(pick) = settings.pick else {
            return Ok(());
        };

        if matches!(phase, SessionPhase::Planning | SessionPhase::BanPick) && !state.has_pre_picked
        {
            self.pre_select(credential, pick).await;
            state.has_pre_picked = true;
        }

        if phase == SessionPhase::BanPick && !state.has_locked {
            if let Some(action) = session.pending_local_action(ActionKind::Pick) {
                let confirmed = match already_selected(action, pick) {
                    Some(confirmed) => Some(confirmed),
                    None => self.select_and_verify(credential, action.id, pick).await?,
                };
                if let Some(confirmed) = confirmed {
                    state.has_picked = true;
                    let locked = self
                        .lock(credential, confirmed)
                        .await
                        .map_err(StepError::Write)?;
                    if locked {
                        state.has_locked = true;
                    }
                }
            }
        }

        Ok(())
    }

    async fn read_session(
        &self,
        credential: &Credential,
    ) -> Result<Option<SelectionSnapshot>, StepError> {
        self.connection
            .get::<SelectionSnapshot>(credential, SELECTION_SESSION)
            .await
            .map_err(StepError::Read)
    }

    async fn ban(
        &self,
        credential: &Credential,
        action_id: ActionId,
        champion: ChampionId,
    ) -> Result<(), ServiceError> {
        let path = endpoints::action(action_id);
        let result = match self
            .connection
            .patch(credential, &path, json!({ "championId": champion }))
            .await
        {
            Ok(_) => {
                self.connection
                    .post(credential, &endpoints::action_complete(action_id))
                    .await
            }
            Err(err) => Err(err),
        };
        match result {
            Ok(_) => {
                info!(action_id, champion, "Ban submitted");
                self.sink
                    .emit(StatusEvent::success(STEP, "Champion banned automatically."));
                Ok(())
            }
            Err(err) => {
                if self.status_throttle.allow() {
                    self.sink
                        .emit(StatusEvent::error(STEP, "Automatic ban failed."));
                }
                Err(err)
            }
        }
    }

    /// Best effort; failures are logged and the pre-pick is not retried.
    async fn pre_select(&self, credential: &Credential, champion: ChampionId) {
        let body = json!({ "championId": champion });
        match self.connection.patch(credential, MY_SELECTION, body).await {
            Ok(_) => debug!(champion, "Pre-pick submitted"),
            Err(err) => self.report("Pre-pick failed", &err),
        }
    }

    async fn select_and_verify(
        &self,
        credential: &Credential,
        action_id: ActionId,
        champion: ChampionId,
    ) -> Result<Option<ConfirmedPick>, StepError> {
        self.connection
            .patch(
                credential,
                &endpoints::action(action_id),
                json!({ "championId": champion }),
            )
            .await
            .map_err(StepError::Write)?;

        tokio::time::sleep(self.timings.convergence_delay).await;

        let confirmed = self
            .read_session(credential)
            .await?
            .and_then(|session| confirm_pick(&session, action_id, champion));
        if confirmed.is_none() {
            debug!(action_id, champion, "Pick not reflected yet, retrying next tick");
        }
        Ok(confirmed)
    }

    /// Returns whether the lock went through. The action update is tried
    /// first, the completion endpoint second; only a 401 is returned as an
    /// error, anything else is retried on a later tick.
    async fn lock(
        &self,
        credential: &Credential,
        pick: ConfirmedPick,
    ) -> Result<bool, ServiceError> {
        let path = endpoints::action(pick.action_id);
        let body = json!({ "championId": pick.champion, "completed": true });
        if let Err(err) = self.connection.patch(credential, &path, body).await {
            if err.is_unauthorized() {
                return Err(err);
            }
            warn!("Lock through action update failed ({}), trying completion", err);
            let fallback = endpoints::action_complete(pick.action_id);
            if let Err(err) = self.connection.post(credential, &fallback).await {
                if err.is_unauthorized() {
                    return Err(err);
                }
                self.report("Lock failed", &err);
                return Ok(false);
            }
        }

        info!(action_id = pick.action_id, champion = pick.champion, "Pick locked");
        self.sink.emit(StatusEvent::success(
            STEP,
            "Champion picked and locked automatically.",
        ));
        Ok(true)
    }

    fn report(&self, context: &str, err: &ServiceError) {
        if self.log_throttle.allow() {
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
impl Automaton for SelectionAutomaton {
    fn name(&self) -> &'static str {
        "champion-select"
    }

    async fn tick(&self) {
        let current = self.state();
        let next = self.step(current).await;
        *self.state.lock() = next;
    }
}
