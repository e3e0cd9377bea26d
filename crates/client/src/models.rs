//! Wire shapes read from the client service.
//!
//! Every field defaults so partially populated payloads still decode; the
//! service omits fields freely between patches.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ActionId = i64;
pub type CellId = i64;
pub type ChampionId = i64;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReadyCheck {
    pub state: Option<String>,
    pub player_response: Option<String>,
    pub local_player: Option<LocalPlayerResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalPlayerResponse {
    pub response: Option<String>,
    pub player_response: Option<String>,
}

impl ReadyCheck {
    pub fn is_in_progress(&self) -> bool {
        normalize(self.state.as_deref()) == "inprogress"
    }

    /// Local player's answer, lower-cased; empty when none was recorded.
    pub fn local_response(&self) -> String {
        let local = self.local_player.as_ref();
        let raw = [
            self.player_response.as_deref(),
            local.and_then(|p| p.response.as_deref()),
            local.and_then(|p| p.player_response.as_deref()),
        ]
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty());
        normalize(raw)
    }

    pub fn is_accepted(&self) -> bool {
        self.local_response() == "accepted"
    }
}

fn normalize(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Planning,
    BanPick,
    Finalization,
    GameStarting,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Ban,
    Pick,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionTimer {
    pub phase: SessionPhase,
    pub internal_now_in_epoch_ms: i64,
    pub adjusted_time_left_in_phase: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamMember {
    pub cell_id: CellId,
    pub champion_id: ChampionId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionAction {
    pub id: ActionId,
    pub actor_cell_id: CellId,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub completed: bool,
    pub is_in_progress: bool,
    pub champion_id: ChampionId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectionSnapshot {
    pub local_player_cell_id: CellId,
    pub my_team: Vec<TeamMember>,
    pub timer: Option<SessionTimer>,
    pub actions: Vec<Vec<SessionAction>>,
}

impl SelectionSnapshot {
    pub fn phase(&self) -> SessionPhase {
        self.timer.as_ref().map(|t| t.phase).unwrap_or_default()
    }

    /// Server clock value identifying the session, when the timer is live.
    pub fn session_marker(&self) -> Option<i64> {
        self.timer
            .as_ref()
            .filter(|t| t.adjusted_time_left_in_phase != 0 && t.internal_now_in_epoch_ms != 0)
            .map(|t| t.internal_now_in_epoch_ms)
    }

    pub fn local_member(&self) -> Option<&TeamMember> {
        self.my_team
            .iter()
            .find(|member| member.cell_id == self.local_player_cell_id)
    }

    pub fn actions(&self) -> impl Iterator<Item = &SessionAction> {
        self.actions.iter().flatten()
    }

    pub fn action(&self, id: ActionId) -> Option<&SessionAction> {
        self.actions().find(|action| action.id == id)
    }

    /// The local seat's open action of `kind`, if it is currently its turn.
    pub fn pending_local_action(&self, kind: ActionKind) -> Option<&SessionAction> {
        self.actions().find(|action| {
            action.actor_cell_id == self.local_player_cell_id
                && action.kind == kind
                && action.is_in_progress
                && !action.completed
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrentSummoner {
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankedStats {
    pub queue_map: HashMap<String, QueueStats>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueStats {
    pub warnings: Option<DecayWarnings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecayWarnings {
    pub days_until_decay: i64,
}

pub const SOLO_QUEUE: &str = "RANKED_SOLO_5x5";
pub const FLEX_QUEUE: &str = "RANKED_FLEX_SR";

impl RankedStats {
    /// Days before decay in `queue`, or -1 when the service reports none.
    pub fn days_until_decay(&self, queue: &str) -> i64 {
        self.queue_map
            .get(queue)
            .and_then(|stats| stats.warnings.as_ref())
            .map(|w| w.days_until_decay)
            .unwrap_or(-1)
    }
}
