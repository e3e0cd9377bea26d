//! Routes used on the client service.

use crate::models::ActionId;

pub const READY_CHECK: &str = "/lol-matchmaking/v1/ready-check";
pub const READY_CHECK_ACCEPT: &str = "/lol-matchmaking/v1/ready-check/accept";
pub const SELECTION_SESSION: &str = "/lol-champ-select/v1/session";
pub const MY_SELECTION: &str = "/lol-champ-select/v1/session/my-selection";
pub const CURRENT_SUMMONER: &str = "/lol-summoner/v1/current-summoner";
pub const RANKED_STATS: &str = "/lol-ranked/v1/current-ranked-stats";

pub fn action(id: ActionId) -> String {
    format!("{SELECTION_SESSION}/actions/{id}")
}

pub fn action_complete(id: ActionId) -> String {
    format!("{SELECTION_SESSION}/actions/{id}/complete")
}
