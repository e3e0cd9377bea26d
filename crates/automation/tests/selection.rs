mod common;

use common::{connection, settings, RecordingSink, Reply, ScriptedService};
use queue_pilot_automation::{
    Automaton, AutomationSettings, SelectionAutomaton, SelectionStage, SelectionTimings,
    SharedSettings, StatusKind,
};
use queue_pilot_client::endpoints::{self, MY_SELECTION, SELECTION_SESSION};
use queue_pilot_client::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const PICK: i64 = 103;
const BAN: i64 = 157;

fn session(phase: &str, marker: i64, actions: Value) -> Reply {
    Reply::Ok(json!({
        "localPlayerCellId": 2,
        "myTeam": [{"cellId": 1, "championId": 0}, {"cellId": 2, "championId": 0}],
        "timer": {
            "phase": phase,
            "internalNowInEpochMs": marker,
            "adjustedTimeLeftInPhase": 25000
        },
        "actions": actions
    }))
}

fn ban_action(completed: bool) -> Value {
    json!({"id": 11, "actorCellId": 2, "type": "ban", "isInProgress": !completed, "completed": completed, "championId": 0})
}

fn pick_action(champion: i64) -> Value {
    json!({"id": 21, "actorCellId": 2, "type": "pick", "isInProgress": true, "completed": false, "championId": champion})
}

fn setup(
    pick: Option<i64>,
    ban: Option<i64>,
) -> (Arc<ScriptedService>, Arc<RecordingSink>, SelectionAutomaton, SharedSettings) {
    let service = ScriptedService::new();
    let sink = RecordingSink::new();
    let settings = settings();
    settings.set_selection(AutomationSettings::new(true, pick, ban));
    let automaton = SelectionAutomaton::new(
        connection(service.clone(), true),
        settings.clone(),
        sink.clone(),
    )
    .with_timings(SelectionTimings {
        convergence_delay: Duration::ZERO,
    });
    (service, sink, automaton, settings)
}

fn lock_calls(service: &ScriptedService) -> usize {
    service
        .calls_to(Method::PATCH, &endpoints::action(21))
        .iter()
        .filter(|call| call.body.as_ref().is_some_and(|b| b["completed"] == true))
        .count()
}

#[tokio::test]
async fn test_bans_once_when_turn_comes() {
    let (service, sink, automaton, _) = setup(None, Some(BAN));
    service.route(
        Method::GET,
        SELECTION_SESSION,
        vec![session("BAN_PICK", 1000, json!([[ban_action(false)]]))],
    );
    service.route(Method::PATCH, &endpoints::action(11), vec![Reply::Ok(Value::Null)]);
    service.route(
        Method::POST,
        &endpoints::action_complete(11),
        vec![Reply::Ok(Value::Null)],
    );

    automaton.tick().await;
    automaton.tick().await;

    let bans = service.calls_to(Method::PATCH, &endpoints::action(11));
    assert_eq!(bans.len(), 1);
    assert_eq!(bans[0].body, Some(json!({"championId": BAN})));
    assert_eq!(service.calls_to(Method::POST, &endpoints::action_complete(11)).len(), 1);
    assert!(automaton.state().has_banned);
    assert_eq!(sink.count(StatusKind::Success), 1);
}

#[tokio::test]
async fn test_failed_ban_is_reported_and_retried() {
    let (service, sink, automaton, _) = setup(None, Some(BAN));
    service.route(
        Method::GET,
        SELECTION_SESSION,
        vec![session("BAN_PICK", 1000, json!([[ban_action(false)]]))],
    );
    service.route(
        Method::PATCH,
        &endpoints::action(11),
        vec![Reply::Status(500), Reply::Ok(Value::Null)],
    );
    service.route(
        Method::POST,
        &endpoints::action_complete(11),
        vec![Reply::Ok(Value::Null)],
    );

    automaton.tick().await;
    assert!(!automaton.state().has_banned);
    assert_eq!(sink.count(StatusKind::Error), 1);

    automaton.tick().await;
    assert!(automaton.state().has_banned);
    assert_eq!(service.calls_to(Method::PATCH, &endpoints::action(11)).len(), 2);
}

#[tokio::test]
async fn test_pre_pick_happens_once() {
    let (service, _, automaton, _) = setup(Some(PICK), None);
    service.route(
        Method::GET,
        SELECTION_SESSION,
        vec![session("PLANNING", 1000, json!([]))],
    );
    service.route(Method::PATCH, MY_SELECTION, vec![Reply::Status(500)]);

    automaton.tick().await;
    automaton.tick().await;

    let calls = service.calls_to(Method::PATCH, MY_SELECTION);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].body, Some(json!({"championId": PICK})));
    assert!(automaton.state().has_pre_picked);
    assert_eq!(automaton.stage(), SelectionStage::Planning);
}

#[tokio::test]
async fn test_pick_is_verified_before_lock() {
    let (service, sink, automaton, _) = setup(Some(PICK), None);
    service.route(
        Method::GET,
        SELECTION_SESSION,
        vec![
            session("BAN_PICK", 1000, json!([[pick_action(0)]])),
            session("BAN_PICK", 1000, json!([[pick_action(PICK)]])),
        ],
    );
    service.route(Method::PATCH, MY_SELECTION, vec![Reply::Ok(Value::Null)]);
    service.route(Method::PATCH, &endpoints::action(21), vec![Reply::Ok(Value::Null)]);

    automaton.tick().await;

    let writes = service.calls_to(Method::PATCH, &endpoints::action(21));
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].body, Some(json!({"championId": PICK})));
    assert_eq!(writes[1].body, Some(json!({"championId": PICK, "completed": true})));
    let state = automaton.state();
    assert!(state.has_picked && state.has_locked);
    assert_eq!(automaton.stage(), SelectionStage::Locked);
    assert_eq!(sink.count(StatusKind::Success), 1);
}

#[tokio::test]
async fn test_unconverged_pick_is_not_locked() {
    let (service, _, automaton, _) = setup(Some(PICK), None);
    service.route(
        Method::GET,
        SELECTION_SESSION,
        vec![session("BAN_PICK", 1000, json!([[pick_action(0)]]))],
    );
    service.route(Method::PATCH, &endpoints::action(21), vec![Reply::Ok(Value::Null)]);

    automaton.tick().await;

    assert_eq!(lock_calls(&service), 0);
    assert!(!automaton.state().has_locked);
}

#[tokio::test]
async fn test_already_selected_pick_goes_straight_to_lock() {
    let (service, _, automaton, _) = setup(Some(PICK), None);
    service.route(
        Method::GET,
        SELECTION_SESSION,
        vec![session("BAN_PICK", 1000, json!([[pick_action(PICK)]]))],
    );
    service.route(Method::PATCH, &endpoints::action(21), vec![Reply::Ok(Value::Null)]);

    automaton.tick().await;

    let writes = service.calls_to(Method::PATCH, &endpoints::action(21));
    assert_eq!(writes.len(), 1);
    assert_eq!(lock_calls(&service), 1);
    // Only the initial read; no verification read was needed.
    assert_eq!(service.calls_to(Method::GET, SELECTION_SESSION).len(), 1);
}

#[tokio::test]
async fn test_lock_falls_back_to_completion_endpoint() {
    let (service, _, automaton, _) = setup(Some(PICK), None);
    service.route(
        Method::GET,
        SELECTION_SESSION,
        vec![session("BAN_PICK", 1000, json!([[pick_action(PICK)]]))],
    );
    service.route(Method::PATCH, &endpoints::action(21), vec![Reply::Status(500)]);
    service.route(
        Method::POST,
        &endpoints::action_complete(21),
        vec![Reply::Ok(Value::Null)],
    );

    automaton.tick().await;

    assert_eq!(service.calls_to(Method::POST, &endpoints::action_complete(21)).len(), 1);
    assert!(automaton.state().has_locked);
}

#[tokio::test]
async fn test_new_session_resets_progress() {
    let (service, _, automaton, _) = setup(Some(PICK), None);
    service.route(
        Method::GET,
        SELECTION_SESSION,
        vec![
            session("BAN_PICK", 1000, json!([[pick_action(PICK)]])),
            session("BAN_PICK", 2000, json!([[pick_action(PICK)]])),
        ],
    );
    service.route(Method::PATCH, &endpoints::action(21), vec![Reply::Ok(Value::Null)]);
    service.route(Method::PATCH, MY_SELECTION, vec![Reply::Ok(Value::Null)]);

    automaton.tick().await;
    let first = automaton.state();
    assert!(first.has_locked);

    automaton.tick().await;
    let second = automaton.state();
    assert_eq!(second.session_id, Some(2000));
    assert!(second.version > first.version);
    assert_eq!(lock_calls(&service), 2);
    assert_eq!(service.calls_to(Method::PATCH, MY_SELECTION).len(), 2);
}

#[tokio::test]
async fn test_session_end_resets_state() {
    let (service, _, automaton, _) = setup(Some(PICK), None);
    service.route(
        Method::GET,
        SELECTION_SESSION,
        vec![
            session("PLANNING", 1000, json!([])),
            Reply::Status(404),
        ],
    );
    service.route(Method::PATCH, MY_SELECTION, vec![Reply::Ok(Value::Null)]);

    automaton.tick().await;
    assert!(automaton.state().has_pre_picked);

    automaton.tick().await;
    let state = automaton.state();
    assert!(!state.has_pre_picked);
    assert_eq!(state.session_id, None);
    assert_eq!(automaton.stage(), SelectionStage::NoSession);
}

#[tokio::test]
async fn test_transport_failure_keeps_progress() {
    let (service, _, automaton, _) = setup(Some(PICK), None);
    service.route(
        Method::GET,
        SELECTION_SESSION,
        vec![session("PLANNING", 1000, json!([])), Reply::Status(503)],
    );
    service.route(Method::PATCH, MY_SELECTION, vec![Reply::Ok(Value::Null)]);

    automaton.tick().await;
    automaton.tick().await;

    let state = automaton.state();
    assert!(state.has_pre_picked);
    assert_eq!(state.session_id, Some(1000));
}

#[tokio::test]
async fn test_disabled_makes_no_calls() {
    let (service, _, automaton, settings) = setup(Some(PICK), Some(BAN));
    settings.set_selection(AutomationSettings::new(false, Some(PICK), Some(BAN)));

    automaton.tick().await;

    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_rejected_pick_write_keeps_session_progress() {
    let (service, _, automaton, _) = setup(Some(PICK), Some(BAN));
    service.route(
        Method::GET,
        SELECTION_SESSION,
        vec![session(
            "BAN_PICK",
            1000,
            json!([[ban_action(false)], [pick_action(0)]]),
        )],
    );
    service.route(Method::PATCH, &endpoints::action(11), vec![Reply::Ok(Value::Null)]);
    service.route(
        Method::POST,
        &endpoints::action_complete(11),
        vec![Reply::Ok(Value::Null)],
    );
    service.route(Method::PATCH, MY_SELECTION, vec![Reply::Ok(Value::Null)]);
    service.route(Method::PATCH, &endpoints::action(21), vec![Reply::Status(404)]);

    automaton.tick().await;
    let first = automaton.state();
    assert_eq!(first.session_id, Some(1000));
    assert!(first.has_banned && first.has_pre_picked);

    automaton.tick().await;

    let second = automaton.state();
    assert_eq!(second.version, first.version);
    assert!(second.has_banned && second.has_pre_picked);
    assert_eq!(service.calls_to(Method::PATCH, &endpoints::action(11)).len(), 1);
    assert_eq!(service.calls_to(Method::POST, &endpoints::action_complete(11)).len(), 1);
    assert_eq!(service.calls_to(Method::PATCH, MY_SELECTION).len(), 1);
    assert_eq!(service.calls_to(Method::PATCH, &endpoints::action(21)).len(), 2);
}

#[tokio::test]
async fn test_rejected_lock_completion_is_retried() {
    let (service, _, automaton, _) = setup(Some(PICK), None);
    service.route(
        Method::GET,
        SELECTION_SESSION,
        vec![session("BAN_PICK", 1000, json!([[pick_action(PICK)]]))],
    );
    service.route(Method::PATCH, MY_SELECTION, vec![Reply::Ok(Value::Null)]);
    service.route(Method::PATCH, &endpoints::action(21), vec![Reply::Status(500)]);
    service.route(
        Method::POST,
        &endpoints::action_complete(21),
        vec![Reply::Status(404), Reply::Ok(Value::Null)],
    );

    automaton.tick().await;
    let first = automaton.state();
    assert!(first.has_picked && !first.has_locked);
    assert_eq!(first.session_id, Some(1000));

    automaton.tick().await;
    assert!(automaton.state().has_locked);
    assert_eq!(service.calls_to(Method::POST, &endpoints::action_complete(21)).len(), 2);
}

#[tokio::test]
async fn test_client_not_running_is_silent() {
    let service = ScriptedService::new();
    let sink = RecordingSink::new();
    let settings = settings();
    settings.set_selection(AutomationSettings::new(true, Some(PICK), Some(BAN)));
    let automaton = SelectionAutomaton::new(
        connection(service.clone(), false),
        settings,
        sink.clone(),
    );

    automaton.tick().await;
    automaton.tick().await;

    assert!(service.calls().is_empty());
    assert!(sink.events().is_empty());
    assert_eq!(automaton.stage(), SelectionStage::NoSession);
}
