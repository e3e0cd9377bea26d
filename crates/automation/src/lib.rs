//! Background automations for the game client.
//!
//! Three pollers share one [`ClientConnection`](queue_pilot_client::ClientConnection):
//! - ready-check acceptance
//! - champion selection (ban, pre-pick, pick and lock)
//! - signed-in account tracking
//!
//! The login automator is separate and runs on demand.

pub mod account;
pub mod hub;
pub mod login;
pub mod poller;
pub mod ready_check;
pub mod selection;
pub mod settings;
pub mod status;

pub use account::AccountWatcher;
pub use hub::AutomationHub;
pub use login::{
    FocusPolicy, LoginAutomator, LoginError, LoginGuard, LoginRequest, LoginTimings,
    WindowMatcher,
};
pub use poller::{Automaton, Poller};
pub use ready_check::{ReadyCheckAutomaton, ReadyCheckState};
pub use selection::{SelectionAutomaton, SelectionStage, SelectionState, SelectionTimings};
pub use settings::{AutomationSettings, SharedSettings};
pub use status::{
    AccountSnapshot, BroadcastSink, ErrorThrottle, StatusEvent, StatusKind, StatusSink,
    StatusUpdate, TracingSink,
};
