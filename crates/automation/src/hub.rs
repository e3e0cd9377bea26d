use crate::account::{AccountWatcher, ACCOUNT_INTERVAL};
use crate::poller::Poller;
use crate::ready_check::{ReadyCheckAutomaton, READY_CHECK_INTERVAL};
use crate::selection::{SelectionAutomaton, SelectionStage, SELECTION_INTERVAL};
use crate::settings::{AutomationSettings, SharedSettings};
use crate::status::StatusSink;
use queue_pilot_client::ClientConnection;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// The three pollers plus the settings they read, behind one handle.
pub struct AutomationHub {
    settings: SharedSettings,
    connection: ClientConnection,
    selection: Arc<SelectionAutomaton>,
    pollers: Vec<Poller>,
}

impl AutomationHub {
    pub fn new(
        connection: ClientConnection,
        settings: SharedSettings,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        let ready_check = Arc::new(ReadyCheckAutomaton::new(
            connection.clone(),
            settings.clone(),
            Arc::clone(&sink),
        ));
        let selection = Arc::new(SelectionAutomaton::new(
            connection.clone(),
            settings.clone(),
            Arc::clone(&sink),
        ));
        let account = Arc::new(AccountWatcher::new(connection.clone(), sink));

        let pollers = vec![
            Poller::new(ready_check, READY_CHECK_INTERVAL),
            Poller::new(selection.clone(), SELECTION_INTERVAL),
            Poller::new(account, ACCOUNT_INTERVAL),
        ];

        Self {
            settings,
            connection,
            selection,
            pollers,
        }
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn start(&self) {
        for poller in &self.pollers {
            poller.start();
        }
    }

    pub async fn shutdown(&self) {
        for poller in &self.pollers {
            poller.shutdown().await;
        }
        info!("Automations stopped");
    }

    pub fn running(&self) -> Vec<(&'static str, bool)> {
        self.pollers
            .iter()
            .map(|poller| (poller.name(), poller.is_running()))
            .collect()
    }

    pub fn client_path(&self) -> Option<PathBuf> {
        self.settings.client_path()
    }

    /// A new path means a different client install, so the cached
    /// credential is dropped.
    pub fn set_client_path(&self, path: Option<PathBuf>) {
        if self.settings.set_client_path(path) {
            info!("Client path changed, dropping cached credential");
            self.connection.credentials().invalidate();
        }
    }

    pub fn auto_accept(&self) -> bool {
        self.settings.auto_accept()
    }

    pub fn set_auto_accept(&self, enabled: bool) {
        self.settings.set_auto_accept(enabled);
    }

    pub fn selection(&self) -> AutomationSettings {
        self.settings.selection()
    }

    pub fn set_selection(&self, selection: AutomationSettings) {
        self.settings.set_selection(selection);
    }

    pub fn selection_stage(&self) -> SelectionStage {
        self.selection.stage()
    }
}
