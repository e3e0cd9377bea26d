//! Hands-free sign-in: restart the client, find its login window and type
//! the stored credentials into it.
//!
//! Only one login runs at a time across the process. Every step is reported
//! to the status sink; the secret never appears in logs or events.

use crate::settings::normalize_path;
use crate::status::{StatusEvent, StatusKind, StatusSink};
use parking_lot::Mutex;
use queue_pilot_desktop::{
    Key, Keyboard, OsError, ProcessControl, VisualProbe, WindowInfo, WindowLocator,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Client processes closed before a fresh launch.
pub const CLIENT_PROCESSES: [&str; 6] = [
    "LeagueClient.exe",
    "LeagueClientUx.exe",
    "LeagueClientUxRender.exe",
    "LeagueClientOptimus.exe",
    "RiotClientServices.exe",
    "RiotClientCrashHandler.exe",
];

pub const LAUNCH_ARGS: [&str; 2] = [
    "--launch-product=league_of_legends",
    "--launch-patchline=live",
];

pub mod steps {
    pub const CLOSE_CLIENTS: &str = "close-clients";
    pub const LAUNCH_CLIENT: &str = "launch-client";
    pub const WAIT_LOGIN_WINDOW: &str = "wait-login-window";
    pub const FOCUS_WINDOW: &str = "focus-window";
    pub const TYPE_CREDENTIALS: &str = "type-credentials";
    pub const CONFIRM_LOGIN: &str = "confirm-login";
    pub const COMPLETED: &str = "completed";
    pub const ERROR: &str = "error";
}

#[derive(Clone)]
pub struct LoginRequest {
    pub account_id: String,
    pub username: String,
    pub secret: String,
    pub client_path: Option<PathBuf>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("account_id", &self.account_id)
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .field("client_path", &self.client_path)
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Missing account identifier")]
    MissingAccountId,

    #[error("Missing username or password for this account")]
    MissingCredentials,

    #[error("Client path is not configured; set it before logging in")]
    MissingClientPath,

    #[error("A login is already in progress for account {0}")]
    Busy(String),

    #[error("Failed to launch the client: {0}")]
    Launch(String),

    #[error("Login window did not appear within {0:?}; check that the client started")]
    WindowTimeout(Duration),

    #[error("Could not bring the login window to the foreground")]
    FocusNotConfirmed,

    #[error("Keyboard input failed: {0}")]
    Input(String),
}

fn input_error(err: OsError) -> LoginError {
    LoginError::Input(err.to_string())
}

/// What to do when the login window cannot be confirmed in front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusPolicy {
    /// Log a warning and type anyway.
    #[default]
    Lenient,
    /// Fail the login.
    Strict,
}

#[derive(Debug, Clone)]
pub struct LoginTimings {
    pub launch_settle: Duration,
    pub window_timeout: Duration,
    pub window_poll_interval: Duration,
    pub focus_attempts: u32,
    pub focus_settle: Duration,
    pub visual_timeout: Duration,
    pub visual_poll_interval: Duration,
    pub post_focus_settle: Duration,
    pub clear_settle: Duration,
    pub type_settle: Duration,
    pub tab_settle: Duration,
    pub submit_settle: Duration,
}

impl Default for LoginTimings {
    fn default() -> Self {
        Self {
            launch_settle: Duration::from_secs(2),
            window_timeout: Duration::from_secs(90),
            window_poll_interval: Duration::from_secs(1),
            focus_attempts: 4,
            focus_settle: Duration::from_secs(2),
            visual_timeout: Duration::from_secs(6),
            visual_poll_interval: Duration::from_millis(500),
            post_focus_settle: Duration::from_secs(2),
            clear_settle: Duration::from_millis(150),
            type_settle: Duration::from_millis(200),
            tab_settle: Duration::from_millis(120),
            submit_settle: Duration::from_millis(500),
        }
    }
}

impl LoginTimings {
    /// No waits at all; window and visual searches look exactly once.
    pub fn immediate() -> Self {
        Self {
            launch_settle: Duration::ZERO,
            window_timeout: Duration::ZERO,
            window_poll_interval: Duration::ZERO,
            focus_attempts: 4,
            focus_settle: Duration::ZERO,
            visual_timeout: Duration::ZERO,
            visual_poll_interval: Duration::ZERO,
            post_focus_settle: Duration::ZERO,
            clear_settle: Duration::ZERO,
            type_settle: Duration::ZERO,
            tab_settle: Duration::ZERO,
            submit_settle: Duration::ZERO,
        }
    }
}

/// Recognizes the client's login window, by title or owning executable.
#[derive(Debug, Clone)]
pub struct WindowMatcher {
    titles: Vec<String>,
    modules: Vec<String>,
    foreground_titles: Vec<String>,
}

impl Default for WindowMatcher {
    fn default() -> Self {
        let owned = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        };
        Self {
            titles: owned(&["riot client", "league of legends", "connexion", "login"]),
            modules: owned(&["riot client.exe"]),
            foreground_titles: owned(&["riot client", "league of legends", "connexion"]),
        }
    }
}

impl WindowMatcher {
    pub fn matches(&self, window: &WindowInfo) -> bool {
        let title = window.title.to_lowercase();
        if self.titles.iter().any(|needle| title.contains(needle)) {
            return true;
        }
        window
            .module
            .as_deref()
            .map(str::to_lowercase)
            .is_some_and(|module| self.modules.iter().any(|suffix| module.ends_with(suffix)))
    }

    /// Whether `active` is the login window, or at least looks like the client.
    pub fn is_foreground(&self, active: &WindowInfo, target: &WindowInfo) -> bool {
        if active.id == target.id {
            return true;
        }
        let title = active.title.to_lowercase();
        self.foreground_titles
            .iter()
            .any(|needle| title.contains(needle))
    }
}

/// Process-wide single-flight gate for logins.
#[derive(Debug, Clone, Default)]
pub struct LoginGuard {
    active: Arc<Mutex<Option<String>>>,
}

/// Held for the duration of one login; dropping it frees the guard.
#[derive(Debug)]
pub struct LoginTicket {
    active: Arc<Mutex<Option<String>>>,
    account_id: String,
}

impl LoginGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, account_id: &str) -> Result<LoginTicket, LoginError> {
        let mut active = self.active.lock();
        if let Some(current) = active.as_ref() {
            return Err(LoginError::Busy(current.clone()));
        }
        *active = Some(account_id.to_string());
        Ok(LoginTicket {
            active: Arc::clone(&self.active),
            account_id: account_id.to_string(),
        })
    }

    pub fn active_account(&self) -> Option<String> {
        self.active.lock().clone()
    }
}

impl LoginTicket {
    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

impl Drop for LoginTicket {
    fn drop(&mut self) {
        *self.active.lock() = None;
    }
}

/// `<client dir>/../League of Legends/lockfile`.
pub fn lockfile_path(client_path: &Path) -> Option<PathBuf> {
    let install_root = client_path.parent()?.parent()?;
    Some(install_root.join("League of Legends").join("lockfile"))
}

pub struct LoginAutomator {
    processes: Arc<dyn ProcessControl>,
    windows: Arc<dyn WindowLocator>,
    keyboard: Arc<dyn Keyboard>,
    probe: Option<Arc<dyn VisualProbe>>,
    sink: Arc<dyn StatusSink>,
    guard: LoginGuard,
    timings: LoginTimings,
    focus_policy: FocusPolicy,
    matcher: WindowMatcher,
}

impl LoginAutomator {
    pub fn new(
        processes: Arc<dyn ProcessControl>,
        windows: Arc<dyn WindowLocator>,
        keyboard: Arc<dyn Keyboard>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            processes,
            windows,
            keyboard,
            probe: None,
            sink,
            guard: LoginGuard::new(),
            timings: LoginTimings::default(),
            focus_policy: FocusPolicy::default(),
            matcher: WindowMatcher::default(),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn VisualProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn with_guard(mut self, guard: LoginGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_timings(mut self, timings: LoginTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_focus_policy(mut self, policy: FocusPolicy) -> Self {
        self.focus_policy = policy;
        self
    }

    pub fn with_matcher(mut self, matcher: WindowMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn guard(&self) -> &LoginGuard {
        &self.guard
    }

    pub async fn login(&self, request: LoginRequest) -> Result<(), LoginError> {
        let account = request.account_id.clone();
        let (_ticket, client_path) = match self.prepare(&request) {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(account = %account, "Login rejected: {}", err);
                self.emit(&account, steps::ERROR, StatusKind::Error, err.to_string());
                return Err(err);
            }
        };

        info!(account = %account, "Login started");
        match self.run(&request, &client_path).await {
            Ok(()) => {
                info!(account = %account, "Login sequence finished");
                self.emit(
                    &account,
                    steps::COMPLETED,
                    StatusKind::Success,
                    "Credentials submitted. Finish any extra verification in the client.",
                );
                Ok(())
            }
            Err(err) => {
                warn!(account = %account, "Login failed: {}", err);
                self.emit(&account, steps::ERROR, StatusKind::Error, err.to_string());
                Err(err)
            }
        }
    }

    fn prepare(&self, request: &LoginRequest) -> Result<(LoginTicket, PathBuf), LoginError> {
        if request.account_id.trim().is_empty() {
            return Err(LoginError::MissingAccountId);
        }
        if request.username.is_empty() || request.secret.is_empty() {
            return Err(LoginError::MissingCredentials);
        }
        let client_path = request
            .client_path
            .as_deref()
            .and_then(|path| normalize_path(&path.to_string_lossy()))
            .ok_or(LoginError::MissingClientPath)?;
        let ticket = self.guard.try_acquire(&request.account_id)?;
        Ok((ticket, client_path))
    }

    async fn run(&self, request: &LoginRequest, client_path: &Path) -> Result<(), LoginError> {
        let account = request.account_id.as_str();

        self.emit(
            account,
            steps::CLOSE_CLIENTS,
            StatusKind::Info,
            "Closing running client processes.",
        );
        self.close_clients().await;
        if let Some(lockfile) = lockfile_path(client_path) {
            self.remove_lockfile(&lockfile).await;
        }

        self.emit(
            account,
            steps::LAUNCH_CLIENT,
            StatusKind::Info,
            "Starting the client.",
        );
        self.launch(client_path).await?;

        self.emit(
            account,
            steps::WAIT_LOGIN_WINDOW,
            StatusKind::Info,
            "Waiting for the login window.",
        );
        let window = self.wait_for_window().await?;

        self.emit(
            account,
            steps::FOCUS_WINDOW,
            StatusKind::Info,
            "Bringing the login window to the front.",
        );
        self.bring_to_front(&window).await?;
        self.confirm_visually().await;

        self.emit(
            account,
            steps::TYPE_CREDENTIALS,
            StatusKind::Info,
            "Typing credentials.",
        );
        self.type_credentials(&request.username, &request.secret)
            .await?;

        self.emit(
            account,
            steps::CONFIRM_LOGIN,
            StatusKind::Info,
            "Submitting the login form.",
        );
        self.keyboard.press(Key::Enter).await.map_err(input_error)?;
        sleep(self.timings.submit_settle).await;
        Ok(())
    }

    async fn close_clients(&self) {
        for name in CLIENT_PROCESSES {
            match self.processes.terminate(name).await {
                Ok(0) => {}
                Ok(count) => debug!("Closed {} {} process(es)", count, name),
                Err(err) => debug!("Could not close {}: {}", name, err),
            }
        }
    }

    async fn remove_lockfile(&self, lockfile: &Path) {
        match tokio::fs::remove_file(lockfile).await {
            Ok(()) => debug!("Removed stale lockfile {}", lockfile.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("Could not remove lockfile {}: {}", lockfile.display(), err),
        }
    }

    async fn launch(&self, client_path: &Path) -> Result<(), LoginError> {
        let args = LAUNCH_ARGS.iter().map(|a| a.to_string()).collect::<Vec<_>>();
        let pid = self
            .processes
            .spawn_detached(client_path, &args)
            .await
            .map_err(|err| LoginError::Launch(err.to_string()))?;
        debug!(pid, "Client launched");
        sleep(self.timings.launch_settle).await;
        Ok(())
    }

    async fn wait_for_window(&self) -> Result<WindowInfo, LoginError> {
        let deadline = Instant::now() + self.timings.window_timeout;
        loop {
            match self.windows.windows().await {
                Ok(windows) => {
                    if let Some(window) = windows.into_iter().find(|w| self.matcher.matches(w)) {
                        debug!(title = %window.title, "Login window found");
                        return Ok(window);
                    }
                }
                Err(err) => debug!("Window listing failed: {}", err),
            }
            if Instant::now() >= deadline {
                return Err(LoginError::WindowTimeout(self.timings.window_timeout));
            }
            sleep(self.timings.window_poll_interval).await;
        }
    }

    async fn is_foreground(&self, target: &WindowInfo) -> bool {
        match self.windows.active_window().await {
            Ok(Some(active)) => self.matcher.is_foreground(&active, target),
            Ok(None) => false,
            Err(err) => {
                debug!("Active window lookup failed: {}", err);
                false
            }
        }
    }

    async fn bring_to_front(&self, window: &WindowInfo) -> Result<(), LoginError> {
        for attempt in 1..=self.timings.focus_attempts.max(1) {
            if let Err(err) = self.windows.focus(window).await {
                debug!(attempt, "Focus request failed: {}", err);
            }
            sleep(self.timings.focus_settle).await;
            if self.is_foreground(window).await {
                return Ok(());
            }
        }

        match self.focus_policy {
            FocusPolicy::Lenient => {
                warn!("Login window not confirmed in front, typing anyway");
                Ok(())
            }
            FocusPolicy::Strict => Err(LoginError::FocusNotConfirmed),
        }
    }

    /// Optional; a missing or failing probe only costs a warning.
    async fn confirm_visually(&self) {
        let probe = match &self.probe {
            Some(probe) if probe.available().await => probe,
            _ => {
                debug!("Visual confirmation skipped");
                sleep(self.timings.post_focus_settle).await;
                return;
            }
        };

        let deadline = Instant::now() + self.timings.visual_timeout;
        let mut seen = false;
        loop {
            match probe.is_visible().await {
                Ok(true) => {
                    seen = true;
                    break;
                }
                Ok(false) => {}
                Err(err) => {
                    warn!("Visual probe failed: {}", err);
                    break;
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            sleep(self.timings.visual_poll_interval).await;
        }
        if !seen {
            warn!("Login form not visually confirmed, continuing");
        }
        sleep(self.timings.post_focus_settle).await;
    }

    async fn replace_field(&self, text: &str) -> Result<(), LoginError> {
        self.keyboard
            .chord(Key::Control, Key::A)
            .await
            .map_err(input_error)?;
        self.keyboard.press(Key::Delete).await.map_err(input_error)?;
        sleep(self.timings.clear_settle).await;
        self.keyboard.type_text(text).await.map_err(input_error)?;
        sleep(self.timings.type_settle).await;
        Ok(())
    }

    async fn type_credentials(&self, username: &str, secret: &str) -> Result<(), LoginError> {
        self.replace_field(username).await?;
        self.keyboard.press(Key::Tab).await.map_err(input_error)?;
        sleep(self.timings.tab_settle).await;
        self.replace_field(secret).await
    }

    fn emit(&self, account: &str, step: &str, kind: StatusKind, message: impl Into<String>) {
        self.sink
            .emit(StatusEvent::new(step, kind, message).for_account(account));
    }
}
