//! Discovery and caching of the client service's port and token.
//!
//! The token rotates every time the game client restarts, so nothing here is
//! trusted for longer than the refresh interval.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const LOOPBACK_HOST: &str = "127.0.0.1";
pub const CLIENT_EXECUTABLE: &str = "LeagueClientUx.exe";
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

const PORT_FLAG: &str = "--app-port=";
const TOKEN_FLAG: &str = "--remoting-auth-token=";

/// Read-only view of running processes.
#[async_trait]
pub trait ProcessInspector: Send + Sync {
    /// Command line arguments of every process whose executable name matches
    /// `executable` (case-insensitive). Inspection failures yield no entries.
    async fn command_lines(&self, executable: &str) -> Vec<Vec<String>>;
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    port: u16,
    token: String,
    acquired_at: Instant,
}

impl Credential {
    pub fn new(port: u16, token: impl Into<String>) -> Self {
        Self {
            port,
            token: token.into(),
            acquired_at: Instant::now(),
        }
    }

    pub fn host(&self) -> &'static str {
        LOOPBACK_HOST
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }

    pub fn age(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.host(), self.port)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("host", &self.host())
            .field("port", &self.port)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Extract port and token from a client command line.
///
/// Arguments are joined before scanning because some platforms report the
/// whole command line as a single argument.
pub fn parse_command_line(args: &[String]) -> Option<(u16, String)> {
    let line = args.join(" ");

    let port = flag_value(&line, PORT_FLAG, |ch| ch.is_ascii_digit())?
        .parse::<u16>()
        .ok()?;
    let token = flag_value(&line, TOKEN_FLAG, |ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-')
    })?
    .replace(['"', '\''], "");

    if token.is_empty() {
        return None;
    }
    Some((port, token))
}

fn flag_value<'a>(line: &'a str, flag: &str, accept: impl Fn(char) -> bool) -> Option<&'a str> {
    let start = line.find(flag)? + flag.len();
    let rest = line[start..].trim_start_matches(['"', '\'']);
    let end = rest
        .char_indices()
        .find(|(_, ch)| !accept(*ch))
        .map(|(idx, _)| idx)
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(&rest[..end])
}

pub struct CredentialProvider {
    inspector: Arc<dyn ProcessInspector>,
    executable: String,
    refresh_interval: Duration,
    cache: Mutex<Option<Credential>>,
}

impl CredentialProvider {
    pub fn new(inspector: Arc<dyn ProcessInspector>) -> Self {
        Self {
            inspector,
            executable: CLIENT_EXECUTABLE.to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            cache: Mutex::new(None),
        }
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }

    /// Current credential, re-derived from the process list once the cached
    /// one is older than the refresh interval. `None` means the client
    /// service is not running.
    pub async fn acquire(&self) -> Option<Credential> {
        if let Some(cached) = self.cached() {
            return Some(cached);
        }

        let discovered = self
            .inspector
            .command_lines(&self.executable)
            .await
            .iter()
            .find_map(|args| parse_command_line(args))
            .map(|(port, token)| Credential::new(port, token));

        let mut cache = self.cache.lock();
        match &discovered {
            Some(credential) => {
                if cache.as_ref().map(Credential::port) != Some(credential.port()) {
                    info!("Client service discovered on port {}", credential.port());
                }
            }
            None => {
                if cache.is_some() {
                    info!("Client service no longer running");
                }
                debug!("No {} process with credentials found", self.executable);
            }
        }
        *cache = discovered.clone();
        discovered
    }

    /// Fresh cached credential, if any.
    pub fn cached(&self) -> Option<Credential> {
        self.cache
            .lock()
            .as_ref()
            .filter(|credential| credential.age() < self.refresh_interval)
            .cloned()
    }

    /// Drop the cached credential so the next `acquire` rediscovers it.
    pub fn invalidate(&self) {
        if self.cache.lock().take().is_some() {
            debug!("Cached client credential invalidated");
        }
    }
}
