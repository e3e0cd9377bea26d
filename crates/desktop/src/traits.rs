use crate::OsResult;
use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    /// Backend-specific handle used to address the window.
    pub id: String,
    pub title: String,
    /// Executable that owns the window, when known.
    pub module: Option<String>,
    pub pid: Option<u32>,
}

#[async_trait]
pub trait WindowLocator: Send + Sync {
    async fn windows(&self) -> OsResult<Vec<WindowInfo>>;
    async fn active_window(&self) -> OsResult<Option<WindowInfo>>;
    async fn focus(&self, window: &WindowInfo) -> OsResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Control,
    A,
    Delete,
    Tab,
    Enter,
}

#[async_trait]
pub trait Keyboard: Send + Sync {
    /// Press and release a single key.
    async fn press(&self, key: Key) -> OsResult<()>;
    /// Hold `modifier`, press and release `key`, release `modifier`.
    async fn chord(&self, modifier: Key, key: Key) -> OsResult<()>;
    /// Type literal text into the focused window.
    async fn type_text(&self, text: &str) -> OsResult<()>;
}

#[async_trait]
pub trait ProcessControl: Send + Sync {
    /// Terminate every process with executable `name`. Returns how many were
    /// signalled; zero is not an error.
    async fn terminate(&self, name: &str) -> OsResult<usize>;

    /// Start `program` detached from this process with no stdio attached.
    async fn spawn_detached(&self, program: &Path, args: &[String]) -> OsResult<u32>;
}

#[async_trait]
pub trait VisualProbe: Send + Sync {
    /// Whether the probe has what it needs (marker, screenshot and matching
    /// backends) to run at all.
    async fn available(&self) -> bool;

    /// One look at the screen for the configured marker.
    async fn is_visible(&self) -> OsResult<bool>;
}
