//! OS capability layer used by the automations.
//!
//! Everything the login flow needs from the desktop sits behind a trait:
//! - Process listing, termination and detached launch
//! - Window enumeration and focus
//! - Synthetic keyboard input
//! - On-screen marker detection
//!
//! The concrete backends shell out to `hyprctl`, `wtype`, `grim` and
//! `tesseract`, and use `sysinfo` for the process table.

pub mod command;
pub mod hyprland;
pub mod keyboard;
pub mod process;
pub mod screen;
pub mod traits;

pub use hyprland::HyprlandWindows;
pub use keyboard::WtypeKeyboard;
pub use process::SystemProcesses;
pub use screen::OcrProbe;
pub use traits::{Key, Keyboard, ProcessControl, VisualProbe, WindowInfo, WindowLocator};

/// OS capability error types
#[derive(Debug, thiserror::Error)]
pub enum OsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type OsResult<T> = Result<T, OsError>;
