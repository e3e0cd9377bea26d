//! Hyprland window lookup and focus

use crate::command::run_output;
use crate::process::executable_names;
use crate::traits::{WindowInfo, WindowLocator};
use crate::{OsError, OsResult};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

fn validate_window_selector(window_id: &str) -> OsResult<()> {
    if window_id.is_empty() {
        return Err(OsError::InvalidArgument(
            "window selector cannot be empty".to_string(),
        ));
    }
    if !window_id
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ':' | '_' | '-' | '.'))
    {
        return Err(OsError::InvalidArgument(
            "window selector contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

fn parse_client(value: &Value) -> Option<WindowInfo> {
    let address = value.get("address")?.as_str()?;
    if address.is_empty() {
        return None;
    }
    let title = value
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let pid = value
        .get("pid")
        .and_then(Value::as_i64)
        .and_then(|pid| u32::try_from(pid).ok());
    let module = value
        .get("class")
        .and_then(Value::as_str)
        .filter(|class| !class.is_empty())
        .map(str::to_string);

    Some(WindowInfo {
        id: format!("address:{address}"),
        title,
        module,
        pid,
    })
}

/// Parse `hyprctl clients -j` output.
pub fn parse_clients(raw: &str) -> OsResult<Vec<WindowInfo>> {
    let json: Vec<Value> =
        serde_json::from_str(raw).map_err(|e| OsError::OperationFailed(e.to_string()))?;
    Ok(json.iter().filter_map(parse_client).collect())
}

/// Parse `hyprctl activewindow -j` output; `{}` means nothing is focused.
pub fn parse_active(raw: &str) -> OsResult<Option<WindowInfo>> {
    let json: Value =
        serde_json::from_str(raw).map_err(|e| OsError::OperationFailed(e.to_string()))?;
    Ok(parse_client(&json))
}

/// Window backend driving a Hyprland session through `hyprctl`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyprlandWindows;

impl HyprlandWindows {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WindowLocator for HyprlandWindows {
    async fn windows(&self) -> OsResult<Vec<WindowInfo>> {
        let raw = run_output("hyprctl", &["clients", "-j"]).await?;
        let mut windows = parse_clients(&raw)?;

        // Prefer the owning executable over the window class when we can see it.
        let pids = windows.iter().filter_map(|w| w.pid).collect::<Vec<u32>>();
        let names = executable_names(pids).await?;
        for window in &mut windows {
            if let Some(name) = window.pid.and_then(|pid| names.get(&pid)) {
                window.module = Some(name.clone());
            }
        }
        Ok(windows)
    }

    async fn active_window(&self) -> OsResult<Option<WindowInfo>> {
        let raw = run_output("hyprctl", &["activewindow", "-j"]).await?;
        parse_active(&raw)
    }

    async fn focus(&self, window: &WindowInfo) -> OsResult<()> {
        validate_window_selector(&window.id)?;
        let output = Command::new("hyprctl")
            .args(["dispatch", "focuswindow", window.id.as_str()])
            .output()
            .await?;

        if !output.status.success() {
            return Err(OsError::OperationFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        Ok(())
    }
}
