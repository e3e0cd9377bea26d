//! Synthetic keyboard input through `wtype`.

use crate::command::{command_exists, run_checked, run_with_stdin};
use crate::traits::{Key, Keyboard};
use crate::{OsError, OsResult};
use async_trait::async_trait;

fn validate_text(text: &str) -> OsResult<()> {
    if text.contains('\0') {
        return Err(OsError::InvalidArgument(
            "text contains null byte".to_string(),
        ));
    }
    Ok(())
}

/// Key name as `wtype` understands it (xkb keysym or modifier name).
pub fn key_name(key: Key) -> &'static str {
    match key {
        Key::Control => "ctrl",
        Key::A => "a",
        Key::Delete => "Delete",
        Key::Tab => "Tab",
        Key::Enter => "Return",
    }
}

fn is_modifier(key: Key) -> bool {
    matches!(key, Key::Control)
}

/// Arguments for holding `modifier` while tapping `key`.
pub fn chord_args(modifier: Key, key: Key) -> OsResult<Vec<&'static str>> {
    if !is_modifier(modifier) || is_modifier(key) {
        return Err(OsError::InvalidArgument(
            "chord requires one modifier and one regular key".to_string(),
        ));
    }
    let modifier = key_name(modifier);
    Ok(vec!["-M", modifier, "-k", key_name(key), "-m", modifier])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WtypeKeyboard;

impl WtypeKeyboard {
    pub fn new() -> Self {
        Self
    }

    async fn ensure_backend(&self) -> OsResult<()> {
        if command_exists("wtype").await {
            return Ok(());
        }
        Err(OsError::Unavailable(
            "wtype not found (install 'wtype')".to_string(),
        ))
    }
}

#[async_trait]
impl Keyboard for WtypeKeyboard {
    async fn press(&self, key: Key) -> OsResult<()> {
        if is_modifier(key) {
            return Err(OsError::InvalidArgument(
                "modifiers can only be used in chords".to_string(),
            ));
        }
        self.ensure_backend().await?;
        run_checked("wtype", &["-k", key_name(key)]).await
    }

    async fn chord(&self, modifier: Key, key: Key) -> OsResult<()> {
        let args = chord_args(modifier, key)?;
        self.ensure_backend().await?;
        run_checked("wtype", &args).await
    }

    async fn type_text(&self, text: &str) -> OsResult<()> {
        validate_text(text)?;
        if text.is_empty() {
            return Ok(());
        }
        self.ensure_backend().await?;
        // "-" makes wtype read the text from stdin.
        run_with_stdin("wtype", &["-"], text).await
    }
}
