//! On-screen marker detection: screenshot with `grim`, read it with
//! `tesseract`, look for a text marker.

use crate::command::{command_exists, run_checked, run_output};
use crate::traits::VisualProbe;
use crate::{OsError, OsResult};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Recognized words from `tesseract ... tsv` output, in reading order.
/// Rows without text or with a negative confidence (layout rows) are skipped.
pub fn parse_tsv_words(tsv: &str) -> Vec<String> {
    tsv.lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 12 {
                return None;
            }
            let text = cols[11].trim();
            let conf = cols[10].parse::<f32>().unwrap_or(-1.0);
            (!text.is_empty() && conf >= 0.0).then(|| text.to_string())
        })
        .collect()
}

/// Case-insensitive search for `marker` among recognized words. Multi-word
/// markers match against the joined text.
pub fn contains_marker(words: &[String], marker: &str) -> bool {
    let marker = marker.trim().to_lowercase();
    if marker.is_empty() {
        return false;
    }
    words.join(" ").to_lowercase().contains(&marker)
}

/// Probe that confirms the login form by finding a label on screen.
#[derive(Debug, Clone)]
pub struct OcrProbe {
    marker: Option<String>,
    lang: Option<String>,
}

impl OcrProbe {
    pub fn new(marker: Option<String>) -> Self {
        Self {
            marker: marker.filter(|m| !m.trim().is_empty()),
            lang: None,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    fn shot_path() -> PathBuf {
        std::env::temp_dir().join(format!(
            "queue-pilot-probe-{}.png",
            chrono::Utc::now().timestamp_millis()
        ))
    }
}

#[async_trait]
impl VisualProbe for OcrProbe {
    async fn available(&self) -> bool {
        self.marker.is_some() && command_exists("grim").await && command_exists("tesseract").await
    }

    async fn is_visible(&self) -> OsResult<bool> {
        let marker = self
            .marker
            .as_deref()
            .ok_or_else(|| OsError::Unavailable("no visual marker configured".to_string()))?;

        let shot = Self::shot_path();
        let shot_str = shot.to_string_lossy().to_string();
        run_checked("grim", &[&shot_str]).await?;

        let mut args = vec![shot_str.as_str(), "stdout", "tsv"];
        if let Some(lang) = &self.lang {
            args.push("-l");
            args.push(lang);
        }
        let tsv = run_output("tesseract", &args).await;
        let _ = tokio::fs::remove_file(&shot).await;

        let words = parse_tsv_words(&tsv?);
        let found = contains_marker(&words, marker);
        debug!("Visual probe read {} words, marker found: {}", words.len(), found);
        Ok(found)
    }
}
