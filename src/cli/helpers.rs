//! Shared helper functions for CLI commands.

use std::sync::Arc;

use crate::config::Settings;
use crate::repository::{open_store, ProspectStore};

/// Open the configured store, creating the data directory first.
pub async fn open_configured_store(settings: &Settings) -> anyhow::Result<Arc<dyn ProspectStore>> {
    settings.ensure_directories()?;
    Ok(open_store(&settings.database_url()).await?)
}

/// Truncate a string to `max` characters, adding an ellipsis when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Split a comma-separated argument, trimming entries and dropping blanks.
pub fn split_csv(value: Option<&str>) -> Vec<String> {
    crate::server::validation::split_list(value)
}
