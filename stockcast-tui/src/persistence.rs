//! App state persistence: JSON save/load across restarts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use stockcast_core::domain::Ticker;

use crate::app::{AppState, Overlay, Panel};

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub ticker: Option<String>,
    pub years: u32,
    pub active_panel: Panel,
    pub welcome_dismissed: bool,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            ticker: None,
            years: 1,
            active_panel: Panel::Raw,
            welcome_dismissed: false,
        }
    }
}

/// Load persisted state from disk. Returns defaults if file is missing or corrupt.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt state file");
            PersistedState::default()
        }),
        Err(_) => PersistedState::default(),
    }
}

/// Save persisted state to disk. Creates parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Extract persisted state from AppState.
pub fn extract(app: &AppState) -> PersistedState {
    PersistedState {
        ticker: app.ticker().map(|t| t.to_string()),
        years: app.years,
        active_panel: app.active_panel,
        welcome_dismissed: app.overlay != Overlay::Welcome,
    }
}

/// Apply persisted state to AppState.
///
/// A ticker no longer in the configured set is ignored; years are clamped to
/// the configured bounds.
pub fn apply(app: &mut AppState, state: PersistedState) {
    if let Some(ticker) = state.ticker.as_deref().and_then(|s| Ticker::parse(s).ok()) {
        if !app.select_ticker(&ticker) {
            tracing::info!(%ticker, "persisted ticker not in configured set");
        }
    }
    app.set_years(state.years);
    app.active_panel = state.active_panel;
    if !state.welcome_dismissed {
        app.overlay = Overlay::Welcome;
    }
}
