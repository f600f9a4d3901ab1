// src/infra/paths.rs — Filesystem layout
//
// All paths respect the TALKART_HOME environment variable for isolation.
// When TALKART_HOME is set, config and data live under that directory.
// When unset, config uses ~/.talkart/ and data uses XDG_DATA_HOME/talkart.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

fn talkart_home() -> Option<PathBuf> {
    std::env::var_os("TALKART_HOME").map(PathBuf::from)
}

fn home_dir() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $TALKART_HOME/ or ~/.talkart/
pub fn config_dir() -> PathBuf {
    if let Some(home) = talkart_home() {
        return home;
    }
    home_dir().join(".talkart")
}

/// Data directory: $TALKART_HOME/data/ or ~/.local/share/talkart/
pub fn data_dir() -> PathBuf {
    if let Some(home) = talkart_home() {
        return home.join("data");
    }
    ProjectDirs::from("", "", "talkart")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| config_dir().join("data"))
}

/// Database path
pub fn db_path() -> PathBuf {
    data_dir().join("talkart.db")
}

/// Stored artwork images
pub fn images_dir() -> PathBuf {
    data_dir().join("images")
}

/// State directory: ~/.talkart/state/ (session history)
pub fn state_dir() -> PathBuf {
    config_dir().join("state")
}

/// Session history file
pub fn session_history_path() -> PathBuf {
    state_dir().join("sessions.json")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Ensure all required directories exist
pub async fn ensure_dirs() -> anyhow::Result<()> {
    for dir in [config_dir(), data_dir(), images_dir(), state_dir()] {
        tokio::fs::create_dir_all(&dir).await?;
    }
    Ok(())
}
