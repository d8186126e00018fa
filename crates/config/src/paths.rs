//! Data directory layout

use std::path::{Path, PathBuf};

/// Root data directory (~/.concierge)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".concierge"))
        .unwrap_or_else(|| PathBuf::from(".concierge"))
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Default conversation store directory
pub fn conversations_dir() -> PathBuf {
    data_dir().join("conversations")
}

/// Ensure directory exists
pub async fn ensure_dir(path: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}
