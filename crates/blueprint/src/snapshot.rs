//! Local snapshot of the chat collection, written as one blob on every
//! change so history survives offline. The backend stays the source of
//! truth; the snapshot only has to load best-effort.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::models::chat::Chat;

pub fn snapshot_dir() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let config_dir = home_dir.join(".config").join("blueprint");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn snapshot_path() -> Result<PathBuf> {
    Ok(snapshot_dir()?.join("chats.json"))
}

/// Write the full collection as one blob.
pub fn save_snapshot(path: &Path, chats: &[Chat]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    serde_json::to_writer(&mut writer, chats)?;
    writer.flush()?;
    Ok(())
}

/// Load the snapshot. A missing or unreadable snapshot is an empty history,
/// never an error that blocks startup.
pub fn load_snapshot(path: &Path) -> Vec<Chat> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str(&raw) {
        Ok(chats) => chats,
        Err(err) => {
            tracing::warn!(%err, "ignoring unreadable chat snapshot");
            Vec::new()
        }
    }
}
