//! Snapshot export/import of every live game.
//!
//! Snapshots back up a running event and restore it after a restart, either
//! through the admin API or the periodic autosave file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::AppState;
use crate::error::{GameError, GameResult};
use crate::machine;
use crate::types::*;

/// Schema version for snapshot format compatibility
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

/// A serializable snapshot of all live games
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameStateExport {
    pub schema_version: u32,
    /// Export timestamp (ISO8601)
    pub exported_at: String,
    pub games: Vec<Game>,
}

impl GameStateExport {
    pub fn new(games: Vec<Game>) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            games,
        }
    }

    /// Validate the snapshot before import
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version > EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Export schema version {} is newer than supported version {}. \
                 Please update the server.",
                self.schema_version, EXPORT_SCHEMA_VERSION
            ));
        }

        let mut seen = HashSet::new();
        for game in &self.games {
            if !is_valid_pin(&game.pin) {
                return Err(format!("Game has invalid PIN '{}'", game.pin));
            }
            if !seen.insert(game.pin.as_str()) {
                return Err(format!("PIN {} appears twice", game.pin));
            }
            machine::check_invariants(game).map_err(|e| format!("Game {}: {}", game.pin, e))?;
        }
        Ok(())
    }
}

impl AppState {
    pub async fn export_state(&self) -> GameResult<GameStateExport> {
        let mut games = Vec::new();
        for pin in self.store.pins().await? {
            if let Some(game) = self.store.get(&pin).await? {
                games.push(game);
            }
        }
        Ok(GameStateExport::new(games))
    }

    /// Replace all live games with the snapshot's
    pub async fn import_state(&self, export: GameStateExport) -> GameResult<usize> {
        export.validate().map_err(GameError::InvalidSnapshot)?;

        let incoming: HashSet<&str> = export.games.iter().map(|g| g.pin.as_str()).collect();
        for pin in self.store.pins().await? {
            if !incoming.contains(pin.as_str()) {
                self.store.delete(&pin).await?;
            }
        }
        for game in &export.games {
            self.store.put(&game.pin, game.clone()).await?;
        }

        tracing::info!(
            "Imported {} games (snapshot from {})",
            export.games.len(),
            export.exported_at
        );
        Ok(export.games.len())
    }

    /// Write a snapshot atomically (temp file + rename)
    pub async fn save_snapshot(&self, path: &Path) -> GameResult<usize> {
        let export = self.export_state().await?;
        let json = serde_json::to_vec_pretty(&export)
            .map_err(|e| GameError::SnapshotIo(e.to_string()))?;

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| GameError::SnapshotIo(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| GameError::SnapshotIo(format!("{}: {}", path.display(), e)))?;
        Ok(export.games.len())
    }

    /// Restore from `path`; `None` when there is no snapshot yet
    pub async fn load_snapshot(&self, path: &Path) -> GameResult<Option<usize>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(GameError::SnapshotIo(format!("{}: {}", path.display(), e))),
        };
        let export: GameStateExport = serde_json::from_slice(&bytes)
            .map_err(|e| GameError::InvalidSnapshot(e.to_string()))?;
        self.import_state(export).await.map(Some)
    }
}
