//! Background tasks: server-side round advance and snapshot autosave

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::state::{now_ms, AdvanceOutcome, AppState};

/// One pass over every live game, advancing those whose round expired or
/// completed. Returns how many games moved.
pub async fn advance_due_games(state: &AppState, now: i64) -> usize {
    let pins = match state.store.pins().await {
        Ok(pins) => pins,
        Err(e) => {
            tracing::error!("Deadline watcher could not list games: {}", e);
            return 0;
        }
    };

    let mut advanced = 0;
    for pin in pins {
        match state.advance_if_due(&pin, now).await {
            Ok(Some(report)) if report.outcome == AdvanceOutcome::Advanced => {
                tracing::info!(
                    "Auto-advanced game {} from {:?} to {:?}",
                    pin,
                    report.from,
                    report.to
                );
                advanced += 1;
            }
            Ok(_) => {}
            // Deleted between listing and reading
            Err(crate::error::GameError::GameNotFound(_)) => {}
            Err(e) => tracing::warn!("Auto-advance failed for game {}: {}", pin, e),
        }
    }
    advanced
}

/// Spawn the task that advances rounds once a trigger fires
pub fn spawn_deadline_watcher(state: Arc<AppState>) -> JoinHandle<()> {
    let interval = state.config.auto_advance_interval;
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            advance_due_games(&state, now_ms()).await;
        }
    })
}

/// Spawn the task that saves all live games to `path` periodically
pub fn spawn_snapshot_autosave(
    state: Arc<AppState>,
    path: PathBuf,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            match state.save_snapshot(&path).await {
                Ok(count) => tracing::debug!("Saved {} games to {}", count, path.display()),
                Err(e) => tracing::error!("Snapshot autosave failed: {}", e),
            }
        }
    })
}
