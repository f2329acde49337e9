// src/job/snapshot.rs
//! Local result snapshot: one JSON file per job, when requested.
//!
//! Shape: `{ "notes": [...], "users": { "<user_id>": {...} } }`. Every
//! entity field round-trips exactly, including a publish timestamp in
//! either of its upstream forms.

use crate::error::AppError;
use crate::model::{Note, User};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The full entity set of one job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub notes: Vec<Note>,
    /// Deduplicated authors keyed by user id, in first-seen order.
    pub users: IndexMap<String, User>,
}

/// Serializes the snapshot to `path`, creating parent directories.
pub fn save_snapshot(path: &Path, snapshot: &JobSnapshot) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json)?;
    log::info!(
        "Saved {} notes and {} users to {}",
        snapshot.notes.len(),
        snapshot.users.len(),
        path.display()
    );
    Ok(())
}

/// Parses a snapshot back from `path`.
pub fn load_snapshot(path: &Path) -> Result<JobSnapshot, AppError> {
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|source| AppError::SnapshotParseError {
        path: path.to_path_buf(),
        source,
    })
}
