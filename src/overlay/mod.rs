//! Overlay store: the single JSON file holding personal annotations.
//!
//! The whole document is read into memory, changed, and written back in
//! full. Writes go through a temp file and a rename, so a reader after a
//! successful save always sees the new document.

pub mod rank;

pub use rank::RankAction;

use crate::error::{Result, SidecarError};
use crate::model::{ColumnPrefs, OverlayDocument, OverlayRecord, PersonalStatus};
use crate::util::{time, write_atomic};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default overlay filename inside the data directory.
pub const OVERLAY_FILENAME: &str = "overlay.json";

/// A change to the personal priority carried by a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityChange {
    Set(i64),
    Clear,
}

/// Fields to change on one overlay record. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayPatch {
    pub notes: Option<String>,
    pub personal_status: Option<PersonalStatus>,
    pub personal_priority: Option<PriorityChange>,
}

impl OverlayPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.notes.is_none() && self.personal_status.is_none() && self.personal_priority.is_none()
    }
}

/// Result of a save: the record as stored and the whole document.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub id: String,
    pub record: OverlayRecord,
    pub document: OverlayDocument,
    /// Whether ranks of this or other records moved.
    pub ranks_changed: bool,
}

/// Handle on the persisted overlay file.
#[derive(Debug, Clone)]
pub struct OverlayStore {
    path: PathBuf,
}

impl OverlayStore {
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full document.
    ///
    /// A missing, unreadable, or malformed file reads as an empty document.
    /// Ranks that are not contiguous are repaired in memory only; the file
    /// picks up the repair with the next save. Loading never writes.
    #[must_use]
    pub fn load(&self) -> OverlayDocument {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No overlay file yet, starting empty");
                return OverlayDocument::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read overlay, using empty overlay");
                return OverlayDocument::default();
            }
        };

        let mut document = match parse_document(&contents) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed overlay, using empty overlay");
                return OverlayDocument::default();
            }
        };

        if document.normalize_ranks() {
            warn!(
                path = %self.path.display(),
                "Overlay had duplicate or missing personal priorities; renumbered until the next save"
            );
        }

        document
    }

    /// Persist the full document, replacing the file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, document: &OverlayDocument) -> Result<()> {
        let mut json = serde_json::to_vec_pretty(document)?;
        json.push(b'\n');
        write_atomic(&self.path, &json)?;
        debug!(
            path = %self.path.display(),
            records = document.issues.len(),
            "Saved overlay"
        );
        Ok(())
    }

    /// Apply `patch` to the record for `issue_id`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty identifier or a bad
    /// position, or an I/O error if the save fails. Nothing is written on
    /// error.
    pub fn upsert(&self, issue_id: &str, patch: &OverlayPatch) -> Result<SaveOutcome> {
        let id = overlay_key(issue_id)?;
        if let Some(PriorityChange::Set(position)) = patch.personal_priority {
            if position < 1 {
                return Err(SidecarError::InvalidPosition { position });
            }
        }

        let mut document = self.load();
        let record = document.issues.entry(id.clone()).or_default();
        if let Some(notes) = &patch.notes {
            record.notes.clone_from(notes);
        }
        if let Some(status) = patch.personal_status {
            record.personal_status = status;
        }
        record.last_updated = Some(time::overlay_now());

        let before = rank_snapshot(&document);
        match patch.personal_priority {
            Some(PriorityChange::Set(position)) => {
                document.move_to(&id, position)?;
            }
            Some(PriorityChange::Clear) => document.clear_rank(&id)?,
            None => {}
        }
        let ranks_changed = rank_snapshot(&document) != before;

        self.save(&document)?;
        info!(issue = %id, ranks_changed, "Saved overlay record");

        let record = document.issues.get(&id).cloned().unwrap_or_default();
        Ok(SaveOutcome {
            id,
            record,
            document,
            ranks_changed,
        })
    }

    /// Apply a reorder to `issue_id` and persist on success.
    ///
    /// # Errors
    ///
    /// `UnknownIssue` if there is no record, `NotRanked` / `InvalidPosition`
    /// for bad moves, or an I/O error. Storage is untouched on error.
    pub fn reorder(&self, issue_id: &str, action: RankAction) -> Result<OverlayDocument> {
        let id = overlay_key(issue_id)?;
        let mut document = self.load();
        let rank = document.apply_rank(&id, action)?;
        self.save(&document)?;
        info!(issue = %id, ?action, ?rank, "Reordered personal priority");
        Ok(document)
    }

    /// Release the ranks held by `ids` in one write. Skips the write when
    /// nothing changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn release_ranks<'a, I>(&self, ids: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut document = self.load();
        let cleared = document.clear_ranks(ids);
        if cleared > 0 {
            self.save(&document)?;
            info!(cleared, "Released personal priorities of completed issues");
        }
        Ok(cleared)
    }

    /// Current column preferences.
    #[must_use]
    pub fn columns(&self) -> ColumnPrefs {
        self.load().columns
    }

    /// Replace column preferences.
    ///
    /// # Errors
    ///
    /// Returns an error if the save fails.
    pub fn set_columns(&self, columns: ColumnPrefs) -> Result<ColumnPrefs> {
        let mut document = self.load();
        document.columns = columns;
        self.save(&document)?;
        Ok(document.columns)
    }
}

/// Normalise an identifier for use as an overlay key.
///
/// # Errors
///
/// Returns `InvalidIssueId` for blank input.
pub fn overlay_key(issue_id: &str) -> Result<String> {
    let trimmed = issue_id.trim();
    if trimmed.is_empty() {
        return Err(SidecarError::InvalidIssueId {
            id: issue_id.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Parse either the current layout or the legacy flat id -> record map.
fn parse_document(contents: &str) -> Result<OverlayDocument> {
    let value: Value = serde_json::from_str(contents)?;
    let Value::Object(map) = &value else {
        return Err(SidecarError::validation("overlay", "top level must be an object"));
    };

    let is_current_layout = ["issues", "columns"]
        .iter()
        .any(|key| map.get(*key).is_some_and(Value::is_object));

    if is_current_layout {
        Ok(serde_json::from_value(value)?)
    } else {
        let issues: BTreeMap<String, OverlayRecord> = serde_json::from_value(value)?;
        debug!(records = issues.len(), "Loaded legacy flat overlay layout");
        Ok(OverlayDocument {
            issues,
            columns: ColumnPrefs::default(),
        })
    }
}

fn rank_snapshot(document: &OverlayDocument) -> Vec<(String, u32)> {
    document
        .issues
        .iter()
        .filter_map(|(id, record)| record.personal_priority.map(|rank| (id.clone(), rank)))
        .collect()
}
