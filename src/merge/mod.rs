//! Combine fetched snapshots with overlay records.

use crate::model::{IssueSnapshot, MergedIssue, OverlayDocument, OverlayRecord};

/// One merged entry per snapshot, in input order.
///
/// Overlay fields come from the record stored under the snapshot's key;
/// issues without a record get defaults. Records without a matching
/// snapshot are ignored here and stay on disk.
#[must_use]
pub fn merge_issues(snapshots: &[IssueSnapshot], overlay: &OverlayDocument) -> Vec<MergedIssue> {
    snapshots
        .iter()
        .map(|issue| merge_one(issue, overlay.get(issue.overlay_key())))
        .collect()
}

#[must_use]
pub fn merge_one(issue: &IssueSnapshot, record: Option<&OverlayRecord>) -> MergedIssue {
    let default = OverlayRecord::default();
    let record = record.unwrap_or(&default);
    MergedIssue {
        issue: issue.clone(),
        personal_priority: record.personal_priority,
        personal_status: record.personal_status,
        notes: record.notes.clone(),
        last_updated: record.last_updated,
    }
}
