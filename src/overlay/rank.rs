//! Personal priority ranking.
//!
//! Ranks across all records that carry one always form `1..=m`. Every
//! operation validates its input before touching the document, so a failed
//! call leaves it exactly as it was.

use crate::error::{Result, SidecarError};
use crate::model::OverlayDocument;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// A reorder request against one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RankAction {
    /// Move to a 1-based position; past-the-end clamps to the last slot.
    Move { position: i64 },
    Up,
    Down,
    Clear,
}

impl OverlayDocument {
    /// Identifiers that carry a rank, in rank order.
    ///
    /// Ties (only possible in a hand-edited file) go to the most recent edit,
    /// then to the identifier.
    #[must_use]
    pub fn ranked_ids(&self) -> Vec<String> {
        let mut ranked: Vec<(&String, u32, Reverse<_>)> = self
            .issues
            .iter()
            .filter_map(|(id, record)| {
                record
                    .personal_priority
                    .map(|rank| (id, rank, Reverse(record.last_updated)))
            })
            .collect();
        ranked.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.2.cmp(&b.2)).then_with(|| a.0.cmp(b.0)));
        ranked.into_iter().map(|(id, _, _)| id.clone()).collect()
    }

    /// True when the assigned ranks are exactly `{1..=m}`.
    #[must_use]
    pub fn ranks_are_contiguous(&self) -> bool {
        let mut ranks: Vec<u32> = self
            .issues
            .values()
            .filter_map(|record| record.personal_priority)
            .collect();
        ranks.sort_unstable();
        ranks
            .iter()
            .enumerate()
            .all(|(idx, rank)| usize::try_from(*rank).is_ok_and(|r| r == idx + 1))
    }

    /// Renumber ranks to `1..=m`, repairing duplicates and gaps.
    ///
    /// Returns `true` if anything changed.
    pub fn normalize_ranks(&mut self) -> bool {
        if self.ranks_are_contiguous() {
            return false;
        }
        let order = self.ranked_ids();
        self.assign_order(&order);
        true
    }

    /// Dispatch a [`RankAction`], returning the record's resulting rank.
    ///
    /// # Errors
    ///
    /// See the individual operations.
    pub fn apply_rank(&mut self, id: &str, action: RankAction) -> Result<Option<u32>> {
        match action {
            RankAction::Move { position } => self.move_to(id, position).map(Some),
            RankAction::Up => self.move_up(id).map(Some),
            RankAction::Down => self.move_down(id).map(Some),
            RankAction::Clear => self.clear_rank(id).map(|()| None),
        }
    }

    /// Move `id` to `position`, shifting the others to close and open gaps.
    ///
    /// An unranked record is inserted at `position`.
    ///
    /// # Errors
    ///
    /// `UnknownIssue` if `id` has no record, `InvalidPosition` if
    /// `position < 1`.
    pub fn move_to(&mut self, id: &str, position: i64) -> Result<u32> {
        self.require(id)?;
        if position < 1 {
            return Err(SidecarError::InvalidPosition { position });
        }

        let mut order = self.ranked_ids();
        order.retain(|other| other != id);
        let slot = usize::try_from(position - 1).unwrap_or(usize::MAX).min(order.len());
        order.insert(slot, id.to_string());
        self.assign_order(&order);

        Ok(rank_for_slot(slot))
    }

    /// Swap `id` with the record ranked just above it. No-op at rank 1.
    ///
    /// # Errors
    ///
    /// `UnknownIssue` if `id` has no record, `NotRanked` if it has no rank.
    pub fn move_up(&mut self, id: &str) -> Result<u32> {
        let (mut order, slot) = self.ranked_slot(id)?;
        if slot == 0 {
            return Ok(1);
        }
        order.swap(slot, slot - 1);
        self.assign_order(&order);
        Ok(rank_for_slot(slot - 1))
    }

    /// Swap `id` with the record ranked just below it. No-op at the bottom.
    ///
    /// # Errors
    ///
    /// `UnknownIssue` if `id` has no record, `NotRanked` if it has no rank.
    pub fn move_down(&mut self, id: &str) -> Result<u32> {
        let (mut order, slot) = self.ranked_slot(id)?;
        if slot + 1 >= order.len() {
            return Ok(rank_for_slot(slot));
        }
        order.swap(slot, slot + 1);
        self.assign_order(&order);
        Ok(rank_for_slot(slot + 1))
    }

    /// Remove the rank from `id` and compact everyone below it upward.
    ///
    /// Clearing an unranked record is a no-op.
    ///
    /// # Errors
    ///
    /// `UnknownIssue` if `id` has no record.
    pub fn clear_rank(&mut self, id: &str) -> Result<()> {
        self.require(id)?;
        let mut order = self.ranked_ids();
        order.retain(|other| other != id);
        if let Some(record) = self.issues.get_mut(id) {
            record.personal_priority = None;
        }
        self.assign_order(&order);
        Ok(())
    }

    /// Clear ranks for several identifiers at once, skipping unknown ones.
    ///
    /// Returns how many ranks were removed.
    pub fn clear_ranks<'a, I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut cleared = 0;
        for id in ids {
            let ranked = self
                .issues
                .get_mut(id)
                .and_then(|record| record.personal_priority.take())
                .is_some();
            if ranked {
                cleared += 1;
            }
        }
        if cleared > 0 {
            let order = self.ranked_ids();
            self.assign_order(&order);
        }
        cleared
    }

    fn require(&self, id: &str) -> Result<()> {
        if self.issues.contains_key(id) {
            Ok(())
        } else {
            Err(SidecarError::UnknownIssue { id: id.to_string() })
        }
    }

    fn ranked_slot(&self, id: &str) -> Result<(Vec<String>, usize)> {
        self.require(id)?;
        let order = self.ranked_ids();
        let slot = order
            .iter()
            .position(|other| other == id)
            .ok_or_else(|| SidecarError::NotRanked { id: id.to_string() })?;
        Ok((order, slot))
    }

    fn assign_order(&mut self, order: &[String]) {
        for (slot, id) in order.iter().enumerate() {
            if let Some(record) = self.issues.get_mut(id) {
                record.personal_priority = Some(rank_for_slot(slot));
            }
        }
    }
}

fn rank_for_slot(slot: usize) -> u32 {
    u32::try_from(slot + 1).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OverlayRecord;
    use chrono::{TimeZone, Utc};

    fn doc(entries: &[(&str, Option<u32>)]) -> OverlayDocument {
        let mut doc = OverlayDocument::default();
        for (id, rank) in entries {
            doc.issues.insert(
                (*id).to_string(),
                OverlayRecord {
                    personal_priority: *rank,
                    notes: format!("notes for {id}"),
                    ..Default::default()
                },
            );
        }
        doc
    }

    fn rank(doc: &OverlayDocument, id: &str) -> Option<u32> {
        doc.get(id).and_then(|record| record.personal_priority)
    }

    #[test]
    fn move_second_to_first() {
        let mut doc = doc(&[("LIN-1", Some(1)), ("LIN-2", Some(2))]);
        assert_eq!(doc.move_to("LIN-2", 1).unwrap(), 1);
        assert_eq!(rank(&doc, "LIN-2"), Some(1));
        assert_eq!(rank(&doc, "LIN-1"), Some(2));
    }

    #[test]
    fn move_first_to_last_shifts_intervening_up() {
        let mut doc = doc(&[("A", Some(1)), ("B", Some(2)), ("C", Some(3))]);
        doc.move_to("A", 3).unwrap();
        assert_eq!(doc.ranked_ids(), vec!["B", "C", "A"]);
        assert!(doc.ranks_are_contiguous());
    }

    #[test]
    fn move_unranked_inserts_and_shifts_down() {
        let mut doc = doc(&[("A", Some(1)), ("B", Some(2)), ("C", Some(3)), ("D", None)]);
        doc.move_to("D", 2).unwrap();
        assert_eq!(doc.ranked_ids(), vec!["A", "D", "B", "C"]);
        assert_eq!(rank(&doc, "C"), Some(4));
    }

    #[test]
    fn move_past_end_clamps() {
        let mut doc = doc(&[("A", Some(1)), ("B", Some(2)), ("C", None)]);
        assert_eq!(doc.move_to("C", 99).unwrap(), 3);
        assert_eq!(doc.move_to("A", 99).unwrap(), 3);
        assert_eq!(doc.ranked_ids(), vec!["B", "C", "A"]);
    }

    #[test]
    fn move_rejects_non_positive_position_without_changes() {
        let mut doc = doc(&[("A", Some(1)), ("B", Some(2))]);
        let before = doc.clone();
        let err = doc.move_to("B", 0).unwrap_err();
        assert!(matches!(err, SidecarError::InvalidPosition { position: 0 }));
        assert_eq!(doc, before);
    }

    #[test]
    fn unknown_identifier_is_rejected_without_changes() {
        let mut doc = doc(&[("A", Some(1))]);
        let before = doc.clone();
        for action in [
            RankAction::Move { position: 1 },
            RankAction::Up,
            RankAction::Down,
            RankAction::Clear,
        ] {
            let err = doc.apply_rank("ZZZ", action).unwrap_err();
            assert!(matches!(err, SidecarError::UnknownIssue { .. }));
        }
        assert_eq!(doc, before);
    }

    #[test]
    fn clear_compacts_remaining() {
        let mut doc = doc(&[("A", Some(1)), ("B", Some(2)), ("C", Some(3))]);
        doc.clear_rank("B").unwrap();
        assert_eq!(rank(&doc, "A"), Some(1));
        assert_eq!(rank(&doc, "B"), None);
        assert_eq!(rank(&doc, "C"), Some(2));
        assert_eq!(doc.get("B").unwrap().notes, "notes for B");
    }

    #[test]
    fn up_and_down_stop_at_boundaries() {
        let mut doc = doc(&[("A", Some(1)), ("B", Some(2)), ("C", Some(3))]);
        assert_eq!(doc.move_up("A").unwrap(), 1);
        assert_eq!(doc.move_down("C").unwrap(), 3);
        assert_eq!(doc.ranked_ids(), vec!["A", "B", "C"]);

        assert_eq!(doc.move_up("C").unwrap(), 2);
        assert_eq!(doc.ranked_ids(), vec!["A", "C", "B"]);
        assert_eq!(doc.move_down("A").unwrap(), 2);
        assert_eq!(doc.ranked_ids(), vec!["C", "A", "B"]);
    }

    #[test]
    fn up_on_unranked_record_is_not_ranked_error() {
        let mut doc = doc(&[("A", Some(1)), ("B", None)]);
        assert!(matches!(
            doc.move_up("B").unwrap_err(),
            SidecarError::NotRanked { .. }
        ));
    }

    #[test]
    fn clear_many_skips_unknown_and_unranked() {
        let mut doc = doc(&[("A", Some(1)), ("B", Some(2)), ("C", Some(3)), ("D", None)]);
        let cleared = doc.clear_ranks(["A", "C", "D", "missing"]);
        assert_eq!(cleared, 2);
        assert_eq!(rank(&doc, "B"), Some(1));
        assert!(doc.ranks_are_contiguous());
    }

    #[test]
    fn normalize_prefers_most_recent_edit_on_duplicates() {
        let mut doc = OverlayDocument::default();
        for (id, rank, day) in [("LIN-1", 2, 10), ("LIN-2", 2, 15), ("LIN-3", 3, 12)] {
            doc.issues.insert(
                id.to_string(),
                OverlayRecord {
                    personal_priority: Some(rank),
                    last_updated: Some(Utc.with_ymd_and_hms(2025, 2, day, 10, 0, 0).unwrap()),
                    ..Default::default()
                },
            );
        }
        assert!(doc.normalize_ranks());
        assert_eq!(doc.ranked_ids(), vec!["LIN-2", "LIN-1", "LIN-3"]);
        assert_eq!(rank(&doc, "LIN-3"), Some(3));
        assert!(!doc.normalize_ranks());
    }

    #[test]
    fn normalize_closes_gaps() {
        let mut doc = doc(&[("A", Some(2)), ("B", Some(5))]);
        assert!(doc.normalize_ranks());
        assert_eq!(rank(&doc, "A"), Some(1));
        assert_eq!(rank(&doc, "B"), Some(2));
    }

    #[test]
    fn rank_action_wire_format() {
        let action: RankAction =
            serde_json::from_str(r#"{"action": "move", "position": 3}"#).unwrap();
        assert_eq!(action, RankAction::Move { position: 3 });
        let action: RankAction = serde_json::from_str(r#"{"action": "clear"}"#).unwrap();
        assert_eq!(action, RankAction::Clear);
    }
}
