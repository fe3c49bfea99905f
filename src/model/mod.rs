//! Core data types for `sidecar`.
//!
//! This module defines the fundamental types used throughout the application:
//! - `IssueSnapshot` - Read-only issue data fetched from Linear
//! - `OverlayRecord` - Locally persisted personal annotation for one issue
//! - `PersonalStatus` - The fixed set of personal statuses
//! - `Column` / `ColumnPrefs` - Visible dashboard columns
//! - `OverlayDocument` - The whole persisted overlay file
//! - `MergedIssue` - A snapshot combined with its overlay record

use crate::error::SidecarError;
use crate::util::time::overlay_timestamp;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Linear's own priority (0=No priority, 1=Urgent .. 4=Low).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct LinearPriority(pub i32);

impl LinearPriority {
    pub const NONE: Self = Self(0);
    pub const URGENT: Self = Self(1);
    pub const HIGH: Self = Self(2);
    pub const MEDIUM: Self = Self(3);
    pub const LOW: Self = Self(4);

    /// All priorities in the order Linear lists them.
    pub const ALL: [Self; 5] = [Self::NONE, Self::URGENT, Self::HIGH, Self::MEDIUM, Self::LOW];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self.0 {
            1 => "Urgent",
            2 => "High",
            3 => "Medium",
            4 => "Low",
            _ => "No priority",
        }
    }

    #[must_use]
    pub const fn is_urgent(self) -> bool {
        self.0 == 1
    }

    /// Urgent first, "No priority" last.
    #[must_use]
    pub const fn urgency_rank(self) -> i32 {
        match self.0 {
            1..=4 => self.0,
            _ => 5,
        }
    }
}

impl fmt::Display for LinearPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A Linear cycle (sprint) the issue belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Cycle {
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub number: Option<i64>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

impl Cycle {
    #[must_use]
    pub fn starts_on(&self) -> Option<NaiveDate> {
        self.starts_at
            .as_deref()
            .and_then(crate::util::time::parse_iso_datetime)
            .map(|dt| dt.date_naive())
    }

    #[must_use]
    pub fn ends_on(&self) -> Option<NaiveDate> {
        self.ends_at
            .as_deref()
            .and_then(crate::util::time::parse_iso_datetime)
            .map(|dt| dt.date_naive())
    }

    /// True when `today` falls between the start and end dates (inclusive).
    #[must_use]
    pub fn is_current(&self, today: NaiveDate) -> bool {
        match (self.starts_on(), self.ends_on()) {
            (Some(start), Some(end)) => start <= today && today <= end,
            _ => false,
        }
    }

    /// True when the cycle starts after `today`.
    #[must_use]
    pub fn is_future(&self, today: NaiveDate) -> bool {
        self.starts_on().is_some_and(|start| start > today)
    }
}

/// Issue label as shown in Linear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// Read-only issue data as fetched from Linear. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IssueSnapshot {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub url: String,
    pub linear_status: String,
    pub linear_priority: LinearPriority,
    pub team_name: String,
    pub updated_at: String,
    pub is_completed: bool,
    pub cycle: Option<Cycle>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl IssueSnapshot {
    /// Key under which the overlay stores this issue's record.
    #[must_use]
    pub fn overlay_key(&self) -> &str {
        if self.identifier.trim().is_empty() {
            &self.id
        } else {
            &self.identifier
        }
    }
}

/// Personal status, drawn from a fixed set.
///
/// Serialized as the display string (`""` for no status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PersonalStatus {
    #[default]
    None,
    NotStarted,
    InProgress,
    Blocked,
    WaitingOnSomeone,
    Testing,
    PairTesting,
    WaitingOnTesting,
    ReadyToClose,
}

impl PersonalStatus {
    /// Display order used by the dashboard dropdown and by sorting.
    pub const ALL: [Self; 9] = [
        Self::None,
        Self::NotStarted,
        Self::InProgress,
        Self::Blocked,
        Self::WaitingOnSomeone,
        Self::Testing,
        Self::PairTesting,
        Self::WaitingOnTesting,
        Self::ReadyToClose,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::NotStarted => "Not started",
            Self::InProgress => "In Progress",
            Self::Blocked => "Blocked",
            Self::WaitingOnSomeone => "Waiting On Someone",
            Self::Testing => "Testing",
            Self::PairTesting => "Pair Testing",
            Self::WaitingOnTesting => "Waiting on Testing",
            Self::ReadyToClose => "Ready to Close",
        }
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for PersonalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonalStatus {
    type Err = SidecarError;

    /// Accepts the display string (any case) or its `snake_case` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| {
                let display = status.as_str().to_lowercase();
                display == wanted || display.replace(' ', "_") == wanted
            })
            .ok_or_else(|| SidecarError::InvalidStatus {
                status: s.to_string(),
            })
    }
}

impl Serialize for PersonalStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PersonalStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(Self::None),
            Some(value) => value.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Locally persisted personal annotation for one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OverlayRecord {
    #[serde(default, deserialize_with = "lenient_notes")]
    pub notes: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_rank"
    )]
    pub personal_priority: Option<u32>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub personal_status: PersonalStatus,
    #[serde(default, with = "overlay_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// `null` notes read as empty; other scalars keep their text.
fn lenient_notes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(notes) => notes,
        other => {
            tracing::warn!(notes = %other, "Overlay notes are not text, keeping their JSON form");
            other.to_string()
        }
    })
}

/// Only whole numbers from 1 up are ranks. Anything else reads as unranked
/// and the load-time renumbering closes the gap.
fn lenient_rank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }
    let rank = raw
        .as_u64()
        .and_then(|rank| u32::try_from(rank).ok())
        .filter(|rank| *rank >= 1);
    if rank.is_none() {
        tracing::warn!(personal_priority = %raw, "Ignoring invalid personal priority in overlay");
    }
    Ok(rank)
}

/// Unknown statuses already on disk degrade to "no status" instead of
/// rejecting the whole overlay file.
fn lenient_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PersonalStatus, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.parse().unwrap_or_else(|_| {
        tracing::warn!(status = %raw, "Ignoring unknown personal status in overlay");
        PersonalStatus::None
    }))
}

/// A dashboard column that can be shown or hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Identifier,
    Title,
    LinearStatus,
    LinearPriority,
    PersonalPriority,
    PersonalStatus,
    Notes,
    Team,
    Cycle,
    Labels,
    UpdatedAt,
    LastUpdated,
}

impl Column {
    pub const ALL: [Self; 12] = [
        Self::Identifier,
        Self::Title,
        Self::LinearStatus,
        Self::LinearPriority,
        Self::PersonalPriority,
        Self::PersonalStatus,
        Self::Notes,
        Self::Team,
        Self::Cycle,
        Self::Labels,
        Self::UpdatedAt,
        Self::LastUpdated,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Title => "title",
            Self::LinearStatus => "linear_status",
            Self::LinearPriority => "linear_priority",
            Self::PersonalPriority => "personal_priority",
            Self::PersonalStatus => "personal_status",
            Self::Notes => "notes",
            Self::Team => "team",
            Self::Cycle => "cycle",
            Self::Labels => "labels",
            Self::UpdatedAt => "updated_at",
            Self::LastUpdated => "last_updated",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = SidecarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|column| column.as_str() == wanted)
            .ok_or_else(|| SidecarError::InvalidColumn {
                column: s.to_string(),
            })
    }
}

/// Process-wide visible column configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPrefs {
    #[serde(deserialize_with = "lenient_columns")]
    pub visible: Vec<Column>,
}

impl Default for ColumnPrefs {
    fn default() -> Self {
        Self {
            visible: Column::ALL.to_vec(),
        }
    }
}

impl ColumnPrefs {
    /// Build preferences from user-supplied names.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty list, an unknown name, or a duplicate.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> crate::Result<Self> {
        if names.is_empty() {
            return Err(SidecarError::validation(
                "columns",
                "at least one column must stay visible",
            ));
        }

        let mut visible = Vec::with_capacity(names.len());
        for name in names {
            let column: Column = name.as_ref().parse()?;
            if visible.contains(&column) {
                return Err(SidecarError::validation(
                    "columns",
                    format!("duplicate column: {column}"),
                ));
            }
            visible.push(column);
        }

        Ok(Self { visible })
    }
}

fn lenient_columns<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Column>, D::Error> {
    let raw = Vec::<String>::deserialize(deserializer)?;
    let mut visible: Vec<Column> = Vec::with_capacity(raw.len());
    for name in &raw {
        match name.parse::<Column>() {
            Ok(column) if !visible.contains(&column) => visible.push(column),
            Ok(_) => {}
            Err(_) => tracing::warn!(column = %name, "Ignoring unknown column in overlay"),
        }
    }
    if visible.is_empty() {
        visible = Column::ALL.to_vec();
    }
    Ok(visible)
}

/// Everything persisted in the overlay file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OverlayDocument {
    #[serde(default)]
    pub issues: BTreeMap<String, OverlayRecord>,
    #[serde(default)]
    pub columns: ColumnPrefs,
}

impl OverlayDocument {
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&OverlayRecord> {
        self.issues.get(id)
    }

    /// Identifiers with a record, for "did you mean" suggestions.
    #[must_use]
    pub fn known_ids(&self) -> Vec<String> {
        self.issues.keys().cloned().collect()
    }
}

/// A snapshot combined with its overlay record (or defaults).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedIssue {
    #[serde(flatten)]
    pub issue: IssueSnapshot,
    pub personal_priority: Option<u32>,
    pub personal_status: PersonalStatus,
    pub notes: String,
    #[serde(default, with = "overlay_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personal_status_round_trips_display_strings() {
        for status in PersonalStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            let back: PersonalStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
        assert_eq!(serde_json::to_string(&PersonalStatus::None).unwrap(), "\"\"");
    }

    #[test]
    fn personal_status_parses_snake_case_and_case_insensitive() {
        assert_eq!(
            "waiting_on_someone".parse::<PersonalStatus>().unwrap(),
            PersonalStatus::WaitingOnSomeone
        );
        assert_eq!(
            "ready to close".parse::<PersonalStatus>().unwrap(),
            PersonalStatus::ReadyToClose
        );
        assert!("Shipping".parse::<PersonalStatus>().is_err());
    }

    #[test]
    fn overlay_record_tolerates_unknown_status() {
        let record: OverlayRecord =
            serde_json::from_str(r#"{"notes": "x", "personal_status": "Someday"}"#).unwrap();
        assert_eq!(record.personal_status, PersonalStatus::None);
        assert_eq!(record.notes, "x");
    }

    #[test]
    fn overlay_record_tolerates_null_notes_and_bad_ranks() {
        let record: OverlayRecord =
            serde_json::from_str(r#"{"notes": null, "personal_priority": 0}"#).unwrap();
        assert_eq!(record.notes, "");
        assert_eq!(record.personal_priority, None);

        for raw in ["-1", "\"2\"", "1.5", "[1]"] {
            let json = format!(r#"{{"personal_priority": {raw}}}"#);
            let record: OverlayRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(record.personal_priority, None, "{raw}");
        }

        let record: OverlayRecord =
            serde_json::from_str(r#"{"notes": 42, "personal_priority": 3}"#).unwrap();
        assert_eq!(record.notes, "42");
        assert_eq!(record.personal_priority, Some(3));
    }

    #[test]
    fn overlay_key_falls_back_to_uuid() {
        let issue = IssueSnapshot {
            id: "uuid-1".to_string(),
            ..Default::default()
        };
        assert_eq!(issue.overlay_key(), "uuid-1");
    }

    #[test]
    fn linear_priority_labels_and_rank() {
        assert_eq!(LinearPriority::URGENT.label(), "Urgent");
        assert_eq!(LinearPriority::NONE.label(), "No priority");
        assert!(LinearPriority::LOW.urgency_rank() < LinearPriority::NONE.urgency_rank());
    }

    #[test]
    fn column_prefs_reject_duplicates_and_unknown() {
        assert!(ColumnPrefs::parse(&["title", "title"]).is_err());
        assert!(ColumnPrefs::parse(&["title", "velocity"]).is_err());
        assert!(ColumnPrefs::parse::<&str>(&[]).is_err());
        let prefs = ColumnPrefs::parse(&["notes", "Linear-Status"]).unwrap();
        assert_eq!(prefs.visible, vec![Column::Notes, Column::LinearStatus]);
    }

    #[test]
    fn column_prefs_drop_unknown_names_on_load() {
        let prefs: ColumnPrefs =
            serde_json::from_str(r#"{"visible": ["title", "velocity", "title"]}"#).unwrap();
        assert_eq!(prefs.visible, vec![Column::Title]);
    }

    #[test]
    fn cycle_current_and_future() {
        let cycle = Cycle {
            starts_at: Some("2025-02-01T00:00:00.000Z".to_string()),
            ends_at: Some("2025-02-14T23:59:59.000Z".to_string()),
            ..Default::default()
        };
        let inside = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
        let before = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        assert!(cycle.is_current(inside));
        assert!(!cycle.is_current(before));
        assert!(cycle.is_future(before));
    }
}
