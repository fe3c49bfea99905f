//! Filtering and sorting of the merged issue list.
//!
//! All functions are pure. "Today" is passed in so cycle grouping can be
//! tested against fixed dates.

use crate::error::{Result, SidecarError};
use crate::model::{MergedIssue, PersonalStatus};
use crate::util::time::parse_iso_datetime;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::fmt;
use std::str::FromStr;

/// Linear workflow states that lead inside a cycle group.
pub const CYCLE_STATUS_ORDER: [&str; 3] = ["In Review", "In Progress", "Todo"];

/// Which issues to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl FromStr for Filter {
    type Err = SidecarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(SidecarError::validation(
                "filter",
                format!("expected active, completed or all, got '{other}'"),
            )),
        }
    }
}

impl Filter {
    #[must_use]
    pub const fn matches(self, issue: &MergedIssue) -> bool {
        match self {
            Self::All => true,
            Self::Active => !issue.issue.is_completed,
            Self::Completed => issue.issue.is_completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Cycle,
    PersonalPriority,
    LinearPriority,
    LinearStatus,
    PersonalStatus,
    UpdatedAt,
    LastUpdated,
    CycleName,
    Labels,
    Team,
    Title,
    Identifier,
}

impl SortKey {
    pub const ALL: [Self; 12] = [
        Self::Cycle,
        Self::PersonalPriority,
        Self::LinearPriority,
        Self::LinearStatus,
        Self::PersonalStatus,
        Self::UpdatedAt,
        Self::LastUpdated,
        Self::CycleName,
        Self::Labels,
        Self::Team,
        Self::Title,
        Self::Identifier,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cycle => "cycle",
            Self::PersonalPriority => "personal_priority",
            Self::LinearPriority => "linear_priority",
            Self::LinearStatus => "linear_status",
            Self::PersonalStatus => "personal_status",
            Self::UpdatedAt => "updated_at",
            Self::LastUpdated => "last_updated",
            Self::CycleName => "cycle_name",
            Self::Labels => "labels",
            Self::Team => "team",
            Self::Title => "title",
            Self::Identifier => "identifier",
        }
    }

    /// Timestamps read newest first unless asked otherwise.
    #[must_use]
    pub const fn default_direction(self) -> Direction {
        match self {
            Self::UpdatedAt | Self::LastUpdated => Direction::Desc,
            _ => Direction::Asc,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = SidecarError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        let wanted = match wanted.as_str() {
            "team_name" => "team",
            "priority" => "linear_priority",
            "status" => "linear_status",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| SidecarError::InvalidSort { sort: s.to_string() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = SidecarError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(SidecarError::InvalidSort {
                sort: format!("direction '{s}'"),
            }),
        }
    }
}

impl Direction {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// A sort key plus an optional explicit direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: Option<Direction>,
}

impl SortSpec {
    #[must_use]
    pub const fn new(key: SortKey) -> Self {
        Self {
            key,
            direction: None,
        }
    }

    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    #[must_use]
    pub fn effective_direction(&self) -> Direction {
        self.direction.unwrap_or_else(|| self.key.default_direction())
    }
}

/// A full list request: filter plus optional sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewQuery {
    pub filter: Filter,
    pub sort: Option<SortSpec>,
}

impl ViewQuery {
    /// Parse query-string style inputs. Blank values count as absent.
    ///
    /// With `filter=active` and no sort, the personal priority order is used.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown filter, sort, or direction.
    pub fn parse(filter: Option<&str>, sort: Option<&str>, dir: Option<&str>) -> Result<Self> {
        let filter = present(filter).map_or(Ok(Filter::All), str::parse)?;
        let direction = present(dir).map(str::parse::<Direction>).transpose()?;
        let key = present(sort).map(str::parse::<SortKey>).transpose()?;

        let key = match (key, filter) {
            (Some(key), _) => Some(key),
            (None, Filter::Active) => Some(SortKey::PersonalPriority),
            (None, _) => None,
        };

        Ok(Self {
            filter,
            sort: key.map(|key| SortSpec { key, direction }),
        })
    }

    /// Filter then sort `issues`.
    #[must_use]
    pub fn apply(&self, issues: &[MergedIssue], today: NaiveDate) -> Vec<MergedIssue> {
        let filtered = apply_filter(issues, self.filter);
        match self.sort {
            Some(spec) => apply_sort(filtered, spec, today),
            None => filtered,
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[must_use]
pub fn apply_filter(issues: &[MergedIssue], filter: Filter) -> Vec<MergedIssue> {
    issues
        .iter()
        .filter(|issue| filter.matches(issue))
        .cloned()
        .collect()
}

/// Sort a list by `spec`. Stable: ties keep their incoming order.
#[must_use]
pub fn apply_sort(mut issues: Vec<MergedIssue>, spec: SortSpec, today: NaiveDate) -> Vec<MergedIssue> {
    let direction = spec.effective_direction();
    match spec.key {
        SortKey::Cycle if spec.direction.is_none() => return sort_by_cycle(issues, today),
        SortKey::Cycle | SortKey::CycleName => {
            sort_present_first(&mut issues, direction, |i| {
                i.issue.cycle.as_ref().map(|cycle| cycle.name.to_lowercase())
            });
        }
        SortKey::PersonalPriority => {
            let (mut ranked, unranked): (Vec<_>, Vec<_>) = issues
                .into_iter()
                .partition(|issue| issue.personal_priority.is_some());
            ranked.sort_by(|a, b| direction.apply(a.personal_priority.cmp(&b.personal_priority)));
            ranked.extend(sort_by_cycle(unranked, today));
            return ranked;
        }
        SortKey::LinearPriority => issues.sort_by(|a, b| {
            direction.apply(
                a.issue
                    .linear_priority
                    .urgency_rank()
                    .cmp(&b.issue.linear_priority.urgency_rank()),
            )
        }),
        SortKey::LinearStatus => issues.sort_by(|a, b| {
            direction.apply(
                a.issue
                    .linear_status
                    .to_lowercase()
                    .cmp(&b.issue.linear_status.to_lowercase()),
            )
        }),
        SortKey::PersonalStatus => {
            issues.sort_by(|a, b| direction.apply(a.personal_status.cmp(&b.personal_status)));
        }
        SortKey::UpdatedAt => {
            sort_present_first(&mut issues, direction, |i| parse_iso_datetime(&i.issue.updated_at));
        }
        SortKey::LastUpdated => sort_present_first(&mut issues, direction, |i| i.last_updated),
        SortKey::Labels => sort_present_first(&mut issues, direction, |i| {
            i.issue.labels.first().map(|label| label.name.to_lowercase())
        }),
        SortKey::Team => issues.sort_by(|a, b| {
            direction.apply(a.issue.team_name.to_lowercase().cmp(&b.issue.team_name.to_lowercase()))
        }),
        SortKey::Title => issues.sort_by(|a, b| {
            direction.apply(a.issue.title.to_lowercase().cmp(&b.issue.title.to_lowercase()))
        }),
        SortKey::Identifier => {
            issues.sort_by(|a, b| direction.apply(identifier_key(a).cmp(&identifier_key(b))));
        }
    }
    issues
}

/// Sort by an optional key; issues without a value go last in either
/// direction.
fn sort_present_first<K, F>(issues: &mut [MergedIssue], direction: Direction, key: F)
where
    K: Ord,
    F: Fn(&MergedIssue) -> Option<K>,
{
    issues.sort_by_cached_key(|issue| key(issue).is_none());
    let split = issues.partition_point(|issue| key(issue).is_some());
    issues[..split].sort_by(|a, b| direction.apply(key(a).cmp(&key(b))));
}

/// `LIN-9` before `LIN-10`: team prefix, then the number.
fn identifier_key(issue: &MergedIssue) -> (String, u64) {
    let identifier = issue.issue.overlay_key();
    identifier
        .rsplit_once('-')
        .and_then(|(prefix, number)| Some((prefix.to_lowercase(), number.parse().ok()?)))
        .unwrap_or_else(|| (identifier.to_lowercase(), 0))
}

fn status_rank(status: &str) -> usize {
    CYCLE_STATUS_ORDER
        .iter()
        .position(|s| *s == status)
        .unwrap_or(CYCLE_STATUS_ORDER.len())
}

/// High, Medium, Low, then No priority.
fn cycle_priority_rank(issue: &MergedIssue) -> u8 {
    match issue.issue.linear_priority.0 {
        2 => 0,
        3 => 1,
        4 => 2,
        _ => 3,
    }
}

/// Grouped "what to work on" order:
/// urgent, personally ranked, current cycle, future cycles, everything else.
///
/// Inside cycle groups issues go by workflow state then Linear priority;
/// future cycles nearest first; the rest most recently updated first.
#[must_use]
pub fn sort_by_cycle(issues: Vec<MergedIssue>, today: NaiveDate) -> Vec<MergedIssue> {
    let mut urgent = Vec::new();
    let mut ranked = Vec::new();
    let mut current = Vec::new();
    let mut future = Vec::new();
    let mut rest = Vec::new();

    for issue in issues {
        if issue.issue.linear_priority.is_urgent() {
            urgent.push(issue);
        } else if issue.personal_priority.is_some() {
            ranked.push(issue);
        } else {
            match &issue.issue.cycle {
                Some(cycle) if cycle.is_current(today) => current.push(issue),
                Some(cycle) if cycle.is_future(today) => future.push(issue),
                _ => rest.push(issue),
            }
        }
    }

    ranked.sort_by_key(|issue| issue.personal_priority);
    current.sort_by_key(|issue| (status_rank(&issue.issue.linear_status), cycle_priority_rank(issue)));
    future.sort_by_key(|issue| {
        (
            issue
                .issue
                .cycle
                .as_ref()
                .and_then(crate::model::Cycle::starts_on)
                .unwrap_or(NaiveDate::MAX),
            status_rank(&issue.issue.linear_status),
            cycle_priority_rank(issue),
        )
    });
    rest.sort_by_key(|issue| Reverse(updated_at(issue)));

    urgent
        .into_iter()
        .chain(ranked)
        .chain(current)
        .chain(future)
        .chain(rest)
        .collect()
}

fn updated_at(issue: &MergedIssue) -> Option<DateTime<Utc>> {
    parse_iso_datetime(&issue.issue.updated_at)
}

/// Labels for Linear priorities, keyed by their numeric value.
#[must_use]
pub fn priority_labels() -> Vec<(i32, &'static str)> {
    crate::model::LinearPriority::ALL
        .iter()
        .map(|p| (p.0, p.label()))
        .collect()
}

/// Personal status options in display order.
#[must_use]
pub fn personal_status_options() -> Vec<&'static str> {
    PersonalStatus::ALL.iter().map(PersonalStatus::as_str).collect()
}
