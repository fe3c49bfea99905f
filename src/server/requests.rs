//! Request bodies and query strings accepted by the API.

use crate::error::{Result, SidecarError};
use crate::model::PersonalStatus;
use crate::overlay::{OverlayPatch, PriorityChange};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuesParams {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

/// Body of `POST /api/overlay/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverlaySaveRequest {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub personal_status: Option<String>,
    /// `null` or `""` clears the rank; a number or numeric string sets it.
    #[serde(default, deserialize_with = "present_value")]
    pub personal_priority: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnsRequest {
    pub visible: Vec<String>,
}

/// Keeps an explicit `null` distinguishable from a missing field.
fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl OverlaySaveRequest {
    /// Validate into a store patch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` for a status outside the fixed set and a
    /// validation error for a priority that is not a whole number.
    pub fn into_patch(self) -> Result<OverlayPatch> {
        let personal_status = self
            .personal_status
            .as_deref()
            .map(str::parse::<PersonalStatus>)
            .transpose()?;
        let personal_priority = self
            .personal_priority
            .as_ref()
            .map(parse_priority)
            .transpose()?;

        Ok(OverlayPatch {
            notes: self.notes,
            personal_status,
            personal_priority,
        })
    }
}

fn parse_priority(value: &Value) -> Result<PriorityChange> {
    let invalid = || {
        SidecarError::validation(
            "personal_priority",
            format!("expected a whole number or null, got {value}"),
        )
    };
    match value {
        Value::Null => Ok(PriorityChange::Clear),
        Value::String(s) if s.trim().is_empty() => Ok(PriorityChange::Clear),
        Value::String(s) => s.trim().parse().map(PriorityChange::Set).map_err(|_| invalid()),
        Value::Number(n) => n.as_i64().map(PriorityChange::Set).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> OverlaySaveRequest {
        serde_json::from_value(value).expect("request")
    }

    #[test]
    fn missing_priority_leaves_it_alone() {
        let patch = request(json!({"notes": "x"})).into_patch().unwrap();
        assert_eq!(patch.personal_priority, None);
        assert_eq!(patch.notes.as_deref(), Some("x"));
    }

    #[test]
    fn null_and_blank_clear_the_priority() {
        for value in [json!(null), json!(""), json!("  ")] {
            let patch = request(json!({"personal_priority": value})).into_patch().unwrap();
            assert_eq!(patch.personal_priority, Some(PriorityChange::Clear));
        }
    }

    #[test]
    fn numbers_and_numeric_strings_set_the_priority() {
        let patch = request(json!({"personal_priority": 3})).into_patch().unwrap();
        assert_eq!(patch.personal_priority, Some(PriorityChange::Set(3)));
        let patch = request(json!({"personal_priority": " 2 "})).into_patch().unwrap();
        assert_eq!(patch.personal_priority, Some(PriorityChange::Set(2)));
    }

    #[test]
    fn garbage_priority_and_status_are_rejected() {
        assert!(request(json!({"personal_priority": "soon"})).into_patch().is_err());
        assert!(request(json!({"personal_priority": 1.5})).into_patch().is_err());
        assert!(matches!(
            request(json!({"personal_status": "Shipping"})).into_patch().unwrap_err(),
            SidecarError::InvalidStatus { .. }
        ));
    }

    #[test]
    fn empty_status_string_means_no_status() {
        let patch = request(json!({"personal_status": ""})).into_patch().unwrap();
        assert_eq!(patch.personal_status, Some(PersonalStatus::None));
    }
}
