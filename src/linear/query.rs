//! GraphQL query text and the wire shapes Linear answers with.

use crate::model::{Cycle, IssueSnapshot, Label, LinearPriority};
use serde::{Deserialize, Serialize};

/// Every issue assigned to the viewer, all states, one page at a time.
pub const ASSIGNED_ISSUES_QUERY: &str = r"
query AssignedIssues($first: Int!, $after: String) {
  issues(
    first: $first
    after: $after
    filter: { assignee: { isMe: { eq: true } } }
  ) {
    nodes {
      id
      identifier
      title
      url
      priority
      updatedAt
      state { name, type }
      team { name }
      cycle { id name number startsAt endsAt }
      labels { nodes { name color } }
    }
    pageInfo { hasNextPage, endCursor }
  }
}
";

/// State types Linear uses for finished work.
pub const COMPLETED_STATE_TYPES: [&str; 2] = ["completed", "canceled"];

#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: PageVariables<'a>,
}

#[derive(Debug, Serialize)]
pub struct PageVariables<'a> {
    pub first: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    pub data: Option<IssuesData>,
    pub errors: Option<Vec<GraphQlErrorMessage>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlErrorMessage {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct IssuesData {
    pub issues: IssueConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueConnection {
    #[serde(default)]
    pub nodes: Vec<IssueNode>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IssueNode {
    pub id: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub priority: Option<f64>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub state: Option<StateNode>,
    #[serde(default)]
    pub team: Option<NamedNode>,
    #[serde(default)]
    pub cycle: Option<CycleNode>,
    #[serde(default)]
    pub labels: Option<LabelConnection>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StateNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NamedNode {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CycleNode {
    pub id: Option<String>,
    pub name: Option<String>,
    pub number: Option<f64>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LabelConnection {
    #[serde(default)]
    pub nodes: Vec<LabelNode>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LabelNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl IssueNode {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state
            .as_ref()
            .and_then(|state| state.kind.as_deref())
            .is_some_and(|kind| COMPLETED_STATE_TYPES.contains(&kind))
    }

    /// Flatten the wire node into the snapshot the rest of the crate uses.
    #[must_use]
    pub fn into_snapshot(self) -> IssueSnapshot {
        let is_completed = self.is_completed();
        #[allow(clippy::cast_possible_truncation)]
        let linear_priority = LinearPriority(self.priority.unwrap_or(0.0) as i32);
        let labels = self
            .labels
            .map(|connection| {
                connection
                    .nodes
                    .into_iter()
                    .map(|label| Label {
                        name: label.name.unwrap_or_default(),
                        color: label.color.unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        IssueSnapshot {
            id: self.id,
            identifier: self.identifier.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            linear_status: self
                .state
                .and_then(|state| state.name)
                .unwrap_or_default(),
            linear_priority,
            team_name: self.team.and_then(|team| team.name).unwrap_or_default(),
            updated_at: self.updated_at.unwrap_or_default(),
            is_completed,
            cycle: self.cycle.map(CycleNode::into_cycle),
            labels,
        }
    }
}

impl CycleNode {
    #[allow(clippy::cast_possible_truncation)]
    fn into_cycle(self) -> Cycle {
        Cycle {
            id: self.id,
            name: self.name.unwrap_or_default(),
            number: self.number.map(|n| n as i64),
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        }
    }
}
