//! Read-only client for Linear's GraphQL API.
//!
//! Fetches every issue assigned to the API key's owner, keeping active work
//! and recently finished work. Nothing here writes to Linear.

pub mod query;

use crate::error::{Result, SidecarError};
use crate::model::IssueSnapshot;
use crate::util::{expand_home, time::parse_iso_datetime};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use query::{ASSIGNED_ISSUES_QUERY, GraphQlRequest, GraphQlResponse, IssueNode, PageVariables};
use std::fs;
use tracing::{debug, info, warn};

pub const DEFAULT_LINEAR_URL: &str = "https://api.linear.app/graphql";
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_COMPLETED_WINDOW_DAYS: i64 = 180;

/// Env var naming a file that holds the API key.
pub const TOKEN_FILE_ENV: &str = "LINEAR_GRAPHQL_API_FILE";
/// Env var holding the API key itself.
pub const TOKEN_ENV: &str = "LINEAR_GRAPHQL_API";

/// Anything that can produce the user's assigned issues.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Fetch a fresh snapshot of assigned issues.
    async fn fetch_assigned(&self) -> Result<Vec<IssueSnapshot>>;
}

/// Connection settings for [`LinearClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearSettings {
    pub url: String,
    pub page_size: u32,
    pub timeout_secs: u64,
    pub completed_window_days: i64,
    /// Token from configuration, used when neither env var is set.
    pub token: Option<String>,
}

impl Default for LinearSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_LINEAR_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            completed_window_days: DEFAULT_COMPLETED_WINDOW_DAYS,
            token: None,
        }
    }
}

/// HTTP client for the Linear GraphQL endpoint.
pub struct LinearClient {
    http: reqwest::Client,
    settings: LinearSettings,
}

impl LinearClient {
    /// Build a client. The token is resolved per fetch, so a key rotated on
    /// disk is picked up without a restart.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(settings: LinearSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("sidecar/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, settings })
    }

    #[must_use]
    pub const fn settings(&self) -> &LinearSettings {
        &self.settings
    }

    async fn fetch_page(&self, token: &str, after: Option<&str>) -> Result<query::IssueConnection> {
        let request = GraphQlRequest {
            query: ASSIGNED_ISSUES_QUERY,
            variables: PageVariables {
                first: self.settings.page_size,
                after,
            },
        };

        let response = self
            .http
            .post(&self.settings.url)
            .header(reqwest::header::AUTHORIZATION, token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SidecarError::AuthRejected);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SidecarError::RemoteStatus {
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        let payload: GraphQlResponse = response.json().await?;
        if let Some(errors) = payload.errors.filter(|errors| !errors.is_empty()) {
            return Err(SidecarError::GraphQl {
                messages: errors.into_iter().map(|e| e.message).collect(),
            });
        }
        payload
            .data
            .map(|data| data.issues)
            .ok_or_else(|| SidecarError::GraphQl {
                messages: vec!["response carried no data".to_string()],
            })
    }
}

#[async_trait]
impl IssueSource for LinearClient {
    async fn fetch_assigned(&self) -> Result<Vec<IssueSnapshot>> {
        let token = resolve_token(self.settings.token.as_deref())?;
        let cutoff = Utc::now() - Duration::days(self.settings.completed_window_days);

        let mut kept = Vec::new();
        let mut after: Option<String> = None;
        let mut pages = 0_usize;
        loop {
            let page = self.fetch_page(&token, after.as_deref()).await?;
            pages += 1;
            debug!(page = pages, nodes = page.nodes.len(), "Fetched Linear page");
            kept.extend(page.nodes.into_iter().filter(|node| keep_node(node, cutoff)));

            match page.page_info.end_cursor {
                Some(cursor) if page.page_info.has_next_page => after = Some(cursor),
                _ => break,
            }
        }

        info!(issues = kept.len(), pages, "Fetched assigned issues from Linear");
        Ok(kept.into_iter().map(IssueNode::into_snapshot).collect())
    }
}

/// Active issues always stay; finished ones only when updated since `cutoff`.
#[must_use]
pub fn keep_node(node: &IssueNode, cutoff: DateTime<Utc>) -> bool {
    if !node.is_completed() {
        return true;
    }
    node.updated_at
        .as_deref()
        .and_then(parse_iso_datetime)
        .is_some_and(|updated| updated >= cutoff)
}

/// Resolve the Linear API key from the environment, then `configured`.
///
/// # Errors
///
/// Returns `MissingToken` when no source yields a non-blank key.
pub fn resolve_token(configured: Option<&str>) -> Result<String> {
    resolve_token_from(
        std::env::var(TOKEN_FILE_ENV).ok().as_deref(),
        std::env::var(TOKEN_ENV).ok().as_deref(),
        configured,
    )
}

/// [`resolve_token`] with its inputs made explicit.
///
/// # Errors
///
/// Returns `MissingToken` when no source yields a non-blank key.
pub fn resolve_token_from(
    token_file: Option<&str>,
    token_env: Option<&str>,
    configured: Option<&str>,
) -> Result<String> {
    let from_file = token_file
        .filter(|path| !path.trim().is_empty())
        .and_then(|path| {
            let path = expand_home(path);
            match fs::read_to_string(&path) {
                Ok(contents) => Some(contents),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot read Linear token file");
                    None
                }
            }
        });

    [from_file.as_deref(), token_env, configured]
        .into_iter()
        .flatten()
        .map(strip_quotes)
        .find(|token| !token.is_empty())
        .ok_or(SidecarError::MissingToken)
}

/// Trim, then drop one pair of matching surrounding quotes.
fn strip_quotes(raw: &str) -> String {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].trim().to_string();
        }
    }
    trimmed.to_string()
}

fn truncate(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        return body.to_string();
    }
    let mut out: String = body.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
