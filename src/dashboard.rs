//! The dashboard service: snapshot cache, overlay store and issue source
//! behind one async API shared by the HTTP server and the CLI.

use crate::error::{Result, SidecarError, StructuredError};
use crate::linear::IssueSource;
use crate::merge::merge_issues;
use crate::model::{ColumnPrefs, IssueSnapshot, MergedIssue, OverlayDocument};
use crate::overlay::{OverlayPatch, OverlayStore, RankAction, SaveOutcome};
use crate::view::ViewQuery;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The merged, filtered and sorted list returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct IssueList {
    pub issues: Vec<MergedIssue>,
    pub last_fetched: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct CachedSnapshot {
    issues: Vec<IssueSnapshot>,
    fetched_at: DateTime<Utc>,
}

pub struct Dashboard {
    store: Mutex<OverlayStore>,
    source: Arc<dyn IssueSource>,
    cache: Mutex<Option<CachedSnapshot>>,
    release_completed_ranks: bool,
}

impl Dashboard {
    #[must_use]
    pub fn new(store: OverlayStore, source: Arc<dyn IssueSource>) -> Self {
        Self {
            store: Mutex::new(store),
            source,
            cache: Mutex::new(None),
            release_completed_ranks: false,
        }
    }

    /// Clear personal priorities of issues that come back completed.
    #[must_use]
    pub const fn with_release_completed_ranks(mut self, enabled: bool) -> Self {
        self.release_completed_ranks = enabled;
        self
    }

    /// Merged issues, fetching only when nothing is cached yet.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when the cache is empty and the fetch fails.
    pub async fn issues(&self, query: &ViewQuery) -> Result<IssueList> {
        self.issues_as_of(query, Utc::now().date_naive()).await
    }

    /// [`Self::issues`] with an explicit "today" for cycle grouping.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when the cache is empty and the fetch fails.
    pub async fn issues_as_of(&self, query: &ViewQuery, today: NaiveDate) -> Result<IssueList> {
        let snapshot = {
            let mut cache = self.cache.lock().await;
            if cache.is_none() {
                let issues = self.source.fetch_assigned().await?;
                *cache = Some(CachedSnapshot {
                    issues,
                    fetched_at: Utc::now(),
                });
            }
            cache.clone()
        };
        Ok(self.build_list(snapshot, query, today).await)
    }

    /// Refetch from the source, replacing the cache.
    ///
    /// On failure the cache and the overlay are left exactly as they were.
    ///
    /// # Errors
    ///
    /// Returns the fetch error.
    pub async fn refresh(&self, query: &ViewQuery) -> Result<IssueList> {
        let issues = self.source.fetch_assigned().await?;

        if self.release_completed_ranks {
            let completed: Vec<&str> = issues
                .iter()
                .filter(|issue| issue.is_completed)
                .map(IssueSnapshot::overlay_key)
                .collect();
            let store = self.store.lock().await;
            if let Err(e) = store.release_ranks(completed) {
                warn!(error = %e, "Could not release ranks of completed issues");
            }
        }

        let snapshot = CachedSnapshot {
            issues,
            fetched_at: Utc::now(),
        };
        info!(issues = snapshot.issues.len(), "Refreshed issue snapshot");
        *self.cache.lock().await = Some(snapshot.clone());

        Ok(self
            .build_list(Some(snapshot), query, Utc::now().date_naive())
            .await)
    }

    /// Save notes, status and priority for one issue.
    ///
    /// # Errors
    ///
    /// Returns validation or I/O errors from the store.
    pub async fn save_overlay(&self, issue_id: &str, patch: &OverlayPatch) -> Result<SaveOutcome> {
        let store = self.store.lock().await;
        store.upsert(issue_id, patch)
    }

    /// Apply a rank action to one issue.
    ///
    /// # Errors
    ///
    /// Returns `UnknownIssue`, `NotRanked`, `InvalidPosition` or I/O errors.
    pub async fn reorder(&self, issue_id: &str, action: RankAction) -> Result<OverlayDocument> {
        let store = self.store.lock().await;
        store.reorder(issue_id, action)
    }

    pub async fn overlay(&self) -> OverlayDocument {
        self.store.lock().await.load()
    }

    pub async fn columns(&self) -> ColumnPrefs {
        self.store.lock().await.columns()
    }

    /// Replace the visible columns.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the save fails.
    pub async fn set_columns(&self, columns: ColumnPrefs) -> Result<ColumnPrefs> {
        let store = self.store.lock().await;
        store.set_columns(columns)
    }

    pub async fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.cache.lock().await.as_ref().map(|cached| cached.fetched_at)
    }

    /// Every identifier the dashboard knows of: overlay keys plus cached
    /// snapshot keys.
    pub async fn known_ids(&self) -> Vec<String> {
        let mut ids: BTreeSet<String> = self.overlay().await.issues.into_keys().collect();
        if let Some(cached) = self.cache.lock().await.as_ref() {
            ids.extend(cached.issues.iter().map(|i| i.overlay_key().to_string()));
        }
        ids.into_iter().collect()
    }

    /// Structured form of `err`, with "did you mean" hints for unknown ids.
    pub async fn describe_error(&self, err: &SidecarError) -> StructuredError {
        match err {
            SidecarError::UnknownIssue { id } => {
                StructuredError::unknown_issue(id, &self.known_ids().await)
            }
            other => StructuredError::from_error(other),
        }
    }

    async fn build_list(
        &self,
        snapshot: Option<CachedSnapshot>,
        query: &ViewQuery,
        today: NaiveDate,
    ) -> IssueList {
        let overlay = self.overlay().await;
        let (issues, last_fetched) = snapshot
            .map(|cached| (cached.issues, Some(cached.fetched_at)))
            .unwrap_or_default();
        let merged = merge_issues(&issues, &overlay);
        IssueList {
            issues: query.apply(&merged, today),
            last_fetched,
        }
    }
}
