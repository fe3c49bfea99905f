#![allow(dead_code)]

use async_trait::async_trait;
use sidecar::model::{Cycle, IssueSnapshot, LinearPriority};
use sidecar::{IssueSource, OverlayStore, SidecarError};
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tempfile::TempDir;
use tracing::info;

pub mod cli;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        sidecar::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

/// Overlay store in a fresh temp dir.
pub fn test_store() -> (OverlayStore, TempDir) {
    init_test_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = OverlayStore::open(dir.path().join("overlay.json"));
    (store, dir)
}

/// Snapshot builder with the fields most tests care about.
pub fn snapshot(identifier: &str) -> IssueSnapshot {
    IssueSnapshot {
        id: format!("uuid-{identifier}"),
        identifier: identifier.to_string(),
        title: format!("Work on {identifier}"),
        url: format!("https://linear.app/acme/issue/{identifier}"),
        linear_status: "In Progress".to_string(),
        linear_priority: LinearPriority::MEDIUM,
        team_name: "Engineering".to_string(),
        updated_at: "2025-02-20T10:30:00.000Z".to_string(),
        is_completed: false,
        cycle: None,
        labels: Vec::new(),
    }
}

pub fn completed(identifier: &str) -> IssueSnapshot {
    IssueSnapshot {
        linear_status: "Done".to_string(),
        is_completed: true,
        ..snapshot(identifier)
    }
}

pub fn in_cycle(identifier: &str, starts_at: &str, ends_at: &str) -> IssueSnapshot {
    IssueSnapshot {
        cycle: Some(Cycle {
            id: Some("cycle-1".to_string()),
            name: "Cycle 1".to_string(),
            number: Some(1),
            starts_at: Some(starts_at.to_string()),
            ends_at: Some(ends_at.to_string()),
        }),
        ..snapshot(identifier)
    }
}

/// In-memory issue source returning a fixed list.
pub struct StaticSource {
    pub issues: Vec<IssueSnapshot>,
    pub calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(issues: Vec<IssueSnapshot>) -> Self {
        Self {
            issues,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IssueSource for StaticSource {
    async fn fetch_assigned(&self) -> sidecar::Result<Vec<IssueSnapshot>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.issues.clone())
    }
}

/// Issue source that always fails the way a revoked key does.
pub struct RejectingSource;

#[async_trait]
impl IssueSource for RejectingSource {
    async fn fetch_assigned(&self) -> sidecar::Result<Vec<IssueSnapshot>> {
        Err(SidecarError::AuthRejected)
    }
}

/// Issue source that fails with an upstream server error.
pub struct BrokenSource;

#[async_trait]
impl IssueSource for BrokenSource {
    async fn fetch_assigned(&self) -> sidecar::Result<Vec<IssueSnapshot>> {
        Err(SidecarError::RemoteStatus {
            status: 503,
            body: "upstream unavailable".to_string(),
        })
    }
}
