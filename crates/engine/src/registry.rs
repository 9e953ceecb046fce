//! In-memory job registry.
//!
//! Maps session ids to [`JobRecord`]s behind a single `RwLock`. Every
//! operation holds the lock only for the duration of a map access; there is
//! no I/O inside. Readers receive cloned snapshots, and updates validate and
//! apply under one write guard, so a reader never sees a half-applied
//! transition.
//!
//! Records live until [`JobRegistry::reap`] evicts them. Only terminal
//! records are ever evicted.

use std::collections::HashMap;
use std::time::Duration;

use carbuy_core::job::{JobRecord, JobUpdate, TransitionError};
use carbuy_core::request::AnalysisRequest;
use carbuy_core::types::{SessionId, Timestamp};
use tokio::sync::RwLock;

/// Registry operation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Session already exists: {0}")]
    DuplicateSession(SessionId),

    #[error("Invalid transition for session {session_id}: {source}")]
    InvalidTransition {
        session_id: SessionId,
        #[source]
        source: TransitionError,
    },
}

/// Bounds applied by [`JobRegistry::reap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Terminal records untouched for longer than this are evicted.
    pub retention: Duration,
    /// Upper bound on stored records; the oldest terminal records go first.
    pub max_records: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(24 * 3600),
            max_records: 10_000,
        }
    }
}

/// Generate a fresh, never-reused session id.
pub fn new_session_id() -> SessionId {
    format!("session_{}", uuid::Uuid::new_v4().simple())
}

/// Concurrency-safe store of job records keyed by session id.
///
/// Designed to be wrapped in `Arc` and shared between the HTTP handlers,
/// the job executors, and the reaper task.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<SessionId, JobRecord>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a `Pending` record for `session_id`.
    pub async fn create(
        &self,
        session_id: SessionId,
        request: AnalysisRequest,
    ) -> Result<JobRecord, RegistryError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&session_id) {
            return Err(RegistryError::DuplicateSession(session_id));
        }

        let record = JobRecord::new(session_id.clone(), request, chrono::Utc::now());
        jobs.insert(session_id, record.clone());
        Ok(record)
    }

    /// Snapshot of the record for `session_id`.
    pub async fn get(&self, session_id: &str) -> Result<JobRecord, RegistryError> {
        self.jobs
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(session_id.to_string()))
    }

    /// Apply `update` and return the resulting snapshot.
    ///
    /// A rejected update leaves the stored record unchanged.
    pub async fn update(
        &self,
        session_id: &str,
        update: JobUpdate,
    ) -> Result<JobRecord, RegistryError> {
        let mut jobs = self.jobs.write().await;
        let record = jobs
            .get_mut(session_id)
            .ok_or_else(|| RegistryError::NotFound(session_id.to_string()))?;

        record
            .apply(update, chrono::Utc::now())
            .map_err(|source| RegistryError::InvalidTransition {
                session_id: session_id.to_string(),
                source,
            })?;

        Ok(record.clone())
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Evict terminal records per `policy`, returning how many were removed.
    ///
    /// First drops terminal records whose last update is older than the
    /// retention window, then drops the oldest remaining terminal records
    /// while the registry exceeds `max_records`. Pending and running
    /// records are never evicted, so the bound is soft under load.
    pub async fn reap(&self, now: Timestamp, policy: &RetentionPolicy) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();

        let cutoff = chrono::Duration::from_std(policy.retention)
            .ok()
            .and_then(|window| now.checked_sub_signed(window));
        if let Some(cutoff) = cutoff {
            jobs.retain(|_, rec| !(rec.status.is_terminal() && rec.updated_at < cutoff));
        }

        if jobs.len() > policy.max_records {
            let mut terminal: Vec<(Timestamp, SessionId)> = jobs
                .values()
                .filter(|rec| rec.status.is_terminal())
                .map(|rec| (rec.updated_at, rec.session_id.clone()))
                .collect();
            terminal.sort();

            let excess = jobs.len() - policy.max_records;
            for (_, session_id) in terminal.into_iter().take(excess) {
                jobs.remove(&session_id);
            }
        }

        before - jobs.len()
    }
}
