use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::job::{Job, JobStatus};

/// Per-status job counts, for status displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub done: usize,
    pub failed: usize,
}

/// Persistence collaborator for job records.
///
/// The scheduler is the only writer while a job is in flight; each call
/// is a short independent transaction, never held across an external
/// call (ffmpeg, the transcription service).
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job, assigning its id. Returns the stored record.
    ///
    /// `filepath` is a unique key: when a job for the same path already
    /// exists the insert is a no-op and the existing record is returned.
    /// The lookup and the insert happen under one write lock, so
    /// concurrent inserts of the same path cannot both create a record.
    async fn insert(&self, job: Job) -> Result<Job>;

    /// Upsert the full record for an existing job.
    async fn update(&self, job: &Job) -> Result<()>;

    /// Fetch a job by id.
    async fn get(&self, id: u64) -> Result<Option<Job>>;

    /// Fetch a job by its (unique) video filepath.
    async fn find_by_filepath(&self, path: &Path) -> Result<Option<Job>>;

    /// The oldest `pending` job by `created_at` (ties broken by lowest
    /// id, i.e. insertion order).
    async fn find_oldest_pending(&self) -> Result<Option<Job>>;

    /// Job counts per status.
    async fn counts(&self) -> Result<StatusCounts>;

    /// All jobs, newest first (for listings).
    async fn list(&self) -> Result<Vec<Job>>;
}

/// In-memory job store backed by a `tokio` read-write lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    jobs: HashMap<u64, Job>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert(&self, mut job: Job) -> Result<Job> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .jobs
            .values()
            .find(|stored| stored.filepath == job.filepath)
        {
            debug!(
                "Insert for {} matched existing job {}",
                job.filepath.display(),
                existing.id
            );
            return Ok(existing.clone());
        }
        inner.next_id += 1;
        job.id = inner.next_id;
        inner.jobs.insert(job.id, job.clone());
        debug!("Inserted job {} for {}", job.id, job.filepath.display());
        Ok(job)
    }

    async fn update(&self, job: &Job) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get(&self, id: u64) -> Result<Option<Job>> {
        Ok(self.inner.read().await.jobs.get(&id).cloned())
    }

    async fn find_by_filepath(&self, path: &Path) -> Result<Option<Job>> {
        let inner = self.inner.read().await;
        Ok(inner
            .jobs
            .values()
            .find(|job| job.filepath == path)
            .cloned())
    }

    async fn find_oldest_pending(&self) -> Result<Option<Job>> {
        let inner = self.inner.read().await;
        Ok(inner
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Pending)
            .min_by_key(|job| (job.created_at, job.id))
            .cloned())
    }

    async fn counts(&self) -> Result<StatusCounts> {
        let inner = self.inner.read().await;
        let mut counts = StatusCounts::default();
        for job in inner.jobs.values() {
            match job.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Done => counts.done += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        Ok(counts)
    }

    async fn list(&self) -> Result<Vec<Job>> {
        let inner = self.inner.read().await;
        let mut jobs: Vec<Job> = inner.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn job(path: &str) -> Job {
        Job::new(PathBuf::from(path), "/videos")
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store.insert(job("/videos/a.mp4")).await.unwrap();
        let b = store.insert(job("/videos/b.mp4")).await.unwrap();
        assert!(a.id > 0);
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn insert_returns_existing_record_for_duplicate_filepath() {
        let store = MemoryStore::new();
        let first = store.insert(job("/videos/a.mp4")).await.unwrap();
        let second = store.insert(job("/videos/a.mp4")).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_inserts_of_one_filepath_create_one_job() {
        let store = MemoryStore::new();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(job("/videos/same.mp4")).await.unwrap()
            }));
        }
        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().id);
        }

        assert_eq!(ids.len(), 1, "got distinct ids {:?}", ids);
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn find_by_filepath_matches_exactly() {
        let store = MemoryStore::new();
        store.insert(job("/videos/a.mp4")).await.unwrap();

        let found = store
            .find_by_filepath(Path::new("/videos/a.mp4"))
            .await
            .unwrap();
        assert!(found.is_some());
        assert!(store
            .find_by_filepath(Path::new("/videos/b.mp4"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn oldest_pending_uses_created_at_then_id() {
        let store = MemoryStore::new();
        // Same created_at is possible when jobs are enqueued in one
        // burst; insertion order (id) must break the tie.
        let mut first = job("/videos/a.mp4");
        let mut second = job("/videos/b.mp4");
        let now = chrono::Utc::now();
        first.created_at = now;
        second.created_at = now;
        let first = store.insert(first).await.unwrap();
        store.insert(second).await.unwrap();

        let claimed = store.find_oldest_pending().await.unwrap().unwrap();
        assert_eq!(claimed.id, first.id);
    }

    #[tokio::test]
    async fn oldest_pending_skips_non_pending() {
        let store = MemoryStore::new();
        let mut done = store.insert(job("/videos/a.mp4")).await.unwrap();
        done.begin_processing();
        done.fail("x");
        store.update(&done).await.unwrap();
        let pending = store.insert(job("/videos/b.mp4")).await.unwrap();

        let claimed = store.find_oldest_pending().await.unwrap().unwrap();
        assert_eq!(claimed.id, pending.id);
    }

    #[tokio::test]
    async fn counts_track_statuses() {
        let store = MemoryStore::new();
        store.insert(job("/videos/a.mp4")).await.unwrap();
        let mut failing = store.insert(job("/videos/b.mp4")).await.unwrap();
        failing.begin_processing();
        failing.fail("boom");
        store.update(&failing).await.unwrap();

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.processing, 0);
        assert_eq!(counts.done, 0);
    }
}
