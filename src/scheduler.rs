use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::audio::AudioExtractor;
use crate::job::Job;
use crate::pipeline::ProcessJob;
use crate::scan;
use crate::store::JobStore;

/// Single-flight job scheduler.
///
/// Owns the guard that ensures at most one worker loop is alive, the
/// enqueue/retry entry points, and the drain policy: jobs are claimed
/// strictly oldest-`created_at`-first, one at a time, and a failing job
/// never stops the loop.
///
/// Race window between "queue drained" and "guard released": every
/// [`enqueue`](Self::enqueue) and [`retry`](Self::retry) calls
/// [`start`](Self::start) unconditionally, so each enqueue doubles as a
/// wake-up; the worker additionally re-checks the queue after releasing
/// the guard, so a job enqueued inside the window is never starved.
pub struct Scheduler {
    store: Arc<dyn JobStore>,
    processor: Arc<dyn ProcessJob>,
    extractor: AudioExtractor,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(store: Arc<dyn JobStore>, processor: Arc<dyn ProcessJob>) -> Self {
        Self {
            store,
            processor,
            extractor: AudioExtractor::new(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override the duration-probe extractor (tests).
    pub fn with_extractor(mut self, extractor: AudioExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Whether a worker loop is currently alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Create a pending job for `filepath` unless one already exists.
    ///
    /// `filepath` is the dedup key: re-scanning or re-uploading the same
    /// path returns the existing job unchanged, whatever its status. The
    /// lookup here only short-circuits the duration probe; the store's
    /// insert enforces uniqueness under its own lock, so concurrent
    /// enqueues of one path still converge on a single job.
    /// Always signals the worker afterwards.
    pub async fn enqueue(&self, filepath: PathBuf, folder: &str) -> Result<Job> {
        if let Some(existing) = self.store.find_by_filepath(&filepath).await? {
            self.start();
            return Ok(existing);
        }

        let mut job = Job::new(filepath, folder);
        job.duration_seconds = self.extractor.probe_duration(&job.filepath).await;
        let job = self.store.insert(job).await?;
        info!("📥 Enqueued job {}: {}", job.id, job.filepath.display());

        self.start();
        Ok(job)
    }

    /// Scan `dir` for video files and enqueue each new one.
    ///
    /// Returns the newly created jobs (already-known paths are skipped).
    pub async fn enqueue_folder(&self, dir: &Path) -> Result<Vec<Job>> {
        let folder = dir.to_string_lossy().into_owned();
        let mut added = Vec::new();
        for filepath in scan::scan_folder(dir)? {
            if self.store.find_by_filepath(&filepath).await?.is_some() {
                continue;
            }
            added.push(self.enqueue(filepath, &folder).await?);
        }
        info!("📂 Enqueued {} new video(s) from {}", added.len(), dir.display());
        Ok(added)
    }

    /// Requeue a failed job and signal the worker.
    ///
    /// Legal only when the job is `failed`; any other status (or an
    /// unknown id) leaves the record untouched and returns it as-is.
    pub async fn retry(&self, id: u64) -> Result<Option<Job>> {
        let Some(mut job) = self.store.get(id).await? else {
            return Ok(None);
        };

        if job.reset_for_retry() {
            self.store.update(&job).await?;
            info!("🔄 Retrying job {}: {}", job.id, job.filename);
            self.start();
        }
        Ok(Some(job))
    }

    /// Spawn the worker loop unless one is already running.
    ///
    /// Idempotent: safe to call any number of times; while a worker is
    /// alive this is a no-op.
    pub fn start(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let store = Arc::clone(&self.store);
        let processor = Arc::clone(&self.processor);
        let extractor = self.extractor.clone();
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            loop {
                worker_loop(Arc::clone(&store), Arc::clone(&processor), &extractor).await;
                running.store(false, Ordering::Release);

                // A job enqueued between the empty-queue observation and
                // the release above saw a no-op start(). Re-check and
                // re-claim so it is not stranded until the next trigger.
                match store.find_oldest_pending().await {
                    Ok(Some(_))
                        if running
                            .compare_exchange(
                                false,
                                true,
                                Ordering::AcqRel,
                                Ordering::Acquire,
                            )
                            .is_ok() =>
                    {
                        continue;
                    }
                    _ => break,
                }
            }
        });
    }

    /// Wait for the worker to drain: no worker alive and no pending
    /// jobs left. The guard can flicker during the re-claim window, so
    /// checking `is_running` alone is not enough.
    pub async fn wait_until_idle(&self) {
        loop {
            if !self.is_running()
                && !matches!(self.store.find_oldest_pending().await, Ok(Some(_)))
            {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

/// Drain pending jobs oldest-first until the queue is empty.
///
/// Each job is claimed (persisted as `processing` immediately so
/// observers see real-time state), gets its duration probed and saved
/// if still unknown, is run through the pipeline, and is committed as
/// `done` or `failed`. Probing before the pipeline means a job that
/// later fails still keeps its duration. Pipeline errors are policy
/// here and only here: they become a failed transition, never a loop
/// abort.
async fn worker_loop(
    store: Arc<dyn JobStore>,
    processor: Arc<dyn ProcessJob>,
    extractor: &AudioExtractor,
) {
    info!("🚀 Worker loop started");
    let mut processed = 0usize;

    loop {
        let next = match store.find_oldest_pending().await {
            Ok(next) => next,
            Err(e) => {
                error!("Job store query failed, stopping worker: {}", e);
                break;
            }
        };
        let Some(mut job) = next else {
            break;
        };

        job.begin_processing();
        if let Err(e) = store.update(&job).await {
            error!("Failed to claim job {}, stopping worker: {}", job.id, e);
            break;
        }
        info!("⚙️  Processing job {}: {}", job.id, job.filename);

        if job.duration_seconds.is_none() {
            job.duration_seconds = extractor.probe_duration(&job.filepath).await;
            if job.duration_seconds.is_some() {
                if let Err(e) = store.update(&job).await {
                    error!("Failed to persist job {} duration: {}", job.id, e);
                    break;
                }
            }
        }

        match processor.process(&job).await {
            Ok(output) => {
                job.complete(output);
                info!("✅ Job {} done: {}", job.id, job.filename);
            }
            Err(e) => {
                warn!("❌ Job {} failed: {}", job.id, e);
                job.fail(e.to_string());
            }
        }

        if let Err(e) = store.update(&job).await {
            error!("Failed to persist job {} outcome: {}", job.id, e);
            break;
        }
        processed += 1;
    }

    info!("🏁 Worker loop finished ({} job(s) processed)", processed);
}
