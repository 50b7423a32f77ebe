//! Admission scheduler - burst/drain pacing around the upload gateway

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::entry::{FileContents, FileEntry};
use super::guard::InFlightGuard;
use super::job::UploadJob;
use crate::asset::{AssetKey, KeyMapper};
use crate::config::SessionConfig;
use crate::error::{BlokError, Result};
use crate::service::UploadGateway;
use crate::strategy::PacingPolicy;

/// Sent once per admitted, non-duplicate job after its request resolves,
/// whether it succeeded or not
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub file: AssetKey,
}

/// Totals for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub admitted: usize,
    pub dropped_duplicates: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub unsupported: usize,
}

#[derive(Debug, Default)]
struct Counters {
    in_progress: AtomicUsize,
    dropped_duplicates: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

/// Everything a dispatched upload needs, shared with the scheduler
struct Dispatcher<G> {
    config: Arc<SessionConfig>,
    gateway: Arc<G>,
    guard: InFlightGuard,
    counters: Arc<Counters>,
    completions: mpsc::UnboundedSender<Completion>,
}

impl<G> Clone for Dispatcher<G> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            gateway: Arc::clone(&self.gateway),
            guard: self.guard.clone(),
            counters: Arc::clone(&self.counters),
            completions: self.completions.clone(),
        }
    }
}

impl<G: UploadGateway> Dispatcher<G> {
    /// Claim the key; a key already in flight drops the job without a completion
    fn admit(&self, key: &AssetKey) -> bool {
        if self.guard.try_acquire(key) {
            self.counters.in_progress.fetch_add(1, Ordering::SeqCst);
            true
        } else {
            debug!("Dropping duplicate submission of {}", key);
            self.counters
                .dropped_duplicates
                .fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    /// Run an admitted job to completion. The guard must already be held.
    async fn upload(self, job: UploadJob) {
        let payload = self.config.protocol.build_payload(&job, &self.config);

        info!("Starts upload of {}", job.key);
        match self.gateway.send(&payload, &self.config).await {
            Ok(()) => {
                info!("File \"{}\" uploaded", job.key);
                self.counters.succeeded.fetch_add(1, Ordering::SeqCst);
            }
            Err(BlokError::Remote { status, body }) => {
                error!("Error uploading file {} ({}): {}", job.key, status, body);
                self.counters.failed.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                error!("Error uploading file {}: {}", job.key, e);
                self.counters.failed.fetch_add(1, Ordering::SeqCst);
            }
        }

        self.guard.release(&job.key);
        self.counters.in_progress.fetch_sub(1, Ordering::SeqCst);

        if self.completions.send(Completion { file: job.key }).is_err() {
            debug!("Completion receiver dropped");
        }
    }

    /// Wait out the pacing delay, then admit and upload
    async fn dispatch_later(self, job: UploadJob, delay: Duration) {
        tokio::time::sleep(delay).await;
        if self.admit(&job.key) {
            self.upload(job).await;
        }
    }
}

/// Accepts files in arrival order, forwards them immediately and uploads
/// them in the background: the first `burst_bucket_size` at once, the rest
/// on a fixed schedule.
///
/// Must be driven from inside a tokio runtime. Await [`finish`](Self::finish)
/// before dropping it; dropping aborts outstanding uploads.
pub struct AdmissionScheduler<G: UploadGateway + 'static> {
    key_mapper: KeyMapper,
    pacing: PacingPolicy,
    dispatcher: Dispatcher<G>,
    admitted_count: usize,
    unsupported: usize,
    tasks: JoinSet<()>,
}

impl<G: UploadGateway + 'static> AdmissionScheduler<G> {
    /// Create a scheduler and the receiving end of its completion channel
    pub fn new(
        config: Arc<SessionConfig>,
        gateway: G,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Completion>)> {
        let key_mapper = match &config.base_path {
            Some(base) => KeyMapper::with_base_path(base)?,
            None => KeyMapper::new(),
        };
        let pacing = PacingPolicy::from_config(&config);
        let (tx, rx) = mpsc::unbounded_channel();

        info!(
            "Ready to upload to theme {} ({}, burst {}, then {}/s)",
            config.theme_id,
            config.protocol,
            pacing.burst_bucket_size(),
            pacing.throughput_per_second()
        );

        let scheduler = Self {
            key_mapper,
            pacing,
            dispatcher: Dispatcher {
                config,
                gateway: Arc::new(gateway),
                guard: InFlightGuard::new(),
                counters: Arc::new(Counters::default()),
                completions: tx,
            },
            admitted_count: 0,
            unsupported: 0,
            tasks: JoinSet::new(),
        };

        Ok((scheduler, rx))
    }

    /// Admit one file and hand it back for the next stage.
    ///
    /// Streamed entries are rejected with [`BlokError::UnsupportedInput`] and not
    /// forwarded. Entries without contents are forwarded without an upload.
    pub fn submit(&mut self, entry: FileEntry) -> Result<FileEntry> {
        let contents = match &entry.contents {
            FileContents::Buffer(bytes) => Arc::clone(bytes),
            FileContents::Stream => {
                warn!("Streams are not supported: {}", entry.path.display());
                self.unsupported += 1;
                return Err(BlokError::UnsupportedInput { path: entry.path });
            }
            FileContents::Null => return Ok(entry),
        };

        let key = match self.key_mapper.make_asset_key(&entry.path, &entry.base) {
            Ok(key) => key,
            Err(e) => {
                error!("Cannot derive asset key for {}: {}", entry.path.display(), e);
                return Ok(entry);
            }
        };

        self.admitted_count += 1;
        let delay = self.pacing.delay_for(self.admitted_count);
        let job = UploadJob::new(key, contents);
        let dispatcher = self.dispatcher.clone();

        if delay.is_zero() {
            if dispatcher.admit(&job.key) {
                self.tasks.spawn(dispatcher.upload(job));
            }
        } else {
            debug!(
                "Delaying upload of {} by {}ms (admission #{})",
                job.key,
                delay.as_millis(),
                self.admitted_count
            );
            self.tasks.spawn(dispatcher.dispatch_later(job, delay));
        }

        Ok(entry)
    }

    /// Submit every entry in order, returning those forwarded downstream.
    /// Per-entry errors are logged and skipped.
    pub fn submit_all(&mut self, entries: impl IntoIterator<Item = FileEntry>) -> Vec<FileEntry> {
        entries
            .into_iter()
            .filter_map(|entry| self.submit(entry).ok())
            .collect()
    }

    /// Jobs admitted since the scheduler started
    pub fn admitted_count(&self) -> usize {
        self.admitted_count
    }

    /// Uploads holding the in-flight guard right now
    pub fn in_progress(&self) -> usize {
        self.dispatcher.counters.in_progress.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> &InFlightGuard {
        &self.dispatcher.guard
    }

    /// Wait for every scheduled upload to resolve and report the totals
    pub async fn finish(mut self) -> UploadReport {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                error!("Upload task failed: {}", e);
            }
        }

        let counters = &self.dispatcher.counters;
        let report = UploadReport {
            admitted: self.admitted_count,
            dropped_duplicates: counters.dropped_duplicates.load(Ordering::SeqCst),
            succeeded: counters.succeeded.load(Ordering::SeqCst),
            failed: counters.failed.load(Ordering::SeqCst),
            unsupported: self.unsupported,
        };

        info!(
            "Upload finished: {} admitted, {} uploaded, {} failed, {} duplicates dropped",
            report.admitted, report.succeeded, report.failed, report.dropped_duplicates
        );

        report
    }
}
