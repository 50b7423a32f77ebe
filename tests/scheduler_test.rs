//! Tests for admission, pacing and in-flight de-duplication

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use blok_sync::asset::AssetKey;
use blok_sync::config::{ConfigOptions, SessionConfig};
use blok_sync::protocol::Payload;
use blok_sync::service::UploadGateway;
use blok_sync::strategy::PacingPolicy;
use blok_sync::upload::{AdmissionScheduler, FileEntry, InFlightGuard};
use blok_sync::BlokError;

/// Records each call's key and the time it was made
#[derive(Clone, Default)]
struct RecordingGateway {
    calls: Arc<Mutex<Vec<(AssetKey, Instant)>>>,
    /// Uploads block until a permit is available when set
    gate: Option<Arc<Semaphore>>,
    fail: bool,
}

fn payload_key(payload: &Payload) -> AssetKey {
    match payload {
        Payload::V1(body) => body.filepath.clone(),
        Payload::V2(envelope) => envelope.template.path.clone(),
    }
}

#[async_trait]
impl UploadGateway for RecordingGateway {
    async fn send(&self, payload: &Payload, _config: &SessionConfig) -> blok_sync::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((payload_key(payload), Instant::now()));

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        if self.fail {
            Err(BlokError::Remote {
                status: 500,
                body: "{\"error\":\"down\"}".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

fn test_config(burst: usize, throughput: u64) -> Arc<SessionConfig> {
    SessionConfig::new(
        "key".to_string(),
        "1".to_string(),
        ConfigOptions {
            host: Some("blok.example.com".to_string()),
            burst_bucket_size: Some(burst),
            throughput_per_second: Some(throughput),
            ..ConfigOptions::default()
        },
    )
    .unwrap()
}

// ==================== PacingPolicy Tests ====================

#[test]
fn test_delay_inside_burst_is_zero() {
    let policy = PacingPolicy::new(10, 2);
    for count in 1..=10 {
        assert_eq!(policy.delay_for(count), Duration::ZERO);
    }
}

#[test]
fn test_delay_after_burst() {
    let policy = PacingPolicy::new(10, 2);
    assert_eq!(policy.delay_for(10 + 4), Duration::from_millis(2000));
    assert_eq!(policy.delay_for(11), Duration::from_millis(500));
    assert_eq!(policy.delay_for(15), Duration::from_millis(2500));
}

#[test]
fn test_delay_is_non_decreasing() {
    let policy = PacingPolicy::new(40, 3);
    let delays: Vec<Duration> = (1..200).map(|n| policy.delay_for(n)).collect();
    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_default_policy_matches_config() {
    let config = test_config(40, 2);
    let policy = PacingPolicy::from_config(&config);
    assert_eq!(policy.burst_bucket_size(), 40);
    assert_eq!(policy.throughput_per_second(), 2);
}

// ==================== InFlightGuard Tests ====================

#[test]
fn test_guard_acquire_release() {
    let guard = InFlightGuard::new();
    let key = AssetKey::new("app.js");

    assert!(guard.try_acquire(&key));
    assert!(!guard.try_acquire(&key));
    assert!(!guard.try_acquire(&key));
    assert!(guard.contains(&key));

    guard.release(&key);
    assert!(!guard.contains(&key));
    assert!(guard.try_acquire(&key));
}

#[test]
fn test_guard_release_absent_key_is_noop() {
    let guard = InFlightGuard::new();
    let key = AssetKey::new("app.js");
    guard.release(&key);
    guard.release(&key);
    assert!(guard.is_empty());
}

#[test]
fn test_guard_keys_are_independent() {
    let guard = InFlightGuard::new();
    assert!(guard.try_acquire(&AssetKey::new("a.js")));
    assert!(guard.try_acquire(&AssetKey::new("b.js")));
    assert_eq!(guard.len(), 2);
}

#[test]
fn test_guard_clones_share_state() {
    let guard = InFlightGuard::new();
    let other = guard.clone();
    let key = AssetKey::new("a.js");
    assert!(guard.try_acquire(&key));
    assert!(!other.try_acquire(&key));
}

// ==================== AdmissionScheduler Tests ====================

#[tokio::test]
async fn test_duplicate_in_flight_submission_is_dropped() {
    let gate = Arc::new(Semaphore::new(0));
    let gateway = RecordingGateway {
        gate: Some(Arc::clone(&gate)),
        ..RecordingGateway::default()
    };
    let calls = Arc::clone(&gateway.calls);

    let (mut scheduler, mut completions) =
        AdmissionScheduler::new(test_config(10, 2), gateway).unwrap();

    scheduler
        .submit(FileEntry::buffer("dist/app.js", "dist", "one"))
        .unwrap();
    let second = scheduler
        .submit(FileEntry::buffer("dist/app.js", "dist", "two"))
        .unwrap();

    // Both are forwarded downstream regardless
    assert!(second.is_buffer());
    assert_eq!(scheduler.admitted_count(), 2);
    assert!(scheduler.in_flight().contains(&AssetKey::new("app.js")));
    assert_eq!(scheduler.in_progress(), 1);

    gate.add_permits(10);
    let report = scheduler.finish().await;

    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(report.dropped_duplicates, 1);
    assert_eq!(report.succeeded, 1);

    assert_eq!(
        completions.recv().await.map(|c| c.file),
        Some(AssetKey::new("app.js"))
    );
    assert_eq!(completions.recv().await, None);
}

#[tokio::test]
async fn test_same_key_uploads_again_after_completion() {
    let gateway = RecordingGateway::default();
    let calls = Arc::clone(&gateway.calls);

    let (mut scheduler, mut completions) =
        AdmissionScheduler::new(test_config(10, 2), gateway).unwrap();

    scheduler
        .submit(FileEntry::buffer("dist/app.js", "dist", "one"))
        .unwrap();
    assert!(completions.recv().await.is_some());
    assert!(scheduler.in_flight().is_empty());
    assert_eq!(scheduler.in_progress(), 0);

    scheduler
        .submit(FileEntry::buffer("dist/app.js", "dist", "two"))
        .unwrap();
    assert!(completions.recv().await.is_some());

    let report = scheduler.finish().await;
    assert_eq!(calls.lock().unwrap().len(), 2);
    assert_eq!(report.dropped_duplicates, 0);
}

#[tokio::test(start_paused = true)]
async fn test_burst_then_paced_dispatch() {
    let gateway = RecordingGateway::default();
    let calls = Arc::clone(&gateway.calls);

    let (mut scheduler, _completions) =
        AdmissionScheduler::new(test_config(10, 2), gateway).unwrap();

    let start = Instant::now();
    for i in 1..=15 {
        let path = format!("site/f{:02}.txt", i);
        scheduler
            .submit(FileEntry::buffer(&path, "site", "x"))
            .unwrap();
    }
    assert_eq!(scheduler.admitted_count(), 15);

    let report = scheduler.finish().await;
    assert_eq!(report.succeeded, 15);

    let mut calls = calls.lock().unwrap().clone();
    calls.sort_by(|a, b| a.0.cmp(&b.0));

    let offsets: Vec<u128> = calls
        .iter()
        .map(|(_, at)| at.duration_since(start).as_millis())
        .collect();
    assert_eq!(
        offsets,
        vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 500, 1000, 1500, 2000, 2500]
    );
    assert_eq!(calls[10].0, AssetKey::new("f11.txt"));
    assert_eq!(calls[14].0, AssetKey::new("f15.txt"));
}

#[tokio::test(start_paused = true)]
async fn test_delayed_duplicate_is_dropped_at_dispatch() {
    let gate = Arc::new(Semaphore::new(0));
    let gateway = RecordingGateway {
        gate: Some(Arc::clone(&gate)),
        ..RecordingGateway::default()
    };
    let calls = Arc::clone(&gateway.calls);

    let (mut scheduler, mut completions) =
        AdmissionScheduler::new(test_config(1, 2), gateway).unwrap();

    // First goes out at once and blocks; second is scheduled 500ms later
    scheduler
        .submit(FileEntry::buffer("dist/app.js", "dist", "one"))
        .unwrap();
    scheduler
        .submit(FileEntry::buffer("dist/app.js", "dist", "two"))
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    gate.add_permits(10);

    let report = scheduler.finish().await;
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert_eq!(report.admitted, 2);
    assert_eq!(report.dropped_duplicates, 1);
    assert!(completions.recv().await.is_some());
    assert_eq!(completions.recv().await, None);
}

#[tokio::test]
async fn test_failed_upload_still_notifies() {
    let gateway = RecordingGateway {
        fail: true,
        ..RecordingGateway::default()
    };

    let (mut scheduler, mut completions) =
        AdmissionScheduler::new(test_config(10, 2), gateway).unwrap();

    scheduler
        .submit(FileEntry::buffer("dist/a.css", "dist", "a{}"))
        .unwrap();
    scheduler
        .submit(FileEntry::buffer("dist/b.css", "dist", "b{}"))
        .unwrap();

    let report = scheduler.finish().await;
    assert_eq!(report.failed, 2);
    assert_eq!(report.succeeded, 0);

    let mut files = Vec::new();
    while let Some(completion) = completions.recv().await {
        files.push(completion.file);
    }
    files.sort();
    assert_eq!(files, vec![AssetKey::new("a.css"), AssetKey::new("b.css")]);
}

#[tokio::test]
async fn test_stream_entry_is_rejected_and_run_continues() {
    let gateway = RecordingGateway::default();
    let calls = Arc::clone(&gateway.calls);

    let (mut scheduler, _completions) =
        AdmissionScheduler::new(test_config(10, 2), gateway).unwrap();

    let video = FileEntry::stream("dist/video.mp4", "dist");
    assert!(video.is_stream());
    let err = scheduler.submit(video).unwrap_err();
    assert!(matches!(err, BlokError::UnsupportedInput { .. }));
    assert_eq!(scheduler.admitted_count(), 0);

    scheduler
        .submit(FileEntry::buffer("dist/app.js", "dist", "x"))
        .unwrap();

    let report = scheduler.finish().await;
    assert_eq!(report.unsupported, 1);
    assert_eq!(report.admitted, 1);
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_null_entry_is_forwarded_without_upload() {
    let gateway = RecordingGateway::default();
    let calls = Arc::clone(&gateway.calls);

    let (mut scheduler, _completions) =
        AdmissionScheduler::new(test_config(10, 2), gateway).unwrap();

    let forwarded = scheduler
        .submit(FileEntry::null("dist/images", "dist"))
        .unwrap();
    assert!(forwarded.is_null());
    assert_eq!(scheduler.admitted_count(), 0);

    let report = scheduler.finish().await;
    assert_eq!(report.admitted, 0);
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_all_forwards_in_order() {
    let gateway = RecordingGateway::default();

    let (mut scheduler, _completions) =
        AdmissionScheduler::new(test_config(10, 2), gateway).unwrap();

    let forwarded = scheduler.submit_all(vec![
        FileEntry::buffer("dist/a.js", "dist", "a"),
        FileEntry::stream("dist/b.js", "dist"),
        FileEntry::null("dist/sub", "dist"),
        FileEntry::buffer("dist/c.js", "dist", "c"),
    ]);

    let paths: Vec<String> = forwarded
        .iter()
        .map(|e| e.path.to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(paths, vec!["dist/a.js", "dist/sub", "dist/c.js"]);

    let report = scheduler.finish().await;
    assert_eq!(report.admitted, 2);
    assert_eq!(report.unsupported, 1);
}

#[tokio::test]
async fn test_configured_base_path_overrides_entry_base() {
    let gateway = RecordingGateway::default();
    let calls = Arc::clone(&gateway.calls);

    let config = SessionConfig::new(
        "key".to_string(),
        "1".to_string(),
        ConfigOptions {
            host: Some("blok.example.com".to_string()),
            base_path: Some("build".into()),
            ..ConfigOptions::default()
        },
    )
    .unwrap();
    let (mut scheduler, _completions) = AdmissionScheduler::new(config, gateway).unwrap();

    scheduler
        .submit(FileEntry::buffer("build/theme/app.js", "build/theme", "x"))
        .unwrap();
    scheduler.finish().await;

    assert_eq!(calls.lock().unwrap()[0].0, AssetKey::new("theme/app.js"));
}
