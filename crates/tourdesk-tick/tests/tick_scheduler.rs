//! Refresh-timer behaviour on a paused Tokio clock.
//!
//! With `start_paused = true` the clock jumps forward whenever every task
//! is idle, so a fifteen-minute refresh interval elapses instantly.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tourdesk_tick::{
    RepeatingTask, TickConfig, TickError, TickInfo, TickScheduler, ensure_runtime,
};

const REFRESH: Duration = Duration::from_secs(15 * 60);

fn counting_job(
    counter: &Arc<AtomicU64>,
) -> impl FnMut(TickInfo) -> std::future::Ready<()> + Send + 'static {
    let counter = Arc::clone(counter);
    move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        std::future::ready(())
    }
}

// =========================================================================
// TickConfig / ensure_runtime
// =========================================================================

#[test]
fn test_default_config_refreshes_every_fifteen_minutes() {
    let cfg = TickConfig::default();

    assert_eq!(cfg.tick_duration(), Some(REFRESH));
    assert_eq!(cfg.initial_jitter, Duration::ZERO);
}

#[test]
fn test_ensure_runtime_outside_tokio_is_no_runtime() {
    assert!(matches!(ensure_runtime(), Err(TickError::NoRuntime)));
}

#[tokio::test]
async fn test_ensure_runtime_inside_tokio_succeeds() {
    assert!(ensure_runtime().is_ok());
}

// =========================================================================
// TickScheduler
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_refresh_is_one_interval_after_start() {
    let mut scheduler = TickScheduler::new(TickConfig::with_interval(REFRESH));
    let start = tokio::time::Instant::now();

    let info = scheduler.wait_for_tick().await;
    scheduler.record_tick_end();

    assert_eq!(info.tick, 1);
    assert_eq!(info.ticks_skipped, 0);
    assert_eq!(start.elapsed(), REFRESH);
    assert_eq!(scheduler.tick_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_jitter_shifts_only_the_first_refresh() {
    let mut scheduler = TickScheduler::new(TickConfig {
        initial_jitter: Duration::from_secs(60),
        ..TickConfig::with_interval(REFRESH)
    });
    let start = tokio::time::Instant::now();

    scheduler.wait_for_tick().await;
    let first = start.elapsed();
    scheduler.wait_for_tick().await;

    assert!(first >= REFRESH && first < REFRESH + Duration::from_secs(60));
    assert_eq!(start.elapsed(), first + REFRESH);
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_never_refreshes() {
    let mut scheduler = TickScheduler::new(TickConfig::with_interval(Duration::ZERO));
    assert!(scheduler.is_disabled());

    let waited =
        tokio::time::timeout(REFRESH * 10, scheduler.wait_for_tick()).await;

    assert!(waited.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_wake_after_long_sleep_refreshes_once() {
    let mut scheduler = TickScheduler::new(TickConfig::with_interval(REFRESH));

    // Laptop lid closed for an hour.
    tokio::time::advance(Duration::from_secs(3600) + Duration::from_secs(30)).await;
    let info = scheduler.wait_for_tick().await;
    let resumed = tokio::time::Instant::now();
    scheduler.wait_for_tick().await;

    assert_eq!(info.tick, 1);
    assert_eq!(info.ticks_skipped, 3);
    assert_eq!(resumed.elapsed(), REFRESH);
}

// =========================================================================
// RepeatingTask
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_armed_task_runs_job_every_interval() {
    let counter = Arc::new(AtomicU64::new(0));
    let mut task = RepeatingTask::new(TickConfig::with_interval(REFRESH));
    task.arm(counting_job(&counter)).unwrap();

    tokio::time::sleep(REFRESH * 3 + Duration::from_secs(1)).await;

    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_rearming_replaces_the_running_timer() {
    let counter = Arc::new(AtomicU64::new(0));
    let mut task = RepeatingTask::new(TickConfig::with_interval(REFRESH));

    task.arm(counting_job(&counter)).unwrap();
    tokio::time::sleep(REFRESH / 2).await;
    task.arm(counting_job(&counter)).unwrap();

    // The first timer would have fired here.
    tokio::time::sleep(REFRESH / 2 + Duration::from_secs(1)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    tokio::time::sleep(REFRESH / 2).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disarm_stops_future_runs() {
    let counter = Arc::new(AtomicU64::new(0));
    let mut task = RepeatingTask::new(TickConfig::with_interval(REFRESH));
    task.arm(counting_job(&counter)).unwrap();

    tokio::time::sleep(REFRESH + Duration::from_secs(1)).await;
    assert!(task.disarm());
    assert!(!task.is_armed());
    tokio::time::sleep(REFRESH * 4).await;

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_task_stops_timer() {
    let counter = Arc::new(AtomicU64::new(0));
    drop({
        let mut task = RepeatingTask::new(TickConfig::with_interval(REFRESH));
        task.arm(counting_job(&counter)).unwrap();
        task
    });

    tokio::time::sleep(REFRESH * 3).await;

    assert_eq!(counter.load(Ordering::SeqCst), 0);
}
