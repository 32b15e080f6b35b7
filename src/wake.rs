use std::time::{Duration, Instant, SystemTime};

use tokio::sync::broadcast;

/// OS-level notifications the daemon reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent {
    Wake,
    WorkspaceChanged,
}

/// True when the wall clock moved noticeably further than the monotonic
/// clock, which stops while the machine sleeps.
pub fn is_wake(wall_elapsed: Duration, monotonic_elapsed: Duration, tolerance: Duration) -> bool {
    wall_elapsed > monotonic_elapsed.saturating_add(tolerance)
}

/// Publishes [`SystemEvent::Wake`] after every detected sleep.
pub fn spawn_wake_detector(
    events: broadcast::Sender<SystemEvent>,
    tick: Duration,
    tolerance: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wall_before = SystemTime::now();
            let monotonic_before = Instant::now();
            tokio::time::sleep(tick).await;

            let wall_elapsed = SystemTime::now()
                .duration_since(wall_before)
                .unwrap_or_default();
            let monotonic_elapsed = monotonic_before.elapsed();
            if !is_wake(wall_elapsed, monotonic_elapsed, tolerance) {
                continue;
            }

            tracing::info!(
                slept_secs = wall_elapsed.saturating_sub(monotonic_elapsed).as_secs(),
                "system woke from sleep"
            );
            if events.send(SystemEvent::Wake).is_err() {
                tracing::debug!("no wake listeners left; stopping wake detector");
                break;
            }
        }
    })
}
