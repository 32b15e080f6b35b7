use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::settings::ChangeInterval;
use crate::updater::Updater;
use crate::wake::SystemEvent;

/// Work performed each time the scheduler fires.
#[async_trait]
pub trait ScheduledUpdate: Send + Sync {
    async fn run_scheduled(&self);
}

#[async_trait]
impl ScheduledUpdate for Updater {
    async fn run_scheduled(&self) {
        match self.update_once().await {
            Ok(outcome) => {
                tracing::info!(url = %outcome.record.url, "scheduled wallpaper change done");
            }
            Err(err) => {
                tracing::error!(kind = err.kind(), %err, "scheduled wallpaper change failed");
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    ArmedTimer(Duration),
    ArmedWake,
}

struct Armed {
    state: SchedulerState,
    task: JoinHandle<()>,
}

/// Fires wallpaper changes on a timer or on system wake.
pub struct AutoChangeScheduler {
    target: Arc<dyn ScheduledUpdate>,
    events: broadcast::Sender<SystemEvent>,
    armed: Mutex<Option<Armed>>,
}

impl AutoChangeScheduler {
    pub fn new(target: Arc<dyn ScheduledUpdate>, events: broadcast::Sender<SystemEvent>) -> Self {
        Self {
            target,
            events,
            armed: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(SchedulerState::Idle, |armed| armed.state)
    }

    /// Arms the trigger for `interval`, replacing any active one.
    pub fn enable(&self, interval: ChangeInterval) -> SchedulerState {
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = armed.take() {
            previous.task.abort();
        }

        let target = Arc::clone(&self.target);
        let (state, task) = match interval.period() {
            Some(period) => (
                SchedulerState::ArmedTimer(period),
                tokio::spawn(run_timer(target, period)),
            ),
            None => (
                SchedulerState::ArmedWake,
                tokio::spawn(run_on_wake(target, self.events.subscribe())),
            ),
        };
        tracing::info!(%interval, ?state, "auto change armed");

        *armed = Some(Armed { state, task });
        state
    }

    pub fn disable(&self) {
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = armed.take() {
            previous.task.abort();
            tracing::info!("auto change disabled");
        }
    }
}

impl Drop for AutoChangeScheduler {
    fn drop(&mut self) {
        self.disable();
    }
}

async fn run_timer(target: Arc<dyn ScheduledUpdate>, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        tracing::debug!(period_secs = period.as_secs(), "auto change timer fired");
        target.run_scheduled().await;
    }
}

async fn run_on_wake(target: Arc<dyn ScheduledUpdate>, mut events: broadcast::Receiver<SystemEvent>) {
    loop {
        match events.recv().await {
            Ok(SystemEvent::Wake) => {
                tracing::debug!("auto change wake trigger fired");
                target.run_scheduled().await;
            }
            Ok(SystemEvent::WorkspaceChanged) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "wake listener lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
