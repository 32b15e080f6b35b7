use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::applier::WallpaperApplier;
use crate::scheduler::AutoChangeScheduler;
use crate::services::Services;
use crate::wake::{SystemEvent, spawn_wake_detector};

const WAKE_TICK: Duration = Duration::from_secs(30);
const WAKE_TOLERANCE: Duration = Duration::from_secs(15);

/// Foreground loop: probes the page range once, arms the scheduler from the
/// saved settings and reacts to OS events until interrupted.
///
/// On unix, `SIGHUP` reloads settings and `SIGUSR1` reports a workspace change.
pub async fn run(services: &Services) -> anyhow::Result<()> {
    let (events, _) = broadcast::channel::<SystemEvent>(16);

    let tracker = Arc::new(services.page_range_tracker());
    let probe = tracker.spawn_refresh();

    let wake_detector = spawn_wake_detector(events.clone(), WAKE_TICK, WAKE_TOLERANCE);
    let reapplier = spawn_workspace_listener(Arc::clone(&services.applier), events.subscribe());

    let updater = Arc::new(services.updater(services.config.update_attempts));
    let scheduler = AutoChangeScheduler::new(updater, events.clone());
    arm_from_settings(services, &scheduler).await?;

    wait_for_shutdown(services, &scheduler, &events).await?;

    tracing::info!("shutting down");
    scheduler.disable();
    probe.abort();
    wake_detector.abort();
    reapplier.abort();
    Ok(())
}

async fn arm_from_settings(
    services: &Services,
    scheduler: &AutoChangeScheduler,
) -> anyhow::Result<()> {
    let settings = services.settings.load().await.context("load settings")?;
    if settings.auto_change_enabled {
        scheduler.enable(settings.change_interval);
    } else {
        scheduler.disable();
        tracing::info!("auto change is disabled; enable it with `config set --auto-change true`");
    }
    Ok(())
}

/// Reapplies the last wallpaper on every [`SystemEvent::WorkspaceChanged`].
pub fn spawn_workspace_listener(
    applier: Arc<WallpaperApplier>,
    mut events: broadcast::Receiver<SystemEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SystemEvent::WorkspaceChanged) => {
                    if let Err(err) = applier.reapply_last().await {
                        tracing::warn!(kind = err.kind(), %err, "failed to reapply wallpaper");
                    }
                }
                Ok(SystemEvent::Wake) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(unix)]
async fn wait_for_shutdown(
    services: &Services,
    scheduler: &AutoChangeScheduler,
    events: &broadcast::Sender<SystemEvent>,
) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup()).context("install SIGHUP handler")?;
    let mut user1 = signal(SignalKind::user_defined1()).context("install SIGUSR1 handler")?;
    let mut terminate = signal(SignalKind::terminate()).context("install SIGTERM handler")?;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("wait for ctrl-c")?;
                return Ok(());
            }
            _ = terminate.recv() => return Ok(()),
            _ = hangup.recv() => {
                tracing::info!("reloading settings");
                if let Err(err) = arm_from_settings(services, scheduler).await {
                    tracing::warn!(?err, "failed to reload settings");
                }
            }
            _ = user1.recv() => {
                let _ = events.send(SystemEvent::WorkspaceChanged);
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(
    _services: &Services,
    _scheduler: &AutoChangeScheduler,
    _events: &broadcast::Sender<SystemEvent>,
) -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await.context("wait for ctrl-c")
}
