use std::time::Duration;

use anyhow::Context as _;

use crate::cli::{ConfigSetArgs, ForgetArgs, HistoryArgs, OutputArgs, UpdateArgs};
use crate::picture::PictureRecord;
use crate::services::Services;
use crate::updater::UpdateEvent;

pub async fn update(services: &Services, args: UpdateArgs) -> anyhow::Result<()> {
    let updater = services
        .updater(args.attempts)
        .with_retry_delay(Duration::from_millis(args.retry_delay_ms));

    let mut events = updater.subscribe();
    let progress = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                UpdateEvent::Started { attempt } => tracing::debug!(attempt, "update started"),
                UpdateEvent::Fetched { picture } => {
                    tracing::info!(name = %picture.name, url = %picture.url, "picture fetched");
                }
                UpdateEvent::AttemptFailed { attempt, kind, error } => {
                    tracing::debug!(attempt, kind, error, "attempt failed");
                }
                UpdateEvent::Applied { .. } | UpdateEvent::Failed { .. } => break,
            }
        }
    });

    let result = updater.update_wallpaper().await;
    drop(updater);
    let _ = progress.await;

    let outcome = result.context("update wallpaper")?;
    if args.output.json {
        let value = serde_json::json!({
            "record": outcome.record,
            "path": outcome.path,
        });
        println!("{value}");
    } else {
        println!("{}", outcome.path.display());
    }
    Ok(())
}

pub async fn fetch(services: &Services, args: OutputArgs) -> anyhow::Result<()> {
    let record = services
        .updater(1)
        .fetch_and_record()
        .await
        .context("fetch picture")?;
    print_records(std::slice::from_ref(&record), args.json)
}

pub async fn probe(services: &Services) -> anyhow::Result<()> {
    let max_page = services
        .page_range_tracker()
        .refresh()
        .await
        .context("probe page range")?;
    println!("{max_page}");
    Ok(())
}

pub async fn history(services: &Services, args: HistoryArgs) -> anyhow::Result<()> {
    let mut records = services.store.list().await.context("list pictures")?;
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }
    print_records(&records, args.output.json)
}

pub async fn forget(services: &Services, args: ForgetArgs) -> anyhow::Result<()> {
    let removed = services
        .store
        .delete(&args.url)
        .await
        .context("delete picture record")?;
    if !removed {
        anyhow::bail!("no picture recorded for url: {}", args.url);
    }
    tracing::info!(url = %args.url, "picture record deleted");
    Ok(())
}

pub async fn reapply(services: &Services) -> anyhow::Result<()> {
    let path = services
        .applier
        .reapply_last()
        .await
        .context("reapply wallpaper")?;
    println!("{}", path.display());
    Ok(())
}

pub async fn clear_cache(services: &Services) -> anyhow::Result<()> {
    let freed = services
        .applier
        .clear_cache()
        .await
        .context("clear wallpaper cache")?;
    println!("freed {freed} bytes");
    Ok(())
}

pub async fn config_show(services: &Services, args: OutputArgs) -> anyhow::Result<()> {
    let settings = services.settings.load().await.context("load settings")?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&settings).context("serialize settings")?
        );
        return Ok(());
    }

    println!("auto_change_enabled = {}", settings.auto_change_enabled);
    println!("change_interval = {}", settings.change_interval);
    println!("max_page = {}", settings.max_page);
    match settings.last_wallpaper {
        Some(path) => println!("last_wallpaper = {}", path.display()),
        None => println!("last_wallpaper ="),
    }
    Ok(())
}

pub async fn config_set(services: &Services, args: ConfigSetArgs) -> anyhow::Result<()> {
    if args.auto_change.is_none() && args.interval.is_none() {
        anyhow::bail!("nothing to set: pass --auto-change and/or --interval");
    }

    let settings = services
        .settings
        .update(|settings| {
            if let Some(enabled) = args.auto_change {
                settings.auto_change_enabled = enabled;
            }
            if let Some(interval) = args.interval {
                settings.change_interval = interval;
            }
        })
        .await
        .context("save settings")?;
    tracing::info!(
        auto_change_enabled = settings.auto_change_enabled,
        change_interval = %settings.change_interval,
        "settings updated"
    );
    Ok(())
}

fn print_records(records: &[PictureRecord], json: bool) -> anyhow::Result<()> {
    for record in records {
        if json {
            println!(
                "{}",
                serde_json::to_string(record).context("serialize picture record")?
            );
        } else {
            println!(
                "{}\t{}\t{}",
                record.last_fetched_time.to_rfc3339(),
                record.name.as_deref().unwrap_or("-"),
                record.url
            );
        }
    }
    Ok(())
}
