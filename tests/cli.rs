mod listing_stub;

use std::path::Path;

use listing_stub::{ListingStub, ListingStubConfig};
use predicates::prelude::*;
use wallfetch::picture::PictureRecord;

fn wallfetch(data_dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("wallfetch");
    cmd.env("WALLFETCH_DATA_DIR", data_dir)
        .env_remove("WALLFETCH_SET_COMMAND")
        .env_remove("WALLFETCH_LOG");
    cmd
}

fn stub() -> ListingStub {
    ListingStub::spawn(ListingStubConfig {
        pages: vec![
            vec!["/media/wallpapers/city/night.jpg"],
            vec!["/media/wallpapers/city/dawn.jpg"],
        ],
        ..ListingStubConfig::default()
    })
}

#[test]
fn config_set_then_show_round_trips() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;

    wallfetch(temp.path())
        .args(["config", "set", "--auto-change", "true", "--interval", "on-wake"])
        .assert()
        .success();

    let output = wallfetch(temp.path())
        .args(["config", "show", "--json"])
        .output()?;
    assert!(output.status.success());
    let settings: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(settings["auto_change_enabled"], true);
    assert_eq!(settings["change_interval"], "on-wake");
    assert_eq!(settings["max_page"], 1);
    Ok(())
}

#[test]
fn config_set_without_values_fails() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    wallfetch(temp.path())
        .args(["config", "set"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to set"));
    Ok(())
}

#[test]
fn fetch_records_picture_and_history_lists_it() -> anyhow::Result<()> {
    let stub = stub();
    let temp = tempfile::TempDir::new()?;

    let output = wallfetch(temp.path())
        .args(["fetch", "--json", "--listing-url", &stub.listing_url()])
        .output()?;
    assert!(output.status.success(), "{output:?}");
    let record: PictureRecord = serde_json::from_slice(&output.stdout)?;
    assert_eq!(record.name.as_deref(), Some("city-night.jpg"));
    assert_eq!(
        record.url,
        format!("{}/media/wallpapers/city/night.jpg", stub.base_url)
    );

    wallfetch(temp.path())
        .args(["history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("city-night.jpg"));

    wallfetch(temp.path())
        .args(["forget", "--url", &record.url])
        .assert()
        .success();
    wallfetch(temp.path())
        .args(["forget", "--url", &record.url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no picture recorded"));
    wallfetch(temp.path())
        .args(["history"])
        .assert()
        .success()
        .stdout("");
    Ok(())
}

#[test]
fn probe_prints_new_maximum() -> anyhow::Result<()> {
    let stub = stub();
    let temp = tempfile::TempDir::new()?;

    wallfetch(temp.path())
        .args(["probe", "--listing-url", &stub.listing_url()])
        .assert()
        .success()
        .stdout("2\n");
    Ok(())
}

#[test]
fn update_fails_cleanly_when_source_is_unreachable() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    wallfetch(temp.path())
        .args([
            "update",
            "--attempts",
            "2",
            "--retry-delay-ms",
            "0",
            "--set-command",
            "true",
            "--listing-url",
            "http://127.0.0.1:9/page/{page}",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("network request failed"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn update_with_command_setter_prints_wallpaper_path() -> anyhow::Result<()> {
    let stub = stub();
    let temp = tempfile::TempDir::new()?;

    let output = wallfetch(temp.path())
        .args([
            "update",
            "--set-command",
            "ls",
            "--listing-url",
            &stub.listing_url(),
        ])
        .output()?;
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout)?;
    let path = Path::new(stdout.trim());
    assert_eq!(path.parent(), Some(temp.path().join("wallpapers").as_path()));
    let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();
    assert!(file_name.starts_with("city-night-"), "{file_name}");
    assert!(file_name.ends_with(".jpg"), "{file_name}");
    assert!(path.exists());

    wallfetch(temp.path())
        .args(["reapply", "--set-command", "ls"])
        .assert()
        .success()
        .stdout(predicate::str::contains(stdout.trim()));
    Ok(())
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    wallfetch(temp.path())
        .env("RUST_LOG", "debug")
        .args(["config", "show"])
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
    Ok(())
}
