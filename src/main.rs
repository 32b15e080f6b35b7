use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use wallfetch::cli::{Cli, Command, ConfigCommand};
use wallfetch::commands;
use wallfetch::services::Services;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    wallfetch::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let services = Services::from_args(&cli.global).context("build services")?;

    match cli.command {
        Command::Update(args) => commands::update(&services, args).await.context("update")?,
        Command::Fetch(args) => commands::fetch(&services, args).await.context("fetch")?,
        Command::Probe => commands::probe(&services).await.context("probe")?,
        Command::History(args) => commands::history(&services, args)
            .await
            .context("history")?,
        Command::Forget(args) => commands::forget(&services, args).await.context("forget")?,
        Command::Reapply => commands::reapply(&services).await.context("reapply")?,
        Command::ClearCache => commands::clear_cache(&services)
            .await
            .context("clear-cache")?,
        Command::Config {
            command: ConfigCommand::Show(args),
        } => commands::config_show(&services, args)
            .await
            .context("config show")?,
        Command::Config {
            command: ConfigCommand::Set(args),
        } => commands::config_set(&services, args)
            .await
            .context("config set")?,
        Command::Run => wallfetch::daemon::run(&services).await.context("run")?,
    }

    Ok(())
}
