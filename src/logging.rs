use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

/// Takes precedence over `RUST_LOG`.
pub const LOG_ENV: &str = "WALLFETCH_LOG";

const DEFAULT_DIRECTIVES: &str = "info,hyper_util=warn,reqwest=warn,html5ever=error";

pub fn init() -> anyhow::Result<()> {
    let filter = build_filter(
        std::env::var(LOG_ENV)
            .ok()
            .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok())
            .as_deref(),
    )?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}

fn build_filter(directives: Option<&str>) -> anyhow::Result<EnvFilter> {
    match directives.map(str::trim).filter(|value| !value.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("parse log directives: {directives:?}")),
        None => EnvFilter::try_new(DEFAULT_DIRECTIVES).context("build default log filter"),
    }
}
