use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_LISTING_URL;
use crate::picture::DEFAULT_NAME_MARKER;
use crate::settings::ChangeInterval;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Directory holding settings, picture records and downloaded wallpapers.
    #[arg(long, global = true, env = "WALLFETCH_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Listing page URL; `{page}` is replaced by the page number.
    #[arg(long, global = true, env = "WALLFETCH_LISTING_URL", default_value = DEFAULT_LISTING_URL)]
    pub listing_url: String,

    /// Path segment after which picture names start.
    #[arg(long, global = true, env = "WALLFETCH_NAME_MARKER", default_value = DEFAULT_NAME_MARKER)]
    pub name_marker: String,

    /// External command used to set the wallpaper (the image path is appended).
    /// Split on whitespace; pass arguments containing spaces with `--set-arg`.
    /// Defaults to the native desktop API.
    #[arg(long, global = true, env = "WALLFETCH_SET_COMMAND")]
    pub set_command: Option<String>,

    /// Extra argument for `--set-command`, passed verbatim before the image path.
    #[arg(long = "set-arg", global = true, allow_hyphen_values = true)]
    pub set_args: Vec<String>,

    /// HTTP request timeout.
    #[arg(long, global = true, default_value_t = 20)]
    pub timeout_secs: u64,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a random picture and set it as the wallpaper.
    Update(UpdateArgs),
    /// Fetch a random picture and record it without changing the wallpaper.
    Fetch(OutputArgs),
    /// Probe the listing for pages beyond the known maximum.
    Probe,
    /// List recorded pictures, most recent first.
    History(HistoryArgs),
    /// Delete the record for a picture.
    Forget(ForgetArgs),
    /// Set the last applied wallpaper again.
    Reapply,
    /// Delete downloaded wallpaper files.
    ClearCache,
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Run in the foreground, changing wallpapers per the saved settings.
    Run,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Attempts before giving up.
    #[arg(long, default_value_t = 3)]
    pub attempts: u32,

    /// Delay between attempts.
    #[arg(long, default_value_t = 1000)]
    pub retry_delay_ms: u64,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Maximum records to print.
    #[arg(long)]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct ForgetArgs {
    /// Full image URL of the record.
    #[arg(long)]
    pub url: String,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    Show(OutputArgs),
    Set(ConfigSetArgs),
}

#[derive(Debug, Args)]
pub struct ConfigSetArgs {
    /// Enable or disable automatic changes.
    #[arg(long)]
    pub auto_change: Option<bool>,

    /// How often to change the wallpaper.
    #[arg(long, value_enum)]
    pub interval: Option<ChangeInterval>,
}
