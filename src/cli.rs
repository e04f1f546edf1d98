// Command-line definition: clap derive structs for the `config` and
// `files` verbs. Parsing only, no behaviour.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_ENV;

#[derive(Parser, Debug)]
#[command(name = "slack-files-cli", version, about = "Manage Slack files")]
pub struct Cli {
    /// Credential file (defaults to ~/.slack-files-cli.json)
    #[arg(long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// View/set config
    #[command(visible_alias = "c")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// List/download/delete files
    #[command(visible_alias = "f")]
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// View current config values
    View,
    /// Set config values
    Set {
        /// Slack username
        #[arg(short, long)]
        user: Option<String>,
        /// Authentication token
        #[arg(short, long)]
        token: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum FilesAction {
    /// Show files list
    List {
        #[command(flatten)]
        range: DateRange,
        /// List in long format
        #[arg(short, long)]
        long: bool,
    },
    /// Download files
    Download {
        #[command(flatten)]
        range: DateRange,
        /// Directory where files will be downloaded
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
        /// Report failed downloads and continue with the rest
        #[arg(long)]
        keep_going: bool,
    },
    /// Delete files
    Delete {
        #[command(flatten)]
        range: DateRange,
        /// Report failed requests and continue with the rest
        #[arg(long)]
        keep_going: bool,
    },
}

/// Creation-date window shared by the files subcommands. A value that is
/// not a valid YYYYMMDD date is ignored, leaving that side open.
#[derive(Args, Debug, Default, Clone)]
pub struct DateRange {
    /// Filter files created after date (YYYYMMDD; invalid dates are ignored)
    #[arg(long)]
    pub from: Option<String>,
    /// Filter files created before date (YYYYMMDD; invalid dates are ignored)
    #[arg(long)]
    pub to: Option<String>,
}
