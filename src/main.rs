// Entrypoint for the CLI application.
// - Parses arguments, sets up logging, builds the API client and the
//   credential store, then hands the command to `ui::run`.
// - Any error bubbles up here and exits the process non-zero.

use clap::Parser;
use env_logger::Builder as LogBuilder;
use log::LevelFilter;
use slack_files_cli::{api::ApiClient, cli::Cli, config::CredentialStore, ui};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    LogBuilder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    // Base URL comes from `SLACK_API_URL` or defaults to the public API.
    let api = ApiClient::from_env()?;
    let store = CredentialStore::new(cli.config.unwrap_or_else(CredentialStore::default_path));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    ui::run(&api, &store, cli.command, &mut out)?;
    Ok(())
}
