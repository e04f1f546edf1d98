// Library root
// -----------
// The binary (`main.rs`) parses the command line and hands the command to
// `ui::run`; everything else lives here so it can be tested directly.
//
// Module responsibilities:
// - `config`: the credential file (user id, user name, token).
// - `filter`: turns `--from` / `--to` dates into a files.list filter.
// - `api`: blocking HTTP calls against the Slack Web API.
// - `transfer`: bulk download and delete over a list of files.
// - `cli`: clap definitions for the command line.
// - `ui`: per-command handlers and output formatting.
pub mod api;
pub mod cli;
pub mod config;
pub mod filter;
pub mod transfer;
pub mod ui;
