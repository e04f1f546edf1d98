// Command layer: turns a parsed command into calls on the credential
// store, the API client and the transfer engine, and formats the output.
// Every handler writes to the `out` writer it is given.

use anyhow::Result;
use chrono::{Local, TimeZone};
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::io::{IsTerminal, Write};
use std::path::Path;
use std::time::Duration;

use crate::api::{ApiClient, FileDescriptor};
use crate::cli::{Commands, ConfigAction, DateRange, FilesAction};
use crate::config::{Credential, CredentialStore};
use crate::filter::build_filter;
use crate::transfer::{delete_all, download_all, ErrorPolicy};

/// Dispatch one command.
pub fn run<W: Write>(
    api: &ApiClient,
    store: &CredentialStore,
    command: Commands,
    out: &mut W,
) -> Result<()> {
    match command {
        Commands::Config { action: None } | Commands::Config { action: Some(ConfigAction::View) } => {
            config_view(store, out)
        }
        Commands::Config { action: Some(ConfigAction::Set { user, token }) } => {
            config_set(api, store, user, token, out)
        }
        Commands::Files { action } => {
            let cred = store.load()?;
            match action {
                FilesAction::List { range, long } => files_list(api, &cred, &range, long, out),
                FilesAction::Download { range, path, keep_going } => {
                    files_download(api, &cred, &range, &path, policy(keep_going), out)
                }
                FilesAction::Delete { range, keep_going } => {
                    files_delete(api, &cred, &range, policy(keep_going), out)
                }
            }
        }
    }
}

fn policy(keep_going: bool) -> ErrorPolicy {
    if keep_going {
        ErrorPolicy::Continue
    } else {
        ErrorPolicy::Abort
    }
}

/// Print the stored credential, one field per line.
pub fn config_view<W: Write>(store: &CredentialStore, out: &mut W) -> Result<()> {
    let cred = store.load()?;
    writeln!(out, "userid: {}", cred.user_id)?;
    writeln!(out, "username: {}", cred.user_name)?;
    writeln!(out, "token: {}", cred.token)?;
    Ok(())
}

/// Merge the given values into the stored credential, re-resolve the user
/// id and rewrite the file.
pub fn config_set<W: Write>(
    api: &ApiClient,
    store: &CredentialStore,
    user: Option<String>,
    token: Option<String>,
    out: &mut W,
) -> Result<()> {
    let mut cred = store.load_or_default()?;
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        cred.token = token;
    }
    if let Some(user) = user.filter(|u| !u.is_empty()) {
        cred.user_name = user;
    }
    if cred.token.is_empty() && std::io::stdin().is_terminal() {
        // `Password` hides input in terminal for tokens.
        cred.token = Password::new().with_prompt("Slack token").interact()?;
    }

    let spinner = spinner("Looking up user...")?;
    let user_id = api.lookup_user_id(&cred.user_name, &cred.token);
    spinner.finish_and_clear();
    cred.user_id = user_id?;

    if cred.user_id.is_empty() && !cred.user_name.is_empty() {
        writeln!(out, "No user named {} was found", cred.user_name)?;
    }
    store.save(&cred)?;
    info!("saved config to {}", store.path().display());
    Ok(())
}

fn fetch_files(api: &ApiClient, cred: &Credential, range: &DateRange) -> Result<Vec<FileDescriptor>> {
    if cred.user_id.is_empty() {
        warn!("config has no user id; the listing is not scoped to a user");
    }
    let filter = build_filter(&cred.user_id, range.from.as_deref(), range.to.as_deref());
    let spinner = spinner("Fetching files...")?;
    let files = api.list_files(&filter, &cred.token);
    spinner.finish_and_clear();
    files
}

pub fn files_list<W: Write>(
    api: &ApiClient,
    cred: &Credential,
    range: &DateRange,
    long: bool,
    out: &mut W,
) -> Result<()> {
    let files = fetch_files(api, cred, range)?;
    if long {
        writeln!(out, "fileID\t\tcreatedDate\t\t\tfileName")?;
    }
    for file in &files {
        if long {
            writeln!(out, "{}\t{}\t{}", file.id, format_created(file.created), file.name)?;
        } else {
            writeln!(out, "{}", file.name)?;
        }
    }
    Ok(())
}

pub fn files_download<W: Write>(
    api: &ApiClient,
    cred: &Credential,
    range: &DateRange,
    dir: &Path,
    policy: ErrorPolicy,
    out: &mut W,
) -> Result<()> {
    let files = fetch_files(api, cred, range)?;
    if files.is_empty() {
        writeln!(out, "There is no files created by {}", cred.user_name)?;
        return Ok(());
    }
    writeln!(out, "Found {} files created by {}", files.len(), cred.user_name)?;
    download_all(api, &files, dir, &cred.token, policy, out)?;
    Ok(())
}

pub fn files_delete<W: Write>(
    api: &ApiClient,
    cred: &Credential,
    range: &DateRange,
    policy: ErrorPolicy,
    out: &mut W,
) -> Result<()> {
    let files = fetch_files(api, cred, range)?;
    if files.is_empty() {
        writeln!(out, "There is no files created by {}.", cred.user_name)?;
        return Ok(());
    }
    writeln!(out, "Found {} files created by {}.", files.len(), cred.user_name)?;
    delete_all(api, &files, &cred.token, policy, out)?;
    Ok(())
}

/// Creation time in the local timezone, or the raw epoch value if it is
/// out of range.
fn format_created(created: i64) -> String {
    match Local.timestamp_opt(created, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S %z").to_string(),
        None => created.to_string(),
    }
}

/// Spinner on stderr while a request is in flight. Hidden when stderr is
/// not a terminal.
fn spinner(msg: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    fn setup(server: &MockServer) -> (ApiClient, CredentialStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::new(tmp.path().join("cfg.json"));
        let api = ApiClient::with_base_url(server.base_url()).unwrap();
        (api, store, tmp)
    }

    fn alice() -> Credential {
        Credential { user_id: "U1".into(), user_name: "alice".into(), token: "T".into() }
    }

    fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn view_prints_three_lines() {
        let server = MockServer::start();
        let (_api, store, _tmp) = setup(&server);
        store.save(&alice()).unwrap();

        let mut buf = Vec::new();
        config_view(&store, &mut buf).unwrap();
        assert_eq!(text(buf), "userid: U1\nusername: alice\ntoken: T\n");
    }

    #[test]
    fn view_without_config_fails() {
        let server = MockServer::start();
        let (_api, store, _tmp) = setup(&server);
        assert!(config_view(&store, &mut Vec::new()).is_err());
    }

    #[test]
    fn set_resolves_user_id_and_saves() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/users.list").query_param("token", "T");
            then.status(200).json_body(serde_json::json!({
                "ok": true,
                "members": [{ "id": "U9", "name": "bob" }, { "id": "U1", "name": "alice" }]
            }));
        });
        let (api, store, _tmp) = setup(&server);

        let mut buf = Vec::new();
        config_set(&api, &store, Some("alice".into()), Some("T".into()), &mut buf).unwrap();

        mock.assert();
        assert!(buf.is_empty());
        assert_eq!(store.load().unwrap(), alice());
    }

    #[test]
    fn set_keeps_existing_values_and_warns_on_unknown_user() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users.list").query_param("token", "OLD");
            then.status(200).json_body(serde_json::json!({
                "ok": true,
                "members": [{ "id": "U1", "name": "alice" }]
            }));
        });
        let (api, store, _tmp) = setup(&server);
        store
            .save(&Credential { user_id: "U1".into(), user_name: "alice".into(), token: "OLD".into() })
            .unwrap();

        let mut buf = Vec::new();
        config_set(&api, &store, Some("bob".into()), None, &mut buf).unwrap();

        let cred = store.load().unwrap();
        assert_eq!(cred.token, "OLD");
        assert_eq!(cred.user_name, "bob");
        assert_eq!(cred.user_id, "");
        assert_eq!(text(buf), "No user named bob was found\n");
    }

    #[test]
    fn list_short_and_long() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/files.list").query_param("user", "U1");
            then.status(200).json_body(serde_json::json!({
                "ok": true,
                "files": [
                    { "id": "F1", "name": "a.txt", "filetype": "text", "size": 1,
                      "url_private_download": "x", "created": 0 },
                    { "id": "F2", "name": "b.png", "filetype": "png", "size": 2,
                      "url_private_download": "y", "created": 86400 }
                ]
            }));
        });
        let (api, _store, _tmp) = setup(&server);

        let mut buf = Vec::new();
        files_list(&api, &alice(), &DateRange::default(), false, &mut buf).unwrap();
        assert_eq!(text(buf), "a.txt\nb.png\n");

        let mut buf = Vec::new();
        files_list(&api, &alice(), &DateRange::default(), true, &mut buf).unwrap();
        let out = text(buf);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "fileID\t\tcreatedDate\t\t\tfileName");
        assert_eq!(lines[1], format!("F1\t{}\ta.txt", format_created(0)));
        assert_eq!(lines[2], format!("F2\t{}\tb.png", format_created(86400)));
    }

    #[test]
    fn download_with_no_files_says_so() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/files.list");
            then.status(200).json_body(serde_json::json!({ "ok": true, "files": [] }));
        });
        let (api, _store, tmp) = setup(&server);
        let dir = tmp.path().join("out");

        let mut buf = Vec::new();
        files_download(&api, &alice(), &DateRange::default(), &dir, ErrorPolicy::Abort, &mut buf)
            .unwrap();
        assert_eq!(text(buf), "There is no files created by alice\n");
        assert!(!dir.exists());
    }

    #[test]
    fn delete_prints_found_count_then_outcomes() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/files.list");
            then.status(200).json_body(serde_json::json!({
                "ok": true,
                "files": [{ "id": "F1", "name": "a.txt", "url_private_download": "x", "created": 0 }]
            }));
        });
        server.mock(|when, then| {
            when.method(POST).path("/files.delete");
            then.status(200).json_body(serde_json::json!({ "ok": true }));
        });
        let (api, _store, _tmp) = setup(&server);

        let mut buf = Vec::new();
        files_delete(&api, &alice(), &DateRange::default(), ErrorPolicy::Abort, &mut buf).unwrap();
        assert_eq!(text(buf), "Found 1 files created by alice.\nDeleted the file a.txt\n");
    }

    #[test]
    fn files_command_without_config_fails_before_any_request() {
        let server = MockServer::start();
        let any = server.mock(|when, then| {
            when.path_includes("/");
            then.status(200);
        });
        let (api, store, _tmp) = setup(&server);

        let cmd = Commands::Files {
            action: FilesAction::List { range: DateRange::default(), long: false },
        };
        assert!(run(&api, &store, cmd, &mut Vec::new()).is_err());
        any.assert_calls(0);
    }
}
