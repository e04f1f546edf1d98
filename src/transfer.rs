// Transfer engine: runs a batch of file descriptors through either
// download or delete, one request at a time and in input order.
//
// Progress lines go to the writer handed in by the caller so the
// command layer decides where output lands (stdout in the binary, a
// buffer in tests).

use anyhow::{Context, Result};
use log::{info, warn};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::api::{ApiClient, FileDescriptor};

/// What to do when one item of a batch fails at the transport or
/// filesystem level. A server refusing a delete is never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop the whole batch on the first failure.
    #[default]
    Abort,
    /// Report the failure for that item and move on.
    Continue,
}

/// Per-file result, used only to print a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Downloaded,
    Deleted,
    DeleteDenied(Option<String>),
    Failed(String),
}

/// Download every file into `target_dir`, named after its display name.
///
/// The directory is created if missing (one level only). Existing files
/// with the same name are overwritten. Under `ErrorPolicy::Abort` the first
/// failure ends the batch and partially written files are left as is.
pub fn download_all<W: Write>(
    client: &ApiClient,
    files: &[FileDescriptor],
    target_dir: &Path,
    token: &str,
    policy: ErrorPolicy,
    out: &mut W,
) -> Result<Vec<TransferOutcome>> {
    if !target_dir.exists() {
        fs::create_dir(target_dir)
            .with_context(|| format!("Failed to create directory {}", target_dir.display()))?;
    }
    info!("downloading {} files to {}", files.len(), target_dir.display());

    let mut outcomes = Vec::with_capacity(files.len());
    for file in files {
        match download_one(client, file, target_dir, token) {
            Ok(()) => {
                writeln!(out, "Downloaded {} to {}", file.name, target_dir.display())?;
                outcomes.push(TransferOutcome::Downloaded);
            }
            Err(e) if policy == ErrorPolicy::Continue => {
                warn!("download of {} ({}) failed: {:#}", file.name, file.id, e);
                writeln!(out, "Could not download the file {}: {:#}", file.name, e)?;
                outcomes.push(TransferOutcome::Failed(format!("{:#}", e)));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(outcomes)
}

fn download_one(
    client: &ApiClient,
    file: &FileDescriptor,
    target_dir: &Path,
    token: &str,
) -> Result<()> {
    let dest = local_path(target_dir, &file.name)?;
    let mut res = client.download_file(&file.url, token)?;
    let mut fp =
        File::create(&dest).with_context(|| format!("Failed to create {}", dest.display()))?;
    io::copy(&mut res, &mut fp).with_context(|| format!("Failed to write {}", dest.display()))?;
    Ok(())
}

/// Where a remote file lands locally. Only the last component of the
/// remote name is used so nothing is written outside `target_dir`.
fn local_path(target_dir: &Path, name: &str) -> Result<PathBuf> {
    let file_name = Path::new(name)
        .file_name()
        .with_context(|| format!("Refusing to save file with unusable name {:?}", name))?;
    Ok(target_dir.join(file_name))
}

/// Delete every file remotely. A file the server refuses to delete is
/// reported and the batch goes on; transport or parse errors follow
/// `policy`.
pub fn delete_all<W: Write>(
    client: &ApiClient,
    files: &[FileDescriptor],
    token: &str,
    policy: ErrorPolicy,
    out: &mut W,
) -> Result<Vec<TransferOutcome>> {
    info!("deleting {} files", files.len());

    let mut outcomes = Vec::with_capacity(files.len());
    for file in files {
        let outcome = match client.delete_file(&file.id, token) {
            Ok(resp) if resp.ok => {
                writeln!(out, "Deleted the file {}", file.name)?;
                TransferOutcome::Deleted
            }
            Ok(resp) => {
                match &resp.error {
                    Some(reason) => {
                        writeln!(out, "Could not delete the file {}: {}", file.name, reason)?
                    }
                    None => writeln!(out, "Could not delete the file {}", file.name)?,
                }
                TransferOutcome::DeleteDenied(resp.error)
            }
            Err(e) if policy == ErrorPolicy::Continue => {
                warn!("delete of {} ({}) failed: {:#}", file.name, file.id, e);
                writeln!(out, "Could not delete the file {}: {:#}", file.name, e)?;
                TransferOutcome::Failed(format!("{:#}", e))
            }
            Err(e) => return Err(e),
        };
        outcomes.push(outcome);
    }
    Ok(outcomes)
}
