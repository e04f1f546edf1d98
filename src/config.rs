// Credential store: one JSON file holding the user identity and API token.
// The path is always passed in explicitly; `default_path` only supplies
// the fallback location used by the binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name used under the home directory when no path is given.
pub const CONFIG_FILE_NAME: &str = ".slack-files-cli.json";

/// Environment variable that overrides the credential file location.
pub const CONFIG_ENV: &str = "SLACK_FILES_CONFIG";

/// Persisted credential. `user_id` stays empty until the name has been
/// resolved against the users list.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub token: String,
}

/// Reads and writes the credential file at a fixed path.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CredentialStore { path: path.into() }
    }

    /// `~/.slack-files-cli.json`, or the current directory when no home
    /// directory can be determined.
    pub fn default_path() -> PathBuf {
        let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.join(CONFIG_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the credential. A missing or malformed file is an error; the
    /// store never creates a credential on its own.
    pub fn load(&self) -> Result<Credential> {
        let data = fs::read_to_string(&self.path).with_context(|| {
            format!(
                "Failed to read config {} (run `config set` first)",
                self.path.display()
            )
        })?;
        let cred: Credential = serde_json::from_str(&data)
            .with_context(|| format!("Parsing config {}", self.path.display()))?;
        Ok(cred)
    }

    /// Load the credential if the file exists, else start from an empty one.
    pub fn load_or_default(&self) -> Result<Credential> {
        if self.exists() {
            self.load()
        } else {
            Ok(Credential::default())
        }
    }

    /// Rewrite the whole file. The JSON is written to a sibling temp file
    /// first and renamed over the target.
    pub fn save(&self, cred: &Credential) -> Result<()> {
        let bytes = serde_json::to_vec(cred).context("Serializing config")?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace config {}", self.path.display()))?;
        Ok(())
    }
}
