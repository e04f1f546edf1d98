// API client module: a small blocking HTTP client for the Slack Web API
// endpoints this tool needs (files.list, files.delete, users.list) plus
// authenticated downloads of private file URLs.

use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::filter::ListFilter;

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "SLACK_API_URL";
pub const DEFAULT_API_URL: &str = "https://slack.com/api";

/// Blocking client holding the reqwest client and the API base URL.
/// The token is passed per call since it lives in the credential file.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// One remote file as returned by files.list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub filetype: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "url_private_download", default)]
    pub url: String,
    #[serde(default)]
    pub created: i64,
}

/// files.list response body.
#[derive(Deserialize, Debug)]
pub struct FilesList {
    pub ok: Option<bool>,
    pub error: Option<String>,
    #[serde(default)]
    pub files: Vec<FileDescriptor>,
}

/// files.delete response body.
#[derive(Deserialize, Debug)]
pub struct DeleteResponse {
    #[serde(default)]
    pub ok: bool,
    pub error: Option<String>,
}

/// users.list response body.
#[derive(Deserialize, Debug)]
pub struct UsersList {
    pub ok: Option<bool>,
    pub error: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Deserialize, Debug)]
pub struct Member {
    pub id: String,
    pub name: String,
}

impl ApiClient {
    /// Create an ApiClient configured from `SLACK_API_URL`, falling back to
    /// the public Slack API.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.into());
        Self::with_base_url(base_url)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("slack-files-cli/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    fn auth_headers(token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let val = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("Token is not a valid header value")?;
        headers.insert(AUTHORIZATION, val);
        Ok(headers)
    }

    /// Fetch the files owned by `filter.user`. One request, no pagination:
    /// only the first page the server returns is ever seen.
    pub fn list_files(&self, filter: &ListFilter, token: &str) -> Result<Vec<FileDescriptor>> {
        let url = Url::parse_with_params(&self.endpoint("files.list"), &filter.query_params(token))
            .context("Building files.list url")?;
        debug!(
            "GET files.list user={:?} ts_from={:?} ts_to={:?}",
            filter.user, filter.from, filter.to
        );
        let res = self
            .client
            .get(url)
            .send()
            .map_err(|e| e.without_url())
            .context("Failed to send files.list request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("files.list failed: {} - {}", status, txt);
        }
        let list: FilesList = res
            .json()
            .map_err(|e: reqwest::Error| e.without_url())
            .context("Parsing files.list response json")?;
        if list.ok == Some(false) {
            anyhow::bail!(
                "files.list failed: {}",
                list.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(list.files)
    }

    /// Start an authenticated download of a private file URL. The caller
    /// streams the returned response body.
    pub fn download_file(&self, url: &str, token: &str) -> Result<Response> {
        debug!("GET {}", url);
        let res = self
            .client
            .get(url)
            .headers(Self::auth_headers(token)?)
            .send()
            .with_context(|| format!("Failed to download {}", url))?;
        if !res.status().is_success() {
            anyhow::bail!("Download failed: {} - {}", res.status(), url);
        }
        Ok(res)
    }

    /// Ask the server to delete one file. A refusal comes back as
    /// `ok: false`, not as an error.
    pub fn delete_file(&self, file_id: &str, token: &str) -> Result<DeleteResponse> {
        debug!("POST files.delete file={}", file_id);
        let res = self
            .client
            .post(self.endpoint("files.delete"))
            .form(&[("token", token), ("file", file_id)])
            .send()
            .context("Failed to send files.delete request")?;
        let resp: DeleteResponse = res.json().context("Parsing files.delete response json")?;
        Ok(resp)
    }

    /// Resolve a display name to a user id by exact match against the
    /// users list. Returns an empty string when nobody matches.
    pub fn lookup_user_id(&self, user_name: &str, token: &str) -> Result<String> {
        let url = Url::parse_with_params(&self.endpoint("users.list"), &[("token", token)])
            .context("Building users.list url")?;
        debug!("GET users.list");
        let res = self
            .client
            .get(url)
            .send()
            .map_err(|e| e.without_url())
            .context("Failed to send users.list request")?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("users.list failed: {} - {}", status, txt);
        }
        let users: UsersList = res
            .json()
            .map_err(|e: reqwest::Error| e.without_url())
            .context("Parsing users.list response json")?;
        if users.ok == Some(false) {
            anyhow::bail!(
                "users.list failed: {}",
                users.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(find_member_id(&users.members, user_name))
    }
}

fn find_member_id(members: &[Member], user_name: &str) -> String {
    members
        .iter()
        .find(|m| m.name == user_name)
        .map(|m| m.id.clone())
        .unwrap_or_default()
}
