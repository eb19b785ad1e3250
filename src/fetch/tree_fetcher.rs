use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info};

use crate::core::{FileEntry, PackError, Result};

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Unknown,
}

/// One item of a contents-API directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Listing URL; only needed for directories.
    #[serde(default)]
    pub url: Option<String>,
    /// Raw content URL; only needed for files.
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Walks a repository through the contents API, one request at a time.
///
/// Headers, including the optional API token, are fixed at construction.
pub struct TreeFetcher {
    client: Client,
    max_depth: usize,
}

impl TreeFetcher {
    pub fn new(token: Option<&str>, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("token {token}")).map_err(|_| {
                PackError::Internal("API token contains characters not allowed in a header".into())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns every file below `api_url` in depth-first discovery order.
    ///
    /// The first failing request aborts the walk; nothing fetched so far is returned.
    pub async fn fetch(&self, api_url: &str) -> Result<Vec<FileEntry>> {
        let root = self.list_directory(api_url, api_url).await?;
        let mut stack = vec![root.into_iter()];
        let mut files = Vec::new();

        while let Some(listing) = stack.last_mut() {
            let Some(entry) = listing.next() else {
                stack.pop();
                continue;
            };

            match entry.entry_type {
                EntryType::File => {
                    let content = self.download(&entry).await?;
                    files.push(FileEntry::new(entry.path, content));
                }
                EntryType::Dir => {
                    if stack.len() > self.max_depth {
                        return Err(PackError::TraversalTooDeep {
                            path: entry.path,
                            limit: self.max_depth,
                        });
                    }
                    let url = entry.url.as_deref().ok_or_else(|| {
                        PackError::Protocol(format!("directory '{}' has no listing URL", entry.path))
                    })?;
                    let children = self.list_directory(url, &entry.path).await?;
                    stack.push(children.into_iter());
                }
                other => debug!(path = %entry.path, kind = ?other, "skipping entry"),
            }
        }

        info!(files = files.len(), "repository traversal complete");
        Ok(files)
    }

    async fn list_directory(&self, url: &str, resource: &str) -> Result<Vec<ContentEntry>> {
        debug!(%url, "listing directory");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(upstream_error(response, resource).await);
        }

        let body = response.text().await?;
        let value: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            PackError::Protocol(format!("listing for '{resource}' is not valid JSON: {e}"))
        })?;
        if !value.is_array() {
            return Err(PackError::Protocol(format!(
                "expected a list of items for '{resource}'"
            )));
        }

        serde_json::from_value(value).map_err(|e| {
            PackError::Protocol(format!("malformed listing item for '{resource}': {e}"))
        })
    }

    async fn download(&self, entry: &ContentEntry) -> Result<String> {
        let url = entry.download_url.as_deref().ok_or_else(|| {
            PackError::Protocol(format!("file '{}' has no download URL", entry.path))
        })?;

        debug!(path = %entry.path, "downloading file");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(upstream_error(response, &entry.path).await);
        }
        Ok(response.text().await?)
    }
}

async fn upstream_error(response: Response, resource: &str) -> PackError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    PackError::Upstream {
        status: status.as_u16(),
        resource: resource.to_string(),
        message,
    }
}
