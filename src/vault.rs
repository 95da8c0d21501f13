use regex::Regex;
use reqwest::{header, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::VaultError;
use crate::settings::Settings;

const JSONLOGIC_CONTENT_TYPE: &str = "application/vnd.olrapi.jsonlogic+json";
const SKIPPED_FOLDERS: &[&str] = &["node_modules"];

/// A template note found in the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
struct ServerStatus {
    #[serde(default)]
    authenticated: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DirectoryListing {
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    result: Value,
}

/// Everything found by one walk of the vault tree.
#[derive(Debug, Default)]
struct VaultTree {
    folders: Vec<String>,
    files: Vec<String>,
}

/// Client for the vault app's Local REST API.
#[derive(Debug, Clone)]
pub struct VaultClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VaultClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, VaultError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, VaultError> {
        Self::new(
            &settings.local_rest_api_url,
            &settings.local_rest_api_key,
            settings.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            request
        } else {
            request.header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> VaultError {
        if err.is_connect() || err.is_timeout() {
            VaultError::Unreachable {
                url: self.base_url.clone(),
                reason: err.to_string(),
            }
        } else {
            VaultError::Http(err)
        }
    }

    fn check_status(response: Response) -> Result<Response, VaultError> {
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(VaultError::Unauthorized),
            status if status.is_success() => Ok(response),
            status => Err(VaultError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            }),
        }
    }

    async fn get(&self, path: &str, accept: &str) -> Result<Response, VaultError> {
        let url = self.url(path);
        debug!(%url, "vault GET");
        let response = self
            .authorize(self.client.get(&url))
            .header(header::ACCEPT, accept)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::check_status(response)
    }

    /// Verify the API is reachable and the key is accepted.
    pub async fn check_connection(&self) -> Result<(), VaultError> {
        let response = self.get("/", "application/json").await?;
        let status: ServerStatus = response.json().await?;
        if status.authenticated == Some(false) {
            return Err(VaultError::NotAuthenticated);
        }
        Ok(())
    }

    async fn list_directory(&self, dir: &str) -> Result<Vec<String>, VaultError> {
        let path = if dir.is_empty() {
            "/vault/".to_string()
        } else {
            format!("/vault/{}/", encode_path(dir))
        };
        let listing: DirectoryListing = self.get(&path, "application/json").await?.json().await?;
        Ok(listing.files)
    }

    /// Walk the vault from the root. Subfolders that fail to list are skipped;
    /// a failing root is an error.
    async fn walk(&self) -> Result<VaultTree, VaultError> {
        let mut tree = VaultTree::default();
        let mut pending = vec![String::new()];

        while let Some(current) = pending.pop() {
            let entries = match self.list_directory(&current).await {
                Ok(entries) => entries,
                Err(e) if current.is_empty() => return Err(e),
                Err(e) => {
                    warn!(folder = %current, error = %e, "skipping unreadable folder");
                    continue;
                }
            };

            // Entries are relative to the listed folder; folders end with '/'
            for entry in entries {
                let full = |name: &str| {
                    if current.is_empty() {
                        name.to_string()
                    } else {
                        format!("{}/{}", current, name)
                    }
                };

                if let Some(folder) = entry.strip_suffix('/') {
                    if folder.starts_with('.') || SKIPPED_FOLDERS.contains(&folder) {
                        continue;
                    }
                    let path = full(folder);
                    tree.folders.push(path.clone());
                    pending.push(path);
                } else {
                    tree.files.push(full(&entry));
                }
            }
        }

        tree.folders.sort();
        tree.folders.dedup();
        tree.files.sort();
        Ok(tree)
    }

    /// All folders in the vault, sorted.
    pub async fn list_folders(&self) -> Result<Vec<String>, VaultError> {
        let tree = self.walk().await?;
        debug!(count = tree.folders.len(), "listed vault folders");
        Ok(tree.folders)
    }

    /// Every tag used in the vault, without the leading `#`, sorted and unique.
    pub async fn list_tags(&self) -> Result<Vec<String>, VaultError> {
        let url = self.url("/search/");
        debug!(%url, "vault tag search");
        let response = self
            .authorize(self.client.post(&url))
            .header(header::CONTENT_TYPE, JSONLOGIC_CONTENT_TYPE)
            .header(header::ACCEPT, "application/json")
            .body(json!({ "var": "tags" }).to_string())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let hits: Vec<SearchHit> = Self::check_status(response)?.json().await?;

        let mut tags = BTreeSet::new();
        for hit in hits {
            let Value::Array(items) = hit.result else {
                continue;
            };
            for item in items {
                if let Some(tag) = item.as_str() {
                    let tag = tag.trim().trim_start_matches('#');
                    if !tag.is_empty() {
                        tags.insert(tag.to_string());
                    }
                }
            }
        }
        Ok(tags.into_iter().collect())
    }

    /// Markdown notes whose file name matches `pattern`.
    pub async fn list_templates(&self, pattern: &str) -> Result<Vec<TemplateRef>, VaultError> {
        let matcher = Regex::new(pattern).map_err(|e| VaultError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let tree = self.walk().await?;
        let templates = tree
            .files
            .into_iter()
            .filter_map(|path| {
                let file_name = path.rsplit('/').next().unwrap_or(&path);
                let name = file_name.strip_suffix(".md")?;
                matcher.is_match(file_name).then(|| TemplateRef {
                    name: name.to_string(),
                    path: path.clone(),
                })
            })
            .collect();
        Ok(templates)
    }

    pub async fn fetch_template_content(&self, path: &str) -> Result<String, VaultError> {
        let response = self
            .get(&format!("/vault/{}", encode_path(path)), "text/markdown")
            .await?;
        Ok(response.text().await?)
    }

    /// Create or replace a note.
    pub async fn put_note(&self, path: &str, content: &str) -> Result<(), VaultError> {
        let url = self.url(&format!("/vault/{}", encode_path(path)));
        debug!(%url, bytes = content.len(), "vault PUT");
        let response = self
            .authorize(self.client.put(&url))
            .header(header::CONTENT_TYPE, "text/markdown")
            .body(content.to_string())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        Self::check_status(response)?;
        Ok(())
    }
}

/// Percent-encode each segment of a vault path, keeping the separators.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
