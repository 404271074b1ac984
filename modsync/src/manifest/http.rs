//! HTTP/JSON manifest source.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use super::error::{ManifestError, ManifestResult};
use super::types::{RemoteFileDescriptor, VersionDescriptor};
use super::ManifestSource;
use crate::BoxFuture;

/// Manifest served as two JSON documents below a base URL.
///
/// - `GET {base}/versions` → `[{"id", "directory", "name"?}]`
/// - `GET {base}/files` → `[{"id", "path", "size", "modified"}]`
#[derive(Debug, Clone)]
pub struct HttpManifestSource {
    client: Client,
    base_url: String,
}

impl HttpManifestSource {
    /// Create a manifest source for `base_url` with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a manifest source sharing an existing client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: String) -> ManifestResult<T> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ManifestError::Unavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManifestError::Unavailable {
                url,
                reason: format!("GET request failed with status {}", status),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ManifestError::Unavailable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        serde_json::from_slice(&body).map_err(|e| ManifestError::Parse {
            url,
            reason: e.to_string(),
        })
    }
}

impl ManifestSource for HttpManifestSource {
    fn host(&self) -> String {
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| self.base_url.clone())
    }

    fn list_versions(&self) -> BoxFuture<'_, ManifestResult<Vec<VersionDescriptor>>> {
        Box::pin(self.fetch_json(self.endpoint("versions")))
    }

    fn list_files(&self) -> BoxFuture<'_, ManifestResult<Vec<RemoteFileDescriptor>>> {
        Box::pin(self.fetch_json(self.endpoint("files")))
    }
}
