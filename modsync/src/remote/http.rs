//! HTTP storage backend streaming file bodies.

use std::time::Duration;

use futures::StreamExt;
use reqwest::{Client, Url};

use super::error::{RemoteError, RemoteResult};
use super::{ByteStream, RemoteStorage};
use crate::manifest::RemoteFileDescriptor;
use crate::BoxFuture;

/// Serves files from `GET {base}/{path}`.
///
/// The client has no overall request timeout: a stalled body only stalls
/// the transfer that owns it. `connect_timeout` bounds connection setup.
#[derive(Debug, Clone)]
pub struct HttpStorage {
    client: Client,
    base_url: String,
}

impl HttpStorage {
    /// Create a storage backend for `base_url`.
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a storage backend sharing an existing client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL a descriptor is served from. Each path component is
    /// percent-encoded, so `#`, `?` and spaces stay part of the path.
    pub fn file_url(&self, file: &RemoteFileDescriptor) -> RemoteResult<Url> {
        let invalid = |reason: String| RemoteError::Open {
            path: file.path.clone(),
            reason,
        };

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("base URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(file.path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }
}

impl RemoteStorage for HttpStorage {
    fn open_stream<'a>(
        &'a self,
        file: &'a RemoteFileDescriptor,
    ) -> BoxFuture<'a, RemoteResult<ByteStream>> {
        Box::pin(async move {
            let url = self.file_url(file)?;
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| RemoteError::Open {
                    path: file.path.clone(),
                    reason: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(RemoteError::Open {
                    path: file.path.clone(),
                    reason: format!("GET request failed with status {}", status),
                });
            }

            let path = file.path.clone();
            let stream = response.bytes_stream().map(move |chunk| {
                chunk.map_err(|e| RemoteError::Stream {
                    path: path.clone(),
                    reason: e.to_string(),
                })
            });
            Ok(Box::pin(stream) as ByteStream)
        })
    }
}
