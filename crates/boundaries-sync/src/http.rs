//! HTTP access to upstream datasets, spreadsheets and the Represent API.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use futures::StreamExt;
use reqwest::header::{CONTENT_DISPOSITION, LAST_MODIFIED};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::SyncError;
use crate::source::RemoteUrl;

/// Response metadata from a `HEAD` request, after redirects.
#[derive(Debug, Clone)]
pub struct HeadInfo {
    pub status: u16,
    pub last_modified: Option<NaiveDate>,
    pub content_disposition: Option<String>,
}

/// HTTP client shared by every task in a run.
#[derive(Clone, Default)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn request(&self, method: Method, remote: &RemoteUrl) -> RequestBuilder {
        let builder = self.client.request(method, remote.url.clone());
        match &remote.username {
            Some(user) => builder.basic_auth(user, remote.password.as_deref()),
            None => builder,
        }
    }

    /// Issue a `HEAD` request. Non-success statuses are returned, not raised.
    pub async fn head(&self, remote: &RemoteUrl) -> Result<HeadInfo, SyncError> {
        debug!(url = %remote.url, "HEAD");
        let resp = self.request(Method::HEAD, remote).send().await?;
        let headers = resp.headers();
        let header = |name: reqwest::header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let last_modified = header(LAST_MODIFIED)
            .map(|raw| parse_http_date(&raw))
            .transpose()?;
        Ok(HeadInfo {
            status: resp.status().as_u16(),
            last_modified,
            content_disposition: header(CONTENT_DISPOSITION),
        })
    }

    /// Stream the resource body into `dest`, returning the number of bytes written.
    pub async fn download(&self, remote: &RemoteUrl, dest: &Path) -> Result<u64, SyncError> {
        info!(url = %remote.url, dest = %dest.display(), "downloading");
        let resp = self.request(Method::GET, remote).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Server {
                status: status.as_u16(),
                url: remote.url.to_string(),
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        info!(bytes = written, "download complete");
        Ok(written)
    }

    /// Fetch a URL as text, failing on non-success statuses.
    pub async fn get_text(&self, url: &str) -> Result<String, SyncError> {
        let resp = self.get(url).await?;
        Ok(resp.text().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SyncError> {
        let resp = self.get(url).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, SyncError> {
        debug!(url, "GET");
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Server {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }
}

/// Parse an HTTP date such as `Tue, 26 Nov 2013 10:00:00 GMT` to its UTC day.
pub fn parse_http_date(raw: &str) -> Result<NaiveDate, SyncError> {
    DateTime::parse_from_rfc2822(raw.trim())
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| SyncError::Timestamp(raw.to_string()))
}
