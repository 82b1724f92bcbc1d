use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use std::fs::File;
use std::path::Path;

use crate::http::HttpClient;

/// Retrieves remote sources onto the local filesystem.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` into the file at `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// [`Downloader`] backed by reqwest.
pub struct HttpDownloader {
    http_client: HttpClient,
}

impl HttpDownloader {
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    #[tracing::instrument(skip(self, dest))]
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        info!("Downloading {}...", url);
        let bytes = self
            .http_client
            .download_file(url, || {
                File::create(dest).with_context(|| format!("Failed to create {:?}", dest))
            })
            .await?;
        info!("Downloaded {}kb", bytes / 1024);
        Ok(bytes)
    }
}
