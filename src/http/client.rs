//! HTTP client used to fetch library sources.
//!
//! Fetches are single attempts: a failure is reported straight back to the
//! caller as a [`JimError::Fetch`].

use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use std::io::Write;

use super::status::{describe_status, describe_transport_error};
use crate::error::JimError;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Streams the body at `url` into the writer produced by `create_writer`.
    ///
    /// The writer is only created once the server has answered with a success
    /// status, so a failed request leaves nothing behind.
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, url: &str, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: FnOnce() -> Result<W>,
    {
        debug!("GET {}", url);

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| JimError::fetch(url, describe_transport_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(JimError::fetch(url, describe_status(status)).into());
        }

        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| JimError::fetch(url, describe_transport_error(&e)))?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write downloaded chunk")?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().context("Failed to flush downloaded file")?;

        debug!("Downloaded {} bytes from {}", downloaded_bytes, url);
        Ok(downloaded_bytes)
    }
}
