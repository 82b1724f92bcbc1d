//! Construction of the network and archive services the installer needs,
//! kept apart from [`Config`](super::config::Config).

use anyhow::Result;
use reqwest::Client;

use crate::{
    archive::ArchiveExtractorImpl, download::HttpDownloader, http::HttpClient, install::Installer,
    runtime::Runtime,
};

use super::config::Config;

const USER_AGENT: &str = "jim-cli";

pub fn build_http_client() -> Result<HttpClient> {
    let client = Client::builder().user_agent(USER_AGENT).build()?;
    Ok(HttpClient::new(client))
}

pub fn build_installer<R: Runtime>(
    runtime: R,
    config: &Config,
) -> Result<Installer<R, HttpDownloader, ArchiveExtractorImpl>> {
    let downloader = HttpDownloader::new(build_http_client()?);
    Ok(Installer::new(
        runtime,
        downloader,
        ArchiveExtractorImpl::new(),
        config.jimhome.clone(),
    ))
}
