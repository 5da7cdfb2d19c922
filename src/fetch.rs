//! Loading page sources for the static HTML backend.
//!
//! `http://` and `https://` sources are fetched with a blocking HTTP client;
//! `file://` URLs and plain paths are read from disk. The blocking client must
//! not be driven from inside an async task; wrap calls in
//! `tokio::task::spawn_blocking` there.

use crate::{Error, Result};
use reqwest::blocking::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// User agent sent with HTTP requests
pub const DEFAULT_USER_AGENT: &str = concat!("websketch-capture/", env!("CARGO_PKG_VERSION"));

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Markup plus the URL it was finally loaded from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPage {
    pub url: String,
    pub html: String,
}

/// Load `source`, which may be an HTTP(S) URL, a `file://` URL or a path.
pub fn load_source(source: &str, user_agent: &str, timeout_ms: u64) -> Result<LoadedPage> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(Error::LoadError("empty source".into()));
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return fetch_url(trimmed, user_agent, timeout_ms);
    }

    if trimmed.starts_with("file://") {
        let url = Url::parse(trimmed)
            .map_err(|e| Error::LoadError(format!("Invalid file URL {}: {}", trimmed, e)))?;
        let path = url
            .to_file_path()
            .map_err(|_| Error::LoadError(format!("Not a local file URL: {}", trimmed)))?;
        return read_file(&path);
    }

    read_file(Path::new(trimmed))
}

fn fetch_url(url: &str, user_agent: &str, timeout_ms: u64) -> Result<LoadedPage> {
    let client = Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| Error::LoadError(format!("Failed to build HTTP client: {}", e)))?;

    let resp = client
        .get(url)
        .header("User-Agent", user_agent)
        .send()
        .map_err(|e| Error::LoadError(format!("Failed to fetch {}: {}", url, e)))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::LoadError(format!("{} returned HTTP {}", url, status)));
    }

    // redirects may have moved us
    let final_url = resp.url().to_string();
    let html = resp
        .text()
        .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))?;

    log::debug!("Fetched {} ({} bytes)", final_url, html.len());
    Ok(LoadedPage {
        url: final_url,
        html,
    })
}

fn read_file(path: &Path) -> Result<LoadedPage> {
    let html = std::fs::read_to_string(path)
        .map_err(|e| Error::LoadError(format!("Failed to read {}: {}", path.display(), e)))?;

    let absolute: PathBuf = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let url = Url::from_file_path(&absolute)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| absolute.display().to_string());

    log::debug!("Read {} ({} bytes)", url, html.len());
    Ok(LoadedPage { url, html })
}
