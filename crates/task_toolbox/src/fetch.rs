use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    UnexpectedStatus { url: String, status: u16 },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a completed download landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub url: String,
    pub path: PathBuf,
}

/// Blocking HTTP downloader that writes response bodies to disk.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    temp_dir: PathBuf,
}

impl Fetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Directory used for synthesized destinations.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Download `url` into `destination`, or into a fresh file under the temp
    /// directory when no destination is given.
    ///
    /// Only a `200 OK` response is written; every other status is returned as
    /// [`FetchError::UnexpectedStatus`] and nothing is created on disk.
    pub fn download(&self, url: &str, destination: Option<&Path>) -> Result<Download, FetchError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|source| http_error(url, source))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(url, status = status.as_u16(), "download skipped");
            return Err(FetchError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let path = match destination {
            Some(path) => path.to_path_buf(),
            None => self.temp_dir.join(temporary_file_name(url)),
        };

        let mut file = File::create(&path).map_err(|source| write_error(&path, source))?;
        let bytes = response
            .copy_to(&mut file)
            .map_err(|source| http_error(url, source))?;
        file.flush().map_err(|source| write_error(&path, source))?;
        drop(file);

        debug!(url, path = %path.display(), bytes, "download complete");
        Ok(Download {
            url: url.to_string(),
            path,
        })
    }

    /// Like [`Fetcher::download`], calling `done(url, path)` once the file is
    /// fully written. `done` is not called when the download fails.
    pub fn download_then<F>(
        &self,
        url: &str,
        destination: Option<&Path>,
        done: F,
    ) -> Result<Download, FetchError>
    where
        F: FnOnce(&str, &Path),
    {
        let download = self.download(url, destination)?;
        done(&download.url, &download.path);
        Ok(download)
    }
}

/// Collision-resistant file name: a hash of a random id and the current time,
/// keeping the URL's file extension when it has one.
pub fn temporary_file_name(url: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().to_string());
    hasher.update(millis.to_string());
    let stem = format!("{:x}", hasher.finalize());

    match url_extension(url) {
        Some(extension) => format!("{stem}.{extension}"),
        None => stem,
    }
}

/// Text after the last `.` of the last path segment, ignoring any query
/// string or fragment.
pub fn url_extension(url: &str) -> Option<&str> {
    let without_fragment = url.split_once('#').map_or(url, |(head, _)| head);
    let path = without_fragment
        .split_once('?')
        .map_or(without_fragment, |(head, _)| head);
    let segment = path.rsplit('/').next()?;
    let (_, extension) = segment.rsplit_once('.')?;
    (!extension.is_empty()).then_some(extension)
}

fn http_error(url: &str, source: reqwest::Error) -> FetchError {
    FetchError::Http {
        url: url.to_string(),
        source,
    }
}

fn write_error(path: &Path, source: std::io::Error) -> FetchError {
    FetchError::Write {
        path: path.to_path_buf(),
        source,
    }
}
