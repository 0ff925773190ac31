//! Resolve a track's audio location into bytes.
//!
//! `http`/`https` go through a blocking `ureq` agent; `file://` URLs and plain
//! paths are read from disk. There are no retries: a failed fetch is a failed
//! start, and the caller decides whether to try again.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::FetchSettings;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("audio resource is larger than {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("unsupported url scheme in {0}")]
    UnsupportedScheme(String),
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Location {
    Remote(String),
    Local(PathBuf),
}

/// Decide where `url` points.
pub(crate) fn classify(url: &str) -> Result<Location, FetchError> {
    let url = url.trim();
    if let Some(path) = url.strip_prefix("file://") {
        return Ok(Location::Local(PathBuf::from(path)));
    }
    match url.split_once("://") {
        Some((scheme, _)) => {
            let scheme = scheme.to_ascii_lowercase();
            if scheme == "http" || scheme == "https" {
                Ok(Location::Remote(url.to_string()))
            } else {
                Err(FetchError::UnsupportedScheme(url.to_string()))
            }
        }
        None => Ok(Location::Local(PathBuf::from(url))),
    }
}

pub struct Fetcher {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl Fetcher {
    pub fn new(settings: &FetchSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(settings.connect_timeout_secs))
            .timeout_read(Duration::from_secs(settings.read_timeout_secs))
            .user_agent(&settings.user_agent)
            .redirects(settings.redirects)
            .build();
        Self {
            agent,
            max_bytes: settings.max_bytes,
        }
    }

    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match classify(url)? {
            Location::Remote(url) => self.fetch_remote(&url),
            Location::Local(path) => self.fetch_local(&path),
        }
    }

    fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(status, _) => FetchError::Status {
                url: url.to_string(),
                status,
            },
            ureq::Error::Transport(t) => FetchError::Network {
                url: url.to_string(),
                reason: t.to_string(),
            },
        })?;

        let mut body = Vec::new();
        response
            .into_reader()
            .take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        self.check_size(body.len() as u64)?;
        log::debug!("fetch: {} bytes from {url}", body.len());
        Ok(body)
    }

    fn fetch_local(&self, path: &Path) -> Result<Vec<u8>, FetchError> {
        let io_err = |source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        };
        let len = std::fs::metadata(path).map_err(io_err)?.len();
        self.check_size(len)?;
        std::fs::read(path).map_err(io_err)
    }

    fn check_size(&self, len: u64) -> Result<(), FetchError> {
        if len > self.max_bytes {
            return Err(FetchError::TooLarge {
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}
