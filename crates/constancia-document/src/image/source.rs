// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image source reader — fetch raw image bytes from a local path or a remote
// URL.
//
// Readers never fail towards their caller: every IO or transport problem is
// logged here and reported as "unavailable" (`None`). A single attempt is made
// per request; deduplication across callers is the cache's job.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use constancia_core::error::{CertificateError, Result};
use tracing::{debug, error, instrument, warn};

use super::RawImage;
use super::inspect::decode_raw_image;

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageLocation {
    Path(PathBuf),
    Url(String),
}

impl ImageLocation {
    /// Interpret a configured source string. `http://` and `https://` are
    /// remote; `file://` and everything else is a filesystem path.
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        let lower = source.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(source.to_string())
        } else if lower.starts_with("file://") {
            Self::Path(PathBuf::from(&source["file://".len()..]))
        } else {
            Self::Path(PathBuf::from(source))
        }
    }
}

impl std::fmt::Display for ImageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Obtains raw image bytes without decoding them.
pub trait ImageReader: Send + Sync {
    /// Read the bytes at `location`, or `None` if they cannot be obtained.
    fn read(&self, location: &ImageLocation) -> impl Future<Output = Option<Vec<u8>>> + Send;
}

/// Production reader: `tokio::fs` for paths, a blocking `ureq` agent on the
/// blocking pool for URLs.
#[derive(Clone)]
pub struct SourceReader {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl SourceReader {
    /// Create a reader whose remote fetches give up after `timeout` and refuse
    /// bodies larger than `max_bytes`.
    pub fn new(timeout: Duration, max_bytes: u64) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent, max_bytes }
    }

    async fn read_path(&self, path: &std::path::Path) -> Result<Vec<u8>> {
        let data = tokio::fs::read(path).await?;
        if data.len() as u64 > self.max_bytes {
            return Err(CertificateError::ImageUnavailable(format!(
                "{} is {} bytes, limit is {}",
                path.display(),
                data.len(),
                self.max_bytes
            )));
        }
        Ok(data)
    }

    async fn read_url(&self, url: &str) -> Result<Vec<u8>> {
        let agent = self.agent.clone();
        let owned_url = url.to_string();
        let limit = self.max_bytes;

        tokio::task::spawn_blocking(move || fetch_blocking(&agent, &owned_url, limit))
            .await
            .map_err(|e| CertificateError::ImageUnavailable(format!("fetch task failed: {e}")))?
    }
}

impl ImageReader for SourceReader {
    #[instrument(skip(self), fields(location = %location))]
    async fn read(&self, location: &ImageLocation) -> Option<Vec<u8>> {
        let outcome = match location {
            ImageLocation::Path(path) => self.read_path(path).await,
            ImageLocation::Url(url) => self.read_url(url).await,
        };

        match outcome {
            Ok(data) => {
                debug!(bytes = data.len(), "image source read");
                Some(data)
            }
            Err(err) => {
                warn!(%err, "image source unavailable");
                None
            }
        }
    }
}

/// Single blocking GET; non-2xx statuses surface as errors from `ureq`.
fn fetch_blocking(agent: &ureq::Agent, url: &str, limit: u64) -> Result<Vec<u8>> {
    let mut response = agent
        .get(url)
        .call()
        .map_err(|e| CertificateError::ImageUnavailable(format!("GET {url}: {e}")))?;

    response
        .body_mut()
        .with_config()
        .limit(limit)
        .read_to_vec()
        .map_err(|e| CertificateError::ImageUnavailable(format!("reading body of {url}: {e}")))
}

/// Read `source` through `reader` and inspect it into an embeddable image.
///
/// Unreadable or unrecognised images are logged and reported as `None`.
pub async fn load_image<R: ImageReader>(reader: &R, source: &str) -> Option<RawImage> {
    let location = ImageLocation::parse(source);
    let data = reader.read(&location).await?;

    match decode_raw_image(data) {
        Ok(image) => {
            debug!(
                %location,
                width = image.width(),
                height = image.height(),
                "image inspected"
            );
            Some(image)
        }
        Err(err) if err.is_recoverable() => {
            warn!(%location, %err, "image header not recognised, omitting image");
            None
        }
        Err(err) => {
            error!(%location, %err, "image inspection failed, omitting image");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn reader() -> SourceReader {
        SourceReader::new(Duration::from_secs(1), 1024)
    }

    #[test]
    fn parse_distinguishes_urls_and_paths() {
        assert_eq!(
            ImageLocation::parse("https://cdn.example.pe/logo.jpg"),
            ImageLocation::Url("https://cdn.example.pe/logo.jpg".into())
        );
        assert_eq!(
            ImageLocation::parse("HTTP://cdn.example.pe/logo.jpg"),
            ImageLocation::Url("HTTP://cdn.example.pe/logo.jpg".into())
        );
        assert_eq!(
            ImageLocation::parse("file:///srv/logo.jpg"),
            ImageLocation::Path(PathBuf::from("/srv/logo.jpg"))
        );
        assert_eq!(
            ImageLocation::parse(" assets/logo.jpg "),
            ImageLocation::Path(PathBuf::from("assets/logo.jpg"))
        );
    }

    #[tokio::test]
    async fn reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"\xFF\xD8\xFF\xD9").expect("write");

        let location = ImageLocation::Path(file.path().to_path_buf());
        let data = reader().read(&location).await;
        assert_eq!(data.as_deref(), Some(&b"\xFF\xD8\xFF\xD9"[..]));
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let location = ImageLocation::Path(dir.path().join("nope.jpg"));
        assert!(reader().read(&location).await.is_none());
    }

    #[tokio::test]
    async fn oversized_file_is_unavailable() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(&[0u8; 2048]).expect("write");

        let location = ImageLocation::Path(file.path().to_path_buf());
        assert!(reader().read(&location).await.is_none());
    }

    #[tokio::test]
    async fn load_image_rejects_non_image_bytes() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"not an image").expect("write");

        let source = file.path().display().to_string();
        assert!(load_image(&reader(), &source).await.is_none());
    }
}
