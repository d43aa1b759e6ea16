// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certificate engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CertificateError, Result};

/// Environment variable holding the public base URL for case lookups.
pub const ENV_FEEDBACK_BASE_URL: &str = "PUBLIC_FEEDBACK_BASE_URL";
/// Environment variable holding the header logo source (URL or path).
pub const ENV_SITE_LOGO_URL: &str = "PUBLIC_SITE_LOGO_URL";
/// Environment variable holding the watermark logo source (URL or path).
pub const ENV_WATERMARK_LOGO_URL: &str = "PUBLIC_WATERMARK_LOGO_URL";
/// Environment variable overriding the QR rendering endpoint.
pub const ENV_QR_ENDPOINT: &str = "CERTIFICATE_QR_ENDPOINT";

/// Settings for certificate generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// Base URL under which cases are publicly looked up.
    pub public_feedback_base_url: String,
    /// Header logo, either an `http(s)://` URL or a filesystem path.
    pub logo_source: Option<String>,
    /// Full-page watermark image, same forms as `logo_source`.
    pub watermark_source: Option<String>,
    /// Third-party endpoint that renders a QR code for a given text.
    pub qr_endpoint: String,
    /// Base font for all text. Must be one of the PDF standard 14 fonts.
    pub font: String,
    /// Paper size of the single certificate page.
    pub paper_size: crate::PaperSize,
    /// Maximum number of distinct image sources kept in the image cache.
    pub cache_capacity: usize,
    /// Transport timeout for remote image fetches, in seconds.
    pub fetch_timeout_secs: u64,
    /// Largest image body accepted from a remote source, in bytes.
    pub max_image_bytes: u64,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            public_feedback_base_url: "https://tusistema.com/feedback".into(),
            logo_source: None,
            watermark_source: None,
            qr_endpoint: "https://quickchart.io/qr".into(),
            font: "Helvetica".into(),
            paper_size: crate::PaperSize::A4,
            cache_capacity: 16,
            fetch_timeout_secs: 10,
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

impl CertificateConfig {
    /// Build a configuration from process environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Blank values are
    /// treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();
        if let Some(base_url) = get(ENV_FEEDBACK_BASE_URL) {
            config.public_feedback_base_url = base_url;
        }
        config.logo_source = get(ENV_SITE_LOGO_URL);
        config.watermark_source = get(ENV_WATERMARK_LOGO_URL);
        if let Some(endpoint) = get(ENV_QR_ENDPOINT) {
            config.qr_endpoint = endpoint;
        }
        config
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the generator cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.public_feedback_base_url.trim().is_empty() {
            return Err(CertificateError::Config(
                "public_feedback_base_url must not be empty".into(),
            ));
        }
        if self.qr_endpoint.trim().is_empty() {
            return Err(CertificateError::Config("qr_endpoint must not be empty".into()));
        }
        if self.cache_capacity == 0 {
            return Err(CertificateError::Config(
                "cache_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = CertificateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.font, "Helvetica");
        assert!(config.logo_source.is_none());
    }

    #[test]
    fn lookup_overrides_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_FEEDBACK_BASE_URL, "https://quejas.example.gob.pe/caso/"),
            (ENV_SITE_LOGO_URL, "/srv/assets/logo.jpg"),
            (ENV_WATERMARK_LOGO_URL, "   "),
        ]);
        let config = CertificateConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(
            config.public_feedback_base_url,
            "https://quejas.example.gob.pe/caso/"
        );
        assert_eq!(config.logo_source.as_deref(), Some("/srv/assets/logo.jpg"));
        assert!(config.watermark_source.is_none(), "blank value counts as unset");
        assert_eq!(config.qr_endpoint, "https://quickchart.io/qr");
    }

    #[test]
    fn zero_cache_capacity_is_rejected() {
        let config = CertificateConfig {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CertificateError::Config(_))));
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config: CertificateConfig =
            serde_json::from_str(r#"{ "logo_source": "https://cdn.example.pe/logo.jpg" }"#)
                .expect("parse config");
        assert_eq!(config.cache_capacity, 16);
        assert_eq!(
            config.logo_source.as_deref(),
            Some("https://cdn.example.pe/logo.jpg")
        );
    }
}
