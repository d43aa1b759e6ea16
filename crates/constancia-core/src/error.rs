// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Constancia.

use thiserror::Error;

/// Top-level error type for all certificate operations.
///
/// Image-level variants are recovered close to where they occur (the image is
/// simply left out of the document). Object-graph and font variants are fatal
/// and surface to the caller of the generator.
#[derive(Debug, Error)]
pub enum CertificateError {
    // -- Image ingestion (recoverable) --
    #[error("image unavailable: {0}")]
    ImageUnavailable(String),

    #[error("unrecognized image: {0}")]
    UnrecognizedImage(String),

    // -- Document assembly (fatal) --
    #[error("object graph invariant violated: {0}")]
    ObjectGraph(String),

    #[error("font resource missing: {0}")]
    MissingFont(String),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CertificateError {
    /// Whether a build can continue after this error by dropping the image
    /// that caused it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ImageUnavailable(_) | Self::UnrecognizedImage(_) | Self::Io(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CertificateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_errors_are_recoverable() {
        assert!(CertificateError::ImageUnavailable("HTTP 404".into()).is_recoverable());
        assert!(CertificateError::UnrecognizedImage("gif".into()).is_recoverable());
    }

    #[test]
    fn assembly_errors_are_fatal() {
        assert!(!CertificateError::ObjectGraph("id 7 never reserved".into()).is_recoverable());
        assert!(!CertificateError::MissingFont("Comic Sans".into()).is_recoverable());
    }

    #[test]
    fn display_includes_detail() {
        let err = CertificateError::MissingFont("Papyrus".into());
        assert_eq!(err.to_string(), "font resource missing: Papyrus");
    }
}
