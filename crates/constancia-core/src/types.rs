// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Constancia certificate engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one certificate build, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildId(pub Uuid);

impl BuildId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BuildId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of citizen feedback a case was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Complaint,
    Suggestion,
    Compliment,
}

impl FeedbackKind {
    /// Human-readable label printed on the certificate.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Complaint => "Queja",
            Self::Suggestion => "Sugerencia",
            Self::Compliment => "Felicitación",
        }
    }
}

/// Standard paper sizes supported by the page composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
}

impl PaperSize {
    /// Dimensions in PDF points (width, height).
    pub fn dimensions_pt(&self) -> (f64, f64) {
        match self {
            Self::A4 => (595.28, 841.89),
            Self::Letter => (612.0, 792.0),
        }
    }
}

/// The feedback case a certificate is issued for.
///
/// This is consumed read-only; the engine never persists or mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub description: String,
    pub kind: FeedbackKind,
    /// When the case was registered, if the upstream record carries it.
    #[serde(default)]
    pub registered_at: Option<DateTime<Utc>>,
}

impl CaseRecord {
    /// Citizen's full name as printed on the certificate.
    pub fn citizen_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// Public lookup URL for this case under `base_url`.
    pub fn case_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.case_number)
    }
}
