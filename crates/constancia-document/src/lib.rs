// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Constancia Document — certificate PDF generation.
//
// Hand-written PDF 1.4 output: a per-build object graph, a cursor-driven
// single-page layout, and images embedded as their original compressed bytes.
// No PDF library is involved.

pub mod certificate;
pub mod image;
pub mod layout;
pub mod pdf;

pub use certificate::{CertificateGenerator, qr_request_url};
pub use image::{ImageCache, ImageLocation, ImageReader, RawImage, SourceReader};
pub use layout::{Composer, GlyphMetrics, HeuristicMetrics, TextLayout};
