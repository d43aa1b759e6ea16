// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout module — text measurement and the page composer.

pub mod composer;
pub mod text;

pub use composer::{
    CertificateContent, ComposedPage, Composer, ContentStream, LayoutCursor, PageImages,
    format_spanish_datetime,
};
pub use text::{GlyphMetrics, HeuristicMetrics, TextLayout};
