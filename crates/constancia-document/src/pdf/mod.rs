// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — object allocation, page-tree payloads, text encoding, and the
// byte-level serializer.

pub mod encoding;
pub mod graph;
pub mod object;
pub mod writer;

pub use graph::PageResources;
pub use object::{BuildContext, DocumentObject, image_object, wrap_stream};
pub use writer::assemble;
