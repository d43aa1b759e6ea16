// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF serializer — header, numbered objects, cross-reference table, trailer.
//
// The layout is fixed so output is byte-for-byte reproducible:
//
//   %PDF-1.4 / binary marker line
//   "{id} 0 obj\n" payload "endobj\n"      (ascending id)
//   xref table with 20-byte entries
//   trailer, startxref, %%EOF

use constancia_core::error::{CertificateError, Result};
use tracing::debug;

use super::object::DocumentObject;

/// Version line followed by a comment of high-bit bytes marking the file as
/// binary for transfer tools.
pub const HEADER: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

/// End-of-file marker closing every document.
pub const EOF_MARKER: &[u8] = b"%%EOF";

/// Serialize `objects` into a complete PDF with `root_id` as the catalog.
///
/// Ids must be exactly `1..=n` without gaps or duplicates, and `root_id` must
/// be one of them. Anything else is an object-graph bug in the caller.
pub fn assemble(objects: &[DocumentObject], root_id: u32) -> Result<Vec<u8>> {
    let mut sorted: Vec<&DocumentObject> = objects.iter().collect();
    sorted.sort_by_key(|object| object.id);

    for (index, object) in sorted.iter().enumerate() {
        let expected = index as u32 + 1;
        if object.id != expected {
            return Err(CertificateError::ObjectGraph(format!(
                "expected object {expected}, found {} (ids must be contiguous from 1)",
                object.id
            )));
        }
    }
    if root_id == 0 || root_id as usize > sorted.len() {
        return Err(CertificateError::ObjectGraph(format!(
            "root object {root_id} does not exist"
        )));
    }

    let payload_bytes: usize = sorted.iter().map(|o| o.payload.len() + 24).sum();
    let mut out = Vec::with_capacity(HEADER.len() + payload_bytes + 20 * (sorted.len() + 1) + 128);
    out.extend_from_slice(HEADER);

    let mut offsets = Vec::with_capacity(sorted.len());
    for object in &sorted {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", object.id).as_bytes());
        out.extend_from_slice(&object.payload);
        out.extend_from_slice(b"endobj\n");
    }

    let xref_offset = out.len();
    let size = sorted.len() + 1;
    out.extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }

    out.extend_from_slice(
        format!("trailer\n<< /Size {size} /Root {root_id} 0 R >>\nstartxref\n{xref_offset}\n")
            .as_bytes(),
    );
    out.extend_from_slice(EOF_MARKER);

    debug!(objects = sorted.len(), bytes = out.len(), xref_offset, "PDF assembled");
    Ok(out)
}
