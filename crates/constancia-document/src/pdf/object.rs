// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Object allocation — per-build id reservation and object payload builders.
//
// Object ids appear as literal text inside other objects' payloads and there
// is no patching pass, so every id must be reserved before any payload that
// mentions it is produced.

use std::collections::BTreeMap;

use constancia_core::error::{CertificateError, Result};

use crate::image::{ImageEncoding, RawImage};

use super::writer;

/// One self-contained unit of the output graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentObject {
    pub id: u32,
    pub payload: Vec<u8>,
}

/// State for a single document build: the id counter and the objects
/// accumulated so far.
///
/// Create one per certificate; it is never shared between builds.
#[derive(Debug)]
pub struct BuildContext {
    next_id: u32,
    objects: BTreeMap<u32, Vec<u8>>,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildContext {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            objects: BTreeMap::new(),
        }
    }

    /// Return the next free object id and advance the counter.
    pub fn reserve_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn reserved_count(&self) -> u32 {
        self.next_id - 1
    }

    /// Store the payload for a previously reserved id.
    pub fn insert(&mut self, id: u32, payload: Vec<u8>) -> Result<()> {
        if id == 0 || id >= self.next_id {
            return Err(CertificateError::ObjectGraph(format!(
                "object {id} was never reserved"
            )));
        }
        if self.objects.contains_key(&id) {
            return Err(CertificateError::ObjectGraph(format!(
                "object {id} written twice"
            )));
        }
        self.objects.insert(id, payload);
        Ok(())
    }

    /// Objects in ascending id order.
    pub fn into_objects(self) -> Vec<DocumentObject> {
        self.objects
            .into_iter()
            .map(|(id, payload)| DocumentObject { id, payload })
            .collect()
    }

    /// Serialize everything collected so far with `root_id` as the catalog.
    pub fn finish(self, root_id: u32) -> Result<Vec<u8>> {
        writer::assemble(&self.into_objects(), root_id)
    }
}

/// Wrap `dictionary_entries` and `data` into a stream object payload whose
/// `/Length` is the exact byte count of `data`.
fn stream(dictionary_entries: &str, data: &[u8]) -> Vec<u8> {
    let header = if dictionary_entries.is_empty() {
        format!("<< /Length {} >>\nstream\n", data.len())
    } else {
        format!(
            "<< {} /Length {} >>\nstream\n",
            dictionary_entries,
            data.len()
        )
    };

    let mut out = Vec::with_capacity(header.len() + data.len() + 11);
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(b"\nendstream\n");
    out
}

/// Payload for a plain content stream. `content` must already be in its
/// final encoding.
pub fn wrap_stream(content: &[u8]) -> Vec<u8> {
    stream("", content)
}

/// Payload for an image XObject embedding the encoded bytes unchanged.
pub fn image_object(image: &RawImage) -> Vec<u8> {
    let encoding = image.encoding();
    let mut entries = format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /{} /BitsPerComponent {} /Filter /{}",
        image.width(),
        image.height(),
        encoding.color_space(),
        ImageEncoding::BITS_PER_COMPONENT,
        encoding.filter(),
    );
    if let ImageEncoding::Png { colors } = encoding {
        entries.push_str(&format!(
            " /DecodeParms << /Predictor 15 /Colors {} /BitsPerComponent {} /Columns {} >>",
            colors,
            ImageEncoding::BITS_PER_COMPONENT,
            image.width()
        ));
    }
    stream(&entries, image.data())
}
