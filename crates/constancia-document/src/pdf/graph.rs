// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-tree object payloads: font, graphics state, page, pages, and catalog.

use constancia_core::error::{CertificateError, Result};

/// Standard 14 fonts that can render WinAnsi-encoded Latin text without
/// embedding a font program.
pub const WIN_ANSI_BASE_FONTS: [&str; 12] = [
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
    "Times-Roman",
    "Times-Bold",
    "Times-Italic",
    "Times-BoldItalic",
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
];

/// Check that `base_font` names a font every viewer ships.
pub fn validate_base_font(base_font: &str) -> Result<()> {
    if WIN_ANSI_BASE_FONTS.contains(&base_font) {
        Ok(())
    } else {
        Err(CertificateError::MissingFont(format!(
            "{base_font} is not a standard WinAnsi text font"
        )))
    }
}

/// Type 1 font dictionary declaring WinAnsiEncoding.
pub fn font_object(base_font: &str) -> Result<Vec<u8>> {
    validate_base_font(base_font)?;
    Ok(format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{base_font} /Encoding /WinAnsiEncoding >>\n"
    )
    .into_bytes())
}

/// Graphics state applying a constant fill and stroke opacity.
pub fn ext_gstate_object(opacity: f64) -> Vec<u8> {
    format!("<< /Type /ExtGState /ca {opacity:.2} /CA {opacity:.2} >>\n").into_bytes()
}

/// Named resources a page's content stream refers to.
#[derive(Debug, Clone, Default)]
pub struct PageResources {
    fonts: Vec<(String, u32)>,
    xobjects: Vec<(String, u32)>,
    ext_gstates: Vec<(String, u32)>,
}

impl PageResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_font(&mut self, name: &str, id: u32) -> &mut Self {
        self.fonts.push((name.to_string(), id));
        self
    }

    pub fn add_xobject(&mut self, name: &str, id: u32) -> &mut Self {
        self.xobjects.push((name.to_string(), id));
        self
    }

    pub fn add_ext_gstate(&mut self, name: &str, id: u32) -> &mut Self {
        self.ext_gstates.push((name.to_string(), id));
        self
    }

    /// Whether `name` is registered as an image XObject.
    pub fn has_xobject(&self, name: &str) -> bool {
        self.xobjects.iter().any(|(n, _)| n == name)
    }

    /// Render as an inline resource dictionary.
    pub fn to_dictionary(&self) -> String {
        let mut parts = Vec::new();
        for (key, entries) in [
            ("Font", &self.fonts),
            ("XObject", &self.xobjects),
            ("ExtGState", &self.ext_gstates),
        ] {
            if entries.is_empty() {
                continue;
            }
            let refs: Vec<String> = entries
                .iter()
                .map(|(name, id)| format!("/{name} {id} 0 R"))
                .collect();
            parts.push(format!("/{key} << {} >>", refs.join(" ")));
        }
        format!("<< {} >>", parts.join(" "))
    }
}

/// Leaf page object.
pub fn page_object(
    parent_id: u32,
    resources: &PageResources,
    media_box: (f64, f64),
    contents_id: u32,
) -> Vec<u8> {
    format!(
        "<< /Type /Page /Parent {parent_id} 0 R /Resources {} /MediaBox [0 0 {:.2} {:.2}] /Contents {contents_id} 0 R >>\n",
        resources.to_dictionary(),
        media_box.0,
        media_box.1,
    )
    .into_bytes()
}

/// Page-tree root listing `kids`.
pub fn pages_object(kids: &[u32]) -> Vec<u8> {
    let refs: Vec<String> = kids.iter().map(|id| format!("{id} 0 R")).collect();
    format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>\n",
        refs.join(" "),
        kids.len()
    )
    .into_bytes()
}

/// Document catalog pointing at the page tree.
pub fn catalog_object(pages_id: u32) -> Vec<u8> {
    format!("<< /Type /Catalog /Pages {pages_id} 0 R >>\n").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_font_declares_win_ansi() {
        let font = font_object("Helvetica").expect("standard font");
        assert_eq!(
            font,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>\n"
        );
    }

    #[test]
    fn unknown_font_is_missing() {
        assert!(matches!(
            font_object("Comic-Sans"),
            Err(CertificateError::MissingFont(_))
        ));
        assert!(font_object("ZapfDingbats").is_err());
    }

    #[test]
    fn resources_skip_empty_categories() {
        let mut resources = PageResources::new();
        resources.add_font("F1", 4);
        assert_eq!(resources.to_dictionary(), "<< /Font << /F1 4 0 R >> >>");

        resources.add_xobject("ImLogo", 5).add_xobject("ImQR", 6);
        resources.add_ext_gstate("GSWatermark", 7);
        assert_eq!(
            resources.to_dictionary(),
            "<< /Font << /F1 4 0 R >> /XObject << /ImLogo 5 0 R /ImQR 6 0 R >> /ExtGState << /GSWatermark 7 0 R >> >>"
        );
        assert!(resources.has_xobject("ImQR"));
        assert!(!resources.has_xobject("ImWatermark"));
    }

    #[test]
    fn page_tree_payloads() {
        let mut resources = PageResources::new();
        resources.add_font("F1", 4);
        let page =
            String::from_utf8(page_object(2, &resources, (595.28, 841.89), 5)).expect("ascii");
        assert_eq!(
            page,
            "<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 4 0 R >> >> /MediaBox [0 0 595.28 841.89] /Contents 5 0 R >>\n"
        );
        assert_eq!(pages_object(&[3]), b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>\n");
        assert_eq!(catalog_object(2), b"<< /Type /Catalog /Pages 2 0 R >>\n");
    }

    #[test]
    fn ext_gstate_formats_opacity() {
        assert_eq!(
            ext_gstate_object(0.08),
            b"<< /Type /ExtGState /ca 0.08 /CA 0.08 >>\n"
        );
    }
}
