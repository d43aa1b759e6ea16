// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content stream composer — lays out the certificate page top to bottom.
//
// Layout is a single pass driven by a vertical cursor that only ever moves
// down. Every drawing step takes the current cursor and returns the next one,
// so each element lands strictly below the previous. The footer block (QR,
// divider, case URL, disclaimer) sits at fixed positions in a bottom band the
// body text is not allowed to enter.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use constancia_core::{CaseRecord, PaperSize};
use tracing::{debug, warn};

use crate::image::RawImage;
use crate::pdf::encoding::literal_string;

use super::text::{GlyphMetrics, HeuristicMetrics, TextLayout};

/// Resource name of the page font.
pub const FONT_RESOURCE: &str = "F1";
/// Resource name of the header logo image.
pub const LOGO_RESOURCE: &str = "ImLogo";
/// Resource name of the watermark image.
pub const WATERMARK_RESOURCE: &str = "ImWatermark";
/// Resource name of the QR code image.
pub const QR_RESOURCE: &str = "ImQR";
/// Resource name of the translucent graphics state used for the watermark.
pub const WATERMARK_GSTATE: &str = "GSWatermark";

/// Fill/stroke opacity of the watermark.
pub const WATERMARK_OPACITY: f64 = 0.08;

const MARGIN: f64 = 50.0;
const LOGO_WIDTH: f64 = 120.0;
const LOGO_MAX_HEIGHT: f64 = 80.0;
const QR_SIZE: f64 = 140.0;

// Fixed baselines of the footer band.
const QR_Y: f64 = MARGIN + 80.0;
const DIVIDER_Y: f64 = MARGIN + 54.0;
const CASE_URL_Y: f64 = MARGIN + 38.0;
const DISCLAIMER_Y: f64 = MARGIN + 20.0;

const TITLE_SIZE: f64 = 20.0;
const BODY_SIZE: f64 = 12.0;
const SMALL_SIZE: f64 = 10.0;

/// Baseline-to-baseline distance of single text lines, as a font-size multiple.
const TEXT_LEADING: f64 = 1.2;
/// Line height of the wrapped description paragraph.
const PARAGRAPH_LEADING: f64 = 1.5;

const TITLE_PREFIX: &str = "Constancia de Registro de";
const PARAGRAPH_LABEL: &str = "Texto del caso:";
const ELLIPSIS: &str = "...";
const QR_CAPTION: &str = "Escanea el código para consultar el caso.";
const FOOTER_DISCLAIMER: &str =
    "Este documento ha sido generado automáticamente por el Sistema de Quejas. No requiere firma.";

const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Long Spanish date with time, e.g. `5 de agosto de 2025, 17:00`.
pub fn format_spanish_datetime(moment: &DateTime<FixedOffset>) -> String {
    format!(
        "{} de {} de {}, {:02}:{:02}",
        moment.day(),
        MONTHS_ES[moment.month0() as usize],
        moment.year(),
        moment.hour(),
        moment.minute()
    )
}

/// Vertical layout position in points from the bottom of the page.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct LayoutCursor(f64);

impl LayoutCursor {
    pub fn at(y: f64) -> Self {
        Self(y)
    }

    pub fn y(self) -> f64 {
        self.0
    }

    /// Move the cursor `amount` points further down the page.
    pub fn down(self, amount: f64) -> Self {
        debug_assert!(amount >= 0.0, "layout cursor only moves down");
        Self(self.0 - amount)
    }
}

/// Ordered drawing operators for one page.
#[derive(Debug, Clone, Default)]
pub struct ContentStream {
    ops: Vec<Vec<u8>>,
}

impl ContentStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `text` with its baseline at (`x`, `y`).
    pub fn text(&mut self, x: f64, y: f64, font_size: f64, text: &str) {
        let mut op = format!("BT /{FONT_RESOURCE} {font_size} Tf 1 0 0 1 {x:.2} {y:.2} Tm ")
            .into_bytes();
        op.extend_from_slice(&literal_string(text));
        op.extend_from_slice(b" Tj ET");
        self.ops.push(op);
    }

    /// Paint image XObject `name` into the given rectangle.
    pub fn image(&mut self, name: &str, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(
            format!("q {width:.2} 0 0 {height:.2} {x:.2} {y:.2} cm /{name} Do Q").into_bytes(),
        );
    }

    /// Paint image `name` under the translucent graphics state.
    pub fn translucent_image(
        &mut self,
        gstate: &str,
        name: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) {
        self.ops.push(
            format!("q /{gstate} gs {width:.2} 0 0 {height:.2} {x:.2} {y:.2} cm /{name} Do Q")
                .into_bytes(),
        );
    }

    /// Stroke a thin grey horizontal line.
    pub fn horizontal_line(&mut self, x1: f64, x2: f64, y: f64) {
        self.ops
            .push(format!("q 0.6 G 0.75 w {x1:.2} {y:.2} m {x2:.2} {y:.2} l S Q").into_bytes());
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Operators joined by newlines, in the font's single-byte encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.ops.join(&b'\n')
    }
}

/// What goes on the certificate.
#[derive(Debug, Clone)]
pub struct CertificateContent<'a> {
    pub case: &'a CaseRecord,
    pub case_url: &'a str,
    pub generated_at: DateTime<FixedOffset>,
}

/// Images available to the page; absent ones are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageImages<'a> {
    pub logo: Option<&'a RawImage>,
    pub watermark: Option<&'a RawImage>,
    pub qr: Option<&'a RawImage>,
}

/// A laid-out page.
#[derive(Debug, Clone)]
pub struct ComposedPage {
    /// Encoded content stream body.
    pub content: Vec<u8>,
    /// Image resource names the content stream paints.
    pub xobjects: Vec<&'static str>,
    /// Whether the watermark graphics state is referenced.
    pub uses_watermark_gstate: bool,
    /// Number of description lines drawn.
    pub paragraph_lines: usize,
}

/// Single-page certificate layout.
pub struct Composer<M = HeuristicMetrics> {
    layout: TextLayout<M>,
    page_width: f64,
    page_height: f64,
}

impl Composer<HeuristicMetrics> {
    pub fn new(paper_size: PaperSize) -> Self {
        Self::with_metrics(paper_size, HeuristicMetrics::default())
    }
}

impl<M: GlyphMetrics> Composer<M> {
    pub fn with_metrics(paper_size: PaperSize, metrics: M) -> Self {
        let (page_width, page_height) = paper_size.dimensions_pt();
        Self {
            layout: TextLayout::new(metrics),
            page_width,
            page_height,
        }
    }

    /// Page size as (width, height) in points.
    pub fn media_box(&self) -> (f64, f64) {
        (self.page_width, self.page_height)
    }

    fn content_width(&self) -> f64 {
        self.page_width - MARGIN * 2.0
    }

    fn qr_origin(&self) -> (f64, f64) {
        (self.page_width - MARGIN - QR_SIZE, QR_Y)
    }

    /// Lowest baseline the body text may use.
    fn body_floor(&self, has_qr: bool) -> f64 {
        if has_qr {
            self.qr_origin().1 + QR_SIZE + 10.0
        } else {
            DIVIDER_Y + 16.0
        }
    }

    /// Lay out the whole page.
    pub fn compose(
        &self,
        content: &CertificateContent<'_>,
        images: &PageImages<'_>,
    ) -> ComposedPage {
        let mut stream = ContentStream::new();
        let mut xobjects = Vec::new();
        let case = content.case;

        let uses_watermark_gstate = if let Some(watermark) = images.watermark {
            self.draw_watermark(&mut stream, watermark);
            xobjects.push(WATERMARK_RESOURCE);
            true
        } else {
            false
        };

        let mut cursor = LayoutCursor::at(self.page_height - MARGIN);
        cursor = match images.logo {
            Some(logo) => {
                xobjects.push(LOGO_RESOURCE);
                self.draw_logo(&mut stream, cursor, logo)
            }
            None => cursor.down(20.0),
        };

        let title = format!("{TITLE_PREFIX} {}", case.kind.label());
        cursor = self
            .draw_centered_text(&mut stream, cursor, TITLE_SIZE, &title)
            .down(10.0);

        let case_line = format!("Número de caso: {}", case.case_number);
        cursor = self
            .draw_text(&mut stream, cursor, BODY_SIZE, &case_line)
            .down(14.0);
        let kind_line = format!("Tipo de feedback: {}", case.kind.label());
        cursor = self
            .draw_text(&mut stream, cursor, BODY_SIZE, &kind_line)
            .down(14.0);
        if let Some(registered_at) = case.registered_at {
            let local = registered_at.with_timezone(content.generated_at.offset());
            let registered_line = format!("Fecha de registro: {}", format_spanish_datetime(&local));
            cursor = self
                .draw_text(&mut stream, cursor, BODY_SIZE, &registered_line)
                .down(14.0);
        }
        let issued_line = format!(
            "Fecha de expedición: {}",
            format_spanish_datetime(&content.generated_at)
        );
        cursor = self
            .draw_text(&mut stream, cursor, BODY_SIZE, &issued_line)
            .down(18.0);

        let citizen_line = format!("Ciudadano: {}", case.citizen_name());
        cursor = self
            .draw_text(&mut stream, cursor, BODY_SIZE, &citizen_line)
            .down(14.0);
        let email_line = format!("Email: {}", case.email);
        cursor = self
            .draw_text(&mut stream, cursor, BODY_SIZE, &email_line)
            .down(20.0);

        cursor = self
            .draw_text(&mut stream, cursor, BODY_SIZE, PARAGRAPH_LABEL)
            .down(16.0);
        let floor = self.body_floor(images.qr.is_some());
        let (cursor, paragraph_lines) =
            self.draw_paragraph(&mut stream, cursor, &case.description, BODY_SIZE, floor);

        if images.qr.is_some() {
            xobjects.push(QR_RESOURCE);
            self.draw_qr(&mut stream);
        }
        self.draw_footer(&mut stream, content.case_url);

        debug!(
            ops = stream.len(),
            paragraph_lines,
            body_end = cursor.y(),
            "certificate page composed"
        );

        ComposedPage {
            content: stream.to_bytes(),
            xobjects,
            uses_watermark_gstate,
            paragraph_lines,
        }
    }

    /// Fit the watermark inside the margins, keep its aspect ratio, center it.
    fn draw_watermark(&self, stream: &mut ContentStream, image: &RawImage) {
        let max_width = self.content_width();
        let max_height = self.page_height - MARGIN * 2.0;
        let mut width = max_width;
        let mut height = width * image.aspect_ratio();
        if height > max_height {
            height = max_height;
            width = height / image.aspect_ratio();
        }
        let x = (self.page_width - width) / 2.0;
        let y = (self.page_height - height) / 2.0;
        stream.translucent_image(WATERMARK_GSTATE, WATERMARK_RESOURCE, x, y, width, height);
    }

    /// Logo at the top-left, 120 pt wide, or narrower when that would make it
    /// taller than the header allows.
    fn draw_logo(
        &self,
        stream: &mut ContentStream,
        cursor: LayoutCursor,
        image: &RawImage,
    ) -> LayoutCursor {
        let mut width = LOGO_WIDTH;
        let mut height = width * image.aspect_ratio();
        if height > LOGO_MAX_HEIGHT {
            height = LOGO_MAX_HEIGHT;
            width = height / image.aspect_ratio();
        }
        let bottom = cursor.down(height);
        stream.image(LOGO_RESOURCE, MARGIN, bottom.y(), width, height);
        bottom.down(20.0)
    }

    fn draw_text(
        &self,
        stream: &mut ContentStream,
        cursor: LayoutCursor,
        size: f64,
        text: &str,
    ) -> LayoutCursor {
        stream.text(MARGIN, cursor.y(), size, text);
        cursor.down(size * TEXT_LEADING)
    }

    fn draw_centered_text(
        &self,
        stream: &mut ContentStream,
        cursor: LayoutCursor,
        size: f64,
        text: &str,
    ) -> LayoutCursor {
        let x = self.layout.center(text, size, self.page_width);
        stream.text(x, cursor.y(), size, text);
        cursor.down(size * TEXT_LEADING)
    }

    /// Word-wrap `text` across the content width, one operator per line.
    ///
    /// Lines whose baseline would fall below `floor` are dropped and the last
    /// kept line is marked with an ellipsis.
    fn draw_paragraph(
        &self,
        stream: &mut ContentStream,
        cursor: LayoutCursor,
        text: &str,
        size: f64,
        floor: f64,
    ) -> (LayoutCursor, usize) {
        let line_height = size * PARAGRAPH_LEADING;
        let lines = self.layout.wrap(text, size, self.content_width());

        let available = if cursor.y() < floor {
            0
        } else {
            ((cursor.y() - floor) / line_height).floor() as usize + 1
        };
        let kept = lines.len().min(available);
        if kept < lines.len() {
            warn!(
                total = lines.len(),
                kept, "description does not fit on the page, truncating"
            );
        }

        let mut cursor = cursor;
        for (index, line) in lines.iter().take(kept).enumerate() {
            if index + 1 == kept && kept < lines.len() {
                stream.text(MARGIN, cursor.y(), size, &self.with_ellipsis(line, size));
            } else {
                stream.text(MARGIN, cursor.y(), size, line);
            }
            cursor = cursor.down(line_height);
        }
        (cursor, kept)
    }

    /// Append `...` to `line`, dropping trailing words until it fits the
    /// content width. A lone word keeps its ellipsis regardless.
    fn with_ellipsis(&self, line: &str, size: f64) -> String {
        let mut words: Vec<&str> = line.split(' ').collect();
        loop {
            let candidate = format!("{}{ELLIPSIS}", words.join(" "));
            let fits = self.layout.estimate_width(&candidate, size) <= self.content_width();
            if fits || words.len() == 1 {
                return candidate;
            }
            words.pop();
        }
    }

    fn draw_qr(&self, stream: &mut ContentStream) {
        let (x, y) = self.qr_origin();
        stream.image(QR_RESOURCE, x, y, QR_SIZE, QR_SIZE);
        stream.text(x, y - 16.0, SMALL_SIZE, QR_CAPTION);
    }

    /// Divider, disclaimer, and case URL at fixed heights above the margin.
    fn draw_footer(&self, stream: &mut ContentStream, case_url: &str) {
        stream.horizontal_line(MARGIN, self.page_width - MARGIN, DIVIDER_Y);
        let x = self.layout.center(FOOTER_DISCLAIMER, SMALL_SIZE, self.page_width);
        stream.text(x, DISCLAIMER_Y, SMALL_SIZE, FOOTER_DISCLAIMER);
        stream.text(MARGIN, CASE_URL_Y, BODY_SIZE, &format!("URL del caso: {case_url}"));
    }
}
