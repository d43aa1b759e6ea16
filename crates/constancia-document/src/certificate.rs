// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certificate generator — the public entry point that turns a case record into
// a finished single-page PDF.
//
// A build runs in three phases:
//
//   1. fetch logo, watermark, and QR code concurrently (failures degrade to
//      "image absent", never to an error);
//   2. lay out the page content stream;
//   3. reserve object ids, emit every object, and serialize.
//
// Logo and watermark go through the shared `ImageCache`. The QR code encodes
// the case URL, so it differs per case and is fetched uncached.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use constancia_core::error::{CertificateError, Result};
use constancia_core::{BuildId, CaseRecord, CertificateConfig};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use crate::image::source::load_image;
use crate::image::{ImageCache, ImageReader, RawImage, SourceReader};
use crate::layout::composer::{
    FONT_RESOURCE, LOGO_RESOURCE, QR_RESOURCE, WATERMARK_GSTATE, WATERMARK_OPACITY,
    WATERMARK_RESOURCE,
};
use crate::layout::{CertificateContent, ComposedPage, Composer, PageImages};
use crate::pdf::graph::{
    catalog_object, ext_gstate_object, font_object, page_object, pages_object, validate_base_font,
};
use crate::pdf::{BuildContext, PageResources, image_object, wrap_stream};

/// Characters left as-is in a query value: RFC 3986 unreserved.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// QR image request for `case_url` against a quickchart-compatible endpoint.
///
/// Parameters are appended to any query string the endpoint already carries.
pub fn qr_request_url(endpoint: &str, case_url: &str) -> String {
    let separator = if !endpoint.contains('?') {
        "?"
    } else if endpoint.ends_with('?') || endpoint.ends_with('&') {
        ""
    } else {
        "&"
    };
    format!(
        "{endpoint}{separator}text={}&format=jpg&margin=2&size=500",
        utf8_percent_encode(case_url, QUERY_VALUE)
    )
}

/// Builds certificate PDFs for case records.
///
/// One generator can serve any number of concurrent builds; they share only
/// the image cache.
pub struct CertificateGenerator<R = SourceReader> {
    config: CertificateConfig,
    cache: ImageCache<R>,
    composer: Composer,
}

impl CertificateGenerator<SourceReader> {
    /// Generator reading images from disk and over HTTP as configured.
    pub fn from_config(config: CertificateConfig) -> Result<Self> {
        let reader = SourceReader::new(
            Duration::from_secs(config.fetch_timeout_secs),
            config.max_image_bytes,
        );
        Self::new(config, reader)
    }
}

impl<R: ImageReader> CertificateGenerator<R> {
    /// Validate `config` and set up the image cache around `reader`.
    pub fn new(config: CertificateConfig, reader: R) -> Result<Self> {
        config.validate()?;
        validate_base_font(&config.font)?;

        let cache = ImageCache::new(Arc::new(reader), config.cache_capacity);
        let composer = Composer::new(config.paper_size);
        Ok(Self {
            config,
            cache,
            composer,
        })
    }

    pub fn config(&self) -> &CertificateConfig {
        &self.config
    }

    pub fn cache(&self) -> &ImageCache<R> {
        &self.cache
    }

    /// Build the certificate for `case`, stamped with the current local time.
    pub async fn generate_certificate(&self, case: &CaseRecord) -> Result<Vec<u8>> {
        self.generate_certificate_at(case, Local::now().fixed_offset())
            .await
    }

    /// Build the certificate for `case`, stamped with `generated_at`.
    ///
    /// Output is a pure function of the case, the fetched images, and the
    /// timestamp.
    #[instrument(skip_all, fields(build_id = %BuildId::new(), case = %case.case_number))]
    pub async fn generate_certificate_at(
        &self,
        case: &CaseRecord,
        generated_at: DateTime<FixedOffset>,
    ) -> Result<Vec<u8>> {
        let case_url = case.case_url(&self.config.public_feedback_base_url);
        let qr_url = qr_request_url(&self.config.qr_endpoint, &case_url);

        let (logo, watermark, qr) = tokio::join!(
            self.cached_image(self.config.logo_source.as_deref()),
            self.cached_image(self.config.watermark_source.as_deref()),
            load_image(self.cache.reader(), &qr_url),
        );
        debug!(
            logo = logo.is_some(),
            watermark = watermark.is_some(),
            qr = qr.is_some(),
            "images resolved"
        );

        let content = CertificateContent {
            case,
            case_url: &case_url,
            generated_at,
        };
        let page = self.composer.compose(
            &content,
            &PageImages {
                logo: logo.as_deref(),
                watermark: watermark.as_deref(),
                qr: qr.as_ref(),
            },
        );

        let assets = PageAssets {
            logo: logo.as_ref(),
            watermark: watermark.as_ref(),
            qr: qr.as_ref(),
        };
        let (pdf, objects) =
            assemble_certificate(&self.config.font, self.composer.media_box(), &page, &assets)?;

        info!(
            objects,
            bytes = pdf.len(),
            sha256 = %hex::encode(Sha256::digest(&pdf)),
            "certificate generated"
        );
        Ok(pdf)
    }

    async fn cached_image(&self, source: Option<&str>) -> Option<Arc<RawImage>> {
        match source {
            Some(source) => self.cache.get(source).await,
            None => None,
        }
    }
}

/// Images that made it into the build.
struct PageAssets<'a> {
    logo: Option<&'a Arc<RawImage>>,
    watermark: Option<&'a Arc<RawImage>>,
    qr: Option<&'a RawImage>,
}

/// Reserve ids, emit every object, and serialize.
///
/// Returns the PDF bytes and the number of objects written.
fn assemble_certificate(
    font: &str,
    media_box: (f64, f64),
    page: &ComposedPage,
    assets: &PageAssets<'_>,
) -> Result<(Vec<u8>, u32)> {
    let mut ctx = BuildContext::new();
    let catalog_id = ctx.reserve_id();
    let pages_id = ctx.reserve_id();
    let page_id = ctx.reserve_id();
    let font_id = ctx.reserve_id();

    let mut resources = PageResources::new();
    resources.add_font(FONT_RESOURCE, font_id);
    let mut payloads = vec![(font_id, font_object(font)?)];

    let mut logo_id = None;
    if let Some(logo) = assets.logo {
        let id = ctx.reserve_id();
        resources.add_xobject(LOGO_RESOURCE, id);
        payloads.push((id, image_object(logo)));
        logo_id = Some(id);
    }

    let mut watermark_gstate = false;
    if let Some(watermark) = assets.watermark {
        // Same cached image as the logo: reference one XObject twice.
        let shared = assets
            .logo
            .filter(|logo| Arc::ptr_eq(logo, watermark))
            .and(logo_id);
        let id = match shared {
            Some(id) => id,
            None => {
                let id = ctx.reserve_id();
                payloads.push((id, image_object(watermark)));
                id
            }
        };
        resources.add_xobject(WATERMARK_RESOURCE, id);

        let gstate_id = ctx.reserve_id();
        resources.add_ext_gstate(WATERMARK_GSTATE, gstate_id);
        payloads.push((gstate_id, ext_gstate_object(WATERMARK_OPACITY)));
        watermark_gstate = true;
    }

    if let Some(qr) = assets.qr {
        let id = ctx.reserve_id();
        resources.add_xobject(QR_RESOURCE, id);
        payloads.push((id, image_object(qr)));
    }

    let content_id = ctx.reserve_id();

    if let Some(name) = page.xobjects.iter().find(|name| !resources.has_xobject(name)) {
        return Err(CertificateError::ObjectGraph(format!(
            "content stream paints /{name} but no such XObject is registered"
        )));
    }
    if page.uses_watermark_gstate && !watermark_gstate {
        return Err(CertificateError::ObjectGraph(format!(
            "content stream uses /{WATERMARK_GSTATE} but no such ExtGState is registered"
        )));
    }

    ctx.insert(catalog_id, catalog_object(pages_id))?;
    ctx.insert(pages_id, pages_object(&[page_id]))?;
    ctx.insert(page_id, page_object(pages_id, &resources, media_box, content_id))?;
    for (id, payload) in payloads {
        ctx.insert(id, payload)?;
    }
    ctx.insert(content_id, wrap_stream(&page.content))?;

    let objects = ctx.reserved_count();
    let pdf = ctx.finish(catalog_id)?;
    Ok((pdf, objects))
}
