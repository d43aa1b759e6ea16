// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image header inspection — recover pixel dimensions from JPEG and PNG
// containers without decompressing any pixel data.

use constancia_core::error::{CertificateError, Result};
use tracing::debug;

use super::{ImageEncoding, RawImage};

/// JPEG start-of-image marker.
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Fixed 8-byte PNG file signature.
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// The first chunk of every PNG; its tag sits at bytes 12..16.
const PNG_IHDR: &[u8; 4] = b"IHDR";

// JPEG markers that share the SOFn numeric range but are not frame headers.
const MARKER_DHT: u8 = 0xC4;
const MARKER_JPG: u8 = 0xC8;
const MARKER_DAC: u8 = 0xCC;
const MARKER_SOS: u8 = 0xDA;

/// Container formats the inspector understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Pixel dimensions read from an image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Detect the container format from the leading magic bytes.
pub fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(&PNG_SIGNATURE) {
        Some(ImageFormat::Png)
    } else if data.starts_with(&JPEG_SOI) {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

/// Read the pixel width and height of `data`, or `None` when the header is
/// truncated or not recognised.
pub fn dimensions(data: &[u8], format: ImageFormat) -> Option<Dimensions> {
    match format {
        ImageFormat::Jpeg => jpeg_frame_header(data).map(|frame| frame.dimensions),
        ImageFormat::Png => png_dimensions(data),
    }
}

// -- JPEG ---------------------------------------------------------------------

/// The parts of a JPEG SOFn segment the embedder needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameHeader {
    dimensions: Dimensions,
    components: u8,
}

fn is_frame_header(marker: u8) -> bool {
    (0xC0..=0xCF).contains(&marker)
        && marker != MARKER_DHT
        && marker != MARKER_JPG
        && marker != MARKER_DAC
}

/// Markers without a length field (SOI, EOI, RSTn, TEM).
fn is_standalone(marker: u8) -> bool {
    marker == 0x01 || (0xD0..=0xD9).contains(&marker)
}

/// Walk the marker segments up to the first frame header.
fn jpeg_frame_header(data: &[u8]) -> Option<FrameHeader> {
    if !data.starts_with(&JPEG_SOI) {
        return None;
    }

    let mut offset = JPEG_SOI.len();
    while offset < data.len() {
        if data[offset] != 0xFF {
            offset += 1;
            continue;
        }

        let marker = *data.get(offset + 1)?;
        if marker == 0xFF {
            // Fill byte; the next 0xFF starts the marker.
            offset += 1;
            continue;
        }
        offset += 2;

        if is_standalone(marker) {
            continue;
        }
        if marker == MARKER_SOS {
            // Entropy-coded data follows; a frame header can no longer appear.
            return None;
        }

        let length = read_u16_be(data, offset)? as usize;
        if length < 2 {
            return None;
        }

        if is_frame_header(marker) {
            // length(2) precision(1) height(2) width(2) components(1)
            let height = read_u16_be(data, offset + 3)?;
            let width = read_u16_be(data, offset + 5)?;
            let components = *data.get(offset + 7)?;
            if width == 0 || height == 0 {
                return None;
            }
            debug!(marker, width, height, components, "JPEG frame header found");
            return Some(FrameHeader {
                dimensions: Dimensions {
                    width: width as u32,
                    height: height as u32,
                },
                components,
            });
        }

        offset += length;
    }

    None
}

// -- PNG ----------------------------------------------------------------------

fn png_dimensions(data: &[u8]) -> Option<Dimensions> {
    if !data.starts_with(&PNG_SIGNATURE) || data.get(12..16)? != PNG_IHDR {
        return None;
    }
    let width = read_u32_be(data, 16)?;
    let height = read_u32_be(data, 20)?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(Dimensions { width, height })
}

/// Embeddable payload of a PNG: the concatenated `IDAT` zlib stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngEmbedding {
    pub data: Vec<u8>,
    pub colors: u8,
}

/// Collect the `IDAT` payload of an 8-bit, non-interlaced greyscale or
/// truecolour PNG. Other PNG flavours need re-encoding and are rejected.
pub fn png_embedding(data: &[u8]) -> Result<PngEmbedding> {
    let unrecognized = |reason: &str| CertificateError::UnrecognizedImage(format!("PNG: {reason}"));

    if png_dimensions(data).is_none() {
        return Err(unrecognized("missing signature or IHDR"));
    }

    // IHDR data starts at 16: width(4) height(4) depth color compression filter interlace
    let Some(&[bit_depth, color_type, _, _, interlace]) = data.get(24..29) else {
        return Err(unrecognized("truncated IHDR"));
    };

    if bit_depth != ImageEncoding::BITS_PER_COMPONENT {
        return Err(unrecognized(&format!("unsupported bit depth {bit_depth}")));
    }
    let colors = match color_type {
        0 => 1,
        2 => 3,
        other => return Err(unrecognized(&format!("unsupported colour type {other}"))),
    };
    if interlace != 0 {
        return Err(unrecognized("interlaced images are not supported"));
    }

    let mut idat = Vec::new();
    let mut offset = PNG_SIGNATURE.len();
    loop {
        let length = read_u32_be(data, offset).ok_or_else(|| unrecognized("truncated chunk"))?
            as usize;
        let tag = data
            .get(offset + 4..offset + 8)
            .ok_or_else(|| unrecognized("truncated chunk"))?;
        let body_start = offset + 8;
        let body = data
            .get(body_start..body_start + length)
            .ok_or_else(|| unrecognized("truncated chunk"))?;

        match tag {
            b"IDAT" => idat.extend_from_slice(body),
            b"IEND" => break,
            _ => {}
        }
        // body + CRC
        offset = body_start + length + 4;
    }

    if idat.is_empty() {
        return Err(unrecognized("no IDAT chunk"));
    }
    Ok(PngEmbedding { data: idat, colors })
}

// -- Pipeline -----------------------------------------------------------------

/// Turn fetched bytes into an embeddable [`RawImage`].
pub fn decode_raw_image(data: Vec<u8>) -> Result<RawImage> {
    match sniff_format(&data) {
        Some(ImageFormat::Jpeg) => {
            let frame = jpeg_frame_header(&data).ok_or_else(|| {
                CertificateError::UnrecognizedImage("JPEG: no frame header found".into())
            })?;
            if !matches!(frame.components, 1 | 3 | 4) {
                return Err(CertificateError::UnrecognizedImage(format!(
                    "JPEG: unsupported component count {}",
                    frame.components
                )));
            }
            Ok(RawImage::new(
                data,
                frame.dimensions.width,
                frame.dimensions.height,
                ImageEncoding::Jpeg {
                    components: frame.components,
                },
            ))
        }
        Some(ImageFormat::Png) => {
            let dims = png_dimensions(&data).ok_or_else(|| {
                CertificateError::UnrecognizedImage("PNG: malformed IHDR".into())
            })?;
            let embedding = png_embedding(&data)?;
            Ok(RawImage::new(
                embedding.data,
                dims.width,
                dims.height,
                ImageEncoding::Png {
                    colors: embedding.colors,
                },
            ))
        }
        None => Err(CertificateError::UnrecognizedImage(
            "neither JPEG nor PNG".into(),
        )),
    }
}

fn read_u16_be(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_u32_be(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SOI, a JFIF APP0 segment, a Huffman table, then a frame header.
    fn jpeg_with_frame(marker: u8, width: u16, height: u16, components: u8) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        // APP0 (JFIF), length 16
        data.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        data.extend_from_slice(b"JFIF\0");
        data.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
        // DHT whose body would read as 0x0F0F x 0x0F0F if mistaken for a frame
        data.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x08, 0x00, 0x0F, 0x0F, 0x0F, 0x0F, 0x00]);
        // SOFn
        let length = 8 + 3 * components as u16;
        data.extend_from_slice(&[0xFF, marker]);
        data.extend_from_slice(&length.to_be_bytes());
        data.push(0x08);
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&width.to_be_bytes());
        data.push(components);
        for id in 1..=components {
            data.extend_from_slice(&[id, 0x11, 0x00]);
        }
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    fn png_chunk(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut chunk = (body.len() as u32).to_be_bytes().to_vec();
        chunk.extend_from_slice(tag);
        chunk.extend_from_slice(body);
        chunk.extend_from_slice(&[0, 0, 0, 0]); // CRC is not checked
        chunk
    }

    fn png_with(width: u32, height: u32, color_type: u8, idat: &[&[u8]]) -> Vec<u8> {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[8, color_type, 0, 0, 0]);

        let mut data = PNG_SIGNATURE.to_vec();
        data.extend(png_chunk(b"IHDR", &ihdr));
        data.extend(png_chunk(b"tEXt", b"Software\0test"));
        for part in idat {
            data.extend(png_chunk(b"IDAT", part));
        }
        data.extend(png_chunk(b"IEND", &[]));
        data
    }

    #[test]
    fn sniffs_magic_bytes() {
        assert_eq!(sniff_format(&jpeg_with_frame(0xC0, 1, 1, 3)), Some(ImageFormat::Jpeg));
        assert_eq!(sniff_format(&png_with(1, 1, 2, &[b"x"])), Some(ImageFormat::Png));
        assert_eq!(sniff_format(b"GIF89a"), None);
    }

    #[test]
    fn baseline_jpeg_dimensions_skip_huffman_table() {
        let data = jpeg_with_frame(0xC0, 200, 100, 3);
        assert_eq!(
            dimensions(&data, ImageFormat::Jpeg),
            Some(Dimensions {
                width: 200,
                height: 100
            })
        );
    }

    #[test]
    fn progressive_jpeg_dimensions() {
        let data = jpeg_with_frame(0xC2, 1024, 768, 3);
        assert_eq!(
            dimensions(&data, ImageFormat::Jpeg),
            Some(Dimensions {
                width: 1024,
                height: 768
            })
        );
    }

    #[test]
    fn jpg_and_dac_markers_are_not_frames() {
        // A JPG-extension segment in front of the real frame header.
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xC8, 0x00, 0x08, 0x08, 0x00, 0x05, 0x00, 0x05, 0x03];
        data.extend_from_slice(&[0xFF, 0xCC, 0x00, 0x04, 0x00, 0x00]);
        data.extend_from_slice(&jpeg_with_frame(0xC1, 64, 48, 1)[2..]);
        assert_eq!(
            dimensions(&data, ImageFormat::Jpeg),
            Some(Dimensions {
                width: 64,
                height: 48
            })
        );
    }

    #[test]
    fn fill_bytes_before_marker_are_tolerated() {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xFF];
        data.extend_from_slice(&jpeg_with_frame(0xC0, 10, 20, 3)[2..]);
        assert_eq!(
            dimensions(&data, ImageFormat::Jpeg),
            Some(Dimensions {
                width: 10,
                height: 20
            })
        );
    }

    #[test]
    fn jpeg_without_frame_header_is_indeterminate() {
        assert_eq!(dimensions(&[0xFF, 0xD8, 0xFF, 0xD9], ImageFormat::Jpeg), None);
    }

    #[test]
    fn truncated_jpeg_is_indeterminate() {
        let data = jpeg_with_frame(0xC0, 200, 100, 3);
        // Cut inside the frame header, right after the height.
        let cut = data.iter().position(|&b| b == 0xC0).expect("SOF0") + 5;
        assert_eq!(dimensions(&data[..cut], ImageFormat::Jpeg), None);
    }

    #[test]
    fn jpeg_stops_at_start_of_scan() {
        let data = [0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00];
        assert_eq!(dimensions(&data, ImageFormat::Jpeg), None);
    }

    #[test]
    fn png_dimensions_from_ihdr() {
        let data = png_with(640, 480, 2, &[b"zlib"]);
        assert_eq!(
            dimensions(&data, ImageFormat::Png),
            Some(Dimensions {
                width: 640,
                height: 480
            })
        );
    }

    #[test]
    fn png_with_wrong_first_chunk_is_indeterminate() {
        let mut data = png_with(640, 480, 2, &[b"zlib"]);
        data[12..16].copy_from_slice(b"tEXt");
        assert_eq!(dimensions(&data, ImageFormat::Png), None);
    }

    #[test]
    fn png_embedding_concatenates_idat() {
        let data = png_with(3, 2, 2, &[b"abc", b"def"]);
        let embedding = png_embedding(&data).expect("embeddable");
        assert_eq!(embedding.data, b"abcdef");
        assert_eq!(embedding.colors, 3);
    }

    #[test]
    fn png_with_alpha_is_rejected() {
        let data = png_with(3, 2, 6, &[b"abc"]);
        assert!(matches!(
            png_embedding(&data),
            Err(CertificateError::UnrecognizedImage(_))
        ));
    }

    #[test]
    fn decode_raw_image_keeps_jpeg_bytes() {
        let data = jpeg_with_frame(0xC0, 300, 150, 3);
        let raw = decode_raw_image(data.clone()).expect("decode");
        assert_eq!(raw.data(), data.as_slice());
        assert_eq!((raw.width(), raw.height()), (300, 150));
        assert_eq!(raw.encoding(), ImageEncoding::Jpeg { components: 3 });
        assert_eq!(raw.encoding().color_space(), "DeviceRGB");
    }

    #[test]
    fn decode_raw_image_rejects_unknown_formats() {
        assert!(decode_raw_image(b"<html>404</html>".to_vec()).is_err());
    }

    #[test]
    fn real_encoder_output_matches_header() {
        let rgb = ::image::RgbImage::from_pixel(37, 21, ::image::Rgb([200, 30, 30]));
        let dynamic = ::image::DynamicImage::ImageRgb8(rgb);

        let mut jpeg = std::io::Cursor::new(Vec::new());
        dynamic
            .write_to(&mut jpeg, ::image::ImageFormat::Jpeg)
            .expect("encode JPEG");
        let raw = decode_raw_image(jpeg.into_inner()).expect("decode JPEG");
        assert_eq!((raw.width(), raw.height()), (37, 21));

        let mut png = std::io::Cursor::new(Vec::new());
        dynamic
            .write_to(&mut png, ::image::ImageFormat::Png)
            .expect("encode PNG");
        let raw = decode_raw_image(png.into_inner()).expect("decode PNG");
        assert_eq!((raw.width(), raw.height()), (37, 21));
        assert_eq!(raw.encoding(), ImageEncoding::Png { colors: 3 });
    }
}
