// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — source reading, header inspection, and the shared image cache.
//
// Images are never decoded: the compressed bytes are embedded in the PDF as-is
// and only the container headers are walked to learn the pixel dimensions.

pub mod cache;
pub mod inspect;
pub mod source;

pub use cache::ImageCache;
pub use inspect::{Dimensions, ImageFormat, decode_raw_image, dimensions, sniff_format};
pub use source::{ImageLocation, ImageReader, SourceReader};

/// How the embedded bytes of a [`RawImage`] are compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Baseline or progressive JPEG, embedded with `/DCTDecode`.
    Jpeg { components: u8 },
    /// Concatenated PNG `IDAT` payload, embedded with `/FlateDecode` and a PNG
    /// predictor.
    Png { colors: u8 },
}

impl ImageEncoding {
    /// Bits per colour component. Only 8-bit sources are accepted.
    pub const BITS_PER_COMPONENT: u8 = 8;

    /// PDF colour space name for this encoding.
    pub fn color_space(&self) -> &'static str {
        let channels = match self {
            Self::Jpeg { components } => *components,
            Self::Png { colors } => *colors,
        };
        match channels {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        }
    }

    /// PDF stream filter that decodes the embedded bytes.
    pub fn filter(&self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "DCTDecode",
            Self::Png { .. } => "FlateDecode",
        }
    }
}

/// An encoded image ready for embedding.
///
/// Immutable once constructed; shared between builds through the
/// [`ImageCache`] as `Arc<RawImage>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
    encoding: ImageEncoding,
}

impl RawImage {
    pub fn new(data: Vec<u8>, width: u32, height: u32, encoding: ImageEncoding) -> Self {
        Self {
            data,
            width,
            height,
            encoding,
        }
    }

    /// Encoded bytes exactly as they go into the image stream.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn encoding(&self) -> ImageEncoding {
        self.encoding
    }

    /// Height divided by width, used to scale the image to a target width.
    pub fn aspect_ratio(&self) -> f64 {
        self.height as f64 / self.width.max(1) as f64
    }
}
