//! Chunk-level PNG and WebP container handling.
//!
//! This module provides two capabilities:
//!
//! - **Decode** ([`DecodedImage::decode`]): walk the container's chunk
//!   stream and collect the generation metadata and pixel dimensions.
//! - **Rewrite** ([`DecodedImage::rewrite`]): emit a new container with the
//!   metadata chunks elided and everything else preserved byte-for-byte.
//!
//! Internally a PNG keeps the original byte buffer and is re-scanned on
//! rewrite, while a WebP keeps an ordered chunk list and is reassembled from
//! it. Callers never need to know which representation backs a given image.
//!
//! # Example
//!
//! ```rust,no_run
//! use zenstrip::DecodedImage;
//!
//! let data: &[u8] = &[]; // your PNG or WebP data
//! let image = DecodedImage::decode(data)?;
//! let clean = image.rewrite();
//! assert!(DecodedImage::decode(&clean)?.metadata().prompt.is_none());
//! # Ok::<(), zenstrip::ParseError>(())
//! ```

use std::borrow::Cow;

use serde_json::Value;

mod error;
mod exif;
mod png;
mod rewrite;
mod webp;

pub use error::ParseError;

/// A single RIFF chunk captured from a WebP stream.
///
/// The recorded chunk length is `payload.len()`. Payloads borrow from the
/// source buffer; the only time one is owned is when the stray-padding shim
/// (see [`DecodedImage::decode`]) had to append a zero byte to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiffChunk<'a> {
    /// Four-byte ASCII chunk tag.
    pub fourcc: [u8; 4],
    /// Chunk payload, without the 8-byte header.
    pub payload: Cow<'a, [u8]>,
}

/// Generation metadata and pixel dimensions extracted from a container.
#[derive(Debug, Clone)]
pub struct ImageMetadata {
    /// ComfyUI prompt graph (the minimal node graph), if present.
    pub prompt: Option<Value>,
    /// ComfyUI workflow (the full node graph with UI state), if present.
    pub workflow: Option<Value>,
    /// WebUI "parameters" block, if present. JSON when it parses as JSON,
    /// the raw text otherwise. Always absent for WebP.
    pub parameters: Option<Value>,
    /// Width in pixels. Zero only for a WebP without a `VP8X` chunk.
    pub width: u32,
    /// Height in pixels. Zero only for a WebP without a `VP8X` chunk.
    pub height: u32,
    /// Pixel density from the PNG `pHYs` chunk, defaulting to 300.
    pub pixels_per_inch: f64,
}

impl Default for ImageMetadata {
    fn default() -> Self {
        Self {
            prompt: None,
            workflow: None,
            parameters: None,
            width: 0,
            height: 0,
            pixels_per_inch: 300.0,
        }
    }
}

/// Container format of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Portable Network Graphics.
    Png,
    /// WebP (RIFF).
    Webp,
}

/// Format-specific backing store for a decoded container.
#[derive(Debug, Clone)]
enum Repr<'a> {
    /// The full original byte buffer; the rewriter re-scans it.
    Png(&'a [u8]),
    /// The ordered kept-chunk list; the rewriter reassembles from it.
    Webp(Vec<RiffChunk<'a>>),
}

/// A decoded PNG or WebP container plus the metadata found inside it.
///
/// Produced by [`DecodedImage::decode`]; immutable afterwards. The value
/// borrows the source buffer, so the buffer must outlive it.
#[derive(Debug, Clone)]
pub struct DecodedImage<'a> {
    repr: Repr<'a>,
    meta: ImageMetadata,
}

impl<'a> DecodedImage<'a> {
    /// Decode a PNG or WebP container from a byte buffer.
    ///
    /// Dispatches on the leading signature: the 8-byte PNG signature selects
    /// the PNG decoder, a `RIFF` header (with `WEBP` at offset 8) selects
    /// the WebP decoder, and anything else fails with
    /// [`ParseError::NotPngOrWebp`].
    ///
    /// Note that the PNG metadata scan deliberately stops at the first
    /// `pHYs` chunk (or at `IEND`): the files this tool targets always put
    /// their `tEXt` metadata first, and the rewrite pass re-scans the buffer
    /// independently, so nothing downstream is lost.
    pub fn decode(data: &'a [u8]) -> Result<Self, ParseError> {
        if png::is_png_signature(data) {
            png::decode(data)
        } else if data.starts_with(b"RIFF") {
            webp::decode(data)
        } else {
            Err(ParseError::NotPngOrWebp)
        }
    }

    /// Container format that was recognized.
    pub fn format(&self) -> ImageFormat {
        match self.repr {
            Repr::Png(_) => ImageFormat::Png,
            Repr::Webp(_) => ImageFormat::Webp,
        }
    }

    /// Extracted metadata and dimensions.
    pub fn metadata(&self) -> &ImageMetadata {
        &self.meta
    }

    /// Consume the decoded image, keeping only the metadata.
    pub fn into_metadata(self) -> ImageMetadata {
        self.meta
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.meta.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.meta.height
    }

    /// The kept RIFF chunk list backing a WebP image.
    ///
    /// `None` for PNG, whose representation is the original byte buffer.
    pub fn riff_chunks(&self) -> Option<&[RiffChunk<'a>]> {
        match &self.repr {
            Repr::Png(_) => None,
            Repr::Webp(chunks) => Some(chunks),
        }
    }

    /// Reassemble the container without its metadata chunks.
    ///
    /// For PNG this copies every chunk except `tEXt` verbatim, CRC included,
    /// up to and including `IEND`. For WebP it emits the kept chunks in
    /// their original order under a freshly computed RIFF length; stray
    /// padding bytes absorbed during decoding are not re-inserted, so the
    /// output is a normalized form. Pixel content and dimensions are
    /// unchanged.
    pub fn rewrite(&self) -> Vec<u8> {
        match &self.repr {
            Repr::Png(data) => rewrite::strip_png(data),
            Repr::Webp(chunks) => rewrite::assemble_webp(chunks),
        }
    }
}
