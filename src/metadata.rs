//! Standalone convenience functions for PNG/WebP generation metadata.
//!
//! These operate on already-encoded container bytes, extracting or removing
//! metadata in a single call. Each one decodes the container afresh; when
//! you need dimensions and several documents at once, decode a
//! [`DecodedImage`] yourself instead.
//!
//! # Example
//!
//! ```rust,no_run
//! # let image_bytes: &[u8] = &[];
//! // Extract
//! let prompt = zenstrip::metadata::prompt(image_bytes)?;
//!
//! // Remove
//! let clean = zenstrip::metadata::strip(image_bytes)?;
//! # Ok::<(), zenstrip::ParseError>(())
//! ```

use serde_json::Value;

use crate::container::{DecodedImage, ParseError};

/// Extract the prompt graph from PNG or WebP data, if present.
pub fn prompt(data: &[u8]) -> Result<Option<Value>, ParseError> {
    Ok(DecodedImage::decode(data)?.into_metadata().prompt)
}

/// Extract the workflow document from PNG or WebP data, if present.
pub fn workflow(data: &[u8]) -> Result<Option<Value>, ParseError> {
    Ok(DecodedImage::decode(data)?.into_metadata().workflow)
}

/// Extract the WebUI parameter block, if present. Always absent for WebP.
pub fn parameters(data: &[u8]) -> Result<Option<Value>, ParseError> {
    Ok(DecodedImage::decode(data)?.into_metadata().parameters)
}

/// Pixel dimensions as reported by `IHDR` (PNG) or `VP8X` (WebP).
pub fn dimensions(data: &[u8]) -> Result<(u32, u32), ParseError> {
    let image = DecodedImage::decode(data)?;
    Ok((image.width(), image.height()))
}

/// Produce a copy of `data` with all generation metadata chunks removed.
pub fn strip(data: &[u8]) -> Result<Vec<u8>, ParseError> {
    Ok(DecodedImage::decode(data)?.rewrite())
}
