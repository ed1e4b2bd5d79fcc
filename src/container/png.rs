//! PNG chunk-stream decoding.
//!
//! A PNG is an 8-byte signature followed by chunks of big-endian length,
//! 4-byte ASCII type, payload, and a 4-byte CRC trailer. Only `IHDR`,
//! `pHYs`, `tEXt`, and `IEND` are interpreted here; CRCs are neither
//! verified nor regenerated (the rewriter copies them verbatim).

use log::{debug, warn};
use serde_json::Value;

use super::{DecodedImage, ImageMetadata, ParseError, Repr};
use crate::slice_reader::SliceReader;

/// The 8-byte PNG signature.
pub(crate) const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Dots-per-meter in one dot-per-inch; `pHYs` densities are per meter.
const DOTS_PER_METER_PER_INCH: f64 = 100.0 / 2.54;

/// Checks the buffer's initial 8 bytes for the PNG signature.
pub(super) fn is_png_signature(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

/// Walks the chunk stream, collecting dimensions, density, and `tEXt`
/// metadata.
///
/// The scan stops at the first `pHYs` chunk or at `IEND`, whichever comes
/// first. Stopping at `pHYs` skips any later chunks on purpose: the
/// generators this tool targets write their `tEXt` chunks before `pHYs`,
/// and the rewrite pass re-scans the whole buffer anyway.
pub(super) fn decode(data: &[u8]) -> Result<DecodedImage<'_>, ParseError> {
    let mut r = SliceReader::new(data);
    r.seek_from_start(PNG_SIGNATURE.len())?;

    let mut meta = ImageMetadata::default();
    let mut saw_ihdr = false;

    debug!("parsing PNG chunks");
    while r.remaining() >= 8 {
        let length = r.read_u32_be()? as usize;
        let mut fourcc = [0u8; 4];
        r.read_exact(&mut fourcc)?;
        let payload = r.take_slice(length)?;
        r.seek_relative(4)?; // CRC trailer
        debug!("- chunk {} ({length})", String::from_utf8_lossy(&fourcc));

        match &fourcc {
            b"IHDR" => {
                let mut p = SliceReader::new(payload);
                meta.width = p.read_u32_be()?;
                meta.height = p.read_u32_be()?;
                saw_ihdr = true;
                debug!("  - size {}x{}", meta.width, meta.height);
            }
            b"pHYs" => {
                let mut p = SliceReader::new(payload);
                let x = p.read_u32_be()?;
                let y = p.read_u32_be()?;
                let unit = p.read_u8()?;
                if x != y {
                    return Err(ParseError::UnsupportedResolution { x, y });
                }
                if unit != 1 {
                    return Err(ParseError::UnsupportedUnits(unit));
                }
                meta.pixels_per_inch = f64::from(x) / DOTS_PER_METER_PER_INCH;
                debug!("  - {} ppi ({x} {y} {unit})", meta.pixels_per_inch);
                break;
            }
            b"tEXt" => read_text_chunk(payload, &mut meta),
            b"IEND" => break,
            _ => {}
        }
    }

    if !saw_ihdr {
        return Err(ParseError::BrokenContainer);
    }
    Ok(DecodedImage { repr: Repr::Png(data), meta })
}

/// Splits a `tEXt` payload at its keyword NUL and files the value under the
/// matching metadata slot.
///
/// A value that fails to parse as JSON is kept as the raw string; this is
/// the lenient counterpart of the strict EXIF path.
fn read_text_chunk(payload: &[u8], meta: &mut ImageMetadata) {
    let Some(nul) = payload.iter().position(|&b| b == 0) else {
        warn!("tEXt chunk without a keyword separator, discarding");
        return;
    };
    let keyword = &payload[..nul];
    let text = String::from_utf8_lossy(&payload[nul + 1..]).into_owned();
    let value = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| Value::String(text));
    match keyword {
        b"prompt" => {
            debug!("  - prompt");
            meta.prompt = Some(value);
        }
        b"workflow" => {
            debug!("  - workflow");
            meta.workflow = Some(value);
        }
        b"parameters" => {
            debug!("  - WebUI parameters");
            meta.parameters = Some(value);
        }
        other => {
            warn!("unrecognized tEXt keyword `{}`, discarding", String::from_utf8_lossy(other));
        }
    }
}
