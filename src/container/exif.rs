//! TIFF/IFD decoding for the WebP `EXIF` chunk.
//!
//! ComfyUI smuggles its two JSON documents into a WebP as ASCII entries of
//! a TIFF Image File Directory: tag 270 carries `Workflow:{...}` and tag
//! 271 carries `Prompt:{...}`, each NUL-terminated. Unlike the PNG `tEXt`
//! path, a recognized entry that fails to parse as JSON is a hard error.

use log::warn;
use serde_json::Value;

use super::ParseError;
use crate::slice_reader::{Endian, SliceReader};

/// IFD tag holding the workflow document.
const TAG_WORKFLOW: u16 = 270;
/// IFD tag holding the prompt document.
const TAG_PROMPT: u16 = 271;
/// IFD field type for ASCII data.
const FIELD_ASCII: u16 = 2;

/// Parses an EXIF payload, returning `(workflow, prompt)`.
pub(super) fn parse(data: &[u8]) -> Result<(Option<Value>, Option<Value>), ParseError> {
    let endian = if data.starts_with(b"II") {
        Endian::Little
    } else if data.starts_with(b"MM") {
        Endian::Big
    } else {
        return Err(ParseError::MalformedExif);
    };

    let mut r = SliceReader::new(data);
    r.seek_from_start(2)?;
    if r.read_u16(endian)? != 42 {
        return Err(ParseError::MalformedTiff);
    }
    let ifd_offset = r.read_u32(endian)? as usize;
    r.seek_from_start(ifd_offset)?;
    let entry_count = r.read_u16(endian)?;

    let mut workflow = None;
    let mut prompt = None;
    for _ in 0..entry_count {
        if r.remaining() < 12 {
            break;
        }
        let tag = r.read_u16(endian)?;
        let field_type = r.read_u16(endian)?;
        let count = r.read_u32(endian)? as usize;
        let value_offset = r.read_u32(endian)? as usize;

        if field_type != FIELD_ASCII {
            warn!("skipping IFD entry with unknown field type {field_type}");
            continue;
        }
        match tag {
            TAG_WORKFLOW => {
                workflow = Some(labelled_json(data, value_offset, count, b"Workflow:")?);
            }
            TAG_PROMPT => {
                prompt = Some(labelled_json(data, value_offset, count, b"Prompt:")?);
            }
            other => warn!("skipping unknown IFD tag {other}"),
        }
    }
    Ok((workflow, prompt))
}

/// Reads a label-prefixed, NUL-terminated JSON document out of the EXIF
/// buffer. The label and the trailing NUL are both mandatory.
fn labelled_json(
    data: &[u8],
    offset: usize,
    count: usize,
    label: &[u8],
) -> Result<Value, ParseError> {
    let end = offset.checked_add(count).ok_or(ParseError::Truncated)?;
    let payload = data.get(offset..end).ok_or(ParseError::Truncated)?;
    let body = payload.strip_prefix(label).ok_or(ParseError::MalformedExif)?;
    let body = match body.split_last() {
        Some((&0, rest)) => rest,
        _ => return Err(ParseError::MalformedExif),
    };
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a one-entry little-endian TIFF whose tag points at `payload`.
    fn tiff_le(tag: u16, field_type: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = b"II".to_vec();
        out.extend_from_slice(&42u16.to_le_bytes());
        out.extend_from_slice(&8u32.to_le_bytes()); // IFD right after the header
        out.extend_from_slice(&1u16.to_le_bytes()); // one entry
        let value_offset = 8 + 2 + 12;
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&field_type.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&(value_offset as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn prompt_entry_is_parsed() {
        let data = tiff_le(TAG_PROMPT, FIELD_ASCII, b"Prompt:{\"3\":{}}\0");
        let (workflow, prompt) = parse(&data).unwrap();
        assert!(workflow.is_none());
        assert!(prompt.unwrap().get("3").is_some());
    }

    #[test]
    fn bad_endianness_marker_is_malformed_exif() {
        assert!(matches!(parse(b"XX\x2a\x00"), Err(ParseError::MalformedExif)));
    }

    #[test]
    fn wrong_magic_is_malformed_tiff() {
        let mut data = tiff_le(TAG_PROMPT, FIELD_ASCII, b"Prompt:{}\0");
        data[2] = 43;
        assert!(matches!(parse(&data), Err(ParseError::MalformedTiff)));
    }

    #[test]
    fn recognized_entry_with_bad_json_is_fatal() {
        let data = tiff_le(TAG_PROMPT, FIELD_ASCII, b"Prompt:not json\0");
        assert!(matches!(parse(&data), Err(ParseError::MalformedMetadata(_))));
    }

    #[test]
    fn missing_label_or_nul_is_malformed_exif() {
        let unlabelled = tiff_le(TAG_PROMPT, FIELD_ASCII, b"{\"3\":{}}\0");
        assert!(matches!(parse(&unlabelled), Err(ParseError::MalformedExif)));
        let unterminated = tiff_le(TAG_PROMPT, FIELD_ASCII, b"Prompt:{}");
        assert!(matches!(parse(&unterminated), Err(ParseError::MalformedExif)));
    }

    #[test]
    fn unknown_tags_and_field_types_are_skipped() {
        let wrong_tag = tiff_le(305, FIELD_ASCII, b"Prompt:{}\0");
        assert_eq!(parse(&wrong_tag).unwrap(), (None, None));
        let wrong_type = tiff_le(TAG_PROMPT, 3, b"Prompt:{}\0");
        assert_eq!(parse(&wrong_type).unwrap(), (None, None));
    }
}
