//! WebP RIFF chunk-stream decoding.
//!
//! A WebP is a 12-byte `RIFF <len> WEBP` header followed by chunks of
//! 4-byte ASCII type, little-endian length, and payload. The decoder keeps
//! every chunk except `EXIF` (which is consumed as metadata) and reads the
//! canvas dimensions out of `VP8X` when one is present.

use std::borrow::Cow;

use log::debug;

use super::{exif, DecodedImage, ImageMetadata, ParseError, Repr, RiffChunk};
use crate::slice_reader::SliceReader;

/// Walks the RIFF chunk stream, collecting kept chunks and metadata.
pub(super) fn decode(data: &[u8]) -> Result<DecodedImage<'_>, ParseError> {
    if data.len() < 12 || &data[8..12] != b"WEBP" {
        return Err(ParseError::NotPngOrWebp);
    }
    let mut r = SliceReader::new(data);
    r.seek_from_start(12)?;

    let mut chunks: Vec<RiffChunk<'_>> = Vec::new();
    let mut meta = ImageMetadata::default();

    while r.remaining() > 0 {
        // Compatibility shim, not RIFF padding: some writers emit a lone
        // zero byte before a chunk tag (real RIFF padding is chunk-trailing
        // and size-even). Absorb it into the previous chunk's payload and
        // recorded length so it never becomes a phantom chunk.
        if r.peek_u8()? == 0 {
            let Some(last) = chunks.last_mut() else {
                return Err(ParseError::InvalidFormat("stray padding before the first chunk"));
            };
            r.seek_relative(1)?;
            last.payload.to_mut().push(0);
            continue;
        }

        let mut fourcc = [0u8; 4];
        r.read_exact(&mut fourcc)?;
        let size = r.read_u32_le()? as usize;
        let payload = r.take_slice(size)?;
        debug!("- chunk {} ({size})", String::from_utf8_lossy(&fourcc));

        if fourcc == *b"EXIF" {
            // Consumed as metadata; excluded from any rewritten output.
            let (workflow, prompt) = exif::parse(payload)?;
            meta.workflow = workflow;
            meta.prompt = prompt;
        } else {
            if fourcc == *b"VP8X" {
                let mut p = SliceReader::new(payload);
                p.seek_from_start(4)?; // flags + reserved
                meta.width = p.read_u24_le()? + 1;
                meta.height = p.read_u24_le()? + 1;
                debug!("  - size {}x{}", meta.width, meta.height);
            }
            chunks.push(RiffChunk { fourcc, payload: Cow::Borrowed(payload) });
        }
    }

    Ok(DecodedImage { repr: Repr::Webp(chunks), meta })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = fourcc.to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn webp(body: &[u8]) -> Vec<u8> {
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
        out.extend_from_slice(b"WEBP");
        out.extend_from_slice(body);
        out
    }

    /// Pinned to the byte pattern seen in the wild: `ICCP` with a 3-byte
    /// payload, one stray `0x00`, then the next chunk tag.
    #[test]
    fn stray_zero_is_absorbed_into_the_previous_chunk() {
        let mut body = chunk(b"ICCP", &[0xAA, 0xBB, 0xCC]);
        body.push(0x00);
        body.extend_from_slice(&chunk(b"VP8 ", &[0x11, 0x22]));
        let data = webp(&body);

        let image = decode(&data).unwrap();
        let Repr::Webp(chunks) = &image.repr else { panic!("webp repr expected") };
        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[0].fourcc, b"ICCP");
        assert_eq!(chunks[0].payload.as_ref(), &[0xAA, 0xBB, 0xCC, 0x00]);
        assert_eq!(&chunks[1].fourcc, b"VP8 ");
        assert_eq!(chunks[1].payload.as_ref(), &[0x11, 0x22]);
    }

    #[test]
    fn stray_zero_before_any_chunk_is_rejected() {
        let mut body = vec![0x00];
        body.extend_from_slice(&chunk(b"VP8 ", &[0x11]));
        let err = decode(&webp(&body)).unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));
    }

    #[test]
    fn vp8x_dimensions_are_one_plus_u24() {
        let mut payload = vec![0u8; 4];
        payload.extend_from_slice(&[0x3F, 0x01, 0x00]); // width - 1 = 0x013F
        payload.extend_from_slice(&[0xCF, 0x00, 0x00]); // height - 1 = 0x00CF
        let data = webp(&chunk(b"VP8X", &payload));

        let image = decode(&data).unwrap();
        assert_eq!(image.width(), 320);
        assert_eq!(image.height(), 208);
    }

    #[test]
    fn missing_vp8x_leaves_dimensions_at_zero() {
        let data = webp(&chunk(b"VP8 ", &[0x11, 0x22, 0x33]));
        let image = decode(&data).unwrap();
        assert_eq!(image.width(), 0);
        assert_eq!(image.height(), 0);
    }
}
