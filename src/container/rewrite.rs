//! Reassembling containers with the metadata chunks removed.

use super::png::PNG_SIGNATURE;
use super::RiffChunk;
use crate::vec_writer::VecWriter;

/// Re-walks a PNG buffer, copying every chunk except `tEXt` verbatim.
///
/// Each kept chunk is copied whole: length header, type, payload, and CRC
/// trailer, so no checksum ever needs recomputing. Copying stops after
/// `IEND`; anything behind it is discarded.
pub(super) fn strip_png(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    out.write_all(&PNG_SIGNATURE);

    let mut offset = PNG_SIGNATURE.len();
    while offset + 8 <= data.len() {
        let length =
            u32::from_be_bytes(data[offset..offset + 4].try_into().unwrap()) as usize;
        let fourcc = &data[offset + 4..offset + 8];
        let total = length + 12;
        if fourcc != b"tEXt" {
            let end = (offset + total).min(data.len());
            out.write_all(&data[offset..end]);
            if fourcc == b"IEND" {
                break;
            }
        }
        offset += total;
    }
    out
}

/// Emits a RIFF/WEBP container holding exactly the kept chunks, in order.
///
/// The declared RIFF length covers the `WEBP` tag plus every chunk header
/// and payload. Stray padding absorbed during decoding stays inside the
/// chunk that absorbed it; no padding byte is re-inserted between chunks.
pub(super) fn assemble_webp(chunks: &[RiffChunk<'_>]) -> Vec<u8> {
    let riff_len: u32 = 4 + chunks
        .iter()
        .map(|chunk| chunk.payload.len() as u32 + 8)
        .sum::<u32>();

    let mut out = Vec::with_capacity(riff_len as usize + 8);
    out.write_all(b"RIFF");
    out.write_u32_le(riff_len);
    out.write_all(b"WEBP");
    for chunk in chunks {
        out.write_all(&chunk.fourcc);
        out.write_u32_le(chunk.payload.len() as u32);
        out.write_all(&chunk.payload);
    }
    out
}
