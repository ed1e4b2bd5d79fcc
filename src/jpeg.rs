//! Baseline JPEG dimension probing.

use log::debug;

use crate::slice_reader::SliceReader;

/// Reads the pixel dimensions out of a baseline JPEG, returning
/// `(width, height)`.
///
/// Marker segments are skipped until a start-of-frame marker
/// (`0xC0..=0xCF`) turns up, then the 1-byte precision field is skipped and
/// the big-endian height and width are read. Anything that does not scan
/// cleanly yields `None`; the caller treats that as "size unknown" rather
/// than an error.
pub fn jpeg_dimensions(data: &[u8]) -> Option<(u16, u16)> {
    let mut r = SliceReader::new(data);
    let mut segment = 2i64; // the SOI marker
    loop {
        r.seek_relative(segment).ok()?;
        let mut byte = r.read_u8().ok()?;
        while byte == 0xFF {
            byte = r.read_u8().ok()?;
        }
        let marker = byte;
        let declared = r.read_u16_be().ok()?;
        if (0xC0..=0xCF).contains(&marker) {
            r.seek_relative(1).ok()?; // precision
            let height = r.read_u16_be().ok()?;
            let width = r.read_u16_be().ok()?;
            debug!("- JPG size {width}x{height}");
            return Some((width, height));
        }
        segment = i64::from(declared.checked_sub(2)?);
    }
}
