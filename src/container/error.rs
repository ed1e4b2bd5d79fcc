//! Error types for container decoding.

use thiserror::Error;

/// Errors that can occur while decoding a PNG or WebP container.
///
/// All of these are fatal for the file at hand; batch callers log them and
/// move on to the next file. Recoverable oddities (unrecognized `tEXt`
/// keywords, unknown IFD entries, a PNG text payload that is not JSON) are
/// logged instead of reported here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The buffer carries neither a PNG signature nor a RIFF/WEBP header.
    #[error("not a PNG or WebP file")]
    NotPngOrWebp,

    /// A PNG stream ended without ever declaring an `IHDR` chunk.
    #[error("broken PNG, no IHDR chunk")]
    BrokenContainer,

    /// The PNG `pHYs` chunk declares different X and Y densities.
    #[error("PNG with different resolution for X and Y ({x} {y})")]
    UnsupportedResolution {
        /// Declared X density, in pixels per unit.
        x: u32,
        /// Declared Y density, in pixels per unit.
        y: u32,
    },

    /// The PNG `pHYs` unit specifier is something other than meters.
    #[error("PNG with unknown units ({0})")]
    UnsupportedUnits(u8),

    /// The WebP `EXIF` payload has no TIFF endianness marker, or a
    /// recognized entry is missing its label prefix or trailing NUL.
    #[error("malformed EXIF payload")]
    MalformedExif,

    /// The TIFF magic number is not 42.
    #[error("malformed TIFF data")]
    MalformedTiff,

    /// A recognized IFD metadata entry failed the mandatory JSON parse.
    #[error("metadata entry is not valid JSON: {0}")]
    MalformedMetadata(#[from] serde_json::Error),

    /// The buffer ended in the middle of a declared structure.
    #[error("unexpected end of data")]
    Truncated,

    /// Any other structural fault in the container layout.
    #[error("invalid container: {0}")]
    InvalidFormat(&'static str),
}
