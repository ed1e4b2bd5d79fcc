//! Extraction and removal of AI generation metadata from PNG and WebP
//! containers.
//!
//! ComfyUI and the WebUI family of tools embed the prompt graph, the full
//! workflow, and a free-text parameter block inside the images they
//! generate: PNG carries them as `tEXt` chunks, WebP as ASCII entries of a
//! TIFF directory smuggled into an `EXIF` chunk. This crate decodes either
//! container at the chunk level, exposes that metadata as
//! [`serde_json::Value`]s, and reassembles a valid container with the
//! metadata chunks elided. Pixel data is never decoded or re-encoded.
//!
//! # Example
//!
//! ```rust,no_run
//! use zenstrip::DecodedImage;
//!
//! let data = std::fs::read("render.png")?;
//! let image = DecodedImage::decode(&data)?;
//! println!("{}x{}", image.width(), image.height());
//! if let Some(seed) = zenstrip::find_seed(image.metadata().prompt.as_ref()) {
//!     println!("seed: {seed}");
//! }
//! std::fs::write("render_no_prompt.png", image.rewrite())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! For one-shot use there are convenience functions in [`metadata`], and the
//! `zenstrip` binary (behind the default `cli` feature) drives the whole
//! save/compress/encrypt/strip pipeline over a batch of files.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod container;
pub mod jpeg;
pub mod metadata;
pub mod pipeline;
pub mod tools;

mod seed;
mod slice_reader;
mod vec_writer;

pub use container::{DecodedImage, ImageFormat, ImageMetadata, ParseError, RiffChunk};
pub use seed::find_seed;
