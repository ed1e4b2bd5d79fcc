//! The per-file processing chain.
//!
//! For each image this runs decode → persist artifacts → compress → encrypt
//! → strip → rasterize, with every stage after decoding degrading
//! gracefully: a failed collaborator is logged and the chain carries on with
//! the artifact it already has.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use serde_json::Value;
use thiserror::Error;

use crate::container::{DecodedImage, ParseError};
use crate::jpeg::jpeg_dimensions;
use crate::seed::find_seed;
use crate::tools::{self, Compressor};

/// Errors that stop the pipeline for one file. The batch driver logs them
/// and moves on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The container failed to decode.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Reading the source or writing an artifact failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options controlling the per-file pipeline, mirroring the CLI flags.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Keep the inputs of intermediate steps instead of removing them.
    pub keep_intermediates: bool,
    /// Compression tool for saved artifacts; `None` disables compression.
    pub compression: Option<Compressor>,
    /// GPG recipient for saved artifacts; `None` disables encryption.
    pub recipient: Option<String>,
    /// Persist the prompt document.
    pub save_prompt: bool,
    /// Persist the workflow document.
    pub save_workflow: bool,
    /// Write the metadata-stripped copy of the container.
    pub strip_container: bool,
    /// Rasterize the stripped copy to JPEG.
    pub rasterize: bool,
    /// Include `_<width>x<height>` in the output name.
    pub size_in_name: bool,
    /// Remove the original file once its outputs are written.
    pub remove_original: bool,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

/// Runs the full chain for one PNG or WebP file.
pub fn process_image(path: &Path, opts: &PipelineOptions) -> Result<(), PipelineError> {
    let data = fs::read(path)?;
    let image = DecodedImage::decode(&data)?;
    let meta = image.metadata();

    // Persist each extracted document, then push it through the
    // compress/encrypt chain.
    if opts.save_prompt {
        secure_artifact(save_text(path, "prompt", meta.prompt.as_ref()), opts);
    }
    if opts.save_workflow {
        secure_artifact(save_text(path, "workflow", meta.workflow.as_ref()), opts);
    }
    secure_artifact(save_text(path, "param", meta.parameters.as_ref()), opts);

    let seed = find_seed(meta.prompt.as_ref());
    if let Some(seed) = seed {
        info!("found seed {seed}");
    }

    let has_metadata = meta.prompt.is_some() || meta.workflow.is_some();
    if has_metadata && opts.strip_container {
        let out = stripped_image_path(path, seed, image.width(), image.height(), opts.size_in_name);
        fs::write(&out, image.rewrite())?;
        info!("wrote {}", out.display());
        if opts.rasterize {
            tools::rasterize_to_jpeg(&out, opts.jpeg_quality, opts.keep_intermediates, None);
        }
        if opts.remove_original {
            if let Err(err) = fs::remove_file(path) {
                error!("failed to remove {}: {err}", path.display());
            }
        }
    }
    Ok(())
}

/// Re-encodes an existing JPEG, embedding its dimensions into the name.
pub fn process_jpeg(path: &Path, opts: &PipelineOptions) -> Result<(), PipelineError> {
    let data = fs::read(path)?;
    match jpeg_dimensions(&data) {
        Some((width, height)) => {
            let out = derived_path(path, &format!("_{width}x{height}"), "jpg");
            tools::rasterize_to_jpeg(path, opts.jpeg_quality, !opts.remove_original, Some(out));
        }
        None => info!("- skipping JPG with unknown size"),
    }
    Ok(())
}

/// Writes one extracted value next to the source file.
///
/// Prompt and workflow become `_prompt.json` / `_workflow.json` (indented
/// JSON); parameters become `_param.txt`, written raw when the value is a
/// bare string. Returns the path written, or `None` when there was nothing
/// to save or the write failed.
fn save_text(source: &Path, kind: &str, value: Option<&Value>) -> Option<PathBuf> {
    let value = value?;
    let ext = if kind == "param" { "txt" } else { "json" };
    let path = derived_path(source, &format!("_{kind}"), ext);
    debug!("writing `{kind}` to `{}`", path.display());
    let contents = match value {
        Value::String(text) if ext == "txt" => text.clone(),
        other => serde_json::to_string_pretty(other).ok()?,
    };
    match fs::write(&path, contents) {
        Ok(()) => Some(path),
        Err(err) => {
            error!("failed to write {}: {err}", path.display());
            None
        }
    }
}

/// Pushes one saved artifact through the compress → encrypt chain. Either
/// stage failing (or being disabled) hands the previous path onward.
fn secure_artifact(path: Option<PathBuf>, opts: &PipelineOptions) {
    let Some(path) = path else { return };
    let compressed = match &opts.compression {
        Some(compressor) => {
            tools::compress(&path, opts.keep_intermediates, compressor).unwrap_or(path)
        }
        None => path,
    };
    if let Some(recipient) = &opts.recipient {
        tools::encrypt(&compressed, recipient, opts.keep_intermediates);
    }
}

/// Inserts `suffix` before a fresh extension: `img.png` → `img<suffix>.<ext>`.
fn derived_path(source: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}{suffix}.{ext}"))
}

/// Derives the stripped-image name: optional `_<seed>`, optional
/// `_<width>x<height>`, then the mandatory `_no_prompt`, all inserted
/// before the original extension.
fn stripped_image_path(
    source: &Path,
    seed: Option<u64>,
    width: u32,
    height: u32,
    size_in_name: bool,
) -> PathBuf {
    let mut suffix = String::new();
    if let Some(seed) = seed {
        suffix.push_str(&format!("_{seed}"));
    }
    if size_in_name {
        suffix.push_str(&format!("_{width}x{height}"));
    }
    suffix.push_str("_no_prompt");
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    derived_path(source, &suffix, &ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_insert_suffix_before_extension() {
        assert_eq!(
            derived_path(Path::new("/tmp/img.png"), "_prompt", "json"),
            PathBuf::from("/tmp/img_prompt.json")
        );
        assert_eq!(
            derived_path(Path::new("render.webp"), "_param", "txt"),
            PathBuf::from("render_param.txt")
        );
    }

    #[test]
    fn stripped_name_orders_seed_size_and_marker() {
        assert_eq!(
            stripped_image_path(Path::new("a.png"), Some(7), 2, 2, true),
            PathBuf::from("a_7_2x2_no_prompt.png")
        );
        assert_eq!(
            stripped_image_path(Path::new("a.png"), None, 2, 2, false),
            PathBuf::from("a_no_prompt.png")
        );
        assert_eq!(
            stripped_image_path(Path::new("b.webp"), None, 640, 480, true),
            PathBuf::from("b_640x480_no_prompt.webp")
        );
    }
}
