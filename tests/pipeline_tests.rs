//! Tests for the per-file pipeline over a temp directory.
//!
//! External collaborators (compression, gpg, ImageMagick) are left disabled
//! so these run hermetically; their plumbing is covered by the option
//! handling asserted here.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use zenstrip::pipeline::{process_image, PipelineOptions};
use zenstrip::DecodedImage;

fn options() -> PipelineOptions {
    PipelineOptions {
        keep_intermediates: false,
        compression: None,
        recipient: None,
        save_prompt: true,
        save_workflow: true,
        strip_container: true,
        rasterize: false,
        size_in_name: true,
        remove_original: false,
        jpeg_quality: 85,
    }
}

fn png_chunk(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(fourcc);
    out.extend_from_slice(payload);
    out.extend_from_slice(&[0; 4]);
    out
}

fn test_png(prompt: Option<&str>, parameters: Option<&str>) -> Vec<u8> {
    let mut out = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&2u32.to_be_bytes());
    ihdr.extend_from_slice(&2u32.to_be_bytes());
    ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);
    out.extend_from_slice(&png_chunk(b"IHDR", &ihdr));
    for (keyword, value) in [("prompt", prompt), ("parameters", parameters)] {
        if let Some(value) = value {
            let mut payload = keyword.as_bytes().to_vec();
            payload.push(0);
            payload.extend_from_slice(value.as_bytes());
            out.extend_from_slice(&png_chunk(b"tEXt", &payload));
        }
    }
    out.extend_from_slice(&png_chunk(b"IEND", &[]));
    out
}

#[test]
fn artifacts_and_stripped_copy_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("img.png");
    let prompt_json = r#"{"3":{"inputs":{"seed":7}}}"#;
    fs::write(&source, test_png(Some(prompt_json), Some("Steps: 20"))).unwrap();

    process_image(&source, &options()).unwrap();

    // Prompt saved as indented JSON.
    let saved: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("img_prompt.json")).unwrap())
            .unwrap();
    assert_eq!(saved, json!({"3": {"inputs": {"seed": 7}}}));

    // Bare-string parameters saved as plain text.
    assert_eq!(
        fs::read_to_string(dir.path().join("img_param.txt")).unwrap(),
        "Steps: 20"
    );

    // No workflow in the source, no workflow artifact.
    assert!(!dir.path().join("img_workflow.json").exists());

    // Stripped copy named with seed and size, decodable, metadata-free.
    let stripped = dir.path().join("img_7_2x2_no_prompt.png");
    let clean = fs::read(&stripped).unwrap();
    let image = DecodedImage::decode(&clean).unwrap();
    assert_eq!((image.width(), image.height()), (2, 2));
    assert!(image.metadata().prompt.is_none());
    assert!(image.metadata().parameters.is_none());

    // The original stays put without --remove.
    assert!(source.exists());
}

#[test]
fn no_strip_flag_suppresses_the_stripped_copy() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("img.png");
    fs::write(&source, test_png(Some(r#"{"1":{}}"#), None)).unwrap();

    let opts = PipelineOptions { strip_container: false, ..options() };
    process_image(&source, &opts).unwrap();

    assert!(dir.path().join("img_prompt.json").exists());
    assert!(no_file_matching(dir.path(), "_no_prompt"));
}

#[test]
fn parameters_alone_do_not_trigger_a_rewrite() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("img.png");
    fs::write(&source, test_png(None, Some("Steps: 20"))).unwrap();

    process_image(&source, &options()).unwrap();

    assert!(dir.path().join("img_param.txt").exists());
    assert!(no_file_matching(dir.path(), "_no_prompt"));
}

#[test]
fn remove_flag_deletes_the_original_after_the_copy_exists() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("img.png");
    fs::write(&source, test_png(Some(r#"{"1":{}}"#), None)).unwrap();

    let opts = PipelineOptions { remove_original: true, size_in_name: false, ..options() };
    process_image(&source, &opts).unwrap();

    assert!(dir.path().join("img_no_prompt.png").exists());
    assert!(!source.exists());
}

#[test]
fn undecodable_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("img.png");
    fs::write(&source, b"GIF89a not an image").unwrap();

    assert!(process_image(&source, &options()).is_err());
    assert!(no_file_matching(dir.path(), "_no_prompt"));
}

fn no_file_matching(dir: &Path, needle: &str) -> bool {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .all(|entry| !entry.file_name().to_string_lossy().contains(needle))
}
