//! Batch driver: extract generation metadata from PNG/WebP files, persist
//! and secure it, and write metadata-free copies.

use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

use zenstrip::pipeline::{self, PipelineOptions};
use zenstrip::tools;

/// Default JPEG quality for the rasterized output.
const DEFAULT_QUALITY: u8 = 85;
/// Default GPG recipient; override with `--email` or `RECIPIENT_EMAIL`.
const DEFAULT_RECIPIENT: &str = "archivist@example.com";

/// Extracts ComfyUI prompt and workflows from PNG and WebP images.
///
/// The JSON files are compressed and cyphered, a copy of the image is saved
/// without the prompt/workflow and compressed to JPG, and if a seed is
/// found it is added to the name. The original file remains untouched.
#[derive(Debug, Parser)]
#[command(name = "zenstrip", version)]
struct Args {
    /// List of file names to process.
    files: Vec<PathBuf>,

    /// E-mail for the GPG key.
    #[arg(long)]
    email: Option<String>,

    /// Don't remove the outputs of previous steps.
    #[arg(long)]
    keep: bool,

    /// Don't compress the JSON files.
    #[arg(long)]
    no_compress: bool,

    /// Don't cypher the JSON files.
    #[arg(long)]
    no_cypher: bool,

    /// Don't compress the stripped image to JPG.
    #[arg(long)]
    no_jpg: bool,

    /// Don't create an image without the prompt.
    #[arg(long)]
    no_png: bool,

    /// Don't save the prompt.
    #[arg(long)]
    no_prompt: bool,

    /// Don't include the size in the output name.
    #[arg(long)]
    no_size_in_name: bool,

    /// Don't save the workflow.
    #[arg(long)]
    no_workflow: bool,

    /// Remove original files.
    #[arg(long)]
    remove: bool,

    /// JPG quality.
    #[arg(long, default_value_t = DEFAULT_QUALITY)]
    quality: u8,

    /// No progress information.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show debug info.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.quiet {
        "warn"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.files.is_empty() {
        error!("no files to process");
        std::process::exit(2);
    }

    let recipient = args
        .email
        .clone()
        .or_else(|| std::env::var("RECIPIENT_EMAIL").ok())
        .unwrap_or_else(|| DEFAULT_RECIPIENT.to_string());

    // Probe the collaborators once per run; a missing tool disables its
    // stage for every file.
    let compression = if args.no_compress { None } else { tools::compression_tool() };
    let recipient = if args.no_cypher || !tools::gpg_can_encrypt_to(&recipient) {
        None
    } else {
        Some(recipient)
    };

    let opts = PipelineOptions {
        keep_intermediates: args.keep,
        compression,
        recipient,
        save_prompt: !args.no_prompt,
        save_workflow: !args.no_workflow,
        strip_container: !args.no_png,
        rasterize: !args.no_jpg,
        size_in_name: !args.no_size_in_name,
        remove_original: args.remove,
        jpeg_quality: args.quality,
    };

    for file in &args.files {
        info!("processing file: {}", file.display());
        if !file.is_file() {
            info!("- missing or not a file");
            continue;
        }
        let ext = file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let result = match ext.as_deref() {
            Some("png") | Some("webp") => pipeline::process_image(file, &opts),
            Some("jpg") => pipeline::process_jpeg(file, &opts),
            _ => {
                info!("- skipping unknown extension");
                Ok(())
            }
        };
        if let Err(err) = result {
            error!("{}: {err}", file.display());
        }
    }
}
