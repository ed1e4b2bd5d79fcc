//! External-tool collaborators: compression, encryption, rasterization.
//!
//! Everything here shells out: `lzma`/`bzip2`/`gzip` for compression, `gpg`
//! for encryption, ImageMagick `convert` for JPEG output. Every call is
//! synchronous and all-or-nothing: it either leaves the expected sibling
//! file behind and returns its path, or logs the failure and returns `None`
//! so the caller can carry on with the unprocessed artifact.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, error};

/// A compression tool discovered on `PATH`, with its output suffix.
#[derive(Debug, Clone)]
pub struct Compressor {
    /// Executable name: `lzma`, `bzip2`, or `gzip`.
    pub tool: &'static str,
    /// Suffix the tool appends: `lzma`, `bz2`, or `gz`.
    pub ext: &'static str,
}

/// Finds the best available compression tool, preferring `lzma`, then
/// `bzip2`, then `gzip`. `None` disables compression for the run.
pub fn compression_tool() -> Option<Compressor> {
    const CANDIDATES: [(&str, &str); 3] = [("lzma", "lzma"), ("bzip2", "bz2"), ("gzip", "gz")];
    for (tool, ext) in CANDIDATES {
        if which(tool) {
            return Some(Compressor { tool, ext });
        }
        error!("no {tool} tool installed");
    }
    error!("disabling compression");
    None
}

/// Checks that `gpg` exists and holds a key for `recipient`.
pub fn gpg_can_encrypt_to(recipient: &str) -> bool {
    if !which("gpg") {
        error!("no gpg tool installed, disabling cypher");
        return false;
    }
    match Command::new("gpg").arg("--list-keys").output() {
        Ok(out) if out.status.success() => {
            if String::from_utf8_lossy(&out.stdout).contains(recipient) {
                true
            } else {
                error!("`{recipient}` doesn't have a key in gpg, provide another with --email");
                false
            }
        }
        _ => {
            error!("gpg --list-keys failed, disabling cypher");
            false
        }
    }
}

/// Compresses `path` in place (`<tool> -9 -k <path>`), returning the
/// compressed sibling. The input is removed afterwards unless `keep`.
pub fn compress(path: &Path, keep: bool, compressor: &Compressor) -> Option<PathBuf> {
    let output = suffixed(path, compressor.ext);
    remove_if_exists(&output);
    if !run(Command::new(compressor.tool).args(["-9", "-k"]).arg(path)) {
        return None;
    }
    debug!("compressed {} to {}", path.display(), output.display());
    if !keep {
        remove_if_exists(path);
    }
    Some(output)
}

/// Encrypts `path` for `recipient` with gpg, returning the `.gpg` sibling.
/// The input is removed afterwards unless `keep`.
pub fn encrypt(path: &Path, recipient: &str, keep: bool) -> Option<PathBuf> {
    let output = suffixed(path, "gpg");
    remove_if_exists(&output);
    let ok = run(Command::new("gpg")
        .args(["-e", "-r", recipient, "-o"])
        .arg(&output)
        .arg(path));
    if !ok {
        return None;
    }
    debug!("cyphered {} to {}", path.display(), output.display());
    if !keep {
        remove_if_exists(path);
    }
    Some(output)
}

/// Converts `path` to a JPEG via ImageMagick at the given quality (1-100).
/// `out` overrides the default name (the extension swapped for `.jpg`).
/// The input is removed afterwards unless `keep`.
pub fn rasterize_to_jpeg(
    path: &Path,
    quality: u8,
    keep: bool,
    out: Option<PathBuf>,
) -> Option<PathBuf> {
    let output = out.unwrap_or_else(|| path.with_extension("jpg"));
    let ok = run(Command::new("convert")
        .arg(path)
        .args(["-quality", &quality.to_string()])
        .arg(&output));
    if !ok {
        return None;
    }
    debug!(
        "converted {} to {} with quality {quality}%",
        path.display(),
        output.display()
    );
    if !keep {
        remove_if_exists(path);
    }
    Some(output)
}

/// Appends `.ext` to the full file name: `a.json` → `a.json.gz`.
fn suffixed(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{ext}"));
    PathBuf::from(name)
}

/// Deletes a file if it exists; only logs on failure.
fn remove_if_exists(path: &Path) {
    if path.is_file() {
        if let Err(err) = std::fs::remove_file(path) {
            error!("failed to remove {}: {err}", path.display());
        }
    }
}

/// Runs a collaborator command, logging any failure.
fn run(command: &mut Command) -> bool {
    debug!("running {command:?}");
    match command.status() {
        Ok(status) if status.success() => true,
        Ok(status) => {
            error!("{command:?} exited with {status}");
            false
        }
        Err(err) => {
            error!("error running {command:?}: {err}");
            false
        }
    }
}

/// Checks whether `name` resolves to a file on `PATH`.
fn which(name: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(name).is_file())
}
