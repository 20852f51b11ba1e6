//! `imgverify download` – fetch an image by id and save it.

use anyhow::{Context, Result};
use imgverify_core::client::ImageClient;
use imgverify_core::config::VerifierConfig;
use imgverify_core::image_id::ImageId;
use imgverify_core::stage;
use std::path::{Path, PathBuf};

pub fn run_download(cfg: &VerifierConfig, id: &str, out: Option<&Path>) -> Result<bool> {
    let id = ImageId::new(id).context("image id must not be empty")?;
    let client = ImageClient::from_config(cfg)?;
    let image = match client.download(&id) {
        Ok(image) => image,
        Err(e) => {
            super::verify::print_failure("Download", &e);
            return Ok(false);
        }
    };

    // An explicit --out may overwrite; a server-suggested name never does.
    let target = match out {
        Some(p) => p.to_path_buf(),
        None => first_free_path(default_output_name(&id, image.filename())),
    };
    stage::stage_bytes(&image.bytes, Some(&target))?;
    println!("{} bytes -> {}", image.len(), target.display());
    Ok(true)
}

/// Server-suggested filename if any, else `<id>.bin`, in the current directory.
pub(crate) fn default_output_name(id: &ImageId, suggested: Option<String>) -> PathBuf {
    PathBuf::from(suggested.unwrap_or_else(|| format!("{}.bin", id)))
}

/// `name.png`, or `name.1.png`, `name.2.png`, ... if taken.
pub(crate) fn first_free_path(candidate: PathBuf) -> PathBuf {
    if !candidate.exists() {
        return candidate;
    }
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = candidate
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut n = 1u32;
    loop {
        let next = candidate.with_file_name(format!("{}.{}{}", stem, n, ext));
        if !next.exists() {
            return next;
        }
        n += 1;
    }
}
