//! `imgverify upload` – upload only.

use anyhow::Result;
use imgverify_core::client::ImageClient;
use imgverify_core::config::VerifierConfig;
use std::path::Path;

pub fn run_upload(cfg: &VerifierConfig, path: &Path) -> Result<bool> {
    let client = ImageClient::from_config(cfg)?;
    match client.upload(path) {
        Ok(id) => {
            println!("{}", id);
            Ok(true)
        }
        Err(e) if e.is_local_io() => Err(e.into()),
        Err(e) => {
            super::verify::print_failure("Upload", &e);
            Ok(false)
        }
    }
}
