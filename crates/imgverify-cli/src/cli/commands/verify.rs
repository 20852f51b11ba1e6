//! `imgverify verify` – the round-trip check, reported line by line on stdout.

use anyhow::Result;
use imgverify_core::client::TransferError;
use imgverify_core::config::VerifierConfig;
use imgverify_core::image_id::ImageId;
use imgverify_core::verifier::{AbortReason, Progress, RoundTripVerifier, Verification};
use std::path::Path;

struct StdoutProgress;

impl Progress for StdoutProgress {
    fn uploaded(&mut self, id: &ImageId) {
        println!("Image uploaded successfully (id {})", id);
    }

    fn downloaded(&mut self, _id: &ImageId, bytes: usize, staged_at: &Path) {
        println!(
            "Image downloaded successfully ({} bytes, {})",
            bytes,
            staged_at.display()
        );
    }
}

/// Prints status code and body (or the transport error) for a failed request.
pub(super) fn print_failure(what: &str, e: &TransferError) {
    match e {
        TransferError::Status { code, body } => {
            println!("{} failed with status code: {}", what, code);
            println!("Response: {}", body);
        }
        other => println!("{} failed: {}", what, other),
    }
}

pub fn run_verify(cfg: &VerifierConfig, path: &Path) -> Result<bool> {
    let verifier = RoundTripVerifier::from_config(cfg)?;
    let outcome = verifier.verify_round_trip_with(path, &mut StdoutProgress)?;
    report(&outcome);
    Ok(outcome.is_identical())
}

fn report(outcome: &Verification) {
    match outcome {
        Verification::Identical { digest, .. } => {
            println!(
                "Verification successful: The downloaded image is identical to the original."
            );
            println!("sha256 {}", digest);
        }
        Verification::Different {
            original,
            downloaded,
            ..
        } => {
            println!(
                "Verification failed: The downloaded image is different from the original."
            );
            println!("original   sha256 {}", original);
            println!("downloaded sha256 {}", downloaded);
        }
        Verification::Aborted(AbortReason::UploadFailed(e)) => print_failure("Upload", e),
        Verification::Aborted(AbortReason::DownloadFailed { error, .. }) => {
            print_failure("Download", error)
        }
    }
}
