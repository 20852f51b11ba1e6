//! Hash the source, upload, download, hash the copy, compare.
//!
//! Server-side failures end the run with [`Verification::Aborted`]; a broken
//! local setup (unreadable source, unwritable staging path) is returned as `Err`.

use crate::checksum::{self, ContentDigest};
use crate::client::{ImageClient, TransferError};
use crate::config::VerifierConfig;
use crate::image_id::ImageId;
use crate::stage;
use anyhow::{bail, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Why a round trip stopped before the comparison.
#[derive(Debug)]
pub enum AbortReason {
    UploadFailed(TransferError),
    DownloadFailed { id: ImageId, error: TransferError },
}

impl AbortReason {
    pub fn error(&self) -> &TransferError {
        match self {
            AbortReason::UploadFailed(e) => e,
            AbortReason::DownloadFailed { error, .. } => error,
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::UploadFailed(e) => write!(f, "upload failed: {}", e),
            AbortReason::DownloadFailed { id, error } => {
                write!(f, "download of {} failed: {}", id, error)
            }
        }
    }
}

/// Outcome of one round trip.
#[derive(Debug)]
pub enum Verification {
    Identical {
        id: ImageId,
        digest: ContentDigest,
        bytes: usize,
    },
    Different {
        id: ImageId,
        original: ContentDigest,
        downloaded: ContentDigest,
    },
    Aborted(AbortReason),
}

impl Verification {
    pub fn is_identical(&self) -> bool {
        matches!(self, Verification::Identical { .. })
    }

    /// Id assigned by the server, if the upload got that far.
    pub fn image_id(&self) -> Option<&ImageId> {
        match self {
            Verification::Identical { id, .. } | Verification::Different { id, .. } => Some(id),
            Verification::Aborted(AbortReason::DownloadFailed { id, .. }) => Some(id),
            Verification::Aborted(AbortReason::UploadFailed(_)) => None,
        }
    }
}

/// Step notifications, so a front end can print progress as it happens.
pub trait Progress {
    fn uploaded(&mut self, _id: &ImageId) {}
    fn downloaded(&mut self, _id: &ImageId, _bytes: usize, _staged_at: &Path) {}
}

/// No-op progress sink.
impl Progress for () {}

pub struct RoundTripVerifier {
    client: ImageClient,
    keep_download_at: Option<PathBuf>,
}

impl RoundTripVerifier {
    pub fn new(client: ImageClient) -> Self {
        Self {
            client,
            keep_download_at: None,
        }
    }

    pub fn from_config(cfg: &VerifierConfig) -> Result<Self> {
        let client = ImageClient::from_config(cfg)?;
        Ok(Self::new(client).keep_download_at(cfg.download_path.clone()))
    }

    /// Keep the downloaded copy at `path` instead of a throwaway temp file.
    pub fn keep_download_at(mut self, path: Option<PathBuf>) -> Self {
        self.keep_download_at = path;
        self
    }

    pub fn client(&self) -> &ImageClient {
        &self.client
    }

    pub fn verify_round_trip(&self, local_path: &Path) -> Result<Verification> {
        self.verify_round_trip_with(local_path, &mut ())
    }

    /// Like [`verify_round_trip`](Self::verify_round_trip), reporting each completed step to `progress`.
    pub fn verify_round_trip_with(
        &self,
        local_path: &Path,
        progress: &mut dyn Progress,
    ) -> Result<Verification> {
        if let Some(keep) = self.keep_download_at.as_deref() {
            if stage::is_same_file(keep, local_path) {
                bail!(
                    "refusing to keep the download at {}: it is the source image",
                    keep.display()
                );
            }
        }
        // Source digest is taken before anything is written to disk.
        let original = checksum::sha256_path(local_path)?;

        let id = match self.client.upload(local_path) {
            Ok(id) => id,
            Err(e) if e.is_local_io() => return Err(e.into()),
            Err(e) => {
                tracing::warn!("round trip aborted: upload failed: {}", e);
                return Ok(Verification::Aborted(AbortReason::UploadFailed(e)));
            }
        };
        progress.uploaded(&id);

        let image = match self.client.download(&id) {
            Ok(image) => image,
            Err(error) => {
                tracing::warn!("round trip aborted: download of {} failed: {}", id, error);
                return Ok(Verification::Aborted(AbortReason::DownloadFailed {
                    id,
                    error,
                }));
            }
        };

        let staged = stage::stage_bytes(&image.bytes, self.keep_download_at.as_deref())?;
        progress.downloaded(&id, image.len(), staged.path());

        let downloaded = checksum::sha256_path(staged.path())?;

        if original == downloaded {
            tracing::info!(id = %id, digest = %original, "round trip identical");
            Ok(Verification::Identical {
                id,
                digest: original,
                bytes: image.len(),
            })
        } else {
            tracing::warn!(
                id = %id,
                original = %original,
                downloaded = %downloaded,
                "round trip mismatch"
            );
            Ok(Verification::Different {
                id,
                original,
                downloaded,
            })
        }
    }
}
