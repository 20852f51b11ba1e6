//! Download: GET `{base}/download/{id}`, body returned in memory.

use super::error::TransferError;
use super::response::{perform, ResponseMeta};
use super::ImageClient;
use crate::image_id::ImageId;

/// Body of a successful download plus what the server said about it.
#[derive(Debug, Clone)]
pub struct DownloadedImage {
    pub bytes: Vec<u8>,
    pub meta: ResponseMeta,
}

impl DownloadedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Filename suggested via Content-Disposition, if any.
    pub fn filename(&self) -> Option<String> {
        self.meta.filename()
    }
}

impl ImageClient {
    /// Fetches the image stored under `id`. Non-200 answers are errors, and a
    /// body cut short of the announced Content-Length is `Malformed`.
    pub fn download(&self, id: &ImageId) -> Result<DownloadedImage, TransferError> {
        let url = self.endpoints.download_url(id);
        let mut easy = self.easy(&url)?;
        easy.follow_location(true)?;

        tracing::debug!(url = %url, "downloading {}", id);
        let resp = perform(&mut easy).map_err(|e| {
            if e.is_partial_file() {
                TransferError::Malformed(format!("partial transfer: {}", e))
            } else {
                TransferError::Transport(e)
            }
        })?;
        if resp.code != 200 {
            tracing::warn!(code = resp.code, "download of {} rejected", id);
            return Err(TransferError::Status {
                code: resp.code,
                body: resp.body_text(),
            });
        }

        let meta = ResponseMeta::from_lines(&resp.headers);

        tracing::info!(
            id = %id,
            bytes = resp.body.len(),
            content_type = meta.content_type.as_deref().unwrap_or("-"),
            "downloaded"
        );
        Ok(DownloadedImage {
            bytes: resp.body,
            meta,
        })
    }
}
