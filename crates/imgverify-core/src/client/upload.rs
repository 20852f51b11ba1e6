//! Multipart upload: POST `{base}/upload` with a single `file` part.

use super::error::TransferError;
use super::response::perform;
use super::ImageClient;
use crate::image_id::ImageId;
use curl::easy::{Form, List};
use std::fs;
use std::path::Path;

impl ImageClient {
    /// Uploads the file at `path` and returns the id the server assigned.
    ///
    /// The whole file is read into memory and sent as the `file` part with the
    /// configured filename and content type. Only HTTP 200 with a parseable id
    /// body counts as success.
    pub fn upload(&self, path: &Path) -> Result<ImageId, TransferError> {
        let data = fs::read(path).map_err(|source| TransferError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let len = data.len();

        let mut form = Form::new();
        form.part("file")
            .buffer(self.form.filename.as_str(), data)
            .content_type(&self.form.content_type)
            .add()?;

        let url = self.endpoints.upload_url();
        let mut easy = self.easy(url)?;
        easy.httppost(form)?;
        // No `Expect: 100-continue` round trip; send the body right away.
        let mut list = List::new();
        list.append("Expect:")?;
        easy.http_headers(list)?;

        tracing::debug!(url = %url, bytes = len, "uploading {}", path.display());
        let resp = perform(&mut easy)?;
        if resp.code != 200 {
            tracing::warn!(code = resp.code, "upload rejected");
            return Err(TransferError::Status {
                code: resp.code,
                body: resp.body_text(),
            });
        }

        let id = ImageId::from_json_body(&resp.body).map_err(TransferError::Malformed)?;
        tracing::info!(id = %id, bytes = len, "uploaded {}", path.display());
        Ok(id)
    }
}
