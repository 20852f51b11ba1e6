//! Blocking HTTP client for the image server.
//!
//! Uses the curl crate (libcurl easy interface): a multipart POST to
//! `/upload` and a plain GET to `/download/{id}`. Only HTTP 200 counts as
//! success; every other outcome becomes a [`TransferError`].

mod download;
mod endpoint;
mod error;
mod response;
mod upload;

pub use download::DownloadedImage;
pub use endpoint::Endpoints;
pub use error::TransferError;
pub use response::{parse_content_disposition_filename, ResponseMeta};

use crate::config::VerifierConfig;
use anyhow::Result;
use std::time::Duration;

/// libcurl knobs shared by both requests. `None` keeps the libcurl default.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlOptions {
    pub connect_timeout: Option<Duration>,
    pub timeout: Option<Duration>,
}

/// How the `file` part of the upload form is declared.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub filename: String,
    pub content_type: String,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self {
            filename: "test_image.png".to_string(),
            content_type: "image/png".to_string(),
        }
    }
}

/// Client bound to one image server.
#[derive(Debug, Clone)]
pub struct ImageClient {
    endpoints: Endpoints,
    form: UploadForm,
    curl: CurlOptions,
}

impl ImageClient {
    pub fn new(endpoints: Endpoints, form: UploadForm, curl: CurlOptions) -> Self {
        Self {
            endpoints,
            form,
            curl,
        }
    }

    /// Builds a client from configuration; fails only on an unusable `base_url`.
    pub fn from_config(cfg: &VerifierConfig) -> Result<Self> {
        let endpoints = Endpoints::new(&cfg.base_url)?;
        let form = UploadForm {
            filename: cfg.upload_filename.clone(),
            content_type: cfg.upload_content_type.clone(),
        };
        let curl = CurlOptions {
            connect_timeout: cfg.connect_timeout_secs.map(Duration::from_secs),
            timeout: cfg.timeout_secs.map(Duration::from_secs),
        };
        Ok(Self::new(endpoints, form, curl))
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Fresh easy handle with the URL and timeouts applied.
    fn easy(&self, url: &url::Url) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        if let Some(t) = self.curl.connect_timeout {
            easy.connect_timeout(t)?;
        }
        if let Some(t) = self.curl.timeout {
            easy.timeout(t)?;
        }
        Ok(easy)
    }
}
