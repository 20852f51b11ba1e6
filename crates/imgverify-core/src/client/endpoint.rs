//! Endpoint URLs derived from the configured base URL.

use crate::image_id::ImageId;
use anyhow::{Context, Result};
use url::Url;

#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    upload: Url,
}

impl Endpoints {
    /// Validates `base_url` (http/https, hierarchical) and derives the upload URL.
    /// A path prefix on the base is kept: `http://h/api` uploads to `http://h/api/upload`.
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url.trim())
            .with_context(|| format!("invalid base URL {:?}", base_url))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            anyhow::bail!("base URL must be http or https: {}", base);
        }
        if base.cannot_be_a_base() {
            anyhow::bail!("base URL cannot carry a path: {}", base);
        }
        let upload = join_segments(&base, &["upload"]);
        Ok(Self { base, upload })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn upload_url(&self) -> &Url {
        &self.upload
    }

    /// `{base}/download/{id}` with the id percent-encoded as one path segment.
    pub fn download_url(&self, id: &ImageId) -> Url {
        join_segments(&self.base, &["download", id.as_str()])
    }
}

fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}
