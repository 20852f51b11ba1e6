use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file (skips the XDG lookup).
pub const CONFIG_ENV: &str = "IMGVERIFY_CONFIG";

/// Global configuration loaded from `~/.config/imgverify/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Base URL of the image server; `/upload` and `/download/{id}` hang off it.
    pub base_url: String,
    /// Image used by `verify` when no path is given on the command line.
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,
    /// Filename declared in the multipart `file` part.
    #[serde(default = "default_upload_filename")]
    pub upload_filename: String,
    /// Content type declared in the multipart `file` part.
    #[serde(default = "default_upload_content_type")]
    pub upload_content_type: String,
    /// Where to keep the downloaded copy. None = temp file, removed after hashing.
    #[serde(default)]
    pub download_path: Option<PathBuf>,
    /// Connect timeout in seconds (None = libcurl default).
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Whole-transfer timeout in seconds (None = libcurl default, no limit).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_source_path() -> PathBuf {
    PathBuf::from("test_image.png")
}

fn default_upload_filename() -> String {
    "test_image.png".to_string()
}

fn default_upload_content_type() -> String {
    "image/png".to_string()
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            base_url: "http://image-server.com".to_string(),
            source_path: default_source_path(),
            upload_filename: default_upload_filename(),
            upload_content_type: default_upload_content_type(),
            download_path: None,
            connect_timeout_secs: None,
            timeout_secs: None,
        }
    }
}

impl VerifierConfig {
    /// Config pointing at `base_url` with every other field at its default.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(p));
    }
    let xdg_dirs = xdg::BaseDirectories::with_prefix("imgverify")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VerifierConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VerifierConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file; it must exist.
pub fn load_from_path(path: &Path) -> Result<VerifierConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: VerifierConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
