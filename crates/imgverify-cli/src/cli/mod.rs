//! CLI for imgverify.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use imgverify_core::config::{self, VerifierConfig};
use std::path::PathBuf;

use commands::{run_digest, run_download, run_upload, run_verify};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "imgverify")]
#[command(about = "imgverify: upload/download round-trip check for an image server", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/imgverify/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Upload an image, download it back by id and compare SHA-256 digests.
    Verify {
        /// Image to upload (default: `source_path` from config).
        path: Option<PathBuf>,
        /// Server base URL (overrides config).
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
        /// Keep the downloaded copy at this path instead of a temp file.
        #[arg(long, value_name = "PATH")]
        keep: Option<PathBuf>,
    },

    /// Upload an image and print the id the server assigned.
    Upload {
        /// Image to upload.
        path: PathBuf,
        /// Server base URL (overrides config).
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// Download an image by id.
    Download {
        /// Image id returned by an earlier upload.
        id: String,
        /// Output file (default: server-suggested filename, else `<id>.bin`).
        #[arg(long, short, value_name = "PATH")]
        out: Option<PathBuf>,
        /// Server base URL (overrides config).
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// Compute SHA-256 of a file.
    Digest {
        /// Path to the file.
        path: PathBuf,
    },
}

/// Config from `--config`, else the default location (created on first run).
fn load_config(explicit: Option<&PathBuf>) -> Result<VerifierConfig> {
    let cfg = match explicit {
        Some(path) => config::load_from_path(path)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

fn with_base_url(mut cfg: VerifierConfig, base_url: Option<String>) -> VerifierConfig {
    if let Some(url) = base_url {
        cfg.base_url = url;
    }
    cfg
}

impl CliCommand {
    /// Parses arguments and runs the command. `Ok(false)` means the check
    /// ran but did not pass (mismatch or server-side failure).
    pub fn run_from_args() -> Result<bool> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Verify {
                path,
                base_url,
                keep,
            } => {
                let mut cfg = with_base_url(load_config(cli.config.as_ref())?, base_url);
                if keep.is_some() {
                    cfg.download_path = keep;
                }
                let path = path.unwrap_or_else(|| cfg.source_path.clone());
                run_verify(&cfg, &path)
            }
            CliCommand::Upload { path, base_url } => {
                let cfg = with_base_url(load_config(cli.config.as_ref())?, base_url);
                run_upload(&cfg, &path)
            }
            CliCommand::Download { id, out, base_url } => {
                let cfg = with_base_url(load_config(cli.config.as_ref())?, base_url);
                run_download(&cfg, &id, out.as_deref())
            }
            CliCommand::Digest { path } => {
                run_digest(&path)?;
                Ok(true)
            }
        }
    }
}
