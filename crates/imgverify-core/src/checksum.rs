//! SHA-256 content digests, computed on demand for equality checks.
//!
//! Files are streamed through the hasher in fixed 4 KiB chunks so memory use
//! stays bounded regardless of file size.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Read size for streaming digests.
pub const CHUNK_SIZE: usize = 4096;

/// SHA-256 of a byte stream. Compared for equality only, never used as an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    fn from_slice(raw: &[u8]) -> Self {
        let mut out = [0u8; 32];
        out.copy_from_slice(raw);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex (64 chars).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentDigest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s.trim(), &mut out)
            .with_context(|| format!("invalid SHA-256 hex digest: {:?}", s))?;
        Ok(Self(out))
    }
}

/// Digest everything `reader` yields, reading `CHUNK_SIZE` bytes at a time.
pub fn sha256_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(ContentDigest::from_slice(&hasher.finalize()))
}

/// Compute SHA-256 of a file in 4 KiB chunks.
pub fn sha256_path(path: &Path) -> Result<ContentDigest> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    sha256_reader(f).with_context(|| format!("read {}", path.display()))
}

/// Single-shot digest of an in-memory buffer.
pub fn sha256_bytes(data: &[u8]) -> ContentDigest {
    ContentDigest::from_slice(&Sha256::digest(data))
}
