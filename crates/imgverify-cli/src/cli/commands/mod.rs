//! CLI command handlers, one per file.

mod digest;
mod download;
mod upload;
mod verify;

pub use digest::run_digest;
pub use download::run_download;
pub use upload::run_upload;
pub use verify::run_verify;
