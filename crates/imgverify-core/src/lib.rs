pub mod config;
pub mod logging;

pub mod checksum;
pub mod client;
pub mod image_id;
pub mod stage;
pub mod verifier;
