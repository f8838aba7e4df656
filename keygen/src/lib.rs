//! Generate an Ed25519 or RSA key pair for SSH use, write it under the key
//! directory and record where it went in a JSON manifest.

pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod generator;
pub mod manifest;
pub mod naming;

pub use config::KeygenConfig;
pub use crypto::{KeyAlgorithm, KeyStrategy};
pub use error::{ErrorKind, KeygenError, Result};
pub use generator::{GeneratedKey, generate, generate_with_os_rng};
pub use manifest::ManifestRecord;
