//! Key algorithms behind a common strategy interface.
//!
//! A [`KeyStrategy`] produces fresh [`KeyMaterial`] from a caller-supplied
//! secure random source and turns that material into the on-disk text
//! encodings. Encoding never touches the random source, so encoding the same
//! material twice yields identical bytes.

mod ed25519_key;
mod rsa_key;

pub use ed25519_key::Ed25519Strategy;
pub use rsa_key::{DEFAULT_RSA_BITS, MAX_RSA_BITS, MIN_RSA_BITS, RsaStrategy, validate_rsa_bits};

use crate::error::{KeygenError, Result};
use rsa::RsaPrivateKey;
use rsa::rand_core::CryptoRngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    #[default]
    Ed25519,
    Rsa,
}

impl KeyAlgorithm {
    /// Tag used in file names and the manifest.
    pub fn tag(self) -> &'static str {
        match self {
            KeyAlgorithm::Ed25519 => "ed25519",
            KeyAlgorithm::Rsa => "rsa",
        }
    }

    /// `rsa_bits` is ignored for algorithms with a fixed key size.
    pub fn strategy(self, rsa_bits: usize) -> Box<dyn KeyStrategy> {
        match self {
            KeyAlgorithm::Ed25519 => Box::new(Ed25519Strategy),
            KeyAlgorithm::Rsa => Box::new(RsaStrategy::new(rsa_bits)),
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = KeygenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ed25519" => Ok(KeyAlgorithm::Ed25519),
            "rsa" => Ok(KeyAlgorithm::Rsa),
            other => Err(KeygenError::Config(format!(
                "unsupported key algorithm '{}', expected 'ed25519' or 'rsa'",
                other
            ))),
        }
    }
}

/// Raw key pair. Lives only between generation and encoding.
pub enum KeyMaterial {
    Ed25519(ed25519_dalek::SigningKey),
    Rsa(RsaPrivateKey),
}

impl KeyMaterial {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyMaterial::Ed25519(_) => KeyAlgorithm::Ed25519,
            KeyMaterial::Rsa(_) => KeyAlgorithm::Rsa,
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial({})", self.algorithm())
    }
}

/// One key in its final textual encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedKey(Vec<u8>);

impl EncodedKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Every encoding produced here is ASCII.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Debug for EncodedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedKey({} bytes)", self.0.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedKeyPair {
    pub private_key: EncodedKey,
    pub public_key: EncodedKey,
}

pub trait KeyStrategy {
    fn algorithm(&self) -> KeyAlgorithm;

    fn generate(&self, rng: &mut dyn CryptoRngCore) -> Result<KeyMaterial>;

    /// `comment` ends up in encodings that carry one (the OpenSSH public key
    /// line) and is ignored elsewhere.
    fn encode(&self, material: &KeyMaterial, comment: &str) -> Result<EncodedKeyPair>;
}

/// Fill `buf` from `rng`, surfacing a source failure as an error.
pub fn fill_secure(rng: &mut dyn CryptoRngCore, buf: &mut [u8]) -> Result<()> {
    rng.try_fill_bytes(buf)
        .map_err(|e| KeygenError::Entropy(e.to_string()))
}

pub(crate) fn mismatched_material(expected: KeyAlgorithm, material: &KeyMaterial) -> KeygenError {
    KeygenError::Encoding(format!(
        "{} strategy cannot encode {} key material",
        expected,
        material.algorithm()
    ))
}
