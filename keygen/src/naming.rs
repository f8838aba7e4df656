//! Random suffixes and the file names derived from them.

use crate::crypto::{KeyAlgorithm, fill_secure};
use crate::error::{KeygenError, Result};
use rsa::rand_core::CryptoRngCore;

pub const SUFFIX_LEN: usize = 5;
const ALPHABET: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

pub const PUBLIC_KEY_EXTENSION: &str = "pub";

/// Draw a `SUFFIX_LEN` lowercase suffix from a secure random source.
pub fn generate_suffix(rng: &mut dyn CryptoRngCore) -> Result<String> {
    let mut bytes = [0u8; SUFFIX_LEN];
    fill_secure(rng, &mut bytes)?;
    Ok(suffix_from_bytes(&bytes))
}

/// Map each byte onto the 26-letter alphabet.
pub fn suffix_from_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
        .collect()
}

pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(KeygenError::Config("prefix must not be empty".to_string()));
    }
    if prefix == "." || prefix == ".." {
        return Err(KeygenError::Config(format!("prefix '{}' is reserved", prefix)));
    }
    if prefix.contains(['/', '\\', '\0']) {
        return Err(KeygenError::Config(format!(
            "prefix '{}' must not contain path separators or NUL",
            prefix.escape_default()
        )));
    }
    Ok(())
}

/// Names derived from one allocation: `id_<alg>_<prefix>_<suffix>` for the key
/// name and private key file, plus `.pub` for the public key file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNames {
    pub suffix: String,
    pub key_name: String,
    pub private_file: String,
    pub public_file: String,
}

impl KeyNames {
    pub fn new(algorithm: KeyAlgorithm, prefix: &str, suffix: &str) -> Self {
        let key_name = format!("id_{}_{}_{}", algorithm.tag(), prefix, suffix);
        let public_file = format!("{}.{}", key_name, PUBLIC_KEY_EXTENSION);

        Self {
            suffix: suffix.to_string(),
            private_file: key_name.clone(),
            public_file,
            key_name,
        }
    }

    pub fn allocate(
        algorithm: KeyAlgorithm,
        prefix: &str,
        rng: &mut dyn CryptoRngCore,
    ) -> Result<Self> {
        validate_prefix(prefix)?;
        let suffix = generate_suffix(rng)?;
        Ok(Self::new(algorithm, prefix, &suffix))
    }
}
