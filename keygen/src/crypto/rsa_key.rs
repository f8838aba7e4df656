use super::{
    EncodedKey, EncodedKeyPair, KeyAlgorithm, KeyMaterial, KeyStrategy, fill_secure,
    mismatched_material,
};
use crate::error::{KeygenError, Result};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::rand_core::CryptoRngCore;
use rsa::{RsaPrivateKey, RsaPublicKey};
use ssh_key::public::{KeyData, RsaPublicKey as SshRsaPublicKey};
use tracing::{debug, info};

pub const DEFAULT_RSA_BITS: usize = 2048;
pub const MIN_RSA_BITS: usize = 1024;
pub const MAX_RSA_BITS: usize = 16384;

pub fn validate_rsa_bits(bits: usize) -> Result<()> {
    if !(MIN_RSA_BITS..=MAX_RSA_BITS).contains(&bits) {
        return Err(KeygenError::Config(format!(
            "RSA key size {} is out of range ({}..={} bits)",
            bits, MIN_RSA_BITS, MAX_RSA_BITS
        )));
    }
    if bits % 8 != 0 {
        return Err(KeygenError::Config(format!(
            "RSA key size {} is not a multiple of 8",
            bits
        )));
    }
    Ok(())
}

/// RSA keys: PKCS#1 PEM private key, OpenSSH `ssh-rsa` public key line.
#[derive(Debug, Clone, Copy)]
pub struct RsaStrategy {
    bits: usize,
}

impl RsaStrategy {
    pub fn new(bits: usize) -> Self {
        Self { bits }
    }
}

impl KeyStrategy for RsaStrategy {
    fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::Rsa
    }

    fn generate(&self, mut rng: &mut dyn CryptoRngCore) -> Result<KeyMaterial> {
        validate_rsa_bits(self.bits)?;

        // The prime search draws through the infallible rng interface, so a
        // dead source is detected here instead of inside the library.
        let mut probe = [0u8; 32];
        fill_secure(rng, &mut probe)?;

        info!("Generating RSA-{} key pair...", self.bits);
        let private_key = RsaPrivateKey::new(&mut rng, self.bits)
            .map_err(|e| KeygenError::Generation(format!("RSA-{}: {}", self.bits, e)))?;
        private_key
            .validate()
            .map_err(|e| KeygenError::Generation(format!("generated key is invalid: {}", e)))?;

        debug!("Generated RSA-{} key pair", self.bits);
        Ok(KeyMaterial::Rsa(private_key))
    }

    fn encode(&self, material: &KeyMaterial, comment: &str) -> Result<EncodedKeyPair> {
        let KeyMaterial::Rsa(private_key) = material else {
            return Err(mismatched_material(self.algorithm(), material));
        };

        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| KeygenError::Encoding(format!("Failed to encode private key: {}", e)))?;

        let public_line = authorized_key_line(&private_key.to_public_key(), comment)?;

        Ok(EncodedKeyPair {
            private_key: EncodedKey::new(private_pem.as_bytes()),
            public_key: EncodedKey::new(public_line),
        })
    }
}

/// `ssh-rsa <base64 blob> <comment>` with a trailing newline, as it appears in
/// `authorized_keys`.
fn authorized_key_line(public_key: &RsaPublicKey, comment: &str) -> Result<String> {
    let ssh_public = SshRsaPublicKey::try_from(public_key)
        .map_err(|e| KeygenError::Encoding(format!("Failed to convert public key: {}", e)))?;
    let mut line = ssh_key::PublicKey::new(KeyData::Rsa(ssh_public), comment)
        .to_openssh()
        .map_err(|e| KeygenError::Encoding(format!("Failed to encode public key: {}", e)))?;
    line.push('\n');
    Ok(line)
}
