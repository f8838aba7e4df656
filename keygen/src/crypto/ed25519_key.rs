use super::{
    EncodedKey, EncodedKeyPair, KeyAlgorithm, KeyMaterial, KeyStrategy, fill_secure,
    mismatched_material,
};
use crate::error::Result;
use ed25519_dalek::{SECRET_KEY_LENGTH, SigningKey};
use rsa::rand_core::CryptoRngCore;
use tracing::debug;

/// Ed25519 keys, written as lowercase hex: 64-byte keypair form (seed followed
/// by public key) for the private file, 32-byte public key for the `.pub` file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Strategy;

impl KeyStrategy for Ed25519Strategy {
    fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::Ed25519
    }

    fn generate(&self, rng: &mut dyn CryptoRngCore) -> Result<KeyMaterial> {
        let mut seed = [0u8; SECRET_KEY_LENGTH];
        fill_secure(rng, &mut seed)?;
        let signing_key = SigningKey::from_bytes(&seed);
        seed.fill(0);

        debug!("Generated ed25519 key pair");
        Ok(KeyMaterial::Ed25519(signing_key))
    }

    fn encode(&self, material: &KeyMaterial, _comment: &str) -> Result<EncodedKeyPair> {
        let KeyMaterial::Ed25519(signing_key) = material else {
            return Err(mismatched_material(self.algorithm(), material));
        };

        Ok(EncodedKeyPair {
            private_key: EncodedKey::new(hex::encode(signing_key.to_keypair_bytes())),
            public_key: EncodedKey::new(hex::encode(signing_key.verifying_key().to_bytes())),
        })
    }
}
