use crate::config::KeygenConfig;
use crate::crypto::{EncodedKeyPair, KeyAlgorithm};
use crate::error::{KeygenError, Result};
use crate::manifest::ManifestRecord;
use crate::naming::KeyNames;
use common::fs::{PRIVATE_DIR_MODE, PRIVATE_FILE_MODE, PUBLIC_FILE_MODE};
use rsa::rand_core::CryptoRngCore;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Outcome of one successful run.
#[derive(Debug, Clone)]
pub struct GeneratedKey {
    pub names: KeyNames,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub manifest_path: PathBuf,
    pub record: ManifestRecord,
}

/// Allocate names, generate and encode a key pair, write both key files and
/// then the manifest.
///
/// Any failure stops the run. Files written before the failure stay on disk.
#[instrument(skip_all, fields(algorithm = %config.algorithm, prefix = %config.prefix))]
pub fn generate(config: &KeygenConfig, rng: &mut dyn CryptoRngCore) -> Result<GeneratedKey> {
    config.validate()?;

    let names = KeyNames::allocate(config.algorithm, &config.prefix, rng)?;
    info!("Allocated key name {}", names.key_name);

    common::fs::create_dir_all_with_mode(&config.key_dir, PRIVATE_DIR_MODE).map_err(|e| {
        KeygenError::Environment(format!(
            "Failed to create key directory {}: {}",
            config.key_dir.display(),
            e
        ))
    })?;

    let strategy = config.algorithm.strategy(config.rsa_bits);
    let material = strategy.generate(rng)?;
    let encoded = strategy.encode(&material, &names.key_name)?;
    drop(material);

    let private_key_path = config.key_dir.join(&names.private_file);
    let public_key_path = config.key_dir.join(&names.public_file);
    write_key_files(&encoded, &private_key_path, &public_key_path)?;

    let record = ManifestRecord::new(
        private_key_path.clone(),
        public_key_path.clone(),
        names.key_name.clone(),
        names.suffix.clone(),
        config.algorithm,
        common::current_timestamp(),
    );
    record.write(&config.manifest_path)?;
    info!("Key paths written to {}", config.manifest_path.display());

    Ok(GeneratedKey {
        names,
        private_key_path,
        public_key_path,
        manifest_path: config.manifest_path.clone(),
        record,
    })
}

fn write_key_files(
    encoded: &EncodedKeyPair,
    private_key_path: &Path,
    public_key_path: &Path,
) -> Result<()> {
    common::fs::write_new_file(
        private_key_path,
        encoded.private_key.as_bytes(),
        PRIVATE_FILE_MODE,
    )
    .map_err(|e| KeygenError::io("Failed to write private key", private_key_path, e))?;
    debug!("Private key written to {}", private_key_path.display());

    common::fs::write_new_file(public_key_path, encoded.public_key.as_bytes(), PUBLIC_FILE_MODE)
        .map_err(|e| KeygenError::io("Failed to write public key", public_key_path, e))?;
    debug!("Public key written to {}", public_key_path.display());

    Ok(())
}

/// Convenience wrapper drawing from the operating system's CSPRNG.
pub fn generate_with_os_rng(config: &KeygenConfig) -> Result<GeneratedKey> {
    generate(config, &mut rsa::rand_core::OsRng)
}

impl GeneratedKey {
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.record.key_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::testing::{FailingRng, assert_authorized_key_matches};
    use crate::crypto::DEFAULT_RSA_BITS;
    use crate::error::ErrorKind;
    use crate::manifest::DEFAULT_MANIFEST_FILE;
    use crate::naming::SUFFIX_LEN;
    use rsa::pkcs1::DecodeRsaPrivateKey;
    use rsa::rand_core::OsRng;
    use rsa::traits::PublicKeyParts;
    use rsa::RsaPrivateKey;
    use std::fs;
    use tempfile::TempDir;

    struct Workspace {
        _root: TempDir,
        config: KeygenConfig,
    }

    fn workspace(algorithm: KeyAlgorithm, prefix: &str) -> Workspace {
        let root = TempDir::new().unwrap();
        let mut config = KeygenConfig::new(root.path().join("home").join(".ssh"));
        config.manifest_path = root.path().join("cwd").join(DEFAULT_MANIFEST_FILE);
        fs::create_dir_all(root.path().join("cwd")).unwrap();
        config.algorithm = algorithm;
        config.prefix = prefix.to_string();
        config.rsa_bits = 1024;
        Workspace {
            _root: root,
            config,
        }
    }

    fn assert_name_pattern(name: &str, algorithm: KeyAlgorithm, prefix: &str) {
        let head = format!("id_{}_{}_", algorithm.tag(), prefix);
        let suffix = name.strip_prefix(&head).unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn ed25519_run_writes_keys_and_manifest() {
        let ws = workspace(KeyAlgorithm::Ed25519, "test");
        let started = common::current_timestamp();

        let generated = generate(&ws.config, &mut OsRng).unwrap();

        let private = fs::read_to_string(&generated.private_key_path).unwrap();
        let public = fs::read_to_string(&generated.public_key_path).unwrap();
        assert_eq!(hex::decode(&private).unwrap().len(), 64);
        assert_eq!(hex::decode(&public).unwrap().len(), 32);

        let private_name = generated.private_key_path.file_name().unwrap().to_str().unwrap();
        let public_name = generated.public_key_path.file_name().unwrap().to_str().unwrap();
        assert_name_pattern(private_name, KeyAlgorithm::Ed25519, "test");
        assert_eq!(public_name, format!("{}.pub", private_name));

        let record = ManifestRecord::load(&ws.config.manifest_path).unwrap();
        assert_eq!(record.key_type, KeyAlgorithm::Ed25519);
        assert_eq!(
            record.private_key_path.file_name().unwrap().to_str().unwrap(),
            private_name
        );
        assert_eq!(record.private_key, private_name);
        assert_eq!(record.public_key, public_name);
        assert_eq!(record.key_name, private_name);
        assert_eq!(record.suffix, generated.names.suffix);
        assert!(record.private_key_path.is_absolute());
        assert!((record.created - started).abs() <= 5);
        assert_eq!(record, generated.record);
    }

    #[test]
    fn manifest_json_carries_the_key_type_tag() {
        let ws = workspace(KeyAlgorithm::Ed25519, "test");
        generate(&ws.config, &mut OsRng).unwrap();

        let raw = fs::read_to_string(&ws.config.manifest_path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["key_type"], "ed25519");
        assert!(raw.contains("\n  \"key_name\": "));
    }

    #[test]
    fn rsa_run_writes_matching_pem_and_authorized_key() {
        let ws = workspace(KeyAlgorithm::Rsa, "ci");

        let generated = generate(&ws.config, &mut OsRng).unwrap();

        let pem = fs::read_to_string(&generated.private_key_path).unwrap();
        let private = RsaPrivateKey::from_pkcs1_pem(&pem).unwrap();
        private.validate().unwrap();
        assert_eq!(private.n().bits(), 1024);

        let line = fs::read_to_string(&generated.public_key_path).unwrap();
        assert_authorized_key_matches(&line, &generated.names.key_name, &private.to_public_key());

        let record = ManifestRecord::load(&ws.config.manifest_path).unwrap();
        assert_eq!(record.key_type, KeyAlgorithm::Rsa);
        assert_name_pattern(&record.private_key, KeyAlgorithm::Rsa, "ci");
    }

    #[test]
    fn rsa_run_at_default_size() {
        let mut ws = workspace(KeyAlgorithm::Rsa, "default");
        ws.config.rsa_bits = DEFAULT_RSA_BITS;

        let generated = generate(&ws.config, &mut OsRng).unwrap();

        let pem = fs::read_to_string(&generated.private_key_path).unwrap();
        let private = RsaPrivateKey::from_pkcs1_pem(&pem).unwrap();
        private.validate().unwrap();
        assert_eq!(private.n().bits(), DEFAULT_RSA_BITS);

        let line = fs::read_to_string(&generated.public_key_path).unwrap();
        assert_authorized_key_matches(&line, &generated.names.key_name, &private.to_public_key());

        let record = ManifestRecord::load(&ws.config.manifest_path).unwrap();
        assert_eq!(record, generated.record);
    }

    #[cfg(unix)]
    #[test]
    fn key_files_get_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let ws = workspace(KeyAlgorithm::Ed25519, "perm");
        let generated = generate(&ws.config, &mut OsRng).unwrap();

        let mode = |p: &PathBuf| fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&generated.private_key_path) & 0o077, 0);
        assert_eq!(mode(&ws.config.key_dir) & 0o077, 0);
        assert_eq!(mode(&ws.config.manifest_path), 0o644);
    }

    #[test]
    fn second_run_replaces_manifest_but_keeps_both_key_sets() {
        let ws = workspace(KeyAlgorithm::Ed25519, "twice");

        let first = generate(&ws.config, &mut OsRng).unwrap();
        let second = generate(&ws.config, &mut OsRng).unwrap();
        assert_ne!(first.private_key_path, second.private_key_path);

        for path in [
            &first.private_key_path,
            &first.public_key_path,
            &second.private_key_path,
            &second.public_key_path,
        ] {
            assert!(fs::metadata(path).unwrap().len() > 0);
        }
        assert_eq!(fs::read_dir(&ws.config.key_dir).unwrap().count(), 4);

        let manifest_dir = ws.config.manifest_path.parent().unwrap();
        assert_eq!(fs::read_dir(manifest_dir).unwrap().count(), 1);

        let record = ManifestRecord::load(&ws.config.manifest_path).unwrap();
        assert_eq!(record, second.record);
        assert_ne!(record.suffix, first.names.suffix);
    }

    #[test]
    fn entropy_failure_stops_before_touching_disk() {
        let ws = workspace(KeyAlgorithm::Ed25519, "dead");

        let err = generate(&ws.config, &mut FailingRng).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Entropy);
        assert!(!ws.config.key_dir.exists());
        assert!(!ws.config.manifest_path.exists());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut ws = workspace(KeyAlgorithm::Rsa, "small");
        ws.config.rsa_bits = 128;

        let err = generate(&ws.config, &mut OsRng).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(!ws.config.key_dir.exists());
    }

    #[test]
    fn manifest_failure_leaves_key_files_in_place() {
        let mut ws = workspace(KeyAlgorithm::Ed25519, "orphan");
        ws.config.manifest_path = ws
            .config
            .key_dir
            .join("missing")
            .join(DEFAULT_MANIFEST_FILE);

        let err = generate(&ws.config, &mut OsRng).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);

        let keys: Vec<_> = fs::read_dir(&ws.config.key_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(keys.len(), 2);
        let private = keys.iter().find(|name| !name.ends_with(".pub")).unwrap();
        assert_name_pattern(private, KeyAlgorithm::Ed25519, "orphan");
    }

    #[test]
    fn uncreatable_key_directory_is_environment_error() {
        let ws = workspace(KeyAlgorithm::Ed25519, "blocked");
        // A regular file where the directory should be
        fs::create_dir_all(ws.config.key_dir.parent().unwrap()).unwrap();
        fs::write(&ws.config.key_dir, b"").unwrap();

        let err = generate(&ws.config, &mut OsRng).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Environment);
        assert!(!ws.config.manifest_path.exists());
    }
}
