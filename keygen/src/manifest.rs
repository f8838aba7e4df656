//! The JSON sidecar describing the most recently generated key.
//!
//! The manifest holds a single record. Writing replaces whatever was there
//! before; earlier records are not kept.

use crate::crypto::KeyAlgorithm;
use crate::error::{KeygenError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_MANIFEST_FILE: &str = "giantcloak.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub key_name: String,
    pub private_key: String,
    pub public_key: String,
    pub suffix: String,
    pub key_type: KeyAlgorithm,
    pub created: i64,
}

impl ManifestRecord {
    /// File basenames are taken from the paths themselves.
    pub fn new(
        private_key_path: PathBuf,
        public_key_path: PathBuf,
        key_name: String,
        suffix: String,
        key_type: KeyAlgorithm,
        created: i64,
    ) -> Self {
        Self {
            private_key: basename(&private_key_path),
            public_key: basename(&public_key_path),
            private_key_path,
            public_key_path,
            key_name,
            suffix,
            key_type,
            created,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;

        if path.exists() {
            warn!(
                "Replacing existing manifest {}; its previous record is discarded",
                path.display()
            );
        }

        common::fs::write_file_atomic(path, json.as_bytes(), common::fs::PUBLIC_FILE_MODE)
            .map_err(|e| KeygenError::io("Failed to write manifest", path, e))?;
        debug!("Manifest written to {}", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| KeygenError::io("Failed to read manifest", path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
