use crate::cli::CliArgs;
use crate::crypto::{DEFAULT_RSA_BITS, KeyAlgorithm, validate_rsa_bits};
use crate::error::{KeygenError, Result};
use crate::manifest::DEFAULT_MANIFEST_FILE;
use crate::naming::validate_prefix;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PREFIX: &str = "giantcloak";
pub const SSH_DIR_NAME: &str = ".ssh";

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings read from an optional TOML file. Every field may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub algorithm: Option<KeyAlgorithm>,
    pub prefix: Option<String>,
    pub rsa_bits: Option<usize>,
    pub key_dir: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_dir: Option<String>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| KeygenError::io("Failed to read config file", path, e))?;
        let config: FileConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Everything one generation run needs. Core logic reads nothing else from
/// the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeygenConfig {
    pub algorithm: KeyAlgorithm,
    pub prefix: String,
    pub rsa_bits: usize,
    pub key_dir: PathBuf,
    pub manifest_path: PathBuf,

    /// Log level: trace, debug, info, warn, error
    pub log_level: String,

    pub log_dir: Option<String>,
}

impl KeygenConfig {
    pub fn new(key_dir: PathBuf) -> Self {
        Self {
            algorithm: KeyAlgorithm::default(),
            prefix: DEFAULT_PREFIX.to_string(),
            rsa_bits: DEFAULT_RSA_BITS,
            key_dir,
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_FILE),
            log_level: default_log_level(),
            log_dir: None,
        }
    }

    /// Layer CLI flags over the file settings over the defaults. `home` is
    /// only consulted when neither layer names a key directory.
    pub fn resolve(args: &CliArgs, file: FileConfig, home: Option<OsString>) -> Result<Self> {
        let key_dir = match args.key_dir.clone().or(file.key_dir) {
            Some(dir) => dir,
            None => home_key_dir(home)?,
        };
        let key_dir = std::path::absolute(&key_dir).map_err(|e| {
            KeygenError::Environment(format!(
                "cannot resolve key directory {}: {}",
                key_dir.display(),
                e
            ))
        })?;

        let mut config = Self::new(key_dir);
        if let Some(algorithm) = args.algorithm.or(file.algorithm) {
            config.algorithm = algorithm;
        }
        if let Some(prefix) = args.prefix.clone().or(file.prefix) {
            config.prefix = prefix;
        }
        if let Some(bits) = args.size.or(file.rsa_bits) {
            config.rsa_bits = bits;
        }
        if let Some(manifest_path) = args.manifest.clone().or(file.manifest_path) {
            config.manifest_path = manifest_path;
        }
        if let Some(log_level) = args.log_level.clone().or(file.log_level) {
            config.log_level = log_level;
        }
        config.log_dir = args.log_dir.clone().or(file.log_dir);

        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `--config` (if any) and resolve against it.
    pub fn from_args(args: &CliArgs, home: Option<OsString>) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(args, file, home)
    }

    pub fn validate(&self) -> Result<()> {
        validate_prefix(&self.prefix)?;
        if self.algorithm == KeyAlgorithm::Rsa {
            validate_rsa_bits(self.rsa_bits)?;
        }
        if self.manifest_path.file_name().is_none() {
            return Err(KeygenError::Config(format!(
                "manifest path {} does not name a file",
                self.manifest_path.display()
            )));
        }
        Ok(())
    }
}

/// `<home>/.ssh`, from the value of the home directory variable.
pub fn home_key_dir(home: Option<OsString>) -> Result<PathBuf> {
    match home {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home).join(SSH_DIR_NAME)),
        _ => Err(KeygenError::Environment(
            "HOME is not set; pass --key-dir to choose where keys are written".to_string(),
        )),
    }
}
