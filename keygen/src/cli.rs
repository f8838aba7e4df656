use crate::crypto::KeyAlgorithm;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "giantcloak")]
#[command(about = "Generate an SSH key pair and record it in a manifest", long_about = None)]
#[command(version)]
pub struct CliArgs {
    /// Key algorithm
    #[arg(short, long, value_enum)]
    pub algorithm: Option<KeyAlgorithm>,

    /// Prefix placed in the key file names [default: giantcloak]
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// RSA modulus size in bits [default: 2048]
    #[arg(short, long)]
    pub size: Option<usize>,

    /// Directory receiving the key files [default: $HOME/.ssh]
    #[arg(long)]
    pub key_dir: Option<PathBuf>,

    /// Manifest file path [default: ./giantcloak.json]
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write logs to a daily rolling file in this directory
    #[arg(long)]
    pub log_dir: Option<String>,
}
