use anyhow::{Context, Result};
use clap::Parser;
use giantcloak_keygen::cli::CliArgs;
use giantcloak_keygen::{KeygenConfig, KeygenError, generate_with_os_rng};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{error, info};

const LOG_FILE: &str = "giantcloak.log";

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Configuration comes first so its log level can drive the subscriber
    let cfg = match KeygenConfig::from_args(&args, std::env::var_os("HOME")) {
        Ok(cfg) => cfg,
        Err(e) => {
            let _guard = common::init_tracing(None, LOG_FILE, "info");
            return fail(&anyhow::Error::new(e));
        }
    };

    let _guard = common::init_tracing(cfg.log_dir.as_deref(), LOG_FILE, &cfg.log_level);
    info!("Starting giantcloak with configuration: {:?}", cfg);

    match run(&cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run(cfg: &KeygenConfig) -> Result<()> {
    let generated = generate_with_os_rng(cfg)
        .with_context(|| format!("Failed to generate {} key", cfg.algorithm))?;

    println!("{}", generated.names.suffix);
    println!(
        "Private key written to: {}",
        generated.private_key_path.display()
    );
    println!(
        "Public key written to: {}",
        generated.public_key_path.display()
    );
    println!("Key paths written to: {}", generated.manifest_path.display());

    info!(
        "Generated {} key {}",
        generated.algorithm(),
        generated.names.key_name
    );
    Ok(())
}

fn fail(err: &anyhow::Error) -> ExitCode {
    error!("{:#}", err);
    // stdout gets the diagnostic even when logs go to a file or are filtered
    ExitCode::from(report_failure(err, &mut io::stdout()))
}

/// Write the diagnostic line for `err` and return its exit code.
fn report_failure<W: Write>(err: &anyhow::Error, out: &mut W) -> u8 {
    let _ = writeln!(out, "Error: {:#}", err);
    let _ = out.flush();
    err.downcast_ref::<KeygenError>()
        .map(|e| e.kind().exit_code())
        .unwrap_or(1)
}
