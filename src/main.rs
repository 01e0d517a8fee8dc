//! contract-build - reproducible WebAssembly builds of smart contracts.
//!
//! Runs inside the build container:
//! - discovers every contract (directory holding `elrond.json`)
//! - builds each one in an isolated scratch copy
//! - derives `.wat`, `.imports.json`, `.codehash.txt` and a source archive
//! - writes `artifacts.json` once every contract has built

mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use contract_build::config::Config;
use contract_build::ownership::Ownership;
use contract_build::{BuildError, BuildOptions, FailurePolicy};

#[derive(Parser)]
#[command(name = "contract-build")]
#[command(about = "Reproducible WebAssembly builds for smart contracts")]
#[command(
    after_help = "QUICK START:\n  contract-build preflight             Check collaborator tools\n  contract-build scan ./project        List contracts\n  contract-build build --project ./project --output ./output \\\n      --cargo-target-dir /cargo-target-dir --output-owner-id 1000 --output-group-id 1000"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every contract of a project
    Build {
        /// Source code directory or a *.tar archive of the source code
        #[arg(long)]
        project: PathBuf,

        /// Output directory
        #[arg(long)]
        output: PathBuf,

        /// Do not optimize wasm files after the build
        #[arg(long)]
        no_wasm_opt: bool,

        /// Cargo's target-dir
        #[arg(long)]
        cargo_target_dir: PathBuf,

        /// Set owner of output folder
        #[arg(long)]
        output_owner_id: u32,

        /// Set group of output folder
        #[arg(long)]
        output_group_id: u32,

        /// Scratch directory contracts are copied into (default: CONTRACT_BUILD_DIR or /tmp/elrond-contract-rust)
        #[arg(long)]
        build_dir: Option<PathBuf>,

        /// Per-contract toolchain timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Build remaining contracts after a failure (manifest lists successes only)
        #[arg(long)]
        keep_going: bool,
    },

    /// List the contracts of a project in build order
    Scan {
        /// Source code directory or a *.tar archive of the source code
        project: PathBuf,
    },

    /// Print the BLAKE2b-256 code hash of a wasm file
    Codehash {
        wasm: PathBuf,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Check that cargo and wabt are available
    Preflight {
        /// Exit non-zero if any check fails
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config,
    /// Show and verify the manifest of an output directory
    Manifest {
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();
}

/// Exit status for an error chain: the first `BuildError` decides, 1 otherwise.
fn exit_status(err: &anyhow::Error) -> u8 {
    let code = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<BuildError>())
        .map(BuildError::exit_code)
        .unwrap_or(1);
    clamp_exit_code(code)
}

fn clamp_exit_code(code: i32) -> u8 {
    u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Cannot determine current directory")?;
    let config = Config::load(&cwd)?;

    match cli.command {
        Commands::Build {
            project,
            output,
            no_wasm_opt,
            cargo_target_dir,
            output_owner_id,
            output_group_id,
            build_dir,
            timeout,
            keep_going,
        } => {
            let options = BuildOptions {
                project: absolute(&cwd, &project),
                output: absolute(&cwd, &output),
                build_dir: absolute(&cwd, build_dir.as_ref().unwrap_or(&config.build_dir)),
                target_dir: absolute(&cwd, &cargo_target_dir),
                no_wasm_opt,
                owner: Some(Ownership::new(output_owner_id, output_group_id)),
                timeout: timeout.map(Duration::from_secs).or(config.timeout),
                policy: if keep_going {
                    FailurePolicy::ContinueOnFailure
                } else {
                    FailurePolicy::FailFast
                },
            };
            let report = commands::cmd_build(&options, &config)?;
            return Ok(ExitCode::from(match report.exit_code() {
                0 => 0,
                code => clamp_exit_code(code),
            }));
        }

        Commands::Scan { project } => {
            commands::cmd_scan(&absolute(&cwd, &project))?;
        }

        Commands::Codehash { wasm } => {
            commands::cmd_codehash(&wasm)?;
        }

        Commands::Show { what } => {
            let target = match what {
                ShowTarget::Config => commands::show::ShowTarget::Config,
                ShowTarget::Manifest { output } => commands::show::ShowTarget::Manifest {
                    output: absolute(&cwd, &output),
                },
            };
            commands::cmd_show(target, &config)?;
        }

        Commands::Preflight { strict } => {
            commands::cmd_preflight(&config, strict)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
