use anyhow::Result;
use clap::{Parser, Subcommand};
use hashcp_core::config;
use std::path::PathBuf;

mod commands;

/// Top-level CLI for the hashcp batch copier.
#[derive(Debug, Parser)]
#[command(name = "hashcp")]
#[command(about = "hashcp: parallel batch copy with SHA-1 manifests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Copy every file named in a list to mirrored paths under a destination,
    /// writing a `hashes.sha1` manifest.
    Copy {
        /// Input list: one source path per line.
        list: PathBuf,

        /// Destination directory.
        dest: PathBuf,

        /// Worker threads (default: config, then the logical CPU count).
        #[arg(long)]
        workers: Option<usize>,

        /// Also write copied.txt / errored.txt into the destination.
        #[arg(long)]
        save_lists: bool,

        /// Suppress progress output.
        #[arg(long)]
        quiet: bool,
    },

    /// Re-hash the files listed in a manifest and report mismatches.
    Verify {
        /// Manifest produced by a copy run.
        manifest: PathBuf,

        /// Worker threads (default: config, then the logical CPU count).
        #[arg(long)]
        workers: Option<usize>,

        /// Suppress progress output.
        #[arg(long)]
        quiet: bool,
    },

    /// Compute and print the SHA-1 of the given files.
    Checksum {
        /// Files to hash.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Copy {
                list,
                dest,
                workers,
                save_lists,
                quiet,
            } => commands::copy::run_copy(&cfg, &list, &dest, workers, save_lists, quiet).await,
            CliCommand::Verify {
                manifest,
                workers,
                quiet,
            } => commands::verify::run_verify(&cfg, &manifest, workers, quiet).await,
            CliCommand::Checksum { paths } => commands::checksum::run_checksum(&paths).await,
        }
    }
}
