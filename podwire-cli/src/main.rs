//! podwire CLI - Wire generated dependency targets into Xcode projects
//!
//! Reads a target manifest, integrates each target's product into its
//! consuming project and reports what changed.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod manifest;
mod output;

use commands::*;
use config::PodwireConfig;
use output::{OutputConfig, OutputFormat};

/// Wire generated dependency targets into Xcode projects.
///
/// podwire links each target's product into its consuming targets, installs
/// the resource copy and manifest check build phases, and leaves projects
/// that are already integrated untouched.
#[derive(Parser)]
#[command(name = "podwire")]
#[command(author, version)]
#[command(about = "Wire generated dependency targets into Xcode projects")]
#[command(propagate_version = true)]
#[command(next_help_heading = "Options")]
#[command(after_help = "Quick Start:
  podwire status             Show which consumers still need integration
  podwire integrate          Integrate every target in podwire.toml
  podwire inspect App.xcodeproj
                             Show targets, phases and product references")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Fail on .podwirerc.toml errors instead of silently using defaults
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Integrate every target of a manifest into its project
    #[command(visible_alias = "i")]
    Integrate {
        /// Target manifest (defaults to the configured manifest, then podwire.toml)
        manifest: Option<PathBuf>,

        /// Continue with the remaining targets after a failure
        #[arg(short, long)]
        keep_going: bool,
    },

    /// Show which consumers are pending integration, without changing anything
    #[command(visible_alias = "st")]
    Status {
        /// Target manifest (defaults to the configured manifest, then podwire.toml)
        manifest: Option<PathBuf>,
    },

    /// Show the targets, build phases and product references of a project
    Inspect {
        /// Path to the .xcodeproj directory
        project: PathBuf,
    },
}

/// Setup tracing/logging based on verbosity flags
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Load configuration from .podwirerc.toml
    let root = Path::new(".");
    let config = if cli.strict {
        PodwireConfig::load_strict(root)?
    } else {
        PodwireConfig::load(root)
    };

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });
    let output = OutputConfig::auto_detect_with_color_override(format, config.use_color());
    colored::control::set_override(output.use_colors());

    match cli.command {
        Commands::Integrate {
            manifest,
            keep_going,
        } => {
            let manifest = config.manifest_path(manifest);
            integrate::run(&manifest, keep_going || config.keep_going(), &output)
        }
        Commands::Status { manifest } => status::run(&config.manifest_path(manifest), &output),
        Commands::Inspect { project } => inspect::run(&project, &output),
    }
}
