//! oivkit - OIV package reader
//!
//! Command-line front end: inspect, extract and validate `.oiv` packages,
//! and edit the stored user settings.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use oivkit::settings::Settings;
use oivkit::{CleanupReport, Error, OivPackage, PackageConfig, SessionState};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oivkit")]
#[command(version)]
#[command(about = "Inspect and extract OIV packages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the metadata of an OIV package
    Info {
        /// Path to the .oiv file
        oiv_file: PathBuf,

        /// Extract to this directory instead of the per-user data dir
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Print the metadata as JSON
        #[arg(long)]
        json: bool,

        /// Leave the extracted files on disk
        #[arg(long)]
        keep: bool,
    },

    /// Extract an OIV package and print its root folder
    Extract {
        /// Path to the .oiv file
        oiv_file: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Check whether a file is a valid OIV package
    Validate {
        /// Path to the .oiv file
        oiv_file: PathBuf,
    },

    /// Show or change the stored settings
    Config {
        /// Parent directory for extracted packages ("" = per-user data dir)
        #[arg(long)]
        extraction_base_dir: Option<String>,

        /// Keep extracted files after `info` by default
        #[arg(long)]
        keep_extracted: Option<bool>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only initialize logging if verbose or RUST_LOG is set
    if cli.verbose || std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive(if cli.verbose { "oivkit=debug".parse()? } else { "oivkit=warn".parse()? }),
            )
            .init();
    }

    let settings = Settings::load();

    match cli.command {
        Commands::Info {
            oiv_file,
            dest,
            json,
            keep,
        } => {
            let mut config = package_config(&settings, oiv_file);
            config.extraction_dir = dest;
            config.keep_extracted = keep || settings.keep_extracted;
            let keep = config.keep_extracted;

            let mut package = OivPackage::with_config(config)?;
            package
                .open()
                .with_context(|| format!("Failed to open {}", package.archive_path().display()))?;

            let summary = package.summary()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("=== OIV Package ===");
                println!("Name:              {}", summary.name);
                println!("Author:            {}", summary.author);
                println!("Version:           {}", summary.version);
                println!("Description:       {}", summary.description);
                println!("Header background: {}", summary.header_background);
                println!("Icon background:   {}", summary.icon_background);
                println!("Black header text: {}", summary.black_header_foreground);
                println!("Icon:              {}", summary.icon_path.display());
            }

            if keep {
                println!("\nExtracted to {}", summary.package_root.display());
            } else {
                let report = package.close()?;
                print_cleanup_failures(&report);
            }
        }

        Commands::Extract { oiv_file, output } => {
            let mut config = package_config(&settings, oiv_file);
            config.keep_extracted = true;

            let mut package = OivPackage::with_config(config)?;

            let pb = ProgressBar::new(0);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                    .progress_chars("=> "),
            );

            let stats = package.open_with_progress(Some(&output), &mut |progress| {
                pb.set_length(progress.total as u64);
                pb.set_position(progress.index as u64 + 1);
                pb.set_message(progress.name.to_string());
            });
            pb.finish_and_clear();
            let stats = stats.with_context(|| format!("Failed to extract {}", package.archive_path().display()))?;

            println!("Extracted {} files ({} bytes)", stats.files, stats.bytes);
            if let Some(root) = package.package_root() {
                println!("Package root: {}", root.display());
            }
        }

        Commands::Validate { oiv_file } => {
            let temp = std::env::temp_dir().join(format!("oivkit-validate-{}", std::process::id()));
            let mut config = package_config(&settings, oiv_file);
            config.extraction_dir = Some(temp);

            let mut package = OivPackage::with_config(config)?;
            let result = package.open();
            let valid = package.is_valid();
            if matches!(package.state(), SessionState::Opened | SessionState::Failed) {
                let report = package.close()?;
                print_cleanup_failures(&report);
            }

            match result {
                Ok(_) => println!("{}: valid OIV package", package.archive_path().display()),
                Err(
                    e @ (Error::ManifestNotFound(_)
                    | Error::CorruptArchive { .. }
                    | Error::SecurityViolation { .. }),
                ) => {
                    println!("{}: not a valid OIV package ({})", package.archive_path().display(), e);
                }
                Err(e) => return Err(e.into()),
            }

            if !valid {
                std::process::exit(1);
            }
        }

        Commands::Config {
            extraction_base_dir,
            keep_extracted,
        } => {
            let mut settings = settings;
            let changed = settings.update(extraction_base_dir, keep_extracted);

            if changed {
                settings.save()?;
                println!("Saved {}", Settings::settings_path()?.display());
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

fn package_config(settings: &Settings, oiv_file: PathBuf) -> PackageConfig {
    let mut config = PackageConfig::new(oiv_file);
    config.extraction_base_dir = settings.extraction_base_dir();
    config
}

fn print_cleanup_failures(report: &CleanupReport) {
    if report.is_clean() {
        return;
    }
    eprintln!("\nCould not remove {} extracted paths:", report.failures.len());
    for failure in &report.failures {
        eprintln!("  {}: {}", failure.path.display(), failure.error);
    }
}
