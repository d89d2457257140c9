use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use voice_fixtures::{
    FixtureDriver, FixtureError, FixtureManifest, FixtureReport, RunSummary, format_size,
};

/// Generate synthetic speech WAV fixtures for VAD and STT tests
#[derive(Parser, Debug)]
#[command(name = "voice-fixtures")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory the fixtures are written to (must already exist)
    #[arg(
        short,
        long,
        env = "VOICE_FIXTURES_DIR",
        default_value = "app/src/main/assets"
    )]
    output_dir: PathBuf,

    /// JSON manifest replacing the built-in fixture list
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Sample rate in Hz, overrides the manifest
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Noise seed, overrides the manifest
    #[arg(long)]
    seed: Option<u64>,

    /// Print the effective manifest as JSON and exit
    #[arg(long)]
    print_manifest: bool,
}

fn load_manifest(cli: &Cli) -> anyhow::Result<FixtureManifest> {
    let mut manifest = match &cli.manifest {
        Some(path) => FixtureManifest::load(path)
            .with_context(|| format!("Failed to load manifest {}", path.display()))?,
        None => FixtureManifest::default(),
    };

    if let Some(sample_rate) = cli.sample_rate {
        manifest.sample_rate = sample_rate;
    }
    if let Some(seed) = cli.seed {
        manifest.seed = Some(seed);
    }

    Ok(manifest)
}

fn print_fixture(report: &FixtureReport) {
    println!("\nCreated audio file: {}", report.path.display());
    if !report.description.is_empty() {
        println!("  - Description: {}", report.description);
    }
    println!("  - Style: {}", report.style);
    println!("  - Duration: {:.1} s", report.duration_seconds);
    println!("  - File size: {}", format_size(report.file_size_bytes));
    if report.clipped > 0 {
        println!("  - Clamped samples: {}", report.clipped);
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "\nDone! Created {} test audio files (noise seed {})",
        summary.fixtures.len(),
        summary.seed
    );
    println!("These are synthetic voices for exercising VAD and STT.");
    println!("They carry no words, only the spectral shape of a human voice.");

    println!("\nContents of {}:", summary.output_dir.display());
    for entry in &summary.directory {
        println!("   {} ({})", entry.name, format_size(entry.size_bytes));
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let manifest = load_manifest(&cli)?;

    if cli.print_manifest {
        println!("{}", manifest.to_json_pretty()?);
        return Ok(());
    }

    let driver = FixtureDriver::new(&cli.output_dir, manifest).context("Invalid manifest")?;

    println!("Generating test audio fixtures...");
    println!("Target directory: {}", driver.output_dir().display());

    let summary = driver.run_with(print_fixture)?;
    print_summary(&summary);

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(FixtureError::OutputDirMissing(dir)) = err.downcast_ref::<FixtureError>() {
                eprintln!("Output directory does not exist: {}", dir.display());
            } else {
                eprintln!("Error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
