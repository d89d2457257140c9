//! Runs a [`FixtureManifest`] against an output directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{FixtureError, FixtureResult};
use crate::manifest::{FixtureDescriptor, FixtureManifest};
use crate::synth::{SynthesisStyle, Synthesizer};
use crate::utils::fixture_rng;
use crate::wav::{verify_wav, write_wav};

/// Outcome of one generated fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureReport {
    pub filename: String,
    pub description: String,
    pub path: PathBuf,
    pub style: SynthesisStyle,
    pub sample_rate: u32,
    pub sample_count: usize,
    pub duration_seconds: f64,
    pub file_size_bytes: u64,
    /// Samples that had to be clamped into the 16-bit range.
    pub clipped: usize,
}

/// A regular file found in the output directory after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub size_bytes: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    /// Seed the noise streams were derived from.
    pub seed: u64,
    pub fixtures: Vec<FixtureReport>,
    pub directory: Vec<DirEntryInfo>,
}

/// List the regular files of `dir` with their sizes, sorted by name.
pub fn list_directory(dir: impl AsRef<Path>) -> FixtureResult<Vec<DirEntryInfo>> {
    let dir = dir.as_ref();
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| FixtureError::io(dir, e))? {
        let entry = entry.map_err(|e| FixtureError::io(dir, e))?;
        let metadata = entry
            .metadata()
            .map_err(|e| FixtureError::io(entry.path(), e))?;
        if metadata.is_file() {
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                size_bytes: metadata.len(),
            });
        }
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Synthesizes and writes every fixture of a manifest, one after another.
#[derive(Debug)]
pub struct FixtureDriver {
    output_dir: PathBuf,
    manifest: FixtureManifest,
    synthesizer: Synthesizer,
}

impl FixtureDriver {
    /// Create a driver for `manifest` writing into `output_dir`.
    ///
    /// # Returns
    /// Returns an error if the manifest fails validation. The output
    /// directory is only checked when the driver runs.
    pub fn new(output_dir: impl Into<PathBuf>, manifest: FixtureManifest) -> FixtureResult<Self> {
        manifest.validate()?;
        let synthesizer = Synthesizer::new(manifest.params.clone())?;
        Ok(Self {
            output_dir: output_dir.into(),
            manifest,
            synthesizer,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn manifest(&self) -> &FixtureManifest {
        &self.manifest
    }

    /// Generate all fixtures.
    pub fn run(&self) -> FixtureResult<RunSummary> {
        self.run_with(|_| {})
    }

    /// Generate all fixtures, calling `on_fixture` after each file is written
    /// and verified.
    ///
    /// Stops at the first error. Files written before the error stay in place.
    pub fn run_with<F>(&self, mut on_fixture: F) -> FixtureResult<RunSummary>
    where
        F: FnMut(&FixtureReport),
    {
        if !self.output_dir.is_dir() {
            return Err(FixtureError::OutputDirMissing(self.output_dir.clone()));
        }

        let seed = self.manifest.seed.unwrap_or_else(rand::random);
        info!(
            "Generating {} fixtures in {} (seed {seed})",
            self.manifest.fixtures.len(),
            self.output_dir.display()
        );

        let mut fixtures = Vec::with_capacity(self.manifest.fixtures.len());
        for (index, descriptor) in self.manifest.fixtures.iter().enumerate() {
            let report = self.generate(index, descriptor, seed)?;
            on_fixture(&report);
            fixtures.push(report);
        }

        let directory = list_directory(&self.output_dir)?;

        Ok(RunSummary {
            output_dir: self.output_dir.clone(),
            seed,
            fixtures,
            directory,
        })
    }

    fn generate(
        &self,
        index: usize,
        descriptor: &FixtureDescriptor,
        seed: u64,
    ) -> FixtureResult<FixtureReport> {
        let request = descriptor.request(self.manifest.sample_rate)?;
        let path = self.output_dir.join(&descriptor.filename);
        debug!(
            "Fixture {index}: {} ({}, {:.2}s)",
            descriptor.filename,
            request.style(),
            request.duration_seconds()
        );

        let mut rng = fixture_rng(seed, index);
        let buffer = self.synthesizer.synthesize(&request, &mut rng)?;
        if buffer.clipped() > 0 {
            warn!(
                "{}: clamped {} of {} samples into the 16-bit range",
                descriptor.filename,
                buffer.clipped(),
                buffer.len()
            );
        }

        let written = write_wav(&path, &buffer)?;
        verify_wav(&path, &buffer)?;

        Ok(FixtureReport {
            filename: descriptor.filename.clone(),
            description: descriptor.description.clone(),
            path: written.path,
            style: request.style(),
            sample_rate: buffer.sample_rate(),
            sample_count: written.sample_count,
            duration_seconds: written.duration_seconds,
            file_size_bytes: written.file_size_bytes,
            clipped: buffer.clipped(),
        })
    }
}
