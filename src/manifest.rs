//! The list of fixtures to generate and the settings they share.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FixtureError, FixtureResult};
use crate::synth::{DEFAULT_SAMPLE_RATE, SynthesisParams, SynthesisRequest, SynthesisStyle};

/// One file to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureDescriptor {
    /// Plain file name, written inside the output directory.
    pub filename: String,
    pub duration_seconds: f64,
    pub style: SynthesisStyle,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl FixtureDescriptor {
    pub fn new(filename: impl Into<String>, duration_seconds: f64, style: SynthesisStyle) -> Self {
        Self {
            filename: filename.into(),
            duration_seconds,
            style,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Reject names that would escape the output directory.
    pub fn validate_filename(&self) -> FixtureResult<()> {
        let name = self.filename.as_str();
        let is_plain = Path::new(name)
            .file_name()
            .is_some_and(|file_name| file_name == name);
        if name.is_empty() || !is_plain {
            return Err(FixtureError::InvalidFilename(self.filename.clone()));
        }
        Ok(())
    }

    /// Build the synthesis request for this fixture.
    pub fn request(&self, sample_rate: u32) -> FixtureResult<SynthesisRequest> {
        SynthesisRequest::new(self.style, self.duration_seconds, sample_rate)
    }
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

/// Everything the driver needs besides the output directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureManifest {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Noise seed. A fresh one is drawn per run when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub params: SynthesisParams,
    pub fixtures: Vec<FixtureDescriptor>,
}

impl Default for FixtureManifest {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            seed: None,
            params: SynthesisParams::default(),
            fixtures: vec![
                FixtureDescriptor::new("test_audio_hello.wav", 1.5, SynthesisStyle::Steady)
                    .with_description("Simple synthetic speech, stands in for \"hello\""),
                FixtureDescriptor::new("test_audio_thanks.wav", 2.0, SynthesisStyle::Steady)
                    .with_description("Simple synthetic speech, stands in for \"thanks\""),
                FixtureDescriptor::new("test_audio_question.wav", 3.5, SynthesisStyle::Varied)
                    .with_description("Varied synthetic speech, stands in for a spoken question"),
                FixtureDescriptor::new("test_voice_sample.wav", 2.5, SynthesisStyle::Varied)
                    .with_description("General purpose test voice"),
            ],
        }
    }
}

impl FixtureManifest {
    /// Parse a manifest from JSON.
    pub fn from_json(json: &str) -> FixtureResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a manifest from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> FixtureResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| FixtureError::io(path, e))?;
        Self::from_json(&json)
    }

    pub fn to_json_pretty(&self) -> FixtureResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate every fixture and setting before anything is written.
    pub fn validate(&self) -> FixtureResult<()> {
        if self.fixtures.is_empty() {
            return Err(FixtureError::EmptyFixtureList);
        }
        self.params.validate()?;
        for fixture in &self.fixtures {
            fixture.validate_filename()?;
            fixture.request(self.sample_rate)?;
        }
        Ok(())
    }
}
