//! Synthetic speech fixtures for voice-activity-detection and speech-to-text tests.
//!
//! The crate renders voice-like harmonic signals, quantizes them to 16-bit
//! PCM and writes them as mono WAV files. A [`FixtureDriver`] runs a whole
//! [`FixtureManifest`] against an output directory.
//!
//! ```no_run
//! use voice_fixtures::{FixtureDriver, FixtureManifest};
//!
//! let driver = FixtureDriver::new("app/src/main/assets", FixtureManifest::default())?;
//! let summary = driver.run()?;
//! println!("wrote {} files with seed {}", summary.fixtures.len(), summary.seed);
//! # Ok::<(), voice_fixtures::FixtureError>(())
//! ```

mod buffer;
mod driver;
mod error;
mod manifest;
mod synth;
mod utils;
mod wav;

pub use buffer::SampleBuffer;
pub use driver::{DirEntryInfo, FixtureDriver, FixtureReport, RunSummary, list_directory};
pub use error::{ErrorKind, FixtureError, FixtureResult};
pub use manifest::{FixtureDescriptor, FixtureManifest};
pub use synth::{
    DEFAULT_SAMPLE_RATE, SteadyParams, SynthesisParams, SynthesisRequest, SynthesisStyle,
    Synthesizer, VariedParams, instantaneous_frequency, synthesize,
};
pub use utils::{fixture_rng, format_size};
pub use wav::{
    WAV_HEADER_BYTES, WavFileSpec, WavInfo, WavReport, inspect_wav, read_wav, verify_wav,
    write_wav,
};
