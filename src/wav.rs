//! Mono 16-bit PCM WAV output.
//!
//! Files are written to a temporary file beside the destination and renamed
//! into place once `hound` has finalized the header, so the destination
//! either keeps its previous content or holds a complete file.

use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{info, warn};
use tempfile::{Builder, NamedTempFile};

use crate::buffer::SampleBuffer;
use crate::error::{FixtureError, FixtureResult};

/// Size of the canonical RIFF/WAVE header for 16-bit PCM.
pub const WAV_HEADER_BYTES: u64 = 44;

/// Header fields of the files this crate writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFileSpec {
    pub channels: u16,
    pub bits_per_sample: u16,
    pub sample_rate: u32,
}

impl WavFileSpec {
    /// Mono, 16 bits per sample.
    pub fn mono_pcm16(sample_rate: u32) -> Self {
        Self {
            channels: 1,
            bits_per_sample: 16,
            sample_rate,
        }
    }
}

impl From<WavFileSpec> for WavSpec {
    fn from(spec: WavFileSpec) -> Self {
        WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: SampleFormat::Int,
        }
    }
}

/// What [`write_wav`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct WavReport {
    pub path: PathBuf,
    pub sample_count: usize,
    pub duration_seconds: f64,
    pub file_size_bytes: u64,
}

/// Header and payload summary of an existing WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub channels: u16,
    pub bits_per_sample: u16,
    pub sample_rate: u32,
    /// Samples per channel.
    pub sample_count: u32,
    pub data_bytes: u64,
}

// tempfile creates 0600 files; new fixtures get the usual 0666 minus umask.
#[cfg(unix)]
fn new_temp_file(parent: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    Builder::new()
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(parent)
}

#[cfg(not(unix))]
fn new_temp_file(parent: &Path) -> io::Result<NamedTempFile> {
    Builder::new().tempfile_in(parent)
}

/// Write `buffer` as a mono 16-bit PCM WAV file at `path`.
///
/// Any existing file at `path` is replaced and its permissions are kept.
/// Fails when the parent directory is missing or not writable, in which case
/// an existing file at `path` is left untouched.
pub fn write_wav(path: impl AsRef<Path>, buffer: &SampleBuffer) -> FixtureResult<WavReport> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let existing = fs::metadata(path).ok().filter(|m| m.is_file());
    if existing.is_some() {
        warn!("Overwriting existing file {}", path.display());
    }

    let spec = WavFileSpec::mono_pcm16(buffer.sample_rate());
    let mut tmp = new_temp_file(parent).map_err(|e| FixtureError::io(parent, e))?;
    if let Some(metadata) = existing {
        tmp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| FixtureError::io(tmp.path(), e))?;
    }
    {
        let mut writer = WavWriter::new(BufWriter::new(tmp.as_file_mut()), spec.into())?;
        for &sample in buffer.samples() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }

    let file = tmp
        .persist(path)
        .map_err(|e| FixtureError::io(path, e.error))?;
    let file_size_bytes = file
        .metadata()
        .map_err(|e| FixtureError::io(path, e))?
        .len();

    info!(
        "Wrote {} ({} samples, {} bytes)",
        path.display(),
        buffer.len(),
        file_size_bytes
    );

    Ok(WavReport {
        path: path.to_path_buf(),
        sample_count: buffer.len(),
        duration_seconds: buffer.duration_seconds(),
        file_size_bytes,
    })
}

/// Read the header of the WAV file at `path`.
pub fn inspect_wav(path: impl AsRef<Path>) -> FixtureResult<WavInfo> {
    let path = path.as_ref();
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let sample_count = reader.duration();
    let data_bytes = reader.len() as u64 * (spec.bits_per_sample as u64).div_ceil(8);

    Ok(WavInfo {
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        sample_rate: spec.sample_rate,
        sample_count,
        data_bytes,
    })
}

/// Read every sample of a 16-bit WAV file back into a [`SampleBuffer`].
pub fn read_wav(path: impl AsRef<Path>) -> FixtureResult<SampleBuffer> {
    let mut reader = WavReader::open(path.as_ref())?;
    let sample_rate = reader.spec().sample_rate;
    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()?;
    Ok(SampleBuffer::new(samples, sample_rate))
}

/// Check that the file at `path` holds exactly what `buffer` describes.
pub fn verify_wav(path: impl AsRef<Path>, buffer: &SampleBuffer) -> FixtureResult<WavInfo> {
    let path = path.as_ref();
    let info = inspect_wav(path)?;
    let expected = WavFileSpec::mono_pcm16(buffer.sample_rate());

    let mismatch = |detail: String| FixtureError::HeaderMismatch {
        path: path.to_path_buf(),
        detail,
    };

    if info.channels != expected.channels || info.bits_per_sample != expected.bits_per_sample {
        return Err(mismatch(format!(
            "expected {} channel(s) at {} bits, found {} channel(s) at {} bits",
            expected.channels, expected.bits_per_sample, info.channels, info.bits_per_sample
        )));
    }
    if info.sample_rate != expected.sample_rate {
        return Err(mismatch(format!(
            "expected {} Hz, found {} Hz",
            expected.sample_rate, info.sample_rate
        )));
    }
    if info.sample_count as usize != buffer.len() {
        return Err(mismatch(format!(
            "expected {} samples, found {}",
            buffer.len(),
            info.sample_count
        )));
    }

    Ok(info)
}
