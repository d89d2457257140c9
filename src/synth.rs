//! Speech-like waveform synthesis.
//!
//! Two styles are available. [`SynthesisStyle::Steady`] is a fixed-pitch
//! harmonic stack under a raised-sine envelope. [`SynthesisStyle::Varied`]
//! integrates a slowly modulated pitch contour into a phase trajectory and
//! shapes the result into syllable-like pulses. Both add a little Gaussian
//! noise so the output is not perfectly periodic.

use std::f64::consts::PI;
use std::fmt;

use log::debug;
use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::buffer::SampleBuffer;
use crate::error::{FixtureError, FixtureResult};

/// Sample rate used when none is given (16kHz, what most VAD/STT models expect)
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

// Largest sample count whose 16-bit payload still fits a RIFF size field.
const MAX_SAMPLES: u64 = (u32::MAX as u64 - 36) / 2;

/// Shape of the synthesized voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisStyle {
    /// Fixed fundamental with a smooth fade in and out.
    #[serde(alias = "simple")]
    Steady,
    /// Frequency-modulated fundamental with syllable-like amplitude pulses.
    Varied,
}

impl fmt::Display for SynthesisStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisStyle::Steady => write!(f, "steady"),
            SynthesisStyle::Varied => write!(f, "varied"),
        }
    }
}

/// A validated request for one block of synthetic speech.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisRequest {
    style: SynthesisStyle,
    duration_seconds: f64,
    sample_rate: u32,
}

impl SynthesisRequest {
    /// Create a new synthesis request
    ///
    /// # Arguments
    /// * `style` - Which voice model to render
    /// * `duration_seconds` - Length of the output, must be positive and finite
    /// * `sample_rate` - Output sample rate in Hz, must be greater than 0
    ///
    /// # Returns
    /// Returns an `InvalidDuration` error when the duration is not positive, or
    /// when it rounds to zero samples or to more samples than a WAV file can hold.
    pub fn new(
        style: SynthesisStyle,
        duration_seconds: f64,
        sample_rate: u32,
    ) -> FixtureResult<Self> {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(FixtureError::InvalidDuration(duration_seconds));
        }

        if sample_rate == 0 {
            return Err(FixtureError::InvalidSampleRate(sample_rate));
        }

        let count = (duration_seconds * sample_rate as f64).round();
        if count < 1.0 || count > MAX_SAMPLES as f64 {
            return Err(FixtureError::InvalidDuration(duration_seconds));
        }

        Ok(Self {
            style,
            duration_seconds,
            sample_rate,
        })
    }

    /// Same as [`SynthesisRequest::new`] at [`DEFAULT_SAMPLE_RATE`].
    pub fn with_default_rate(style: SynthesisStyle, duration_seconds: f64) -> FixtureResult<Self> {
        Self::new(style, duration_seconds, DEFAULT_SAMPLE_RATE)
    }

    pub fn style(&self) -> SynthesisStyle {
        self.style
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples the request produces: `round(duration * sample_rate)`.
    pub fn sample_count(&self) -> usize {
        (self.duration_seconds * self.sample_rate as f64).round() as usize
    }

    /// Evenly spaced sample instants over `[0, duration)`.
    pub fn time_axis(&self) -> Array1<f64> {
        let n = self.sample_count();
        let step = self.duration_seconds / n as f64;
        Array1::from_shape_fn(n, |i| i as f64 * step)
    }
}

/// Constants for the steady harmonic voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteadyParams {
    pub fundamental_hz: f64,
    /// Weight of the fundamental, then of each successive harmonic.
    pub harmonic_weights: Vec<f64>,
    pub noise_std: f64,
    pub gain: f64,
}

impl Default for SteadyParams {
    fn default() -> Self {
        Self {
            fundamental_hz: 200.0,
            harmonic_weights: vec![0.4, 0.3, 0.2, 0.1],
            noise_std: 0.02,
            gain: 0.7,
        }
    }
}

/// Constants for the frequency-modulated voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariedParams {
    pub base_hz: f64,
    /// Peak pitch excursion around `base_hz`.
    pub deviation_hz: f64,
    /// Rate of the pitch contour.
    pub modulation_hz: f64,
    pub harmonic_weights: Vec<f64>,
    /// Number of amplitude pulses across the whole duration.
    pub syllables: u32,
    pub noise_std: f64,
    pub gain: f64,
}

impl Default for VariedParams {
    fn default() -> Self {
        Self {
            base_hz: 180.0,
            deviation_hz: 50.0,
            modulation_hz: 0.5,
            harmonic_weights: vec![0.5, 0.3, 0.2],
            syllables: 3,
            noise_std: 0.03,
            gain: 0.6,
        }
    }
}

/// All tunable synthesis constants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisParams {
    pub steady: SteadyParams,
    pub varied: VariedParams,
}

fn ensure(name: &'static str, ok: bool, reason: &str) -> FixtureResult<()> {
    if ok {
        Ok(())
    } else {
        Err(FixtureError::InvalidParameter {
            name,
            reason: reason.to_string(),
        })
    }
}

fn ensure_weights(name: &'static str, weights: &[f64]) -> FixtureResult<()> {
    ensure(name, !weights.is_empty(), "at least one weight is required")?;
    ensure(
        name,
        weights.iter().all(|w| w.is_finite()),
        "weights must be finite",
    )
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl SynthesisParams {
    /// Check every constant before any sample is rendered.
    pub fn validate(&self) -> FixtureResult<()> {
        let s = &self.steady;
        ensure(
            "steady.fundamental_hz",
            positive(s.fundamental_hz),
            "must be positive",
        )?;
        ensure_weights("steady.harmonic_weights", &s.harmonic_weights)?;
        ensure("steady.noise_std", non_negative(s.noise_std), "must be >= 0")?;
        ensure("steady.gain", non_negative(s.gain), "must be >= 0")?;

        let v = &self.varied;
        ensure("varied.base_hz", positive(v.base_hz), "must be positive")?;
        ensure(
            "varied.deviation_hz",
            non_negative(v.deviation_hz) && v.deviation_hz < v.base_hz,
            "must be >= 0 and below base_hz",
        )?;
        ensure(
            "varied.modulation_hz",
            positive(v.modulation_hz),
            "must be positive",
        )?;
        ensure_weights("varied.harmonic_weights", &v.harmonic_weights)?;
        ensure("varied.syllables", v.syllables >= 1, "must be at least 1")?;
        ensure("varied.noise_std", non_negative(v.noise_std), "must be >= 0")?;
        ensure("varied.gain", non_negative(v.gain), "must be >= 0")
    }
}

/// Instantaneous pitch of the varied voice at each instant of `t`.
///
/// Always within `base_hz ± deviation_hz`.
pub fn instantaneous_frequency(t: &Array1<f64>, params: &VariedParams) -> Array1<f64> {
    t.mapv(|t| params.base_hz + params.deviation_hz * (2.0 * PI * params.modulation_hz * t).sin())
}

/// Running-sum integration of a frequency contour into a phase trajectory.
fn integrate_phase(frequency: &Array1<f64>, sample_rate: u32) -> Array1<f64> {
    let step = 2.0 * PI / sample_rate as f64;
    Array1::from_iter(frequency.iter().scan(0.0, |acc, &f| {
        *acc += f;
        Some(*acc * step)
    }))
}

/// `sum_k weights[k] * sin((k + 1) * phase)`
fn harmonic_stack(phase: &Array1<f64>, weights: &[f64]) -> Array1<f64> {
    weights
        .iter()
        .enumerate()
        .fold(Array1::<f64>::zeros(phase.len()), |acc, (k, &w)| {
            let n = (k + 1) as f64;
            acc + phase.mapv(|p| w * (n * p).sin())
        })
}

fn add_noise<R: Rng + ?Sized>(
    signal: &mut Array1<f64>,
    std_dev: f64,
    rng: &mut R,
) -> FixtureResult<()> {
    if std_dev == 0.0 {
        return Ok(());
    }
    let normal = Normal::new(0.0, std_dev).map_err(|e| FixtureError::InvalidParameter {
        name: "noise_std",
        reason: e.to_string(),
    })?;
    signal.iter_mut().for_each(|x| *x += normal.sample(rng));
    Ok(())
}

/// Renders [`SynthesisRequest`]s with a fixed set of [`SynthesisParams`].
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    params: SynthesisParams,
}

impl Synthesizer {
    /// Create a synthesizer, rejecting invalid constants up front.
    pub fn new(params: SynthesisParams) -> FixtureResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &SynthesisParams {
        &self.params
    }

    /// Render the float signal for `request`, before quantization.
    pub fn render<R: Rng + ?Sized>(
        &self,
        request: &SynthesisRequest,
        rng: &mut R,
    ) -> FixtureResult<Array1<f64>> {
        let t = request.time_axis();
        let duration = request.duration_seconds();

        debug!(
            "Rendering {} voice: {} samples at {} Hz",
            request.style(),
            t.len(),
            request.sample_rate()
        );

        match request.style() {
            SynthesisStyle::Steady => {
                let p = &self.params.steady;
                let phase = t.mapv(|t| 2.0 * PI * p.fundamental_hz * t);
                let envelope = t.mapv(|t| (PI * t / duration).sin().powi(2));

                let mut signal = harmonic_stack(&phase, &p.harmonic_weights) * &envelope;
                add_noise(&mut signal, p.noise_std, rng)?;
                signal.mapv_inplace(|x| x * p.gain);
                Ok(signal)
            }
            SynthesisStyle::Varied => {
                let p = &self.params.varied;
                let frequency = instantaneous_frequency(&t, p);
                let phase = integrate_phase(&frequency, request.sample_rate());

                let syllables = p.syllables as f64;
                let syllable_envelope = t.mapv(|t| (syllables * PI * t / duration).sin().powi(4));
                let overall_envelope = t.mapv(|t| (PI * t / duration).sin());

                let mut signal = harmonic_stack(&phase, &p.harmonic_weights)
                    * &syllable_envelope
                    * &overall_envelope;
                add_noise(&mut signal, p.noise_std, rng)?;
                signal.mapv_inplace(|x| x * p.gain);
                Ok(signal)
            }
        }
    }

    /// Render `request` and quantize it to 16-bit PCM.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        request: &SynthesisRequest,
        rng: &mut R,
    ) -> FixtureResult<SampleBuffer> {
        let signal = self.render(request, rng)?;
        Ok(SampleBuffer::quantize(signal.iter().copied(), request.sample_rate()))
    }
}

/// Synthesize one buffer with the default constants.
///
/// # Example
/// ```
/// use rand::SeedableRng;
/// use voice_fixtures::{synthesize, SynthesisStyle};
///
/// let mut rng = rand_pcg::Pcg32::seed_from_u64(7);
/// let buffer = synthesize(SynthesisStyle::Steady, 0.5, 16000, &mut rng).unwrap();
/// assert_eq!(buffer.len(), 8000);
/// ```
pub fn synthesize<R: Rng + ?Sized>(
    style: SynthesisStyle,
    duration_seconds: f64,
    sample_rate: u32,
    rng: &mut R,
) -> FixtureResult<SampleBuffer> {
    let request = SynthesisRequest::new(style, duration_seconds, sample_rate)?;
    Synthesizer::default().synthesize(&request, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn silent_params() -> SynthesisParams {
        let mut params = SynthesisParams::default();
        params.steady.noise_std = 0.0;
        params.varied.noise_std = 0.0;
        params
    }

    fn rms(samples: &[i16]) -> f64 {
        let sum: f64 = samples.iter().map(|&s| (s as f64).powi(2)).sum();
        (sum / samples.len() as f64).sqrt()
    }

    #[test]
    fn test_sample_count_matches_duration() {
        let cases = [
            (1.5, 16000, 24000),
            (2.0, 16000, 32000),
            (3.5, 16000, 56000),
            (2.5, 16000, 40000),
            (0.1234, 16000, 1974),
            (1.0, 44100, 44100),
            (0.33333, 8000, 2667),
        ];
        let mut rng = Pcg32::seed_from_u64(1);

        for (duration, rate, expected) in cases {
            for style in [SynthesisStyle::Steady, SynthesisStyle::Varied] {
                let buffer = synthesize(style, duration, rate, &mut rng).unwrap();
                assert_eq!(buffer.len(), expected, "{style} {duration}s @ {rate}Hz");
                assert_eq!(buffer.sample_rate(), rate);
            }
        }
    }

    #[test]
    fn test_invalid_duration() {
        for duration in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = SynthesisRequest::new(SynthesisStyle::Steady, duration, 16000);
            assert!(matches!(result, Err(FixtureError::InvalidDuration(_))));
        }
    }

    #[test]
    fn test_duration_rounding_to_zero_samples() {
        let result = SynthesisRequest::new(SynthesisStyle::Varied, 1e-6, 16000);
        assert!(matches!(result, Err(FixtureError::InvalidDuration(_))));
    }

    #[test]
    fn test_duration_too_long_for_wav() {
        let result = SynthesisRequest::new(SynthesisStyle::Steady, 1.0e6, 48000);
        assert!(matches!(result, Err(FixtureError::InvalidDuration(_))));
    }

    #[test]
    fn test_invalid_sample_rate() {
        let result = SynthesisRequest::new(SynthesisStyle::Steady, 1.0, 0);
        assert!(matches!(result, Err(FixtureError::InvalidSampleRate(0))));
    }

    #[test]
    fn test_time_axis_excludes_endpoint() {
        let request = SynthesisRequest::new(SynthesisStyle::Steady, 1.0, 4).unwrap();
        let t = request.time_axis();
        assert_eq!(t.to_vec(), vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_default_fixture_durations_stay_in_range() {
        let synth = Synthesizer::default();
        let mut rng = Pcg32::seed_from_u64(2024);
        let fixtures = [
            (SynthesisStyle::Steady, 1.5),
            (SynthesisStyle::Steady, 2.0),
            (SynthesisStyle::Varied, 3.5),
            (SynthesisStyle::Varied, 2.5),
        ];

        for (style, duration) in fixtures {
            let request = SynthesisRequest::with_default_rate(style, duration).unwrap();
            let signal = synth.render(&request, &mut rng).unwrap();
            assert!(
                signal.iter().all(|x| x.abs() < 1.0),
                "{style} {duration}s would overflow i16"
            );

            let buffer = SampleBuffer::quantize(signal.iter().copied(), request.sample_rate());
            assert_eq!(buffer.clipped(), 0);
            assert_eq!(buffer.len(), request.sample_count());
        }
    }

    #[test]
    fn test_steady_envelope_boundaries() {
        let synth = Synthesizer::new(silent_params()).unwrap();
        let mut rng = Pcg32::seed_from_u64(0);
        let request = SynthesisRequest::with_default_rate(SynthesisStyle::Steady, 1.5).unwrap();
        let buffer = synth.synthesize(&request, &mut rng).unwrap();
        let samples = buffer.samples();

        assert_eq!(samples[0], 0);
        assert!(samples[samples.len() - 1].abs() <= 1);
        assert!(buffer.peak() > 5000);
    }

    #[test]
    fn test_steady_edges_quieter_than_middle_with_noise() {
        let mut rng = Pcg32::seed_from_u64(99);
        let buffer = synthesize(SynthesisStyle::Steady, 1.5, 16000, &mut rng).unwrap();
        let samples = buffer.samples();

        let edge = rms(&samples[..160]);
        let tail = rms(&samples[samples.len() - 160..]);
        let mid = samples.len() / 2;
        let middle = rms(&samples[mid - 800..mid + 800]);

        assert!(edge * 3.0 < middle, "edge {edge} vs middle {middle}");
        assert!(tail * 3.0 < middle, "tail {tail} vs middle {middle}");
    }

    #[test]
    fn test_varied_frequency_within_bounds() {
        let params = VariedParams::default();
        let request = SynthesisRequest::with_default_rate(SynthesisStyle::Varied, 3.5).unwrap();
        let frequency = instantaneous_frequency(&request.time_axis(), &params);

        let min = frequency.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = frequency.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(min >= 130.0, "min {min}");
        assert!(max <= 230.0, "max {max}");
        assert!(min < 131.0 && max > 229.0);
    }

    #[test]
    fn test_integrate_phase_constant_frequency() {
        let frequency = Array1::from_elem(4, 1000.0);
        let phase = integrate_phase(&frequency, 4000);
        let expected = [PI / 2.0, PI, 1.5 * PI, 2.0 * PI];
        for (got, want) in phase.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_harmonic_stack_weights() {
        let phase = Array1::from_vec(vec![PI / 2.0]);
        // sin(pi/2) * 1.0 + sin(pi) * 0.5 + sin(3pi/2) * 0.25
        let stack = harmonic_stack(&phase, &[1.0, 0.5, 0.25]);
        assert!((stack[0] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_varied_syllable_gaps() {
        let synth = Synthesizer::new(silent_params()).unwrap();
        let mut rng = Pcg32::seed_from_u64(0);
        // 48000 samples, so the syllable boundaries land exactly on samples
        let request = SynthesisRequest::with_default_rate(SynthesisStyle::Varied, 3.0).unwrap();
        let buffer = synth.synthesize(&request, &mut rng).unwrap();
        let samples = buffer.samples();

        assert_eq!(samples[0], 0);
        assert!(samples[16000].abs() <= 1);
        assert!(samples[32000].abs() <= 1);
        assert!(buffer.peak() > 3000);
    }

    #[test]
    fn test_seeded_output_is_reproducible() {
        let a = synthesize(
            SynthesisStyle::Varied,
            1.0,
            16000,
            &mut Pcg32::seed_from_u64(5),
        )
        .unwrap();
        let b = synthesize(
            SynthesisStyle::Varied,
            1.0,
            16000,
            &mut Pcg32::seed_from_u64(5),
        )
        .unwrap();
        let c = synthesize(
            SynthesisStyle::Varied,
            1.0,
            16000,
            &mut Pcg32::seed_from_u64(6),
        )
        .unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_extreme_gain_is_clamped_and_counted() {
        let mut params = silent_params();
        params.steady.gain = 10.0;
        let synth = Synthesizer::new(params).unwrap();
        let request = SynthesisRequest::with_default_rate(SynthesisStyle::Steady, 0.5).unwrap();
        let buffer = synth
            .synthesize(&request, &mut Pcg32::seed_from_u64(0))
            .unwrap();

        assert!(buffer.clipped() > 0);
        assert_eq!(buffer.peak(), 32768);
    }

    #[test]
    fn test_params_validation() {
        assert!(SynthesisParams::default().validate().is_ok());

        let mut params = SynthesisParams::default();
        params.steady.noise_std = -0.1;
        assert!(matches!(
            params.validate(),
            Err(FixtureError::InvalidParameter {
                name: "steady.noise_std",
                ..
            })
        ));

        let mut params = SynthesisParams::default();
        params.varied.deviation_hz = 200.0;
        assert!(matches!(
            params.validate(),
            Err(FixtureError::InvalidParameter {
                name: "varied.deviation_hz",
                ..
            })
        ));

        let mut params = SynthesisParams::default();
        params.varied.harmonic_weights.clear();
        assert!(Synthesizer::new(params).is_err());

        let mut params = SynthesisParams::default();
        params.varied.syllables = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_style_serde() {
        let style: SynthesisStyle = serde_json::from_str("\"steady\"").unwrap();
        assert_eq!(style, SynthesisStyle::Steady);
        let style: SynthesisStyle = serde_json::from_str("\"simple\"").unwrap();
        assert_eq!(style, SynthesisStyle::Steady);
        let style: SynthesisStyle = serde_json::from_str("\"varied\"").unwrap();
        assert_eq!(style, SynthesisStyle::Varied);
        assert_eq!(
            serde_json::to_string(&SynthesisStyle::Varied).unwrap(),
            "\"varied\""
        );
    }

    #[test]
    fn test_partial_params_use_defaults() {
        let params: SynthesisParams =
            serde_json::from_str(r#"{"steady": {"gain": 0.5}}"#).unwrap();
        assert_eq!(params.steady.gain, 0.5);
        assert_eq!(params.steady.fundamental_hz, 200.0);
        assert_eq!(params.varied, VariedParams::default());
    }
}
