/// A finished block of mono 16-bit PCM samples at a known sample rate.
///
/// Produced once by the synthesizer and handed to the WAV writer. The number
/// of samples that had to be clamped into the `i16` range during quantization
/// travels with the samples so callers can report it.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
    clipped: usize,
}

impl SampleBuffer {
    /// Wrap already quantized samples.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            clipped: 0,
        }
    }

    /// Quantize a float signal in [-1.0, 1.0] to 16-bit PCM.
    ///
    /// Each value is scaled by 32767, clamped to the `i16` range and
    /// truncated toward zero. Values that needed clamping are counted.
    pub fn quantize<I>(signal: I, sample_rate: u32) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut clipped = 0;
        let samples = signal
            .into_iter()
            .map(|x| {
                let scaled = x * i16::MAX as f64;
                if !(i16::MIN as f64..=i16::MAX as f64).contains(&scaled) {
                    clipped += 1;
                }
                scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16
            })
            .collect();

        Self {
            samples,
            sample_rate,
            clipped,
        }
    }

    /// Returns the number of samples in the buffer.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the buffer contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples that fell outside the `i16` range before clamping.
    pub fn clipped(&self) -> usize {
        self.clipped
    }

    /// Playback length in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Size in bytes of the PCM payload.
    pub fn data_bytes(&self) -> usize {
        self.samples.len() * std::mem::size_of::<i16>()
    }

    /// Largest absolute sample value, 0 for an empty buffer.
    pub fn peak(&self) -> u16 {
        self.samples
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sample_buffer() {
        let buffer = SampleBuffer::new(vec![1, 2, 3], 16000);
        assert_eq!(buffer.len(), 3);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.sample_rate(), 16000);
        assert_eq!(buffer.clipped(), 0);
        assert_eq!(buffer.data_bytes(), 6);
    }

    #[test]
    fn test_empty_sample_buffer() {
        let buffer = SampleBuffer::new(Vec::new(), 16000);
        assert!(buffer.is_empty());
        assert_eq!(buffer.peak(), 0);
        assert_eq!(buffer.duration_seconds(), 0.0);
    }

    #[test]
    fn test_quantize_in_range() {
        let buffer = SampleBuffer::quantize([0.0, 0.5, -0.5, 1.0, -1.0], 16000);
        assert_eq!(buffer.samples(), &[0, 16383, -16383, 32767, -32767]);
        assert_eq!(buffer.clipped(), 0);
    }

    #[test]
    fn test_quantize_truncates_toward_zero() {
        let buffer = SampleBuffer::quantize([1.9 / 32767.0, -1.9 / 32767.0], 8000);
        assert_eq!(buffer.samples(), &[1, -1]);
    }

    #[test]
    fn test_quantize_clamps_and_counts() {
        let buffer = SampleBuffer::quantize([1.5, -1.5, 0.25, 2.0], 16000);
        assert_eq!(buffer.samples()[0], i16::MAX);
        assert_eq!(buffer.samples()[1], i16::MIN);
        assert_eq!(buffer.samples()[3], i16::MAX);
        assert_eq!(buffer.clipped(), 3);
    }

    #[test]
    fn test_duration_and_peak() {
        let buffer = SampleBuffer::new(vec![0, -300, 200, 100], 4);
        assert_eq!(buffer.duration_seconds(), 1.0);
        assert_eq!(buffer.peak(), 300);

        let buffer = SampleBuffer::new(vec![i16::MIN], 1);
        assert_eq!(buffer.peak(), 32768);
    }
}
