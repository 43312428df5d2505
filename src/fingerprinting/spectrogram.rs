use chfft::RFft1D;

/// Number of samples per FFT window
pub const FFT_WINDOW_SIZE: usize = 4096;

/// Overlap between consecutive windows (50%)
pub const FFT_OVERLAP: usize = FFT_WINDOW_SIZE / 2;

/// Hop between consecutive windows, in samples
pub const FFT_STEP: usize = FFT_WINDOW_SIZE - FFT_OVERLAP;

/// Number of useful bins of the one-sided power spectrum
pub const FFT_OUTPUT_BINS: usize = FFT_WINDOW_SIZE / 2 + 1;

/// Power floor applied before taking the logarithm, to avoid -inf cells
const POWER_FLOOR: f32 = 1e-20;

/// A log-magnitude short-time Fourier spectrogram.
///
/// Stored time-major: one `Vec` of `FFT_OUTPUT_BINS` log-power values per time
/// frame. Each cell holds `ln(max(power, 1e-20))`; the natural log compresses
/// the heavy-tailed raw magnitudes so that a quantile-based cutoff over the
/// cell values is meaningful.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    frames: Vec<Vec<f32>>,
    frequency_bin_hz: f32,
    time_bin_seconds: f32,
}

impl Spectrogram {
    /// Compute the spectrogram of a mono s16 PCM buffer.
    ///
    /// Uses a 4096-point Hann-windowed FFT with 50% overlap. Only full windows
    /// are analyzed: a buffer shorter than one window yields an empty
    /// spectrogram.
    pub fn from_pcm(s16_mono_buffer: &[i16], sample_rate: u32) -> Spectrogram {
        let samples: Vec<f32> = s16_mono_buffer.iter().map(|&s| s as f32).collect();
        Self::from_scaled_samples(&samples, sample_rate)
    }

    /// Compute the spectrogram of a mono float buffer normalized to [-1, 1].
    ///
    /// Samples are rescaled by 2^15 first, so the log and quantile math runs
    /// in the same numeric range as the s16 entry point.
    pub fn from_normalized(mono_buffer: &[f32], sample_rate: u32) -> Spectrogram {
        let samples: Vec<f32> = mono_buffer.iter().map(|&s| s * 32768.0).collect();
        Self::from_scaled_samples(&samples, sample_rate)
    }

    /// Build a spectrogram from precomputed log-power frames.
    ///
    /// Frames are time-major and must all have the same bin count.
    pub fn from_frames(
        frames: Vec<Vec<f32>>,
        frequency_bin_hz: f32,
        time_bin_seconds: f32,
    ) -> Spectrogram {
        Spectrogram {
            frames,
            frequency_bin_hz,
            time_bin_seconds,
        }
    }

    fn from_scaled_samples(samples: &[f32], sample_rate: u32) -> Spectrogram {
        let mut frames = Vec::new();

        if samples.len() >= FFT_WINDOW_SIZE {
            let window = hann_window(FFT_WINDOW_SIZE);
            let mut fft_object = RFft1D::<f32>::new(FFT_WINDOW_SIZE);
            let mut windowed = vec![0.0f32; FFT_WINDOW_SIZE];

            let mut start = 0;
            while start + FFT_WINDOW_SIZE <= samples.len() {
                for (index, multiplier) in window.iter().enumerate() {
                    windowed[index] = samples[start + index] * multiplier;
                }

                let complex_fft_results = fft_object.forward(&windowed);

                let mut log_power = Vec::with_capacity(FFT_OUTPUT_BINS);
                for bin in complex_fft_results.iter().take(FFT_OUTPUT_BINS) {
                    let power = bin.re * bin.re + bin.im * bin.im;
                    // max() also maps NaN cells onto the floor
                    log_power.push(power.max(POWER_FLOOR).ln());
                }

                frames.push(log_power);
                start += FFT_STEP;
            }
        }

        Spectrogram {
            frames,
            frequency_bin_hz: sample_rate as f32 / FFT_WINDOW_SIZE as f32,
            time_bin_seconds: FFT_STEP as f32 / sample_rate as f32,
        }
    }

    /// Amplitude threshold below which `frac` of the spectrogram cells lie.
    ///
    /// Sorts the flattened cell values and picks the element at index
    /// `floor(N * frac)`, clamped to the last element so that `frac = 1.0`
    /// saturates to the global maximum. Returns `None` for an empty
    /// spectrogram.
    pub fn amplitude_cutoff(&self, frac: f32) -> Option<f32> {
        let mut flattened: Vec<f32> = self.frames.iter().flatten().copied().collect();
        if flattened.is_empty() {
            return None;
        }

        flattened.sort_unstable_by(|a, b| a.total_cmp(b));

        let index = ((flattened.len() as f64) * frac as f64) as usize;
        Some(flattened[index.min(flattened.len() - 1)])
    }

    /// Time-major log-power frames
    pub fn frames(&self) -> &[Vec<f32>] {
        &self.frames
    }

    /// Number of time frames
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Number of frequency bins per frame
    pub fn num_bins(&self) -> usize {
        self.frames.first().map(|f| f.len()).unwrap_or(0)
    }

    /// Whether the spectrogram holds no frames at all
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Width of one frequency bin, in Hz
    pub fn frequency_bin_hz(&self) -> f32 {
        self.frequency_bin_hz
    }

    /// Width of one time bin, in seconds
    pub fn time_bin_seconds(&self) -> f32 {
        self.time_bin_seconds
    }
}

/// Hann (raised-cosine) taper of the given length
fn hann_window(length: usize) -> Vec<f32> {
    (0..length)
        .map(|index| {
            0.5 - 0.5
                * (2.0 * std::f32::consts::PI * index as f32 / (length - 1) as f32).cos()
        })
        .collect()
}
