use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use songprint::fingerprinting::hashing::pair_peaks;
use songprint::fingerprinting::peaks::find_peaks;
use songprint::fingerprinting::spectrogram::{
    Spectrogram, FFT_OUTPUT_BINS, FFT_STEP, FFT_WINDOW_SIZE,
};
use songprint::{Fingerprint, Peak};

const SAMPLE_RATE: u32 = 44100;

fn tone(frequency: f64, duration_secs: f64, sample_rate: u32) -> Vec<i16> {
    let total = (duration_secs * sample_rate as f64) as usize;
    (0..total)
        .map(|n| {
            let t = n as f64 / sample_rate as f64;
            let phase = 2.0 * std::f64::consts::PI * frequency * t;
            (phase.sin() * 0.5 * i16::MAX as f64) as i16
        })
        .collect()
}

fn random_frames(num_frames: usize, num_bins: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_frames)
        .map(|_| (0..num_bins).map(|_| rng.gen::<f32>() * 40.0 - 46.0).collect())
        .collect()
}

#[test]
fn test_spectrogram_shape_and_bin_sizes() {
    let samples = tone(440.0, 1.0, SAMPLE_RATE);
    let spectrogram = Spectrogram::from_pcm(&samples, SAMPLE_RATE);

    let expected_frames = (samples.len() - FFT_WINDOW_SIZE) / FFT_STEP + 1;
    assert_eq!(spectrogram.num_frames(), expected_frames);
    assert_eq!(spectrogram.num_bins(), FFT_OUTPUT_BINS);

    let expected_df = SAMPLE_RATE as f32 / FFT_WINDOW_SIZE as f32;
    let expected_dt = FFT_STEP as f32 / SAMPLE_RATE as f32;
    assert!((spectrogram.frequency_bin_hz() - expected_df).abs() < 1e-4);
    assert!((spectrogram.time_bin_seconds() - expected_dt).abs() < 1e-7);
}

#[test]
fn test_short_signal_yields_empty_spectrogram() {
    let too_short = vec![0i16; FFT_WINDOW_SIZE - 1];
    let spectrogram = Spectrogram::from_pcm(&too_short, SAMPLE_RATE);
    assert!(spectrogram.is_empty());
    assert_eq!(spectrogram.amplitude_cutoff(0.77), None);
    assert!(find_peaks(&spectrogram, 0.0, 20).is_empty());

    let exactly_one_window = vec![1000i16; FFT_WINDOW_SIZE];
    let spectrogram = Spectrogram::from_pcm(&exactly_one_window, SAMPLE_RATE);
    assert_eq!(spectrogram.num_frames(), 1);
}

#[test]
fn test_normalized_and_pcm_entry_points_agree() {
    let pcm = tone(440.0, 0.5, SAMPLE_RATE);
    let normalized: Vec<f32> = pcm.iter().map(|&s| s as f32 / 32768.0).collect();

    let from_pcm = Spectrogram::from_pcm(&pcm, SAMPLE_RATE);
    let from_normalized = Spectrogram::from_normalized(&normalized, SAMPLE_RATE);

    // Rescaling by 2^15 is exact for these values, so the spectrograms agree
    // bit for bit
    assert_eq!(from_pcm.frames(), from_normalized.frames());
}

#[test]
fn test_cutoff_follows_the_quantile_law() {
    let spectrogram = Spectrogram::from_frames(random_frames(60, 80, 7), 10.0, 0.05);
    let total_cells = 60 * 80;

    for &frac in &[0.25f32, 0.5, 0.77, 0.9] {
        let cutoff = spectrogram.amplitude_cutoff(frac).unwrap();
        let above: usize = spectrogram
            .frames()
            .iter()
            .flatten()
            .filter(|&&value| value >= cutoff)
            .count();

        let expected = (total_cells as f64 * (1.0 - frac as f64)).ceil() as i64;
        assert!(
            (above as i64 - expected).abs() <= 1,
            "frac {}: {} cells above cutoff, expected about {}",
            frac,
            above,
            expected
        );
    }
}

#[test]
fn test_cutoff_saturates_at_the_bounds() {
    let spectrogram = Spectrogram::from_frames(random_frames(20, 30, 11), 10.0, 0.05);

    let flattened: Vec<f32> = spectrogram.frames().iter().flatten().copied().collect();
    let min = flattened.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = flattened.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

    assert_eq!(spectrogram.amplitude_cutoff(0.0), Some(min));
    assert_eq!(spectrogram.amplitude_cutoff(1.0), Some(max));
}

#[test]
fn test_peaks_match_brute_force_neighborhood_search() {
    let neighborhood = 3usize;
    let frames = random_frames(50, 40, 23);
    let spectrogram = Spectrogram::from_frames(frames.clone(), 10.0, 0.05);
    let cutoff = spectrogram.amplitude_cutoff(0.5).unwrap();

    let peaks = find_peaks(&spectrogram, cutoff, neighborhood);

    // A cell qualifies iff it is above the cutoff and no cell within the
    // diamond-shaped neighborhood exceeds it
    let mut expected = Vec::new();
    let radius = neighborhood as i32;
    for t in 0..frames.len() as i32 {
        for f in 0..frames[0].len() as i32 {
            let value = frames[t as usize][f as usize];
            if value < cutoff {
                continue;
            }

            let mut dominated = false;
            for dt in -radius..=radius {
                for df in -(radius - dt.abs())..=(radius - dt.abs()) {
                    let (nt, nf) = (t + dt, f + df);
                    if nt < 0 || nf < 0 || nt >= frames.len() as i32 || nf >= frames[0].len() as i32
                    {
                        continue;
                    }
                    if frames[nt as usize][nf as usize] > value {
                        dominated = true;
                    }
                }
            }

            if !dominated {
                expected.push(Peak {
                    time: t as u16,
                    freq: f as u16,
                });
            }
        }
    }

    assert_eq!(peaks, expected);
    assert!(!peaks.is_empty());

    // Emission order is ascending time, then ascending frequency
    for window in peaks.windows(2) {
        assert!(
            window[0].time < window[1].time
                || (window[0].time == window[1].time && window[0].freq < window[1].freq)
        );
    }
}

#[test]
fn test_zero_neighborhood_keeps_every_cell_above_cutoff() {
    let frames = random_frames(10, 12, 31);
    let spectrogram = Spectrogram::from_frames(frames, 10.0, 0.05);
    let cutoff = spectrogram.amplitude_cutoff(0.9).unwrap();

    let peaks = find_peaks(&spectrogram, cutoff, 0);
    let above: usize = spectrogram
        .frames()
        .iter()
        .flatten()
        .filter(|&&value| value >= cutoff)
        .count();

    assert_eq!(peaks.len(), above);
}

#[test]
fn test_pair_peaks_fan_out() {
    let peaks = vec![
        Peak { time: 0, freq: 5 },
        Peak { time: 1, freq: 9 },
        Peak { time: 2, freq: 3 },
        Peak { time: 5, freq: 7 },
        Peak { time: 9, freq: 1 },
    ];

    let fingerprints: Vec<(Fingerprint, u16)> = pair_peaks(&peaks, 2).collect();

    let expected = vec![
        (Fingerprint { freq_anchor: 5, freq_target: 9, time_delta: 1 }, 0),
        (Fingerprint { freq_anchor: 5, freq_target: 3, time_delta: 2 }, 0),
        (Fingerprint { freq_anchor: 9, freq_target: 3, time_delta: 1 }, 1),
        (Fingerprint { freq_anchor: 9, freq_target: 7, time_delta: 4 }, 1),
        (Fingerprint { freq_anchor: 3, freq_target: 7, time_delta: 3 }, 2),
        (Fingerprint { freq_anchor: 3, freq_target: 1, time_delta: 7 }, 2),
        (Fingerprint { freq_anchor: 7, freq_target: 1, time_delta: 4 }, 5),
    ];
    assert_eq!(fingerprints, expected);

    // The sequence is restartable and bounded by fan * |peaks|
    let again: Vec<(Fingerprint, u16)> = pair_peaks(&peaks, 2).collect();
    assert_eq!(fingerprints, again);
    assert!(fingerprints.len() <= 2 * peaks.len());
}

#[test]
fn test_pair_peaks_clamps_the_fan_to_the_list_end() {
    let peaks = vec![
        Peak { time: 0, freq: 1 },
        Peak { time: 3, freq: 2 },
        Peak { time: 4, freq: 3 },
    ];

    let fingerprints: Vec<(Fingerprint, u16)> = pair_peaks(&peaks, 100).collect();
    assert_eq!(fingerprints.len(), 3);

    for (fingerprint, anchor_time) in &fingerprints {
        // Peaks are time-sorted, so the separation is never negative and the
        // anchor time is one of the peak times
        assert!(peaks.iter().any(|p| p.time == *anchor_time));
        let _ = fingerprint.time_delta; // u16: non-negative by construction
    }
}
