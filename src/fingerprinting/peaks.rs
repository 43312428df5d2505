use crate::fingerprinting::spectrogram::Spectrogram;

/// A local maximum of the spectrogram, addressed by integer bin indices.
///
/// Physical units are recoverable through the spectrogram's bin sizes; only
/// the bin indices are stored and hashed, which keeps peaks bit-stable and
/// compact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peak {
    /// Time-frame index
    pub time: u16,
    /// Frequency-bin index
    pub freq: u16,
}

/// Extract the local peaks of a log spectrogram.
///
/// A cell is a peak iff it is at least `cutoff` and equals the maximum over a
/// diamond-shaped neighborhood: the 4-connected unit structuring element
/// Minkowski-iterated `neighborhood` times. The dilation is computed as
/// `neighborhood` successive 4-connected max passes, which yields the same
/// footprint; borders are handled as "nearest", identically on every pass.
///
/// Equal-valued plateaus report every plateau cell as a peak. Real
/// log-magnitude audio makes exact float ties rare; synthetic inputs with
/// large flat regions will flood the result.
///
/// Peaks are returned sorted by ascending time, then ascending frequency.
pub fn find_peaks(spectrogram: &Spectrogram, cutoff: f32, neighborhood: usize) -> Vec<Peak> {
    let frames = spectrogram.frames();
    let num_frames = frames.len();
    let num_bins = spectrogram.num_bins();

    if num_frames == 0 {
        return Vec::new();
    }

    let mut dilated: Vec<Vec<f32>> = frames.to_vec();
    let mut scratch = dilated.clone();

    for _ in 0..neighborhood {
        for t in 0..num_frames {
            for f in 0..num_bins {
                let mut value = dilated[t][f];
                if t > 0 {
                    value = value.max(dilated[t - 1][f]);
                }
                if t + 1 < num_frames {
                    value = value.max(dilated[t + 1][f]);
                }
                if f > 0 {
                    value = value.max(dilated[t][f - 1]);
                }
                if f + 1 < num_bins {
                    value = value.max(dilated[t][f + 1]);
                }
                scratch[t][f] = value;
            }
        }
        std::mem::swap(&mut dilated, &mut scratch);
    }

    let mut peaks = Vec::new();
    for (t, frame) in frames.iter().enumerate() {
        for (f, &value) in frame.iter().enumerate() {
            if value >= cutoff && value == dilated[t][f] {
                peaks.push(Peak {
                    time: t as u16,
                    freq: f as u16,
                });
            }
        }
    }

    peaks
}
