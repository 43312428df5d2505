use serde::{Deserialize, Serialize};

use crate::fingerprinting::peaks::Peak;

/// A combinatorial fingerprint hash: the frequency bins of two peaks and
/// their separation in time frames.
///
/// The triple is treated as an opaque key; a single peak's frequency is a
/// weak feature, while a pair-with-offset is both far more selective and
/// translation-invariant in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Frequency bin of the anchor peak
    pub freq_anchor: u16,
    /// Frequency bin of the paired peak
    pub freq_target: u16,
    /// Time-frame separation between the two peaks
    pub time_delta: u16,
}

/// Fan each peak out to its temporal successors, yielding fingerprint hashes
/// paired with the anchor peak's time frame.
///
/// For peak `n`, the next `fan_value` peaks (clamped to the end of the list)
/// each contribute one `(hash, anchor_time)` item. The sequence is lazy and
/// restartable; the total item count is at most `fan_value * peaks.len()`,
/// and `time_delta` is always non-negative because peaks are time-sorted.
///
/// `fan_value` must be at least 1; callers validate it up front.
pub fn pair_peaks(
    peaks: &[Peak],
    fan_value: usize,
) -> impl Iterator<Item = (Fingerprint, u16)> + '_ {
    peaks.iter().enumerate().flat_map(move |(n, anchor)| {
        let fan_end = (n + 1 + fan_value).min(peaks.len());
        peaks[n + 1..fan_end].iter().map(move |target| {
            (
                Fingerprint {
                    freq_anchor: anchor.freq,
                    freq_target: target.freq,
                    time_delta: target.time - anchor.time,
                },
                anchor.time,
            )
        })
    })
}
