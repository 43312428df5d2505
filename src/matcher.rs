use std::cmp::Reverse;
use std::collections::HashMap;

use crate::catalog::index::SongCatalog;
use crate::fingerprinting::hashing::Fingerprint;

/// The winning song of an offset-histogram vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCandidate {
    pub song_id: u32,
    /// Alignment between reference and query, in time frames: the anchor
    /// frame of the matched posting minus the query's anchor frame
    pub offset: i32,
    /// Number of hash matches agreeing on this exact alignment
    pub score: usize,
}

/// Score the query fingerprints against the catalog and pick the single best
/// match.
///
/// Every posting found for a query hash votes for the pair
/// `(song_id, t_song - t_query)`. A correct match concentrates many votes on
/// one offset (the query's start within the reference), while wrong songs
/// scatter their votes across offsets; the histogram mode is therefore a
/// sharp consistency test that tolerates noise and missing or spurious
/// peaks. Returns `None` when not a single hash matched.
///
/// Ties on the top count break deterministically towards the lower song id,
/// then the lower offset; callers must not rely on which one wins.
pub fn best_match(
    fingerprints: impl IntoIterator<Item = (Fingerprint, u16)>,
    catalog: &SongCatalog,
) -> Option<MatchCandidate> {
    let mut histogram: HashMap<(u32, i32), usize> = HashMap::new();

    for (fingerprint, query_time) in fingerprints {
        for posting in catalog.lookup(&fingerprint) {
            let offset = posting.time as i32 - query_time as i32;
            *histogram.entry((posting.song_id, offset)).or_default() += 1;
        }
    }

    histogram
        .into_iter()
        .max_by_key(|&((song_id, offset), count)| (count, Reverse(song_id), Reverse(offset)))
        .map(|((song_id, offset), count)| MatchCandidate {
            song_id,
            offset,
            score: count,
        })
}
