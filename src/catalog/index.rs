use std::collections::HashMap;
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::format;
use crate::fingerprinting::hashing::Fingerprint;
use crate::{Result, SongPrintError};

/// A reference recording's registry record
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SongEntry {
    pub name: String,
    pub artist: Option<String>,
}

/// One occurrence of a fingerprint hash: which song contains it, and at which
/// anchor time frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub song_id: u32,
    pub time: u16,
}

/// Outcome of enrolling a reference into the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The reference was enrolled under this song id
    Added(u32),
    /// An identically-labelled reference already exists; nothing was changed
    AlreadyPresent,
}

/// The song catalog: an inverted fingerprint index plus the song registry.
///
/// `pair_mapping` maps each fingerprint hash to the list of all songs that
/// contain it, along with the anchor frame at which it occurs. Duplicate
/// postings under one hash are intentional; repeated features within a song
/// reinforce matches.
///
/// `song_list` assigns ids by position. Entries are never removed or shifted;
/// deletion replaces a slot with `None` so that the song ids stored in the
/// index stay valid for the lifetime of the registry, including across
/// save/load.
///
/// The catalog is lazily loaded: every public operation checks the loaded
/// flag first and pulls in the backing store if needed, so `loaded` implies
/// the in-memory state reflects the store.
#[derive(Debug)]
pub struct SongCatalog {
    pair_mapping: HashMap<Fingerprint, Vec<Posting>>,
    song_list: Vec<Option<SongEntry>>,
    path: PathBuf,
    loaded: bool,
    quiet: bool,
}

impl SongCatalog {
    /// Create a catalog backed by the given base path. Nothing is read from
    /// disk until the first operation needs it.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            pair_mapping: HashMap::new(),
            song_list: Vec::new(),
            path: path.into(),
            loaded: false,
            quiet: true,
        }
    }

    /// Enable or disable diagnostic output on stderr
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Base path of the backing store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the in-memory state reflects the backing store
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Registry length, including tombstoned slots
    pub fn len(&self) -> usize {
        self.song_list.len()
    }

    /// Whether the registry holds no records at all
    pub fn is_empty(&self) -> bool {
        self.song_list.is_empty()
    }

    /// Total number of postings across all hash lists
    pub fn num_postings(&self) -> usize {
        self.pair_mapping.values().map(|postings| postings.len()).sum()
    }

    /// Guard called at the top of every public operation
    fn ensure_loaded(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        self.load(false)
    }

    /// Load the catalog from its backing store if it isn't already in memory.
    ///
    /// A missing store is not an error: the catalog starts empty and reports
    /// where a save would write. With `force`, the store is re-read even if
    /// already loaded.
    pub fn load(&mut self, force: bool) -> Result<()> {
        if !force && self.loaded {
            return Ok(());
        }

        if !self.path.is_file() {
            if !self.quiet {
                eprintln!(
                    "No song catalog found. Starting empty; saving will write to {}",
                    self.path.display()
                );
            }
            self.pair_mapping = HashMap::new();
            self.song_list = Vec::new();
            self.loaded = true;
            return Ok(());
        }

        let index_bytes = fs::read(&self.path).map_err(|e| {
            SongPrintError::CatalogError(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let pair_mapping = format::decode_index(&index_bytes)
            .map_err(|e| SongPrintError::CatalogError(e.to_string()))?;

        let registry_path = format::song_list_path(&self.path);
        let registry_bytes = fs::read(&registry_path).map_err(|e| {
            SongPrintError::CatalogError(format!(
                "failed to read {}: {}",
                registry_path.display(),
                e
            ))
        })?;
        let song_list = format::decode_registry(&registry_bytes)
            .map_err(|e| SongPrintError::CatalogError(e.to_string()))?;

        // Both artifacts decoded; only now replace the in-memory state
        self.pair_mapping = pair_mapping;
        self.song_list = song_list;
        self.loaded = true;

        if !self.quiet {
            eprintln!("Song catalog loaded from: {}", self.path.display());
        }
        Ok(())
    }

    /// Persist the index and the registry as a pair.
    pub fn save(&mut self) -> Result<()> {
        self.ensure_loaded()?;

        let index_bytes = format::encode_index(&self.pair_mapping)
            .map_err(|e| SongPrintError::CatalogError(e.to_string()))?;
        fs::write(&self.path, index_bytes).map_err(|e| {
            SongPrintError::CatalogError(format!("failed to write {}: {}", self.path.display(), e))
        })?;

        let registry_path = format::song_list_path(&self.path);
        let registry_bytes = format::encode_registry(&self.song_list)
            .map_err(|e| SongPrintError::CatalogError(e.to_string()))?;
        fs::write(&registry_path, registry_bytes).map_err(|e| {
            SongPrintError::CatalogError(format!(
                "failed to write {}: {}",
                registry_path.display(),
                e
            ))
        })?;

        if !self.quiet {
            eprintln!("Song catalog saved to: {}", self.path.display());
        }
        Ok(())
    }

    /// Drop all in-memory state. The next operation reloads from the backing
    /// store.
    pub fn clear(&mut self) {
        self.pair_mapping.clear();
        self.song_list = Vec::new();
        self.loaded = false;
    }

    /// Redirect the catalog to another backing store and load it.
    ///
    /// The switch is transactional: if the new store fails to read or decode,
    /// the previous registry, index, path and loaded flag are restored
    /// verbatim and the error is returned.
    pub fn switch_path(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let backup_mapping = mem::take(&mut self.pair_mapping);
        let backup_song_list = mem::take(&mut self.song_list);
        let backup_path = mem::replace(&mut self.path, path.into());
        let backup_loaded = self.loaded;

        self.loaded = false;

        match self.load(false) {
            Ok(()) => Ok(()),
            Err(e) => {
                if !self.quiet {
                    eprintln!(
                        "Switching catalogs failed; reverting to {}",
                        backup_path.display()
                    );
                }
                self.pair_mapping = backup_mapping;
                self.song_list = backup_song_list;
                self.path = backup_path;
                self.loaded = backup_loaded;
                Err(e)
            }
        }
    }

    /// Enroll a reference under a fresh song id, inserting every fingerprint
    /// it produced.
    ///
    /// Label comparison is exact: if an identical `(name, artist)` record is
    /// already present the call is a no-op and reports `AlreadyPresent`.
    pub fn add_song(
        &mut self,
        name: &str,
        artist: Option<&str>,
        fingerprints: impl IntoIterator<Item = (Fingerprint, u16)>,
    ) -> Result<AddOutcome> {
        self.ensure_loaded()?;

        let duplicate = self
            .song_list
            .iter()
            .flatten()
            .any(|entry| entry.name == name && entry.artist.as_deref() == artist);
        if duplicate {
            return Ok(AddOutcome::AlreadyPresent);
        }

        let song_id = self.song_list.len() as u32;

        for (fingerprint, time) in fingerprints {
            self.pair_mapping
                .entry(fingerprint)
                .or_insert_with(Vec::new)
                .push(Posting { song_id, time });
        }

        self.song_list.push(Some(SongEntry {
            name: name.to_string(),
            artist: artist.map(|a| a.to_string()),
        }));

        Ok(AddOutcome::Added(song_id))
    }

    /// Tombstone a song's registry slot and purge its postings from every
    /// hash list.
    ///
    /// The slot itself is kept so that the ids of the remaining songs stay
    /// valid; the id is never reused. Returns `false` if no such record
    /// exists.
    pub fn remove_song(&mut self, name: &str, artist: Option<&str>) -> Result<bool> {
        self.ensure_loaded()?;

        let position = self.song_list.iter().position(|slot| {
            slot.as_ref()
                .map(|entry| entry.name == name && entry.artist.as_deref() == artist)
                .unwrap_or(false)
        });

        let song_id = match position {
            Some(position) => position as u32,
            None => return Ok(false),
        };

        self.song_list[song_id as usize] = None;

        for postings in self.pair_mapping.values_mut() {
            postings.retain(|posting| posting.song_id != song_id);
        }

        Ok(true)
    }

    /// Sorted, tombstone-filtered registry records
    pub fn list_songs(&mut self) -> Result<Vec<SongEntry>> {
        self.ensure_loaded()?;

        let mut songs: Vec<SongEntry> = self.song_list.iter().flatten().cloned().collect();
        songs.sort();
        Ok(songs)
    }

    /// The registry record for a song id, if the slot exists and is not
    /// tombstoned
    pub fn song_entry(&self, song_id: u32) -> Option<&SongEntry> {
        self.song_list
            .get(song_id as usize)
            .and_then(|slot| slot.as_ref())
    }

    /// Postings list for a fingerprint hash (empty if the hash is unknown).
    ///
    /// Reads the in-memory state; callers run `load` first and may then look
    /// up from multiple threads, as lookups never mutate.
    pub fn lookup(&self, fingerprint: &Fingerprint) -> &[Posting] {
        self.pair_mapping
            .get(fingerprint)
            .map(|postings| postings.as_slice())
            .unwrap_or(&[])
    }
}
