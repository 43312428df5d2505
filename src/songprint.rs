use std::path::Path;

use crate::audio;
use crate::audio::recorder::AudioRecorder;
use crate::catalog::index::{AddOutcome, SongCatalog, SongEntry};
use crate::config::Config;
use crate::fingerprinting::hashing::{pair_peaks, Fingerprint};
use crate::fingerprinting::peaks::find_peaks;
use crate::fingerprinting::spectrogram::Spectrogram;
use crate::matcher;
use crate::{Result, SongPrintError};

/// Main SongPrint struct for enrollment and recognition against a local
/// catalog
pub struct SongPrint {
    config: Config,
    catalog: SongCatalog,
}

/// Result of a successful recognition
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MatchResult {
    pub song_id: u32,
    pub song_name: String,
    pub artist_name: Option<String>,
    /// Where the query starts within the reference, in spectrogram frames
    pub offset_frames: i32,
    /// The same alignment, in seconds
    pub offset_seconds: f32,
    /// Number of fingerprint matches agreeing on that alignment
    pub score: usize,
    pub recognition_timestamp: chrono::DateTime<chrono::Utc>,
}

impl SongPrint {
    /// Create a new SongPrint instance with the given configuration
    pub fn new(config: Config) -> Self {
        let catalog =
            SongCatalog::new(config.catalog_path.clone()).with_quiet(config.quiet_mode);
        Self { config, catalog }
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying catalog
    pub fn catalog(&self) -> &SongCatalog {
        &self.catalog
    }

    /// Mutable access to the underlying catalog
    pub fn catalog_mut(&mut self) -> &mut SongCatalog {
        &mut self.catalog
    }

    /// Enroll a reference recording from an audio file.
    ///
    /// The file is decoded and resampled to the configured rate; if no name
    /// is supplied, the file's basename is used.
    pub fn enroll_from_file(
        &mut self,
        file_path: &str,
        name: Option<&str>,
        artist: Option<&str>,
    ) -> Result<AddOutcome> {
        let samples = audio::load_audio_file(file_path, self.config.sample_rate)
            .map_err(|e| SongPrintError::AudioError(e.to_string()))?;

        let basename;
        let name = match name {
            Some(name) => name,
            None => {
                basename = Path::new(file_path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file_path.to_string());
                &basename
            }
        };

        self.enroll_from_samples(&samples, self.config.sample_rate, name, artist)
    }

    /// Enroll a reference recording from raw mono s16 samples
    pub fn enroll_from_samples(
        &mut self,
        samples: &[i16],
        sample_rate: u32,
        name: &str,
        artist: Option<&str>,
    ) -> Result<AddOutcome> {
        self.check_sample_rate(sample_rate)?;
        let spectrogram = Spectrogram::from_pcm(samples, sample_rate);
        self.enroll_spectrogram(&spectrogram, name, artist)
    }

    /// Enroll a reference recording from mono float samples in [-1, 1]
    pub fn enroll_from_normalized(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
        name: &str,
        artist: Option<&str>,
    ) -> Result<AddOutcome> {
        self.check_sample_rate(sample_rate)?;
        let spectrogram = Spectrogram::from_normalized(samples, sample_rate);
        self.enroll_spectrogram(&spectrogram, name, artist)
    }

    /// Recognize a song from an audio file
    pub fn recognize_from_file(&mut self, file_path: &str) -> Result<Option<MatchResult>> {
        let samples = audio::load_audio_file(file_path, self.config.sample_rate)
            .map_err(|e| SongPrintError::AudioError(e.to_string()))?;
        self.recognize_from_samples(&samples, self.config.sample_rate)
    }

    /// Recognize a song from raw mono s16 samples.
    ///
    /// Returns `Ok(None)` when nothing in the catalog matches; an empty
    /// catalog or a query too short to produce fingerprints is not an error.
    pub fn recognize_from_samples(
        &mut self,
        samples: &[i16],
        sample_rate: u32,
    ) -> Result<Option<MatchResult>> {
        self.check_sample_rate(sample_rate)?;
        let spectrogram = Spectrogram::from_pcm(samples, sample_rate);
        self.recognize_spectrogram(&spectrogram)
    }

    /// Recognize a song from mono float samples in [-1, 1]
    pub fn recognize_from_normalized(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<Option<MatchResult>> {
        self.check_sample_rate(sample_rate)?;
        let spectrogram = Spectrogram::from_normalized(samples, sample_rate);
        self.recognize_spectrogram(&spectrogram)
    }

    /// Record from a microphone for a fixed duration, then recognize the
    /// recording
    pub fn recognize_from_microphone(
        &mut self,
        duration_secs: f32,
        device_name: Option<String>,
    ) -> Result<Option<MatchResult>> {
        let recorder = AudioRecorder::new(self.config.clone());
        let recording = recorder
            .record_for(duration_secs, device_name)
            .map_err(|e| SongPrintError::AudioError(e.to_string()))?;

        let samples = audio::resample_samples(
            &recording.samples,
            recording.channels,
            recording.sample_rate,
            self.config.sample_rate,
        );

        self.recognize_from_samples(&samples, self.config.sample_rate)
    }

    /// Remove a reference from the catalog by its exact label.
    ///
    /// The registry slot is tombstoned and the song's postings are purged;
    /// its id is never reused. Returns `false` (non-fatally) if no such
    /// record exists.
    pub fn remove_song(&mut self, name: &str, artist: Option<&str>) -> Result<bool> {
        let removed = self.catalog.remove_song(name, artist)?;
        if !self.config.quiet_mode {
            if removed {
                eprintln!("Removed \"{}\" from the catalog. Be sure to save.", name);
            } else {
                eprintln!("\"{}\" is not in the catalog", name);
            }
        }
        Ok(removed)
    }

    /// Sorted, tombstone-filtered registry records
    pub fn list_songs(&mut self) -> Result<Vec<SongEntry>> {
        self.catalog.list_songs()
    }

    /// Persist the catalog to its backing store
    pub fn save(&mut self) -> Result<()> {
        self.catalog.save()
    }

    /// Load the catalog from its backing store (pass `force` to re-read even
    /// if already loaded)
    pub fn load(&mut self, force: bool) -> Result<()> {
        self.catalog.load(force)
    }

    /// Drop the in-memory catalog state; the next operation reloads it
    pub fn clear(&mut self) {
        self.catalog.clear();
    }

    /// Switch to another catalog backing store, or back to the configured
    /// default with `None`. On failure the previous state is restored.
    pub fn switch_catalog(&mut self, path: Option<&str>) -> Result<()> {
        match path {
            Some(path) => self.catalog.switch_path(path),
            None => {
                let default_path = self.config.catalog_path.clone();
                self.catalog.switch_path(default_path)
            }
        }
    }

    /// Validate the configuration and reject a sample rate other than the
    /// one the catalog was built with (a mismatch would corrupt the hashes)
    fn check_sample_rate(&self, sample_rate: u32) -> Result<()> {
        self.config.validate()?;
        if sample_rate != self.config.sample_rate {
            return Err(SongPrintError::InvalidInput(format!(
                "sample rate {} does not match the catalog's rate {}",
                sample_rate, self.config.sample_rate
            )));
        }
        Ok(())
    }

    /// Run the cutoff / peaks / pairing stages over a spectrogram.
    ///
    /// A spectrogram shorter than one FFT window is empty and simply yields
    /// no fingerprints.
    fn fingerprint_spectrogram(&self, spectrogram: &Spectrogram) -> Vec<(Fingerprint, u16)> {
        let cutoff = match spectrogram.amplitude_cutoff(self.config.frac_cut) {
            Some(cutoff) => cutoff,
            None => return Vec::new(),
        };

        let peaks = find_peaks(spectrogram, cutoff, self.config.peak_neighborhood);
        pair_peaks(&peaks, self.config.fan_value).collect()
    }

    fn enroll_spectrogram(
        &mut self,
        spectrogram: &Spectrogram,
        name: &str,
        artist: Option<&str>,
    ) -> Result<AddOutcome> {
        if spectrogram.is_empty() {
            return Err(SongPrintError::InvalidInput(
                "audio is shorter than one FFT window; nothing to enroll".to_string(),
            ));
        }

        let fingerprints = self.fingerprint_spectrogram(spectrogram);
        let outcome = self.catalog.add_song(name, artist, fingerprints)?;

        if !self.config.quiet_mode {
            match outcome {
                AddOutcome::Added(song_id) => {
                    eprintln!("Enrolled \"{}\" as song {}", name, song_id)
                }
                AddOutcome::AlreadyPresent => {
                    eprintln!("\"{}\" already in the catalog. Skipping.", name)
                }
            }
        }

        Ok(outcome)
    }

    fn recognize_spectrogram(&mut self, spectrogram: &Spectrogram) -> Result<Option<MatchResult>> {
        self.catalog.load(false)?;
        if self.catalog.is_empty() {
            return Ok(None);
        }

        let fingerprints = self.fingerprint_spectrogram(spectrogram);
        let candidate = match matcher::best_match(fingerprints, &self.catalog) {
            Some(candidate) => candidate,
            None => return Ok(None),
        };

        // A tombstoned winner means the reference is gone; report no match
        let entry = match self.catalog.song_entry(candidate.song_id) {
            Some(entry) => entry,
            None => return Ok(None),
        };

        Ok(Some(MatchResult {
            song_id: candidate.song_id,
            song_name: entry.name.clone(),
            artist_name: entry.artist.clone(),
            offset_frames: candidate.offset,
            offset_seconds: candidate.offset as f32 * spectrogram.time_bin_seconds(),
            score: candidate.score,
            recognition_timestamp: chrono::Utc::now(),
        }))
    }
}
