use serde::{Deserialize, Serialize};

use crate::{Result, SongPrintError};

/// Configuration for SongPrint
///
/// The fingerprinting parameters (`frac_cut`, `fan_value`, `peak_neighborhood`)
/// and the sample rate are part of the contract between enrollment and query:
/// a catalog built with one set of values can only be matched against with the
/// same values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sample rate for audio processing (enrollment and query must agree)
    pub sample_rate: u32,

    /// Fraction of spectrogram cells discarded by the adaptive amplitude
    /// cutoff (0.0 to 1.0)
    pub frac_cut: f32,

    /// Number of subsequent peaks each peak is paired with when forming
    /// fingerprints
    pub fan_value: usize,

    /// Radius, in spectrogram cells, of the neighborhood a peak must dominate
    pub peak_neighborhood: usize,

    /// Base path of the catalog backing store
    pub catalog_path: String,

    /// Whether to suppress verbose diagnostic output
    pub quiet_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            frac_cut: 0.77,
            fan_value: 15,
            peak_neighborhood: 20,
            catalog_path: "song_catalog.db".to_string(),
            quiet_mode: true, // Default to quiet mode for clean output
        }
    }
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sample rate
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the amplitude cutoff fraction
    pub fn with_frac_cut(mut self, frac_cut: f32) -> Self {
        self.frac_cut = frac_cut;
        self
    }

    /// Set the fingerprint fan-out value
    pub fn with_fan_value(mut self, fan_value: usize) -> Self {
        self.fan_value = fan_value;
        self
    }

    /// Set the peak neighborhood radius
    pub fn with_peak_neighborhood(mut self, peak_neighborhood: usize) -> Self {
        self.peak_neighborhood = peak_neighborhood;
        self
    }

    /// Set the catalog backing-store base path
    pub fn with_catalog_path(mut self, catalog_path: &str) -> Self {
        self.catalog_path = catalog_path.to_string();
        self
    }

    /// Enable or disable quiet mode (suppress verbose output)
    pub fn with_quiet_mode(mut self, quiet: bool) -> Self {
        self.quiet_mode = quiet;
        self
    }

    /// Check that the fingerprinting parameters are usable
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.frac_cut) {
            return Err(SongPrintError::InvalidInput(format!(
                "frac_cut must be within [0, 1], got {}",
                self.frac_cut
            )));
        }
        if self.fan_value < 1 {
            return Err(SongPrintError::InvalidInput(
                "fan_value must be at least 1".to_string(),
            ));
        }
        if self.sample_rate == 0 {
            return Err(SongPrintError::InvalidInput(
                "sample_rate must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &str) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
