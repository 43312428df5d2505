pub mod recorder;

pub use recorder::AudioRecorder;

use std::error::Error;
use std::io::BufReader;

use rodio::buffer::SamplesBuffer;
use rodio::source::UniformSourceIterator;

/// Decode an audio file (.WAV, .MP3, .OGG or .FLAC) into mono s16 samples at
/// the given rate.
pub fn load_audio_file(
    file_path: &str,
    target_sample_rate: u32,
) -> Result<Vec<i16>, Box<dyn Error>> {
    if !std::path::Path::new(file_path).exists() {
        return Err(format!("File not found: {}", file_path).into());
    }

    let file = std::fs::File::open(file_path)
        .map_err(|e| format!("Failed to open file '{}': {}", file_path, e))?;

    let decoder = rodio::Decoder::new(BufReader::new(file))
        .map_err(|e| format!("Failed to decode audio file '{}': {}", file_path, e))?;

    // Downmix to mono and resample to the catalog's reference rate
    let converted_file = UniformSourceIterator::new(decoder, 1, target_sample_rate);

    let raw_pcm_samples: Vec<i16> = converted_file.collect();

    if raw_pcm_samples.is_empty() {
        return Err(format!(
            "No audio samples could be extracted from file '{}'. The file may be corrupted or in an unsupported format.",
            file_path
        )
        .into());
    }

    Ok(raw_pcm_samples)
}

/// Convert a raw interleaved capture buffer to mono s16 at the target rate.
///
/// Recorded audio arrives at whatever rate and channel count the device
/// offers; enrollment and query must agree on the rate, so everything is
/// funneled through the same resampler as file decoding.
pub fn resample_samples(
    samples: &[i16],
    channels: u16,
    from_sample_rate: u32,
    to_sample_rate: u32,
) -> Vec<i16> {
    if channels == 1 && from_sample_rate == to_sample_rate {
        return samples.to_vec();
    }

    let buffer = SamplesBuffer::new(channels, from_sample_rate, samples.to_vec());
    UniformSourceIterator::new(buffer, 1, to_sample_rate).collect()
}
