use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Device;

use crate::config::Config;

/// Cross-platform audio recorder using CPAL
pub struct AudioRecorder {
    config: Config,
}

/// A bounded capture: raw interleaved samples plus the stream parameters
/// they were recorded with
#[derive(Debug, Clone)]
pub struct Recording {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Audio recording error
#[derive(Debug)]
pub enum AudioError {
    DeviceError(String),
    StreamError(String),
    ConfigError(String),
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::DeviceError(msg) => write!(f, "Audio device error: {}", msg),
            AudioError::StreamError(msg) => write!(f, "Audio stream error: {}", msg),
            AudioError::ConfigError(msg) => write!(f, "Audio config error: {}", msg),
        }
    }
}

impl std::error::Error for AudioError {}

impl AudioRecorder {
    /// Create a new audio recorder with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Record from an input device for a fixed duration.
    ///
    /// The capture is returned raw, at the device's own rate and channel
    /// count; callers resample before fingerprinting.
    pub fn record_for(
        &self,
        duration_secs: f32,
        device_name: Option<String>,
    ) -> Result<Recording, AudioError> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name {
            self.find_device_by_name(&host, &name)?
        } else {
            host.default_input_device().ok_or_else(|| {
                AudioError::DeviceError("No default input device found".to_string())
            })?
        };

        let config = device.default_input_config().map_err(|e| {
            AudioError::ConfigError(format!("Failed to get default input config: {}", e))
        })?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: config.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        let recorded_samples = Arc::new(Mutex::new(Vec::new()));
        let quiet_mode = self.config.quiet_mode;

        let err_fn = move |err| {
            if !quiet_mode {
                eprintln!("An error occurred on the input audio stream: {}", err);
            }
        };

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                let samples_clone = recorded_samples.clone();
                device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            let mut samples = samples_clone.lock().unwrap();
                            for &sample in data {
                                samples
                                    .push((sample * 32767.0).clamp(-32768.0, 32767.0) as i16);
                            }
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| {
                        AudioError::StreamError(format!("Failed to create input stream: {}", e))
                    })?
            }
            cpal::SampleFormat::I16 => {
                let samples_clone = recorded_samples.clone();
                device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[i16], _: &cpal::InputCallbackInfo| {
                            samples_clone.lock().unwrap().extend_from_slice(data);
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| {
                        AudioError::StreamError(format!("Failed to create input stream: {}", e))
                    })?
            }
            cpal::SampleFormat::U16 => {
                let samples_clone = recorded_samples.clone();
                device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[u16], _: &cpal::InputCallbackInfo| {
                            let mut samples = samples_clone.lock().unwrap();
                            for &sample in data {
                                samples.push((sample as i32 - 32768) as i16);
                            }
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| {
                        AudioError::StreamError(format!("Failed to create input stream: {}", e))
                    })?
            }
            other => {
                return Err(AudioError::ConfigError(format!(
                    "Unsupported sample format: {:?}",
                    other
                )));
            }
        };

        stream
            .play()
            .map_err(|e| AudioError::StreamError(format!("Failed to start stream: {}", e)))?;

        thread::sleep(Duration::from_secs_f32(duration_secs.max(0.0)));
        drop(stream);

        let samples = recorded_samples.lock().unwrap().clone();

        Ok(Recording {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Find a device by name
    fn find_device_by_name(&self, host: &cpal::Host, name: &str) -> Result<Device, AudioError> {
        let devices = host.input_devices().map_err(|e| {
            AudioError::DeviceError(format!("Failed to enumerate input devices: {}", e))
        })?;

        for device in devices {
            if let Ok(device_name) = device.name() {
                if device_name == name {
                    return Ok(device);
                }
            }
        }

        Err(AudioError::DeviceError(format!(
            "Device '{}' not found",
            name
        )))
    }

    /// List available input devices
    pub fn list_input_devices() -> Result<Vec<String>, AudioError> {
        let host = cpal::default_host();
        let devices = host.input_devices().map_err(|e| {
            AudioError::DeviceError(format!("Failed to enumerate input devices: {}", e))
        })?;

        let mut device_names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                device_names.push(name);
            }
        }

        Ok(device_names)
    }
}
