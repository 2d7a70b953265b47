//! Configuration for the serving process and the feature pipeline
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling deployment tuning without recompilation. Server binding, the
//! model artifact path, and the DSP parameters the classifier was trained
//! against can all be adjusted via the config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub pipeline: PipelineConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Listening port
    pub port: u16,
    /// Directory where uploaded recordings are persisted
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10110,
            data_dir: PathBuf::from("server_data"),
        }
    }
}

/// Classifier artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the safetensors artifact loaded at startup
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("model/classifier.safetensors"),
        }
    }
}

/// Feature pipeline parameters
///
/// These values define the input contract of the trained classifier. The
/// defaults concatenate to exactly the expected vector length; changing any
/// coefficient count requires retraining the model against the new layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Analysis sample rate in Hz; decoded audio is resampled to this rate
    pub sample_rate: u32,
    /// Seconds skipped from the start of each recording
    pub offset_secs: f64,
    /// Seconds of audio read after the offset
    pub duration_secs: f64,
    /// FFT window size in samples (also the frame length for ZCR and RMS)
    pub n_fft: usize,
    /// Hop size between consecutive frames
    pub hop_length: usize,
    /// Number of MFCC coefficients kept per frame
    pub n_mfcc: usize,
    /// Number of chroma pitch classes
    pub n_chroma: usize,
    /// Number of mel filterbank bands
    pub n_mels: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22_050,
            offset_secs: 0.6,
            duration_secs: 2.5,
            n_fft: 2048,
            hop_length: 512,
            n_mfcc: 20,
            n_chroma: 12,
            n_mels: 128,
        }
    }
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults if the file is missing or
    /// malformed (a warning is logged in either case).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    tracing::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
