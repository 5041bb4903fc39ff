//! Configuration management for the analysis and engine layers
//!
//! Provides runtime configuration loading from JSON files so frame
//! geometry, engine thresholds, and cache sizes can be adjusted without
//! recompilation. Every section has defaults matching the documented
//! behavior; a missing or malformed file falls back to them with a
//! warning instead of failing startup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete core configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoreConfig {
    pub analysis: AnalysisConfig,
    pub mood: MoodConfig,
    pub personality: PersonalityConfig,
    pub recommendation: RecommendationConfig,
    pub buffers: BufferConfig,
}

/// Transform geometry and tempo search range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Transform frame size in samples (power of two)
    pub frame_size: usize,
    /// Sample advance between analysis frames
    pub hop_size: usize,
    /// Expected input sample rate in Hz
    pub sample_rate: u32,
    /// Tempo search range in BPM
    pub tempo_min_bpm: f32,
    pub tempo_max_bpm: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
            sample_rate: 44100,
            tempo_min_bpm: 40.0,
            tempo_max_bpm: 240.0,
        }
    }
}

/// Mood engine thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodConfig {
    /// Readings below this confidence never change the state
    pub confidence_threshold: f32,
    /// Recent-mood history capacity
    pub history_size: usize,
    /// Challenger margin over the incumbent confidence
    pub stability_factor: f32,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.15,
            history_size: 20,
            stability_factor: 0.7,
        }
    }
}

/// Personality engine gating
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalityConfig {
    /// Events required before any recomputation
    pub min_events: usize,
    /// Seconds between recomputations
    pub cooldown_secs: i64,
}

impl Default for PersonalityConfig {
    fn default() -> Self {
        Self {
            min_events: 10,
            cooldown_secs: 3600,
        }
    }
}

/// Recommendation cache sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    /// Cached result sets before a bulk clear
    pub cache_capacity: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self { cache_capacity: 50 }
    }
}

/// Buffer pool sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Maximum live buffers in the pool
    pub pool_capacity: usize,
    /// Per-buffer capacity in samples
    pub buffer_len: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 16,
            buffer_len: 2048,
        }
    }
}

impl CoreConfig {
    /// Load configuration from a JSON file
    ///
    /// A missing file or invalid JSON logs a warning and returns the
    /// defaults; configuration problems never abort startup.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
