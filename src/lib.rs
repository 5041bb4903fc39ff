// Moodtape Core - audio mood analysis and recommendation engine
// Real-time feature extraction with a lock-free frame pipeline

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;

// Re-exports for convenience
pub use analysis::{AudioFeatures, FeatureExtractor, FileAnalysis, StreamAnalyzer};
pub use config::CoreConfig;
pub use engine::{
    Mood, MoodEngine, MoodReading, PersonalityEngine, PersonalityType, RecommendationEngine, Song,
};
pub use error::AnalysisError;
