// Engine module - mood, personality, and recommendation engines
//
// Each engine owns its state and is mutated only through its public
// operations. Instances are constructed by the composing layer and passed
// where needed (one per logical session); nothing here is global.

pub mod mood;
pub mod personality;
pub mod recommend;

// Re-export commonly used types for convenience
pub use mood::{match_score, Mood, MoodEngine, MoodReading, TimeOfDay};
pub use personality::{InteractionEvent, InteractionKind, PersonalityEngine, PersonalityType};
pub use recommend::{Mixtape, MixtapeEntry, RecommendationEngine, ScoredSong, Song};
