// RecommendationEngine - mood-targeted song scoring and ranking
//
// Scores a candidate collection against a target mood with the same
// weighted-feature formulas the mood engine uses, modulated by the
// listener's behavioral archetype, and returns the top-K descending.
// Ranked results are cached per (mood, candidate count) so repeated
// queries over an unchanged library are free; the cache is cleared in
// bulk at its entry limit and invalidated on mood/personality changes.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::analysis::features::AudioFeatures;
use crate::engine::mood::{match_score, Mood};
use crate::engine::personality::PersonalityType;

/// Cached result sets before a bulk clear
const DEFAULT_CACHE_CAPACITY: usize = 50;

/// Explorer archetype jitter range (±15%)
const EXPLORER_JITTER: f32 = 0.15;

/// Enthusiast boost applied to high-energy tracks
const ENTHUSIAST_BOOST: f32 = 1.15;

/// RMS above which a track counts as high-energy
const HIGH_ENERGY_RMS: f32 = 0.6;

/// Curator boost applied to strongly harmonic tracks
const CURATOR_BOOST: f32 = 1.1;
const CURATOR_HARMONIC_MIN: f32 = 0.5;

/// Analyzer boost applied to tonal (low-flatness) tracks
const ANALYZER_BOOST: f32 = 1.1;
const ANALYZER_FLATNESS_MAX: f32 = 0.3;

/// A candidate track with its extracted features attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub features: AudioFeatures,
}

/// One ranked recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSong {
    pub song: Song,
    pub score: f32,
}

/// An ordered selection tagged with the mood it was built for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mixtape {
    pub mood: Mood,
    pub entries: Vec<MixtapeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixtapeEntry {
    /// Sequential position, starting at 0
    pub position: usize,
    pub song: Song,
    pub mood: Mood,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    mood: Mood,
    candidate_count: usize,
}

/// Personality-weighted, mood-targeted ranking engine
pub struct RecommendationEngine {
    personality: PersonalityType,
    cache: HashMap<CacheKey, Vec<ScoredSong>>,
    cache_capacity: usize,
    rng: StdRng,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self {
            personality: PersonalityType::Balanced,
            cache: HashMap::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic engine for reproducible ranking
    pub fn with_seed(seed: u64) -> Self {
        Self {
            personality: PersonalityType::Balanced,
            cache: HashMap::new(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity.max(1);
        self
    }

    pub fn personality(&self) -> PersonalityType {
        self.personality
    }

    /// Update the archetype weighting; cached rankings no longer apply
    pub fn set_personality(&mut self, personality: PersonalityType) {
        if personality != self.personality {
            self.personality = personality;
            self.invalidate();
        }
    }

    /// Drop all cached result sets
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Rank candidates against the target mood, best first, at most
    /// `limit` results
    ///
    /// Repeated calls with unchanged inputs and cache state return the
    /// identical ordering via the cache.
    pub fn recommend(&mut self, songs: &[Song], mood: Mood, limit: usize) -> Vec<ScoredSong> {
        let key = CacheKey {
            mood,
            candidate_count: songs.len(),
        };
        if let Some(ranked) = self.cache.get(&key) {
            return ranked.iter().take(limit).cloned().collect();
        }

        let mut ranked: Vec<ScoredSong> = songs
            .iter()
            .map(|song| ScoredSong {
                score: match_score(mood, &song.features)
                    * self.personality_multiplier(&song.features),
                song: song.clone(),
            })
            .collect();

        // Descending by score, ascending id as the tiebreak so equal
        // scores still rank deterministically
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.song.id.cmp(&b.song.id))
        });

        if self.cache.len() >= self.cache_capacity {
            tracing::debug!(
                "[RecommendationEngine] Cache at {} entries, clearing",
                self.cache.len()
            );
            self.cache.clear();
        }
        self.cache.insert(key, ranked.clone());

        ranked.truncate(limit);
        ranked
    }

    /// Build a mixtape: rank, then assign sequential positions and the
    /// target mood tag
    pub fn build_mixtape(&mut self, songs: &[Song], mood: Mood, limit: usize) -> Mixtape {
        let entries = self
            .recommend(songs, mood, limit)
            .into_iter()
            .enumerate()
            .map(|(position, scored)| MixtapeEntry {
                position,
                song: scored.song,
                mood,
            })
            .collect();
        Mixtape { mood, entries }
    }

    fn personality_multiplier(&mut self, features: &AudioFeatures) -> f32 {
        match self.personality {
            // Random jitter encourages diversity over pure score order
            PersonalityType::Explorer => {
                1.0 + self.rng.gen_range(-EXPLORER_JITTER..=EXPLORER_JITTER)
            }
            PersonalityType::Enthusiast => {
                if features.rms > HIGH_ENERGY_RMS {
                    ENTHUSIAST_BOOST
                } else {
                    1.0
                }
            }
            PersonalityType::Curator => {
                if features.harmonic_ratio > CURATOR_HARMONIC_MIN {
                    CURATOR_BOOST
                } else {
                    1.0
                }
            }
            PersonalityType::Analyzer => {
                if features.flatness < ANALYZER_FLATNESS_MAX {
                    ANALYZER_BOOST
                } else {
                    1.0
                }
            }
            PersonalityType::Balanced => 1.0,
        }
    }
}
