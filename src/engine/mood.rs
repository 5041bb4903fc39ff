// MoodEngine - rule-based mood classification with temporal smoothing
//
// Maps an AudioFeatures record to one of a closed set of moods. Per-mood
// scores are hand-tuned weighted combinations of feature terms, each term
// clamped to [0, 1] before combining. The engine smooths over time: the
// current mood only switches when the challenger clears both a confidence
// threshold and a stability margin over the incumbent, and a decaying
// distribution tracks where classifications have been landing.
//
// One engine instance per logical session; all mutation goes through
// detect_mood/reset (single-writer discipline).

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::analysis::features::AudioFeatures;
use crate::audio::ring_history::RingHistory;

/// Confidence below this never changes the engine state
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.15;

/// A challenger must exceed incumbent confidence times this factor
const DEFAULT_STABILITY_FACTOR: f32 = 0.7;

/// Recent-mood history capacity
const DEFAULT_HISTORY_LEN: usize = 20;

/// Additive score bias for moods favored by the time of day
const TIME_OF_DAY_BIAS: f32 = 0.08;

/// Distribution decay applied on every successful update
const DISTRIBUTION_DECAY: f32 = 0.95;

/// Fraction of the winning confidence added to the distribution
const DISTRIBUTION_GAIN: f32 = 0.5;

/// Broadcast channel depth for mood change notifications
const READINGS_CHANNEL_LEN: usize = 32;

/// Discrete emotional classification of audio content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    Energetic,
    Relaxed,
    Happy,
    Melancholic,
    Focused,
    Angry,
    /// Fallback when nothing scores convincingly
    Neutral,
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::Energetic,
        Mood::Relaxed,
        Mood::Happy,
        Mood::Melancholic,
        Mood::Focused,
        Mood::Angry,
        Mood::Neutral,
    ];

    /// Affinity keywords for external display and tagging
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Mood::Energetic => &["workout", "dance", "party", "upbeat", "power"],
            Mood::Relaxed => &["chill", "ambient", "lounge", "unwind", "calm"],
            Mood::Happy => &["feelgood", "sunny", "sing-along", "bright"],
            Mood::Melancholic => &["rainy-day", "wistful", "late-night", "blue"],
            Mood::Focused => &["study", "deep-work", "instrumental", "flow"],
            Mood::Angry => &["aggressive", "heavy", "intense", "raw"],
            Mood::Neutral => &["background", "anything", "mixed"],
        }
    }

    fn index(self) -> usize {
        Mood::ALL.iter().position(|&m| m == self).unwrap_or(0)
    }
}

/// Coarse time-of-day bucket used to bias mood scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn now() -> Self {
        Self::from_hour(chrono::Local::now().hour())
    }

    /// Disjoint favored-mood sets per bucket
    fn favors(self, mood: Mood) -> bool {
        matches!(
            (self, mood),
            (TimeOfDay::Morning, Mood::Energetic)
                | (TimeOfDay::Morning, Mood::Happy)
                | (TimeOfDay::Afternoon, Mood::Focused)
                | (TimeOfDay::Evening, Mood::Relaxed)
                | (TimeOfDay::Night, Mood::Melancholic)
        )
    }
}

/// One classification outcome: the argmax mood and its confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodReading {
    pub mood: Mood,
    pub confidence: f32,
}

fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Standalone per-mood match score over a feature record, in [0, 1]
///
/// Shared by mood detection and recommendation ranking. Every term is
/// clamped before weighting so no single feature can dominate the blend.
pub fn match_score(mood: Mood, features: &AudioFeatures) -> f32 {
    let energy = clamp01(features.rms);
    let calm = clamp01(1.0 - features.rms * 2.0);
    let tempo_drive = clamp01(features.tempo / 180.0);
    let slowness = clamp01(1.0 - features.tempo / 180.0);
    let bright = clamp01(features.brightness);
    let dark = clamp01(1.0 - features.brightness);
    let harmonic = clamp01(features.harmonic_ratio);
    let noisy = clamp01(features.flatness);
    let tonal = clamp01(1.0 - features.flatness);
    let danceability = clamp01(0.5 * features.bass_energy + 0.5 * clamp01(features.flux * 25.0));

    match mood {
        Mood::Energetic => 0.4 * energy + 0.3 * tempo_drive + 0.3 * danceability,
        Mood::Relaxed => 0.4 * calm + 0.35 * slowness + 0.25 * tonal,
        Mood::Happy => 0.35 * bright + 0.35 * harmonic + 0.3 * tempo_drive,
        Mood::Melancholic => 0.4 * dark + 0.35 * slowness + 0.25 * calm,
        Mood::Focused => 0.4 * tonal + 0.3 * calm + 0.3 * clamp01(features.mid_energy),
        Mood::Angry => 0.4 * noisy + 0.3 * energy + 0.3 * clamp01(features.treble_energy),
        // Constant floor so silence and ambiguity fall back somewhere
        Mood::Neutral => 0.2,
    }
}

/// Mutable classification state owned by the engine
#[derive(Debug, Clone)]
pub struct MoodState {
    current: Mood,
    confidence: f32,
    history: RingHistory<Mood>,
    distribution: [f32; 7],
}

impl MoodState {
    fn new(history_len: usize) -> Self {
        Self {
            current: Mood::Neutral,
            confidence: 0.0,
            history: RingHistory::new(history_len),
            distribution: [1.0 / 7.0; 7],
        }
    }
}

/// Rule-based mood classifier with confidence smoothing
pub struct MoodEngine {
    state: MoodState,
    confidence_threshold: f32,
    stability_factor: f32,
    readings_tx: broadcast::Sender<MoodReading>,
}

impl Default for MoodEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MoodEngine {
    pub fn new() -> Self {
        Self::with_params(
            DEFAULT_CONFIDENCE_THRESHOLD,
            DEFAULT_STABILITY_FACTOR,
            DEFAULT_HISTORY_LEN,
        )
    }

    pub fn with_params(
        confidence_threshold: f32,
        stability_factor: f32,
        history_len: usize,
    ) -> Self {
        let (readings_tx, _) = broadcast::channel(READINGS_CHANNEL_LEN);
        Self {
            state: MoodState::new(history_len),
            confidence_threshold,
            stability_factor,
            readings_tx,
        }
    }

    /// Classify one feature record, biased by the local time of day
    pub fn detect_mood(&mut self, features: &AudioFeatures) -> MoodReading {
        self.detect_mood_at(features, TimeOfDay::now())
    }

    /// Classify one feature record with an explicit time-of-day bucket
    ///
    /// Returns the argmax reading; whether the engine's current mood
    /// follows it is governed by the threshold and stability rules.
    pub fn detect_mood_at(&mut self, features: &AudioFeatures, time: TimeOfDay) -> MoodReading {
        let mut scores = [0.0_f32; 7];
        for (i, &mood) in Mood::ALL.iter().enumerate() {
            let bias = if time.favors(mood) { TIME_OF_DAY_BIAS } else { 0.0 };
            scores[i] = match_score(mood, features) + bias;
        }

        let mut best = 0;
        for (i, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = i;
            }
        }
        let winner = Mood::ALL[best];
        let sum: f32 = scores.iter().sum();
        let confidence = if sum > 0.0 {
            clamp01(scores[best] / sum)
        } else {
            0.0
        };
        let reading = MoodReading {
            mood: winner,
            confidence,
        };

        if confidence >= self.confidence_threshold {
            if winner == self.state.current {
                // Same mood, better evidence: only refresh the confidence
                if confidence > self.state.confidence {
                    self.state.confidence = confidence;
                    self.commit(reading);
                }
            } else if self.state.confidence == 0.0
                || confidence > self.state.confidence * self.stability_factor
            {
                tracing::debug!(
                    "[MoodEngine] {:?} -> {:?} (confidence {:.3})",
                    self.state.current,
                    winner,
                    confidence
                );
                self.state.current = winner;
                self.state.confidence = confidence;
                self.commit(reading);
            }
        }

        reading
    }

    /// Record a successful update: history, distribution, notification
    fn commit(&mut self, reading: MoodReading) {
        self.state.history.push(reading.mood);

        for slot in self.state.distribution.iter_mut() {
            *slot *= DISTRIBUTION_DECAY;
        }
        self.state.distribution[reading.mood.index()] +=
            reading.confidence * DISTRIBUTION_GAIN;
        let total: f32 = self.state.distribution.iter().sum();
        if total > 0.0 {
            for slot in self.state.distribution.iter_mut() {
                *slot /= total;
            }
        }

        // Send failures just mean nobody is listening
        let _ = self.readings_tx.send(reading);
    }

    /// Return to the initial neutral state
    pub fn reset(&mut self) {
        let history_len = self.state.history.capacity();
        self.state = MoodState::new(history_len);
    }

    pub fn current_mood(&self) -> Mood {
        self.state.current
    }

    pub fn confidence(&self) -> f32 {
        self.state.confidence
    }

    /// Decayed distribution over all moods; sums to 1
    pub fn distribution(&self) -> [(Mood, f32); 7] {
        let mut out = [(Mood::Neutral, 0.0); 7];
        for (i, &mood) in Mood::ALL.iter().enumerate() {
            out[i] = (mood, self.state.distribution[i]);
        }
        out
    }

    /// Recent winning moods, oldest first
    pub fn recent_moods(&self) -> Vec<Mood> {
        self.state.history.snapshot()
    }

    /// Subscribe to successful mood updates
    pub fn subscribe(&self) -> broadcast::Receiver<MoodReading> {
        self.readings_tx.subscribe()
    }
}
