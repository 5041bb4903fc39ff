// PersonalityEngine - behavioral archetype classification
//
// Aggregates discrete listening-interaction events into one of a closed
// set of behavioral archetypes used to weight recommendations. The
// classification is a derived, cached value: it is recomputed only once
// enough events have accumulated and a cooldown has elapsed, so bursts of
// interaction do not thrash the archetype.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Events required before the first/any recomputation
const DEFAULT_MIN_EVENTS: usize = 10;

/// Seconds between recomputations
const DEFAULT_COOLDOWN_SECS: i64 = 3600;

/// A new dominant type must exceed this normalized confidence
const ACCEPT_CONFIDENCE: f32 = 0.3;

/// Event count at which engagement saturates
const ENGAGEMENT_BASELINE: f32 = 50.0;

/// Behavioral archetype derived from interaction patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonalityType {
    /// Skips and searches a lot, rarely finishes tracks
    Explorer,
    /// Likes, saves, builds playlists
    Curator,
    /// High interaction volume across the board
    Enthusiast,
    /// Listens deliberately and completely
    Analyzer,
    /// Default archetype with no strong signal
    Balanced,
}

impl PersonalityType {
    pub const ALL: [PersonalityType; 5] = [
        PersonalityType::Explorer,
        PersonalityType::Curator,
        PersonalityType::Enthusiast,
        PersonalityType::Analyzer,
        PersonalityType::Balanced,
    ];
}

/// Kind of recorded listening interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionKind {
    SongPlayed,
    SongCompleted,
    SongSkipped,
    SongLiked,
    PlaylistCreated,
    SearchPerformed,
    MoodOverridden,
    VolumeChanged,
}

/// One immutable interaction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    /// Prior value for change-style events (mood override, volume)
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl InteractionEvent {
    pub fn new(kind: InteractionKind) -> Self {
        Self {
            kind,
            old_value: None,
            new_value: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_change(kind: InteractionKind, old_value: String, new_value: String) -> Self {
        Self {
            kind,
            old_value: Some(old_value),
            new_value: Some(new_value),
            timestamp: Utc::now(),
        }
    }
}

/// Behavioral scores derived from the event log, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
struct BehaviorScores {
    completion: f32,
    curation: f32,
    exploration: f32,
    engagement: f32,
}

/// Event-log-driven archetype classifier
pub struct PersonalityEngine {
    events: Vec<InteractionEvent>,
    classification: PersonalityType,
    confidence: f32,
    last_analysis: Option<DateTime<Utc>>,
    analysis_count: u64,
    min_events: usize,
    cooldown: Duration,
}

impl Default for PersonalityEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonalityEngine {
    pub fn new() -> Self {
        Self::with_params(DEFAULT_MIN_EVENTS, DEFAULT_COOLDOWN_SECS)
    }

    pub fn with_params(min_events: usize, cooldown_secs: i64) -> Self {
        Self {
            events: Vec::new(),
            classification: PersonalityType::Balanced,
            confidence: 0.0,
            last_analysis: None,
            analysis_count: 0,
            min_events: min_events.max(1),
            cooldown: Duration::seconds(cooldown_secs),
        }
    }

    /// Append an event and recompute the archetype if the gate allows
    pub fn record(&mut self, event: InteractionEvent) {
        self.record_at(event, Utc::now());
    }

    /// As `record` with an explicit clock, for deterministic callers
    pub fn record_at(&mut self, event: InteractionEvent, now: DateTime<Utc>) {
        self.events.push(event);
        if self.events.len() >= self.min_events && self.cooldown_elapsed(now) {
            self.analyze(now);
        }
    }

    fn cooldown_elapsed(&self, now: DateTime<Utc>) -> bool {
        match self.last_analysis {
            None => true,
            Some(last) => now - last >= self.cooldown,
        }
    }

    /// Recompute immediately, bypassing the cooldown gate
    ///
    /// The minimum-event requirement still applies; classifying a handful
    /// of events would be noise.
    pub fn force_analyze(&mut self) -> PersonalityType {
        if self.events.len() >= self.min_events {
            self.analyze(Utc::now());
        }
        self.classification
    }

    fn analyze(&mut self, now: DateTime<Utc>) {
        let scores = self.behavior_scores();
        let mut best = PersonalityType::Balanced;
        let mut best_score = f32::MIN;
        let mut sum = 0.0;
        for archetype in PersonalityType::ALL {
            let score = Self::weighted_score(archetype, scores);
            sum += score;
            if score > best_score {
                best_score = score;
                best = archetype;
            }
        }

        let confidence = if sum > 0.0 { best_score / sum } else { 0.0 };
        if confidence > ACCEPT_CONFIDENCE {
            tracing::debug!(
                "[PersonalityEngine] {:?} -> {:?} (confidence {:.3})",
                self.classification,
                best,
                confidence
            );
            self.classification = best;
            self.confidence = confidence;
        }
        // The computation still counts toward the cooldown when the
        // dominant type was too weak to accept
        self.last_analysis = Some(now);
        self.analysis_count += 1;
    }

    fn behavior_scores(&self) -> BehaviorScores {
        let total = self.events.len() as f32;
        let count = |kind: InteractionKind| {
            self.events.iter().filter(|e| e.kind == kind).count() as f32
        };
        let plays = count(InteractionKind::SongPlayed);
        let completed = count(InteractionKind::SongCompleted);
        let skipped = count(InteractionKind::SongSkipped);
        let liked = count(InteractionKind::SongLiked);
        let playlists = count(InteractionKind::PlaylistCreated);
        let searches = count(InteractionKind::SearchPerformed);

        BehaviorScores {
            completion: if plays > 0.0 {
                (completed / plays).clamp(0.0, 1.0)
            } else {
                0.0
            },
            curation: (2.0 * (liked + playlists) / total).clamp(0.0, 1.0),
            exploration: (1.5 * (skipped + searches) / total).clamp(0.0, 1.0),
            engagement: (total / ENGAGEMENT_BASELINE).clamp(0.0, 1.0),
        }
    }

    /// Fixed per-archetype weight table over the behavioral scores
    fn weighted_score(archetype: PersonalityType, s: BehaviorScores) -> f32 {
        match archetype {
            PersonalityType::Explorer => {
                0.5 * s.exploration
                    + 0.2 * s.engagement
                    + 0.2 * (1.0 - s.completion)
                    + 0.1 * s.curation
            }
            PersonalityType::Curator => {
                0.5 * s.curation
                    + 0.25 * s.completion
                    + 0.15 * s.engagement
                    + 0.1 * s.exploration
            }
            PersonalityType::Enthusiast => {
                0.4 * s.engagement
                    + 0.3 * s.completion
                    + 0.2 * s.curation
                    + 0.1 * s.exploration
            }
            PersonalityType::Analyzer => {
                0.45 * s.completion + 0.3 * (1.0 - s.exploration) + 0.25 * s.engagement
            }
            PersonalityType::Balanced => {
                0.25 * (s.completion + s.curation + s.exploration + s.engagement)
            }
        }
    }

    /// Clear the log and revert to the default archetype
    pub fn reset(&mut self) {
        self.events.clear();
        self.classification = PersonalityType::Balanced;
        self.confidence = 0.0;
        self.last_analysis = None;
    }

    pub fn classification(&self) -> PersonalityType {
        self.classification
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// How many times the archetype has been recomputed
    pub fn analysis_count(&self) -> u64 {
        self.analysis_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: InteractionKind) -> InteractionEvent {
        InteractionEvent::new(kind)
    }

    #[test]
    fn test_nine_events_never_recompute_tenth_triggers_once() {
        let mut engine = PersonalityEngine::new();
        let now = Utc::now();
        for _ in 0..9 {
            engine.record_at(event(InteractionKind::SongPlayed), now);
        }
        assert_eq!(engine.analysis_count(), 0, "9 events must not recompute");

        engine.record_at(event(InteractionKind::SongPlayed), now);
        assert_eq!(engine.analysis_count(), 1, "10th event triggers exactly once");

        // Within the cooldown further events do not recompute
        engine.record_at(event(InteractionKind::SongPlayed), now);
        assert_eq!(engine.analysis_count(), 1);
    }

    #[test]
    fn test_cooldown_gates_recomputation() {
        let mut engine = PersonalityEngine::new();
        let start = Utc::now();
        for _ in 0..10 {
            engine.record_at(event(InteractionKind::SongPlayed), start);
        }
        assert_eq!(engine.analysis_count(), 1);

        // Just under an hour: still gated
        let early = start + Duration::seconds(3599);
        engine.record_at(event(InteractionKind::SongSkipped), early);
        assert_eq!(engine.analysis_count(), 1);

        // Past the cooldown: recomputes again
        let late = start + Duration::seconds(3600);
        engine.record_at(event(InteractionKind::SongSkipped), late);
        assert_eq!(engine.analysis_count(), 2);
    }

    #[test]
    fn test_explorer_pattern_classifies() {
        let mut engine = PersonalityEngine::new();
        let now = Utc::now();
        // Heavy skipping and searching with no completions
        for _ in 0..12 {
            engine.record_at(event(InteractionKind::SongSkipped), now);
        }
        for _ in 0..6 {
            engine.record_at(event(InteractionKind::SearchPerformed), now);
        }
        engine.force_analyze();
        assert_eq!(engine.classification(), PersonalityType::Explorer);
        assert!(engine.confidence() > ACCEPT_CONFIDENCE);
    }

    #[test]
    fn test_weak_dominance_retains_previous() {
        let mut engine = PersonalityEngine::new();
        let now = Utc::now();
        // A spread of everything keeps all archetype scores close, so the
        // normalized winner stays under the acceptance threshold
        let kinds = [
            InteractionKind::SongPlayed,
            InteractionKind::SongCompleted,
            InteractionKind::SongSkipped,
            InteractionKind::SongLiked,
            InteractionKind::SearchPerformed,
        ];
        for kind in kinds.iter().cycle().take(15) {
            engine.record_at(event(*kind), now);
        }
        assert!(engine.analysis_count() >= 1);
        assert_eq!(engine.classification(), PersonalityType::Balanced);
    }

    #[test]
    fn test_force_analyze_requires_min_events() {
        let mut engine = PersonalityEngine::new();
        engine.record(event(InteractionKind::SongPlayed));
        engine.force_analyze();
        assert_eq!(engine.analysis_count(), 0);
        assert_eq!(engine.classification(), PersonalityType::Balanced);
    }

    #[test]
    fn test_reset_reverts_to_balanced() {
        let mut engine = PersonalityEngine::new();
        let now = Utc::now();
        for _ in 0..18 {
            engine.record_at(event(InteractionKind::SongSkipped), now);
        }
        engine.force_analyze();
        assert_ne!(engine.classification(), PersonalityType::Balanced);

        engine.reset();
        assert_eq!(engine.classification(), PersonalityType::Balanced);
        assert_eq!(engine.event_count(), 0);
        assert_eq!(engine.confidence(), 0.0);
    }

    #[test]
    fn test_change_events_carry_values() {
        let event = InteractionEvent::with_change(
            InteractionKind::MoodOverridden,
            "Relaxed".to_string(),
            "Energetic".to_string(),
        );
        assert_eq!(event.old_value.as_deref(), Some("Relaxed"));
        assert_eq!(event.new_value.as_deref(), Some("Energetic"));
    }
}
