// TempoEstimator - onset-driven tempo tracking with temporal smoothing
//
// Maintains cross-frame state: the previous magnitude spectrum, the
// previous RMS, and a bounded history of BPM candidates. Calls must be
// strictly frame-sequential for one logical stream; use one estimator
// instance per stream.
//
// The instantaneous BPM candidate is derived from the analysis frame rate.
// This heuristic is carried over from the original design unchanged.

use crate::audio::ring_history::RingHistory;

/// Onset strength above this value registers a beat candidate
const ONSET_THRESHOLD: f32 = 0.3;

/// Onset strength blend weights: spectral flux vs RMS rise
const FLUX_WEIGHT: f32 = 0.6;
const RMS_WEIGHT: f32 = 0.4;

/// Exponential smoothing factor for the candidate history
const SMOOTHING: f32 = 0.15;

/// Reported tempo blend: median vs exponentially-smoothed history
const MEDIAN_WEIGHT: f32 = 0.7;
const SMOOTHED_WEIGHT: f32 = 0.3;

/// Tempo reported while no candidate has been observed
pub const DEFAULT_TEMPO_BPM: f32 = 120.0;

/// Candidate history capacity
const HISTORY_LEN: usize = 8;

/// Stateful tempo estimator fed one spectrum per analysis frame
pub struct TempoEstimator {
    sample_rate: u32,
    hop_size: usize,
    min_bpm: f32,
    max_bpm: f32,
    prev_spectrum: Option<Vec<f32>>,
    prev_rms: f32,
    history: RingHistory<f32>,
    smoothed: Option<f32>,
}

impl TempoEstimator {
    pub fn new(sample_rate: u32, hop_size: usize) -> Self {
        Self::with_range(sample_rate, hop_size, 40.0, 240.0)
    }

    pub fn with_range(sample_rate: u32, hop_size: usize, min_bpm: f32, max_bpm: f32) -> Self {
        Self {
            sample_rate,
            hop_size: hop_size.max(1),
            min_bpm,
            max_bpm,
            prev_spectrum: None,
            prev_rms: 0.0,
            history: RingHistory::new(HISTORY_LEN),
            smoothed: None,
        }
    }

    /// Feed one frame's spectrum and RMS; returns the current tempo in BPM
    ///
    /// Onset strength = 0.6 * spectral flux + 0.4 * max(0, RMS rise). A
    /// strength above the threshold pushes a frame-rate-derived BPM
    /// candidate (clamped to the configured range) into the history.
    pub fn process(&mut self, spectrum: &[f32], rms: f32) -> f32 {
        let flux = match &self.prev_spectrum {
            Some(prev) => {
                let mut sum = 0.0;
                for (i, &mag) in spectrum.iter().enumerate() {
                    let p = prev.get(i).copied().unwrap_or(0.0);
                    sum += (mag - p).max(0.0);
                }
                sum / spectrum.len().max(1) as f32
            }
            None => 0.0,
        };
        let rms_rise = (rms - self.prev_rms).max(0.0);
        let onset_strength = FLUX_WEIGHT * flux + RMS_WEIGHT * rms_rise;

        match &mut self.prev_spectrum {
            Some(prev) => {
                prev.clear();
                prev.extend_from_slice(spectrum);
            }
            None => self.prev_spectrum = Some(spectrum.to_vec()),
        }
        self.prev_rms = rms;

        if onset_strength > ONSET_THRESHOLD {
            let candidate = self.instantaneous_bpm();
            self.history.push(candidate);
            self.smoothed = Some(match self.smoothed {
                Some(s) => SMOOTHING * candidate + (1.0 - SMOOTHING) * s,
                None => candidate,
            });
        }

        self.current_tempo()
    }

    /// Tempo from the accumulated candidate history
    ///
    /// 0.7 * median + 0.3 * exponentially-smoothed value; 120 BPM while
    /// the history is empty.
    pub fn current_tempo(&self) -> f32 {
        if self.history.is_empty() {
            return DEFAULT_TEMPO_BPM;
        }
        let mut sorted = self.history.snapshot();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median = sorted[sorted.len() / 2];
        let smoothed = self.smoothed.unwrap_or(median);
        (MEDIAN_WEIGHT * median + SMOOTHED_WEIGHT * smoothed).clamp(self.min_bpm, self.max_bpm)
    }

    /// Frame-rate-derived instantaneous candidate, clamped to range
    fn instantaneous_bpm(&self) -> f32 {
        let frame_rate = self.sample_rate as f32 / self.hop_size as f32;
        frame_rate.clamp(self.min_bpm, self.max_bpm)
    }

    /// Discard all cross-frame state
    pub fn reset(&mut self) {
        self.prev_spectrum = None;
        self.prev_rms = 0.0;
        self.history.clear();
        self.smoothed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tempo_with_empty_history() {
        let estimator = TempoEstimator::new(44100, 512);
        assert_eq!(estimator.current_tempo(), DEFAULT_TEMPO_BPM);
    }

    #[test]
    fn test_silence_never_registers_candidates() {
        let mut estimator = TempoEstimator::new(44100, 512);
        let silence = vec![0.0; 1024];
        for _ in 0..32 {
            let tempo = estimator.process(&silence, 0.0);
            assert_eq!(tempo, DEFAULT_TEMPO_BPM);
        }
    }

    #[test]
    fn test_onsets_produce_bounded_tempo() {
        let mut estimator = TempoEstimator::new(44100, 512);
        let quiet = vec![0.0; 1024];
        let loud = vec![1.0; 1024];
        // Alternating quiet/loud frames drive flux and RMS rise over the
        // onset threshold every other frame
        for i in 0..16 {
            let tempo = if i % 2 == 0 {
                estimator.process(&quiet, 0.0)
            } else {
                estimator.process(&loud, 0.9)
            };
            assert!(
                (40.0..=240.0).contains(&tempo),
                "tempo {} out of bounds",
                tempo
            );
        }
        // Candidates were observed, so the default no longer applies
        assert_ne!(estimator.current_tempo(), DEFAULT_TEMPO_BPM);
    }

    #[test]
    fn test_tempo_always_in_range() {
        // Pathological hop: frame rate far above the max must still clamp
        let mut estimator = TempoEstimator::new(96000, 1);
        let quiet = vec![0.0; 64];
        let loud = vec![2.0; 64];
        estimator.process(&quiet, 0.0);
        let tempo = estimator.process(&loud, 1.0);
        assert!((40.0..=240.0).contains(&tempo));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut estimator = TempoEstimator::new(44100, 512);
        let quiet = vec![0.0; 1024];
        let loud = vec![1.0; 1024];
        for _ in 0..40 {
            estimator.process(&quiet, 0.0);
            estimator.process(&loud, 0.9);
        }
        assert!(estimator.history.len() <= HISTORY_LEN);
    }

    #[test]
    fn test_reset_restores_default() {
        let mut estimator = TempoEstimator::new(44100, 512);
        let quiet = vec![0.0; 1024];
        let loud = vec![1.0; 1024];
        estimator.process(&quiet, 0.0);
        estimator.process(&loud, 0.9);
        assert_ne!(estimator.current_tempo(), DEFAULT_TEMPO_BPM);
        estimator.reset();
        assert_eq!(estimator.current_tempo(), DEFAULT_TEMPO_BPM);
    }
}
