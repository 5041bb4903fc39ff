// PitchEstimator - time-domain fundamental frequency estimation
//
// YIN-style estimator: a cumulative-mean-normalized difference function is
// evaluated over candidate lags and the minimizing lag is converted to a
// frequency. Frame-local; no state is carried between calls.
//
// References:
// - de Cheveigné, A. & Kawahara, H. (2002). YIN, a fundamental frequency
//   estimator for speech and music

/// Result of a pitch estimation pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Fundamental frequency in Hz, 0 when no pitch was found
    pub frequency: f32,
    /// 1 minus the minimal normalized difference, in [0, 1]
    pub confidence: f32,
}

impl PitchEstimate {
    /// Unvoiced/degenerate fallback
    pub fn none() -> Self {
        Self {
            frequency: 0.0,
            confidence: 0.0,
        }
    }
}

/// Time-domain pitch estimator
pub struct PitchEstimator {
    sample_rate: u32,
}

impl PitchEstimator {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Estimate the fundamental frequency of a frame
    ///
    /// Searches lags in [2, N/2). Frames with N/2 <= 2 or without any
    /// signal energy return frequency 0 and confidence 0 rather than NaN.
    pub fn estimate(&self, frame: &[f32]) -> PitchEstimate {
        let max_lag = frame.len() / 2;
        if max_lag <= 2 {
            return PitchEstimate::none();
        }

        // Difference function over the half-frame window
        let mut difference = vec![0.0_f32; max_lag];
        for (lag, slot) in difference.iter_mut().enumerate().skip(1) {
            let mut sum = 0.0;
            for i in 0..max_lag {
                let delta = frame[i] - frame[i + lag];
                sum += delta * delta;
            }
            *slot = sum;
        }

        // Cumulative-mean normalization; a zero running sum means the
        // frame is silent and has no periodicity to report
        let mut normalized = vec![1.0_f32; max_lag];
        let mut running_sum = 0.0_f32;
        for (lag, &d) in difference.iter().enumerate().skip(1) {
            running_sum += d;
            if running_sum > 0.0 {
                normalized[lag] = d * lag as f32 / running_sum;
            }
        }
        if running_sum <= 0.0 {
            return PitchEstimate::none();
        }

        // Take the first dip under the absolute threshold, descended to
        // its local valley. A bare global minimum would favor whichever
        // period multiple aligns best with the lag grid (octave errors).
        const ABSOLUTE_THRESHOLD: f32 = 0.1;
        let mut best_lag = 0usize;
        let mut best_value = f32::MAX;
        let mut lag = 2;
        while lag < max_lag {
            if normalized[lag] < ABSOLUTE_THRESHOLD {
                while lag + 1 < max_lag && normalized[lag + 1] < normalized[lag] {
                    lag += 1;
                }
                best_lag = lag;
                best_value = normalized[lag];
                break;
            }
            lag += 1;
        }
        if best_lag == 0 {
            for (lag, &value) in normalized.iter().enumerate().skip(2) {
                if value < best_value {
                    best_value = value;
                    best_lag = lag;
                }
            }
        }

        if best_lag == 0 || best_value >= 1.0 {
            return PitchEstimate::none();
        }

        PitchEstimate {
            frequency: self.sample_rate as f32 / best_lag as f32,
            confidence: (1.0 - best_value).clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_sine_440() {
        let estimator = PitchEstimator::new(44100);
        let estimate = estimator.estimate(&sine(440.0, 44100, 2048));
        assert!(
            (estimate.frequency - 440.0).abs() < 10.0,
            "expected ~440 Hz, got {}",
            estimate.frequency
        );
        assert!(
            estimate.confidence > 0.8,
            "expected high confidence, got {}",
            estimate.confidence
        );
    }

    #[test]
    fn test_low_frequency_sine() {
        let estimator = PitchEstimator::new(44100);
        let estimate = estimator.estimate(&sine(110.0, 44100, 4096));
        assert!(
            (estimate.frequency - 110.0).abs() < 3.0,
            "expected ~110 Hz, got {}",
            estimate.frequency
        );
    }

    #[test]
    fn test_silence_yields_zero() {
        let estimator = PitchEstimator::new(44100);
        let estimate = estimator.estimate(&vec![0.0; 2048]);
        assert_eq!(estimate.frequency, 0.0);
        assert_eq!(estimate.confidence, 0.0);
    }

    #[test]
    fn test_too_short_frame_yields_zero() {
        let estimator = PitchEstimator::new(44100);
        for len in [0, 1, 2, 4] {
            let estimate = estimator.estimate(&vec![0.5; len]);
            assert_eq!(estimate.frequency, 0.0, "len {}", len);
            assert_eq!(estimate.confidence, 0.0, "len {}", len);
        }
    }

    #[test]
    fn test_confidence_bounds() {
        let estimator = PitchEstimator::new(44100);
        // Deterministic pseudo-noise
        let noise: Vec<f32> = (0..2048)
            .map(|i| (((i as i64 * 1103515245 + 12345) % 32768) as f32 / 16384.0) - 1.0)
            .collect();
        let estimate = estimator.estimate(&noise);
        assert!(estimate.confidence >= 0.0 && estimate.confidence <= 1.0);
    }
}
