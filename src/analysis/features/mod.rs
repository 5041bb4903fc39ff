// FeatureExtractor - per-frame descriptor extraction pipeline
//
// Coordinates the transform and the derived-feature calculators into a
// single facade producing one AudioFeatures value per analysis window.
//
// Module organization:
// - types: AudioFeatures record
// - fft: windowed transform with magnitude normalization
// - spectral: frequency-domain features (canonical formula set)
// - mfcc: mel filterbank and cepstral coefficients
// - mod.rs: coordinator (FeatureExtractor)
//
// The extractor owns the cross-frame flux cache (previous magnitudes) and
// the tempo estimator's history, so one extractor instance corresponds to
// one logical audio stream and calls must stay frame-sequential.

mod fft;
mod mfcc;
mod spectral;
mod types;

pub use mfcc::{MelFilterbank, NUM_COEFFICIENTS};
pub use spectral::{BandEnergies, SpectralCalculator};
pub use types::AudioFeatures;

use crate::analysis::pitch::PitchEstimator;
use crate::analysis::tempo::TempoEstimator;
use crate::error::AnalysisError;
use fft::FftProcessor;

/// Default transform size in samples
pub const DEFAULT_FRAME_SIZE: usize = 2048;
/// Default sample advance between analysis frames
pub const DEFAULT_HOP_SIZE: usize = 512;

/// Guard for amplitude ratio denominators
const EPSILON: f32 = 1e-6;

/// FeatureExtractor coordinates the per-frame extraction pipeline
///
/// Combines windowed FFT, spectral features, cepstral coefficients, pitch
/// and tempo estimation behind a single `extract` call.
pub struct FeatureExtractor {
    fft: FftProcessor,
    spectral: SpectralCalculator,
    mel: MelFilterbank,
    pitch: PitchEstimator,
    tempo: TempoEstimator,
    /// Previous frame's magnitudes, kept for flux
    prev_spectrum: Option<Vec<f32>>,
    frame_size: usize,
    hop_size: usize,
    sample_rate: u32,
}

impl FeatureExtractor {
    /// Create an extractor with the default frame and hop sizes
    pub fn new(sample_rate: u32) -> Self {
        Self::with_params(sample_rate, DEFAULT_FRAME_SIZE, DEFAULT_HOP_SIZE)
    }

    /// Create an extractor with explicit transform geometry
    ///
    /// # Panics
    /// Panics if frame_size is not a power of two (transform requirement)
    pub fn with_params(sample_rate: u32, frame_size: usize, hop_size: usize) -> Self {
        Self {
            fft: FftProcessor::new(frame_size),
            spectral: SpectralCalculator::new(sample_rate, frame_size),
            mel: MelFilterbank::new(frame_size, sample_rate),
            pitch: PitchEstimator::new(sample_rate),
            tempo: TempoEstimator::new(sample_rate, hop_size),
            prev_spectrum: None,
            frame_size,
            hop_size,
            sample_rate,
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Real-time duration of one frame in seconds
    pub fn frame_duration_secs(&self) -> f32 {
        self.frame_size as f32 / self.sample_rate as f32
    }

    /// Extract all descriptors from one sample frame
    ///
    /// The frame is windowed to the transform size (zero-padded or
    /// truncated at the boundary). An empty frame is an input-shape error;
    /// degenerate signal content (silence) is not, and yields the
    /// documented fallback values instead.
    pub fn extract(&mut self, frame: &[f32]) -> Result<AudioFeatures, AnalysisError> {
        if frame.is_empty() {
            return Err(AnalysisError::EmptyFrame);
        }

        // Amplitude statistics from the raw waveform
        let sum_squares: f32 = frame.iter().map(|&x| x * x).sum();
        let rms = (sum_squares / frame.len() as f32).sqrt();
        let peak = frame.iter().fold(0.0_f32, |acc, &x| acc.max(x.abs()));
        let crest_factor = if rms > EPSILON { peak / rms } else { 0.0 };

        let spectrum = self.fft.magnitude_spectrum(frame);

        let bands = self.spectral.band_energies(&spectrum);
        let centroid = self.spectral.centroid(&spectrum);
        let spread = self.spectral.spread(&spectrum, centroid);
        let skewness = self.spectral.skewness(&spectrum, centroid, spread);
        let kurtosis = self.spectral.kurtosis(&spectrum, centroid, spread);
        let rolloff = self.spectral.rolloff(&spectrum);
        let flatness = self.spectral.flatness(&spectrum);
        let spectral_crest = self.spectral.crest(&spectrum);
        let harmonic_ratio = self.spectral.harmonic_ratio(&spectrum);
        let brightness = self.spectral.brightness(&spectrum);
        let flux = self.spectral.flux(&spectrum, self.prev_spectrum.as_deref());

        let mfcc = self.mel.compute(&spectrum);
        let pitch = self.pitch.estimate(frame);
        let tempo = self.tempo.process(&spectrum, rms);

        self.prev_spectrum = Some(spectrum);

        Ok(AudioFeatures {
            rms,
            peak,
            crest_factor,
            centroid,
            spread,
            skewness,
            kurtosis,
            rolloff,
            flatness,
            flux,
            spectral_crest,
            harmonic_ratio,
            brightness,
            bass_energy: bands.bass,
            mid_energy: bands.mid,
            treble_energy: bands.treble,
            pitch: pitch.frequency,
            pitch_confidence: pitch.confidence,
            tempo,
            mfcc,
        })
    }

    /// Discard cross-frame state (flux cache, tempo history)
    ///
    /// Call between unrelated streams; estimator state must never span
    /// two logical audio sources.
    pub fn reset(&mut self) {
        self.prev_spectrum = None;
        self.tempo.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;

    /// Generate pure sine wave for testing
    fn generate_sine_wave(sample_rate: u32, frequency: f32, duration_samples: usize) -> Vec<f32> {
        (0..duration_samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * frequency * t).sin()
            })
            .collect()
    }

    /// Generate white noise for testing
    fn generate_white_noise(duration_samples: usize) -> Vec<f32> {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        (0..duration_samples)
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect()
    }

    #[test]
    fn test_silence_scenario() {
        let mut extractor = FeatureExtractor::new(SAMPLE_RATE);
        let features = extractor.extract(&vec![0.0; 2048]).unwrap();

        assert_eq!(features.rms, 0.0, "energy should be 0 for silence");
        assert_eq!(features.peak, 0.0);
        assert_eq!(features.pitch, 0.0, "pitch should be 0 for silence");
        assert_eq!(features.pitch_confidence, 0.0);
        assert_eq!(features.tempo, 120.0, "tempo should default to 120");
        assert_eq!(features.bass_energy, 0.0);
        assert_eq!(features.mid_energy, 0.0);
        assert_eq!(features.treble_energy, 0.0);
    }

    #[test]
    fn test_empty_frame_is_an_error() {
        let mut extractor = FeatureExtractor::new(SAMPLE_RATE);
        assert_eq!(extractor.extract(&[]), Err(AnalysisError::EmptyFrame));
    }

    #[test]
    fn test_sine_440_centroid() {
        let mut extractor = FeatureExtractor::new(SAMPLE_RATE);
        let signal = generate_sine_wave(SAMPLE_RATE, 440.0, 2048);
        let features = extractor.extract(&signal).unwrap();

        let bin_width = SAMPLE_RATE as f32 / 2048.0;
        assert!(
            (features.centroid - 440.0).abs() <= bin_width,
            "centroid {} Hz not within one bin of 440",
            features.centroid
        );
    }

    #[test]
    fn test_sine_440_pitch() {
        let mut extractor = FeatureExtractor::new(SAMPLE_RATE);
        let signal = generate_sine_wave(SAMPLE_RATE, 440.0, 2048);
        let features = extractor.extract(&signal).unwrap();

        assert!(
            (features.pitch - 440.0).abs() < 10.0,
            "pitch {} Hz not near 440",
            features.pitch
        );
        assert!(features.pitch_confidence > 0.5);
    }

    #[test]
    fn test_band_energies_sum_for_signal() {
        let mut extractor = FeatureExtractor::new(SAMPLE_RATE);
        let signal = generate_white_noise(2048);
        let features = extractor.extract(&signal).unwrap();

        let sum = features.bass_energy + features.mid_energy + features.treble_energy;
        assert!((sum - 1.0).abs() < 1e-4, "band sum {} should be 1", sum);
    }

    #[test]
    fn test_flux_zero_on_first_frame() {
        let mut extractor = FeatureExtractor::new(SAMPLE_RATE);
        let signal = generate_sine_wave(SAMPLE_RATE, 440.0, 2048);
        let first = extractor.extract(&signal).unwrap();
        assert_eq!(first.flux, 0.0, "no previous spectrum on the first frame");

        // A louder second frame produces positive flux
        let louder: Vec<f32> = signal.iter().map(|&x| x * 2.0).collect();
        let second = extractor.extract(&louder).unwrap();
        assert!(second.flux > 0.0);
    }

    #[test]
    fn test_normalized_fields_bounded() {
        let mut extractor = FeatureExtractor::new(SAMPLE_RATE);
        let signal = generate_white_noise(2048);
        let features = extractor.extract(&signal).unwrap();

        for (name, value) in [
            ("flatness", features.flatness),
            ("harmonic_ratio", features.harmonic_ratio),
            ("brightness", features.brightness),
            ("bass", features.bass_energy),
            ("mid", features.mid_energy),
            ("treble", features.treble_energy),
            ("pitch_confidence", features.pitch_confidence),
        ] {
            assert!(
                (0.0..=1.0).contains(&value),
                "{} = {} out of [0, 1]",
                name,
                value
            );
        }
    }

    #[test]
    fn test_short_frame_is_zero_padded() {
        let mut extractor = FeatureExtractor::new(SAMPLE_RATE);
        let short = generate_sine_wave(SAMPLE_RATE, 440.0, 512);
        let features = extractor.extract(&short).unwrap();
        assert!(features.centroid > 0.0);
    }

    #[test]
    fn test_reset_clears_flux_cache() {
        let mut extractor = FeatureExtractor::new(SAMPLE_RATE);
        let signal = generate_sine_wave(SAMPLE_RATE, 440.0, 2048);
        extractor.extract(&signal).unwrap();
        extractor.reset();
        let features = extractor.extract(&signal).unwrap();
        assert_eq!(features.flux, 0.0, "reset must drop the previous spectrum");
        assert_eq!(features.tempo, 120.0, "reset must drop tempo history");
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let signal = generate_sine_wave(SAMPLE_RATE, 523.25, 2048);
        let mut a = FeatureExtractor::new(SAMPLE_RATE);
        let mut b = FeatureExtractor::new(SAMPLE_RATE);
        let features_a = a.extract(&signal).unwrap();
        let features_b = b.extract(&signal).unwrap();
        assert_eq!(features_a, features_b);
    }
}
