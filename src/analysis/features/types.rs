// Types module - data structures for audio features
//
// Defines the flat feature record produced once per analysis window.

use serde::{Deserialize, Serialize};

use super::mfcc::NUM_COEFFICIENTS;

/// Descriptors extracted from one analysis window
///
/// Constructed by the extraction facade, immutable afterwards. Normalized
/// fields (band energies, flatness, harmonic ratio, brightness, pitch
/// confidence) lie in [0, 1]; centroid, spread, rolloff and pitch are in
/// Hz and tempo in BPM. Moment statistics and crest ratios are unbounded
/// by definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Root-mean-square energy of the frame
    pub rms: f32,
    /// Peak absolute amplitude
    pub peak: f32,
    /// Peak over RMS of the waveform
    pub crest_factor: f32,

    /// Spectral centroid in Hz (weighted mean frequency)
    pub centroid: f32,
    /// Energy-weighted standard deviation around the centroid, in Hz
    pub spread: f32,
    /// Third standardized moment of the spectrum
    pub skewness: f32,
    /// Fourth standardized moment of the spectrum
    pub kurtosis: f32,
    /// Frequency below which 85% of spectral energy is contained
    pub rolloff: f32,
    /// Geometric over arithmetic magnitude mean (0 tonal, 1 noise-like)
    pub flatness: f32,
    /// Half-wave-rectified magnitude increase since the previous frame
    pub flux: f32,
    /// Peak magnitude over mean magnitude of the spectrum
    pub spectral_crest: f32,
    /// Energy near harmonics of the estimated fundamental, in [0, 1]
    pub harmonic_ratio: f32,
    /// Share of spectral energy above 1.5 kHz
    pub brightness: f32,

    /// Normalized band energy below 250 Hz
    pub bass_energy: f32,
    /// Normalized band energy between 250 Hz and 4 kHz
    pub mid_energy: f32,
    /// Normalized band energy above 4 kHz
    pub treble_energy: f32,

    /// Estimated fundamental in Hz, 0 when unvoiced
    pub pitch: f32,
    /// Pitch estimate confidence in [0, 1]
    pub pitch_confidence: f32,
    /// Estimated tempo in BPM
    pub tempo: f32,

    /// Cepstral coefficient vector
    // NOTE: length written as the literal 13 (== NUM_COEFFICIENTS) to avoid a
    // rustc ICE on struct-update syntax over a field whose array length is an
    // unevaluated named const. Identical type; keep in sync with NUM_COEFFICIENTS.
    pub mfcc: [f32; 13],
}

impl Default for AudioFeatures {
    /// Silence: zeros everywhere, tempo at the 120 BPM fallback
    fn default() -> Self {
        Self {
            rms: 0.0,
            peak: 0.0,
            crest_factor: 0.0,
            centroid: 0.0,
            spread: 0.0,
            skewness: 0.0,
            kurtosis: 0.0,
            rolloff: 0.0,
            flatness: 0.0,
            flux: 0.0,
            spectral_crest: 0.0,
            harmonic_ratio: 0.0,
            brightness: 0.0,
            bass_energy: 0.0,
            mid_energy: 0.0,
            treble_energy: 0.0,
            pitch: 0.0,
            pitch_confidence: 0.0,
            tempo: 120.0,
            mfcc: [0.0; NUM_COEFFICIENTS],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_silence_with_tempo_fallback() {
        let features = AudioFeatures::default();
        assert_eq!(features.rms, 0.0);
        assert_eq!(features.pitch, 0.0);
        assert_eq!(features.tempo, 120.0);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut features = AudioFeatures::default();
        features.centroid = 440.0;
        features.mfcc[0] = 1.5;
        let json = serde_json::to_string(&features).unwrap();
        let parsed: AudioFeatures = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, features);
    }
}
