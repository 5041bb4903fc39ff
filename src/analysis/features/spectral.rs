// Spectral module - frequency-domain feature extraction
//
// Pure functions of a magnitude spectrum (plus the previous frame's
// spectrum for flux). One canonical formula set: every feature here has a
// single definition with explicit fallbacks for degenerate input, and the
// same guard constants throughout.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

/// Denominator guard for energy/magnitude normalizations
const EPSILON: f32 = 1e-6;

/// Bins below this magnitude are excluded from the geometric mean
const NEAR_ZERO: f32 = 1e-10;

/// Band split points in Hz: bass below, treble above
const BASS_LIMIT_HZ: f32 = 250.0;
const MID_LIMIT_HZ: f32 = 4000.0;

/// Energy above this frequency counts toward brightness
const BRIGHTNESS_LIMIT_HZ: f32 = 1500.0;

/// Fundamental search range for the harmonic ratio
const FUNDAMENTAL_MIN_HZ: f32 = 80.0;
const FUNDAMENTAL_MAX_HZ: f32 = 1000.0;

/// Normalized band energies; sums to 1 whenever total energy is positive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandEnergies {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

/// Spectral feature computation over magnitude spectra
pub struct SpectralCalculator {
    sample_rate: u32,
    frame_size: usize,
    rolloff_percentile: f32,
}

impl SpectralCalculator {
    /// Create a calculator for spectra produced at the given sample rate
    /// and transform size
    pub fn new(sample_rate: u32, frame_size: usize) -> Self {
        Self::with_rolloff_percentile(sample_rate, frame_size, 0.85)
    }

    pub fn with_rolloff_percentile(
        sample_rate: u32,
        frame_size: usize,
        rolloff_percentile: f32,
    ) -> Self {
        Self {
            sample_rate,
            frame_size,
            rolloff_percentile,
        }
    }

    /// Width of one frequency bin in Hz
    pub fn bin_width(&self) -> f32 {
        self.sample_rate as f32 / self.frame_size as f32
    }

    fn nyquist(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    /// Normalized bass/mid/treble energy split
    ///
    /// Squared-magnitude sums per band, normalized by the total. All-zero
    /// spectra yield (0, 0, 0) rather than fabricated weights.
    pub fn band_energies(&self, spectrum: &[f32]) -> BandEnergies {
        let bin_width = self.bin_width();
        let mut bass = 0.0;
        let mut mid = 0.0;
        let mut treble = 0.0;

        for (i, &mag) in spectrum.iter().enumerate() {
            let freq = i as f32 * bin_width;
            let energy = mag * mag;
            if freq < BASS_LIMIT_HZ {
                bass += energy;
            } else if freq <= MID_LIMIT_HZ {
                mid += energy;
            } else {
                treble += energy;
            }
        }

        let total = bass + mid + treble;
        if total > EPSILON {
            BandEnergies {
                bass: bass / total,
                mid: mid / total,
                treble: treble / total,
            }
        } else {
            BandEnergies {
                bass: 0.0,
                mid: 0.0,
                treble: 0.0,
            }
        }
    }

    /// Spectral centroid: energy-weighted mean frequency in Hz
    pub fn centroid(&self, spectrum: &[f32]) -> f32 {
        let bin_width = self.bin_width();
        let mut weighted = 0.0;
        let mut total = 0.0;
        for (i, &mag) in spectrum.iter().enumerate() {
            weighted += i as f32 * bin_width * mag;
            total += mag;
        }
        weighted / (total + EPSILON)
    }

    /// Spectral spread: energy-weighted standard deviation around the
    /// centroid, in Hz
    pub fn spread(&self, spectrum: &[f32], centroid: f32) -> f32 {
        let bin_width = self.bin_width();
        let mut weighted = 0.0;
        let mut total = 0.0;
        for (i, &mag) in spectrum.iter().enumerate() {
            let dev = i as f32 * bin_width - centroid;
            weighted += dev * dev * mag;
            total += mag;
        }
        (weighted / (total + EPSILON)).sqrt()
    }

    /// Spectral skewness: third standardized moment around the centroid
    ///
    /// Zero spread short-circuits to 0 instead of dividing by zero.
    pub fn skewness(&self, spectrum: &[f32], centroid: f32, spread: f32) -> f32 {
        if spread <= EPSILON {
            return 0.0;
        }
        let m3 = self.central_moment(spectrum, centroid, 3);
        m3 / (spread * spread * spread)
    }

    /// Spectral kurtosis: fourth standardized moment around the centroid
    pub fn kurtosis(&self, spectrum: &[f32], centroid: f32, spread: f32) -> f32 {
        if spread <= EPSILON {
            return 0.0;
        }
        let m4 = self.central_moment(spectrum, centroid, 4);
        m4 / (spread * spread * spread * spread)
    }

    fn central_moment(&self, spectrum: &[f32], centroid: f32, order: u32) -> f32 {
        let bin_width = self.bin_width();
        let mut weighted = 0.0;
        let mut total = 0.0;
        for (i, &mag) in spectrum.iter().enumerate() {
            let dev = i as f32 * bin_width - centroid;
            weighted += dev.powi(order as i32) * mag;
            total += mag;
        }
        weighted / (total + EPSILON)
    }

    /// Spectral rolloff: lowest bin frequency where cumulative energy
    /// reaches the configured percentile of total energy
    ///
    /// Returns the Nyquist frequency when the threshold is never reached.
    pub fn rolloff(&self, spectrum: &[f32]) -> f32 {
        let total_energy: f32 = spectrum.iter().map(|&mag| mag * mag).sum();
        let threshold = self.rolloff_percentile * total_energy;
        let bin_width = self.bin_width();

        let mut cumulative = 0.0;
        for (i, &mag) in spectrum.iter().enumerate() {
            cumulative += mag * mag;
            if cumulative >= threshold {
                return i as f32 * bin_width;
            }
        }
        self.nyquist()
    }

    /// Spectral flatness: geometric mean / arithmetic mean of magnitudes
    ///
    /// Near-zero bins are filtered before the geometric mean to avoid
    /// log(0). An all-silent spectrum yields 0.
    pub fn flatness(&self, spectrum: &[f32]) -> f32 {
        let mut log_sum = 0.0;
        let mut sum = 0.0;
        let mut count = 0usize;
        for &mag in spectrum {
            if mag > NEAR_ZERO {
                log_sum += mag.ln();
                sum += mag;
                count += 1;
            }
        }
        if count == 0 {
            return 0.0;
        }
        let geometric = (log_sum / count as f32).exp();
        let arithmetic = sum / count as f32;
        (geometric / (arithmetic + EPSILON)).min(1.0)
    }

    /// Spectral flux: half-wave-rectified magnitude increase from the
    /// previous spectrum, normalized by bin count
    ///
    /// Zero when no previous spectrum exists (first frame of a stream).
    pub fn flux(&self, spectrum: &[f32], previous: Option<&[f32]>) -> f32 {
        let previous = match previous {
            Some(prev) => prev,
            None => return 0.0,
        };
        let mut sum = 0.0;
        for (i, &mag) in spectrum.iter().enumerate() {
            let prev = previous.get(i).copied().unwrap_or(0.0);
            sum += (mag - prev).max(0.0);
        }
        sum / spectrum.len().max(1) as f32
    }

    /// Spectral crest: peak magnitude over mean magnitude
    pub fn crest(&self, spectrum: &[f32]) -> f32 {
        if spectrum.is_empty() {
            return 0.0;
        }
        let peak = spectrum.iter().fold(0.0_f32, |acc, &m| acc.max(m));
        let mean = spectrum.iter().sum::<f32>() / spectrum.len() as f32;
        peak / (mean + EPSILON)
    }

    /// Harmonic ratio: energy at or near integer multiples of the
    /// estimated fundamental versus energy elsewhere, clamped to [0, 1]
    ///
    /// The fundamental is the strongest bin between 80 and 1000 Hz; a bin
    /// counts as harmonic when it lies within two bin-widths of an exact
    /// multiple.
    pub fn harmonic_ratio(&self, spectrum: &[f32]) -> f32 {
        let bin_width = self.bin_width();
        let fundamental = match self.estimate_fundamental(spectrum) {
            Some(freq) => freq,
            None => return 0.0,
        };

        let tolerance = 2.0 * bin_width;
        let mut harmonic = 0.0;
        let mut total = 0.0;
        for (i, &mag) in spectrum.iter().enumerate() {
            let freq = i as f32 * bin_width;
            let energy = mag * mag;
            total += energy;
            let multiple = (freq / fundamental).round();
            if multiple >= 1.0 && (freq - multiple * fundamental).abs() <= tolerance {
                harmonic += energy;
            }
        }

        let elsewhere = total - harmonic;
        (harmonic / (elsewhere + EPSILON)).min(1.0)
    }

    /// Brightness: share of spectral energy above 1500 Hz, in [0, 1]
    pub fn brightness(&self, spectrum: &[f32]) -> f32 {
        let bin_width = self.bin_width();
        let mut high = 0.0;
        let mut total = 0.0;
        for (i, &mag) in spectrum.iter().enumerate() {
            let energy = mag * mag;
            total += energy;
            if i as f32 * bin_width > BRIGHTNESS_LIMIT_HZ {
                high += energy;
            }
        }
        if total > EPSILON {
            (high / total).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Strongest bin frequency within the fundamental search window
    fn estimate_fundamental(&self, spectrum: &[f32]) -> Option<f32> {
        let bin_width = self.bin_width();
        let lo = (FUNDAMENTAL_MIN_HZ / bin_width).ceil() as usize;
        let hi = ((FUNDAMENTAL_MAX_HZ / bin_width).floor() as usize).min(spectrum.len());
        if lo >= hi {
            return None;
        }

        let mut best_bin = 0;
        let mut best_mag = 0.0;
        for (i, &mag) in spectrum.iter().enumerate().take(hi).skip(lo) {
            if mag > best_mag {
                best_mag = mag;
                best_bin = i;
            }
        }
        if best_mag > NEAR_ZERO {
            Some(best_bin as f32 * bin_width)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;
    const FRAME_SIZE: usize = 2048;

    fn calculator() -> SpectralCalculator {
        SpectralCalculator::new(SAMPLE_RATE, FRAME_SIZE)
    }

    /// Spectrum with a single non-zero bin at the given frequency
    fn single_tone_spectrum(frequency: f32) -> Vec<f32> {
        let calc = calculator();
        let mut spectrum = vec![0.0; FRAME_SIZE / 2];
        let bin = (frequency / calc.bin_width()).round() as usize;
        spectrum[bin] = 1.0;
        spectrum
    }

    #[test]
    fn test_band_energies_sum_to_one() {
        let calc = calculator();
        let spectrum: Vec<f32> = (0..FRAME_SIZE / 2).map(|i| (i % 7) as f32 * 0.1).collect();
        let bands = calc.band_energies(&spectrum);
        let sum = bands.bass + bands.mid + bands.treble;
        assert!((sum - 1.0).abs() < 1e-4, "band sum {} should be 1", sum);
    }

    #[test]
    fn test_band_energies_silence_is_zero() {
        let calc = calculator();
        let bands = calc.band_energies(&vec![0.0; FRAME_SIZE / 2]);
        assert_eq!(bands, BandEnergies { bass: 0.0, mid: 0.0, treble: 0.0 });
    }

    #[test]
    fn test_band_energies_pure_bass() {
        let calc = calculator();
        let bands = calc.band_energies(&single_tone_spectrum(100.0));
        assert!(bands.bass > 0.99);
        assert!(bands.treble < 0.01);
    }

    #[test]
    fn test_centroid_tracks_tone() {
        let calc = calculator();
        let centroid = calc.centroid(&single_tone_spectrum(440.0));
        assert!(
            (centroid - 440.0).abs() <= calc.bin_width(),
            "centroid {} not within one bin of 440",
            centroid
        );
    }

    #[test]
    fn test_centroid_silence_is_zero() {
        let calc = calculator();
        assert_eq!(calc.centroid(&vec![0.0; FRAME_SIZE / 2]), 0.0);
    }

    #[test]
    fn test_spread_zero_for_single_bin() {
        let calc = calculator();
        let spectrum = single_tone_spectrum(440.0);
        let centroid = calc.centroid(&spectrum);
        let spread = calc.spread(&spectrum, centroid);
        assert!(spread < calc.bin_width(), "spread {} too wide", spread);
    }

    #[test]
    fn test_skewness_kurtosis_zero_spread_short_circuit() {
        let calc = calculator();
        let spectrum = vec![0.0; FRAME_SIZE / 2];
        assert_eq!(calc.skewness(&spectrum, 0.0, 0.0), 0.0);
        assert_eq!(calc.kurtosis(&spectrum, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_rolloff_single_tone() {
        let calc = calculator();
        let rolloff = calc.rolloff(&single_tone_spectrum(440.0));
        assert!((rolloff - 440.0).abs() <= calc.bin_width());
    }

    #[test]
    fn test_rolloff_flat_spectrum_near_percentile() {
        let calc = calculator();
        let spectrum = vec![1.0; FRAME_SIZE / 2];
        let rolloff = calc.rolloff(&spectrum);
        let expected = 0.85 * calc.nyquist();
        assert!(
            (rolloff - expected).abs() < 2.0 * calc.bin_width(),
            "rolloff {} not near {}",
            rolloff,
            expected
        );
    }

    #[test]
    fn test_flatness_bounds() {
        let calc = calculator();
        // Flat spectrum: geometric mean equals arithmetic mean
        let flat = calc.flatness(&vec![0.5; FRAME_SIZE / 2]);
        assert!(flat > 0.99 && flat <= 1.0);
        // Single tone: heavily peaked, low flatness after zero filtering
        let tonal = calc.flatness(&single_tone_spectrum(440.0));
        assert!(tonal <= 1.0);
        // Silence
        assert_eq!(calc.flatness(&vec![0.0; FRAME_SIZE / 2]), 0.0);
    }

    #[test]
    fn test_flux_requires_previous_spectrum() {
        let calc = calculator();
        let spectrum = single_tone_spectrum(440.0);
        assert_eq!(calc.flux(&spectrum, None), 0.0);
    }

    #[test]
    fn test_flux_half_wave_rectified() {
        let calc = calculator();
        let quiet = vec![0.0; 4];
        let loud = vec![1.0, 0.0, 2.0, 0.0];
        // Rising energy registers
        let rising = calc.flux(&loud, Some(&quiet));
        assert!((rising - 0.75).abs() < 1e-6);
        // Falling energy does not
        let falling = calc.flux(&quiet, Some(&loud));
        assert_eq!(falling, 0.0);
    }

    #[test]
    fn test_crest_flat_vs_peaked() {
        let calc = calculator();
        let flat = calc.crest(&vec![0.5; 64]);
        assert!((flat - 1.0).abs() < 0.01);
        let peaked = calc.crest(&single_tone_spectrum(440.0));
        assert!(peaked > flat);
    }

    #[test]
    fn test_harmonic_ratio_harmonic_series() {
        let calc = calculator();
        let bin_width = calc.bin_width();
        let mut spectrum = vec![0.0; FRAME_SIZE / 2];
        // Fundamental at ~220 Hz plus three exact harmonics
        let f0_bin = (220.0 / bin_width).round() as usize;
        for harmonic in 1..=4 {
            spectrum[f0_bin * harmonic] = 1.0 / harmonic as f32;
        }
        let ratio = calc.harmonic_ratio(&spectrum);
        assert!(ratio > 0.9, "harmonic series ratio {} should be high", ratio);
    }

    #[test]
    fn test_harmonic_ratio_silence_is_zero() {
        let calc = calculator();
        assert_eq!(calc.harmonic_ratio(&vec![0.0; FRAME_SIZE / 2]), 0.0);
    }

    #[test]
    fn test_brightness_splits_at_limit() {
        let calc = calculator();
        assert!(calc.brightness(&single_tone_spectrum(100.0)) < 0.01);
        assert!(calc.brightness(&single_tone_spectrum(8000.0)) > 0.99);
    }

    #[test]
    fn test_determinism() {
        let calc = calculator();
        let spectrum: Vec<f32> = (0..FRAME_SIZE / 2)
            .map(|i| ((i * 37 % 101) as f32) * 0.013)
            .collect();
        let prev: Vec<f32> = (0..FRAME_SIZE / 2)
            .map(|i| ((i * 53 % 89) as f32) * 0.017)
            .collect();

        let centroid_a = calc.centroid(&spectrum);
        let centroid_b = calc.centroid(&spectrum);
        assert_eq!(centroid_a.to_bits(), centroid_b.to_bits());

        let flux_a = calc.flux(&spectrum, Some(&prev));
        let flux_b = calc.flux(&spectrum, Some(&prev));
        assert_eq!(flux_a.to_bits(), flux_b.to_bits());

        let spread_a = calc.spread(&spectrum, centroid_a);
        assert_eq!(
            calc.skewness(&spectrum, centroid_a, spread_a).to_bits(),
            calc.skewness(&spectrum, centroid_b, spread_a).to_bits()
        );
    }
}
