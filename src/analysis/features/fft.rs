// FFT module - windowed transform producing magnitude spectra
//
// Applies a Hann window before the forward FFT to reduce spectral leakage.
// The window and the FFT plan are computed once per transform size and
// reused for every frame; the processor is stateful precisely so that this
// amortization (and the scratch buffer) survive across calls.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// FFT processor that computes magnitude spectra from sample frames
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    frame_size: usize,
    /// Hann window (pre-computed)
    window: Vec<f32>,
    /// Reused complex scratch buffer; the hot path never allocates
    scratch: Vec<Complex<f32>>,
}

impl FftProcessor {
    /// Create a new FFT processor for frames of `frame_size` samples
    ///
    /// # Panics
    /// Panics if frame_size is not a power of two (required by the
    /// transform) or is smaller than 2
    pub fn new(frame_size: usize) -> Self {
        assert!(
            frame_size >= 2 && frame_size.is_power_of_two(),
            "frame_size must be a power of two >= 2"
        );

        // Pre-compute Hann window to reduce spectral leakage
        let window = (0..frame_size)
            .map(|i| {
                0.5 * (1.0
                    - ((2.0 * std::f32::consts::PI * i as f32) / (frame_size as f32 - 1.0)).cos())
            })
            .collect();

        let fft = FftPlanner::new().plan_fft_forward(frame_size);

        Self {
            fft,
            frame_size,
            window,
            scratch: vec![Complex::new(0.0, 0.0); frame_size],
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Number of bins in the produced spectrum (frame_size / 2)
    pub fn spectrum_len(&self) -> usize {
        self.frame_size / 2
    }

    /// Compute the magnitude spectrum of a frame
    ///
    /// Input shorter than the frame size is zero-padded; longer input is
    /// truncated. Neither is an error: callers advancing by hop size may
    /// legitimately present a short tail window.
    ///
    /// Magnitudes are scaled by 2/L so amplitudes stay comparable across
    /// transform sizes; only the `frame_size / 2` positive-frequency bins
    /// are returned.
    pub fn magnitude_spectrum(&mut self, frame: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0; self.spectrum_len()];
        self.magnitude_spectrum_into(frame, &mut out);
        out
    }

    /// As `magnitude_spectrum`, writing into a caller-owned buffer
    ///
    /// `out` must hold exactly `spectrum_len()` values.
    pub fn magnitude_spectrum_into(&mut self, frame: &[f32], out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.spectrum_len());

        let used = frame.len().min(self.frame_size);
        for i in 0..used {
            self.scratch[i] = Complex::new(frame[i] * self.window[i], 0.0);
        }
        for slot in self.scratch[used..].iter_mut() {
            *slot = Complex::new(0.0, 0.0);
        }

        self.fft.process(&mut self.scratch);

        let scale = 2.0 / self.frame_size as f32;
        for (bin, slot) in out.iter_mut().enumerate() {
            *slot = self.scratch[bin].norm() * scale;
        }
    }
}
