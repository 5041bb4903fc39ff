// Batch analysis - whole-file feature extraction
//
// Hop-advances an extractor over a decoded signal, producing one
// AudioFeatures per window plus a per-field mean summary. File analysis
// can run for the length of an entire track, so the loop checks a
// cooperative cancellation flag between frames and abandons cleanly.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::features::{AudioFeatures, FeatureExtractor, NUM_COEFFICIENTS};
use crate::audio::wav;
use crate::error::AnalysisError;

/// Result of analyzing a whole signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysis {
    /// One record per analysis window, in stream order
    pub frames: Vec<AudioFeatures>,
    /// Per-field mean over all windows; tempo is the final estimate
    pub summary: AudioFeatures,
    pub sample_rate: u32,
    pub duration_secs: f32,
}

/// Analyze a decoded single-channel signal window by window
///
/// Returns `Ok(None)` when the cancellation flag is raised between frames;
/// partial results are discarded on abandonment. An empty signal is an
/// input-shape error.
pub fn analyze_samples(
    extractor: &mut FeatureExtractor,
    samples: &[f32],
    cancel: Option<&AtomicBool>,
) -> Result<Option<FileAnalysis>, AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptyFrame);
    }

    let frame_size = extractor.frame_size();
    let hop_size = extractor.hop_size().min(frame_size).max(1);
    let sample_rate = extractor.sample_rate();

    let mut frames = Vec::with_capacity(samples.len() / hop_size + 1);
    let mut pos = 0;
    while pos < samples.len() {
        if let Some(flag) = cancel {
            if flag.load(Ordering::Relaxed) {
                tracing::info!("[Batch] Analysis abandoned at sample {}", pos);
                return Ok(None);
            }
        }
        let end = (pos + frame_size).min(samples.len());
        frames.push(extractor.extract(&samples[pos..end])?);
        pos += hop_size;
    }

    let summary = summarize(&frames);
    Ok(Some(FileAnalysis {
        summary,
        frames,
        sample_rate,
        duration_secs: samples.len() as f32 / sample_rate as f32,
    }))
}

/// Decode a WAV file and analyze it off the async executor
///
/// Decoding and extraction both run on the blocking pool; the caller may
/// await other work meanwhile. Decode errors propagate unchanged.
pub async fn analyze_file<P: AsRef<Path>>(
    path: P,
    frame_size: usize,
    cancel: Arc<AtomicBool>,
) -> Result<Option<FileAnalysis>, AnalysisError> {
    let path = path.as_ref().to_path_buf();
    let handle = tokio::task::spawn_blocking(move || {
        let signal = wav::load_wav(&path)?;
        let mut extractor = FeatureExtractor::with_params(
            signal.sample_rate,
            frame_size,
            crate::analysis::features::DEFAULT_HOP_SIZE.min(frame_size),
        );
        analyze_samples(&mut extractor, &signal.samples, Some(cancel.as_ref()))
    });
    handle.await.unwrap_or_else(|join_error| {
        Err(AnalysisError::DecodeFailed {
            reason: format!("analysis task failed: {}", join_error),
        })
    })
}

/// Per-field arithmetic mean; tempo is taken from the final window, which
/// already reflects the full candidate history
fn summarize(frames: &[AudioFeatures]) -> AudioFeatures {
    let mut summary = AudioFeatures::default();
    if frames.is_empty() {
        return summary;
    }
    let n = frames.len() as f32;
    for features in frames {
        summary.rms += features.rms / n;
        summary.peak += features.peak / n;
        summary.crest_factor += features.crest_factor / n;
        summary.centroid += features.centroid / n;
        summary.spread += features.spread / n;
        summary.skewness += features.skewness / n;
        summary.kurtosis += features.kurtosis / n;
        summary.rolloff += features.rolloff / n;
        summary.flatness += features.flatness / n;
        summary.flux += features.flux / n;
        summary.spectral_crest += features.spectral_crest / n;
        summary.harmonic_ratio += features.harmonic_ratio / n;
        summary.brightness += features.brightness / n;
        summary.bass_energy += features.bass_energy / n;
        summary.mid_energy += features.mid_energy / n;
        summary.treble_energy += features.treble_energy / n;
        summary.pitch += features.pitch / n;
        summary.pitch_confidence += features.pitch_confidence / n;
        for k in 0..NUM_COEFFICIENTS {
            summary.mfcc[k] += features.mfcc[k] / n;
        }
    }
    summary.tempo = frames[frames.len() - 1].tempo;
    summary
}
