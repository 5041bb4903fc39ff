// Analysis module - per-frame extraction pipeline and streaming worker
//
// Orchestrates the DSP pipeline for two modes:
// - Batch: whole-file analysis (batch module)
// - Streaming: a worker thread consumes fixed-size frames from the
//   lock-free tap, extracts features, and broadcasts them
//
// Architecture (streaming):
// - Capture thread: fills tap frames, never blocks, never allocates
// - StreamWorker: pops filled frames, runs FeatureExtractor, recycles the
//   frame, pushes the record into a bounded history, broadcasts it
// - Subscribers: receive AudioFeatures via tokio broadcast

pub mod batch;
pub mod features;
pub mod pitch;
pub mod tempo;

pub use batch::{analyze_file, analyze_samples, FileAnalysis};
pub use features::{AudioFeatures, FeatureExtractor, SpectralCalculator};
pub use pitch::{PitchEstimate, PitchEstimator};
pub use tempo::TempoEstimator;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rtrb::PopError;

use crate::audio::ring_history::RingHistory;

/// Capacity of the streaming feature history
const STREAM_HISTORY_LEN: usize = 64;

/// Fraction of the frame's real-time duration treated as the soft budget
const BUDGET_FRACTION: f32 = 0.8;

struct StreamWorker {
    filled_consumer: rtrb::Consumer<Vec<f32>>,
    recycle_producer: rtrb::Producer<Vec<f32>>,
    extractor: FeatureExtractor,
    history: Arc<Mutex<RingHistory<AudioFeatures>>>,
    features_tx: tokio::sync::broadcast::Sender<AudioFeatures>,
    shutdown: Arc<AtomicBool>,
    budget: Duration,
}

impl StreamWorker {
    fn run(mut self) {
        tracing::info!("[StreamWorker] Starting streaming analysis loop");

        loop {
            let frame = match self.filled_consumer.pop() {
                Ok(frame) => frame,
                Err(PopError::Empty) => {
                    // Check the shutdown flag only when the queue is
                    // drained so queued frames are never lost
                    if self.shutdown.load(Ordering::SeqCst) {
                        tracing::info!("[StreamWorker] Shutdown flag set, exiting");
                        break;
                    }
                    thread::sleep(Duration::from_millis(1));
                    continue;
                }
            };

            let started = Instant::now();
            let extracted = self.extractor.extract(&frame);

            // Return the frame before doing anything else so the capture
            // side regains a buffer as early as possible
            let mut frame = frame;
            frame.clear();
            if self.recycle_producer.push(frame).is_err() {
                tracing::warn!("[StreamWorker] Recycle queue full, dropping frame buffer");
            }

            let features = match extracted {
                Ok(features) => features,
                Err(err) => {
                    crate::error::log_analysis_error(&err, "stream worker");
                    continue;
                }
            };

            let elapsed = started.elapsed();
            if elapsed > self.budget {
                tracing::warn!(
                    "[StreamWorker] Frame took {:?}, over {:?} soft budget",
                    elapsed,
                    self.budget
                );
            }

            if let Ok(mut history) = self.history.lock() {
                history.push(features);
            }

            // Send failures just mean nobody is subscribed right now
            let _ = self.features_tx.send(features);
        }
    }
}

/// Handle over a running streaming analysis session
///
/// Owns the worker thread and the shutdown flag; dropping the handle stops
/// the worker. One analyzer corresponds to one logical audio stream —
/// its temporal estimators must never see interleaved streams.
pub struct StreamAnalyzer {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    features_tx: tokio::sync::broadcast::Sender<AudioFeatures>,
    history: Arc<Mutex<RingHistory<AudioFeatures>>>,
}

impl StreamAnalyzer {
    /// Spawn the analysis worker over the worker-side tap endpoints
    ///
    /// The capture side keeps `filled_producer` and `recycle_consumer`
    /// from the same `StreamTapChannels`.
    pub fn spawn(
        filled_consumer: rtrb::Consumer<Vec<f32>>,
        recycle_producer: rtrb::Producer<Vec<f32>>,
        sample_rate: u32,
        frame_size: usize,
        hop_size: usize,
    ) -> Self {
        let extractor = FeatureExtractor::with_params(sample_rate, frame_size, hop_size);
        let budget = Duration::from_secs_f32(
            BUDGET_FRACTION * frame_size as f32 / sample_rate as f32,
        );
        let (features_tx, _) = tokio::sync::broadcast::channel(STREAM_HISTORY_LEN);
        let history = Arc::new(Mutex::new(RingHistory::new(STREAM_HISTORY_LEN)));
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker = StreamWorker {
            filled_consumer,
            recycle_producer,
            extractor,
            history: Arc::clone(&history),
            features_tx: features_tx.clone(),
            shutdown: Arc::clone(&shutdown),
            budget,
        };
        let handle = thread::spawn(move || worker.run());

        Self {
            shutdown,
            handle: Some(handle),
            features_tx,
            history,
        }
    }

    /// Subscribe to per-frame feature records
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<AudioFeatures> {
        self.features_tx.subscribe()
    }

    /// Most recent feature record, if any frame has been analyzed
    pub fn latest(&self) -> Option<AudioFeatures> {
        self.history.lock().ok().and_then(|h| h.latest().copied())
    }

    /// Copy of the recent feature history, oldest first
    pub fn history_snapshot(&self) -> Vec<AudioFeatures> {
        self.history
            .lock()
            .map(|h| h.snapshot())
            .unwrap_or_default()
    }

    /// Stop the worker after it drains queued frames
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StreamAnalyzer {
    fn drop(&mut self) {
        self.stop();
    }
}
