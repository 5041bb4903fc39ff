// StreamTap - lock-free frame hand-off with dual SPSC queues
//
// Connects a real-time capture thread to the analysis worker without locks
// or per-frame allocation. Two SPSC (Single Producer Single Consumer) ring
// buffers circulate a fixed set of pre-allocated frame buffers:
//
// - FILLED queue: capture thread pushes filled frames, worker consumes
// - RECYCLE queue: worker returns drained frames, capture thread reuses
//
// Frame flow:
// 1. Capture thread pops an empty frame from the RECYCLE queue
// 2. Capture thread fills it with samples
// 3. Capture thread pushes it to the FILLED queue
// 4. Analysis worker pops it, extracts features
// 5. Analysis worker pushes the frame back to the RECYCLE queue
//
// When the RECYCLE queue is empty the capture thread skips the frame
// instead of blocking; a late analysis worker drops work, never audio.

use rtrb::{Consumer, Producer};

/// Frame buffer circulated through the tap
pub type FrameBuffer = Vec<f32>;

/// Split tap endpoints for producer/consumer separation
///
/// Returned by `StreamTap::split`; the capture side takes
/// `filled_producer` + `recycle_consumer`, the worker side takes
/// `filled_consumer` + `recycle_producer`.
pub struct StreamTapChannels {
    /// Capture side: push filled frames toward the analysis worker
    pub filled_producer: Producer<FrameBuffer>,
    /// Worker side: receive filled frames
    pub filled_consumer: Consumer<FrameBuffer>,
    /// Worker side: return drained frames for reuse
    pub recycle_producer: Producer<FrameBuffer>,
    /// Capture side: fetch empty frames to fill
    pub recycle_consumer: Consumer<FrameBuffer>,
}

/// Lock-free stream tap factory
///
/// All heap allocation happens in `split`; afterwards both threads only
/// move pre-allocated buffers between wait-free queues.
pub struct StreamTap;

impl StreamTap {
    /// Create tap channels with `frame_count` pre-allocated frames of
    /// `frame_len` samples each
    ///
    /// # Panics
    /// Panics if frame_count is 0 or frame_len is 0
    pub fn split(frame_count: usize, frame_len: usize) -> StreamTapChannels {
        assert!(frame_count > 0, "frame_count must be greater than 0");
        assert!(frame_len > 0, "frame_len must be greater than 0");

        let (mut recycle_producer, recycle_consumer) = rtrb::RingBuffer::new(frame_count);
        let (filled_producer, filled_consumer) = rtrb::RingBuffer::new(frame_count);

        // Seed the recycle queue with every frame; the only allocations in
        // the tap's lifetime happen on these lines
        for _ in 0..frame_count {
            let frame = Vec::with_capacity(frame_len);
            recycle_producer
                .push(frame)
                .expect("recycle queue sized to frame_count");
        }

        StreamTapChannels {
            filled_producer,
            filled_consumer,
            recycle_producer,
            recycle_consumer,
        }
    }
}
