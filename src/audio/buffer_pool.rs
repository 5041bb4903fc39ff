// BufferPool - mutex-guarded pool of reusable sample buffers
//
// Object pool for the extraction pipeline and file-analysis workers.
// Buffers are lent to exactly one caller at a time and returned, not
// destroyed, so steady-state processing performs no per-frame allocation.
//
// The pool is guarded by a single coarse mutex; buffer turnover is
// low-frequency relative to sample-rate processing, and the lock is only
// held for free-list mutation, never across a transform.
//
// For the real-time capture path, which cannot tolerate a lock at all,
// see `audio::tap` (lock-free SPSC hand-off).

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default number of live buffers the pool will allow
pub const DEFAULT_POOL_CAPACITY: usize = 16;
/// Default per-buffer capacity in f32 samples
pub const DEFAULT_BUFFER_LEN: usize = 2048;

/// A pooled, reusable fixed-capacity sample buffer
///
/// Exclusively held by the pool while idle and by exactly one caller while
/// in use. `samples` never reallocates: capacity is fixed at creation and
/// `release` only resets the length.
#[derive(Debug)]
pub struct ManagedBuffer {
    id: u64,
    samples: Vec<f32>,
    created_at: Instant,
    last_used: Instant,
}

impl ManagedBuffer {
    fn new(id: u64, capacity: usize) -> Self {
        let now = Instant::now();
        Self {
            id,
            samples: Vec::with_capacity(capacity),
            created_at: now,
            last_used: now,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Sample storage; push up to `capacity()` samples
    pub fn samples_mut(&mut self) -> &mut Vec<f32> {
        &mut self.samples
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    /// Approximate heap footprint of the sample storage
    pub fn memory_bytes(&self) -> usize {
        self.samples.capacity() * std::mem::size_of::<f32>()
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Time since the buffer was last obtained from the pool
    pub fn idle_time(&self) -> Duration {
        self.last_used.elapsed()
    }
}

struct PoolInner {
    free: Vec<ManagedBuffer>,
    live: usize,
    next_id: u64,
}

/// Mutex-guarded pool of `ManagedBuffer`s with a hard capacity cap
///
/// `obtain` hands out a free buffer, allocating fresh ones only until the
/// cap is reached; at capacity with everything lent out it returns `None`
/// rather than blocking, and the caller may skip the frame.
pub struct BufferPool {
    inner: Mutex<PoolInner>,
    capacity: usize,
    buffer_len: usize,
}

impl BufferPool {
    /// Create a pool allowing up to `capacity` live buffers of
    /// `buffer_len` samples each
    ///
    /// # Panics
    /// Panics if capacity or buffer_len is 0
    pub fn new(capacity: usize, buffer_len: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        assert!(buffer_len > 0, "buffer_len must be greater than 0");
        Self {
            inner: Mutex::new(PoolInner {
                free: Vec::with_capacity(capacity),
                live: 0,
                next_id: 0,
            }),
            capacity,
            buffer_len,
        }
    }

    /// Borrow a buffer, or `None` when the pool is at capacity with all
    /// buffers in use
    pub fn obtain(&self) -> Option<ManagedBuffer> {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(mut buffer) = inner.free.pop() {
            buffer.last_used = Instant::now();
            return Some(buffer);
        }
        if inner.live < self.capacity {
            inner.live += 1;
            let id = inner.next_id;
            inner.next_id += 1;
            return Some(ManagedBuffer::new(id, self.buffer_len));
        }
        None
    }

    /// Return a buffer to the pool; its length is reset to zero
    ///
    /// Buffers beyond the free-list cap are dropped instead of retained.
    pub fn release(&self, mut buffer: ManagedBuffer) {
        buffer.samples.clear();
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if inner.free.len() < self.capacity {
            inner.free.push(buffer);
        } else {
            inner.live = inner.live.saturating_sub(1);
        }
    }

    /// Number of buffers currently allocated (idle + lent)
    pub fn live_count(&self) -> usize {
        match self.inner.lock() {
            Ok(guard) => guard.live,
            Err(poisoned) => poisoned.into_inner().live,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }
}
