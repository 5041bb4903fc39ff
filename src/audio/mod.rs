// Audio module - buffer management and decoding adapters

pub mod buffer_pool;
pub mod ring_history;
pub mod tap;
pub mod wav;

// Re-export commonly used types for convenience
pub use buffer_pool::{BufferPool, ManagedBuffer, DEFAULT_BUFFER_LEN, DEFAULT_POOL_CAPACITY};
pub use ring_history::RingHistory;
pub use tap::{FrameBuffer, StreamTap, StreamTapChannels};
pub use wav::MonoSignal;
