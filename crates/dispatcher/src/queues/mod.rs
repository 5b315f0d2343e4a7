//! Retry queue implementations
//!
//! Contains FileQueue and MemoryQueue.

mod file;
mod memory;

pub use self::file::FileQueue;
pub use self::memory::MemoryQueue;
