//! Flow processor implementations
//!
//! Contains LogFlowProcessor, FileFlowProcessor and MemoryFlowProcessor.

mod file;
mod log;
mod memory;

pub use self::file::{FileFlowProcessor, FlowRow};
pub use self::log::LogFlowProcessor;
pub use self::memory::MemoryFlowProcessor;
