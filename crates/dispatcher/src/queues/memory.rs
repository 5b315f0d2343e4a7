//! MemoryQueue - in-process retry queue

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use contracts::{ContractError, QueueMessage, RetryQueue};
use tracing::debug;

/// Queue that keeps published messages in memory
#[derive(Debug)]
pub struct MemoryQueue {
    name: String,
    messages: Mutex<Vec<QueueMessage>>,
    failing: AtomicBool,
}

impl MemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent publish fail (or succeed again)
    pub fn fail_publishes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Published messages, in publish order
    pub fn messages(&self) -> Vec<QueueMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return every published message
    pub fn drain(&self) -> Vec<QueueMessage> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RetryQueue for MemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, message: &QueueMessage) -> Result<(), ContractError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ContractError::queue_publish(&self.name, "queue unavailable"));
        }
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        debug!(queue = %self.name, retry = message.body.retry, "Message published");
        Ok(())
    }
}
