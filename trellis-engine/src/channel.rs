//! Inbound fact queue for producers running on other threads.

use crossbeam_channel::{unbounded, Receiver, Sender};

use trellis_core::Fact;

#[derive(Debug, Clone)]
pub(crate) struct FactChannel {
    sender: Sender<Fact>,
    receiver: Receiver<Fact>,
}

impl FactChannel {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn sender(&self) -> Sender<Fact> {
        self.sender.clone()
    }

    /// Everything queued so far, without blocking.
    pub fn drain(&self) -> Vec<Fact> {
        self.receiver.try_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for FactChannel {
    fn default() -> Self {
        Self::new()
    }
}
