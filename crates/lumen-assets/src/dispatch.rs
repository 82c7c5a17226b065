//! Hand-off of values from background threads to the owning thread.

use crossbeam_channel::{Receiver, Sender};

/// A multi-producer queue drained by one owner.
///
/// Producers on any thread [`post`](DispatchSender::post) values; the owner
/// calls [`drain_all`](Dispatcher::drain_all) at a point of its choosing, for
/// example once per frame.
pub struct Dispatcher<T> {
    sender: Sender<T>,
    receiver: Receiver<T>,
}

impl<T> Dispatcher<T> {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// A handle producers can move to other threads.
    pub fn sender(&self) -> DispatchSender<T> {
        DispatchSender {
            sender: self.sender.clone(),
        }
    }

    /// Queue a value from the owner thread.
    pub fn post(&self, value: T) {
        // Cannot fail: `self` keeps the receiver alive.
        let _ = self.sender.send(value);
    }

    /// Take the values queued at the moment of the call, oldest first.
    ///
    /// Values posted while the caller processes the batch wait for the next
    /// drain. Never blocks.
    pub fn drain_all(&self) -> Vec<T> {
        let pending = self.receiver.len();
        let mut batch = Vec::with_capacity(pending);
        for _ in 0..pending {
            match self.receiver.try_recv() {
                Ok(value) => batch.push(value),
                Err(_) => break,
            }
        }
        batch
    }

    /// Number of values waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer side of a [`Dispatcher`]. Cheap to clone, `Send` when `T` is.
pub struct DispatchSender<T> {
    sender: Sender<T>,
}

impl<T> DispatchSender<T> {
    /// Queue a value. Returns `false` if the dispatcher was dropped.
    pub fn post(&self, value: T) -> bool {
        self.sender.try_send(value).is_ok()
    }
}

impl<T> Clone for DispatchSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
