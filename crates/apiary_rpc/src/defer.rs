//! Deferred-call queue.
//!
//! A UI event handler that talks to the server synchronously can see
//! server callbacks re-enter the very widgets it is still mutating. Calls
//! queued here are appended and flushed on the next turn of the UI event
//! loop instead. Queuing while a drain is already scheduled never posts a
//! second drain.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::call::RemoteCall;

/// Posts tasks to run on a later turn of the host UI event loop.
pub trait EventLoopHandle {
    fn post(&self, task: Box<dyn FnOnce()>);
}

/// FIFO side queue with coalesced drain scheduling.
#[derive(Default)]
pub struct DeferredQueue {
    queue: RefCell<VecDeque<RemoteCall>>,
    drain_scheduled: Cell<bool>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a call. Returns `true` exactly when the caller must schedule
    /// a drain; while one is pending, further offers coalesce into it.
    pub fn offer(&self, call: RemoteCall) -> bool {
        self.queue.borrow_mut().push_back(call);
        !self.drain_scheduled.replace(true)
    }

    /// Take everything queued, in FIFO order, and allow the next offer to
    /// schedule again. Called at the start of a drain so that offers made
    /// *during* the drain get a fresh one.
    pub fn take(&self) -> Vec<RemoteCall> {
        self.drain_scheduled.set(false);
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub fn is_drain_scheduled(&self) -> bool {
        self.drain_scheduled.get()
    }
}
