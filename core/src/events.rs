//! Per-frame event queue
//!
//! Engine events (collisions, triggers, ...) are queued while the engine
//! steps and drained once, in insertion order, before scripts run. The queue
//! is empty again at the end of every frame, so it never needs to be part of
//! a rollback snapshot.

use std::collections::VecDeque;

/// FIFO event queue drained once per frame
#[derive(Debug, Clone)]
pub struct EventQueue<E> {
    events: VecDeque<E>,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    pub fn push(&mut self, event: E) {
        self.events.push_back(event);
    }

    /// Take every queued event in insertion order
    pub fn drain(&mut self) -> Vec<E> {
        self.events.drain(..).collect()
    }

    /// Discard queued events (after a rollback, events belong to the
    /// abandoned timeline)
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}
