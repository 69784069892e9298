//! Per-operation cancellation tokens.
//!
//! A [`CancelSlot`] hands out at most one live [`CancelToken`] at a time:
//! issuing a new token (or calling `cancel`) invalidates the previous one.
//! Async completions check their token before touching shared state, so a
//! superseded operation is abandoned explicitly.

#[cfg(test)]
#[path = "cancel_test.rs"]
mod cancel_test;

use std::cell::Cell;
use std::rc::Rc;

/// Issues tokens for one logical operation (search, load cycle, form session).
#[derive(Clone, Debug, Default)]
pub struct CancelSlot {
    generation: Rc<Cell<u64>>,
}

/// Handle held by an in-flight operation.
#[derive(Clone, Debug)]
pub struct CancelToken {
    id: u64,
    generation: Rc<Cell<u64>>,
}

impl CancelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate any live token and return a fresh one.
    pub fn issue(&self) -> CancelToken {
        let id = self.generation.get().wrapping_add(1);
        self.generation.set(id);
        CancelToken { id, generation: Rc::clone(&self.generation) }
    }

    /// Invalidate the live token without issuing a new one.
    pub fn cancel(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.generation.get() != self.id
    }
}
