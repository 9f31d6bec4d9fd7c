//! Type-safe counter for generating unique graph IDs.
//!
//! Sinks hand out entity and file IDs through this counter so that IDs
//! start at 1, grow monotonically within a run, and never wrap around.

use std::num::NonZeroU32;

use super::{EntityId, FileId};

/// Sequential ID source for one conversion run.
///
/// This type ensures that:
/// - IDs start at 1 (never 0)
/// - IDs are generated sequentially
/// - Exhaustion is reported instead of wrapping
#[derive(Debug, Clone)]
pub struct EntityCounter {
    next: Option<NonZeroU32>,
}

impl EntityCounter {
    /// Creates a new counter starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: NonZeroU32::new(1),
        }
    }

    /// Returns the next raw value, or `None` once `u32::MAX` has been issued.
    pub fn next_value(&mut self) -> Option<NonZeroU32> {
        let current = self.next?;
        self.next = current.get().checked_add(1).and_then(NonZeroU32::new);
        Some(current)
    }

    pub fn next_id(&mut self) -> Option<EntityId> {
        self.next_value().map(|v| EntityId(v.get()))
    }

    pub fn next_file_id(&mut self) -> Option<FileId> {
        self.next_value().map(|v| FileId(v.get()))
    }

    /// Returns how many IDs have been issued so far.
    #[must_use]
    pub fn current_count(&self) -> u32 {
        match self.next {
            Some(next) => next.get() - 1,
            None => u32::MAX,
        }
    }

    /// Creates a counter starting from a specific value.
    ///
    /// A start value of 0 yields an already exhausted counter.
    pub fn from_value(start_from: u32) -> Self {
        Self {
            next: NonZeroU32::new(start_from),
        }
    }
}

impl Default for EntityCounter {
    fn default() -> Self {
        Self::new()
    }
}
