//! Value types shared across the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A saved item. Immutable once created; the id is assigned exactly once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Identity assigned at save time. `0` means the allocator handed out
    /// no identity (see [`crate::coordination::IdentityAllocator`]).
    pub id: u64,
    /// The item content as submitted by the caller.
    pub content: String,
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item {{ id: {}, content: \"{}\" }}", self.id, self.content)
    }
}

/// Outcome of a save request, returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveOutcome {
    pub success: bool,
    pub message: String,
}

impl SaveOutcome {
    /// Outcome for a newly saved item.
    pub fn saved(item: &Item) -> Self {
        Self {
            success: true,
            message: format!(
                "Item with content {} saved with id {}",
                item.content, item.id
            ),
        }
    }

    /// Outcome for content that is already saved or currently being saved.
    pub fn duplicate(content: &str) -> Self {
        Self {
            success: false,
            message: format!("Duplicate item received with content {content}."),
        }
    }
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
