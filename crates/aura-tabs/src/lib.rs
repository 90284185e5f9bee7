//! Aura Tab Management
//!
//! Owns the active tab list, the current-tab pointer, and a capped ring of
//! recently-closed tabs with restore semantics. The active set and the
//! closed ring never share a tab id, and `current` always names a member
//! of the active set (or nothing).

mod manager;
mod tab;

pub use manager::{TabManager, TabsSnapshot, CLOSED_TAB_LIMIT};
pub use tab::{ClosedTab, Tab};
