//! Aura Navigation
//!
//! Address-bar input resolution (direct address vs. search query) and the
//! visit history index with memoized full-text search.

mod history;
mod input;

pub use history::{HistoryEntry, HistoryIndex};
pub use input::{title_for_url, InputResolution, InputResolver, SearchEngine};
