//! Aura Downloads
//!
//! Status-tracked ledger of in-flight and completed transfers. The actual
//! transport lives outside the core; this crate owns the records and their
//! state machine.

mod ledger;
mod record;

pub use ledger::DownloadLedger;
pub use record::{format_size, sanitize_file_name, DownloadPatch, DownloadRecord, DownloadStatus};
