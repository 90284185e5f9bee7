//! Download Ledger
//!
//! Ordered record of transfers, newest first. All status changes flow
//! through the record's guarded transitions; lookups that miss are no-ops.

use crate::record::{DownloadPatch, DownloadRecord, DownloadStatus};

#[derive(Debug, Default)]
pub struct DownloadLedger {
    /// Newest first
    records: Vec<DownloadRecord>,
}

impl DownloadLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<DownloadRecord>) -> Self {
        Self { records }
    }

    /// Create a pending record and return its id.
    pub fn add(&mut self, name: String, url: String, size: u64, mime_type: String) -> String {
        let record = DownloadRecord::new(name, url, size, mime_type);
        let id = record.id.clone();

        tracing::info!(download_id = %id, url = %record.url, "Added download");
        self.records.insert(0, record);
        id
    }

    pub fn start(&mut self, id: &str) -> bool {
        self.with_record(id, |r| r.transition_to(DownloadStatus::Downloading))
    }

    pub fn pause(&mut self, id: &str) -> bool {
        self.with_record(id, |r| r.transition_to(DownloadStatus::Paused))
    }

    pub fn resume(&mut self, id: &str) -> bool {
        self.with_record(id, |r| r.transition_to(DownloadStatus::Downloading))
    }

    /// Advance progress; completion at 100 happens inside the record.
    pub fn set_progress(&mut self, id: &str, progress: u8) {
        self.with_record(id, |r| {
            r.set_progress(progress);
            true
        });
    }

    pub fn fail(&mut self, id: &str, message: &str) -> bool {
        self.with_record(id, |r| r.fail(message))
    }

    /// Apply a transport patch to one record.
    pub fn update(&mut self, id: &str, patch: DownloadPatch) -> bool {
        self.with_record(id, |r| {
            r.apply(patch);
            true
        })
    }

    pub fn set_local_path(&mut self, id: &str, path: String) {
        self.with_record(id, |r| {
            r.local_path = Some(path);
            true
        });
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn get(&self, id: &str) -> Option<&DownloadRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[DownloadRecord] {
        &self.records
    }

    /// Records that are neither completed nor failed.
    pub fn in_flight(&self) -> impl Iterator<Item = &DownloadRecord> {
        self.records.iter().filter(|r| !r.status.is_terminal())
    }

    fn with_record<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut DownloadRecord) -> bool,
    {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => f(record),
            None => {
                tracing::debug!(download_id = %id, "Download not found");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with_one() -> (DownloadLedger, String) {
        let mut ledger = DownloadLedger::new();
        let id = ledger.add(
            "file.pdf".to_string(),
            "https://example.com/file.pdf".to_string(),
            2048,
            "application/pdf".to_string(),
        );
        (ledger, id)
    }

    #[test]
    fn test_add_is_newest_first() {
        let mut ledger = DownloadLedger::new();
        ledger.add("a".into(), "https://a".into(), 1, "text/plain".into());
        let b = ledger.add("b".into(), "https://b".into(), 1, "text/plain".into());

        assert_eq!(ledger.records()[0].id, b);
    }

    #[test]
    fn test_lifecycle_through_ledger() {
        let (mut ledger, id) = ledger_with_one();

        assert!(ledger.start(&id));
        ledger.set_progress(&id, 50);
        assert!(ledger.pause(&id));
        assert!(ledger.resume(&id));
        ledger.set_progress(&id, 100);

        let record = ledger.get(&id).unwrap();
        assert_eq!(record.status, DownloadStatus::Completed);
        assert!(record.date_completed.is_some());
        assert_eq!(ledger.in_flight().count(), 0);
    }

    #[test]
    fn test_fail_stamps_error() {
        let (mut ledger, id) = ledger_with_one();
        ledger.start(&id);

        assert!(ledger.fail(&id, "dns failure"));
        let record = ledger.get(&id).unwrap();
        assert_eq!(record.status, DownloadStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("dns failure"));
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let (mut ledger, _) = ledger_with_one();

        assert!(!ledger.start("missing"));
        assert!(!ledger.remove("missing"));
        ledger.set_progress("missing", 50);
        assert_eq!(ledger.records().len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let (mut ledger, id) = ledger_with_one();
        assert!(ledger.remove(&id));
        assert!(ledger.records().is_empty());

        let (mut ledger, _) = ledger_with_one();
        ledger.clear();
        assert!(ledger.records().is_empty());
    }
}
