//! Download record and status state machine
//!
//! `pending → downloading → {completed | failed}`, with
//! `downloading ↔ paused`. Progress is monotonically non-decreasing while
//! downloading and reaching 100 auto-completes the record. Failure is
//! terminal; there is no automatic retry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Pending,
    Downloading,
    Paused,
    Completed,
    Failed,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Pending => "pending",
            DownloadStatus::Downloading => "downloading",
            DownloadStatus::Paused => "paused",
            DownloadStatus::Completed => "completed",
            DownloadStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadStatus::Completed | DownloadStatus::Failed)
    }

    /// Check whether a transition is allowed. A transport error may strike
    /// at any non-terminal point, so every non-terminal state may fail.
    pub fn can_transition_to(&self, target: DownloadStatus) -> bool {
        use DownloadStatus::*;
        match (self, target) {
            (Pending, Downloading) => true,
            (Downloading, Paused) => true,
            (Downloading, Completed) => true,
            (Paused, Downloading) => true,
            (Pending | Downloading | Paused, Failed) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }
}

impl std::str::FromStr for DownloadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(DownloadStatus::Pending),
            "downloading" => Ok(DownloadStatus::Downloading),
            "paused" => Ok(DownloadStatus::Paused),
            "completed" => Ok(DownloadStatus::Completed),
            "failed" => Ok(DownloadStatus::Failed),
            _ => Err(format!("Unknown download status: {s}")),
        }
    }
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub id: String,
    pub name: String,
    pub url: String,
    pub local_path: Option<String>,
    /// Total size in bytes, if known
    pub size: u64,
    /// Media type reported by the transport
    pub mime_type: String,
    /// 0..=100
    pub progress: u8,
    pub status: DownloadStatus,
    pub date_started: DateTime<Utc>,
    pub date_completed: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Optional-field patch applied by the transport as a transfer advances.
/// Status and progress go through the same guards as the direct methods.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadPatch {
    pub name: Option<String>,
    pub local_path: Option<String>,
    pub progress: Option<u8>,
    pub status: Option<DownloadStatus>,
    pub error: Option<String>,
}

impl DownloadRecord {
    pub fn new(name: String, url: String, size: u64, mime_type: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: sanitize_file_name(&name),
            url,
            local_path: None,
            size,
            mime_type,
            progress: 0,
            status: DownloadStatus::Pending,
            date_started: Utc::now(),
            date_completed: None,
            error: None,
        }
    }

    /// Apply a guarded status transition. Invalid transitions are no-ops.
    pub fn transition_to(&mut self, target: DownloadStatus) -> bool {
        if !self.status.can_transition_to(target) {
            tracing::debug!(
                download_id = %self.id,
                from = %self.status,
                to = %target,
                "Ignored invalid download transition"
            );
            return false;
        }

        self.status = target;
        if target == DownloadStatus::Completed {
            self.progress = 100;
            self.date_completed = Some(Utc::now());
        }
        true
    }

    /// Advance progress while downloading. Progress never moves backwards;
    /// reaching 100 auto-completes the record.
    pub fn set_progress(&mut self, progress: u8) {
        if self.status != DownloadStatus::Downloading {
            return;
        }

        let progress = progress.min(100);
        if progress <= self.progress {
            return;
        }

        self.progress = progress;
        if self.progress == 100 {
            self.transition_to(DownloadStatus::Completed);
        }
    }

    /// Apply a patch field by field. Guarded fields that reject their new
    /// value are skipped without affecting the rest of the patch.
    pub fn apply(&mut self, patch: DownloadPatch) {
        if let Some(name) = patch.name {
            self.name = sanitize_file_name(&name);
        }
        if let Some(path) = patch.local_path {
            self.local_path = Some(path);
        }
        if let Some(status) = patch.status {
            self.transition_to(status);
        }
        if let Some(progress) = patch.progress {
            self.set_progress(progress);
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
    }

    /// Mark the record failed with a transport error message. Terminal
    /// states are left untouched.
    pub fn fail(&mut self, message: &str) -> bool {
        if !self.transition_to(DownloadStatus::Failed) {
            return false;
        }
        self.error = Some(message.to_string());
        true
    }
}

/// Strip filesystem-hostile characters and cap the name length.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    cleaned.chars().take(255).collect()
}

/// Human-readable byte count for UI display.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = (bytes as f64).log(1024.0).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);

    // Two decimal places with trailing zeros dropped: 1.50 -> 1.5, 1.00 -> 1
    let rounded = format!("{value:.2}");
    let rounded = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{rounded} {}", UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> DownloadRecord {
        DownloadRecord::new(
            "file.zip".to_string(),
            "https://example.com/file.zip".to_string(),
            1024,
            "application/zip".to_string(),
        )
    }

    #[test]
    fn test_happy_path() {
        let mut download = record();
        assert_eq!(download.status, DownloadStatus::Pending);

        assert!(download.transition_to(DownloadStatus::Downloading));
        download.set_progress(40);
        download.set_progress(100);

        assert_eq!(download.status, DownloadStatus::Completed);
        assert!(download.date_completed.is_some());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut download = record();
        download.transition_to(DownloadStatus::Downloading);

        download.set_progress(60);
        download.set_progress(30);
        assert_eq!(download.progress, 60);

        // Progress while paused is ignored
        download.transition_to(DownloadStatus::Paused);
        download.set_progress(90);
        assert_eq!(download.progress, 60);
    }

    #[test]
    fn test_pause_resume() {
        let mut download = record();
        download.transition_to(DownloadStatus::Downloading);

        assert!(download.transition_to(DownloadStatus::Paused));
        assert!(download.transition_to(DownloadStatus::Downloading));
        assert_eq!(download.status, DownloadStatus::Downloading);
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut download = record();
        download.transition_to(DownloadStatus::Downloading);

        assert!(download.fail("connection reset"));
        assert_eq!(download.status, DownloadStatus::Failed);
        assert_eq!(download.error.as_deref(), Some("connection reset"));

        // No retry: failed records stay failed
        assert!(!download.transition_to(DownloadStatus::Downloading));
        assert!(!download.transition_to(DownloadStatus::Completed));
    }

    #[test]
    fn test_invalid_transitions_are_noops() {
        let mut download = record();

        assert!(!download.transition_to(DownloadStatus::Completed));
        assert!(!download.transition_to(DownloadStatus::Paused));
        assert_eq!(download.status, DownloadStatus::Pending);
    }

    #[test]
    fn test_patch_skips_guarded_rejections() {
        let mut download = record();
        download.transition_to(DownloadStatus::Downloading);
        download.set_progress(70);

        download.apply(DownloadPatch {
            local_path: Some("/tmp/file.zip".to_string()),
            // Both rejected by the guards: regression and invalid jump
            progress: Some(30),
            status: Some(DownloadStatus::Pending),
            ..Default::default()
        });

        assert_eq!(download.local_path.as_deref(), Some("/tmp/file.zip"));
        assert_eq!(download.progress, 70);
        assert_eq!(download.status, DownloadStatus::Downloading);
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            DownloadStatus::Pending,
            DownloadStatus::Downloading,
            DownloadStatus::Paused,
            DownloadStatus::Completed,
            DownloadStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<DownloadStatus>().unwrap(), status);
        }
        assert!("gone".parse::<DownloadStatus>().is_err());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my file?.zip"), "my_file_.zip");
        assert_eq!(sanitize_file_name("a/b\\c:d"), "a_b_c_d");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(512), "512 Bytes");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1546), "1.51 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5 MB");
    }
}
