//! Sync history domain models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Terminality of one sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncHistoryStatus {
    /// Attempt is in flight; completion has not been recorded yet.
    #[default]
    Started,
    Success,
    Error,
}

impl SyncHistoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncHistoryStatus::Started => "started",
            SyncHistoryStatus::Success => "success",
            SyncHistoryStatus::Error => "error",
        }
    }
}

/// Audit record for one sync attempt, start to terminal status.
///
/// Created in `Started` when the attempt begins and closed exactly once,
/// whatever the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncHistory {
    pub id: String,
    pub connection_id: String,
    pub status: SyncHistoryStatus,
    pub accounts_synced: i32,
    pub positions_synced: i32,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SyncHistory {
    /// Wall-clock duration of the attempt, available once closed.
    pub fn duration(&self) -> Option<Duration> {
        self.completed_at.map(|done| done - self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_requires_completion() {
        let started = Utc::now();
        let mut record = SyncHistory {
            id: "h1".to_string(),
            connection_id: "c1".to_string(),
            status: SyncHistoryStatus::Started,
            accounts_synced: 0,
            positions_synced: 0,
            error_message: None,
            started_at: started,
            completed_at: None,
        };
        assert!(record.duration().is_none());

        record.completed_at = Some(started + Duration::seconds(3));
        assert_eq!(record.duration(), Some(Duration::seconds(3)));
    }
}
