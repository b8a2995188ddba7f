use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::stats::SessionStats;
use crate::store::StoreError;

const SCHEMA_VERSION: u32 = 1;

/// Persisted progress for one book. Field names match the remote wire format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub book_id: String,
    pub title: String,
    pub total_chars: usize,
    pub position_index: usize,
    pub updated_at: DateTime<Utc>,
    pub stats: SessionStats,
}

impl ProgressSnapshot {
    /// Reject records that could not have come from a real session.
    pub fn validate(&self) -> Result<(), StoreError> {
        let reason = if self.title.trim().is_empty() {
            Some("title must not be empty".to_string())
        } else if self.total_chars == 0 {
            Some("totalChars must be positive".to_string())
        } else if self.position_index > self.total_chars {
            Some(format!(
                "positionIndex {} exceeds totalChars {}",
                self.position_index, self.total_chars
            ))
        } else if self.stats.accuracy > 100 {
            Some(format!("accuracy {} out of range", self.stats.accuracy))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(StoreError::InvalidSnapshot {
                book_id: self.book_id.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Whether the snapshot can resume a buffer of `text_len` chars.
    pub fn fits(&self, text_len: usize) -> bool {
        self.validate().is_ok() && self.position_index <= text_len
    }

    pub fn completion_percent(&self) -> f64 {
        if self.total_chars == 0 {
            return 0.0;
        }
        (self.position_index as f64 / self.total_chars as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// Pick the snapshot to resume from: the later `updated_at` wins, a tie goes
/// to the greater `position_index`, and a full tie keeps the local one.
pub fn reconcile(
    local: Option<ProgressSnapshot>,
    remote: Option<ProgressSnapshot>,
) -> Option<ProgressSnapshot> {
    match (local, remote) {
        (Some(local), Some(remote)) => {
            let remote_newer = remote.updated_at > local.updated_at
                || (remote.updated_at == local.updated_at
                    && remote.position_index > local.position_index);
            Some(if remote_newer { remote } else { local })
        }
        (local, remote) => local.or(remote),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInfo {
    pub book_id: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    pub total_chars: usize,
    pub imported_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressData {
    pub schema_version: u32,
    pub entries: Vec<ProgressSnapshot>,
}

impl Default for ProgressData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entries: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookListData {
    pub schema_version: u32,
    pub books: Vec<BookInfo>,
}

impl Default for BookListData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            books: Vec::new(),
        }
    }
}
