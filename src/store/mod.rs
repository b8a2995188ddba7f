pub mod json_store;
#[cfg(feature = "network")]
pub mod remote;
pub mod schema;
pub mod sync;

use thiserror::Error;

use crate::store::schema::ProgressSnapshot;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "network")]
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("invalid progress for book {book_id}: {reason}")]
    InvalidSnapshot { book_id: String, reason: String },
    #[error("no book matches {0:?}")]
    UnknownBook(String),
    #[error("{0:?} matches more than one book")]
    AmbiguousBook(String),
}

/// A place progress snapshots are kept, keyed by book id. Writes are upserts,
/// so repeated or reordered saves of the same snapshot are harmless.
pub trait ProgressStore: Send + Sync {
    fn load_progress(&self, book_id: &str) -> Result<Option<ProgressSnapshot>, StoreError>;
    fn save_progress(&self, snapshot: &ProgressSnapshot) -> Result<(), StoreError>;
}
