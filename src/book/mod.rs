pub mod clean;

use std::fs;
use std::path::Path;

use chrono::Utc;
use rust_embed::Embed;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::store::schema::BookInfo;

#[derive(Embed)]
#[folder = "assets/books/"]
struct SampleAssets;

const SAMPLE_FILE: &str = "sample.txt";
/// Hex chars kept from the content hash.
const BOOK_ID_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("{0} has no text left after cleaning")]
    Empty(String),
    #[error("bundled sample book is missing")]
    MissingSample,
}

/// An imported book. The text is fixed once imported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: Option<String>,
    pub text: String,
}

impl Book {
    /// Clean raw file contents into a book. Title precedence: explicit title,
    /// then the title found in the text, then `fallback_title`.
    pub fn from_raw(
        raw: &str,
        title: Option<&str>,
        fallback_title: &str,
    ) -> Result<Self, BookError> {
        let cleaned = clean::clean_text(raw);
        if cleaned.text.is_empty() {
            return Err(BookError::Empty(fallback_title.to_string()));
        }
        let title = title
            .map(str::to_string)
            .or(cleaned.title)
            .unwrap_or_else(|| fallback_title.to_string());

        Ok(Self {
            id: book_id(&cleaned.text, Some(&title)),
            title,
            author: cleaned.author,
            text: cleaned.text,
        })
    }

    pub fn import(path: &Path, title: Option<&str>) -> Result<Self, BookError> {
        let raw = fs::read_to_string(path).map_err(|source| BookError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Book".to_string());
        Self::from_raw(&raw, title, &fallback)
    }

    /// The bundled practice book.
    pub fn sample() -> Result<Self, BookError> {
        let file = SampleAssets::get(SAMPLE_FILE).ok_or(BookError::MissingSample)?;
        let raw = String::from_utf8_lossy(file.data.as_ref());
        Self::from_raw(&raw, None, "Sample")
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn info(&self) -> BookInfo {
        BookInfo {
            book_id: self.id.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            total_chars: self.char_count(),
            imported_at: Utc::now(),
        }
    }
}

/// Content-derived book id: the first 32 hex chars of SHA-256 over
/// `"{title}:{text}"`, or over the text alone when untitled.
pub fn book_id(text: &str, title: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    if let Some(title) = title {
        hasher.update(title.as_bytes());
        hasher.update(b":");
    }
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();

    let mut id: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    id.truncate(BOOK_ID_LEN);
    id
}
