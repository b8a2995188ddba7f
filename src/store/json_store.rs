use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::store::schema::{BookInfo, BookListData, ProgressData, ProgressSnapshot};
use crate::store::{ProgressStore, StoreError};

const PROGRESS_FILE: &str = "progress.json";
const BOOKS_FILE: &str = "books.json";
const BOOK_TEXT_DIR: &str = "books";

/// Local persistence: progress snapshots, the imported book list, and the
/// text of every imported book.
#[derive(Clone, Debug)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bookdr")
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(base_dir.join(BOOK_TEXT_DIR))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn text_path(&self, book_id: &str) -> PathBuf {
        self.base_dir.join(BOOK_TEXT_DIR).join(format!("{book_id}.txt"))
    }

    /// Missing or unreadable files load as the default value.
    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if !path.exists() {
            return T::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(file = %path.display(), error = %e, "discarding malformed store file");
                T::default()
            }),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "store file unreadable");
                T::default()
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(data)?;
        write_atomic(&self.file_path(name), json.as_bytes())
    }

    pub fn all_progress(&self) -> Vec<ProgressSnapshot> {
        let mut entries = self.load::<ProgressData>(PROGRESS_FILE).entries;
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        entries
    }

    pub fn delete_progress(&self, book_id: &str) -> Result<(), StoreError> {
        let mut data: ProgressData = self.load(PROGRESS_FILE);
        data.entries.retain(|p| p.book_id != book_id);
        self.save(PROGRESS_FILE, &data)
    }

    pub fn all_books(&self) -> Vec<BookInfo> {
        self.load::<BookListData>(BOOKS_FILE).books
    }

    /// Store the text and upsert the book list entry.
    pub fn save_book(&self, info: &BookInfo, text: &str) -> Result<(), StoreError> {
        write_atomic(&self.text_path(&info.book_id), text.as_bytes())?;

        let mut data: BookListData = self.load(BOOKS_FILE);
        match data.books.iter_mut().find(|b| b.book_id == info.book_id) {
            Some(existing) => *existing = info.clone(),
            None => data.books.push(info.clone()),
        }
        self.save(BOOKS_FILE, &data)
    }

    pub fn load_book_text(&self, book_id: &str) -> Result<String, StoreError> {
        let path = self.text_path(book_id);
        if !path.exists() {
            return Err(StoreError::UnknownBook(book_id.to_string()));
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Look a book up by exact id, or by an unambiguous id prefix.
    pub fn find_book(&self, query: &str) -> Result<BookInfo, StoreError> {
        let books = self.all_books();
        if let Some(book) = books.iter().find(|b| b.book_id == query) {
            return Ok(book.clone());
        }
        let mut matches = books.into_iter().filter(|b| b.book_id.starts_with(query));
        match (matches.next(), matches.next()) {
            (Some(book), None) if !query.is_empty() => Ok(book),
            (Some(_), _) => Err(StoreError::AmbiguousBook(query.to_string())),
            (None, _) => Err(StoreError::UnknownBook(query.to_string())),
        }
    }

    /// Remove a book's list entry, text and progress.
    pub fn delete_book(&self, book_id: &str) -> Result<(), StoreError> {
        let mut data: BookListData = self.load(BOOKS_FILE);
        let before = data.books.len();
        data.books.retain(|b| b.book_id != book_id);
        if data.books.len() == before {
            return Err(StoreError::UnknownBook(book_id.to_string()));
        }
        self.save(BOOKS_FILE, &data)?;

        let text_path = self.text_path(book_id);
        if text_path.exists() {
            fs::remove_file(text_path)?;
        }
        self.delete_progress(book_id)
    }
}

impl ProgressStore for JsonStore {
    fn load_progress(&self, book_id: &str) -> Result<Option<ProgressSnapshot>, StoreError> {
        let data: ProgressData = self.load(PROGRESS_FILE);
        Ok(data.entries.into_iter().find(|p| p.book_id == book_id))
    }

    fn save_progress(&self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        snapshot.validate()?;
        let mut data: ProgressData = self.load(PROGRESS_FILE);
        match data.entries.iter_mut().find(|p| p.book_id == snapshot.book_id) {
            Some(existing) => *existing = snapshot.clone(),
            None => data.entries.push(snapshot.clone()),
        }
        self.save(PROGRESS_FILE, &data)
    }
}

/// Write to a sibling `.tmp` file, sync it, then rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
