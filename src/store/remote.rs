use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use tracing::debug;

use crate::store::schema::ProgressSnapshot;
use crate::store::{ProgressStore, StoreError};

/// Progress service client. Progress lives under `{base}/progress/{bookId}`;
/// `base` always ends in `/api`.
pub struct RemoteStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl RemoteStore {
    pub fn new(url: &str, token: Option<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bookdr/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: api_base(url),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn progress_url(&self, book_id: &str) -> String {
        format!("{}/progress/{book_id}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Every snapshot the service holds for this account, most recent first.
    pub fn all_progress(&self) -> Result<Vec<ProgressSnapshot>, StoreError> {
        let url = format!("{}/progress", self.base_url);
        let response = self.authorized(self.client.get(&url)).send()?;
        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        Ok(response.json()?)
    }
}

impl ProgressStore for RemoteStore {
    fn load_progress(&self, book_id: &str) -> Result<Option<ProgressSnapshot>, StoreError> {
        let url = self.progress_url(book_id);
        let response = self.authorized(self.client.get(&url)).send()?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json()?)),
            status => Err(StoreError::Status {
                status: status.as_u16(),
                url,
            }),
        }
    }

    fn save_progress(&self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        let url = self.progress_url(&snapshot.book_id);
        let response = self
            .authorized(self.client.put(&url))
            .json(snapshot)
            .send()?;
        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                url,
            });
        }
        debug!(book_id = %snapshot.book_id, position = snapshot.position_index, "remote progress saved");
        Ok(())
    }
}

/// Normalise a configured service URL so it ends in `/api` without a trailing slash.
pub fn api_base(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/api")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_appends_api() {
        assert_eq!(api_base("http://localhost:3001"), "http://localhost:3001/api");
        assert_eq!(api_base("http://localhost:3001/"), "http://localhost:3001/api");
        assert_eq!(api_base("https://x.example/api"), "https://x.example/api");
        assert_eq!(api_base("https://x.example/api/"), "https://x.example/api");
    }

    #[test]
    fn test_progress_url() {
        let store = RemoteStore::new("http://localhost:3001", None, Duration::from_secs(1)).unwrap();
        assert_eq!(store.progress_url("abc"), "http://localhost:3001/api/progress/abc");
        assert_eq!(store.base_url(), "http://localhost:3001/api");
    }
}
