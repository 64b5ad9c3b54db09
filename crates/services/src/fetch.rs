//! External verse fetcher: best effort, bounded time, no retries.
//!
//! The engine treats this collaborator as unreliable by contract. Every
//! caller degrades to a fixed default on failure, so a flaky network can slow
//! a single call down by at most the client timeout, never hang it.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::FetchError;

/// Upper bound on any single fetch. No retries, no backoff.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_BASE_URL: &str = "https://bible-api.com";

/// External source of chapter verse counts and verse text.
#[async_trait]
pub trait VerseFetcher: Send + Sync {
    /// Number of verses in a chapter.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the source is unreachable or the response
    /// carries no verses.
    async fn chapter_verse_count(&self, book_name: &str, chapter: u32) -> Result<u32, FetchError>;

    /// Text of a single verse.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the source is unreachable or the response
    /// carries no text.
    async fn verse_text(
        &self,
        book_name: &str,
        chapter: u32,
        verse: u32,
    ) -> Result<String, FetchError>;
}

//
// ─── WEB FETCHER ───────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct WebFetcherConfig {
    pub base_url: String,
}

impl WebFetcherConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            env::var("LECTIO_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Self { base_url }
    }
}

/// Fetcher backed by a public JSON scripture API.
#[derive(Clone)]
pub struct WebFetcher {
    client: Client,
    config: WebFetcherConfig,
}

impl WebFetcher {
    /// Build a fetcher with the timeout baked into the client.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the client cannot be constructed.
    pub fn new(config: WebFetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    /// Build a fetcher configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the client cannot be constructed.
    pub fn from_env() -> Result<Self, FetchError> {
        Self::new(WebFetcherConfig::from_env())
    }

    async fn get_passage(&self, reference: &str) -> Result<PassageResponse, FetchError> {
        let url = format!("{}/{reference}", self.config.base_url.trim_end_matches('/'));

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl VerseFetcher for WebFetcher {
    async fn chapter_verse_count(&self, book_name: &str, chapter: u32) -> Result<u32, FetchError> {
        let passage = self.get_passage(&format!("{book_name} {chapter}")).await?;
        passage
            .verses
            .iter()
            .map(|v| v.verse)
            .max()
            .ok_or(FetchError::EmptyResponse)
    }

    async fn verse_text(
        &self,
        book_name: &str,
        chapter: u32,
        verse: u32,
    ) -> Result<String, FetchError> {
        let passage = self
            .get_passage(&format!("{book_name} {chapter}:{verse}"))
            .await?;
        let text = passage
            .verses
            .into_iter()
            .next()
            .map(|v| v.text)
            .ok_or(FetchError::EmptyResponse)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(FetchError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct PassageResponse {
    #[serde(default)]
    verses: Vec<PassageVerse>,
}

#[derive(Debug, Deserialize)]
struct PassageVerse {
    verse: u32,
    text: String,
}

//
// ─── OFFLINE ───────────────────────────────────────────────────────────────────
//

/// Fetcher that always fails; offline operation relies on caches and
/// defaults.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableFetcher;

#[async_trait]
impl VerseFetcher for UnavailableFetcher {
    async fn chapter_verse_count(&self, _book_name: &str, _chapter: u32) -> Result<u32, FetchError> {
        Err(FetchError::Disabled)
    }

    async fn verse_text(
        &self,
        _book_name: &str,
        _chapter: u32,
        _verse: u32,
    ) -> Result<String, FetchError> {
        Err(FetchError::Disabled)
    }
}
