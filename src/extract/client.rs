// src/extract/client.rs
//! Pure HTTP client wrapper for source-platform pages.
//!
//! This module provides a thin wrapper around reqwest for fetching
//! server-rendered pages and image bytes. It handles the session cookie
//! and browser identity headers without any parsing or business logic.

use crate::constants::{
    METADATA_TIMEOUT_SECS, SOURCE_USER_AGENT, TRANSFER_TIMEOUT_SECS, XHS_BASE_URL,
};
use crate::error::AppError;
use crate::types::SessionCookie;
use reqwest::{header, Client};
use std::time::Duration;

/// The ability to fetch source-platform pages and binaries.
///
/// Business logic depends on this trait, never on HTTP details, so every
/// extraction path is testable against canned pages.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a page and returns its markup. Non-success status is an error.
    async fn fetch_page(&self, url: &str) -> Result<String, AppError>;

    /// Fetches raw bytes (image payloads) with the transfer timeout.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, AppError>;
}

/// A thin wrapper around reqwest Client for source-platform requests.
#[derive(Clone)]
pub struct SourceHttpClient {
    client: Client,
}

impl SourceHttpClient {
    /// Creates a new HTTP client carrying the session cookie.
    pub fn new(cookie: &SessionCookie) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(cookie)?)
            .timeout(Duration::from_secs(METADATA_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Creates the default headers the platform expects from a browser session.
    fn create_headers(cookie: &SessionCookie) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            header::COOKIE,
            header::HeaderValue::from_str(cookie.as_str()).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid session cookie: {}", e))
            })?,
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(SOURCE_USER_AGENT),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(header::ORIGIN, header::HeaderValue::from_static(XHS_BASE_URL));
        headers.insert(
            header::REFERER,
            header::HeaderValue::from_static("https://www.xiaohongshu.com/"),
        );

        Ok(headers)
    }
}

#[async_trait::async_trait]
impl PageFetcher for SourceHttpClient {
    async fn fetch_page(&self, url: &str) -> Result<String, AppError> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamStatus {
                status,
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, AppError> {
        log::debug!("GET (binary) {}", url);
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(TRANSFER_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamStatus {
                status,
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
