// src/bitable/token.rs
//! Tenant access token cache with expiry-aware refresh.
//!
//! Every destination call rides on a bearer token with a bounded
//! lifetime. The cache hands out the same token until it enters the
//! safety margin before expiry, then replaces it: a token inside the
//! margin is never used, and a stale token is never retried.

use crate::constants::TOKEN_SAFETY_MARGIN_SECS;
use crate::error::AppError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// A freshly acquired credential and its reported lifetime.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub secret: String,
    pub expires_in: Duration,
}

/// The ability to acquire a fresh credential from the destination.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn acquire(&self) -> Result<IssuedToken, AppError>;
}

/// A cached token with its absolute expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    secret: String,
    expires_at: Instant,
}

impl CachedToken {
    /// Fresh iff now is still outside the safety margin before expiry.
    fn is_fresh(&self, now: Instant) -> bool {
        now + Duration::from_secs(TOKEN_SAFETY_MARGIN_SECS) < self.expires_at
    }
}

/// Caches a bearer credential across destination calls.
///
/// The cache slot doubles as the refresh lock: concurrent callers
/// serialize on the mutex, so at most one acquisition is in flight and
/// every waiter shares the token it produced.
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
        }
    }

    /// Returns a token guaranteed fresh for at least the safety margin,
    /// acquiring a new one only when the cached token is absent or stale.
    pub async fn bearer(&self) -> Result<String, AppError> {
        let mut slot = self.cached.lock().await;

        if let Some(token) = slot.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.secret.clone());
            }
        }

        log::info!("Acquiring a new tenant access token");
        let issued = self.source.acquire().await?;
        log::info!(
            "Token acquired, valid for {}s",
            issued.expires_in.as_secs()
        );

        let token = CachedToken {
            secret: issued.secret,
            expires_at: Instant::now() + issued.expires_in,
        };
        let secret = token.secret.clone();
        *slot = Some(token);
        Ok(secret)
    }
}
