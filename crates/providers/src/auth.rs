//! OAuth2 client-credentials token source with single-flight refresh.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::BookingProviderConfig;
use crate::error::ProviderError;

/// Tokens are treated as expired this long before their actual expiry,
/// so an in-flight request never crosses the boundary mid-call.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Bearer-token source for the booking provider.
///
/// The cached token lives behind a `tokio::sync::Mutex` held across the
/// whole refresh, so concurrent callers hitting an expired token
/// collapse into one outstanding authentication call; the rest wait and
/// reuse the fresh token.
pub struct TokenSource {
    http: reqwest::Client,
    config: BookingProviderConfig,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(http: reqwest::Client, config: BookingProviderConfig) -> Self {
        Self {
            http,
            config,
            cache: Mutex::new(None),
        }
    }

    /// Returns a valid bearer token, re-authenticating if the cached one
    /// is missing or inside the expiry margin.
    pub async fn bearer_token(&self) -> Result<String, ProviderError> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.token.clone());
            }
        }

        let fresh = self.authenticate().await?;
        let token = fresh.token.clone();
        *cache = Some(fresh);
        Ok(token)
    }

    async fn authenticate(&self) -> Result<CachedToken, ProviderError> {
        tracing::debug!(token_url = %self.config.token_url, "requesting provider access token");

        let response = self
            .http
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", self.config.scope.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Auth(format!("invalid token response: {e}")))?;

        Ok(CachedToken {
            token: token.access_token,
            expires_at: Utc::now()
                + ChronoDuration::seconds((token.expires_in - EXPIRY_MARGIN_SECS).max(0)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_token_fresh_before_expiry() {
        let now = Utc::now();
        let cached = CachedToken {
            token: "t".to_string(),
            expires_at: now + ChronoDuration::seconds(10),
        };
        assert!(cached.is_fresh(now));
        assert!(!cached.is_fresh(now + ChronoDuration::seconds(10)));
        assert!(!cached.is_fresh(now + ChronoDuration::seconds(11)));
    }

    #[test]
    fn expiry_margin_never_goes_negative() {
        // A provider granting a token shorter than the margin yields an
        // immediately-expired cache entry rather than a panic.
        assert_eq!((30i64 - EXPIRY_MARGIN_SECS).max(0), 0);
    }
}
