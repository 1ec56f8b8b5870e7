//! Provider endpoint and credential configuration.

use std::time::Duration;

/// Connection settings for the booking provider (ResHarmonics-style API).
#[derive(Debug, Clone)]
pub struct BookingProviderConfig {
    /// Base URL of the provider API, without a trailing slash.
    pub base_url: String,
    /// OAuth2 token endpoint.
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Scope requested with the client-credentials grant.
    pub scope: String,
    /// Per-call network timeout.
    pub timeout: Duration,
}

impl BookingProviderConfig {
    pub fn new(
        base_url: impl Into<String>,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: "api/read api/write".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Connection settings for the payment gateway.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    /// Overridable for tests; defaults to the public Stripe API.
    pub base_url: String,
    pub timeout: Duration,
}

impl StripeConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            base_url: "https://api.stripe.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Settings for the completion webhook.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub timeout: Duration,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
        }
    }
}
