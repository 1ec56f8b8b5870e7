//! Application configuration loaded from environment variables.

use providers::{BookingDefaults, BookingProviderConfig, StripeConfig, WebhookConfig};

/// Server and provider configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` / `PORT` — bind address (default `0.0.0.0:3000`)
/// - `BOOKING_API_BASE_URL` / `BOOKING_TOKEN_URL` — booking provider
/// - `BOOKING_CLIENT_ID` / `BOOKING_CLIENT_SECRET` — OAuth2 credentials
/// - `STRIPE_SECRET_KEY` — payment gateway secret
/// - `BOOKING_WEBHOOK_URL` — completion webhook, optional
/// - `PUBLISHED_RATE_CODES` — comma-separated rate codes searched by
///   availability (default `BAR`)
/// - `BILLING_FREQUENCY_ID` / `BOOKING_TYPE_ID` / `BOOKING_CHANNEL_ID` —
///   provider booking defaults (default `1` each)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub booking_base_url: String,
    pub booking_token_url: String,
    pub booking_client_id: String,
    pub booking_client_secret: String,
    pub stripe_secret_key: String,
    pub webhook_url: Option<String>,
    pub rate_codes: Vec<String>,
    pub defaults: BookingDefaults,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults. Credentials default to empty strings so the binary can
    /// boot in local setups without live providers.
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            booking_base_url: env_or("BOOKING_API_BASE_URL", "https://api.rerumapp.uk"),
            booking_token_url: env_or(
                "BOOKING_TOKEN_URL",
                "https://auth.rerumapp.uk/oauth2/token",
            ),
            booking_client_id: env_or("BOOKING_CLIENT_ID", ""),
            booking_client_secret: env_or("BOOKING_CLIENT_SECRET", ""),
            stripe_secret_key: env_or("STRIPE_SECRET_KEY", ""),
            webhook_url: std::env::var("BOOKING_WEBHOOK_URL").ok(),
            rate_codes: parse_rate_codes(&env_or("PUBLISHED_RATE_CODES", "BAR")),
            defaults: BookingDefaults {
                billing_frequency_id: env_id("BILLING_FREQUENCY_ID", 1),
                booking_type_id: env_id("BOOKING_TYPE_ID", 1),
                channel_id: env_id("BOOKING_CHANNEL_ID", 1),
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn booking_provider(&self) -> BookingProviderConfig {
        BookingProviderConfig::new(
            self.booking_base_url.clone(),
            self.booking_token_url.clone(),
            self.booking_client_id.clone(),
            self.booking_client_secret.clone(),
        )
    }

    pub fn stripe(&self) -> StripeConfig {
        StripeConfig::new(self.stripe_secret_key.clone())
    }

    pub fn webhook(&self) -> Option<WebhookConfig> {
        self.webhook_url.clone().map(WebhookConfig::new)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_id(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_rate_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_codes_split_and_trim() {
        assert_eq!(
            parse_rate_codes("BAR, WKLY ,MNTH"),
            vec!["BAR", "WKLY", "MNTH"]
        );
    }

    #[test]
    fn rate_codes_skip_empty_entries() {
        assert_eq!(parse_rate_codes("BAR,,"), vec!["BAR"]);
    }

    #[test]
    fn addr_formatting() {
        let mut config = Config::from_env();
        config.host = "127.0.0.1".to_string();
        config.port = 8080;
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
