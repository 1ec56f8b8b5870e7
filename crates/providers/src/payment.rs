//! Payment gateway: trait, Stripe REST implementation and an in-memory
//! implementation for tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::Money;
use serde::Deserialize;

use crate::config::StripeConfig;
use crate::error::GatewayError;

/// A freshly created payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub payment_intent_id: String,
    pub client_secret: String,
}

/// The gateway's view of an existing payment intent.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentVerification {
    /// Gateway status string; `"succeeded"` is the only state the saga
    /// accepts as money-moved.
    pub status: String,
    pub amount: Money,
    pub currency: String,
    pub metadata: HashMap<String, String>,
}

impl PaymentVerification {
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

/// Outcome of a refund request.
#[derive(Debug, Clone, PartialEq)]
pub struct Refund {
    pub refund_id: String,
    pub status: String,
    pub amount: Money,
}

/// Payment provider operations. Amounts cross this boundary as [`Money`]
/// and are converted to the gateway's minor-unit convention on the wire.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a payment intent the frontend can confirm.
    async fn create_payment_intent(
        &self,
        amount: Money,
        currency: &str,
        metadata: HashMap<String, String>,
    ) -> Result<PaymentIntent, GatewayError>;

    /// Looks up the current state of a payment intent.
    async fn verify_payment(&self, intent_id: &str) -> Result<PaymentVerification, GatewayError>;

    /// Refunds a payment, fully when `amount` is `None`.
    async fn refund_payment(
        &self,
        intent_id: &str,
        amount: Option<Money>,
    ) -> Result<Refund, GatewayError>;
}

// ---------------------------------------------------------------------------
// Stripe REST implementation (no SDK, form-encoded calls)
// ---------------------------------------------------------------------------

/// Stripe client over its REST API with basic-auth on the secret key.
pub struct StripeGateway {
    http: reqwest::Client,
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Form body for `/v1/refunds`; omitting `amount` refunds in full.
    fn refund_form(intent_id: &str, amount: Option<Money>) -> Vec<(String, String)> {
        let mut form = vec![("payment_intent".to_string(), intent_id.to_string())];
        if let Some(amount) = amount {
            form.push(("amount".to_string(), amount.minor_units().to_string()));
        }
        form
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api(format!("gateway returned {status}: {body}")));
        }
        response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[derive(Deserialize)]
struct IntentWire {
    id: String,
    #[serde(default)]
    client_secret: Option<String>,
    status: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Deserialize)]
struct RefundWire {
    id: String,
    status: String,
    amount: i64,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[tracing::instrument(skip(self, metadata))]
    async fn create_payment_intent(
        &self,
        amount: Money,
        currency: &str,
        metadata: HashMap<String, String>,
    ) -> Result<PaymentIntent, GatewayError> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".to_string(), amount.minor_units().to_string()),
            ("currency".to_string(), currency.to_lowercase()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
            (
                "metadata[source]".to_string(),
                "short-stay-booking".to_string(),
            ),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{key}]"), value));
        }

        let response = self
            .http
            .post(self.url("/v1/payment_intents"))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await?;
        let intent: IntentWire = Self::decode(response).await?;

        let client_secret = intent
            .client_secret
            .ok_or_else(|| GatewayError::Decode("intent without client_secret".to_string()))?;
        Ok(PaymentIntent {
            payment_intent_id: intent.id,
            client_secret,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn verify_payment(&self, intent_id: &str) -> Result<PaymentVerification, GatewayError> {
        let response = self
            .http
            .get(self.url(&format!("/v1/payment_intents/{intent_id}")))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .send()
            .await?;
        let intent: IntentWire = Self::decode(response).await?;

        Ok(PaymentVerification {
            status: intent.status,
            amount: Money::from_minor(intent.amount),
            currency: intent.currency.to_uppercase(),
            metadata: intent.metadata,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn refund_payment(
        &self,
        intent_id: &str,
        amount: Option<Money>,
    ) -> Result<Refund, GatewayError> {
        let form = Self::refund_form(intent_id, amount);

        let response = self
            .http
            .post(self.url("/v1/refunds"))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await?;
        let refund: RefundWire = Self::decode(response).await?;

        Ok(Refund {
            refund_id: refund.id,
            status: refund.status,
            amount: Money::from_minor(refund.amount),
        })
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation for tests
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    verifications: HashMap<String, PaymentVerification>,
    next_id: u32,
    fail_on_verify: bool,
    verify_calls: u32,
}

/// In-memory payment gateway for tests. Verification results are
/// scripted per intent id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the verification returned for an intent id.
    pub fn script_verification(&self, intent_id: &str, verification: PaymentVerification) {
        self.state
            .write()
            .unwrap()
            .verifications
            .insert(intent_id.to_string(), verification);
    }

    /// Shorthand: scripts a succeeded intent for the given amount.
    pub fn script_succeeded(&self, intent_id: &str, amount: Money, currency: &str) {
        self.script_verification(
            intent_id,
            PaymentVerification {
                status: "succeeded".to_string(),
                amount,
                currency: currency.to_string(),
                metadata: HashMap::new(),
            },
        );
    }

    pub fn set_fail_on_verify(&self, fail: bool) {
        self.state.write().unwrap().fail_on_verify = fail;
    }

    pub fn verify_call_count(&self) -> u32 {
        self.state.read().unwrap().verify_calls
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_payment_intent(
        &self,
        amount: Money,
        currency: &str,
        _metadata: HashMap<String, String>,
    ) -> Result<PaymentIntent, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.next_id += 1;
        let id = format!("pi_test_{:04}", state.next_id);
        state.verifications.insert(
            id.clone(),
            PaymentVerification {
                status: "requires_payment_method".to_string(),
                amount,
                currency: currency.to_uppercase(),
                metadata: HashMap::new(),
            },
        );
        Ok(PaymentIntent {
            client_secret: format!("{id}_secret"),
            payment_intent_id: id,
        })
    }

    async fn verify_payment(&self, intent_id: &str) -> Result<PaymentVerification, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.verify_calls += 1;
        if state.fail_on_verify {
            return Err(GatewayError::Api("verification unavailable".to_string()));
        }
        state
            .verifications
            .get(intent_id)
            .cloned()
            .ok_or_else(|| GatewayError::Api(format!("no such intent: {intent_id}")))
    }

    async fn refund_payment(
        &self,
        intent_id: &str,
        amount: Option<Money>,
    ) -> Result<Refund, GatewayError> {
        let state = self.state.read().unwrap();
        let verification = state
            .verifications
            .get(intent_id)
            .ok_or_else(|| GatewayError::Api(format!("no such intent: {intent_id}")))?;
        Ok(Refund {
            refund_id: format!("re_{intent_id}"),
            status: "succeeded".to_string(),
            amount: amount.unwrap_or(verification.amount),
        })
    }
}
