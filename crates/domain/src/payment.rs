//! Payment input, rail selection and card network classification.

use common::Money;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Raw card fields for the legacy local-capture rail.
///
/// Only the PAN is interpreted locally (network classification and
/// last-four extraction); everything else is passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    pub card_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_holder: Option<String>,
}

impl CardDetails {
    /// PAN with whitespace removed.
    pub fn normalized_pan(&self) -> String {
        self.card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    /// Last four digits of the PAN, recorded with the payment.
    pub fn last_four(&self) -> String {
        let pan = self.normalized_pan();
        let split = pan.len().saturating_sub(4);
        pan.get(split..).unwrap_or("").to_string()
    }
}

/// Payment amount and card fields as submitted by the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Card fields arrive inline with the amount on the legacy rail.
    #[serde(flatten)]
    pub card: Option<CardDetails>,
}

fn default_currency() -> String {
    "SEK".to_string()
}

impl PaymentDetails {
    /// The requested amount in minor units.
    pub fn money(&self) -> Money {
        Money::from_major(self.amount)
    }
}

/// Which payment rail an orchestration run uses.
///
/// The two rails share the same step machine but differ in when money
/// moves, which drives the per-step tolerate/abort policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRail {
    /// Pre-authorized payment intent, verified before any booking call.
    Stripe { payment_intent_id: String },

    /// Raw card submitted to the booking provider; money moves at the
    /// record-payment step.
    Card { card: CardDetails },
}

impl PaymentRail {
    /// Selects the rail from the inbound request: an intent id wins,
    /// otherwise card fields are required.
    pub fn select(
        payment: &PaymentDetails,
        payment_intent_id: Option<&str>,
    ) -> Result<Self, ValidationError> {
        if !payment.amount.is_finite() || payment.amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount);
        }
        if let Some(intent_id) = payment_intent_id {
            if intent_id.trim().is_empty() {
                return Err(ValidationError::MissingPaymentIntent);
            }
            return Ok(PaymentRail::Stripe {
                payment_intent_id: intent_id.to_string(),
            });
        }
        match &payment.card {
            Some(card) if !card.normalized_pan().is_empty() => Ok(PaymentRail::Card {
                card: card.clone(),
            }),
            _ => Err(ValidationError::MissingCardNumber),
        }
    }
}

/// Card network labels accepted by the booking provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardNetwork {
    VisaCredit,
    VisaElectron,
    Mastercard,
    AmericanExpress,
    DinersClub,
    Maestro,
    Jcb,
}

impl CardNetwork {
    /// Classifies a card network from the PAN prefix.
    ///
    /// Deterministic prefix table from the provider's payment API;
    /// anything unrecognized falls back to `VISA_CREDIT`.
    pub fn classify(pan: &str) -> Self {
        const ELECTRON_PREFIXES: [&str; 5] = ["4026", "4508", "4844", "4913", "4917"];

        let first_four = pan.get(..4).unwrap_or("");
        let first_two = pan.get(..2).unwrap_or("");

        if pan.starts_with('4') {
            if ELECTRON_PREFIXES.contains(&first_four) {
                return CardNetwork::VisaElectron;
            }
            return CardNetwork::VisaCredit;
        }

        match first_two {
            "51" | "52" | "53" | "54" | "55" => CardNetwork::Mastercard,
            "34" | "37" => CardNetwork::AmericanExpress,
            "30" | "36" | "38" => CardNetwork::DinersClub,
            "35" => CardNetwork::Jcb,
            "50" | "56" | "57" | "58" | "59" | "60" | "61" | "62" | "63" | "64" | "65" | "66"
            | "67" | "68" | "69" => CardNetwork::Maestro,
            _ => CardNetwork::VisaCredit,
        }
    }

    /// Provider wire name for this network.
    pub fn as_str(&self) -> &'static str {
        match self {
            CardNetwork::VisaCredit => "VISA_CREDIT",
            CardNetwork::VisaElectron => "VISA_ELECTRON",
            CardNetwork::Mastercard => "MASTERCARD",
            CardNetwork::AmericanExpress => "AMERICAN_EXPRESS",
            CardNetwork::DinersClub => "DINERS_CLUB",
            CardNetwork::Maestro => "MAESTRO",
            CardNetwork::Jcb => "JCB",
        }
    }
}

impl std::fmt::Display for CardNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Generates a payment reference for the local-capture rail, unique per
/// attempt. The Stripe rail uses the intent id instead.
pub fn local_payment_reference() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("PAY-{}", &suffix[..12].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_matches_provider_table() {
        assert_eq!(
            CardNetwork::classify("4111111111111111"),
            CardNetwork::VisaCredit
        );
        assert_eq!(
            CardNetwork::classify("4026111111111111"),
            CardNetwork::VisaElectron
        );
        assert_eq!(
            CardNetwork::classify("5500000000000000"),
            CardNetwork::Mastercard
        );
        assert_eq!(
            CardNetwork::classify("340000000000000"),
            CardNetwork::AmericanExpress
        );
        assert_eq!(
            CardNetwork::classify("36000000000000"),
            CardNetwork::DinersClub
        );
        assert_eq!(
            CardNetwork::classify("6759000000000000"),
            CardNetwork::Maestro
        );
        assert_eq!(CardNetwork::classify("3528000000000000"), CardNetwork::Jcb);
    }

    #[test]
    fn classify_falls_back_to_visa_credit() {
        assert_eq!(
            CardNetwork::classify("9999999999999999"),
            CardNetwork::VisaCredit
        );
        assert_eq!(CardNetwork::classify(""), CardNetwork::VisaCredit);
        assert_eq!(CardNetwork::classify("1"), CardNetwork::VisaCredit);
    }

    #[test]
    fn last_four_ignores_whitespace() {
        let card = CardDetails {
            card_number: "4111 1111 1111 1234".to_string(),
            expiry_month: None,
            expiry_year: None,
            card_holder: None,
        };
        assert_eq!(card.last_four(), "1234");
    }

    #[test]
    fn rail_selection_prefers_intent_id() {
        let payment = PaymentDetails {
            amount: 100.0,
            currency: "SEK".to_string(),
            card: Some(CardDetails {
                card_number: "4111111111111111".to_string(),
                expiry_month: None,
                expiry_year: None,
                card_holder: None,
            }),
        };
        let rail = PaymentRail::select(&payment, Some("pi_123")).unwrap();
        assert_eq!(
            rail,
            PaymentRail::Stripe {
                payment_intent_id: "pi_123".to_string()
            }
        );
    }

    #[test]
    fn rail_selection_rejects_non_positive_amount() {
        let payment = PaymentDetails {
            amount: 0.0,
            currency: "SEK".to_string(),
            card: None,
        };
        assert_eq!(
            PaymentRail::select(&payment, Some("pi_123")),
            Err(ValidationError::NonPositiveAmount)
        );
    }

    #[test]
    fn rail_selection_requires_card_without_intent() {
        let payment = PaymentDetails {
            amount: 100.0,
            currency: "SEK".to_string(),
            card: None,
        };
        assert_eq!(
            PaymentRail::select(&payment, None),
            Err(ValidationError::MissingCardNumber)
        );
    }

    #[test]
    fn local_references_are_unique() {
        let a = local_payment_reference();
        let b = local_payment_reference();
        assert!(a.starts_with("PAY-"));
        assert_ne!(a, b);
    }
}
