//! Core type definitions for wallet payments.
//!
//! This module contains the wire-format data structures exchanged with the
//! host (payment details in, payment scope out) and the normalized token
//! enumerations used to describe what a merchant accepts.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// A card scheme accepted for payment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PaymentNetwork {
    /// American Express
    Amex,
    /// Discover
    Discover,
    /// Visa
    Visa,
    /// Mastercard
    Mastercard,
}

impl PaymentNetwork {
    /// Maps a configuration token (case-insensitive) to a network.
    ///
    /// Returns `None` for tokens outside the fixed lookup table.
    ///
    /// # Examples
    ///
    /// ```
    /// use wallet_pay::types::PaymentNetwork;
    ///
    /// assert_eq!(PaymentNetwork::from_token("Visa"), Some(PaymentNetwork::Visa));
    /// assert_eq!(PaymentNetwork::from_token("BOGUS"), None);
    /// ```
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "amex" => Some(Self::Amex),
            "discover" => Some(Self::Discover),
            "visa" => Some(Self::Visa),
            "mastercard" => Some(Self::Mastercard),
            _ => None,
        }
    }
}

/// A processing feature the merchant declares support for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MerchantCapability {
    /// Debit cards
    #[serde(rename = "debit")]
    Debit,
    /// Credit cards
    #[serde(rename = "credit")]
    Credit,
    /// 3-D Secure
    #[serde(rename = "3ds")]
    ThreeDSecure,
    /// EMV
    #[serde(rename = "emv")]
    Emv,
}

impl MerchantCapability {
    /// Maps a configuration token (case-insensitive) to a capability.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "debit" => Some(Self::Debit),
            "credit" => Some(Self::Credit),
            "3ds" => Some(Self::ThreeDSecure),
            "emv" => Some(Self::Emv),
            _ => None,
        }
    }
}

/// A personal-data category that may be requested during checkout.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ContactField {
    /// Email address
    Email,
    /// Given and family name
    Name,
    /// Phone number
    Phone,
    /// Postal address
    PostalAddress,
}

impl ContactField {
    /// Maps a contact token (case-insensitive) to a field.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "email" => Some(Self::Email),
            "name" => Some(Self::Name),
            "phone" => Some(Self::Phone),
            "postal_address" => Some(Self::PostalAddress),
            _ => None,
        }
    }
}

/// Whether the charged amount is final or may still change.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    /// The amount is known and final
    Final,
    /// The amount is an estimate
    Pending,
}

/// Contact fields to request for shipping or billing.
///
/// When `is_custom` is false the configured defaults are used and
/// `contact_info` is ignored.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequirement {
    /// Use the explicit list instead of the configured defaults
    #[serde(default)]
    pub is_custom: bool,

    /// Explicit contact field tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<Vec<String>>,
}

impl ContactRequirement {
    /// Requirement that falls back to the configured defaults.
    pub fn configured() -> Self {
        Self::default()
    }

    /// Requirement with an explicit list of contact tokens.
    pub fn custom<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            is_custom: true,
            contact_info: Some(fields.into_iter().map(Into::into).collect()),
        }
    }
}

/// Payment details received from the host for one transaction.
///
/// # Examples
///
/// ```
/// use wallet_pay::types::{PaymentDetails, SettlementStatus};
///
/// let details: PaymentDetails = serde_json::from_str(
///     r#"{"amount":"10.00","currency":"USD","status":"final",
///         "shippingContacts":{"isCustom":false},"billingContacts":{"isCustom":false}}"#,
/// ).unwrap();
///
/// assert_eq!(details.currency, "USD");
/// assert_eq!(details.status, SettlementStatus::Final);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    /// Amount to be charged
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,

    /// ISO 4217 three-letter currency code
    pub currency: String,

    /// Final or pending amount
    pub status: SettlementStatus,

    /// Shipping contact fields to request
    #[serde(default)]
    pub shipping_contacts: ContactRequirement,

    /// Billing contact fields to request
    #[serde(default)]
    pub billing_contacts: ContactRequirement,
}

impl PaymentDetails {
    /// Creates details that use the configured contact defaults.
    pub fn new(amount: Decimal, currency: impl Into<String>, status: SettlementStatus) -> Self {
        Self {
            amount,
            currency: currency.into(),
            status,
            shipping_contacts: ContactRequirement::configured(),
            billing_contacts: ContactRequirement::configured(),
        }
    }

    /// Sets the shipping contact requirement.
    pub fn with_shipping_contacts(mut self, requirement: ContactRequirement) -> Self {
        self.shipping_contacts = requirement;
        self
    }

    /// Sets the billing contact requirement.
    pub fn with_billing_contacts(mut self, requirement: ContactRequirement) -> Self {
        self.billing_contacts = requirement;
        self
    }

    /// Checks the invariants serde cannot express.
    pub fn is_valid(&self) -> bool {
        self.amount >= Decimal::ZERO
            && self.currency.len() == 3
            && self.currency.chars().all(|c| c.is_ascii_alphabetic())
    }
}

/// Amounts arrive either as a decimal string or as a bare JSON number.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AmountRepr {
        Text(String),
        Number(serde_json::Number),
    }

    let text = match AmountRepr::deserialize(deserializer)? {
        AmountRepr::Text(text) => text,
        AmountRepr::Number(number) => number.to_string(),
    };
    let text = text.trim();

    // Digit separators and anything else `Decimal` tolerates are not amounts.
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit() || ".+-eE".contains(c)) {
        return Err(serde::de::Error::custom(format!("invalid amount '{}'", text)));
    }

    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str_exact(text)
    };

    parsed.map_err(|e| serde::de::Error::custom(format!("invalid amount '{}': {}", text, e)))
}

/// Postal address attached to billing or shipping information.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Zip code
    pub postal_code: String,

    /// Street line (street, door number, floor, ...)
    pub full_address: String,

    /// ISO 3166-1 country code
    pub country_code: String,

    /// City
    pub city: String,

    /// Administrative area, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administrative_area: Option<String>,

    /// State or region, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Billing or shipping contact information. Every field is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    /// Postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    /// Given and family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ContactInfo {
    /// Returns true when no field is set.
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.phone_number.is_none()
            && self.name.is_none()
            && self.email.is_none()
    }
}

/// Payment token produced by the wallet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// Opaque token text
    pub token: String,

    /// Payment gateway tag (e.g. "Apple Pay")
    #[serde(rename = "type")]
    pub gateway: String,
}

/// Payment data returned after authorization.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    /// Token and gateway tag
    pub token_data: TokenInfo,

    /// Last four digits label of the card used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_details: Option<String>,

    /// Network label of the card used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_network: Option<String>,

    /// Billing information filled in by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_info: Option<ContactInfo>,
}

/// Normalized transaction result.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentScope {
    /// Payment data
    pub payment_data: PaymentData,

    /// Shipping information filled in by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_info: Option<ContactInfo>,
}
