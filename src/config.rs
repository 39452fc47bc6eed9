//! Merchant and payment configuration.
//!
//! A [`ConfigSource`] is a flat key-value map read once at startup. A
//! [`Configuration`] is loaded from it for a given [`WalletService`]; loading
//! never fails, missing required values only make the configuration invalid,
//! which is reported when the snapshot is requested.

use crate::errors::ConfigError;
use crate::types::{MerchantCapability, PaymentNetwork};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// The platform wallet a configuration targets.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletService {
    /// Apple Pay
    ApplePay,
    /// Google Pay
    GooglePay,
}

impl WalletService {
    /// Source keys recognized for this service.
    pub fn keys(self) -> &'static ConfigKeys {
        match self {
            Self::ApplePay => &APPLE_PAY_KEYS,
            Self::GooglePay => &GOOGLE_PAY_KEYS,
        }
    }

    /// Tag placed in the `type` field of the token data.
    pub fn gateway_tag(self) -> &'static str {
        match self {
            Self::ApplePay => "Apple Pay",
            Self::GooglePay => "Google Pay",
        }
    }

    /// Identifier of the service inside the plugin configuration document.
    pub fn service_id(self) -> &'static str {
        match self {
            Self::ApplePay => "1",
            Self::GooglePay => "2",
        }
    }
}

impl fmt::Display for WalletService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.gateway_tag())
    }
}

/// Names of the recognized configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigKeys {
    /// Merchant identifier
    pub merchant_id: &'static str,
    /// Merchant display name
    pub merchant_name: &'static str,
    /// Merchant country code
    pub merchant_country_code: &'static str,
    /// Allowed payment networks
    pub payment_allowed_networks: &'static str,
    /// Supported merchant capabilities
    pub payment_supported_capabilities: &'static str,
    /// Supported card countries
    pub payment_supported_card_countries: &'static str,
    /// Default shipping contact fields
    pub shipping_supported_contacts: &'static str,
    /// Default billing contact fields
    pub billing_supported_contacts: &'static str,
}

const APPLE_PAY_KEYS: ConfigKeys = ConfigKeys {
    merchant_id: "ApplePayMerchantID",
    merchant_name: "ApplePayMerchantName",
    merchant_country_code: "ApplePayMerchantCountryCode",
    payment_allowed_networks: "ApplePayPaymentAllowedNetworks",
    payment_supported_capabilities: "ApplePayPaymentSupportedCapabilities",
    payment_supported_card_countries: "ApplePayPaymentSupportedCardCountries",
    shipping_supported_contacts: "ApplePayShippingSupportedContacts",
    billing_supported_contacts: "ApplePayBillingSupportedContacts",
};

// The plugin document uses these names as well.
const GOOGLE_PAY_KEYS: ConfigKeys = ConfigKeys {
    merchant_id: "merchant_id",
    merchant_name: "merchant_name",
    merchant_country_code: "merchant_country_code",
    payment_allowed_networks: "payment_allowed_networks",
    payment_supported_capabilities: "payment_supported_capabilities",
    payment_supported_card_countries: "payment_supported_card_countries",
    shipping_supported_contacts: "shipping_supported_contacts",
    billing_supported_contacts: "billing_supported_contacts",
};

impl ConfigKeys {
    /// Pairs each key of this service with the matching plugin document field.
    fn document_fields(&self) -> [(&'static str, &'static str); 8] {
        [
            (self.merchant_id, GOOGLE_PAY_KEYS.merchant_id),
            (self.merchant_name, GOOGLE_PAY_KEYS.merchant_name),
            (self.merchant_country_code, GOOGLE_PAY_KEYS.merchant_country_code),
            (self.payment_allowed_networks, GOOGLE_PAY_KEYS.payment_allowed_networks),
            (self.payment_supported_capabilities, GOOGLE_PAY_KEYS.payment_supported_capabilities),
            (self.payment_supported_card_countries, GOOGLE_PAY_KEYS.payment_supported_card_countries),
            (self.shipping_supported_contacts, GOOGLE_PAY_KEYS.shipping_supported_contacts),
            (self.billing_supported_contacts, GOOGLE_PAY_KEYS.billing_supported_contacts),
        ]
    }
}

/// A configuration value: a single string or a list of strings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Single string (also the comma-separated form of a list)
    Text(String),
    /// List of strings
    List(Vec<String>),
}

impl ConfigValue {
    /// Returns the value when it is a single string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::List(_) => None,
        }
    }

    /// Returns the value as a list.
    ///
    /// A single string is split on commas, each piece trimmed and empty
    /// pieces dropped, so `"visa, amex"` and `["visa", "amex"]` read the same.
    pub fn to_list(&self) -> Vec<String> {
        let pieces: Vec<&str> = match self {
            Self::Text(text) => text.split(',').collect(),
            Self::List(items) => items.iter().map(String::as_str).collect(),
        };

        pieces
            .into_iter()
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for ConfigValue {
    fn from(value: Vec<S>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Flat key-value configuration source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSource {
    entries: HashMap<String, ConfigValue>,
}

impl ConfigSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use wallet_pay::config::ConfigSource;
    ///
    /// let source = ConfigSource::new()
    ///     .with("merchant_name", "Coffee Shop")
    ///     .with("payment_allowed_networks", vec!["visa", "amex"]);
    ///
    /// assert_eq!(source.len(), 2);
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces an entry in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Looks up an entry.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the source has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a source from a JSON object.
    ///
    /// Entries whose value is neither a string nor an array of strings are
    /// skipped, which makes the matching key read as missing.
    pub fn from_json_value(value: &Value) -> Result<Self, ConfigError> {
        let object = value.as_object().ok_or_else(|| {
            ConfigError::InvalidDocument("configuration source must be a JSON object".to_string())
        })?;

        Ok(Self::from_object(object))
    }

    /// Parses a JSON object text into a source.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(&value)
    }

    /// Extracts the entry for `service` from the plugin configuration document.
    ///
    /// The document holds an `app_configurations` array whose items carry a
    /// `service_id` and snake_case merchant fields; those fields are mapped
    /// onto the keys of `service`.
    pub fn from_plugin_document(text: &str, service: WalletService) -> Result<Self, ConfigError> {
        let document: Value = serde_json::from_str(text)?;
        let items = document
            .get("app_configurations")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ConfigError::InvalidDocument("missing app_configurations array".to_string())
            })?;

        let item = items
            .iter()
            .filter_map(Value::as_object)
            .find(|item| match item.get("service_id") {
                Some(Value::String(id)) => id == service.service_id(),
                Some(Value::Number(id)) => id.to_string() == service.service_id(),
                _ => false,
            })
            .ok_or(ConfigError::ServiceNotFound(service))?;

        let fields = Self::from_object(item);
        let mut source = Self::new();
        for (key, field) in service.keys().document_fields() {
            if let Some(value) = fields.get(field) {
                source.insert(key, value.clone());
            }
        }

        Ok(source)
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        object
            .iter()
            .filter_map(|(key, value)| {
                serde_json::from_value::<ConfigValue>(value.clone())
                    .ok()
                    .map(|value| (key.clone(), value))
            })
            .collect()
    }

    /// Reads a required string: absent when missing, empty or a list.
    fn required_text(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(ConfigValue::as_text)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    /// Reads a required list: absent when missing or empty.
    fn required_list(&self, key: &str) -> Option<Vec<String>> {
        self.optional_list(key).filter(|list| !list.is_empty())
    }

    /// Reads an optional list: present whenever the key exists.
    fn optional_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(ConfigValue::to_list)
    }
}

impl<K, V> FromIterator<(K, V)> for ConfigSource
where
    K: Into<String>,
    V: Into<ConfigValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Merchant and payment configuration for one wallet service.
///
/// Immutable after [`Configuration::load`]. Derived sets and the snapshot are
/// computed on first use and cached.
#[derive(Debug)]
pub struct Configuration {
    service: WalletService,

    merchant_id: Option<String>,
    merchant_name: Option<String>,
    merchant_country_code: Option<String>,

    payment_allowed_networks: Option<Vec<String>>,
    payment_supported_capabilities: Option<Vec<String>>,
    payment_supported_card_countries: Option<Vec<String>>,

    shipping_supported_contacts: Option<Vec<String>>,
    billing_supported_contacts: Option<Vec<String>>,

    networks: OnceLock<Option<BTreeSet<PaymentNetwork>>>,
    capabilities: OnceLock<Option<BTreeSet<MerchantCapability>>>,
    countries: OnceLock<Option<BTreeSet<String>>>,
    snapshot: OnceLock<Option<String>>,
}

impl Configuration {
    /// Reads every recognized key of `service` from `source`.
    ///
    /// # Examples
    ///
    /// ```
    /// use wallet_pay::config::{ConfigSource, Configuration, WalletService};
    ///
    /// let source = ConfigSource::new()
    ///     .with("merchant_id", "merchant.com.example")
    ///     .with("merchant_name", "Example")
    ///     .with("merchant_country_code", "US")
    ///     .with("payment_allowed_networks", "visa,mastercard")
    ///     .with("payment_supported_capabilities", "3ds");
    ///
    /// let configuration = Configuration::load(WalletService::GooglePay, &source);
    /// assert!(configuration.is_valid());
    /// assert_eq!(configuration.supported_networks().map(|n| n.len()), Some(2));
    /// ```
    pub fn load(service: WalletService, source: &ConfigSource) -> Self {
        let keys = service.keys();
        let configuration = Self {
            service,
            merchant_id: source.required_text(keys.merchant_id),
            merchant_name: source.required_text(keys.merchant_name),
            merchant_country_code: source.required_text(keys.merchant_country_code),
            payment_allowed_networks: source.required_list(keys.payment_allowed_networks),
            payment_supported_capabilities: source.required_list(keys.payment_supported_capabilities),
            payment_supported_card_countries: source.optional_list(keys.payment_supported_card_countries),
            shipping_supported_contacts: source.optional_list(keys.shipping_supported_contacts),
            billing_supported_contacts: source.optional_list(keys.billing_supported_contacts),
            networks: OnceLock::new(),
            capabilities: OnceLock::new(),
            countries: OnceLock::new(),
            snapshot: OnceLock::new(),
        };

        debug!(
            service = %service,
            valid = configuration.is_valid(),
            "configuration loaded"
        );
        configuration
    }

    /// Wallet service this configuration targets.
    pub fn service(&self) -> WalletService {
        self.service
    }

    /// Merchant identifier.
    pub fn merchant_id(&self) -> Option<&str> {
        self.merchant_id.as_deref()
    }

    /// Merchant display name.
    pub fn merchant_name(&self) -> Option<&str> {
        self.merchant_name.as_deref()
    }

    /// Merchant country code.
    pub fn merchant_country_code(&self) -> Option<&str> {
        self.merchant_country_code.as_deref()
    }

    /// Raw allowed network tokens.
    pub fn payment_allowed_networks(&self) -> Option<&[String]> {
        self.payment_allowed_networks.as_deref()
    }

    /// Raw capability tokens.
    pub fn payment_supported_capabilities(&self) -> Option<&[String]> {
        self.payment_supported_capabilities.as_deref()
    }

    /// Raw supported card countries.
    pub fn payment_supported_card_countries(&self) -> Option<&[String]> {
        self.payment_supported_card_countries.as_deref()
    }

    /// Default shipping contact tokens.
    pub fn shipping_supported_contacts(&self) -> Option<&[String]> {
        self.shipping_supported_contacts.as_deref()
    }

    /// Default billing contact tokens.
    pub fn billing_supported_contacts(&self) -> Option<&[String]> {
        self.billing_supported_contacts.as_deref()
    }

    /// True when every required field is present and non-empty.
    pub fn is_valid(&self) -> bool {
        self.merchant_id.is_some()
            && self.merchant_name.is_some()
            && self.merchant_country_code.is_some()
            && self.payment_allowed_networks.is_some()
            && self.payment_supported_capabilities.is_some()
    }

    /// Canonical JSON snapshot of the configuration.
    ///
    /// `None` when a required field is missing. Keys are the service's source
    /// keys in lexicographic order; optional lists are included only when
    /// present in the source.
    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot
            .get_or_init(|| self.build_snapshot())
            .as_deref()
    }

    fn build_snapshot(&self) -> Option<String> {
        let keys = self.service.keys();
        let mut object = Map::new();

        object.insert(keys.merchant_id.to_string(), Value::from(self.merchant_id.clone()?));
        object.insert(keys.merchant_name.to_string(), Value::from(self.merchant_name.clone()?));
        object.insert(
            keys.merchant_country_code.to_string(),
            Value::from(self.merchant_country_code.clone()?),
        );
        object.insert(
            keys.payment_allowed_networks.to_string(),
            Value::from(self.payment_allowed_networks.clone()?),
        );
        object.insert(
            keys.payment_supported_capabilities.to_string(),
            Value::from(self.payment_supported_capabilities.clone()?),
        );

        let optional = [
            (keys.payment_supported_card_countries, &self.payment_supported_card_countries),
            (keys.shipping_supported_contacts, &self.shipping_supported_contacts),
            (keys.billing_supported_contacts, &self.billing_supported_contacts),
        ];
        for (key, value) in optional {
            if let Some(list) = value {
                object.insert(key.to_string(), Value::from(list.clone()));
            }
        }

        serde_json::to_string(&object).ok()
    }

    /// Allowed networks mapped through the network lookup.
    ///
    /// Unknown tokens are dropped; `None` when nothing matched.
    pub fn supported_networks(&self) -> Option<&BTreeSet<PaymentNetwork>> {
        self.networks
            .get_or_init(|| {
                let networks: BTreeSet<_> = self
                    .payment_allowed_networks
                    .as_ref()?
                    .iter()
                    .filter_map(|token| PaymentNetwork::from_token(token))
                    .collect();
                (!networks.is_empty()).then_some(networks)
            })
            .as_ref()
    }

    /// Capability tokens mapped into a capability set.
    ///
    /// Unknown tokens are dropped; `None` when the set is empty.
    pub fn merchant_capabilities(&self) -> Option<&BTreeSet<MerchantCapability>> {
        self.capabilities
            .get_or_init(|| {
                let capabilities: BTreeSet<_> = self
                    .payment_supported_capabilities
                    .as_ref()?
                    .iter()
                    .filter_map(|token| MerchantCapability::from_token(token))
                    .collect();
                (!capabilities.is_empty()).then_some(capabilities)
            })
            .as_ref()
    }

    /// Deduplicated card countries; `None` when the list is missing or empty.
    pub fn supported_countries(&self) -> Option<&BTreeSet<String>> {
        self.countries
            .get_or_init(|| {
                let countries = self.payment_supported_card_countries.as_ref()?;
                (!countries.is_empty()).then(|| countries.iter().cloned().collect())
            })
            .as_ref()
    }
}
