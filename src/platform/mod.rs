//! Device seams.
//!
//! The payment core never talks to a wallet directly. The host provides the
//! device probes and the payment sheet through the traits in this module;
//! [`simulated`] contains an in-process device used by tests and demos.

pub mod simulated;

use crate::request::{PaymentRequest, SheetHandle};
use crate::types::{MerchantCapability, PaymentNetwork};
use std::collections::BTreeSet;
use thiserror::Error;

/// Probe for the presence of a wallet on the device.
pub trait WalletAvailability: Send + Sync {
    /// Returns true when the device has a wallet.
    fn is_wallet_available(&self) -> bool;
}

/// Probes for the device's ability to make payments.
pub trait PaymentAvailability: Send + Sync {
    /// Returns true when the device can make payments at all.
    fn can_make_payments(&self) -> bool;

    /// Returns true when the device can pay with at least one of `networks`
    /// under the given `capabilities`.
    ///
    /// # Arguments
    ///
    /// * `networks` - Normalized networks from the configuration
    /// * `capabilities` - Normalized merchant capabilities from the configuration
    fn can_make_payments_using(
        &self,
        networks: &BTreeSet<PaymentNetwork>,
        capabilities: &BTreeSet<MerchantCapability>,
    ) -> bool;
}

/// The native payment sheet.
pub trait PaymentSheet: Send + Sync {
    /// Presents the sheet for `request`.
    ///
    /// Presentation is asynchronous: an `Ok` return only means the sheet is
    /// on its way. The sheet reports back through `handle`, calling
    /// [`SheetHandle::authorize`] zero or more times and then
    /// [`SheetHandle::dismiss`] exactly once.
    ///
    /// # Arguments
    ///
    /// * `request` - The platform payment request
    /// * `handle` - Event handle for this transaction
    ///
    /// # Returns
    ///
    /// `Err` when the sheet cannot be shown; no events are expected then.
    fn present(&self, request: PaymentRequest, handle: SheetHandle) -> Result<(), PresentationError>;
}

/// Reason the payment sheet could not be shown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresentationError {
    /// The platform refused to create the sheet for this request
    #[error("Payment sheet rejected the request: {0}")]
    Rejected(String),

    /// Nothing is available to present the sheet from
    #[error("No presenter available")]
    NoPresenter,
}

/// Postal address as reported by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostalAddress {
    /// Street line
    pub street: String,
    /// City
    pub city: String,
    /// State or region, may be empty
    pub state: String,
    /// Postal code
    pub postal_code: String,
    /// ISO 3166-1 country code
    pub iso_country_code: String,
    /// Sub-administrative area, may be empty
    pub sub_administrative_area: String,
}

/// Contact as reported by the platform. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformContact {
    /// Postal address
    pub postal_address: Option<PostalAddress>,
    /// Phone number
    pub phone_number: Option<String>,
    /// Given name
    pub given_name: Option<String>,
    /// Family name
    pub family_name: Option<String>,
    /// Email address
    pub email_address: Option<String>,
}

/// A payment authorized by the user on the sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizedPayment {
    /// Raw token bytes
    pub token_data: Vec<u8>,

    /// Display label of the payment method, e.g. `"Visa 1234"`
    pub method_display_name: Option<String>,

    /// Billing contact, when requested
    pub billing_contact: Option<PlatformContact>,

    /// Shipping contact, when requested
    pub shipping_contact: Option<PlatformContact>,
}

impl AuthorizedPayment {
    /// Creates a payment with a token and a method label.
    pub fn new(token: impl Into<Vec<u8>>, method_display_name: impl Into<String>) -> Self {
        Self {
            token_data: token.into(),
            method_display_name: Some(method_display_name.into()),
            billing_contact: None,
            shipping_contact: None,
        }
    }

    /// Attaches a billing contact.
    pub fn with_billing_contact(mut self, contact: PlatformContact) -> Self {
        self.billing_contact = Some(contact);
        self
    }

    /// Attaches a shipping contact.
    pub fn with_shipping_contact(mut self, contact: PlatformContact) -> Self {
        self.shipping_contact = Some(contact);
        self
    }
}
