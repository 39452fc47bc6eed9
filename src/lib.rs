//! # wallet-pay
//!
//! A payment core for device wallets (Apple Pay, Google Pay): configure a merchant, check that the
//! device can pay, run a single payment transaction and hand back a normalized result.
//!
//! The native wallet sheet and the bridge that receives calls from a host UI stay outside the crate.
//! The crate talks to the device through small traits in [`platform`] and answers the bridge through
//! the [`payments::Payments`] facade.
//!
//! ## Features
//!
//! - **Configuration**: Flat key-value source per wallet service, with a canonical JSON snapshot
//! - **Availability**: Wallet, payment and configured-setup checks, first failure wins
//! - **Orchestration**: One transaction at a time, resolved exactly once when the sheet is dismissed
//! - **Wire codec**: JSON payment details in, JSON payment scope out, decimal amounts
//! - **Stable errors**: Closed taxonomy with fixed codes (`OS-PLUG-PMT-0001` ...)
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use wallet_pay::config::{ConfigSource, Configuration, WalletService};
//! use wallet_pay::handler::{PaymentHandler, WalletHandler};
//! use wallet_pay::platform::simulated::{SheetScript, SimulatedDevice};
//! use wallet_pay::platform::AuthorizedPayment;
//! use wallet_pay::codec::{decode_details, encode_scope};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = ConfigSource::new()
//!     .with("ApplePayMerchantID", "merchant.com.example")
//!     .with("ApplePayMerchantName", "Example Store")
//!     .with("ApplePayMerchantCountryCode", "US")
//!     .with("ApplePayPaymentAllowedNetworks", "visa,mastercard")
//!     .with("ApplePayPaymentSupportedCapabilities", "3ds");
//! let configuration = Arc::new(Configuration::load(WalletService::ApplePay, &source));
//!
//! let device = SimulatedDevice::new()
//!     .with_script(SheetScript::Authorize(AuthorizedPayment::new("token", "Visa 4242")));
//! let handler = WalletHandler::with_device(configuration, Arc::new(device));
//!
//! handler.check_wallet_availability()?;
//! let details = decode_details(r#"{"amount":"10.00","currency":"USD","status":"final"}"#)?;
//! let scope = handler.set_details(details).await?;
//! println!("{}", encode_scope(&scope)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Transaction Flow
//!
//! 1. **Setup**: `setupConfiguration` returns the configuration snapshot or `OS-PLUG-PMT-0001`
//! 2. **Check**: `checkWalletSetup` runs the availability chain
//! 3. **Decode**: `setDetails` decodes the payment details
//! 4. **Present**: The orchestrator builds the platform request and presents the sheet
//! 5. **Authorize**: The sheet reports zero or more authorizations through its handle
//! 6. **Resolve**: On dismissal the last successful authorization wins; none means cancelled
//! 7. **Encode**: The payment scope is encoded and returned to the host
//!
//! ## Error Codes
//!
//! | code | meaning |
//! |---|---|
//! | `OS-PLUG-PMT-0001` | invalid configuration |
//! | `OS-PLUG-PMT-0002` | wallet not available |
//! | `OS-PLUG-PMT-0003` | payment not available |
//! | `OS-PLUG-PMT-0004` | configured networks/capabilities not available |
//! | `OS-PLUG-PMT-0006` | payment details could not be decoded |
//! | `OS-PLUG-PMT-0007` | payment sheet could not be presented |
//! | `OS-PLUG-PMT-0008` | payment cancelled |
//! | `OS-PLUG-PMT-0009` | payment scope could not be encoded |
//! | `OS-PLUG-PMT-0010` | a payment is already in progress |
//!
//! Code `OS-PLUG-PMT-0005` is retired.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod availability;
pub mod codec;
pub mod config;
pub mod errors;
pub mod handler;
pub mod payments;
pub mod platform;
pub mod request;
pub mod types;

// Re-export commonly used items
pub use errors::{ErrorPayload, PaymentsError, Result};
pub use types::{
    Address, ContactField, ContactInfo, ContactRequirement, MerchantCapability, PaymentData,
    PaymentDetails, PaymentNetwork, PaymentScope, SettlementStatus, TokenInfo,
};
