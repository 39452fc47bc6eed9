//! Error types for the wallet-pay library.
//!
//! [`PaymentsError`] is the closed taxonomy reported across the boundary. Each
//! kind has a stable numeric id that is never re-assigned; new kinds are
//! appended. [`ConfigError`] covers failures while building a configuration
//! source and never reaches the boundary on its own.

use crate::config::WalletService;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of every boundary error code (`OS-PLUG-PMT-0001`, `OS-PLUG-PMT-0002`, ...).
pub const ERROR_CODE_PREFIX: &str = "OS-PLUG-PMT-";

/// Failure kinds reported by the payment operations.
///
/// The `Display` output of each variant is its fixed, human-readable
/// description.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentsError {
    /// A required configuration field is missing or empty
    #[error("An invalid configuration was provided to the plugin.")]
    InvalidConfiguration,

    /// The device has no wallet
    #[error("Wallet is not available on this device.")]
    WalletNotAvailable,

    /// The device cannot make payments at all
    #[error("Payment is not available on this device.")]
    PaymentNotAvailable,

    /// The device cannot pay with the configured networks and capabilities
    #[error("Payment through the configured networks and capabilities is not available on this device.")]
    SetupPaymentNotAvailable,

    /// The payment details text did not match the wire schema
    #[error("Couldn't decode payment details.")]
    InvalidDecodeDetails,

    /// The payment sheet could not be shown
    #[error("Couldn't present the payment sheet.")]
    PaymentTriggerPresentationFailed,

    /// The sheet was dismissed without a successful authorization
    #[error("Payment was cancelled by the user.")]
    PaymentCancelled,

    /// The payment scope could not be serialized
    #[error("Couldn't encode payment scope.")]
    InvalidEncodeScope,

    /// A transaction is already waiting for authorization
    #[error("A payment is already in progress.")]
    PaymentAlreadyInProgress,
}

impl PaymentsError {
    /// Every kind, in id order.
    pub const ALL: [Self; 9] = [
        Self::InvalidConfiguration,
        Self::WalletNotAvailable,
        Self::PaymentNotAvailable,
        Self::SetupPaymentNotAvailable,
        Self::InvalidDecodeDetails,
        Self::PaymentTriggerPresentationFailed,
        Self::PaymentCancelled,
        Self::InvalidEncodeScope,
        Self::PaymentAlreadyInProgress,
    ];

    /// Stable numeric id. Id 5 is retired.
    pub const fn code(self) -> u16 {
        match self {
            Self::InvalidConfiguration => 1,
            Self::WalletNotAvailable => 2,
            Self::PaymentNotAvailable => 3,
            Self::SetupPaymentNotAvailable => 4,
            Self::InvalidDecodeDetails => 6,
            Self::PaymentTriggerPresentationFailed => 7,
            Self::PaymentCancelled => 8,
            Self::InvalidEncodeScope => 9,
            Self::PaymentAlreadyInProgress => 10,
        }
    }

    /// Boundary code: the fixed prefix followed by the zero-padded id.
    ///
    /// # Examples
    ///
    /// ```
    /// use wallet_pay::PaymentsError;
    ///
    /// assert_eq!(PaymentsError::InvalidConfiguration.formatted_code(), "OS-PLUG-PMT-0001");
    /// assert_eq!(PaymentsError::PaymentAlreadyInProgress.formatted_code(), "OS-PLUG-PMT-0010");
    /// ```
    pub fn formatted_code(self) -> String {
        format!("{}{:04}", ERROR_CODE_PREFIX, self.code())
    }

    /// Builds the `{code, message}` payload handed to the bridge.
    pub fn payload(self) -> ErrorPayload {
        ErrorPayload {
            code: self.formatted_code(),
            message: self.to_string(),
        }
    }
}

/// Error payload format at the boundary.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorPayload {
    /// Prefixed, zero-padded error code
    pub code: String,

    /// Fixed description of the error kind
    pub message: String,
}

impl From<PaymentsError> for ErrorPayload {
    fn from(err: PaymentsError) -> Self {
        err.payload()
    }
}

/// Errors raised while building a [`ConfigSource`](crate::config::ConfigSource).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The source text is not valid JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The JSON is well formed but does not have the expected shape
    #[error("Invalid configuration document: {0}")]
    InvalidDocument(String),

    /// The plugin document has no entry for the requested wallet service
    #[error("No configuration found for service: {0}")]
    ServiceNotFound(WalletService),
}

/// Result type alias for payment operations.
pub type Result<T> = std::result::Result<T, PaymentsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_error_display() {
        let err = PaymentsError::WalletNotAvailable;
        assert_eq!(err.to_string(), "Wallet is not available on this device.");
        assert_eq!(
            PaymentsError::PaymentTriggerPresentationFailed.to_string(),
            "Couldn't present the payment sheet."
        );
    }

    #[test]
    fn test_codes_are_unique_and_ordered() {
        let codes: Vec<u16> = PaymentsError::ALL.iter().map(|e| e.code()).collect();
        let unique: HashSet<u16> = codes.iter().copied().collect();

        assert_eq!(unique.len(), codes.len());
        assert!(codes.windows(2).all(|w| w[0] < w[1]));
        assert!(!codes.contains(&5));
    }

    #[test]
    fn test_payload_format() {
        let payload = PaymentsError::PaymentCancelled.payload();
        assert_eq!(payload.code, "OS-PLUG-PMT-0008");
        assert_eq!(payload.message, "Payment was cancelled by the user.");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["code"], "OS-PLUG-PMT-0008");
    }

    #[test]
    fn test_config_error_conversion() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: ConfigError = json_err.into();
        assert!(matches!(err, ConfigError::JsonError(_)));
    }
}
