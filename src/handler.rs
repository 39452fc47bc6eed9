//! Per-wallet handlers.
//!
//! This module contains the trait the boundary facade drives and the
//! handler that wires the configuration, availability chain and request
//! orchestrator together for one wallet service.

use crate::availability::AvailabilityChecker;
use crate::config::Configuration;
use crate::errors::{PaymentsError, Result};
use crate::platform::{PaymentAvailability, PaymentSheet, WalletAvailability};
use crate::request::RequestOrchestrator;
use crate::types::{PaymentDetails, PaymentScope};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Operations behind the boundary facade.
#[async_trait]
pub trait PaymentHandler: Send + Sync {
    /// Returns the canonical configuration snapshot.
    ///
    /// # Errors
    ///
    /// [`PaymentsError::InvalidConfiguration`] when a required field is missing.
    fn setup_configuration(&self) -> Result<String>;

    /// Checks that the device can pay with the configured setup.
    fn check_wallet_availability(&self) -> Result<()>;

    /// Runs a payment transaction for `details`.
    ///
    /// # Arguments
    ///
    /// * `details` - Decoded payment details
    ///
    /// # Returns
    ///
    /// The payment scope once the sheet is dismissed after a successful authorization
    async fn set_details(&self, details: PaymentDetails) -> Result<PaymentScope>;
}

/// Handler for one wallet service.
#[derive(Debug)]
pub struct WalletHandler {
    configuration: Arc<Configuration>,
    availability: AvailabilityChecker,
    orchestrator: RequestOrchestrator,
}

impl WalletHandler {
    /// Creates a handler over separate device probes and sheet.
    pub fn new(
        configuration: Arc<Configuration>,
        wallet: Arc<dyn WalletAvailability>,
        payments: Arc<dyn PaymentAvailability>,
        sheet: Arc<dyn PaymentSheet>,
    ) -> Self {
        Self {
            availability: AvailabilityChecker::new(configuration.clone(), wallet, payments),
            orchestrator: RequestOrchestrator::new(configuration.clone(), sheet),
            configuration,
        }
    }

    /// Creates a handler over a device that provides every seam.
    pub fn with_device<D>(configuration: Arc<Configuration>, device: Arc<D>) -> Self
    where
        D: WalletAvailability + PaymentAvailability + PaymentSheet + 'static,
    {
        Self::new(configuration, device.clone(), device.clone(), device)
    }

    /// Configuration this handler was built with.
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Orchestrator driving the transactions of this handler.
    pub fn orchestrator(&self) -> &RequestOrchestrator {
        &self.orchestrator
    }
}

#[async_trait]
impl PaymentHandler for WalletHandler {
    fn setup_configuration(&self) -> Result<String> {
        match self.configuration.snapshot() {
            Some(snapshot) => {
                debug!(service = %self.configuration.service(), "configuration snapshot ready");
                Ok(snapshot.to_string())
            }
            None => {
                warn!(service = %self.configuration.service(), "configuration is missing required fields");
                Err(PaymentsError::InvalidConfiguration)
            }
        }
    }

    fn check_wallet_availability(&self) -> Result<()> {
        self.availability.check_all()
    }

    async fn set_details(&self, details: PaymentDetails) -> Result<PaymentScope> {
        self.orchestrator.trigger(&details).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigSource, WalletService};
    use crate::platform::simulated::SimulatedDevice;

    fn handler(source: ConfigSource, device: SimulatedDevice) -> WalletHandler {
        let configuration = Arc::new(Configuration::load(WalletService::ApplePay, &source));
        WalletHandler::with_device(configuration, Arc::new(device))
    }

    #[test]
    fn test_setup_configuration_requires_merchant_fields() {
        let source = ConfigSource::new()
            .with("ApplePayMerchantID", "merchant.com.example")
            .with("ApplePayMerchantCountryCode", "US")
            .with("ApplePayPaymentAllowedNetworks", "visa")
            .with("ApplePayPaymentSupportedCapabilities", "3ds");
        let handler = handler(source, SimulatedDevice::new());

        assert_eq!(handler.setup_configuration(), Err(PaymentsError::InvalidConfiguration));
    }

    #[test]
    fn test_check_wallet_availability_delegates_to_chain() {
        let handler = handler(ConfigSource::new(), SimulatedDevice::new().without_wallet());

        assert_eq!(
            handler.check_wallet_availability(),
            Err(PaymentsError::WalletNotAvailable)
        );
    }
}
