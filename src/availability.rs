//! Three-tier availability check: wallet, payments, payments with the
//! configured networks and capabilities.

use crate::config::Configuration;
use crate::errors::{PaymentsError, Result};
use crate::platform::{PaymentAvailability, WalletAvailability};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Runs the availability chain against the device probes.
#[derive(Clone)]
pub struct AvailabilityChecker {
    configuration: Arc<Configuration>,
    wallet: Arc<dyn WalletAvailability>,
    payments: Arc<dyn PaymentAvailability>,
}

impl AvailabilityChecker {
    /// Creates a checker over the given probes.
    pub fn new(
        configuration: Arc<Configuration>,
        wallet: Arc<dyn WalletAvailability>,
        payments: Arc<dyn PaymentAvailability>,
    ) -> Self {
        Self {
            configuration,
            wallet,
            payments,
        }
    }

    /// Fails with [`PaymentsError::WalletNotAvailable`] when the device has no wallet.
    pub fn check_wallet(&self) -> Result<()> {
        if !self.wallet.is_wallet_available() {
            warn!(service = %self.configuration.service(), "wallet not available");
            return Err(PaymentsError::WalletNotAvailable);
        }
        Ok(())
    }

    /// Fails with [`PaymentsError::PaymentNotAvailable`] when the device cannot make payments.
    pub fn check_payment_availability(&self) -> Result<()> {
        if !self.payments.can_make_payments() {
            warn!(service = %self.configuration.service(), "payments not available");
            return Err(PaymentsError::PaymentNotAvailable);
        }
        Ok(())
    }

    /// Fails with [`PaymentsError::SetupPaymentNotAvailable`] when the
    /// configuration resolves no network or capability, or when the device
    /// cannot pay with them.
    pub fn check_payment_availability_with_setup(&self) -> Result<()> {
        let (Some(networks), Some(capabilities)) = (
            self.configuration.supported_networks(),
            self.configuration.merchant_capabilities(),
        ) else {
            warn!(
                service = %self.configuration.service(),
                "no supported network or capability configured"
            );
            return Err(PaymentsError::SetupPaymentNotAvailable);
        };

        if !self.payments.can_make_payments_using(networks, capabilities) {
            warn!(
                service = %self.configuration.service(),
                networks = ?networks,
                "payments with the configured setup not available"
            );
            return Err(PaymentsError::SetupPaymentNotAvailable);
        }
        Ok(())
    }

    /// Runs the three checks in order; the first failure wins.
    pub fn check_all(&self) -> Result<()> {
        self.check_wallet()?;
        self.check_payment_availability()?;
        self.check_payment_availability_with_setup()
    }
}

impl fmt::Debug for AvailabilityChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvailabilityChecker")
            .field("service", &self.configuration.service())
            .finish_non_exhaustive()
    }
}
