//! In-process device for tests and demos.
//!
//! ```
//! use std::sync::Arc;
//! use wallet_pay::platform::simulated::{SheetScript, SimulatedDevice};
//! use wallet_pay::platform::{AuthorizedPayment, WalletAvailability};
//!
//! let device = SimulatedDevice::new()
//!     .with_script(SheetScript::Authorize(AuthorizedPayment::new("tok", "Visa 4242")));
//!
//! assert!(device.is_wallet_available());
//! assert_eq!(device.presentations(), 0);
//! ```

use crate::platform::{
    AuthorizedPayment, PaymentAvailability, PaymentSheet, PresentationError, WalletAvailability,
};
use crate::request::{PaymentRequest, SheetHandle};
use crate::types::{MerchantCapability, PaymentNetwork};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// What the simulated sheet does when presented.
#[derive(Debug, Clone)]
pub enum SheetScript {
    /// Authorize the payment, then dismiss
    Authorize(AuthorizedPayment),
    /// Dismiss without authorizing
    Cancel,
    /// Keep the handle for the test to drive, see [`SimulatedDevice::take_handle`]
    Hold,
    /// Drop the handle without any event
    Abandon,
    /// Refuse to present
    Refuse,
}

/// A device whose wallet, cards and payment sheet are scripted.
#[derive(Debug)]
pub struct SimulatedDevice {
    wallet_available: bool,
    payments_available: bool,
    cards: BTreeSet<PaymentNetwork>,
    script: SheetScript,
    presented: Mutex<Vec<PaymentRequest>>,
    held: Mutex<Option<SheetHandle>>,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDevice {
    /// A device with a wallet holding a card of every network, whose sheet
    /// is dismissed without authorizing.
    pub fn new() -> Self {
        Self {
            wallet_available: true,
            payments_available: true,
            cards: BTreeSet::from([
                PaymentNetwork::Amex,
                PaymentNetwork::Discover,
                PaymentNetwork::Visa,
                PaymentNetwork::Mastercard,
            ]),
            script: SheetScript::Cancel,
            presented: Mutex::new(Vec::new()),
            held: Mutex::new(None),
        }
    }

    /// Removes the wallet.
    pub fn without_wallet(mut self) -> Self {
        self.wallet_available = false;
        self
    }

    /// Disables payments altogether.
    pub fn without_payments(mut self) -> Self {
        self.payments_available = false;
        self
    }

    /// Replaces the cards in the wallet.
    pub fn with_cards(mut self, cards: impl IntoIterator<Item = PaymentNetwork>) -> Self {
        self.cards = cards.into_iter().collect();
        self
    }

    /// Sets what the sheet does when presented.
    pub fn with_script(mut self, script: SheetScript) -> Self {
        self.script = script;
        self
    }

    /// Number of presentation attempts so far.
    pub fn presentations(&self) -> usize {
        lock(&self.presented).len()
    }

    /// Requests passed to the sheet, in order.
    pub fn presented(&self) -> Vec<PaymentRequest> {
        lock(&self.presented).clone()
    }

    /// Takes the handle kept by [`SheetScript::Hold`].
    pub fn take_handle(&self) -> Option<SheetHandle> {
        lock(&self.held).take()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WalletAvailability for SimulatedDevice {
    fn is_wallet_available(&self) -> bool {
        self.wallet_available
    }
}

impl PaymentAvailability for SimulatedDevice {
    fn can_make_payments(&self) -> bool {
        self.payments_available
    }

    fn can_make_payments_using(
        &self,
        networks: &BTreeSet<PaymentNetwork>,
        capabilities: &BTreeSet<MerchantCapability>,
    ) -> bool {
        self.payments_available && !capabilities.is_empty() && !self.cards.is_disjoint(networks)
    }
}

impl PaymentSheet for SimulatedDevice {
    fn present(&self, request: PaymentRequest, handle: SheetHandle) -> Result<(), PresentationError> {
        lock(&self.presented).push(request);
        debug!(transaction = %handle.transaction(), script = ?self.script, "simulated sheet presented");

        match &self.script {
            SheetScript::Authorize(payment) => {
                handle.authorize(payment);
                handle.dismiss();
            }
            SheetScript::Cancel => handle.dismiss(),
            SheetScript::Hold => *lock(&self.held) = Some(handle),
            SheetScript::Abandon => drop(handle),
            SheetScript::Refuse => {
                return Err(PresentationError::Rejected("simulated refusal".to_string()))
            }
        }

        Ok(())
    }
}
