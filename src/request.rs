//! Payment request orchestration.
//!
//! [`RequestOrchestrator::trigger`] turns payment details into a
//! [`PaymentRequest`], presents the payment sheet and waits for the sheet to
//! report back through its [`SheetHandle`]. Phases run
//! `Idle -> Triggering -> AwaitingAuthorization -> Idle`, with exactly one
//! resolution per trigger and at most one transaction in flight.

use crate::codec::resolve_contact_fields;
use crate::config::Configuration;
use crate::errors::{PaymentsError, Result};
use crate::platform::{AuthorizedPayment, PaymentSheet};
use crate::types::{
    ContactField, MerchantCapability, PaymentDetails, PaymentNetwork, PaymentScope,
    SettlementStatus,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Single line entry shown on the payment sheet.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryItem {
    /// Label, the merchant name
    pub label: String,

    /// Amount to be charged
    pub amount: Decimal,

    /// Final or pending amount
    #[serde(rename = "type")]
    pub kind: SettlementStatus,
}

/// Request handed to the platform payment sheet.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Merchant identifier
    pub merchant_identifier: String,

    /// Merchant country code
    pub country_code: String,

    /// ISO 4217 currency code
    pub currency_code: String,

    /// Merchant capabilities
    pub merchant_capabilities: BTreeSet<MerchantCapability>,

    /// Accepted networks
    pub supported_networks: BTreeSet<PaymentNetwork>,

    /// Accepted card countries, unrestricted when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_countries: Option<BTreeSet<String>>,

    /// Summary items, a single entry
    pub payment_summary_items: Vec<SummaryItem>,

    /// Billing contact fields to collect
    pub required_billing_contact_fields: BTreeSet<ContactField>,

    /// Shipping contact fields to collect
    pub required_shipping_contact_fields: BTreeSet<ContactField>,
}

impl PaymentRequest {
    /// Builds the request for `details`.
    ///
    /// Returns `None` when the merchant id, name, country code, capabilities
    /// or networks cannot be resolved from `configuration`.
    pub fn build(configuration: &Configuration, details: &PaymentDetails) -> Option<Self> {
        let merchant_name = configuration.merchant_name()?;

        Some(Self {
            merchant_identifier: configuration.merchant_id()?.to_string(),
            country_code: configuration.merchant_country_code()?.to_string(),
            currency_code: details.currency.clone(),
            merchant_capabilities: configuration.merchant_capabilities()?.clone(),
            supported_networks: configuration.supported_networks()?.clone(),
            supported_countries: configuration.supported_countries().cloned(),
            payment_summary_items: vec![SummaryItem {
                label: merchant_name.to_string(),
                amount: details.amount,
                kind: details.status,
            }],
            required_billing_contact_fields: resolve_contact_fields(
                &details.billing_contacts,
                configuration.billing_supported_contacts(),
            ),
            required_shipping_contact_fields: resolve_contact_fields(
                &details.shipping_contacts,
                configuration.shipping_supported_contacts(),
            ),
        })
    }
}

/// Identifier of one triggered transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

/// Outcome of a single authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationStatus {
    /// The payment was accepted
    Success,
    /// The payment was rejected
    Failure,
}

/// Current phase of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionPhase {
    /// No transaction in flight
    Idle,
    /// Building the request and presenting the sheet
    Triggering(TransactionId),
    /// The sheet is shown, waiting for authorization and dismissal
    AwaitingAuthorization(TransactionId),
}

#[derive(Debug)]
enum SheetEvent {
    Authorized(Option<PaymentScope>),
    Dismissed,
}

/// Handle through which the payment sheet reports back for one transaction.
///
/// Clones address the same transaction. Once the transaction has resolved,
/// further events are ignored. Dropping every clone without calling
/// [`SheetHandle::dismiss`] counts as a dismissal.
#[derive(Debug, Clone)]
pub struct SheetHandle {
    transaction: TransactionId,
    gateway: &'static str,
    events: mpsc::UnboundedSender<SheetEvent>,
}

impl SheetHandle {
    /// Transaction this handle reports for.
    pub fn transaction(&self) -> TransactionId {
        self.transaction
    }

    /// Reports an authorized payment and returns its status.
    ///
    /// The status is `Failure` when no scope can be built from `payment` or
    /// when the transaction is no longer waiting.
    pub fn authorize(&self, payment: &AuthorizedPayment) -> AuthorizationStatus {
        let scope = PaymentScope::from_authorization(payment, self.gateway);
        let status = match scope {
            Some(_) => AuthorizationStatus::Success,
            None => AuthorizationStatus::Failure,
        };

        if self.events.send(SheetEvent::Authorized(scope)).is_err() {
            debug!(transaction = %self.transaction, "ignoring authorization for a resolved transaction");
            return AuthorizationStatus::Failure;
        }

        info!(transaction = %self.transaction, status = ?status, "payment authorized");
        status
    }

    /// Reports that the sheet was dismissed.
    pub fn dismiss(&self) {
        if self.events.send(SheetEvent::Dismissed).is_err() {
            debug!(transaction = %self.transaction, "ignoring dismissal for a resolved transaction");
        }
    }
}

/// Result slot of the transaction in flight.
#[derive(Debug, Default)]
struct ResultSlot {
    status: Option<AuthorizationStatus>,
    scope: Option<PaymentScope>,
}

#[derive(Debug)]
struct OrchestratorState {
    phase: TransactionPhase,
    next_transaction: u64,
    last_resolution: Option<AuthorizationStatus>,
}

/// Drives a single payment transaction at a time.
pub struct RequestOrchestrator {
    configuration: Arc<Configuration>,
    sheet: Arc<dyn PaymentSheet>,
    state: Mutex<OrchestratorState>,
}

impl RequestOrchestrator {
    /// Creates an idle orchestrator.
    pub fn new(configuration: Arc<Configuration>, sheet: Arc<dyn PaymentSheet>) -> Self {
        Self {
            configuration,
            sheet,
            state: Mutex::new(OrchestratorState {
                phase: TransactionPhase::Idle,
                next_transaction: 1,
                last_resolution: None,
            }),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> TransactionPhase {
        self.lock().phase
    }

    /// Status of the most recent resolution, if any transaction resolved.
    pub fn last_resolution(&self) -> Option<AuthorizationStatus> {
        self.lock().last_resolution
    }

    /// Runs one payment transaction.
    ///
    /// Resolves once the sheet is dismissed: with the scope of the last
    /// successful authorization, or [`PaymentsError::PaymentCancelled`] when
    /// there is none.
    ///
    /// # Errors
    ///
    /// * [`PaymentsError::PaymentAlreadyInProgress`] if another transaction is in flight
    /// * [`PaymentsError::InvalidConfiguration`] if the request cannot be built; the sheet is not presented
    /// * [`PaymentsError::PaymentTriggerPresentationFailed`] if the sheet cannot be shown
    /// * [`PaymentsError::PaymentCancelled`] if the sheet is dismissed without a successful authorization
    ///
    /// Dropping the returned future abandons the transaction and returns the
    /// orchestrator to idle.
    pub async fn trigger(&self, details: &PaymentDetails) -> Result<PaymentScope> {
        let transaction = self.begin()?;
        let id = transaction.id;
        debug!(transaction = %id, "triggering payment");

        let Some(request) = PaymentRequest::build(&self.configuration, details) else {
            warn!(transaction = %id, "payment request is missing required configuration");
            self.record(AuthorizationStatus::Failure);
            return Err(PaymentsError::InvalidConfiguration);
        };

        let (events, mut receiver) = mpsc::unbounded_channel();
        let handle = SheetHandle {
            transaction: id,
            gateway: self.configuration.service().gateway_tag(),
            events,
        };

        if let Err(e) = self.sheet.present(request, handle) {
            warn!(transaction = %id, error = %e, "payment sheet could not be presented");
            self.record(AuthorizationStatus::Failure);
            return Err(PaymentsError::PaymentTriggerPresentationFailed);
        }
        transaction.set_phase(TransactionPhase::AwaitingAuthorization(id));
        debug!(transaction = %id, "awaiting authorization");

        let mut slot = ResultSlot::default();
        while let Some(event) = receiver.recv().await {
            match event {
                SheetEvent::Authorized(Some(scope)) => {
                    slot.status = Some(AuthorizationStatus::Success);
                    slot.scope = Some(scope);
                }
                SheetEvent::Authorized(None) => {
                    slot.status = Some(AuthorizationStatus::Failure);
                    slot.scope = None;
                }
                SheetEvent::Dismissed => break,
            }
        }

        match (slot.status, slot.scope) {
            (Some(AuthorizationStatus::Success), Some(scope)) => {
                info!(transaction = %id, "payment resolved");
                self.record(AuthorizationStatus::Success);
                Ok(scope)
            }
            _ => {
                info!(transaction = %id, "payment cancelled");
                self.record(AuthorizationStatus::Failure);
                Err(PaymentsError::PaymentCancelled)
            }
        }
    }

    fn begin(&self) -> Result<ActiveTransaction<'_>> {
        let mut state = self.lock();
        if state.phase != TransactionPhase::Idle {
            warn!(phase = ?state.phase, "rejecting trigger while a payment is in flight");
            return Err(PaymentsError::PaymentAlreadyInProgress);
        }

        let id = TransactionId(state.next_transaction);
        state.next_transaction += 1;
        state.phase = TransactionPhase::Triggering(id);

        Ok(ActiveTransaction {
            orchestrator: self,
            id,
        })
    }

    fn record(&self, status: AuthorizationStatus) {
        self.lock().last_resolution = Some(status);
    }

    fn lock(&self) -> MutexGuard<'_, OrchestratorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for RequestOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOrchestrator")
            .field("service", &self.configuration.service())
            .field("phase", &self.phase())
            .finish()
    }
}

/// Returns the orchestrator to idle when the transaction ends, however it ends.
struct ActiveTransaction<'a> {
    orchestrator: &'a RequestOrchestrator,
    id: TransactionId,
}

impl ActiveTransaction<'_> {
    fn set_phase(&self, phase: TransactionPhase) {
        self.orchestrator.lock().phase = phase;
    }
}

impl Drop for ActiveTransaction<'_> {
    fn drop(&mut self) {
        self.set_phase(TransactionPhase::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigSource, WalletService};
    use crate::platform::simulated::{SheetScript, SimulatedDevice};
    use crate::types::ContactRequirement;
    use rust_decimal_macros::dec;

    fn source() -> ConfigSource {
        ConfigSource::new()
            .with("merchant_id", "merchant.com.example")
            .with("merchant_name", "Example Store")
            .with("merchant_country_code", "US")
            .with("payment_allowed_networks", "visa,amex")
            .with("payment_supported_capabilities", "3ds")
            .with("billing_supported_contacts", "name,email")
    }

    fn orchestrator(source: &ConfigSource, device: Arc<SimulatedDevice>) -> RequestOrchestrator {
        let configuration = Arc::new(Configuration::load(WalletService::GooglePay, source));
        RequestOrchestrator::new(configuration, device)
    }

    fn details() -> PaymentDetails {
        PaymentDetails::new(dec!(10.00), "USD", SettlementStatus::Final)
    }

    #[test]
    fn test_build_request() {
        let configuration = Configuration::load(WalletService::GooglePay, &source());
        let details = details().with_shipping_contacts(ContactRequirement::custom(["phone"]));

        let request = PaymentRequest::build(&configuration, &details).unwrap();
        assert_eq!(request.merchant_identifier, "merchant.com.example");
        assert_eq!(request.currency_code, "USD");
        assert_eq!(request.payment_summary_items.len(), 1);
        assert_eq!(request.payment_summary_items[0].label, "Example Store");
        assert_eq!(request.payment_summary_items[0].amount, dec!(10.00));
        assert!(request.supported_countries.is_none());
        assert_eq!(
            request.required_billing_contact_fields,
            BTreeSet::from([ContactField::Email, ContactField::Name])
        );
        assert_eq!(
            request.required_shipping_contact_fields,
            BTreeSet::from([ContactField::Phone])
        );
    }

    #[test]
    fn test_build_request_with_card_countries() {
        let source = source().with("payment_supported_card_countries", "US, PT, US");
        let configuration = Configuration::load(WalletService::GooglePay, &source);

        let request = PaymentRequest::build(&configuration, &details()).unwrap();
        assert_eq!(
            request.supported_countries,
            Some(BTreeSet::from(["PT".to_string(), "US".to_string()]))
        );
    }

    #[test]
    fn test_build_request_requires_merchant_fields() {
        let source = source().with("payment_allowed_networks", "unionpay");
        let configuration = Configuration::load(WalletService::GooglePay, &source);

        assert!(PaymentRequest::build(&configuration, &details()).is_none());
    }

    #[tokio::test]
    async fn test_trigger_success() {
        let payment = AuthorizedPayment::new("tok_abc", "Visa 1111");
        let device = Arc::new(SimulatedDevice::new().with_script(SheetScript::Authorize(payment)));
        let orchestrator = orchestrator(&source(), device.clone());

        let scope = orchestrator.trigger(&details()).await.unwrap();
        assert_eq!(scope.payment_data.token_data.token, "tok_abc");
        assert_eq!(scope.payment_data.token_data.gateway, "Google Pay");
        assert_eq!(scope.payment_data.card_details.as_deref(), Some("1111"));
        assert_eq!(orchestrator.phase(), TransactionPhase::Idle);
        assert_eq!(orchestrator.last_resolution(), Some(AuthorizationStatus::Success));
        assert_eq!(device.presentations(), 1);
    }

    #[tokio::test]
    async fn test_invalid_configuration_never_presents() {
        let device = Arc::new(SimulatedDevice::new());
        let source = source().with("merchant_name", "");
        let orchestrator = orchestrator(&source, device.clone());

        let result = orchestrator.trigger(&details()).await;
        assert_eq!(result, Err(PaymentsError::InvalidConfiguration));
        assert_eq!(device.presentations(), 0);
        assert_eq!(orchestrator.phase(), TransactionPhase::Idle);
        assert_eq!(orchestrator.last_resolution(), Some(AuthorizationStatus::Failure));
    }

    #[tokio::test]
    async fn test_dismissal_without_authorization_cancels() {
        let device = Arc::new(SimulatedDevice::new().with_script(SheetScript::Cancel));
        let orchestrator = orchestrator(&source(), device);

        let result = orchestrator.trigger(&details()).await;
        assert_eq!(result, Err(PaymentsError::PaymentCancelled));
        assert_eq!(orchestrator.last_resolution(), Some(AuthorizationStatus::Failure));
    }

    #[tokio::test]
    async fn test_failed_authorization_cancels() {
        let payment = AuthorizedPayment {
            token_data: vec![0xc3, 0x28],
            ..Default::default()
        };
        let device = Arc::new(SimulatedDevice::new().with_script(SheetScript::Authorize(payment)));
        let orchestrator = orchestrator(&source(), device);

        let result = orchestrator.trigger(&details()).await;
        assert_eq!(result, Err(PaymentsError::PaymentCancelled));
    }

    #[tokio::test]
    async fn test_presentation_failure() {
        let device = Arc::new(SimulatedDevice::new().with_script(SheetScript::Refuse));
        let orchestrator = orchestrator(&source(), device.clone());

        let result = orchestrator.trigger(&details()).await;
        assert_eq!(result, Err(PaymentsError::PaymentTriggerPresentationFailed));
        assert_eq!(orchestrator.phase(), TransactionPhase::Idle);
        assert_eq!(device.presentations(), 1);
    }

    #[tokio::test]
    async fn test_abandoned_sheet_counts_as_dismissal() {
        let device = Arc::new(SimulatedDevice::new().with_script(SheetScript::Abandon));
        let orchestrator = orchestrator(&source(), device);

        let result = orchestrator.trigger(&details()).await;
        assert_eq!(result, Err(PaymentsError::PaymentCancelled));
    }

    #[tokio::test]
    async fn test_last_authorization_wins() {
        let device = Arc::new(SimulatedDevice::new().with_script(SheetScript::Hold));
        let orchestrator = Arc::new(orchestrator(&source(), device.clone()));

        let task = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.trigger(&details()).await })
        };

        let handle = loop {
            if let Some(handle) = device.take_handle() {
                break handle;
            }
            tokio::task::yield_now().await;
        };

        let bad = AuthorizedPayment {
            token_data: vec![0xff],
            ..Default::default()
        };
        assert_eq!(handle.authorize(&bad), AuthorizationStatus::Failure);
        let good = AuthorizedPayment::new("tok_retry", "Amex 0005");
        assert_eq!(handle.authorize(&good), AuthorizationStatus::Success);
        handle.dismiss();

        let scope = task.await.unwrap().unwrap();
        assert_eq!(scope.payment_data.token_data.token, "tok_retry");

        // The transaction is resolved; late events are ignored.
        assert_eq!(handle.authorize(&good), AuthorizationStatus::Failure);
        handle.dismiss();
        assert_eq!(orchestrator.phase(), TransactionPhase::Idle);
    }

    #[tokio::test]
    async fn test_second_trigger_is_rejected() {
        let device = Arc::new(SimulatedDevice::new().with_script(SheetScript::Hold));
        let orchestrator = Arc::new(orchestrator(&source(), device.clone()));

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.trigger(&details()).await })
        };

        let handle = loop {
            if let Some(handle) = device.take_handle() {
                break handle;
            }
            tokio::task::yield_now().await;
        };

        let second = orchestrator.trigger(&details()).await;
        assert_eq!(second, Err(PaymentsError::PaymentAlreadyInProgress));
        assert!(matches!(
            orchestrator.phase(),
            TransactionPhase::AwaitingAuthorization(id) if id == handle.transaction()
        ));

        handle.dismiss();
        assert_eq!(first.await.unwrap(), Err(PaymentsError::PaymentCancelled));
        assert_eq!(orchestrator.phase(), TransactionPhase::Idle);
    }

    #[test]
    fn test_dropped_trigger_returns_to_idle() {
        let device = Arc::new(SimulatedDevice::new().with_script(SheetScript::Hold));
        let orchestrator = orchestrator(&source(), device.clone());
        let details = details();

        let mut pending = tokio_test::task::spawn(orchestrator.trigger(&details));
        tokio_test::assert_pending!(pending.poll());
        assert!(matches!(orchestrator.phase(), TransactionPhase::AwaitingAuthorization(_)));
        drop(pending);

        assert_eq!(orchestrator.phase(), TransactionPhase::Idle);
        let handle = device.take_handle().unwrap();
        assert_eq!(
            handle.authorize(&AuthorizedPayment::new("tok", "Visa 1")),
            AuthorizationStatus::Failure
        );
    }
}
