//! Boundary facade.
//!
//! The bridge layer receives string-encoded calls from the host UI and
//! forwards them to [`Payments`]. Every operation reports through the
//! [`CallbackDelegate`] exactly once: a result text, an error, or neither
//! for a bare success.

use crate::codec::{decode_details, encode_scope};
use crate::errors::PaymentsError;
use crate::handler::PaymentHandler;
use tracing::info;

/// Receives the outcome of every boundary operation.
pub trait CallbackDelegate: Send + Sync {
    /// Delivers an outcome. At most one of `result` and `error` is set.
    fn callback(&self, result: Option<String>, error: Option<PaymentsError>);

    /// Delivers a successful result text.
    fn callback_result(&self, result: String) {
        self.callback(Some(result), None);
    }

    /// Delivers a failure.
    fn callback_error(&self, error: PaymentsError) {
        self.callback(None, Some(error));
    }

    /// Delivers a success without payload.
    fn callback_success(&self) {
        self.callback(None, None);
    }
}

/// Entry point for the bridge layer.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use wallet_pay::config::{ConfigSource, Configuration, WalletService};
/// use wallet_pay::handler::WalletHandler;
/// use wallet_pay::payments::{CallbackDelegate, Payments};
/// use wallet_pay::platform::simulated::SimulatedDevice;
/// use wallet_pay::PaymentsError;
///
/// struct Printer;
///
/// impl CallbackDelegate for Printer {
///     fn callback(&self, result: Option<String>, error: Option<PaymentsError>) {
///         match (result, error) {
///             (_, Some(error)) => println!("{}", serde_json::to_string(&error.payload()).unwrap()),
///             (Some(result), None) => println!("{}", result),
///             (None, None) => println!("ok"),
///         }
///     }
/// }
///
/// let source = ConfigSource::new().with("merchant_name", "Example Store");
/// let configuration = Arc::new(Configuration::load(WalletService::GooglePay, &source));
/// let handler = WalletHandler::with_device(configuration, Arc::new(SimulatedDevice::new()));
///
/// let payments = Payments::new(handler, Printer);
/// payments.setup_configuration(); // prints {"code":"OS-PLUG-PMT-0001",...}
/// ```
pub struct Payments<D> {
    handler: Box<dyn PaymentHandler>,
    delegate: D,
}

impl<D: CallbackDelegate> Payments<D> {
    /// Creates the facade over `handler`, reporting to `delegate`.
    pub fn new(handler: impl PaymentHandler + 'static, delegate: D) -> Self {
        Self {
            handler: Box::new(handler),
            delegate,
        }
    }

    /// The delegate receiving the outcomes.
    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// Reports the canonical configuration snapshot.
    pub fn setup_configuration(&self) {
        match self.handler.setup_configuration() {
            Ok(snapshot) => self.delegate.callback_result(snapshot),
            Err(error) => self.report(error),
        }
    }

    /// Reports whether the device can pay with the configured setup.
    pub fn check_wallet_setup(&self) {
        match self.handler.check_wallet_availability() {
            Ok(()) => self.delegate.callback_success(),
            Err(error) => self.report(error),
        }
    }

    /// Decodes `details`, runs the transaction and reports the encoded scope.
    pub async fn set_details(&self, details: &str) {
        let outcome = match decode_details(details) {
            Ok(details) => self.handler.set_details(details).await,
            Err(error) => Err(error),
        };

        match outcome.and_then(|scope| encode_scope(&scope)) {
            Ok(scope) => {
                info!("payment completed");
                self.delegate.callback_result(scope);
            }
            Err(error) => self.report(error),
        }
    }

    fn report(&self, error: PaymentsError) {
        info!(code = %error.formatted_code(), "payment operation failed");
        self.delegate.callback_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentDetails, PaymentScope};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(Option<String>, Option<PaymentsError>)>>,
    }

    impl CallbackDelegate for Recorder {
        fn callback(&self, result: Option<String>, error: Option<PaymentsError>) {
            self.calls.lock().unwrap().push((result, error));
        }
    }

    struct Unconfigured;

    #[async_trait]
    impl PaymentHandler for Unconfigured {
        fn setup_configuration(&self) -> crate::Result<String> {
            Err(PaymentsError::InvalidConfiguration)
        }

        fn check_wallet_availability(&self) -> crate::Result<()> {
            Ok(())
        }

        async fn set_details(&self, _details: PaymentDetails) -> crate::Result<PaymentScope> {
            panic!("details must not reach the handler");
        }
    }

    #[test]
    fn test_each_operation_calls_back_once() {
        let payments = Payments::new(Unconfigured, Recorder::default());

        payments.setup_configuration();
        payments.check_wallet_setup();

        let calls = payments.delegate().calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], (None, Some(PaymentsError::InvalidConfiguration)));
        assert_eq!(calls[1], (None, None));
    }

    #[tokio::test]
    async fn test_undecodable_details_never_reach_handler() {
        let payments = Payments::new(Unconfigured, Recorder::default());

        payments.set_details("{\"amount\":\"10.00\"}").await;

        let calls = payments.delegate().calls.lock().unwrap();
        assert_eq!(*calls, vec![(None, Some(PaymentsError::InvalidDecodeDetails))]);
    }
}
