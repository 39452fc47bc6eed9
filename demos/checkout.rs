//! Example checkout against a simulated device.
//!
//! This example runs the three boundary operations the way a host bridge
//! would: setup the configuration, check the wallet, then pay.
//!
//! Run with:
//! ```bash
//! cargo run --example checkout
//! ```
//!
//! Environment variables:
//! - WALLET_PAY_CONFIG: Path to a plugin configuration document
//! - WALLET_PAY_DETAILS: Payment details JSON to pay with

use anyhow::Context;
use serde_json::json;
use std::sync::Arc;
use wallet_pay::config::{ConfigSource, Configuration, WalletService};
use wallet_pay::handler::WalletHandler;
use wallet_pay::payments::{CallbackDelegate, Payments};
use wallet_pay::platform::simulated::{SheetScript, SimulatedDevice};
use wallet_pay::platform::{AuthorizedPayment, PlatformContact};
use wallet_pay::PaymentsError;

struct ConsoleBridge;

impl CallbackDelegate for ConsoleBridge {
    fn callback(&self, result: Option<String>, error: Option<PaymentsError>) {
        match (result, error) {
            (_, Some(error)) => match serde_json::to_string(&error.payload()) {
                Ok(payload) => println!("   ❌ {}", payload),
                Err(e) => println!("   ❌ {} ({})", error.formatted_code(), e),
            },
            (Some(result), None) => println!("   ✅ {}", result),
            (None, None) => println!("   ✅ ok"),
        }
    }
}

fn default_document() -> String {
    json!({
        "app_configurations": [{
            "service_id": "1",
            "merchant_id": "merchant.com.example.shop",
            "merchant_name": "Example Shop",
            "merchant_country_code": "PT",
            "payment_allowed_networks": ["visa", "mastercard", "amex"],
            "payment_supported_capabilities": ["3ds", "debit", "credit"],
            "payment_supported_card_countries": ["PT", "ES"],
            "shipping_supported_contacts": ["name", "postal_address"],
            "billing_supported_contacts": ["email"]
        }]
    })
    .to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let document = match std::env::var("WALLET_PAY_CONFIG") {
        Ok(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading configuration document {}", path))?,
        Err(_) => default_document(),
    };
    let details = std::env::var("WALLET_PAY_DETAILS").unwrap_or_else(|_| {
        json!({"amount": "24.90", "currency": "EUR", "status": "final"}).to_string()
    });

    let source = ConfigSource::from_plugin_document(&document, WalletService::ApplePay)?;
    let configuration = Arc::new(Configuration::load(WalletService::ApplePay, &source));

    let contact = PlatformContact {
        given_name: Some("Ada".to_string()),
        family_name: Some("Lovelace".to_string()),
        email_address: Some("ada@example.com".to_string()),
        ..Default::default()
    };
    let payment = AuthorizedPayment::new("demo-token", "Visa 4242")
        .with_billing_contact(contact.clone())
        .with_shipping_contact(contact);
    let device = SimulatedDevice::new().with_script(SheetScript::Authorize(payment));

    let payments = Payments::new(
        WalletHandler::with_device(configuration, Arc::new(device)),
        ConsoleBridge,
    );

    println!("🛒 wallet-pay checkout");
    println!();

    println!("1. setupConfiguration");
    payments.setup_configuration();

    println!("2. checkWalletSetup");
    payments.check_wallet_setup();

    println!("3. setDetails {}", details);
    payments.set_details(&details).await;

    Ok(())
}
