//! Wire codec for payment details and payment scope.
//!
//! Serde errors are logged and mapped onto the error taxonomy; the payloads
//! themselves are never logged.

use crate::errors::{PaymentsError, Result};
use crate::platform::{AuthorizedPayment, PlatformContact, PostalAddress};
use crate::types::{
    Address, ContactField, ContactInfo, ContactRequirement, PaymentData, PaymentDetails,
    PaymentScope, TokenInfo,
};
use std::collections::BTreeSet;
use tracing::debug;

/// Decodes the payment details text received from the host.
///
/// Fails with [`PaymentsError::InvalidDecodeDetails`] on invalid JSON, a
/// missing or malformed field, a negative amount or a currency that is not a
/// three-letter code.
///
/// # Examples
///
/// ```
/// use wallet_pay::codec::decode_details;
/// use wallet_pay::PaymentsError;
///
/// let details = decode_details(r#"{"amount":"10.00","currency":"USD","status":"final"}"#).unwrap();
/// assert_eq!(details.currency, "USD");
///
/// let err = decode_details(r#"{"amount":"10.00","status":"final"}"#).unwrap_err();
/// assert_eq!(err, PaymentsError::InvalidDecodeDetails);
/// ```
pub fn decode_details(text: &str) -> Result<PaymentDetails> {
    let details: PaymentDetails = serde_json::from_str(text).map_err(|e| {
        debug!(error = %e, "payment details did not match the wire schema");
        PaymentsError::InvalidDecodeDetails
    })?;

    if !details.is_valid() {
        debug!("payment details failed amount or currency validation");
        return Err(PaymentsError::InvalidDecodeDetails);
    }

    Ok(details)
}

/// Encodes a payment scope into its wire text.
pub fn encode_scope(scope: &PaymentScope) -> Result<String> {
    serde_json::to_string(scope).map_err(|e| {
        debug!(error = %e, "payment scope could not be encoded");
        PaymentsError::InvalidEncodeScope
    })
}

/// Resolves which contact fields to request.
///
/// A custom requirement with a list uses that list; anything else falls back
/// to `configured`. Tokens are matched case-insensitively and unknown tokens
/// are dropped.
pub fn resolve_contact_fields(
    requirement: &ContactRequirement,
    configured: Option<&[String]>,
) -> BTreeSet<ContactField> {
    let tokens = match (&requirement.contact_info, requirement.is_custom) {
        (Some(list), true) => Some(list.as_slice()),
        _ => configured,
    };

    tokens
        .unwrap_or_default()
        .iter()
        .filter_map(|token| ContactField::from_token(token))
        .collect()
}

impl PaymentScope {
    /// Builds the scope for an authorized payment.
    ///
    /// Returns `None` when the token is not valid UTF-8. The card network and
    /// last-four labels are the first and last words of the method label, so
    /// a single word fills both; when the label is missing or blank both are
    /// left out.
    pub fn from_authorization(payment: &AuthorizedPayment, gateway: &str) -> Option<Self> {
        let token = String::from_utf8(payment.token_data.clone()).ok()?;
        let (card_network, card_details) = split_method_label(payment.method_display_name.as_deref());

        Some(Self {
            payment_data: PaymentData {
                token_data: TokenInfo {
                    token,
                    gateway: gateway.to_string(),
                },
                card_details,
                card_network,
                billing_info: payment.billing_contact.as_ref().and_then(contact_info),
            },
            shipping_info: payment.shipping_contact.as_ref().and_then(contact_info),
        })
    }
}

/// Splits `"Visa 1234"` into the network and last-four labels.
fn split_method_label(label: Option<&str>) -> (Option<String>, Option<String>) {
    let mut tokens = label.unwrap_or_default().split_whitespace();
    let Some(network) = tokens.next() else {
        return (None, None);
    };

    let details = tokens.last().unwrap_or(network);
    (Some(network.to_string()), Some(details.to_string()))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

fn contact_info(contact: &PlatformContact) -> Option<ContactInfo> {
    let name = match (non_empty(&contact.given_name), non_empty(&contact.family_name)) {
        (Some(given), Some(family)) => Some(format!("{} {}", given, family)),
        _ => None,
    };

    let info = ContactInfo {
        address: contact.postal_address.as_ref().map(address),
        phone_number: non_empty(&contact.phone_number),
        name,
        email: non_empty(&contact.email_address),
    };

    (!info.is_empty()).then_some(info)
}

fn address(postal: &PostalAddress) -> Address {
    let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());

    Address {
        postal_code: postal.postal_code.clone(),
        full_address: postal.street.clone(),
        country_code: postal.iso_country_code.clone(),
        city: postal.city.clone(),
        administrative_area: optional(&postal.sub_administrative_area),
        state: optional(&postal.state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SettlementStatus;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decode_sample_details() {
        let text = json!({
            "amount": "10.00",
            "currency": "USD",
            "status": "final",
            "shippingContacts": {"isCustom": false},
            "billingContacts": {"isCustom": false}
        })
        .to_string();

        let details = decode_details(&text).unwrap();
        assert_eq!(details.amount, dec!(10.00));
        assert_eq!(details.currency, "USD");
        assert_eq!(details.status, SettlementStatus::Final);
    }

    #[test]
    fn test_decode_rejects_invalid_details() {
        let cases = [
            "not json",
            r#"{"currency":"USD","status":"final"}"#,
            r#"{"amount":"10.00","status":"final"}"#,
            r#"{"amount":"10.00","currency":"USD"}"#,
            r#"{"amount":"1O.00","currency":"USD","status":"final"}"#,
            r#"{"amount":"1_000","currency":"USD","status":"final"}"#,
            r#"{"amount":"0.0000000000000000000000000000001","currency":"USD","status":"final"}"#,
            r#"{"amount":"","currency":"USD","status":"final"}"#,
            r#"{"amount":"-1.00","currency":"USD","status":"final"}"#,
            r#"{"amount":"10.00","currency":"DOLLARS","status":"final"}"#,
            r#"{"amount":"10.00","currency":"USD","status":"settled"}"#,
        ];

        for text in cases {
            assert_eq!(
                decode_details(text),
                Err(PaymentsError::InvalidDecodeDetails),
                "{} should not decode",
                text
            );
        }
    }

    #[test]
    fn test_encode_then_decode_required_fields_only() {
        let scope = PaymentScope {
            payment_data: PaymentData {
                token_data: TokenInfo {
                    token: "opaque".to_string(),
                    gateway: "Apple Pay".to_string(),
                },
                card_details: None,
                card_network: None,
                billing_info: None,
            },
            shipping_info: None,
        };

        let text = encode_scope(&scope).unwrap();
        let decoded: PaymentScope = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, scope);
    }

    #[test]
    fn test_resolve_custom_contact_fields() {
        let requirement = ContactRequirement::custom(["Email", "phone", "fax", "email"]);
        let configured = vec!["name".to_string()];
        let fields = resolve_contact_fields(&requirement, Some(configured.as_slice()));

        assert_eq!(
            fields.into_iter().collect::<Vec<_>>(),
            vec![ContactField::Email, ContactField::Phone]
        );
    }

    #[test]
    fn test_resolve_falls_back_to_configured() {
        let configured = vec!["postal_address".to_string(), "name".to_string()];

        let fields = resolve_contact_fields(&ContactRequirement::configured(), Some(configured.as_slice()));
        assert!(fields.contains(&ContactField::PostalAddress));
        assert!(fields.contains(&ContactField::Name));

        let custom_without_list = ContactRequirement {
            is_custom: true,
            contact_info: None,
        };
        assert_eq!(resolve_contact_fields(&custom_without_list, Some(configured.as_slice())).len(), 2);

        let ignored_list = ContactRequirement {
            is_custom: false,
            contact_info: Some(vec!["email".to_string()]),
        };
        assert!(!resolve_contact_fields(&ignored_list, Some(configured.as_slice())).contains(&ContactField::Email));

        assert!(resolve_contact_fields(&ContactRequirement::configured(), None).is_empty());
    }

    #[test]
    fn test_scope_from_authorization() {
        let contact = PlatformContact {
            postal_address: Some(PostalAddress {
                street: "1 Infinite Loop".to_string(),
                city: "Cupertino".to_string(),
                state: "CA".to_string(),
                postal_code: "95014".to_string(),
                iso_country_code: "US".to_string(),
                sub_administrative_area: String::new(),
            }),
            phone_number: Some("+1 555 0100".to_string()),
            given_name: Some("Ada".to_string()),
            family_name: Some("Lovelace".to_string()),
            email_address: None,
        };
        let payment = AuthorizedPayment::new("tok_123", "Visa 4242").with_billing_contact(contact);

        let scope = PaymentScope::from_authorization(&payment, "Apple Pay").unwrap();
        let data = &scope.payment_data;
        assert_eq!(data.token_data.token, "tok_123");
        assert_eq!(data.token_data.gateway, "Apple Pay");
        assert_eq!(data.card_network.as_deref(), Some("Visa"));
        assert_eq!(data.card_details.as_deref(), Some("4242"));
        assert!(scope.shipping_info.is_none());

        let billing = data.billing_info.as_ref().unwrap();
        assert_eq!(billing.name.as_deref(), Some("Ada Lovelace"));
        assert!(billing.email.is_none());

        let address = billing.address.as_ref().unwrap();
        assert_eq!(address.full_address, "1 Infinite Loop");
        assert_eq!(address.state.as_deref(), Some("CA"));
        assert!(address.administrative_area.is_none());
    }

    #[test]
    fn test_partial_name_and_empty_contact_are_omitted() {
        let partial = PlatformContact {
            given_name: Some("Ada".to_string()),
            email_address: Some("ada@example.com".to_string()),
            ..Default::default()
        };
        let payment = AuthorizedPayment::new("tok", "Amex 0005")
            .with_billing_contact(partial)
            .with_shipping_contact(PlatformContact::default());

        let scope = PaymentScope::from_authorization(&payment, "Google Pay").unwrap();
        let billing = scope.payment_data.billing_info.unwrap();
        assert!(billing.name.is_none());
        assert_eq!(billing.email.as_deref(), Some("ada@example.com"));
        assert!(scope.shipping_info.is_none());
    }

    #[test]
    fn test_method_label_is_best_effort() {
        assert_eq!(split_method_label(None), (None, None));
        assert_eq!(split_method_label(Some("   ")), (None, None));
        assert_eq!(
            split_method_label(Some("Visa")),
            (Some("Visa".to_string()), Some("Visa".to_string()))
        );
        assert_eq!(
            split_method_label(Some("MasterCard Debit 5100")),
            (Some("MasterCard".to_string()), Some("5100".to_string()))
        );
    }

    #[test]
    fn test_non_utf8_token_fails() {
        let payment = AuthorizedPayment {
            token_data: vec![0xff, 0xfe],
            ..Default::default()
        };

        assert!(PaymentScope::from_authorization(&payment, "Apple Pay").is_none());
    }
}
