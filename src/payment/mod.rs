//! Payment method capture. Nothing here charges anyone; methods are
//! validated and summarized for the booking record.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Only the last four digits are ever accepted or stored.
    Card {
        cardholder_name: String,
        last4: String,
        expiry_month: u32,
        expiry_year: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        brand: Option<String>,
    },
    Cash,
    Invoice {
        company_name: String,
        billing_email: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        po_number: Option<String>,
    },
    CorporateAccount {
        account_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    Card,
    Cash,
    Invoice,
    CorporateAccount,
}

impl PaymentMethod {
    pub fn kind(&self) -> PaymentMethodKind {
        match self {
            PaymentMethod::Card { .. } => PaymentMethodKind::Card,
            PaymentMethod::Cash => PaymentMethodKind::Cash,
            PaymentMethod::Invoice { .. } => PaymentMethodKind::Invoice,
            PaymentMethod::CorporateAccount { .. } => PaymentMethodKind::CorporateAccount,
        }
    }
}

pub type Validator = fn(&PaymentMethod, NaiveDate) -> Result<(), String>;
pub type Renderer = fn(&PaymentMethod) -> String;

#[derive(Clone, Copy)]
pub struct PaymentHandler {
    pub validate: Validator,
    pub render: Renderer,
}

/// Maps each payment method to its validator and summary renderer.
#[derive(Clone)]
pub struct PaymentRegistry {
    handlers: HashMap<PaymentMethodKind, PaymentHandler>,
}

impl Default for PaymentRegistry {
    fn default() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };
        registry.register(
            PaymentMethodKind::Card,
            PaymentHandler {
                validate: validate_card,
                render: render_card,
            },
        );
        registry.register(
            PaymentMethodKind::Cash,
            PaymentHandler {
                validate: |_, _| Ok(()),
                render: |_| "Cash to driver".to_string(),
            },
        );
        registry.register(
            PaymentMethodKind::Invoice,
            PaymentHandler {
                validate: validate_invoice,
                render: render_invoice,
            },
        );
        registry.register(
            PaymentMethodKind::CorporateAccount,
            PaymentHandler {
                validate: validate_corporate_account,
                render: render_corporate_account,
            },
        );
        registry
    }
}

impl PaymentRegistry {
    pub fn register(&mut self, kind: PaymentMethodKind, handler: PaymentHandler) {
        self.handlers.insert(kind, handler);
    }

    pub fn is_supported(&self, kind: PaymentMethodKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn validate(&self, method: &PaymentMethod, today: NaiveDate) -> Result<(), String> {
        let handler = self.handler(method)?;
        (handler.validate)(method, today)
    }

    pub fn render(&self, method: &PaymentMethod) -> Result<String, String> {
        let handler = self.handler(method)?;
        Ok((handler.render)(method))
    }

    fn handler(&self, method: &PaymentMethod) -> Result<&PaymentHandler, String> {
        self.handlers
            .get(&method.kind())
            .ok_or_else(|| format!("Payment method {:?} is not accepted", method.kind()))
    }
}

fn mismatch(expected: PaymentMethodKind, method: &PaymentMethod) -> String {
    format!(
        "{:?} handler cannot process {:?} payment",
        expected,
        method.kind()
    )
}

fn validate_card(method: &PaymentMethod, today: NaiveDate) -> Result<(), String> {
    let PaymentMethod::Card {
        cardholder_name,
        last4,
        expiry_month,
        expiry_year,
        ..
    } = method
    else {
        return Err(mismatch(PaymentMethodKind::Card, method));
    };

    if cardholder_name.trim().is_empty() {
        return Err("Cardholder name is required".to_string());
    }
    if last4.len() != 4 || !last4.chars().all(|c| c.is_ascii_digit()) {
        return Err("Card number must be given as its last four digits".to_string());
    }
    if !(1..=12).contains(expiry_month) {
        return Err("Card expiry month must be between 1 and 12".to_string());
    }
    // Cards are valid through the end of their expiry month.
    if (*expiry_year, *expiry_month) < (today.year(), today.month()) {
        return Err("Card has expired".to_string());
    }
    Ok(())
}

fn render_card(method: &PaymentMethod) -> String {
    match method {
        PaymentMethod::Card {
            last4,
            expiry_month,
            expiry_year,
            brand,
            ..
        } => format!(
            "{} ending in {} (exp {:02}/{:02})",
            brand.as_deref().unwrap_or("Card"),
            last4,
            expiry_month,
            expiry_year % 100
        ),
        other => mismatch(PaymentMethodKind::Card, other),
    }
}

fn validate_invoice(method: &PaymentMethod, _today: NaiveDate) -> Result<(), String> {
    let PaymentMethod::Invoice {
        company_name,
        billing_email,
        ..
    } = method
    else {
        return Err(mismatch(PaymentMethodKind::Invoice, method));
    };

    if company_name.trim().is_empty() {
        return Err("Company name is required for invoicing".to_string());
    }
    if !is_plausible_email(billing_email) {
        return Err("A valid billing email is required for invoicing".to_string());
    }
    Ok(())
}

fn render_invoice(method: &PaymentMethod) -> String {
    match method {
        PaymentMethod::Invoice {
            company_name,
            po_number: Some(po),
            ..
        } => format!("Invoice to {} (PO {})", company_name, po),
        PaymentMethod::Invoice { company_name, .. } => format!("Invoice to {}", company_name),
        other => mismatch(PaymentMethodKind::Invoice, other),
    }
}

fn validate_corporate_account(method: &PaymentMethod, _today: NaiveDate) -> Result<(), String> {
    let PaymentMethod::CorporateAccount { account_id } = method else {
        return Err(mismatch(PaymentMethodKind::CorporateAccount, method));
    };

    let valid = !account_id.is_empty()
        && account_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid {
        return Err("Corporate account id must be letters, digits or dashes".to_string());
    }
    Ok(())
}

fn render_corporate_account(method: &PaymentMethod) -> String {
    match method {
        PaymentMethod::CorporateAccount { account_id } => {
            format!("Corporate account {}", account_id)
        }
        other => mismatch(PaymentMethodKind::CorporateAccount, other),
    }
}

pub(crate) fn is_plausible_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn card(last4: &str, month: u32, year: i32) -> PaymentMethod {
        PaymentMethod::Card {
            cardholder_name: "Ada Lovelace".to_string(),
            last4: last4.to_string(),
            expiry_month: month,
            expiry_year: year,
            brand: Some("Visa".to_string()),
        }
    }

    #[test]
    fn test_card_validation() {
        let registry = PaymentRegistry::default();

        assert!(registry.validate(&card("4242", 10, 2026), today()).is_ok());
        assert!(registry.validate(&card("4242", 9, 2026), today()).is_err());
        assert!(registry.validate(&card("42a2", 10, 2027), today()).is_err());
        assert!(registry.validate(&card("4242424242424242", 10, 2027), today()).is_err());
        assert!(registry.validate(&card("4242", 13, 2027), today()).is_err());
    }

    #[test]
    fn test_render_summaries() {
        let registry = PaymentRegistry::default();

        assert_eq!(
            registry.render(&card("4242", 3, 2028)).unwrap(),
            "Visa ending in 4242 (exp 03/28)"
        );
        assert_eq!(registry.render(&PaymentMethod::Cash).unwrap(), "Cash to driver");
        assert_eq!(
            registry
                .render(&PaymentMethod::Invoice {
                    company_name: "Acme".to_string(),
                    billing_email: "ap@acme.com".to_string(),
                    po_number: Some("PO-7".to_string()),
                })
                .unwrap(),
            "Invoice to Acme (PO PO-7)"
        );
    }

    #[test]
    fn test_invoice_and_account_validation() {
        let registry = PaymentRegistry::default();

        let invoice = PaymentMethod::Invoice {
            company_name: "Acme".to_string(),
            billing_email: "not-an-email".to_string(),
            po_number: None,
        };
        assert!(registry.validate(&invoice, today()).is_err());

        let account = PaymentMethod::CorporateAccount {
            account_id: "ACME-001".to_string(),
        };
        assert!(registry.validate(&account, today()).is_ok());

        let bad_account = PaymentMethod::CorporateAccount {
            account_id: "ACME 001".to_string(),
        };
        assert!(registry.validate(&bad_account, today()).is_err());
    }

    #[test]
    fn test_unregistered_method_is_rejected() {
        let mut registry = PaymentRegistry {
            handlers: HashMap::new(),
        };
        assert!(registry.validate(&PaymentMethod::Cash, today()).is_err());

        registry.register(
            PaymentMethodKind::Cash,
            PaymentHandler {
                validate: |_, _| Ok(()),
                render: |_| "cash".to_string(),
            },
        );
        assert!(registry.is_supported(PaymentMethodKind::Cash));
        assert!(registry.validate(&PaymentMethod::Cash, today()).is_ok());
    }

    #[test]
    fn test_tagged_json_shape() {
        let json = serde_json::json!({ "method": "corporate_account", "account_id": "X-1" });
        let method: PaymentMethod = serde_json::from_value(json).unwrap();
        assert_eq!(method.kind(), PaymentMethodKind::CorporateAccount);

        let cash = serde_json::to_value(PaymentMethod::Cash).unwrap();
        assert_eq!(cash, serde_json::json!({ "method": "cash" }));
    }
}
