//! Order commands.

use serde::Deserialize;

use super::{ValidationError, validate_fields};

/// Command to create a new order.
///
/// Also the request payload accepted at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateOrder {
    /// Email of the customer placing the order.
    pub customer_email: String,

    /// Amount in minor currency units.
    pub amount_cents: i64,
}

impl CreateOrder {
    /// Creates a new CreateOrder command.
    pub fn new(customer_email: impl Into<String>, amount_cents: i64) -> Self {
        Self {
            customer_email: customer_email.into(),
            amount_cents,
        }
    }

    /// Validates the command input.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.customer_email, self.amount_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_command_passes() {
        assert!(CreateOrder::new("a@b.com", 500).validate().is_ok());
    }

    #[test]
    fn blank_email_is_required() {
        assert_eq!(
            CreateOrder::new("   ", 500).validate(),
            Err(ValidationError::EmailRequired)
        );
    }

    #[test]
    fn email_without_at_sign_is_invalid() {
        assert_eq!(
            CreateOrder::new("ab.com", 500).validate(),
            Err(ValidationError::EmailInvalid)
        );
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert_eq!(
            CreateOrder::new("a@b.com", -1).validate(),
            Err(ValidationError::AmountNotPositive { amount_cents: -1 })
        );
    }

    #[test]
    fn deserializes_from_request_payload() {
        let cmd: CreateOrder =
            serde_json::from_str(r#"{"customer_email":"a@b.com","amount_cents":500}"#).unwrap();
        assert_eq!(cmd, CreateOrder::new("a@b.com", 500));
    }
}
