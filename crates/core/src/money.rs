//! Monetary amounts.
//!
//! Amounts are exact decimals in the platform's single display currency. On the
//! wire they are plain JSON numbers.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

pub type Amount = Decimal;

/// Reject zero and negative amounts for `field`.
pub fn ensure_positive(amount: Amount, field: &str) -> DomainResult<Amount> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::validation(format!("{field} must be positive")));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_amounts_pass() {
        assert_eq!(ensure_positive(Decimal::from(40), "amount").unwrap(), Decimal::from(40));
    }

    #[test]
    fn zero_and_negative_amounts_fail() {
        assert!(ensure_positive(Decimal::ZERO, "amount").is_err());
        assert!(ensure_positive(Decimal::from(-1), "amount").is_err());
    }
}
