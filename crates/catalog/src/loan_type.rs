use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use finhub_core::{Amount, DomainError, DomainResult, LoanTypeId, ensure_positive};

use crate::asset::{Feature, required};

/// Longest accepted loan, in months.
pub const MAX_LOAN_DURATION_MONTHS: u32 = 600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanType {
    pub id: LoanTypeId,
    /// Unique.
    pub name: String,
    /// Annual rate in percent (e.g. `12` for 12%).
    pub interest_rate: Decimal,
    pub term: String,
    pub amount_range: String,
    pub max_amount: Amount,
    pub quota: String,
    pub description_points: Vec<Feature>,
    pub application_fee: Amount,
    pub button_text: String,
    pub button_link: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoanTypeDraft {
    pub name: String,
    pub interest_rate: Decimal,
    pub term: String,
    pub amount_range: String,
    pub max_amount: Amount,
    pub quota: String,
    #[serde(default)]
    pub description_points: Vec<Feature>,
    pub application_fee: Amount,
    #[serde(default)]
    pub button_text: String,
    #[serde(default)]
    pub button_link: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoanTypeUpdate {
    pub name: Option<String>,
    pub interest_rate: Option<Decimal>,
    pub term: Option<String>,
    pub amount_range: Option<String>,
    pub max_amount: Option<Amount>,
    pub quota: Option<String>,
    pub description_points: Option<Vec<Feature>>,
    pub application_fee: Option<Amount>,
    pub button_text: Option<String>,
    pub button_link: Option<String>,
}

/// Repayment schedule for a loan amount (annuity, monthly compounding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanQuote {
    pub interest_rate: Decimal,
    pub monthly_payment: Amount,
    pub total_repayment: Amount,
}

impl LoanType {
    pub fn create(id: LoanTypeId, draft: LoanTypeDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: required("name", draft.name)?,
            interest_rate: ensure_rate(draft.interest_rate)?,
            term: draft.term,
            amount_range: draft.amount_range,
            max_amount: ensure_positive(draft.max_amount, "maxAmount")?,
            quota: draft.quota,
            description_points: draft.description_points,
            application_fee: ensure_fee(draft.application_fee)?,
            button_text: draft.button_text,
            button_link: draft.button_link,
            created_at: now,
        })
    }

    pub fn apply(&mut self, update: LoanTypeUpdate) -> DomainResult<()> {
        if let Some(name) = update.name {
            self.name = required("name", name)?;
        }
        if let Some(rate) = update.interest_rate {
            self.interest_rate = ensure_rate(rate)?;
        }
        if let Some(v) = update.term {
            self.term = v;
        }
        if let Some(v) = update.amount_range {
            self.amount_range = v;
        }
        if let Some(max) = update.max_amount {
            self.max_amount = ensure_positive(max, "maxAmount")?;
        }
        if let Some(v) = update.quota {
            self.quota = v;
        }
        if let Some(v) = update.description_points {
            self.description_points = v;
        }
        if let Some(fee) = update.application_fee {
            self.application_fee = ensure_fee(fee)?;
        }
        if let Some(v) = update.button_text {
            self.button_text = v;
        }
        if let Some(v) = update.button_link {
            self.button_link = v;
        }
        Ok(())
    }

    /// Price a loan of `amount` over `duration_months`.
    pub fn quote(&self, amount: Amount, duration_months: u32) -> DomainResult<LoanQuote> {
        let amount = ensure_positive(amount, "amount")?;
        if amount > self.max_amount {
            return Err(DomainError::validation(
                "amount exceeds maximum for this loan type",
            ));
        }
        if duration_months == 0 || duration_months > MAX_LOAN_DURATION_MONTHS {
            return Err(DomainError::validation(format!(
                "duration must be between 1 and {MAX_LOAN_DURATION_MONTHS} months"
            )));
        }

        let months = Decimal::from(duration_months);
        let monthly_rate = self.interest_rate / Decimal::ONE_HUNDRED / Decimal::from(12);

        let overflow = || DomainError::validation("loan terms overflow");
        let monthly = if monthly_rate.is_zero() {
            amount.checked_div(months).ok_or_else(overflow)?
        } else {
            let mut growth = Decimal::ONE;
            for _ in 0..duration_months {
                growth = growth
                    .checked_mul(Decimal::ONE + monthly_rate)
                    .ok_or_else(overflow)?;
            }
            amount
                .checked_mul(monthly_rate)
                .and_then(|v| v.checked_mul(growth))
                .and_then(|v| v.checked_div(growth - Decimal::ONE))
                .ok_or_else(overflow)?
        };
        let total = monthly.checked_mul(months).ok_or_else(overflow)?;

        Ok(LoanQuote {
            interest_rate: self.interest_rate,
            monthly_payment: monthly.round_dp(2),
            total_repayment: total.round_dp(2),
        })
    }
}

fn ensure_rate(rate: Decimal) -> DomainResult<Decimal> {
    if rate.is_sign_negative() {
        return Err(DomainError::validation("interestRate must not be negative"));
    }
    Ok(rate)
}

fn ensure_fee(fee: Amount) -> DomainResult<Amount> {
    if fee.is_sign_negative() {
        return Err(DomainError::validation("applicationFee must not be negative"));
    }
    Ok(fee)
}
