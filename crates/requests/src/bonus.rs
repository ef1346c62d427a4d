use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use finhub_core::{Amount, BonusId, DomainResult, UserId, check_transition, ensure_positive};
use finhub_ledger::{Posting, PostingReason, TransitionId};

use crate::{BonusStatus, Owned, Transition};

const COLLECTION: &str = "bonus";

/// Admin-granted bonus, credited to the user when marked `credited`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bonus {
    pub id: BonusId,
    pub user_id: UserId,
    pub username: String,
    pub amount: Amount,
    pub reason: String,
    pub status: BonusStatus,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BonusDraft {
    pub user_id: UserId,
    pub amount: Amount,
    #[serde(default, alias = "description")]
    pub reason: String,
}

impl Bonus {
    pub fn grant(
        id: BonusId,
        username: impl Into<String>,
        draft: BonusDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            user_id: draft.user_id,
            username: username.into(),
            amount: ensure_positive(draft.amount, "amount")?,
            reason: draft.reason,
            status: BonusStatus::Pending,
            date_added: now,
        })
    }

    pub fn set_status(&mut self, to: BonusStatus) -> DomainResult<Transition<BonusStatus>> {
        let change = check_transition(self.status, to)?;
        let posting = change.enters(BonusStatus::Credited).then(|| {
            Posting::credit(
                self.user_id,
                TransitionId::new(COLLECTION, self.id, "credit"),
                self.amount,
                PostingReason::BonusCredit,
            )
        });
        self.status = change.target();
        Ok(Transition { change, posting })
    }
}

impl Owned for Bonus {
    fn owner(&self) -> UserId {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn crediting_posts_once() {
        let draft = BonusDraft {
            user_id: UserId::new(),
            amount: Decimal::from(25),
            reason: "welcome".into(),
        };
        let mut bonus = Bonus::grant(BonusId::new(), "bob", draft, Utc::now()).unwrap();
        assert_eq!(bonus.status, BonusStatus::Pending);

        let first = bonus.set_status(BonusStatus::Credited).unwrap();
        assert_eq!(first.posting.map(|p| p.amount), Some(Decimal::from(25)));
        let second = bonus.set_status(BonusStatus::Credited).unwrap();
        assert!(second.posting.is_none());
        assert!(bonus.set_status(BonusStatus::Pending).is_err());
    }

    #[test]
    fn description_is_accepted_as_reason() {
        let user = UserId::new();
        let draft: BonusDraft = serde_json::from_value(serde_json::json!({
            "userId": user.to_string(),
            "amount": 5,
            "description": "referral"
        }))
        .unwrap();
        assert_eq!(draft.reason, "referral");
        assert_eq!(draft.user_id, user);
    }
}
