use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use finhub_catalog::Asset;
use finhub_core::{
    Amount, AssetId, AssetOrderId, DomainError, DomainResult, UserId, check_transition,
    ensure_positive,
};
use finhub_ledger::{Posting, PostingReason, TransitionId};

use crate::reference::reference;
use crate::{ApprovalStatus, Owned, Transition};

const COLLECTION: &str = "asset_order";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetOrder {
    pub id: AssetOrderId,
    pub user_id: UserId,
    pub asset_id: AssetId,
    /// `ORD-<millis>-<suffix>`.
    pub order_id: String,
    pub order_type: OrderType,
    /// Quantity of the asset.
    pub amount: Amount,
    pub price_at_order: Amount,
    pub total_cost: Amount,
    pub invited_by_user_id: Option<UserId>,
    pub status: ApprovalStatus,
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssetOrderDraft {
    pub asset_id: AssetId,
    pub order_type: OrderType,
    pub amount: Amount,
    #[serde(default)]
    pub invited_by_user_id: Option<UserId>,
}

impl AssetOrder {
    /// Opens an order at the asset's current price. Buy orders return the
    /// purchase posting debiting `amount * price`.
    pub fn place(
        id: AssetOrderId,
        user_id: UserId,
        asset: &Asset,
        draft: AssetOrderDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<(Self, Option<Posting>)> {
        let amount = ensure_positive(draft.amount, "amount")?;
        let total_cost = amount
            .checked_mul(asset.price)
            .ok_or_else(|| DomainError::validation("order total overflows"))?;
        let order = Self {
            id,
            user_id,
            asset_id: asset.id,
            order_id: reference("ORD", id, now),
            order_type: draft.order_type,
            amount,
            price_at_order: asset.price,
            total_cost,
            invited_by_user_id: draft.invited_by_user_id,
            status: ApprovalStatus::Pending,
            order_date: now,
        };
        let purchase = (draft.order_type == OrderType::Buy).then(|| {
            Posting::debit(
                user_id,
                TransitionId::new(COLLECTION, id, "purchase"),
                total_cost,
                PostingReason::AssetPurchase,
            )
        });
        Ok((order, purchase))
    }

    /// Status changes have no balance effect; a rejected buy is not refunded.
    pub fn set_status(&mut self, to: ApprovalStatus) -> DomainResult<Transition<ApprovalStatus>> {
        let change = check_transition(self.status, to)?;
        self.status = change.target();
        Ok(Transition::without_posting(change))
    }
}

impl Owned for AssetOrder {
    fn owner(&self) -> UserId {
        self.user_id
    }
}
