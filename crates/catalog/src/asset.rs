use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use finhub_core::{Amount, AssetId, DomainError, DomainResult, ensure_positive};

/// A marketing bullet shown on an asset or loan card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub text: String,
    #[serde(default)]
    pub included: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    /// Unique, stored upper-case.
    pub symbol: String,
    /// Unit price charged on buy orders.
    pub price: Amount,
    pub price_range: String,
    pub features: Vec<Feature>,
    pub profit_potential: Decimal,
    pub trade_duration_days: Option<u32>,
    pub button_text: String,
    pub is_popular: bool,
    pub period: String,
    pub trade_time: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an asset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssetDraft {
    pub name: String,
    pub symbol: String,
    pub price: Amount,
    pub price_range: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    pub profit_potential: Decimal,
    #[serde(default)]
    pub trade_duration_days: Option<u32>,
    #[serde(default)]
    pub button_text: String,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub trade_time: String,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssetUpdate {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub price: Option<Amount>,
    pub price_range: Option<String>,
    pub features: Option<Vec<Feature>>,
    pub profit_potential: Option<Decimal>,
    pub trade_duration_days: Option<u32>,
    pub button_text: Option<String>,
    pub is_popular: Option<bool>,
    pub period: Option<String>,
    pub trade_time: Option<String>,
}

impl Asset {
    pub fn create(id: AssetId, draft: AssetDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: required("name", draft.name)?,
            symbol: normalize_symbol(&draft.symbol)?,
            price: ensure_positive(draft.price, "price")?,
            price_range: draft.price_range,
            features: draft.features,
            profit_potential: draft.profit_potential,
            trade_duration_days: draft.trade_duration_days,
            button_text: draft.button_text,
            is_popular: draft.is_popular,
            period: draft.period,
            trade_time: draft.trade_time,
            created_at: now,
        })
    }

    pub fn apply(&mut self, update: AssetUpdate) -> DomainResult<()> {
        if let Some(name) = update.name {
            self.name = required("name", name)?;
        }
        if let Some(symbol) = update.symbol {
            self.symbol = normalize_symbol(&symbol)?;
        }
        if let Some(price) = update.price {
            self.price = ensure_positive(price, "price")?;
        }
        if let Some(v) = update.price_range {
            self.price_range = v;
        }
        if let Some(v) = update.features {
            self.features = v;
        }
        if let Some(v) = update.profit_potential {
            self.profit_potential = v;
        }
        if let Some(v) = update.trade_duration_days {
            self.trade_duration_days = Some(v);
        }
        if let Some(v) = update.button_text {
            self.button_text = v;
        }
        if let Some(v) = update.is_popular {
            self.is_popular = v;
        }
        if let Some(v) = update.period {
            self.period = v;
        }
        if let Some(v) = update.trade_time {
            self.trade_time = v;
        }
        Ok(())
    }
}

fn normalize_symbol(symbol: &str) -> DomainResult<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(DomainError::validation("symbol is required"));
    }
    Ok(symbol)
}

pub(crate) fn required(field: &str, value: String) -> DomainResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> AssetDraft {
        serde_json::from_value(serde_json::json!({
            "name": "Bitcoin Growth",
            "symbol": " btc ",
            "price": 250,
            "priceRange": "$250 - $5,000",
            "profitPotential": 12.5,
            "features": [{ "text": "Daily payouts", "included": true }]
        }))
        .unwrap()
    }

    #[test]
    fn create_normalizes_symbol_and_applies_defaults() {
        let asset = Asset::create(AssetId::new(), draft(), Utc::now()).unwrap();
        assert_eq!(asset.symbol, "BTC");
        assert_eq!(asset.price, Decimal::from(250));
        assert!(!asset.is_popular);
        assert_eq!(asset.trade_duration_days, None);
        assert_eq!(asset.features.len(), 1);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res: Result<AssetUpdate, _> = serde_json::from_value(serde_json::json!({ "createdAt": "x" }));
        assert!(res.is_err());
    }

    #[test]
    fn update_touches_only_given_fields() {
        let mut asset = Asset::create(AssetId::new(), draft(), Utc::now()).unwrap();
        asset
            .apply(AssetUpdate {
                is_popular: Some(true),
                price: Some(Decimal::from(300)),
                ..Default::default()
            })
            .unwrap();

        assert!(asset.is_popular);
        assert_eq!(asset.price, Decimal::from(300));
        assert_eq!(asset.name, "Bitcoin Growth");
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let mut asset = Asset::create(AssetId::new(), draft(), Utc::now()).unwrap();
        let err = asset
            .apply(AssetUpdate { price: Some(Decimal::ZERO), ..Default::default() })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
