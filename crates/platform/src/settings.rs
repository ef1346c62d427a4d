//! Global deposit wallet configuration shown to users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Key of the single settings document.
pub const SETTINGS_KEY: &str = "globalAdminSettings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSetting {
    pub blockchain: String,
    pub wallet_address: String,
}

impl WalletSetting {
    fn unset(blockchain: &str) -> Self {
        Self {
            blockchain: blockchain.to_string(),
            wallet_address: String::new(),
        }
    }

    fn apply(&mut self, update: WalletSettingUpdate) {
        if let Some(chain) = update.blockchain {
            self.blockchain = chain;
        }
        if let Some(address) = update.wallet_address {
            self.wallet_address = address;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub id: String,
    pub bitcoin: WalletSetting,
    pub ethereum: WalletSetting,
    pub usdt: WalletSetting,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WalletSettingUpdate {
    pub blockchain: Option<String>,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminSettingsUpdate {
    pub bitcoin: Option<WalletSettingUpdate>,
    pub ethereum: Option<WalletSettingUpdate>,
    pub usdt: Option<WalletSettingUpdate>,
}

impl AdminSettings {
    pub fn defaults(now: DateTime<Utc>) -> Self {
        Self {
            id: SETTINGS_KEY.to_string(),
            bitcoin: WalletSetting::unset("BTC"),
            ethereum: WalletSetting::unset("ERC20 (ETH)"),
            usdt: WalletSetting::unset("TRC20 (Tron)"),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: AdminSettingsUpdate, now: DateTime<Utc>) {
        if let Some(u) = update.bitcoin {
            self.bitcoin.apply(u);
        }
        if let Some(u) = update.ethereum {
            self.ethereum.apply(u);
        }
        if let Some(u) = update.usdt {
            self.usdt.apply(u);
        }
        self.updated_at = now;
    }
}
