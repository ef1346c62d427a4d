//! `finhub-platform`: records without balance effects, namely the user
//! activity feed and the global admin settings.

pub mod activity;
pub mod settings;

pub use activity::{Activity, ActivityDetails, ActivityDraft, newest_first};
pub use settings::{AdminSettings, AdminSettingsUpdate, SETTINGS_KEY, WalletSetting, WalletSettingUpdate};
