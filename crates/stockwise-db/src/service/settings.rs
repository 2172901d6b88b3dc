//! Company settings: a single row with id [`SETTINGS_ROW_ID`].

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use super::error::ServiceResult;
use crate::store::{RecordStore, RecordStoreExt};
use stockwise_core::{AppConfig, CompanySettings, SETTINGS_ROW_ID};

pub struct SettingsService {
    store: Arc<dyn RecordStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        SettingsService { store }
    }

    /// The stored settings, or the defaults if none were saved.
    pub async fn get(&self) -> ServiceResult<CompanySettings> {
        match self.store.find_by_id::<CompanySettings>(SETTINGS_ROW_ID).await? {
            Some(settings) => Ok(settings),
            None => Ok(AppConfig::default().to_settings(Utc::now())),
        }
    }

    /// Inserts or replaces the settings row.
    pub async fn save(&self, mut settings: CompanySettings) -> ServiceResult<CompanySettings> {
        settings.id = Some(SETTINGS_ROW_ID);
        settings.currency_code = settings.currency_code.trim().to_uppercase();
        settings.updated_at = Utc::now();

        let exists = self
            .store
            .find_by_id::<CompanySettings>(SETTINGS_ROW_ID)
            .await?
            .is_some();
        if exists {
            self.store.update(SETTINGS_ROW_ID, &settings).await?;
        } else {
            self.store.insert(&settings).await?;
        }

        info!(company = %settings.company_name, "Settings saved");
        Ok(settings)
    }

    /// Defaults, then the stored row, then the process environment.
    pub async fn app_config(&self) -> ServiceResult<AppConfig> {
        self.app_config_with(|key| std::env::var(key).ok()).await
    }

    /// [`Self::app_config`] with an explicit environment lookup.
    pub async fn app_config_with<F>(&self, lookup: F) -> ServiceResult<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();
        if let Some(settings) = self.store.find_by_id::<CompanySettings>(SETTINGS_ROW_ID).await? {
            config = config.with_settings(&settings);
        }
        Ok(config.with_env(lookup))
    }
}
