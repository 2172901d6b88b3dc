//! # Application Configuration
//!
//! Currency, tax and numbering settings, passed explicitly to every service
//! that needs them instead of living in a global store.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`STOCKWISE_*`)
//! 2. Company settings row (`settings` table)
//! 3. Defaults (this file)
//!
//! Read-only after construction; services take their own copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CompanySettings, TaxMode, TaxRate};
use crate::{DEFAULT_NUMBER_WIDTH, SETTINGS_ROW_ID};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Printed on documents.
    pub company_name: String,

    /// Currency code (ISO 4217).
    pub currency_code: String,

    /// Currency symbol (for display).
    pub currency_symbol: String,

    /// Number of minor-unit digits.
    pub currency_decimals: u8,

    /// Tax rate used when a product has none, in basis points.
    pub default_tax_rate_bps: u32,

    /// How purchase order prices treat tax.
    pub tax_mode: TaxMode,

    /// Prefix for purchase order numbers.
    pub purchase_order_prefix: String,

    /// Prefix for goods received note numbers.
    pub grn_prefix: String,

    /// Zero-padding of document sequences.
    pub number_width: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            company_name: "Stockwise Trading".to_string(),
            currency_code: "USD".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            default_tax_rate_bps: 0,
            tax_mode: TaxMode::Exclusive,
            purchase_order_prefix: "PO".to_string(),
            grn_prefix: "GRN".to_string(),
            number_width: DEFAULT_NUMBER_WIDTH,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by the process environment.
    ///
    /// ## Environment Variables
    /// - `STOCKWISE_COMPANY_NAME`
    /// - `STOCKWISE_CURRENCY` (e.g. "INR")
    /// - `STOCKWISE_CURRENCY_SYMBOL`
    /// - `STOCKWISE_TAX_RATE` (percentage, e.g. "18")
    /// - `STOCKWISE_TAX_MODE` ("exclusive" | "inclusive")
    pub fn from_env() -> Self {
        AppConfig::default().with_env(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`. Unparseable values are ignored.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("STOCKWISE_COMPANY_NAME") {
            self.company_name = name;
        }

        if let Some(code) = lookup("STOCKWISE_CURRENCY") {
            self.currency_code = code.to_uppercase();
        }

        if let Some(symbol) = lookup("STOCKWISE_CURRENCY_SYMBOL") {
            self.currency_symbol = symbol;
        }

        if let Some(rate) = lookup("STOCKWISE_TAX_RATE").and_then(|r| r.parse::<f64>().ok()) {
            if rate >= 0.0 {
                self.default_tax_rate_bps = TaxRate::from_percentage(rate).bps();
            }
        }

        if let Some(mode) = lookup("STOCKWISE_TAX_MODE").and_then(|m| m.parse().ok()) {
            self.tax_mode = mode;
        }

        self
    }

    /// Takes company-level values from the stored settings row.
    pub fn with_settings(mut self, settings: &CompanySettings) -> Self {
        self.company_name = settings.company_name.clone();
        self.currency_code = settings.currency_code.clone();
        self.currency_symbol = settings.currency_symbol.clone();
        self.currency_decimals = settings.currency_decimals;
        self.default_tax_rate_bps = settings.default_tax_rate_bps;
        self.tax_mode = settings.tax_mode;
        self.purchase_order_prefix = settings.purchase_order_prefix.clone();
        self.grn_prefix = settings.grn_prefix.clone();
        self
    }

    /// The settings row this configuration corresponds to.
    pub fn to_settings(&self, now: DateTime<Utc>) -> CompanySettings {
        CompanySettings {
            id: Some(SETTINGS_ROW_ID),
            company_name: self.company_name.clone(),
            currency_code: self.currency_code.clone(),
            currency_symbol: self.currency_symbol.clone(),
            currency_decimals: self.currency_decimals,
            default_tax_rate_bps: self.default_tax_rate_bps,
            tax_mode: self.tax_mode,
            purchase_order_prefix: self.purchase_order_prefix.clone(),
            grn_prefix: self.grn_prefix.clone(),
            updated_at: now,
        }
    }

    #[inline]
    pub fn default_tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.default_tax_rate_bps)
    }

    /// Formats a minor-unit amount with the configured symbol.
    ///
    /// ```rust
    /// use stockwise_core::AppConfig;
    ///
    /// let config = AppConfig::default();
    /// assert_eq!(config.format_currency(1234), "$12.34");
    /// assert_eq!(config.format_currency(-5), "-$0.05");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = (cents / divisor).abs();
        let frac = (cents % divisor).abs();
        let sign = if cents < 0 { "-" } else { "" };

        if self.currency_decimals > 0 {
            format!(
                "{}{}{}.{:0width$}",
                sign,
                self.currency_symbol,
                whole,
                frac,
                width = self.currency_decimals as usize
            )
        } else {
            format!("{}{}{}", sign, self.currency_symbol, whole)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_format_currency() {
        let config = AppConfig::default();
        assert_eq!(config.format_currency(1234), "$12.34");
        assert_eq!(config.format_currency(100), "$1.00");
        assert_eq!(config.format_currency(0), "$0.00");
        assert_eq!(config.format_currency(-1234), "-$12.34");
    }

    #[test]
    fn test_format_currency_without_decimals() {
        let config = AppConfig {
            currency_symbol: "¥".to_string(),
            currency_decimals: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.format_currency(1500), "¥1500");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("STOCKWISE_CURRENCY", "inr"),
            ("STOCKWISE_CURRENCY_SYMBOL", "₹"),
            ("STOCKWISE_TAX_RATE", "18"),
            ("STOCKWISE_TAX_MODE", "inclusive"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::default().with_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.currency_code, "INR");
        assert_eq!(config.currency_symbol, "₹");
        assert_eq!(config.default_tax_rate_bps, 1_800);
        assert_eq!(config.tax_mode, TaxMode::Inclusive);
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let config = AppConfig::default().with_env(|k| match k {
            "STOCKWISE_TAX_RATE" => Some("lots".to_string()),
            "STOCKWISE_TAX_MODE" => Some("sideways".to_string()),
            _ => None,
        });
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_settings_round_trip() {
        let config = AppConfig {
            company_name: "Acme".to_string(),
            grn_prefix: "RCV".to_string(),
            ..AppConfig::default()
        };
        let settings = config.to_settings(Utc::now());
        assert_eq!(settings.id, Some(SETTINGS_ROW_ID));
        assert_eq!(AppConfig::default().with_settings(&settings), config);
    }
}
