//! Configuration management for the showcase.
//!
//! Loads configuration from environment variables (and `.env`) with
//! sensible defaults, or from a JSON document.

use crate::blog::DEFAULT_CATEGORY;
use crate::money::Rate;
use crate::notification::DEFAULT_LIFETIME;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Errors loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document is not valid JSON for [`ShowcaseConfig`]
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The discount step is zero or 100% and above
    #[error("discount step must lie strictly between 0% and 100%, got {0}")]
    InvalidDiscountStep(Rate),

    /// Blank default category
    #[error("default category cannot be empty")]
    EmptyDefaultCategory,
}

/// Per-feature pricing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PricingConfig {
    /// Tax charged on the subtotal
    pub tax_rate: Rate,
}

impl PricingConfig {
    /// 8% tax
    #[must_use]
    pub const fn billing() -> Self {
        Self {
            tax_rate: Rate::saturating_from_basis_points(800),
        }
    }

    /// 10% tax
    #[must_use]
    pub const fn cart() -> Self {
        Self {
            tax_rate: Rate::saturating_from_basis_points(1000),
        }
    }
}

/// Showcase configuration
///
/// JSON keys are camelCase; missing keys take their defaults and unknown
/// keys are rejected:
///
/// ```
/// use cartwheel::config::ShowcaseConfig;
///
/// let config = ShowcaseConfig::from_json(r#"{ "cart": { "taxRate": 0.2 } }"#);
/// assert!(config.is_ok());
/// assert!(ShowcaseConfig::from_json(r#"{ "colour": "red" }"#).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ShowcaseConfig {
    /// Category for blog posts created without one
    pub default_category: String,
    /// Billing pricing
    pub billing: PricingConfig,
    /// Cart pricing
    pub cart: PricingConfig,
    /// Discount added per click in the billing view
    pub discount_step: Rate,
    /// How long notifications stay visible, in milliseconds
    pub notification_millis: u64,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            default_category: DEFAULT_CATEGORY.to_string(),
            billing: PricingConfig::billing(),
            cart: PricingConfig::cart(),
            discount_step: Rate::saturating_from_basis_points(1000),
            notification_millis: u64::try_from(DEFAULT_LIFETIME.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl ShowcaseConfig {
    /// Load configuration from environment variables
    ///
    /// Reads `.env` first if present. Absent or unparsable values fall back
    /// to their defaults.
    ///
    /// - `CARTWHEEL_BILLING_TAX_RATE` (fraction, e.g. `0.08`)
    /// - `CARTWHEEL_CART_TAX_RATE`
    /// - `CARTWHEEL_DEFAULT_CATEGORY`
    /// - `CARTWHEEL_DISCOUNT_STEP`
    /// - `CARTWHEEL_NOTIFICATION_MS`
    #[must_use]
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup, with the same rules as
    /// [`ShowcaseConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let rate = |key: &str, default: Rate| {
            lookup(key)
                .and_then(|raw| match raw.trim().parse::<f64>().map(Rate::try_from_fraction) {
                    Ok(Ok(rate)) => Some(rate),
                    _ => {
                        tracing::warn!(key, value = %raw, "Ignoring invalid rate");
                        None
                    },
                })
                .unwrap_or(default)
        };

        let discount_step = Some(rate("CARTWHEEL_DISCOUNT_STEP", defaults.discount_step))
            .filter(|step| valid_step(*step))
            .unwrap_or(defaults.discount_step);

        Self {
            default_category: lookup("CARTWHEEL_DEFAULT_CATEGORY")
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .unwrap_or(defaults.default_category),
            billing: PricingConfig {
                tax_rate: rate("CARTWHEEL_BILLING_TAX_RATE", defaults.billing.tax_rate),
            },
            cart: PricingConfig {
                tax_rate: rate("CARTWHEEL_CART_TAX_RATE", defaults.cart.tax_rate),
            },
            discount_step,
            notification_millis: lookup("CARTWHEEL_NOTIFICATION_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.notification_millis),
        }
    }

    /// Parse and validate a JSON document
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Parse`] for malformed JSON, unknown keys, or rates outside `[0, 1]`
    /// - [`ConfigError::InvalidDiscountStep`] for a zero or full discount step
    /// - [`ConfigError::EmptyDefaultCategory`] for a blank category
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field rules serde cannot express
    ///
    /// # Errors
    ///
    /// See [`ShowcaseConfig::from_json`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !valid_step(self.discount_step) {
            return Err(ConfigError::InvalidDiscountStep(self.discount_step));
        }
        if self.default_category.trim().is_empty() {
            return Err(ConfigError::EmptyDefaultCategory);
        }
        Ok(())
    }

    /// Notification lifetime as a [`Duration`]
    #[must_use]
    pub const fn notification_lifetime(&self) -> Duration {
        Duration::from_millis(self.notification_millis)
    }
}

const fn valid_step(step: Rate) -> bool {
    step.basis_points() > 0 && step.is_valid_discount()
}
