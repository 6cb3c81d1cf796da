//! Configuration for the Forfettario Engine.
//!
//! Two pieces of configuration live here:
//!
//! * [`TaxConfig`], the table of regime constants (profitability
//!   coefficients, contribution rates and thresholds, advance split,
//!   revenue ceiling).  It can be read from a JSON file such as
//!   `tax_config/forfettario_2025.json`; fields omitted from the file
//!   keep their default value.  Once loaded it is treated as read-only
//!   and passed by reference into every computation.
//! * [`ServerConfig`], read from environment variables by the binary.

use crate::error::{EngineError, Result};
use crate::models::Category;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Regime constants used by every computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    /// Profitability coefficients by category.
    pub professional_coefficient: f64,
    pub artisan_coefficient: f64,
    pub merchant_coefficient: f64,

    /// Annual minimum contributions owed by artisans and merchants
    /// regardless of income.
    pub artisan_fixed_contributions: f64,
    pub merchant_fixed_contributions: f64,

    /// Gross income above which percentage contributions apply.
    pub artisan_contribution_threshold: f64,
    pub merchant_contribution_threshold: f64,

    /// Percentage contribution rates above the threshold.
    pub artisan_contribution_rate: f64,
    pub merchant_contribution_rate: f64,

    /// Separate management rate applied to the whole gross income.
    pub separate_management_rate: f64,

    /// Share of the advance base paid in each of the two instalments.
    pub advance_split: f64,

    /// Annual revenue ceiling of the regime.
    pub revenue_ceiling: f64,
    /// Headroom under the ceiling below which invoices are flagged.
    pub near_ceiling_margin: f64,

    /// Substitute tax rates a profile may declare.
    pub allowed_substitute_tax_rates: Vec<f64>,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            professional_coefficient: 0.78,
            artisan_coefficient: 0.86,
            merchant_coefficient: 0.40,
            artisan_fixed_contributions: 4427.04,
            merchant_fixed_contributions: 4515.43,
            artisan_contribution_threshold: 18415.0,
            merchant_contribution_threshold: 18415.0,
            artisan_contribution_rate: 0.24,
            merchant_contribution_rate: 0.2448,
            separate_management_rate: 0.2607,
            advance_split: 0.5,
            revenue_ceiling: 85000.0,
            near_ceiling_margin: 5000.0,
            allowed_substitute_tax_rates: vec![0.05, 0.15],
        }
    }
}

/// Fixed amount, threshold and rate for the artisans and merchants
/// scheme, selected by category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionBand {
    pub fixed: f64,
    pub threshold: f64,
    pub rate: f64,
}

impl TaxConfig {
    /// Profitability coefficient for `category`.
    pub fn coefficient(&self, category: Category) -> f64 {
        match category {
            Category::Professional => self.professional_coefficient,
            Category::Artisan => self.artisan_coefficient,
            Category::Merchant => self.merchant_coefficient,
        }
    }

    /// Artisans and merchants parameters for `category`.  Anything
    /// other than an artisan is billed on the merchant band.
    pub fn contribution_band(&self, category: Category) -> ContributionBand {
        match category {
            Category::Artisan => ContributionBand {
                fixed: self.artisan_fixed_contributions,
                threshold: self.artisan_contribution_threshold,
                rate: self.artisan_contribution_rate,
            },
            Category::Merchant | Category::Professional => ContributionBand {
                fixed: self.merchant_fixed_contributions,
                threshold: self.merchant_contribution_threshold,
                rate: self.merchant_contribution_rate,
            },
        }
    }

    /// Load the table from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let config: TaxConfig =
            serde_json::from_str(&data).map_err(|source| EngineError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(path = %path.display(), "loaded tax configuration");
        Ok(config)
    }

    /// Load the table from `path` if given, otherwise use the built-in
    /// defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                tracing::info!("no tax configuration file set, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Process-level settings for the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tax_config_path: Option<PathBuf>,
}

impl ServerConfig {
    pub const BIND_ADDR_VAR: &'static str = "FORFETTARIO_BIND_ADDR";
    pub const TAX_CONFIG_VAR: &'static str = "FORFETTARIO_TAX_CONFIG";

    /// Read settings from `FORFETTARIO_BIND_ADDR` (default
    /// `127.0.0.1:3000`) and `FORFETTARIO_TAX_CONFIG` (optional path to
    /// a [`TaxConfig`] JSON file).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup(Self::BIND_ADDR_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let tax_config_path = lookup(Self::TAX_CONFIG_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        Self {
            bind_addr,
            tax_config_path,
        }
    }
}
