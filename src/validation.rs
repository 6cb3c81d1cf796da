//! Input validation for the HTTP boundary.
//!
//! The engine trusts its inputs.  These checks run before it is called
//! so that a malformed request turns into an error instead of a silently
//! wrong result.
//!
//! * Amounts must be finite and non-negative ([`EngineError::InvalidInput`]).
//! * The profile must describe a combination the regime allows
//!   ([`EngineError::UnsupportedConfiguration`]).

use crate::config::TaxConfig;
use crate::error::{EngineError, Result};
use crate::models::{
    Category, FiscalYearInput, InvoiceEntry, SetAsideContext, SocialSecurityRegime, TaxProfile,
    YearRevenue,
};

const RATE_TOLERANCE: f64 = 1e-9;

/// `value` must be a finite number `>= 0`.
pub fn validate_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(EngineError::InvalidInput(format!("{field} must be a finite number")));
    }
    if value < 0.0 {
        return Err(EngineError::InvalidInput(format!("{field} must not be negative")));
    }
    Ok(())
}

/// `value` must be a finite number; sign is unrestricted.
pub fn validate_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidInput(format!("{field} must be a finite number")))
    }
}

pub fn validate_profile(config: &TaxConfig, profile: &TaxProfile) -> Result<()> {
    match (profile.category, profile.social_security_regime) {
        (Category::Artisan | Category::Merchant, SocialSecurityRegime::ArtisansAndMerchants)
        | (
            Category::Professional,
            SocialSecurityRegime::SeparateManagement | SocialSecurityRegime::ProfessionalFund,
        ) => {}
        (category, regime) => {
            return Err(EngineError::UnsupportedConfiguration(format!(
                "category {category:?} cannot be enrolled in {regime:?}"
            )))
        }
    }

    if let Some(rate) = profile.fund_reclaim_rate {
        if !rate.is_finite() || !(0.0..1.0).contains(&rate) {
            return Err(EngineError::InvalidInput(
                "fundReclaimRate must be a fraction between 0 and 1".to_string(),
            ));
        }
    }

    let rate = profile.substitute_tax_rate;
    let allowed = config
        .allowed_substitute_tax_rates
        .iter()
        .any(|r| (r - rate).abs() < RATE_TOLERANCE);
    if !allowed {
        return Err(EngineError::UnsupportedConfiguration(format!(
            "substitute tax rate {rate} is not one of {:?}",
            config.allowed_substitute_tax_rates
        )));
    }
    Ok(())
}

pub fn validate_year_input(input: &FiscalYearInput) -> Result<()> {
    validate_amount("revenue", input.revenue)?;
    validate_amount("contributionsPaidPriorYear", input.contributions_paid_prior_year)?;
    validate_amount("taxesPaidPriorYear", input.taxes_paid_prior_year)?;
    validate_amount(
        "annualChamberOfCommerceFee",
        input.annual_chamber_of_commerce_fee,
    )?;
    if let Some(total) = input.fund_reclaim_total_override {
        validate_amount("fundReclaimTotalOverride", total)?;
    }
    Ok(())
}

pub fn validate_years(years: &[YearRevenue]) -> Result<()> {
    if years.is_empty() {
        return Err(EngineError::InvalidInput("years must not be empty".to_string()));
    }
    for entry in years {
        validate_amount(&format!("revenue for {}", entry.year), entry.revenue)?;
    }
    Ok(())
}

pub fn validate_set_aside_context(config: &TaxConfig, context: &SetAsideContext) -> Result<()> {
    validate_profile(config, &context.profile)?;
    validate_year_input(&context.base_year_input)?;
    validate_amount(
        "cumulativeRevenueBeforeInvoice",
        context.cumulative_revenue_before_invoice,
    )
}

/// Invoice amounts may be zero or negative (credit notes) but must be
/// finite.
pub fn validate_invoices(invoices: &[InvoiceEntry]) -> Result<()> {
    invoices
        .iter()
        .try_for_each(|invoice| validate_finite("invoice amount", invoice.amount))
}
