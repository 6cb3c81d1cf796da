//! Data models for the Forfettario Engine.
//!
//! The `models` module defines the serialisable structs and enums
//! describing a taxpayer profile, the per-year inputs supplied by a
//! caller and the itemised results produced by the engine.  Inputs
//! derive `Deserialize` so they can be read straight from a request
//! body; results round their monetary fields to cents only when they
//! are serialised (see [`crate::money`]).

use crate::money;
use serde::{Deserialize, Serialize};

/// Business category of the sole proprietor.  Selects the
/// profitability coefficient applied to revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Liberal professions and other services (coefficient 0.78).
    Professional,
    /// Craft businesses (coefficient 0.86).
    Artisan,
    /// Trade and commerce (coefficient 0.40).
    Merchant,
}

/// Social-security scheme the taxpayer is enrolled in.  Selects the
/// contribution formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialSecurityRegime {
    /// INPS "gestione separata": a flat percentage of gross income.
    SeparateManagement,
    /// INPS artisans and merchants: fixed minimum plus a percentage
    /// above the income threshold.
    ArtisansAndMerchants,
    /// Private professional fund.  Contributions are handled outside
    /// the engine, usually through a reclaim charged on invoices.
    ProfessionalFund,
}

/// Taxpayer profile.  Immutable for the duration of a computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxProfile {
    pub category: Category,
    pub social_security_regime: SocialSecurityRegime,
    /// Whether the taxpayer belongs to a professional fund.
    #[serde(default)]
    pub has_professional_fund: bool,
    /// Fraction of revenue charged to clients as fund reclaim
    /// (e.g. `0.04`).  Only meaningful together with
    /// `has_professional_fund`.
    #[serde(default)]
    pub fund_reclaim_rate: Option<f64>,
    /// Substitute tax rate as a fraction, usually `0.05` for start-ups
    /// or `0.15` otherwise.
    pub substitute_tax_rate: f64,
}

/// Inputs for a single fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiscalYearInput {
    /// Calendar year.  Passed through to the result untouched.
    pub year: i32,
    /// Revenue for the year (cumulative to date when used for invoice
    /// deltas).
    pub revenue: f64,
    /// Contributions actually remitted in the prior year (balance plus
    /// both advances).
    #[serde(default)]
    pub contributions_paid_prior_year: f64,
    /// Substitute tax actually remitted in the prior year (balance plus
    /// both advances).
    #[serde(default)]
    pub taxes_paid_prior_year: f64,
    /// Annual Chamber of Commerce fee, paid once with the June F24.
    #[serde(default)]
    pub annual_chamber_of_commerce_fee: f64,
    /// Precomputed fund reclaim, used only when the profile carries no
    /// explicit reclaim rate.
    #[serde(default)]
    pub fund_reclaim_total_override: Option<f64>,
}

impl FiscalYearInput {
    /// Input for a year with no prior-year payments.
    pub fn first_year(year: i32, revenue: f64, annual_fee: f64) -> Self {
        Self {
            year,
            revenue,
            contributions_paid_prior_year: 0.0,
            taxes_paid_prior_year: 0.0,
            annual_chamber_of_commerce_fee: annual_fee,
            fund_reclaim_total_override: None,
        }
    }

    /// Copy of this input with a different revenue figure.
    pub fn with_revenue(&self, revenue: f64) -> Self {
        Self {
            revenue,
            ..self.clone()
        }
    }
}

/// Fully itemised result for one fiscal year.
///
/// Every monetary field is non-negative except `net_taxable_income`,
/// `substitute_tax_gross` and `substitute_tax_balance`; a negative
/// balance signals a credit, mirrored in `credit_to_offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiscalYearResult {
    pub year: i32,

    #[serde(serialize_with = "money::serialize_cents")]
    pub gross_taxable_income: f64,
    #[serde(serialize_with = "money::serialize_cents")]
    pub net_taxable_income: f64,

    #[serde(serialize_with = "money::serialize_cents")]
    pub fixed_contributions: f64,
    #[serde(serialize_with = "money::serialize_cents")]
    pub percentage_contributions: f64,
    /// Echo of the prior-year contributions deducted (if any).
    #[serde(serialize_with = "money::serialize_cents")]
    pub contributions_paid_prior_year: f64,

    #[serde(serialize_with = "money::serialize_cents")]
    pub substitute_tax_gross: f64,
    /// Gross tax minus taxes paid in the prior year.  Not clamped.
    #[serde(serialize_with = "money::serialize_cents")]
    pub substitute_tax_balance: f64,

    #[serde(serialize_with = "money::serialize_cents")]
    pub first_tax_advance: f64,
    #[serde(serialize_with = "money::serialize_cents")]
    pub second_tax_advance: f64,
    #[serde(serialize_with = "money::serialize_cents")]
    pub first_contribution_advance: f64,
    #[serde(serialize_with = "money::serialize_cents")]
    pub second_contribution_advance: f64,

    /// Informational only; never part of the F24 totals.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "money::serialize_opt_cents"
    )]
    pub fund_reclaim_amount: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "money::serialize_opt_cents"
    )]
    pub credit_to_offset: Option<f64>,

    /// June F24 total.
    #[serde(serialize_with = "money::serialize_cents")]
    pub mid_year_total: f64,
    /// November F24 total.
    #[serde(serialize_with = "money::serialize_cents")]
    pub year_end_total: f64,

    pub warnings: Vec<String>,
}

impl FiscalYearResult {
    /// Everything paid through F24 for this year (June plus November).
    pub fn total_burden(&self) -> f64 {
        self.mid_year_total + self.year_end_total
    }

    /// Contributions remitted on account this year, carried into the
    /// next year's deduction.  Fixed contributions are excluded.
    pub fn contributions_carried_forward(&self) -> f64 {
        self.percentage_contributions
            + self.first_contribution_advance
            + self.second_contribution_advance
    }

    /// Substitute tax remitted this year, carried into the next year's
    /// balance.
    pub fn taxes_carried_forward(&self) -> f64 {
        self.substitute_tax_gross + self.first_tax_advance + self.second_tax_advance
    }
}

/// Revenue for one year of a multi-year projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRevenue {
    pub year: i32,
    pub revenue: f64,
}

/// State of the current year before a new invoice is issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAsideContext {
    pub profile: TaxProfile,
    /// Prior-year figures, fee and year for the current year.  Its
    /// `revenue` is replaced by `cumulative_revenue_before_invoice`.
    pub base_year_input: FiscalYearInput,
    /// Revenue invoiced so far this year, excluding the new invoice.
    pub cumulative_revenue_before_invoice: f64,
}

/// Marginal burden of a single invoice and its effect on the revenue
/// ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSetAsideResult {
    #[serde(serialize_with = "money::serialize_cents")]
    pub revenue_before: f64,
    #[serde(serialize_with = "money::serialize_cents")]
    pub revenue_after: f64,
    /// Ceiling minus revenue after the invoice.  Negative once the
    /// ceiling has been exceeded.
    #[serde(serialize_with = "money::serialize_cents")]
    pub residual_headroom: f64,
    #[serde(serialize_with = "money::serialize_cents")]
    pub total_burden_before: f64,
    #[serde(serialize_with = "money::serialize_cents")]
    pub total_burden_after: f64,
    /// Amount to reserve for this invoice.  Never negative.
    #[serde(serialize_with = "money::serialize_cents")]
    pub suggested_set_aside: f64,
    /// `suggested_set_aside / invoice_amount`, or 0 for non-positive
    /// invoices.
    #[serde(serialize_with = "money::serialize_ratio")]
    pub fraction_of_invoice: f64,
    pub ceiling_exceeded: bool,
    /// Still under the ceiling but within the configured warning margin.
    pub near_ceiling: bool,
}

/// One invoice in a ledger request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub amount: f64,
}

/// Set-aside outcome for one invoice of a ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLedgerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(serialize_with = "money::serialize_cents")]
    pub amount: f64,
    pub set_aside: InvoiceSetAsideResult,
}

/// Result of applying a sequence of invoices to the same year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLedgerResult {
    pub entries: Vec<InvoiceLedgerEntry>,
    #[serde(serialize_with = "money::serialize_cents")]
    pub total_invoiced: f64,
    #[serde(serialize_with = "money::serialize_cents")]
    pub total_set_aside: f64,
    #[serde(serialize_with = "money::serialize_cents")]
    pub final_revenue: f64,
    #[serde(serialize_with = "money::serialize_cents")]
    pub final_headroom: f64,
    pub ceiling_exceeded: bool,
}
