//! Fiscal computation engine.
//!
//! The `engine` module turns a [`TaxProfile`] and a [`FiscalYearInput`]
//! into a fully itemised [`FiscalYearResult`].  The derivation runs in
//! a fixed order:
//!
//! 1. gross taxable income from the profitability coefficient;
//! 2. current-year contributions for the social-security regime;
//! 3. net taxable income, deducting either the current year's own
//!    contributions (first year, artisans and merchants only) or the
//!    contributions paid in the prior year;
//! 4. substitute tax and its balance against taxes already paid;
//! 5. the two advance instalments for tax and contributions;
//! 6. the June and November F24 totals.
//!
//! [`compute_multi_year`] chains single-year computations, feeding each
//! year's payments into the next year's prior-year figures.  Every
//! function here is pure and cannot fail.

use crate::config::TaxConfig;
use crate::models::{
    FiscalYearInput, FiscalYearResult, SocialSecurityRegime, TaxProfile, YearRevenue,
};

/// Contributions owed for the current year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contributions {
    pub fixed: f64,
    pub percentage: f64,
}

/// The two instalments of the tax and contribution advances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advances {
    pub first_tax: f64,
    pub second_tax: f64,
    pub first_contribution: f64,
    pub second_contribution: f64,
}

pub fn gross_taxable_income(config: &TaxConfig, profile: &TaxProfile, revenue: f64) -> f64 {
    revenue * config.coefficient(profile.category)
}

pub fn contributions(config: &TaxConfig, profile: &TaxProfile, gross_income: f64) -> Contributions {
    match profile.social_security_regime {
        SocialSecurityRegime::SeparateManagement => Contributions {
            fixed: 0.0,
            percentage: gross_income * config.separate_management_rate,
        },
        SocialSecurityRegime::ArtisansAndMerchants => {
            let band = config.contribution_band(profile.category);
            let excess = (gross_income - band.threshold).max(0.0);
            Contributions {
                fixed: band.fixed,
                percentage: excess * band.rate,
            }
        }
        // Paid to the fund directly, usually through the reclaim.
        SocialSecurityRegime::ProfessionalFund => Contributions {
            fixed: 0.0,
            percentage: 0.0,
        },
    }
}

/// A year with nothing paid in the prior year, neither contributions
/// nor tax.
pub fn is_first_year(input: &FiscalYearInput) -> bool {
    input.contributions_paid_prior_year <= 0.0 && input.taxes_paid_prior_year <= 0.0
}

pub fn net_taxable_income(
    profile: &TaxProfile,
    input: &FiscalYearInput,
    gross_income: f64,
    current: Contributions,
) -> f64 {
    if !is_first_year(input) {
        return gross_income - input.contributions_paid_prior_year;
    }
    match profile.social_security_regime {
        SocialSecurityRegime::SeparateManagement | SocialSecurityRegime::ProfessionalFund => {
            gross_income
        }
        SocialSecurityRegime::ArtisansAndMerchants => {
            gross_income - current.fixed - current.percentage
        }
    }
}

/// Advances are computed on the positive part of the tax balance and on
/// the current year's percentage contributions.  Fixed contributions
/// never carry advances.
pub fn advances(config: &TaxConfig, tax_balance: f64, percentage_contributions: f64) -> Advances {
    let tax_base = tax_balance.max(0.0);
    let split = config.advance_split;
    Advances {
        first_tax: tax_base * split,
        second_tax: tax_base * split,
        first_contribution: percentage_contributions * split,
        second_contribution: percentage_contributions * split,
    }
}

/// Reclaim charged to clients for the professional fund, if any.
pub fn fund_reclaim(profile: &TaxProfile, input: &FiscalYearInput) -> Option<f64> {
    match profile.fund_reclaim_rate {
        Some(rate) if profile.has_professional_fund && rate > 0.0 => Some(input.revenue * rate),
        _ => input.fund_reclaim_total_override,
    }
}

/// Compute one fiscal year.
pub fn compute_fiscal_year(
    config: &TaxConfig,
    profile: &TaxProfile,
    input: &FiscalYearInput,
) -> FiscalYearResult {
    let mut warnings = Vec::new();

    let gross = gross_taxable_income(config, profile, input.revenue);
    let current = contributions(config, profile, gross);
    let net = net_taxable_income(profile, input, gross, current);

    let tax_gross = net * profile.substitute_tax_rate;
    let tax_balance = tax_gross - input.taxes_paid_prior_year;
    let instalments = advances(config, tax_balance, current.percentage);

    // A credit never lowers the June payment; it is reported apart.
    let mid_year_total = tax_balance.max(0.0)
        + current.percentage
        + instalments.first_tax
        + instalments.first_contribution
        + input.annual_chamber_of_commerce_fee;
    let year_end_total = instalments.second_tax + instalments.second_contribution;

    let credit_to_offset = if tax_balance < 0.0 {
        let credit = tax_balance.abs();
        warnings.push(format!(
            "A substitute-tax credit of {:.2} arose; offset it in F24.",
            credit
        ));
        Some(credit)
    } else {
        None
    };
    if net < 0.0 {
        warnings.push("Net taxable income is negative; no substitute tax is due.".to_string());
    }
    if input.revenue > config.revenue_ceiling {
        warnings.push(format!(
            "Revenue {:.2} exceeds the flat-rate ceiling of {:.2}.",
            input.revenue, config.revenue_ceiling
        ));
    }

    tracing::debug!(
        year = input.year,
        revenue = input.revenue,
        gross,
        net,
        tax_gross,
        tax_balance,
        mid_year_total,
        year_end_total,
        "computed fiscal year"
    );

    FiscalYearResult {
        year: input.year,
        gross_taxable_income: gross,
        net_taxable_income: net,
        fixed_contributions: current.fixed,
        percentage_contributions: current.percentage,
        contributions_paid_prior_year: input.contributions_paid_prior_year,
        substitute_tax_gross: tax_gross,
        substitute_tax_balance: tax_balance,
        first_tax_advance: instalments.first_tax,
        second_tax_advance: instalments.second_tax,
        first_contribution_advance: instalments.first_contribution,
        second_contribution_advance: instalments.second_contribution,
        fund_reclaim_amount: fund_reclaim(profile, input),
        credit_to_offset,
        mid_year_total,
        year_end_total,
        warnings,
    }
}

/// Compute consecutive years in the order given.  The first year starts
/// with no prior-year payments; each later year deducts what the
/// previous result says was paid.
pub fn compute_multi_year(
    config: &TaxConfig,
    profile: &TaxProfile,
    years: &[YearRevenue],
    annual_fee: f64,
) -> Vec<FiscalYearResult> {
    let mut results: Vec<FiscalYearResult> = Vec::with_capacity(years.len());
    let mut contributions_prev = 0.0;
    let mut taxes_prev = 0.0;

    for entry in years {
        let input = FiscalYearInput {
            year: entry.year,
            revenue: entry.revenue,
            contributions_paid_prior_year: contributions_prev,
            taxes_paid_prior_year: taxes_prev,
            annual_chamber_of_commerce_fee: annual_fee,
            fund_reclaim_total_override: None,
        };
        let result = compute_fiscal_year(config, profile, &input);
        contributions_prev = result.contributions_carried_forward();
        taxes_prev = result.taxes_carried_forward();
        results.push(result);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    const EPS: f64 = 1e-6;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn professional_separate(rate: f64) -> TaxProfile {
        TaxProfile {
            category: Category::Professional,
            social_security_regime: SocialSecurityRegime::SeparateManagement,
            has_professional_fund: false,
            fund_reclaim_rate: None,
            substitute_tax_rate: rate,
        }
    }

    fn tax_only_config() -> TaxConfig {
        TaxConfig {
            separate_management_rate: 0.0,
            ..TaxConfig::default()
        }
    }

    #[test]
    fn test_professional_first_year_tax_only() {
        let config = tax_only_config();
        let profile = professional_separate(0.05);
        let input = FiscalYearInput::first_year(2025, 60000.0, 60.0);

        let r = compute_fiscal_year(&config, &profile, &input);

        assert_eq!(r.year, 2025);
        assert_close(r.gross_taxable_income, 46800.0);
        assert_close(r.net_taxable_income, 46800.0);
        assert_close(r.fixed_contributions, 0.0);
        assert_close(r.percentage_contributions, 0.0);
        assert_close(r.substitute_tax_gross, 2340.0);
        assert_close(r.substitute_tax_balance, 2340.0);
        assert_close(r.first_tax_advance, 1170.0);
        assert_close(r.second_tax_advance, 1170.0);
        assert_close(r.first_contribution_advance, 0.0);
        assert_close(r.second_contribution_advance, 0.0);
        assert_close(r.mid_year_total, 3570.0);
        assert_close(r.year_end_total, 1170.0);
        assert_eq!(r.credit_to_offset, None);
        assert_eq!(r.fund_reclaim_amount, None);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_second_year_credit_is_reported_and_not_prepaid() {
        let config = tax_only_config();
        let profile = professional_separate(0.05);
        let input = FiscalYearInput {
            year: 2026,
            revenue: 65000.0,
            contributions_paid_prior_year: 0.0,
            taxes_paid_prior_year: 4680.0,
            annual_chamber_of_commerce_fee: 60.0,
            fund_reclaim_total_override: None,
        };

        let r = compute_fiscal_year(&config, &profile, &input);

        assert_close(r.gross_taxable_income, 50700.0);
        assert_close(r.net_taxable_income, 50700.0);
        assert_close(r.substitute_tax_gross, 2535.0);
        assert_close(r.substitute_tax_balance, -2145.0);
        assert_close(r.credit_to_offset.unwrap(), 2145.0);
        // Advances are based on the positive part of the balance.
        assert_close(r.first_tax_advance, 0.0);
        assert_close(r.second_tax_advance, 0.0);
        // Only the fee is left in June; the credit does not reduce it.
        assert_close(r.mid_year_total, 60.0);
        assert_close(r.year_end_total, 0.0);
        assert_eq!(r.warnings.len(), 1);
        assert!(r.warnings[0].contains("2145.00"));
    }

    #[test]
    fn test_artisan_first_year_deducts_own_contributions() {
        let config = TaxConfig {
            artisan_fixed_contributions: 4000.0,
            artisan_contribution_threshold: 17000.0,
            artisan_contribution_rate: 0.24,
            ..TaxConfig::default()
        };
        let profile = TaxProfile {
            category: Category::Artisan,
            social_security_regime: SocialSecurityRegime::ArtisansAndMerchants,
            has_professional_fund: false,
            fund_reclaim_rate: None,
            substitute_tax_rate: 0.05,
        };
        let input = FiscalYearInput::first_year(2025, 40000.0, 60.0);

        let r = compute_fiscal_year(&config, &profile, &input);

        assert_close(r.gross_taxable_income, 34400.0);
        assert_close(r.fixed_contributions, 4000.0);
        assert_close(r.percentage_contributions, 4176.0);
        assert_close(r.net_taxable_income, 26224.0);
        assert_close(r.substitute_tax_gross, 1311.2);
        assert_close(r.first_contribution_advance, 2088.0);
        assert_close(r.second_contribution_advance, 2088.0);
        assert_close(r.mid_year_total, 1311.2 + 4176.0 + 655.6 + 2088.0 + 60.0);
        assert_close(r.year_end_total, 655.6 + 2088.0);
    }

    #[test]
    fn test_artisan_below_threshold_owes_only_fixed() {
        let config = TaxConfig::default();
        let profile = TaxProfile {
            category: Category::Artisan,
            social_security_regime: SocialSecurityRegime::ArtisansAndMerchants,
            has_professional_fund: false,
            fund_reclaim_rate: None,
            substitute_tax_rate: 0.15,
        };
        let input = FiscalYearInput::first_year(2025, 10000.0, 0.0);

        let r = compute_fiscal_year(&config, &profile, &input);

        assert_close(r.percentage_contributions, 0.0);
        assert_close(r.fixed_contributions, config.artisan_fixed_contributions);
        assert_close(r.first_contribution_advance, 0.0);
    }

    #[test]
    fn test_merchant_uses_merchant_band() {
        let config = TaxConfig::default();
        let profile = TaxProfile {
            category: Category::Merchant,
            social_security_regime: SocialSecurityRegime::ArtisansAndMerchants,
            has_professional_fund: false,
            fund_reclaim_rate: None,
            substitute_tax_rate: 0.15,
        };
        let input = FiscalYearInput::first_year(2025, 80000.0, 0.0);

        let r = compute_fiscal_year(&config, &profile, &input);

        assert_close(r.gross_taxable_income, 32000.0);
        assert_close(
            r.percentage_contributions,
            (32000.0 - config.merchant_contribution_threshold) * config.merchant_contribution_rate,
        );
        assert_close(r.fixed_contributions, config.merchant_fixed_contributions);
    }

    #[test]
    fn test_professional_fund_reclaim() {
        let config = TaxConfig::default();
        let mut profile = TaxProfile {
            category: Category::Professional,
            social_security_regime: SocialSecurityRegime::ProfessionalFund,
            has_professional_fund: true,
            fund_reclaim_rate: Some(0.04),
            substitute_tax_rate: 0.15,
        };
        let mut input = FiscalYearInput::first_year(2025, 50000.0, 0.0);
        input.fund_reclaim_total_override = Some(1500.0);

        let r = compute_fiscal_year(&config, &profile, &input);
        assert_close(r.fund_reclaim_amount.unwrap(), 2000.0);
        assert_close(r.percentage_contributions, 0.0);
        assert_close(r.net_taxable_income, r.gross_taxable_income);
        // Reclaim is informational only.
        assert_close(r.mid_year_total, r.substitute_tax_balance + r.first_tax_advance);

        profile.fund_reclaim_rate = None;
        let r = compute_fiscal_year(&config, &profile, &input);
        assert_close(r.fund_reclaim_amount.unwrap(), 1500.0);

        input.fund_reclaim_total_override = None;
        let r = compute_fiscal_year(&config, &profile, &input);
        assert_eq!(r.fund_reclaim_amount, None);
    }

    #[test]
    fn test_negative_net_income_flows_through() {
        let config = TaxConfig::default();
        let profile = professional_separate(0.05);
        let input = FiscalYearInput {
            year: 2026,
            revenue: 20000.0,
            contributions_paid_prior_year: 30000.0,
            taxes_paid_prior_year: 0.0,
            annual_chamber_of_commerce_fee: 0.0,
            fund_reclaim_total_override: None,
        };

        let r = compute_fiscal_year(&config, &profile, &input);

        assert_close(r.net_taxable_income, 15600.0 - 30000.0);
        assert_close(r.substitute_tax_gross, -720.0);
        assert_close(r.credit_to_offset.unwrap(), 720.0);
        assert_close(r.first_tax_advance, 0.0);
        assert!(r.first_contribution_advance > 0.0);
        assert!(r.mid_year_total >= 0.0);
        assert_eq!(r.warnings.len(), 2);
    }

    #[test]
    fn test_revenue_over_ceiling_warns() {
        let config = TaxConfig::default();
        let profile = professional_separate(0.15);
        let input = FiscalYearInput::first_year(2025, 90000.0, 0.0);

        let r = compute_fiscal_year(&config, &profile, &input);

        assert_eq!(r.warnings.len(), 1);
        assert!(r.warnings[0].contains("85000.00"));
    }

    #[test]
    fn test_first_year_requires_both_priors_zero() {
        let mut input = FiscalYearInput::first_year(2025, 1.0, 0.0);
        assert!(is_first_year(&input));
        input.taxes_paid_prior_year = 10.0;
        assert!(!is_first_year(&input));
        input.taxes_paid_prior_year = 0.0;
        input.contributions_paid_prior_year = 10.0;
        assert!(!is_first_year(&input));
    }

    #[test]
    fn test_compute_is_deterministic() {
        let config = TaxConfig::default();
        let profile = professional_separate(0.15);
        let input = FiscalYearInput::first_year(2025, 42000.0, 60.0);
        assert_eq!(
            compute_fiscal_year(&config, &profile, &input),
            compute_fiscal_year(&config, &profile, &input)
        );
    }

    #[test]
    fn test_income_is_monotonic_in_revenue() {
        let config = TaxConfig::default();
        let profile = TaxProfile {
            category: Category::Artisan,
            social_security_regime: SocialSecurityRegime::ArtisansAndMerchants,
            has_professional_fund: false,
            fund_reclaim_rate: None,
            substitute_tax_rate: 0.15,
        };
        let base = FiscalYearInput {
            year: 2026,
            revenue: 0.0,
            contributions_paid_prior_year: 5000.0,
            taxes_paid_prior_year: 1000.0,
            annual_chamber_of_commerce_fee: 60.0,
            fund_reclaim_total_override: None,
        };
        let mut previous: Option<FiscalYearResult> = None;
        for step in 0..=100 {
            let input = base.with_revenue(step as f64 * 1000.0);
            let r = compute_fiscal_year(&config, &profile, &input);
            if let Some(p) = &previous {
                assert!(r.gross_taxable_income >= p.gross_taxable_income);
                assert!(r.net_taxable_income >= p.net_taxable_income);
            }
            assert!(r.fixed_contributions >= 0.0);
            assert!(r.percentage_contributions >= 0.0);
            assert!(r.first_tax_advance >= 0.0 && r.second_tax_advance >= 0.0);
            assert!(r.first_contribution_advance >= 0.0 && r.second_contribution_advance >= 0.0);
            previous = Some(r);
        }
    }

    #[test]
    fn test_multi_year_single_entry_matches_single_year() {
        let config = TaxConfig::default();
        let profile = professional_separate(0.05);
        let years = [YearRevenue {
            year: 2025,
            revenue: 60000.0,
        }];

        let multi = compute_multi_year(&config, &profile, &years, 60.0);
        let single = compute_fiscal_year(
            &config,
            &profile,
            &FiscalYearInput::first_year(2025, 60000.0, 60.0),
        );
        assert_eq!(multi, vec![single]);
    }

    #[test]
    fn test_multi_year_propagates_payments() {
        let config = tax_only_config();
        let profile = professional_separate(0.05);
        let years = [
            YearRevenue {
                year: 2025,
                revenue: 60000.0,
            },
            YearRevenue {
                year: 2026,
                revenue: 65000.0,
            },
        ];

        let results = compute_multi_year(&config, &profile, &years, 60.0);

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].year, 2026);
        assert_close(results[1].contributions_paid_prior_year, 0.0);
        assert_close(results[1].substitute_tax_balance, -2145.0);
        assert_close(results[1].credit_to_offset.unwrap(), 2145.0);
    }

    #[test]
    fn test_multi_year_with_separate_management_contributions() {
        let config = TaxConfig::default();
        let profile = professional_separate(0.05);
        let years = [
            YearRevenue {
                year: 2025,
                revenue: 60000.0,
            },
            YearRevenue {
                year: 2026,
                revenue: 65000.0,
            },
        ];

        let results = compute_multi_year(&config, &profile, &years, 60.0);
        let first = &results[0];
        let second = &results[1];

        assert_close(first.percentage_contributions, 12200.76);
        assert_close(first.mid_year_total, 2340.0 + 12200.76 + 1170.0 + 6100.38 + 60.0);
        assert_close(first.year_end_total, 1170.0 + 6100.38);

        assert_close(second.contributions_paid_prior_year, 24401.52);
        assert_close(second.net_taxable_income, 50700.0 - 24401.52);
        assert_close(second.substitute_tax_balance, (50700.0 - 24401.52) * 0.05 - 4680.0);
    }

    #[test]
    fn test_multi_year_empty() {
        let config = TaxConfig::default();
        let profile = professional_separate(0.05);
        assert!(compute_multi_year(&config, &profile, &[], 60.0).is_empty());
    }
}
