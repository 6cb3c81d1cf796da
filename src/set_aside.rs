//! Per-invoice set-aside calculator.
//!
//! The amount to reserve for an invoice is the difference between two
//! whole-year computations: one with the revenue invoiced so far and
//! one with the new invoice added.  Both go through
//! [`compute_fiscal_year`], so the marginal burden always reflects the
//! same rules as the yearly figures.
//!
//! [`compute_invoice_ledger`] applies a sequence of invoices to one
//! year.  Cumulative revenue before each invoice is a prefix sum, so
//! once those are known every invoice is independent and the
//! computations run in parallel with [`rayon`].

use crate::config::TaxConfig;
use crate::engine::compute_fiscal_year;
use crate::models::{
    InvoiceEntry, InvoiceLedgerEntry, InvoiceLedgerResult, InvoiceSetAsideResult,
    SetAsideContext,
};
use rayon::prelude::*;

/// Compute the set-aside for a single invoice of `invoice_amount`.
///
/// Non-positive amounts are accepted and yield a zero fraction.
pub fn compute_set_aside(
    config: &TaxConfig,
    context: &SetAsideContext,
    invoice_amount: f64,
) -> InvoiceSetAsideResult {
    let revenue_before = context.cumulative_revenue_before_invoice;
    let revenue_after = revenue_before + invoice_amount;

    let before = compute_fiscal_year(
        config,
        &context.profile,
        &context.base_year_input.with_revenue(revenue_before),
    );
    let after = compute_fiscal_year(
        config,
        &context.profile,
        &context.base_year_input.with_revenue(revenue_after),
    );

    let total_burden_before = before.total_burden();
    let total_burden_after = after.total_burden();
    let suggested_set_aside = (total_burden_after - total_burden_before).max(0.0);

    let residual_headroom = config.revenue_ceiling - revenue_after;
    let ceiling_exceeded = revenue_after > config.revenue_ceiling;
    let near_ceiling = !ceiling_exceeded && residual_headroom <= config.near_ceiling_margin;

    let fraction_of_invoice = if invoice_amount > 0.0 {
        suggested_set_aside / invoice_amount
    } else {
        0.0
    };

    if ceiling_exceeded {
        tracing::debug!(
            revenue_after,
            ceiling = config.revenue_ceiling,
            "invoice takes revenue past the ceiling"
        );
    }

    InvoiceSetAsideResult {
        revenue_before,
        revenue_after,
        residual_headroom,
        total_burden_before,
        total_burden_after,
        suggested_set_aside,
        fraction_of_invoice,
        ceiling_exceeded,
        near_ceiling,
    }
}

/// Apply `invoices` in order on top of `context` and compute the
/// set-aside for each one.
pub fn compute_invoice_ledger(
    config: &TaxConfig,
    context: &SetAsideContext,
    invoices: &[InvoiceEntry],
) -> InvoiceLedgerResult {
    // Revenue already invoiced before each entry.
    let mut running = context.cumulative_revenue_before_invoice;
    let starts: Vec<f64> = invoices
        .iter()
        .map(|invoice| {
            let start = running;
            running += invoice.amount;
            start
        })
        .collect();

    let entries: Vec<InvoiceLedgerEntry> = invoices
        .par_iter()
        .zip(starts.par_iter())
        .map(|(invoice, &start)| {
            let ctx = SetAsideContext {
                cumulative_revenue_before_invoice: start,
                ..context.clone()
            };
            InvoiceLedgerEntry {
                label: invoice.label.clone(),
                amount: invoice.amount,
                set_aside: compute_set_aside(config, &ctx, invoice.amount),
            }
        })
        .collect();

    let total_invoiced: f64 = invoices.iter().map(|i| i.amount).sum();
    let total_set_aside: f64 = entries.iter().map(|e| e.set_aside.suggested_set_aside).sum();
    let final_revenue = context.cumulative_revenue_before_invoice + total_invoiced;

    InvoiceLedgerResult {
        entries,
        total_invoiced,
        total_set_aside,
        final_revenue,
        final_headroom: config.revenue_ceiling - final_revenue,
        ceiling_exceeded: final_revenue > config.revenue_ceiling,
    }
}
