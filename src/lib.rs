//! Forfettario Engine library crate.
//!
//! This crate computes Italian flat-rate ("forfettario") tax
//! obligations for a sole proprietor: taxable income, social-security
//! contributions, substitute tax, advances and the June/November F24
//! totals, plus the amount to set aside for each new invoice.
//! External applications may call [`engine::compute_fiscal_year`],
//! [`engine::compute_multi_year`] and [`set_aside::compute_set_aside`]
//! directly or embed the HTTP API via [`api::build_router`].

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod money;
pub mod set_aside;
pub mod validation;
