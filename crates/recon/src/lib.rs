//! `orderdesk-recon`: invoice-to-order reconciliation engine.
//!
//! Pure engine crate: receives parsed invoice lines and canonical order
//! lines, returns aligned matches, deltas, anomalies and totals.
//! No CLI or IO dependencies.

pub mod anomaly;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod key;
pub mod landed;
pub mod lenient;
pub mod matcher;
pub mod model;
pub mod totals;

pub use config::{ReconConfig, ReconOptions};
pub use engine::{reconcile, run};
pub use error::ReconError;
pub use model::{
    AllocationMode, InvoiceSource, LandedCost, MatchVia, OrderLine, ParsedInvoiceLine,
    ReconInput, ReconciliationAnomaly, ReconciliationMatch, ReconciliationMeta,
    ReconciliationResult, ReconciliationSummary, ReconciliationTotals, Side,
};
