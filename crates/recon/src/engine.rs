use crate::anomaly::scan_line_anomalies;
use crate::config::{ReconConfig, ReconOptions};
use crate::index::{index_invoices, index_orders};
use crate::landed::allocate_landed;
use crate::matcher::stitch;
use crate::model::{
    OrderLine, ParsedInvoiceLine, ReconInput, ReconciliationMeta, ReconciliationResult,
};
use crate::totals::{compute_summary, compute_totals};

/// Reconcile invoice lines against the order they were received for.
///
/// Pure and infallible: index both sides (duplicates become anomalies),
/// allocate landed cost once over the invoice index, stitch one match per
/// key, then total.
pub fn reconcile(
    invoice_lines: &[ParsedInvoiceLine],
    order_lines: &[OrderLine],
    meta: &ReconciliationMeta,
    options: &ReconOptions,
) -> ReconciliationResult {
    let _span = tracing::debug_span!(
        "reconcile",
        invoice_lines = invoice_lines.len(),
        order_lines = order_lines.len()
    )
    .entered();

    let meta = meta.normalized();

    let mut anomalies = Vec::new();
    let orders = index_orders(order_lines, &mut anomalies);
    let invoices = index_invoices(invoice_lines, &mut anomalies);

    let adjustments = allocate_landed(&invoices, meta.landed.as_ref());
    let matches = stitch(&orders, &invoices, &adjustments, options);
    anomalies.extend(scan_line_anomalies(&orders, &invoices));
    for anomaly in &anomalies {
        tracing::debug!(code = anomaly.code(), key = anomaly.key(), "anomaly");
    }

    let totals = compute_totals(&matches);
    let summary = compute_summary(&matches);

    tracing::debug!(
        matches = matches.len(),
        anomalies = anomalies.len(),
        value_delta = totals.value_delta,
        "reconciliation complete"
    );

    ReconciliationResult {
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        meta,
        matches,
        totals,
        anomalies,
        summary,
    }
}

/// Run a loaded input document under a config: config tolerances, and the
/// config's landed block when the invoice has none.
pub fn run(config: &ReconConfig, input: &ReconInput) -> ReconciliationResult {
    let mut meta = input.meta.clone();
    config.apply_landed_default(&mut meta);
    reconcile(&input.invoice_lines, &input.order_lines, &meta, &config.options())
}
