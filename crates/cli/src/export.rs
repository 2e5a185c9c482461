//! `--csv` export: one row per reconciliation match, for spreadsheets and audit.

use std::io::Write;
use std::path::Path;

use orderdesk_recon::{ReconciliationMatch, ReconciliationResult};

const MATCHES_HEADER: &[&str] = &[
    "key",
    "via",
    "status",
    "order_id",
    "order_qty",
    "order_unit_cost",
    "order_ext",
    "invoice_name",
    "invoice_qty",
    "invoice_unit_price",
    "invoice_landed",
    "invoice_ext",
    "qty_delta",
    "price_delta",
    "value_delta",
    "qty_changed",
    "price_changed",
    "zero_price",
    "zero_qty",
];

fn status(m: &ReconciliationMatch) -> &'static str {
    if m.flags.new_item {
        "new_item"
    } else if m.flags.missing_item {
        "missing_item"
    } else if m.flags.qty_changed || m.flags.price_changed {
        "changed"
    } else {
        "matched"
    }
}

fn opt_num(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_matches_csv<W: Write>(writer: W, result: &ReconciliationResult) -> Result<(), String> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(MATCHES_HEADER)
        .map_err(|e| format!("CSV write error: {e}"))?;

    for m in &result.matches {
        let order = m.order.as_ref();
        let invoice = m.invoice.as_ref();
        csv.write_record([
            m.key.clone(),
            m.via.to_string(),
            status(m).to_string(),
            order.map(|o| o.id.clone()).unwrap_or_default(),
            opt_num(order.map(|o| o.qty)),
            opt_num(order.map(|o| o.unit_cost)),
            opt_num(order.map(|o| o.ext)),
            invoice.map(|i| i.name.clone()).unwrap_or_default(),
            opt_num(invoice.map(|i| i.qty)),
            opt_num(invoice.map(|i| i.unit_price)),
            opt_num(invoice.map(|i| i.landed)),
            opt_num(invoice.map(|i| i.ext)),
            m.deltas.qty_delta.to_string(),
            m.deltas.price_delta.to_string(),
            m.deltas.value_delta.to_string(),
            m.flags.qty_changed.to_string(),
            m.flags.price_changed.to_string(),
            m.flags.zero_price.to_string(),
            m.flags.zero_qty.to_string(),
        ])
        .map_err(|e| format!("CSV write error: {e}"))?;
    }

    csv.flush().map_err(|e| format!("CSV flush error: {e}"))?;
    Ok(())
}

pub fn write_matches_csv_file(path: &Path, result: &ReconciliationResult) -> Result<(), String> {
    let file = std::fs::File::create(path)
        .map_err(|e| format!("cannot create {}: {e}", path.display()))?;
    write_matches_csv(file, result)
}
