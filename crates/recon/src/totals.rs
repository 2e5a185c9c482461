use crate::model::{ReconciliationMatch, ReconciliationSummary, ReconciliationTotals};

/// Straight sums over the match records. `value_delta` is derived from the
/// two sums, never accumulated on its own.
pub fn compute_totals(matches: &[ReconciliationMatch]) -> ReconciliationTotals {
    let mut order_value = 0.0;
    let mut invoice_value = 0.0;
    let mut lines_matched = 0;
    let mut lines_invoice_only = 0;
    let mut lines_order_only = 0;

    for m in matches {
        order_value += m.order.as_ref().map_or(0.0, |o| o.ext);
        invoice_value += m.invoice.as_ref().map_or(0.0, |i| i.ext);

        match (m.order.is_some(), m.invoice.is_some()) {
            (true, true) => lines_matched += 1,
            (false, true) => lines_invoice_only += 1,
            (true, false) => lines_order_only += 1,
            (false, false) => {}
        }
    }

    ReconciliationTotals {
        order_value,
        invoice_value,
        value_delta: invoice_value - order_value,
        lines_matched,
        lines_invoice_only,
        lines_order_only,
    }
}

/// Change counts. Quantity and price changes only count on paired rows;
/// a new or missing line has no baseline to have changed from.
pub fn compute_summary(matches: &[ReconciliationMatch]) -> ReconciliationSummary {
    let mut summary = ReconciliationSummary::default();

    for m in matches {
        if m.is_paired() {
            if m.flags.qty_changed {
                summary.qty_changed += 1;
            }
            if m.flags.price_changed {
                summary.price_changed += 1;
            }
        }
        if m.flags.new_item {
            summary.new_items += 1;
        }
        if m.flags.missing_item {
            summary.missing_items += 1;
        }
    }

    summary
}
