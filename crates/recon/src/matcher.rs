use std::collections::HashSet;

use crate::config::ReconOptions;
use crate::index::{IndexedLine, LineIndex};
use crate::landed::LandedAdjustments;
use crate::lenient::num;
use crate::model::{
    Deltas, InvoiceSnapshot, MatchFlags, OrderLine, OrderSnapshot, ParsedInvoiceLine,
    ReconciliationMatch,
};

/// Product of two already-coerced numbers, zero if it overflows.
fn extended(qty: f64, unit: f64) -> f64 {
    let ext = qty * unit;
    if ext.is_finite() {
        ext
    } else {
        0.0
    }
}

fn order_snapshot(entry: &IndexedLine<'_, OrderLine>) -> OrderSnapshot {
    let line = entry.line;
    let qty = num(line.qty);
    let unit_cost = num(line.unit_cost);
    OrderSnapshot {
        id: line.id.clone(),
        product_id: line.product_id.clone(),
        name: line.name.clone(),
        qty,
        unit_cost,
        ext: extended(qty, unit_cost),
    }
}

fn invoice_snapshot(entry: &IndexedLine<'_, ParsedInvoiceLine>, landed: f64) -> InvoiceSnapshot {
    let line = entry.line;
    let qty = num(Some(line.qty));
    let unit_price = num(line.unit_price);
    let landed = num(Some(landed));
    InvoiceSnapshot {
        product_id: line.product_id.clone(),
        code: line.code.clone(),
        name: line.name.clone(),
        qty,
        unit_price,
        ext: extended(qty, unit_price) + landed,
        landed,
    }
}

/// Every key on either side: order keys in first-seen order, then keys
/// only the invoice has, in first-seen order.
pub fn union_keys<'i>(
    orders: &'i LineIndex<'_, OrderLine>,
    invoices: &'i LineIndex<'_, ParsedInvoiceLine>,
) -> Vec<&'i str> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(orders.len() + invoices.len());
    orders
        .keys()
        .chain(invoices.keys())
        .filter(|k| seen.insert(*k))
        .collect()
}

/// Build one aligned match per key across both indexes.
///
/// `adjustments` carries the landed-cost share per invoice key and is added
/// to the invoice extended value here, exactly once.
pub fn stitch(
    orders: &LineIndex<'_, OrderLine>,
    invoices: &LineIndex<'_, ParsedInvoiceLine>,
    adjustments: &LandedAdjustments,
    options: &ReconOptions,
) -> Vec<ReconciliationMatch> {
    union_keys(orders, invoices)
        .into_iter()
        .filter_map(|key| {
            let order_entry = orders.get(key);
            let invoice_entry = invoices.get(key);

            let order = order_entry.map(order_snapshot);
            let invoice = invoice_entry.map(|entry| {
                invoice_snapshot(entry, adjustments.get(key).copied().unwrap_or(0.0))
            });

            // Both sides of a shared key resolve through the same tier.
            let via = invoice_entry
                .map(|i| i.via)
                .or_else(|| order_entry.map(|o| o.via))?;

            let (order_qty, order_cost, order_ext) = order
                .as_ref()
                .map_or((0.0, 0.0, 0.0), |o| (o.qty, o.unit_cost, o.ext));
            let (invoice_qty, invoice_price, invoice_ext) = invoice
                .as_ref()
                .map_or((0.0, 0.0, 0.0), |i| (i.qty, i.unit_price, i.ext));

            let deltas = Deltas {
                qty_delta: invoice_qty - order_qty,
                price_delta: invoice_price - order_cost,
                value_delta: invoice_ext - order_ext,
            };

            let flags = MatchFlags {
                new_item: invoice.is_some() && order.is_none(),
                missing_item: order.is_some() && invoice.is_none(),
                qty_changed: deltas.qty_delta.abs() > options.qty_tolerance,
                price_changed: deltas.price_delta.abs() > options.price_tolerance,
                zero_price: invoice.as_ref().is_some_and(|i| i.unit_price == 0.0),
                zero_qty: invoice.as_ref().is_some_and(|i| i.qty == 0.0),
            };

            Some(ReconciliationMatch {
                key: key.to_string(),
                via,
                order,
                invoice,
                deltas,
                flags,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{index_invoices, index_orders};
    use crate::model::MatchVia;
    use std::collections::HashMap;

    fn ord(id: &str, pid: &str, qty: f64, cost: f64) -> OrderLine {
        OrderLine {
            id: id.into(),
            product_id: Some(pid.into()),
            name: None,
            qty: Some(qty),
            unit_cost: Some(cost),
        }
    }

    fn inv(pid: &str, qty: f64, price: f64) -> ParsedInvoiceLine {
        ParsedInvoiceLine {
            product_id: Some(pid.into()),
            code: None,
            name: pid.into(),
            qty,
            unit_price: Some(price),
        }
    }

    fn run(
        orders: &[OrderLine],
        invoices: &[ParsedInvoiceLine],
        adjustments: &LandedAdjustments,
        options: &ReconOptions,
    ) -> Vec<ReconciliationMatch> {
        let mut anomalies = Vec::new();
        let oi = index_orders(orders, &mut anomalies);
        let ii = index_invoices(invoices, &mut anomalies);
        stitch(&oi, &ii, adjustments, options)
    }

    #[test]
    fn exact_pair_has_no_flags() {
        let m = run(
            &[ord("L1", "P1", 10.0, 2.0)],
            &[inv("P1", 10.0, 2.0)],
            &HashMap::new(),
            &ReconOptions::default(),
        );
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].key, "pid:P1");
        assert_eq!(m[0].via, MatchVia::ProductId);
        assert_eq!(m[0].flags, MatchFlags::default());
        assert_eq!(m[0].deltas.value_delta, 0.0);
        assert_eq!(m[0].order.as_ref().unwrap().ext, 20.0);
    }

    #[test]
    fn qty_and_price_change() {
        let m = run(
            &[ord("L1", "P1", 10.0, 2.0)],
            &[inv("P1", 12.0, 2.5)],
            &HashMap::new(),
            &ReconOptions::default(),
        );
        assert!(m[0].flags.qty_changed);
        assert!(m[0].flags.price_changed);
        assert_eq!(m[0].deltas.qty_delta, 2.0);
        assert_eq!(m[0].deltas.price_delta, 0.5);
        assert_eq!(m[0].deltas.value_delta, 10.0);
    }

    #[test]
    fn tolerance_suppresses_small_changes() {
        let options = ReconOptions { qty_tolerance: 0.5, price_tolerance: 0.05 };
        let m = run(
            &[ord("L1", "P1", 10.0, 2.0)],
            &[inv("P1", 10.5, 2.04)],
            &HashMap::new(),
            &options,
        );
        assert!(!m[0].flags.qty_changed);
        assert!(!m[0].flags.price_changed);
    }

    #[test]
    fn one_sided_rows() {
        let m = run(
            &[ord("L1", "P1", 3.0, 1.0)],
            &[inv("P2", 5.0, 1.0)],
            &HashMap::new(),
            &ReconOptions::default(),
        );
        assert_eq!(m.len(), 2);

        assert_eq!(m[0].key, "pid:P1");
        assert!(m[0].flags.missing_item);
        assert!(m[0].invoice.is_none());
        assert_eq!(m[0].deltas.qty_delta, -3.0);
        assert!(m[0].flags.qty_changed);
        assert!(!m[0].flags.zero_price);

        assert_eq!(m[1].key, "pid:P2");
        assert!(m[1].flags.new_item);
        assert!(m[1].order.is_none());
        assert_eq!(m[1].deltas.value_delta, 5.0);
    }

    #[test]
    fn zero_flags_only_on_invoice_side() {
        let mut line = inv("P1", 0.0, 0.0);
        line.unit_price = None;
        let m = run(
            &[ord("L1", "P1", 2.0, 1.0), ord("L2", "P9", 0.0, 0.0)],
            &[line],
            &HashMap::new(),
            &ReconOptions::default(),
        );
        assert!(m[0].flags.zero_price);
        assert!(m[0].flags.zero_qty);
        assert!(!m[1].flags.zero_price);
        assert!(!m[1].flags.zero_qty);
    }

    #[test]
    fn landed_adjustment_lands_on_invoice_only() {
        let adjustments = HashMap::from([("pid:P1".to_string(), 1.5)]);
        let m = run(
            &[ord("L1", "P1", 10.0, 2.0)],
            &[inv("P1", 10.0, 2.0)],
            &adjustments,
            &ReconOptions::default(),
        );
        let invoice = m[0].invoice.as_ref().unwrap();
        assert_eq!(invoice.ext, 21.5);
        assert_eq!(invoice.landed, 1.5);
        assert_eq!(m[0].order.as_ref().unwrap().ext, 20.0);
        assert_eq!(m[0].deltas.value_delta, 1.5);
        assert!(!m[0].flags.price_changed);
    }

    #[test]
    fn union_order_is_orders_then_invoice_only() {
        let orders = [ord("L1", "B", 1.0, 1.0), ord("L2", "A", 1.0, 1.0)];
        let invoices = [inv("C", 1.0, 1.0), inv("A", 1.0, 1.0), inv("D", 1.0, 1.0)];
        let mut anomalies = Vec::new();
        let oi = index_orders(&orders, &mut anomalies);
        let ii = index_invoices(&invoices, &mut anomalies);
        assert_eq!(union_keys(&oi, &ii), vec!["pid:B", "pid:A", "pid:C", "pid:D"]);
    }

    #[test]
    fn missing_order_numbers_read_as_zero() {
        let order = OrderLine::new("L1");
        let invoice = ParsedInvoiceLine::new("L1", 4.0);
        let m = run(&[order], &[invoice], &HashMap::new(), &ReconOptions::default());
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].key, "name:l1");
        assert_eq!(m[0].order.as_ref().unwrap().ext, 0.0);
        assert_eq!(m[0].deltas.qty_delta, 4.0);
    }
}
