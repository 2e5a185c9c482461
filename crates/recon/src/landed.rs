//! Pro-rata landed-cost allocation over the invoice index.

use std::collections::HashMap;

use crate::index::LineIndex;
use crate::lenient::num;
use crate::model::{AllocationMode, LandedCost, ParsedInvoiceLine};

/// Per-key share of the landed total, keyed like the invoice index.
pub type LandedAdjustments = HashMap<String, f64>;

/// Pre-adjustment extended value used as the allocation weight. Quantity
/// and price are each floored at zero, so any negative input weighs nothing.
fn allocation_weight(line: &ParsedInvoiceLine) -> f64 {
    let ext = num(Some(line.qty)).max(0.0) * num(line.unit_price).max(0.0);
    if ext.is_finite() && ext > 0.0 {
        ext
    } else {
        0.0
    }
}

/// Split `freight + surcharges − credits` across invoice keys by extended
/// value. Every indexed key gets an entry; all are zero when allocation is
/// off, the net total is not positive, or no line carries value.
pub fn allocate_landed(
    invoices: &LineIndex<'_, ParsedInvoiceLine>,
    landed: Option<&LandedCost>,
) -> LandedAdjustments {
    let mut adjustments: LandedAdjustments =
        invoices.keys().map(|k| (k.to_string(), 0.0)).collect();

    let Some(landed) = landed else {
        return adjustments;
    };
    if landed.allocation != AllocationMode::ProrataExt {
        return adjustments;
    }

    let landed_total = landed.total();
    if landed_total <= 0.0 {
        tracing::debug!(landed_total, "landed total not positive, skipping allocation");
        return adjustments;
    }

    let weights: Vec<(&str, f64)> = invoices
        .iter()
        .map(|(key, entry)| (key, allocation_weight(entry.line)))
        .collect();
    let total_ext: f64 = weights.iter().map(|(_, w)| w).sum();
    if total_ext <= 0.0 || !total_ext.is_finite() {
        tracing::debug!(total_ext, "no invoice value to weight by, skipping allocation");
        return adjustments;
    }

    for (key, weight) in weights {
        adjustments.insert(key.to_string(), weight / total_ext * landed_total);
    }

    tracing::debug!(landed_total, total_ext, lines = invoices.len(), "landed cost allocated");
    adjustments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::index_invoices;

    fn line(pid: &str, qty: f64, price: Option<f64>) -> ParsedInvoiceLine {
        ParsedInvoiceLine {
            product_id: Some(pid.into()),
            code: None,
            name: pid.into(),
            qty,
            unit_price: price,
        }
    }

    fn prorata(freight: f64, surcharges: f64, credits: f64) -> LandedCost {
        LandedCost { freight, surcharges, credits, allocation: AllocationMode::ProrataExt }
    }

    #[test]
    fn splits_by_extended_value() {
        let lines = vec![line("A", 10.0, Some(2.0)), line("B", 5.0, Some(12.0))];
        let mut anomalies = Vec::new();
        let index = index_invoices(&lines, &mut anomalies);

        let adj = allocate_landed(&index, Some(&prorata(15.0, 5.0, 4.0)));
        // 20 / 80 and 60 / 80 of 16
        assert!((adj["pid:A"] - 4.0).abs() < 1e-9);
        assert!((adj["pid:B"] - 12.0).abs() < 1e-9);
    }

    #[test]
    fn negative_lines_weigh_nothing() {
        let lines = vec![line("A", -3.0, Some(2.0)), line("B", 2.0, Some(5.0))];
        let mut anomalies = Vec::new();
        let index = index_invoices(&lines, &mut anomalies);

        let adj = allocate_landed(&index, Some(&prorata(7.0, 0.0, 0.0)));
        assert_eq!(adj["pid:A"], 0.0);
        assert!((adj["pid:B"] - 7.0).abs() < 1e-9);
    }

    #[test]
    fn returned_goods_line_takes_no_freight() {
        // Negative qty and negative price multiply to a positive product.
        let lines = vec![line("A", 10.0, Some(2.0)), line("C", -2.0, Some(-10.0))];
        let mut anomalies = Vec::new();
        let index = index_invoices(&lines, &mut anomalies);

        let adj = allocate_landed(&index, Some(&prorata(40.0, 0.0, 0.0)));
        assert_eq!(adj["pid:C"], 0.0);
        assert!((adj["pid:A"] - 40.0).abs() < 1e-9);
    }

    #[test]
    fn mode_none_allocates_nothing() {
        let lines = vec![line("A", 1.0, Some(1.0))];
        let mut anomalies = Vec::new();
        let index = index_invoices(&lines, &mut anomalies);

        let mut landed = prorata(10.0, 0.0, 0.0);
        landed.allocation = AllocationMode::None;
        let adj = allocate_landed(&index, Some(&landed));
        assert_eq!(adj["pid:A"], 0.0);
        assert_eq!(allocate_landed(&index, None)["pid:A"], 0.0);
    }

    #[test]
    fn credits_exceeding_charges_allocate_nothing() {
        let lines = vec![line("A", 1.0, Some(1.0))];
        let mut anomalies = Vec::new();
        let index = index_invoices(&lines, &mut anomalies);

        let adj = allocate_landed(&index, Some(&prorata(5.0, 0.0, 5.0)));
        assert_eq!(adj["pid:A"], 0.0);
        let adj = allocate_landed(&index, Some(&prorata(5.0, 0.0, 9.0)));
        assert_eq!(adj["pid:A"], 0.0);
    }

    #[test]
    fn zero_value_invoice_allocates_nothing() {
        let lines = vec![line("A", 0.0, Some(3.0)), line("B", 4.0, None)];
        let mut anomalies = Vec::new();
        let index = index_invoices(&lines, &mut anomalies);

        let adj = allocate_landed(&index, Some(&prorata(12.0, 0.0, 0.0)));
        assert_eq!(adj.len(), 2);
        assert!(adj.values().all(|v| *v == 0.0));
    }
}
