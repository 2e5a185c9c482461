use crate::index::LineIndex;
use crate::lenient::num;
use crate::model::{OrderLine, ParsedInvoiceLine, ReconciliationAnomaly, Side};

/// Scan the retained lines of both indexes once for negative quantities and
/// negative or zero invoice prices. Runs independently of stitching, so a
/// paired line can carry both a match flag and an anomaly.
pub fn scan_line_anomalies(
    orders: &LineIndex<'_, OrderLine>,
    invoices: &LineIndex<'_, ParsedInvoiceLine>,
) -> Vec<ReconciliationAnomaly> {
    let mut anomalies = Vec::new();

    for (key, entry) in orders.iter() {
        let qty = num(entry.line.qty);
        if qty < 0.0 {
            anomalies.push(ReconciliationAnomaly::NegativeQty {
                side: Side::Order,
                key: key.to_string(),
                qty,
            });
        }
    }

    for (key, entry) in invoices.iter() {
        let qty = num(Some(entry.line.qty));
        if qty < 0.0 {
            anomalies.push(ReconciliationAnomaly::NegativeQty {
                side: Side::Invoice,
                key: key.to_string(),
                qty,
            });
        }

        let unit = num(entry.line.unit_price);
        if unit < 0.0 {
            anomalies.push(ReconciliationAnomaly::NegativePrice { key: key.to_string(), unit });
        } else if unit == 0.0 {
            anomalies.push(ReconciliationAnomaly::ZeroPrice { key: key.to_string() });
        }
    }

    anomalies
}
