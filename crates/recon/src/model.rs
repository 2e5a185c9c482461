use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::lenient;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One line extracted from an invoice document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInvoiceLine {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub product_id: Option<String>,
    /// Supplier SKU or barcode.
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub code: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub qty: f64,
    /// Ex-tax unit price.
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub unit_price: Option<f64>,
}

impl ParsedInvoiceLine {
    pub fn new(name: impl Into<String>, qty: f64) -> Self {
        Self {
            product_id: None,
            code: None,
            name: name.into(),
            qty,
            unit_price: None,
        }
    }
}

/// One canonical line from the submitted purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub qty: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub unit_cost: Option<f64>,
}

impl OrderLine {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            product_id: None,
            name: None,
            qty: None,
            unit_cost: None,
        }
    }
}

/// A complete reconciliation request as handed over by the receiving workflow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconInput {
    pub invoice_lines: Vec<ParsedInvoiceLine>,
    pub order_lines: Vec<OrderLine>,
    pub meta: ReconciliationMeta,
}

impl ReconInput {
    pub fn from_json(input: &str) -> Result<Self, ReconError> {
        serde_json::from_str(input).map_err(|e| ReconError::InputParse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Meta
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceSource {
    #[default]
    Csv,
    Pdf,
}

impl std::fmt::Display for InvoiceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Pdf => write!(f, "pdf"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    #[default]
    None,
    /// Pro-rata by each invoice line's extended value.
    ProrataExt,
}

/// Freight, surcharges and credits to spread over the invoice lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandedCost {
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub freight: f64,
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub surcharges: f64,
    #[serde(default, deserialize_with = "lenient::number_or_zero")]
    pub credits: f64,
    #[serde(default)]
    pub allocation: AllocationMode,
}

impl LandedCost {
    /// Net amount to allocate: freight + surcharges − credits.
    pub fn total(&self) -> f64 {
        lenient::num(Some(self.freight)) + lenient::num(Some(self.surcharges))
            - lenient::num(Some(self.credits))
    }
}

/// Provenance and configuration echoed into the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationMeta {
    #[serde(default)]
    pub source: InvoiceSource,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub storage_ref: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub po_number: Option<String>,
    /// Extraction confidence in [0, 1].
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub landed: Option<LandedCost>,
}

impl ReconciliationMeta {
    pub fn new(source: InvoiceSource) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    /// Trimmed strings, no blank warnings, confidence clamped to [0, 1],
    /// non-finite landed amounts zeroed.
    pub fn normalized(&self) -> Self {
        fn clean(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        Self {
            source: self.source,
            storage_ref: clean(&self.storage_ref),
            po_number: clean(&self.po_number),
            confidence: self
                .confidence
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 1.0)),
            warnings: self
                .warnings
                .iter()
                .map(|w| w.trim())
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect(),
            landed: self.landed.as_ref().map(|l| LandedCost {
                freight: lenient::num(Some(l.freight)),
                surcharges: lenient::num(Some(l.surcharges)),
                credits: lenient::num(Some(l.credits)),
                allocation: l.allocation,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

/// Which resolution tier produced a match key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchVia {
    ProductId,
    Code,
    Name,
}

impl std::fmt::Display for MatchVia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProductId => write!(f, "productId"),
            Self::Code => write!(f, "code"),
            Self::Name => write!(f, "name"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    pub id: String,
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub qty: f64,
    pub unit_cost: f64,
    pub ext: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSnapshot {
    pub product_id: Option<String>,
    pub code: Option<String>,
    pub name: String,
    pub qty: f64,
    pub unit_price: f64,
    /// qty × unitPrice plus `landed`.
    pub ext: f64,
    /// Landed-cost share already included in `ext`.
    pub landed: f64,
}

/// Invoice minus order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deltas {
    pub qty_delta: f64,
    pub price_delta: f64,
    pub value_delta: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFlags {
    pub new_item: bool,
    pub missing_item: bool,
    pub qty_changed: bool,
    pub price_changed: bool,
    pub zero_price: bool,
    pub zero_qty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationMatch {
    pub key: String,
    pub via: MatchVia,
    pub order: Option<OrderSnapshot>,
    pub invoice: Option<InvoiceSnapshot>,
    pub deltas: Deltas,
    pub flags: MatchFlags,
}

impl ReconciliationMatch {
    pub fn is_paired(&self) -> bool {
        self.order.is_some() && self.invoice.is_some()
    }
}

// ---------------------------------------------------------------------------
// Anomalies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Order,
    Invoice,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Order => write!(f, "order"),
            Self::Invoice => write!(f, "invoice"),
        }
    }
}

/// Line-level data irregularity. Informational, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationAnomaly {
    NegativeQty { side: Side, key: String, qty: f64 },
    NegativePrice { key: String, unit: f64 },
    ZeroPrice { key: String },
    DuplicateInvoiceKey { key: String },
    DuplicateOrderKey { key: String },
}

impl ReconciliationAnomaly {
    pub fn key(&self) -> &str {
        match self {
            Self::NegativeQty { key, .. }
            | Self::NegativePrice { key, .. }
            | Self::ZeroPrice { key }
            | Self::DuplicateInvoiceKey { key }
            | Self::DuplicateOrderKey { key } => key,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NegativeQty { .. } => "NEGATIVE_QTY",
            Self::NegativePrice { .. } => "NEGATIVE_PRICE",
            Self::ZeroPrice { .. } => "ZERO_PRICE",
            Self::DuplicateInvoiceKey { .. } => "DUPLICATE_INVOICE_KEY",
            Self::DuplicateOrderKey { .. } => "DUPLICATE_ORDER_KEY",
        }
    }
}

// ---------------------------------------------------------------------------
// Totals + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationTotals {
    pub order_value: f64,
    pub invoice_value: f64,
    pub value_delta: f64,
    pub lines_matched: usize,
    pub lines_invoice_only: usize,
    pub lines_order_only: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    pub qty_changed: usize,
    pub price_changed: usize,
    pub new_items: usize,
    pub missing_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub engine_version: String,
    pub meta: ReconciliationMeta,
    pub matches: Vec<ReconciliationMatch>,
    pub totals: ReconciliationTotals,
    pub anomalies: Vec<ReconciliationAnomaly>,
    pub summary: ReconciliationSummary,
}

impl ReconciliationResult {
    /// Anything a receiver would need to look at: new or missing lines,
    /// quantity or price changes on paired lines, or any anomaly.
    pub fn has_discrepancies(&self) -> bool {
        let s = &self.summary;
        s.qty_changed > 0
            || s.price_changed > 0
            || s.new_items > 0
            || s.missing_items > 0
            || !self.anomalies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_line_accepts_loose_numbers() {
        let line: ParsedInvoiceLine = serde_json::from_str(
            r#"{"productId": 42, "name": "Flour 25kg", "qty": "3", "unitPrice": "$18.50"}"#,
        )
        .unwrap();
        assert_eq!(line.product_id.as_deref(), Some("42"));
        assert_eq!(line.qty, 3.0);
        assert_eq!(line.unit_price, Some(18.5));
        assert!(line.code.is_none());
    }

    #[test]
    fn invoice_line_garbage_qty_is_zero() {
        let line: ParsedInvoiceLine =
            serde_json::from_str(r#"{"name": "x", "qty": "lots", "unitPrice": null}"#).unwrap();
        assert_eq!(line.qty, 0.0);
        assert_eq!(line.unit_price, None);
    }

    #[test]
    fn order_line_numeric_id() {
        let line: OrderLine = serde_json::from_str(r#"{"id": 7, "qty": 2}"#).unwrap();
        assert_eq!(line.id, "7");
        assert_eq!(line.qty, Some(2.0));
        assert_eq!(line.unit_cost, None);
    }

    #[test]
    fn input_requires_meta_and_arrays() {
        let err = ReconInput::from_json(r#"{"invoiceLines": [], "orderLines": []}"#).unwrap_err();
        assert!(err.to_string().contains("meta"));

        let err = ReconInput::from_json(r#"{"invoiceLines": {}, "orderLines": [], "meta": {}}"#)
            .unwrap_err();
        assert!(matches!(err, ReconError::InputParse(_)));
    }

    #[test]
    fn meta_defaults() {
        let input =
            ReconInput::from_json(r#"{"invoiceLines": [], "orderLines": [], "meta": {}}"#).unwrap();
        assert_eq!(input.meta.source, InvoiceSource::Csv);
        assert!(input.meta.landed.is_none());
        assert!(input.meta.warnings.is_empty());
    }

    #[test]
    fn landed_block_parses_allocation() {
        let meta: ReconciliationMeta = serde_json::from_str(
            r#"{"source": "pdf", "landed": {"freight": 12, "credits": "2", "allocation": "prorata_ext"}}"#,
        )
        .unwrap();
        let landed = meta.landed.unwrap();
        assert_eq!(landed.allocation, AllocationMode::ProrataExt);
        assert_eq!(landed.total(), 10.0);
        assert_eq!(meta.source, InvoiceSource::Pdf);
    }

    #[test]
    fn normalized_meta() {
        let meta = ReconciliationMeta {
            source: InvoiceSource::Pdf,
            storage_ref: Some("  ".into()),
            po_number: Some(" PO-1001 ".into()),
            confidence: Some(1.7),
            warnings: vec!["".into(), " low contrast ".into()],
            landed: Some(LandedCost {
                freight: f64::NAN,
                surcharges: 3.0,
                credits: 0.0,
                allocation: AllocationMode::ProrataExt,
            }),
        };
        let n = meta.normalized();
        assert_eq!(n.storage_ref, None);
        assert_eq!(n.po_number.as_deref(), Some("PO-1001"));
        assert_eq!(n.confidence, Some(1.0));
        assert_eq!(n.warnings, vec!["low contrast".to_string()]);
        assert_eq!(n.landed.unwrap().freight, 0.0);
    }

    #[test]
    fn anomaly_wire_shape() {
        let a = ReconciliationAnomaly::NegativeQty {
            side: Side::Invoice,
            key: "pid:P1".into(),
            qty: -2.0,
        };
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["type"], "NEGATIVE_QTY");
        assert_eq!(v["side"], "invoice");
        assert_eq!(v["key"], "pid:P1");
        assert_eq!(a.code(), "NEGATIVE_QTY");

        let d = ReconciliationAnomaly::DuplicateInvoiceKey { key: "code:sku9".into() };
        assert_eq!(serde_json::to_value(&d).unwrap()["type"], "DUPLICATE_INVOICE_KEY");
        assert_eq!(d.key(), "code:sku9");
    }

    #[test]
    fn via_wire_names() {
        assert_eq!(serde_json::to_value(MatchVia::ProductId).unwrap(), "productId");
        assert_eq!(MatchVia::Code.to_string(), "code");
    }
}
