use std::collections::HashMap;

use crate::key::{invoice_key, order_key, ResolvedKey};
use crate::model::{MatchVia, OrderLine, ParsedInvoiceLine, ReconciliationAnomaly};

/// A line retained in an index under its resolved key.
#[derive(Debug)]
pub struct IndexedLine<'a, T> {
    pub line: &'a T,
    pub via: MatchVia,
    /// Position of the line in the caller's input slice.
    pub position: usize,
}

/// Key → first line seen with that key. Remembers first-seen key order.
#[derive(Debug)]
pub struct LineIndex<'a, T> {
    entries: HashMap<String, IndexedLine<'a, T>>,
    keys: Vec<String>,
}

impl<'a, T> LineIndex<'a, T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            keys: Vec::with_capacity(capacity),
        }
    }

    /// Insert unless the key is taken. Returns false for a duplicate.
    fn insert_first(&mut self, resolved: ResolvedKey, line: &'a T, position: usize) -> bool {
        if self.entries.contains_key(&resolved.key) {
            return false;
        }
        self.keys.push(resolved.key.clone());
        self.entries.insert(
            resolved.key,
            IndexedLine { line, via: resolved.via, position },
        );
        true
    }

    pub fn get(&self, key: &str) -> Option<&IndexedLine<'a, T>> {
        self.entries.get(key)
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Entries in first-seen key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexedLine<'a, T>)> {
        self.keys.iter().map(|k| (k.as_str(), &self.entries[k]))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn build_index<'a, T>(
    lines: &'a [T],
    resolve: impl Fn(&T) -> ResolvedKey,
    duplicate: impl Fn(String) -> ReconciliationAnomaly,
    anomalies: &mut Vec<ReconciliationAnomaly>,
) -> LineIndex<'a, T> {
    let mut index = LineIndex::with_capacity(lines.len());
    for (position, line) in lines.iter().enumerate() {
        let resolved = resolve(line);
        let key = resolved.key.clone();
        if !index.insert_first(resolved, line, position) {
            tracing::debug!(%key, position, "duplicate key, keeping first occurrence");
            anomalies.push(duplicate(key));
        }
    }
    index
}

/// Index order lines; repeats become `DUPLICATE_ORDER_KEY`.
pub fn index_orders<'a>(
    lines: &'a [OrderLine],
    anomalies: &mut Vec<ReconciliationAnomaly>,
) -> LineIndex<'a, OrderLine> {
    build_index(
        lines,
        order_key,
        |key| ReconciliationAnomaly::DuplicateOrderKey { key },
        anomalies,
    )
}

/// Index invoice lines; repeats become `DUPLICATE_INVOICE_KEY`.
pub fn index_invoices<'a>(
    lines: &'a [ParsedInvoiceLine],
    anomalies: &mut Vec<ReconciliationAnomaly>,
) -> LineIndex<'a, ParsedInvoiceLine> {
    build_index(
        lines,
        invoice_key,
        |key| ReconciliationAnomaly::DuplicateInvoiceKey { key },
        anomalies,
    )
}
