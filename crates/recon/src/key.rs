//! Match-key resolution.
//!
//! Every line gets exactly one key, chosen by a fixed precedence:
//! `pid:<productId>` → `code:<code>` (invoice only) → `name:<normalized name>`.
//! Order lines without a usable name fall back to their line id.

use crate::model::{MatchVia, OrderLine, ParsedInvoiceLine};

/// A resolved key plus the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedKey {
    pub key: String,
    pub via: MatchVia,
}

impl ResolvedKey {
    fn product_id(pid: &str) -> Self {
        Self { key: format!("pid:{pid}"), via: MatchVia::ProductId }
    }

    fn code(code: &str) -> Self {
        Self { key: format!("code:{}", code.trim().to_lowercase()), via: MatchVia::Code }
    }

    fn name(normalized: &str) -> Self {
        Self { key: format!("name:{normalized}"), via: MatchVia::Name }
    }
}

/// The side a line comes from. Each side is keyed on its own.
#[derive(Debug, Clone, Copy)]
pub enum LineRef<'a> {
    Invoice(&'a ParsedInvoiceLine),
    Order(&'a OrderLine),
}

/// Lowercase, collapse whitespace runs, keep only word characters,
/// spaces, `-`, `.` and `/`, then trim.
pub fn normalize_name(raw: &str) -> String {
    let collapsed = raw.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | ' ' | '-' | '.' | '/'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Resolve the single match key for a line.
pub fn resolve_key(line: LineRef<'_>) -> ResolvedKey {
    let (invoice, order) = match line {
        LineRef::Invoice(inv) => (Some(inv), None),
        LineRef::Order(ord) => (None, Some(ord)),
    };

    // 1. productId
    let pid = non_empty(invoice.and_then(|i| i.product_id.as_deref()))
        .or_else(|| non_empty(order.and_then(|o| o.product_id.as_deref())));
    if let Some(pid) = pid {
        return ResolvedKey::product_id(pid);
    }

    // 2. supplier code
    if let Some(code) = non_empty(invoice.and_then(|i| i.code.as_deref())) {
        return ResolvedKey::code(code);
    }

    // 3. normalized name
    let name = invoice
        .map(|i| normalize_name(&i.name))
        .filter(|n| !n.is_empty())
        .or_else(|| {
            order
                .and_then(|o| o.name.as_deref())
                .map(normalize_name)
                .filter(|n| !n.is_empty())
        });
    if let Some(name) = name {
        return ResolvedKey::name(&name);
    }

    // 4. order line id
    match order {
        Some(o) => ResolvedKey::name(&normalize_name(&o.id)),
        None => ResolvedKey::name(""),
    }
}

pub fn invoice_key(line: &ParsedInvoiceLine) -> ResolvedKey {
    resolve_key(LineRef::Invoice(line))
}

pub fn order_key(line: &OrderLine) -> ResolvedKey {
    resolve_key(LineRef::Order(line))
}
