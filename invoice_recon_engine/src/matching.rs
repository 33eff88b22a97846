//! Tolerance-based two-way matching of invoice lines against a reference purchase order.
//!
//! Lines are compared **positionally**: line *i* of the invoice against line *i* of the reference order. There is
//! no key-based join on SKU or description, so if line ordering differs between extraction and the reference
//! order, lines will be mis-paired. That ambiguity is inherited from the upstream process and is deliberately
//! preserved here; do not introduce a key join without a reliable key.
//!
//! Tolerances are computed from the **invoice's own** quantity and price, not the reference's. The check is
//! therefore asymmetric: `qty=100` invoiced against `qty=101` referenced is not the same case as the reverse,
//! and swapping the basis changes pass/fail outcomes near the boundary.

use ivr_common::Money;
use orderdesk_tools::ReferenceLine;
use serde::{Deserialize, Serialize};

/// Tolerance ratios for the matching engine. Passed in explicitly at construction; never read from the
/// environment by the engine itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingConfig {
    /// Allowed quantity deviation as a fraction of the invoiced quantity.
    pub qty_tolerance_ratio: f64,
    /// Allowed unit-price deviation as a fraction of the invoiced unit price.
    pub price_tolerance_ratio: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self { qty_tolerance_ratio: 0.01, price_tolerance_ratio: 0.02 }
    }
}

/// The outcome of checking a single invoice line against its reference line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineCheck {
    pub position: usize,
    pub quantity_ok: bool,
    pub price_ok: bool,
}

impl LineCheck {
    pub fn passed(&self) -> bool {
        self.quantity_ok && self.price_ok
    }
}

/// Per-line detail of a match run. Serialized into the `po_check` audit payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub matched: bool,
    /// True when the reference order had fewer lines than the invoice. Matching fails fast in that case and
    /// `line_checks` only covers the lines that were compared.
    pub reference_short: bool,
    pub line_checks: Vec<LineCheck>,
}

/// Quantity passes iff `|q_i - q_r| <= max(ratio * q_i, 0)`. A zero invoiced quantity requires an exact match.
pub fn quantity_within_tolerance(q_i: f64, q_r: f64, ratio: f64) -> bool {
    let tolerance = (ratio * q_i).max(0.0);
    (q_i - q_r).abs() <= tolerance
}

/// Price passes iff `|p_i - p_r| <= ratio * p_i`, with both sides in whole currency units. A zero invoiced
/// price requires an exact match.
pub fn price_within_tolerance(p_i: Money, p_r: f64, ratio: f64) -> bool {
    let invoiced = p_i.to_f64();
    let tolerance = (ratio * invoiced).max(0.0);
    (invoiced - p_r).abs() <= tolerance
}

/// Compares invoice lines `(quantity, unit price)` against the reference lines, position by position.
///
/// * A reference order shorter than the invoice fails immediately; no partial credit.
/// * Extra reference lines beyond the invoice's length are ignored.
/// * Pure and deterministic; no side effects.
pub fn match_lines(
    invoice_lines: &[(f64, Money)],
    reference_lines: &[ReferenceLine],
    config: &MatchingConfig,
) -> MatchReport {
    let mut line_checks = Vec::with_capacity(invoice_lines.len());
    for (position, (quantity, price)) in invoice_lines.iter().enumerate() {
        let reference = match reference_lines.get(position) {
            Some(r) => r,
            None => return MatchReport { matched: false, reference_short: true, line_checks },
        };
        let check = LineCheck {
            position,
            quantity_ok: quantity_within_tolerance(*quantity, reference.quantity, config.qty_tolerance_ratio),
            price_ok: price_within_tolerance(*price, reference.price, config.price_tolerance_ratio),
        };
        line_checks.push(check);
    }
    let matched = line_checks.iter().all(LineCheck::passed);
    MatchReport { matched, reference_short: false, line_checks }
}

/// Convenience wrapper returning only the overall verdict.
pub fn lines_match(invoice_lines: &[(f64, Money)], reference_lines: &[ReferenceLine], config: &MatchingConfig) -> bool {
    match_lines(invoice_lines, reference_lines, config).matched
}
