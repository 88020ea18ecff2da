//! Quote presentation helpers for the CLI.
//!
//! Indian rupee formatting (lakh/crore), a flat-rate premium estimate, the
//! canned demo inventory, and a plain-text quote document.

use crate::output::{ExtractionResult, Item, RiskFactor};
use chrono::NaiveDate;
use std::fmt::Write;

/// Annual premium rate applied to the total asset value (0.35 %).
pub const DEFAULT_ANNUAL_RATE: f64 = 0.0035;

const LAKH: f64 = 100_000.0;
const CRORE: f64 = 10_000_000.0;

/// Group a whole rupee amount the Indian way: `3,60,000`, `1,23,45,678`.
pub fn group_indian(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Compact display amount: `6.0 Cr`, `3.6 L`, or grouped rupees below a lakh.
pub fn format_inr(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();
    if abs >= CRORE {
        format!("{sign}{:.1} Cr", abs / CRORE)
    } else if abs >= LAKH {
        format!("{sign}{:.1} L", abs / LAKH)
    } else {
        format!("{sign}{}", group_indian(abs.round() as u64))
    }
}

/// Monthly premium for `total_value` at `annual_rate`, in whole rupees.
pub fn monthly_premium(total_value: f64, annual_rate: f64) -> u64 {
    (total_value * annual_rate / 12.0).round().max(0.0) as u64
}

/// The five-item inventory shown in demo mode.
pub fn demo_result() -> ExtractionResult {
    let item = |name: &str, category: &str, condition: &str, price: f64, risk: RiskFactor| Item {
        name: name.to_string(),
        category: category.to_string(),
        condition: condition.to_string(),
        estimated_price_inr: price,
        risk_factor: risk,
    };

    ExtractionResult {
        items: vec![
            item("Sony Bravia 55\" 4K TV", "Electronics", "Used - Good", 65000.0, RiskFactor::Medium),
            item("Leather Sectional Sofa (3-Piece)", "Furniture", "Used - Very Good", 85000.0, RiskFactor::Low),
            item("MacBook Pro M2 (14-inch)", "Electronics", "Used - Excellent", 140000.0, RiskFactor::High),
            item("Persian Wool Rug (8x10)", "Decor", "Used - Good", 25000.0, RiskFactor::Medium),
            item("Dining Table (Teak Wood)", "Furniture", "Used - Good", 45000.0, RiskFactor::Low),
        ],
        total_value: 360000.0,
        recommended_coverage: 400000.0,
    }
}

/// Render a plain-text quote: header, summary, item table, disclaimer.
pub fn render_quote(result: &ExtractionResult, date: NaiveDate) -> String {
    let mut out = String::new();
    let rule = "=".repeat(78);

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "DekhoValue - Instant Insurance Quote");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Date: {}", date.format("%d/%m/%Y"));
    let _ = writeln!(out, "Quote Reference: #DV-{}", date.format("%Y%m%d"));
    let _ = writeln!(out);
    let _ = writeln!(out, "Coverage Summary");
    let _ = writeln!(
        out,
        "  Total Asset Value:    Rs. {}",
        group_indian(result.total_value.round().max(0.0) as u64)
    );
    let _ = writeln!(
        out,
        "  Recommended Coverage: Rs. {}",
        group_indian(result.recommended_coverage.round().max(0.0) as u64)
    );
    let _ = writeln!(
        out,
        "  Monthly Premium:      Rs. {}",
        group_indian(monthly_premium(result.total_value, DEFAULT_ANNUAL_RATE))
    );
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "{:<32} {:<12} {:<16} {:>10} {:<6}",
        "Item Name", "Category", "Condition", "Est. Price", "Risk"
    );
    let _ = writeln!(out, "{}", "-".repeat(78));
    for item in &result.items {
        let _ = writeln!(
            out,
            "{:<32} {:<12} {:<16} {:>10} {:<6}",
            truncate(&item.name, 32),
            truncate(&item.category, 12),
            truncate(&item.condition, 16),
            group_indian(item.estimated_price_inr.round().max(0.0) as u64),
            item.risk_factor
        );
    }
    if result.items.is_empty() {
        let _ = writeln!(out, "(no insurable assets identified)");
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Disclaimer: This is an AI-generated estimate. Final premium subject to verification."
    );
    out
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(width.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indian_grouping() {
        assert_eq!(group_indian(0), "0");
        assert_eq!(group_indian(999), "999");
        assert_eq!(group_indian(1000), "1,000");
        assert_eq!(group_indian(65000), "65,000");
        assert_eq!(group_indian(360000), "3,60,000");
        assert_eq!(group_indian(12345678), "1,23,45,678");
    }

    #[test]
    fn compact_format_thresholds() {
        assert_eq!(format_inr(950.0), "950");
        assert_eq!(format_inr(65000.0), "65,000");
        assert_eq!(format_inr(360000.0), "3.6 L");
        assert_eq!(format_inr(25_000_000.0), "2.5 Cr");
    }

    #[test]
    fn premium_uses_flat_rate() {
        // 360000 * 0.0035 / 12 = 105
        assert_eq!(monthly_premium(360000.0, DEFAULT_ANNUAL_RATE), 105);
        assert_eq!(monthly_premium(0.0, DEFAULT_ANNUAL_RATE), 0);
    }

    #[test]
    fn demo_totals_are_consistent() {
        let demo = demo_result();
        assert_eq!(demo.items.len(), 5);
        assert_eq!(demo.items_total(), demo.total_value);
        assert!(demo.recommended_coverage >= demo.total_value);
    }

    #[test]
    fn quote_contains_summary_rows_and_disclaimer() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let text = render_quote(&demo_result(), date);
        assert!(text.contains("Date: 19/10/2026"));
        assert!(text.contains("#DV-20261019"));
        assert!(text.contains("Rs. 3,60,000"));
        assert!(text.contains("Rs. 4,00,000"));
        assert!(text.contains("MacBook Pro M2"));
        assert!(text.contains("1,40,000"));
        assert!(!text.contains("1.4 L"));
        assert!(text.contains("Disclaimer: This is an AI-generated estimate."));
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
