//! Column totals for tables of monetary amounts.
//!
//! Cells are summed after stripping a currency marker. A cell that does not
//! parse to a finite number contributes zero and is logged; aggregation never
//! fails.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default columns summed in a totals row (the 3rd and 4th).
pub const DEFAULT_TOTAL_COLUMNS: [usize; 2] = [2, 3];

/// Currency marker used to parse and format amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyFormat {
    symbol: String,
}

impl CurrencyFormat {
    /// Format with the given marker.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    /// The marker.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Parse a cell, ignoring the marker and surrounding whitespace.
    ///
    /// Returns `None` for text that is not a finite number.
    pub fn parse(&self, cell: &str) -> Option<f64> {
        let stripped = if self.symbol.is_empty() {
            cell.to_string()
        } else {
            cell.replace(self.symbol.as_str(), "")
        };
        stripped
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Marker followed by the amount, always with a fractional part:
    /// `8000.0`, `75.0`, `2500.5`.
    pub fn format(&self, amount: f64) -> String {
        let mut digits = amount.to_string();
        if amount.is_finite() && !digits.contains('.') {
            digits.push_str(".0");
        }
        format!("{}{}", self.symbol, digits)
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::new("₹")
    }
}

/// Running per-column sums.
#[derive(Debug, Clone)]
pub struct TableAggregate {
    currency: CurrencyFormat,
    totals: BTreeMap<usize, f64>,
}

impl TableAggregate {
    /// Track `columns`, all starting at zero.
    pub fn new(columns: impl IntoIterator<Item = usize>, currency: CurrencyFormat) -> Self {
        Self {
            currency,
            totals: columns.into_iter().map(|c| (c, 0.0)).collect(),
        }
    }

    /// Aggregate `rows` in one go.
    pub fn from_rows<R: AsRef<[String]>>(
        columns: impl IntoIterator<Item = usize>,
        rows: &[R],
        currency: CurrencyFormat,
    ) -> Self {
        let mut aggregate = Self::new(columns, currency);
        for row in rows {
            aggregate.accumulate(row.as_ref());
        }
        aggregate
    }

    /// Add one row. Tracked columns missing from the row are skipped.
    pub fn accumulate(&mut self, row: &[String]) {
        for (column, total) in self.totals.iter_mut() {
            let Some(cell) = row.get(*column) else {
                continue;
            };
            match self.currency.parse(cell) {
                Some(value) => *total += value,
                None => log::warn!(
                    "Column {}: cannot parse amount {:?}, counting it as zero",
                    column,
                    cell
                ),
            }
        }
    }

    /// Whether `column` is tracked.
    pub fn tracks(&self, column: usize) -> bool {
        self.totals.contains_key(&column)
    }

    /// Sum for `column`, if tracked.
    pub fn total(&self, column: usize) -> Option<f64> {
        self.totals.get(&column).copied()
    }

    /// Formatted sum for `column`, if tracked.
    pub fn formatted(&self, column: usize) -> Option<String> {
        self.total(column).map(|t| self.currency.format(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_parse_strips_marker() {
        let rupee = CurrencyFormat::default();
        assert_eq!(rupee.parse("₹5000"), Some(5000.0));
        assert_eq!(rupee.parse("  50 "), Some(50.0));
        assert_eq!(rupee.parse("₹ 2.5"), Some(2.5));
        assert_eq!(rupee.parse("N/A"), None);
        assert_eq!(rupee.parse(""), None);
        assert_eq!(rupee.parse("NaN"), None);
        assert_eq!(rupee.parse("inf"), None);
    }

    #[test]
    fn test_format_keeps_fraction() {
        let rupee = CurrencyFormat::default();
        assert_eq!(rupee.format(8000.0), "₹8000.0");
        assert_eq!(rupee.format(75.0), "₹75.0");
        assert_eq!(rupee.format(2500.5), "₹2500.5");
        assert_eq!(CurrencyFormat::new("").format(0.0), "0.0");
    }

    #[test]
    fn test_totals_for_statement() {
        let data = rows(&[&["1", "r1", "5000", "50"], &["2", "r2", "3000", "25"]]);
        let agg = TableAggregate::from_rows(DEFAULT_TOTAL_COLUMNS, &data, CurrencyFormat::default());
        assert_eq!(agg.formatted(2).as_deref(), Some("₹8000.0"));
        assert_eq!(agg.formatted(3).as_deref(), Some("₹75.0"));
        assert_eq!(agg.formatted(1), None);
    }

    #[test]
    fn test_unparsable_contributes_zero() {
        let data = rows(&[&["1", "r1", "N/A", "50"], &["2", "r2", "3000", ""]]);
        let agg = TableAggregate::from_rows([2, 3], &data, CurrencyFormat::default());
        assert_eq!(agg.total(2), Some(3000.0));
        assert_eq!(agg.total(3), Some(50.0));
    }

    #[test]
    fn test_out_of_range_column_is_zero() {
        let data = rows(&[&["a", "b"]]);
        let agg = TableAggregate::from_rows([7], &data, CurrencyFormat::default());
        assert!(agg.tracks(7));
        assert_eq!(agg.total(7), Some(0.0));
    }
}
