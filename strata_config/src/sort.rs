//! Total orders over record names.
//!
//! Record names establish merge precedence, so the comparison must be a
//! stable total order. Three strategies are provided: plain lexical
//! comparison, natural (numeric-aware) comparison and a caller-supplied
//! predicate.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Comparison strategy used to order value records before merging.
#[derive(Clone)]
pub enum RecordSort {
    /// Byte-wise string comparison.
    Lexical,
    /// Numeric runs compare by value; ties break on the full string.
    Natural,
    /// Caller-supplied comparison.
    Custom(Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>),
}

impl RecordSort {
    pub(crate) fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Lexical => a.cmp(b),
            Self::Natural => natural_cmp(a, b),
            Self::Custom(f) => f(a, b),
        }
    }
}

impl Default for RecordSort {
    fn default() -> Self {
        Self::Natural
    }
}

impl fmt::Debug for RecordSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => f.write_str("RecordSort::Lexical"),
            Self::Natural => f.write_str("RecordSort::Natural"),
            Self::Custom(_) => f.write_str("RecordSort::Custom(..)"),
        }
    }
}

/// Compare two names naturally: numeric runs compare by numeric value,
/// non-numeric runs compare as strings, and a numeric run sorts before a
/// non-numeric run at the same position. Full string comparison breaks ties
/// (so `01` and `1` still have a defined order).
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a;
    let mut right = b;

    while !left.is_empty() && !right.is_empty() {
        let (l_run, l_numeric, l_rest) = next_run(left);
        let (r_run, r_numeric, r_rest) = next_run(right);

        let ord = match (l_numeric, r_numeric) {
            (true, true) => numeric_run_cmp(l_run, r_run),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => l_run.cmp(r_run),
        };
        if ord != Ordering::Equal {
            return ord;
        }

        left = l_rest;
        right = r_rest;
    }

    // Shorter name first, then the full string as the final tie break.
    left.len().cmp(&right.len()).then_with(|| a.cmp(b))
}

/// Split off the leading run of digits or non-digits.
fn next_run(s: &str) -> (&str, bool, &str) {
    let numeric = s.starts_with(|c: char| c.is_ascii_digit());
    let end = s
        .find(|c: char| c.is_ascii_digit() != numeric)
        .unwrap_or(s.len());
    let (run, rest) = s.split_at(end);
    (run, numeric, rest)
}

/// Compare two all-digit runs by numeric value without parsing: strip
/// leading zeros, longer run wins, equal lengths compare lexically.
fn numeric_run_cmp(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compare two strings as whole numbers when both parse, falling back to
/// string comparison. Used for ordering unified-tree child keys, where
/// numeric array indices and alphabetic struct keys mix.
#[must_use]
pub fn float_cmp(a: &str, b: &str) -> Ordering {
    let a_num = a.parse::<f64>();
    let b_num = b.parse::<f64>();

    match (a_num, b_num) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
