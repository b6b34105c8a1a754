use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Default completion-time buckets, in display order.
/// The last entry is the open-ended overflow bucket; its `z` prefix keeps it
/// after the numeric ranges under a plain lexical sort.
pub const DEFAULT_BUCKETS: &[&str] = &[
    "00-10", "11-20", "21-30", "31-40", "41-50",
    "51-60", "61-70", "71-80", "81-90", "91-100", "z100+",
];

/// Prefix that forces the overflow code to sort last. Stripped for display.
const OVERFLOW_SORT_PREFIX: char = 'z';

/// Matches a closed hour range like "21-30".
static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*-\s*(\d+)$").unwrap());

#[derive(Error, Debug, PartialEq)]
pub enum BucketError {
    #[error("Bucket order is empty")]
    Empty,
    #[error("Duplicate bucket code: {0}")]
    Duplicate(String),
}

/// The fixed, ordered set of bucket codes every artist series is projected onto.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketDefinition {
    codes: Vec<String>,
    /// (index into `codes`, upper bound in hours) for every closed range code.
    ranges: Vec<(usize, u32)>,
}

impl Default for BucketDefinition {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKETS.iter().map(|s| s.to_string()).collect())
            .expect("default bucket order is valid")
    }
}

impl BucketDefinition {
    /// Build an order from a list of codes. The last code is the overflow bucket.
    pub fn new(codes: Vec<String>) -> Result<Self, BucketError> {
        if codes.is_empty() {
            return Err(BucketError::Empty);
        }

        let mut seen = HashSet::new();
        for code in &codes {
            if !seen.insert(code.as_str()) {
                return Err(BucketError::Duplicate(code.clone()));
            }
        }

        let last = codes.len() - 1;
        let ranges = codes
            .iter()
            .enumerate()
            .take(last)
            .filter_map(|(i, code)| {
                let caps = RANGE_RE.captures(code.trim())?;
                let hi: u32 = caps[2].parse().ok()?;
                Some((i, hi))
            })
            .collect();

        Ok(Self { codes, ranges })
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Ordinal index of a code, or `None` if it isn't part of this order.
    pub fn position(&self, code: &str) -> Option<usize> {
        self.codes.iter().position(|c| c == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.position(code).is_some()
    }

    /// The open-ended overflow code (always the last one).
    pub fn overflow(&self) -> &str {
        self.codes.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_overflow(&self, code: &str) -> bool {
        code == self.overflow()
    }

    /// Human-readable label: the overflow sentinel loses its sort prefix
    /// ("z100+" → "100+"), everything else is shown verbatim.
    pub fn display_label<'a>(&self, code: &'a str) -> &'a str {
        if self.is_overflow(code) {
            code.strip_prefix(OVERFLOW_SORT_PREFIX).unwrap_or(code)
        } else {
            code
        }
    }

    /// Classify an elapsed-hours value into its bucket code.
    ///
    /// Closed ranges act as upper bounds in order, so fractional hours that fall
    /// between two ranges (10.5 between "00-10" and "11-20") go to the next one.
    /// Anything beyond the last closed range lands in the overflow bucket.
    /// Returns `None` for negative or NaN input.
    pub fn bucket_for_hours(&self, hours: f64) -> Option<&str> {
        if hours.is_nan() || hours < 0.0 {
            return None;
        }
        for &(idx, hi) in &self.ranges {
            if hours <= f64::from(hi) {
                return Some(&self.codes[idx]);
            }
        }
        Some(self.overflow())
    }
}
