//! Balanced row partitioning.
//!
//! A table of `n` rows and a limit of `m` rows per partition yields
//! `max(1, ceil(n / m))` partitions whose sizes differ by at most one: the first
//! `n % k` partitions carry the extra row. Rows are never reordered.

use crate::table::{Row, Table};
use std::num::NonZeroUsize;

/// A contiguous slice of a table's rows, with the full header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partition<'a> {
    /// 0-based position in the split.
    pub index: usize,
    pub columns: &'a [String],
    pub rows: &'a [Row],
}

impl Partition<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Number of partitions for `total_rows` at `max_rows` rows each, never below one.
#[must_use]
pub fn partition_count(total_rows: usize, max_rows: NonZeroUsize) -> usize {
    total_rows.div_ceil(max_rows.get()).max(1)
}

/// Split `table` into balanced, order-preserving partitions.
///
/// An empty table still yields one (empty) partition so that a header-only
/// file produces a header-only output.
#[must_use]
pub fn split(table: &Table, max_rows: NonZeroUsize) -> Vec<Partition<'_>> {
    let parts = partition_count(table.len(), max_rows);
    split_ranges(table.len(), parts)
        .into_iter()
        .enumerate()
        .map(|(index, (start, end))| Partition {
            index,
            columns: table.columns(),
            rows: &table.rows()[start..end],
        })
        .collect()
}

/// Split `[0, len)` into exactly `parts` contiguous `(start, end)` ranges.
///
/// Remainder rows go to the leading ranges. With `len < parts` the trailing
/// ranges are empty; callers keep `parts <= max(1, len)`.
fn split_ranges(len: usize, parts: usize) -> Vec<(usize, usize)> {
    let parts = parts.max(1);
    let base = len / parts;
    let rem = len % parts;

    let mut out = Vec::with_capacity(parts);
    let mut start = 0usize;
    for idx in 0..parts {
        let end = start + base + usize::from(idx < rem);
        out.push((start, end));
        start = end;
    }
    out
}
