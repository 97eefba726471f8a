//! Half-open clock ranges and their set difference
//!
//! A [`Range`] is `[start, end)`. A [`Fragmented`] range is an ordered list of
//! non-overlapping ranges. [`diff_range`] answers "which clocks of the new
//! set are not in the old set" for sync negotiation.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: u64,
    pub end: u64,
}

impl Range {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, clock: u64) -> bool {
        clock >= self.start && clock < self.end
    }

    /// Whether `other` lies entirely inside this range
    pub fn covers(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two ranges overlap or touch
    fn joinable(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Ordered, non-overlapping ranges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragmented {
    ranges: Vec<Range>,
}

impl Fragmented {
    pub fn new(ranges: Vec<Range>) -> Self {
        Self { ranges }
    }

    /// Append a range as is. Call [`Fragmented::squash`] to normalize.
    pub fn push(&mut self, range: Range) {
        self.ranges.push(range);
    }

    /// Sort and merge so the ranges are ordered and disjoint again
    pub fn squash(&mut self) {
        if self.ranges.len() < 2 {
            return;
        }
        self.ranges.sort_by_key(|r| r.start);
        let mut merged: Vec<Range> = Vec::with_capacity(self.ranges.len());
        for range in self.ranges.drain(..) {
            match merged.last_mut() {
                Some(last) if last.joinable(&range) => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }
        self.ranges = merged;
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Range> {
        self.ranges.iter()
    }
}

impl From<Range> for Fragmented {
    fn from(range: Range) -> Self {
        Self::new(vec![range])
    }
}

/// A set of clocks expressed as ordered ranges
pub trait OrderRange {
    fn ranges(&self) -> &[Range];

    fn ranges_len(&self) -> usize {
        self.ranges().len()
    }

    fn is_empty(&self) -> bool {
        self.ranges().iter().all(Range::is_empty)
    }

    fn contains(&self, clock: u64) -> bool {
        self.ranges().iter().any(|r| r.contains(clock))
    }

    /// Clocks of `new` that this set lacks, or nothing if this set is not
    /// covered by `new`
    fn diff_range(&self, new: &dyn OrderRange) -> Vec<Range> {
        diff_range(self.ranges(), new.ranges())
    }
}

impl OrderRange for Range {
    fn ranges(&self) -> &[Range] {
        std::slice::from_ref(self)
    }
}

impl OrderRange for Fragmented {
    fn ranges(&self) -> &[Range] {
        &self.ranges
    }
}

/// Whether every old range lies inside a single new range
pub fn is_covered(old: &[Range], new: &[Range]) -> bool {
    old.iter()
        .all(|o| o.is_empty() || new.iter().any(|n| n.covers(o)))
}

/// Gaps of `new` not filled by `old`.
///
/// Both inputs must be ordered. When `old` is not covered by `new` the
/// difference is undefined and the result is empty.
pub fn diff_range(old: &[Range], new: &[Range]) -> Vec<Range> {
    if !is_covered(old, new) {
        debug!(old = ?old, new = ?new, "Old ranges not covered by new ranges, empty diff");
        return Vec::new();
    }

    let mut diffs = Vec::new();
    let mut cursor = 0;
    for n in new.iter().filter(|n| !n.is_empty()) {
        let first = cursor;
        while cursor < old.len() && old[cursor].start < n.end {
            cursor += 1;
        }

        let mut last_end = n.start;
        for o in old[first..cursor].iter().filter(|o| !o.is_empty()) {
            if o.start > last_end {
                diffs.push(Range::new(last_end, o.start));
            }
            last_end = o.end;
        }
        if n.end > last_end {
            diffs.push(Range::new(last_end, n.end));
        }
    }
    diffs
}
