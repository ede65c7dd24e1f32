//! Sparse sequence-number allocation for ordered per-view mark lists
//! (spec.md §4.2).
//!
//! The source keeps marks in a doubly tagged intrusive list and assigns each
//! one a sparse integer `seq` so relative order can be compared in O(1)
//! without walking the list. spec.md §9 explicitly invites replacing the
//! intrusive list with "an order-maintenance data structure (e.g. a
//! BTreeMap keyed by a generated sequence number)" — that's exactly what
//! `View` does (see `lib.rs`); this module owns the allocation policy that
//! keeps those sequence numbers sparse so inserts stay cheap.

/// Gap used when appending past the last mark in a view.
pub const APPEND_GAP: i64 = 128;

/// Spacing used when a local region is renumbered from scratch.
pub const SPREAD_GAP: i64 = 256;

/// Renumbering never packs marks closer than this; if a requested window
/// can't fit at `SPREAD_GAP` it keeps halving down to this floor before
/// falling back to renumbering the whole view.
pub const SPREAD_FLOOR: i64 = 4;

/// Pick a seq strictly between `before` and `after` (either end may be
/// absent, meaning "start"/"end" of the view). Returns `None` when there's
/// no integer gap left, signalling the caller to renumber first.
pub fn midpoint(before: Option<i64>, after: Option<i64>) -> Option<i64> {
    match (before, after) {
        (None, None) => Some(0),
        (None, Some(a)) => a.checked_sub(APPEND_GAP),
        (Some(b), None) => b.checked_add(APPEND_GAP),
        (Some(b), Some(a)) => {
            if a.saturating_sub(b) > 1 {
                Some(b + (a - b) / 2)
            } else {
                None
            }
        }
    }
}

/// Reassign `count` seq values evenly spaced by `gap` starting at `start`.
/// Used to spread out a dense run of marks before retrying an insert.
pub fn spread_seqs(start: i64, count: usize, gap: i64) -> Vec<i64> {
    tracing::debug!(start, count, gap, "spreading seq values");
    (0..count as i64).map(|i| start + i * gap).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_empty_view_is_zero() {
        assert_eq!(midpoint(None, None), Some(0));
    }

    #[test]
    fn midpoint_append_uses_gap() {
        assert_eq!(midpoint(Some(10), None), Some(10 + APPEND_GAP));
        assert_eq!(midpoint(None, Some(10)), Some(10 - APPEND_GAP));
    }

    #[test]
    fn midpoint_between_splits_the_gap() {
        assert_eq!(midpoint(Some(10), Some(20)), Some(15));
    }

    #[test]
    fn midpoint_adjacent_has_no_room() {
        assert_eq!(midpoint(Some(10), Some(11)), None);
        assert_eq!(midpoint(Some(10), Some(10)), None);
    }

    #[test]
    fn spread_seqs_is_evenly_spaced() {
        assert_eq!(spread_seqs(0, 4, SPREAD_GAP), vec![0, 256, 512, 768]);
    }
}
