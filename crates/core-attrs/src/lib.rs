//! `AttrSet`: an ordered key/value store with numeric-aware collation
//! (spec.md §3 "AttrSet", §4.1 "AttrSet (L0)").
//!
//! Storage details stay encapsulated behind a small, well-documented type,
//! the same way the other layout/render types in this workspace do:
//! entries live in a sequence of size-bounded
//! `Chunk`s kept in collation order, mirroring the C source's "chunk of
//! packed key\0value\0 pairs, split on overflow" scheme from spec.md §4.1.
//! The safe-Rust rewrite trades the C version's O(chunks) trim/copy-tail for
//! O(entries) — see DESIGN.md for the rationale (this is the kind of
//! representation swap spec.md §9's Design Notes explicitly invites).

pub mod collation;
pub mod error;

use collation::{compare_keys, format_prefix, parse_prefix};
use error::{CoreError, CoreResult};
use std::cmp::Ordering;

/// Combined byte budget for a single `(key, value)` pair (spec.md §3).
pub const MAX_ATTRIBUTE_BYTES: usize = 510;

/// Soft byte budget per storage chunk (spec.md §4.1).
const CHUNK_MAX_BYTES: usize = 510;

/// A single key/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    fn packed_len(&self) -> usize {
        self.key.len() + 1 + self.value.len() + 1
    }
}

#[derive(Debug, Clone, Default)]
struct Chunk {
    entries: Vec<Attribute>,
}

impl Chunk {
    fn byte_len(&self) -> usize {
        self.entries.iter().map(Attribute::packed_len).sum()
    }
}

/// An ordered sequence of [`Attribute`]s in strict collation order.
#[derive(Debug, Clone, Default)]
pub struct AttrSet {
    chunks: Vec<Chunk>,
}

impl AttrSet {
    pub fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    /// Total number of entries (not part of spec.md's listed API, but
    /// handy for tests and for `Doc` implementations sizing buffers).
    pub fn len(&self) -> usize {
        self.chunks.iter().map(|c| c.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn iter_entries(&self) -> impl Iterator<Item = &Attribute> {
        self.chunks.iter().flat_map(|c| c.entries.iter())
    }

    /// Locate `(chunk_index, entry_index)` of the entry that collates equal
    /// to `key`, or the insertion point if absent (as `Err`).
    fn locate(&self, key: &str) -> Result<(usize, usize), (usize, usize)> {
        for (ci, chunk) in self.chunks.iter().enumerate() {
            match chunk.entries.binary_search_by(|e| compare_keys(&e.key, key)) {
                Ok(ei) => return Ok((ci, ei)),
                Err(ei) => {
                    // If this insertion point is strictly before the end of
                    // the chunk, or this is the last chunk, it belongs here.
                    if ei < chunk.entries.len() || ci == self.chunks.len() - 1 {
                        return Err((ci, ei));
                    }
                }
            }
        }
        Err((0, 0))
    }

    /// *lookup*(key) → value or absent.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        match self.locate(key) {
            Ok((ci, ei)) => Some(self.chunks[ci].entries[ei].value.as_str()),
            Err(_) => None,
        }
    }

    /// *lookup_numeric*(key, n) → value associated with the prefixed form.
    pub fn lookup_numeric(&self, key: &str, n: u64) -> Option<&str> {
        self.lookup(&format_prefix(n, key))
    }

    /// *insert*(key, value) — replaces any existing binding; insert of
    /// `absent` is a delete.
    pub fn insert(&mut self, key: &str, value: Option<&str>) -> CoreResult<()> {
        let Some(value) = value else {
            self.delete(key);
            return Ok(());
        };
        if key.len() + 1 + value.len() + 1 > MAX_ATTRIBUTE_BYTES {
            return Err(CoreError::Invalid(format!(
                "attribute '{key}' exceeds {MAX_ATTRIBUTE_BYTES} byte budget"
            )));
        }
        let attr = Attribute {
            key: key.to_string(),
            value: value.to_string(),
        };
        if self.chunks.is_empty() {
            self.chunks.push(Chunk {
                entries: vec![attr],
            });
            return Ok(());
        }
        match self.locate(key) {
            Ok((ci, ei)) => {
                self.chunks[ci].entries[ei] = attr;
            }
            Err((ci, ei)) => {
                self.chunks[ci].entries.insert(ei, attr);
                self.maybe_split(ci);
            }
        }
        Ok(())
    }

    /// Split a chunk that overflowed `CHUNK_MAX_BYTES` at its midpoint.
    fn maybe_split(&mut self, ci: usize) {
        if self.chunks[ci].byte_len() <= CHUNK_MAX_BYTES || self.chunks[ci].entries.len() < 2 {
            return;
        }
        let mid = self.chunks[ci].entries.len() / 2;
        let tail = self.chunks[ci].entries.split_off(mid);
        self.chunks.insert(ci + 1, Chunk { entries: tail });
    }

    /// Remove the binding for `key` if present. Returns `false` (a no-op)
    /// if `key` was absent.
    pub fn delete(&mut self, key: &str) -> bool {
        let Ok((ci, ei)) = self.locate(key) else {
            return false;
        };
        self.chunks[ci].entries.remove(ei);
        if self.chunks[ci].entries.is_empty() && self.chunks.len() > 1 {
            self.chunks.remove(ci);
        }
        true
    }

    /// *delete_range*(key, lo, hi) — delete all numerically prefixed
    /// entries with the given logical key whose prefix is in `[lo, hi]`.
    pub fn delete_range(&mut self, key: &str, lo: u64, hi: u64) {
        for chunk in &mut self.chunks {
            chunk.entries.retain(|e| match parse_prefix(&e.key) {
                Some((p, logical)) => !(logical == key && p >= lo && p <= hi),
                None => true,
            });
        }
        self.chunks.retain(|c| !c.entries.is_empty());
    }

    /// *trim*(n) — keep only entries whose numeric prefix is `< n`.
    /// Entries without a numeric prefix (static object metadata) are kept
    /// unconditionally: they partition with `copy_tail` (spec.md §8 law 10)
    /// by always falling on the `trim` side.
    pub fn trim(&mut self, n: u64) {
        for chunk in &mut self.chunks {
            chunk.entries.retain(|e| match parse_prefix(&e.key) {
                Some((p, _)) => p < n,
                None => true,
            });
        }
        self.chunks.retain(|c| !c.entries.is_empty());
    }

    /// *copy_tail*(n) — entries whose prefix is `≥ n`, prefix preserved,
    /// logical key unchanged. Unprefixed entries never appear here (see
    /// `trim`).
    pub fn copy_tail(&self, n: u64) -> AttrSet {
        let mut out = AttrSet::new();
        for e in self.iter_entries() {
            if let Some((p, _)) = parse_prefix(&e.key)
                && p >= n
            {
                out.insert(&e.key, Some(&e.value)).expect("within budget");
            }
        }
        out
    }

    /// *collect_at*(pos, new_prefix) — the attributes in effect at `pos`:
    /// for each logical key, the value of the entry with the largest
    /// prefix `≤ pos`; an empty value at that position means the
    /// attribute is cleared there and is omitted from the result.
    pub fn collect_at(&self, pos: u64, new_prefix: Option<u64>) -> AttrSet {
        use std::collections::BTreeMap;
        let mut best: BTreeMap<&str, (u64, &str)> = BTreeMap::new();
        for e in self.iter_entries() {
            if let Some((p, logical)) = parse_prefix(&e.key)
                && p <= pos
            {
                best.entry(logical)
                    .and_modify(|cur| {
                        if p > cur.0 {
                            *cur = (p, e.value.as_str());
                        }
                    })
                    .or_insert((p, e.value.as_str()));
            }
        }
        let mut out = AttrSet::new();
        for (logical, (_, value)) in best {
            if value.is_empty() {
                continue;
            }
            let key = match new_prefix {
                Some(p) => format_prefix(p, logical),
                None => logical.to_string(),
            };
            out.insert(&key, Some(value)).expect("within budget");
        }
        out
    }

    /// *iterate_from*(key, n) → the next `(key, value)` pair with prefix
    /// `n` that collates after `"{n} {key}"`, or `absent`.
    pub fn iterate_from(&self, key: &str, n: u64) -> Option<(String, &str)> {
        let probe = format_prefix(n, key);
        for e in self.iter_entries() {
            if compare_keys(&e.key, &probe) == Ordering::Greater
                && let Some((p, logical)) = parse_prefix(&e.key)
                && p == n
            {
                return Some((logical.to_string(), e.value.as_str()));
            }
        }
        None
    }

    /// Iterate `(key, value)` pairs in collation order (used by tests and
    /// by consumers that need the ordered key listing from spec.md's
    /// Scenario A).
    pub fn ordered_keys(&self) -> Vec<&str> {
        self.iter_entries().map(|e| e.key.as_str()).collect()
    }

    /// Debug-only consistency check: strict collation order, no duplicate
    /// `(prefix, key)` pairs.
    pub fn debug_check_consistency(&self) -> CoreResult<()> {
        let mut prev: Option<&str> = None;
        for e in self.iter_entries() {
            if let Some(p) = prev
                && compare_keys(p, &e.key) != Ordering::Less
            {
                return Err(CoreError::Inconsistent(format!(
                    "attr keys out of order: '{p}' >= '{}'",
                    e.key
                )));
            }
            prev = Some(&e.key);
        }
        Ok(())
    }
}
