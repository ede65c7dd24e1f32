//! Numeric-aware key collation (spec.md §3, "AttrSet").
//!
//! Collation is lexicographic on bytes except that maximal runs of ASCII
//! digits compare as non-negative integers and outrank any non-digit byte
//! at the same column. Leading zeros are insignificant. This one function
//! underlies every ordering decision `AttrSet` makes, including the
//! "numeric prefix" convention (`"%d %s"`) described in §3 — a prefix is
//! just the leading digit run of the key, so prefixed keys sort correctly
//! as a byproduct of the general rule (see spec.md §8 Scenario B).

use std::cmp::Ordering;

/// Compare two keys using the numeric-aware collation rule.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    let ab = a.as_bytes();
    let bb = b.as_bytes();
    let (mut i, mut j) = (0usize, 0usize);
    loop {
        let a_rem = i < ab.len();
        let b_rem = j < bb.len();
        match (a_rem, b_rem) {
            (false, false) => return Ordering::Equal,
            (false, true) => return Ordering::Less,
            (true, false) => return Ordering::Greater,
            (true, true) => {}
        }
        let a_digit = ab[i].is_ascii_digit();
        let b_digit = bb[j].is_ascii_digit();
        if a_digit && b_digit {
            let a_end = digit_run_end(ab, i);
            let b_end = digit_run_end(bb, j);
            match compare_numeric(&ab[i..a_end], &bb[j..b_end]) {
                Ordering::Equal => {
                    i = a_end;
                    j = b_end;
                }
                other => return other,
            }
        } else if a_digit != b_digit {
            // A digit run outranks any non-digit byte at the same column.
            return if a_digit {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        } else {
            match ab[i].cmp(&bb[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                other => return other,
            }
        }
    }
}

fn digit_run_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    end
}

/// Compare two ASCII-digit runs as non-negative integers, ignoring
/// insignificant leading zeros (`"0005" == "5"`).
fn compare_numeric(a: &[u8], b: &[u8]) -> Ordering {
    let a = trim_leading_zeros(a);
    let b = trim_leading_zeros(b);
    match a.len().cmp(&b.len()) {
        Ordering::Equal => a.cmp(b),
        other => other,
    }
}

fn trim_leading_zeros(b: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < b.len() - 1 && b[i] == b'0' {
        i += 1;
    }
    &b[i..]
}

/// Parse a numerically-prefixed key (`"%d %s"`: decimal integer, a single
/// space, then the logical key). Returns `None` for keys with no such
/// prefix (e.g. object metadata keys, or digit runs not followed by a
/// space — `"6hello"` is not prefixed).
pub fn parse_prefix(key: &str) -> Option<(u64, &str)> {
    let bytes = key.as_bytes();
    let end = digit_run_end(bytes, 0);
    if end == 0 || end >= bytes.len() || bytes[end] != b' ' {
        return None;
    }
    let n: u64 = key[..end].parse().ok()?;
    Some((n, &key[end + 1..]))
}

/// Format a numerically-prefixed key.
pub fn format_prefix(n: u64, logical: &str) -> String {
    format!("{n} {logical}")
}
