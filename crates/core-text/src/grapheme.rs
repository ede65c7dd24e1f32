//! Grapheme cluster boundary helpers operating on a single line of text.
//!
//! Trimmed to the primitives the document core and viewport actually need:
//! boundary search, visual column accumulation, word classification for
//! the line counter. Byte offsets throughout are UTF-8 byte offsets into
//! the slice passed in, matching the byte-offset view attribute prefixes
//! are keyed against.

use crate::egc_width;
use unicode_segmentation::UnicodeSegmentation;

/// Iterate grapheme clusters in a line.
pub fn iter(line: &str) -> impl Iterator<Item = &str> {
    line.graphemes(true)
}

/// Previous grapheme boundary (returns 0 if already at or below the first).
pub fn prev_boundary(line: &str, byte: usize) -> usize {
    if byte == 0 || byte > line.len() {
        return 0;
    }
    let mut last = 0;
    for (idx, _) in line.grapheme_indices(true) {
        if idx >= byte {
            break;
        }
        last = idx;
    }
    last
}

/// Next grapheme boundary (returns `line.len()` if at or beyond the end).
pub fn next_boundary(line: &str, byte: usize) -> usize {
    if byte >= line.len() {
        return line.len();
    }
    for (idx, _) in line.grapheme_indices(true) {
        if idx > byte {
            return idx;
        }
    }
    line.len()
}

/// Visual column (display cells) accumulated up to, but not including, `byte`.
pub fn visual_col(line: &str, byte: usize) -> usize {
    let mut col = 0;
    for (idx, g) in line.grapheme_indices(true) {
        if idx >= byte {
            break;
        }
        col += egc_width(g) as usize;
    }
    col
}

/// Width in display cells of a single grapheme cluster.
pub fn cluster_width(g: &str) -> usize {
    egc_width(g) as usize
}

/// Unicode space-class test used by the line counter's `in_word` tracking
/// (spec.md §4.5: "maintaining in_word over Unicode space-class").
pub fn is_space(g: &str) -> bool {
    g.chars().all(|c| c.is_whitespace())
}

/// Naive word-start classification (alphanumeric or underscore).
pub fn is_word(g: &str) -> bool {
    g.chars()
        .next()
        .map(|c| c == '_' || c.is_alphanumeric())
        .unwrap_or(false)
}
