//! Grapheme cluster display-width.
//!
//! Single authoritative `egc_width` entry point: a heuristic classifier
//! biased toward over-estimating width for pictographic sequences (an
//! extra blank cell is harmless, under-measuring causes visible drift),
//! falling back to `unicode_width` for everything else.

use unicode_width::UnicodeWidthStr;

/// Width, in terminal/pixel-grid cells, of a single extended grapheme
/// cluster. Callers must pass one cluster at a time (see `grapheme::iter`).
pub fn egc_width(g: &str) -> u16 {
    if g.is_empty() {
        return 0;
    }
    if looks_pictographic(g) {
        return UnicodeWidthStr::width(g).max(2) as u16;
    }
    UnicodeWidthStr::width(g).max(if has_printable(g) { 1 } else { 0 }) as u16
}

fn has_printable(g: &str) -> bool {
    g.chars().any(|c| !c.is_control())
}

/// Heuristic: any character outside the BMP's "Extended Pictographic" band,
/// or any variation selector / ZWJ, marks the whole cluster as an emoji-ish
/// composite that terminals typically render at width 2.
fn looks_pictographic(g: &str) -> bool {
    g.chars().any(|c| {
        let cp = c as u32;
        (0x1F300..=0x1FAFF).contains(&cp)
            || (0x2600..=0x27BF).contains(&cp)
            || cp == 0x200D // ZWJ
            || cp == 0xFE0F // VS16
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_width_one() {
        assert_eq!(egc_width("a"), 1);
    }

    #[test]
    fn emoji_is_width_two() {
        assert_eq!(egc_width("\u{1F600}"), 2);
    }

    #[test]
    fn zwj_sequence_is_at_least_two() {
        // family emoji (man, ZWJ, woman, ZWJ, girl)
        let s = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}";
        assert!(egc_width(s) >= 2);
    }

    #[test]
    fn cjk_is_width_two() {
        assert_eq!(egc_width("\u{6F22}"), 2);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(egc_width(""), 0);
    }
}
