//! Pluggable line measurement so `Viewport` never assumes a real terminal
//! or GUI back-end is present — it only needs a pixel/column geometry.
//!
//! `UnicodeMetrics` wraps `core-text`'s width engine for the real
//! implementation; `FixedMetrics` is a fixed-width fake for tests so this
//! crate's own test suite doesn't need a terminal.

use core_text::grapheme;

/// Measures grapheme clusters in columns. `width_of` must be stable for a
/// given cluster across calls within one `reposition` (the algorithm
/// assumes it is, to avoid re-measuring already-placed cells).
pub trait LineMetrics {
    fn width_of(&self, cluster: &str) -> u16;

    /// Split plain text into grapheme clusters with per-cluster widths.
    fn measure_line(&self, text: &str) -> Vec<(String, u16)> {
        grapheme::iter(text)
            .map(|g| (g.to_string(), self.width_of(g)))
            .collect()
    }
}

/// Real Unicode-aware measurement, via `core-text::width::egc_width`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeMetrics;

impl LineMetrics for UnicodeMetrics {
    fn width_of(&self, cluster: &str) -> u16 {
        core_text::egc_width(cluster)
    }
}

/// Every cluster is exactly 1 column; used by this crate's own tests so
/// expected column math doesn't depend on font metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedMetrics;

impl LineMetrics for FixedMetrics {
    fn width_of(&self, _cluster: &str) -> u16 {
        1
    }
}
