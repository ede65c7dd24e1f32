//! Counter-mark sidecar (spec.md §4.5, L5): cumulative line/word/char counts
//! up to an arbitrary document position, without re-scanning from the start
//! of the document on every query.
//!
//! Checkpoints are real `core_marks::Mark`s dropped on a hidden `View`, per
//! spec.md §4.5 ("Attach a hidden view to a Doc. Drop a *counter mark* every
//! ~50 document lines…") — so an edit that shifts document content also
//! shifts every checkpoint's position for free, the same way it shifts any
//! other mark, instead of this sidecar having to recompute checkpoint
//! positions itself. Uses `core-text::grapheme`'s `is_space`/`is_word`
//! classification for word-boundary tracking, and the same "cheap
//! incremental state, recomputed from the nearest known-good point" shape
//! `Viewport::revise` uses — here the known-good points are sparse
//! checkpoints rather than a single `first` line.

use core_doc::{Doc, DocRef, RefTerminus};
use core_marks::{MarkId, MarkStore, ViewId};
use std::collections::HashMap;

/// Roughly how many lines apart cached checkpoints are kept.
pub const CHECKPOINT_INTERVAL_LINES: u64 = 50;
/// A query that has to scan at least this many lines past the nearest
/// checkpoint earns a new one, so later queries near the same spot don't
/// repeat the scan.
pub const RECOMPUTE_DISTANCE_LINES: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCount {
    pub lines: u64,
    pub words: u64,
    pub chars: u64,
}

/// Maintains sparse counter marks, each carrying a `LineCount` snapshot of
/// everything up to its position, on a hidden `View` no renderer ever sees.
pub struct LineCounter {
    marks: MarkStore,
    view: ViewId,
    counts: HashMap<MarkId, LineCount>,
}

impl Default for LineCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCounter {
    pub fn new() -> Self {
        let mut marks = MarkStore::new();
        let view = marks.new_view();
        Self {
            marks,
            view,
            counts: HashMap::new(),
        }
    }

    /// An edit touched content at or after `start`: any cached checkpoint
    /// from there on is potentially stale and must be dropped (spec.md
    /// §4.5 "invalidate on replaced").
    pub fn invalidate_after(&mut self, start: DocRef) {
        let mut stale = Vec::new();
        let mut cursor = self.marks.vmark_first(self.view);
        while let Some(id) = cursor {
            cursor = self.marks.vmark_next(id);
            if self.marks.mark(id).map(|m| m.doc_ref) >= Some(start) {
                stale.push(id);
            }
        }
        if !stale.is_empty() {
            tracing::debug!(dropped = stale.len(), "invalidating counter checkpoints");
        }
        for id in stale {
            let _ = self.marks.free(id);
            self.counts.remove(&id);
        }
    }

    fn nearest_checkpoint(&self, at: DocRef) -> Option<(DocRef, LineCount)> {
        let id = self.marks.vmark_at_or_before(self.view, at)?;
        let doc_ref = self.marks.mark(id)?.doc_ref;
        let count = *self.counts.get(&id)?;
        Some((doc_ref, count))
    }

    /// Cumulative counts over `[start of document, at)`.
    pub fn count_at<D: Doc>(&mut self, doc: &D, at: DocRef) -> LineCount {
        let (mut cursor, mut count) = self
            .nearest_checkpoint(at)
            .unwrap_or((doc.doc_terminus(RefTerminus::ToStart), LineCount::default()));
        let start_lines = count.lines;

        while cursor < at {
            let (text, end) = doc.render_line(cursor, None, Some(at));
            count = accumulate(count, &text);
            if end == cursor {
                break;
            }
            cursor = end;
        }

        if count.lines.saturating_sub(start_lines) >= RECOMPUTE_DISTANCE_LINES {
            self.maybe_checkpoint(at, count);
        }
        count
    }

    fn last_checkpoint_lines(&self) -> u64 {
        self.marks
            .vmark_last(self.view)
            .and_then(|id| self.counts.get(&id))
            .map(|c| c.lines)
            .unwrap_or(0)
    }

    fn maybe_checkpoint(&mut self, at: DocRef, count: LineCount) {
        let last_lines = self.last_checkpoint_lines();
        let is_first = self.marks.vmark_last(self.view).is_none();
        if is_first || count.lines.saturating_sub(last_lines) >= CHECKPOINT_INTERVAL_LINES {
            tracing::debug!(lines = count.lines, "dropping counter checkpoint");
            let id = self.marks.new_mark(self.view, at);
            self.counts.insert(id, count);
        }
    }

    #[cfg(test)]
    fn checkpoint_count(&self) -> usize {
        self.counts.len()
    }
}

fn accumulate(mut count: LineCount, text: &str) -> LineCount {
    let mut in_word = false;
    for g in core_text::grapheme::iter(text) {
        if g == "\n" {
            count.lines += 1;
            in_word = false;
            continue;
        }
        count.chars += 1;
        if core_text::grapheme::is_word(g) {
            if !in_word {
                count.words += 1;
            }
            in_word = true;
        } else {
            in_word = false;
        }
    }
    count
}
