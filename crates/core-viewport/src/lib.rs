//! `Viewport`: turns a `Doc` plus a cursor position into a fixed-height
//! window of rendered rows, and keeps that window stable as the cursor
//! moves.
//!
//! The margin-band scrolling math follows the same shape as a classic
//! scroll-off implementation, generalized from "scroll whole buffer lines"
//! to "scroll wrapped screen rows produced by `Doc::render_line`". The
//! rendered-cell shape is trimmed to what this layer actually owns — no
//! terminal-facing flags; those belong to the rendering layer that draws
//! these cells to a screen.

pub mod metrics;

use core_attrs::error::{CoreError, CoreResult};
use core_doc::{Doc, DocRef};
use core_events::{EventBus, SubscriptionId};
use metrics::LineMetrics;

/// Notification a [`Viewport`] delivers when its rendered window moves
/// (spec.md §6.2 `render:reposition`). Carried separately from `core_doc`'s
/// `DocEvent` stream since it describes the viewport's own state, not the
/// document's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    Reposition(RepositionOutcome),
}

/// One display cell: a grapheme cluster, its width, and its offset (in
/// characters from the row's `doc_start`) within the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub cluster: String,
    pub width: u16,
    pub doc_offset: u32,
}

/// One wrapped screen row (spec.md §3 `RenderedLine`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub cells: Vec<Cell>,
    /// `DocRef` of the first character this row renders.
    pub doc_start: DocRef,
    /// `DocRef` just past the last character this row renders.
    pub doc_end: DocRef,
    /// True if this row is a wrap continuation of the same document line
    /// rather than starting a new one.
    pub continuation: bool,
}

/// Outcome of a [`Viewport::reposition`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositionOutcome {
    pub scrolled: bool,
    pub cursor_row: usize,
    pub cursor_col: u16,
}

/// Fixed-geometry window onto a `Doc` (spec.md §4.4).
pub struct Viewport<M: LineMetrics> {
    pub width: u16,
    pub height: u16,
    pub wrap: bool,
    pub vmargin: u16,
    /// Horizontal scroll offset in columns, used only when `wrap` is off.
    shift_left: u16,
    top: DocRef,
    cursor: DocRef,
    rows: Vec<RenderedLine>,
    /// Sticky horizontal target for vertical motion (spec.md §4.4 "vertical
    /// motion"), reset whenever the cursor moves for a reason other than
    /// up/down stepping.
    target_x: Option<u16>,
    metrics: M,
    events: EventBus<ViewportEvent>,
}

impl<M: LineMetrics> Viewport<M> {
    pub fn new(width: u16, height: u16, wrap: bool, vmargin: u16, metrics: M) -> Self {
        Self {
            width,
            height,
            wrap,
            vmargin: vmargin.min(height / 2),
            shift_left: 0,
            top: DocRef::new(0, 0),
            cursor: DocRef::new(0, 0),
            rows: Vec::new(),
            target_x: None,
            metrics,
            events: EventBus::new(),
        }
    }

    /// Register an observer for `render:reposition` notifications, delivered
    /// synchronously from [`reposition`](Self::reposition),
    /// [`revise`](Self::revise), and [`scroll`](Self::scroll).
    pub fn subscribe(&mut self, observer: impl FnMut(&ViewportEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.events.unsubscribe(id);
    }

    pub fn rows(&self) -> &[RenderedLine] {
        &self.rows
    }
    pub fn top(&self) -> DocRef {
        self.top
    }
    pub fn cursor(&self) -> DocRef {
        self.cursor
    }
    pub fn shift_left(&self) -> u16 {
        self.shift_left
    }

    /// Split one `Doc::render_line` result into one or more wrapped rows.
    /// Wraps over the raw rendered text rather than its markup-projected
    /// plain text, so each cell's `doc_offset` stays a simple char count
    /// from `from` — markup-aware column math belongs to the rendering
    /// layer spec.md §1 puts out of scope, not to wrapping geometry.
    fn wrap_line<D: Doc>(&self, doc: &D, from: DocRef) -> Vec<RenderedLine> {
        let (text, end) = doc.render_line(from, None, None);
        let text = text.strip_suffix('\n').unwrap_or(&text);
        let clusters: Vec<&str> = core_text::grapheme::iter(text).collect();

        let mut rows = Vec::new();
        let mut row_cells: Vec<Cell> = Vec::new();
        let mut col = 0u16;
        let mut char_count = 0u32;
        let mut row_start_chars = 0u32;
        let mut first = true;

        for g in clusters {
            let width = self.metrics.width_of(g);
            if self.wrap && col + width > self.width && !row_cells.is_empty() {
                rows.push(RenderedLine {
                    cells: std::mem::take(&mut row_cells),
                    doc_start: DocRef::new(from.page, from.index + row_start_chars),
                    doc_end: DocRef::new(from.page, from.index + char_count),
                    continuation: !first,
                });
                first = false;
                col = 0;
                row_start_chars = char_count;
            }
            row_cells.push(Cell {
                cluster: g.to_string(),
                width,
                doc_offset: char_count - row_start_chars,
            });
            char_count += g.chars().count() as u32;
            col += width;
        }
        rows.push(RenderedLine {
            cells: row_cells,
            doc_start: DocRef::new(from.page, from.index + row_start_chars),
            doc_end: end,
            continuation: !first,
        });
        rows
    }

    /// Render forward from `from` until `height` rows are produced or the
    /// document ends.
    fn render_window<D: Doc>(&self, doc: &D, from: DocRef) -> Vec<RenderedLine> {
        let mut rows = Vec::new();
        let mut at = from;
        let eof = doc.doc_terminus(core_doc::RefTerminus::ToEnd);
        while rows.len() < self.height as usize && at != eof {
            let mut line_rows = self.wrap_line(doc, at);
            let advanced = line_rows.last().map(|r| r.doc_end).unwrap_or(at);
            rows.append(&mut line_rows);
            if advanced == at {
                break; // no progress; avoid an infinite loop on a malformed Doc
            }
            at = advanced;
        }
        rows.truncate(self.height as usize);
        rows
    }

    fn row_of(&self, at: DocRef) -> Option<usize> {
        self.rows
            .iter()
            .position(|r| at >= r.doc_start && (at < r.doc_end || r.doc_end == r.doc_start))
    }

    /// spec.md §4.4 "revise": the per-keystroke hot path. Checks whether the
    /// cursor still sits inside the current window's margin band without
    /// re-rendering; returns `None` if a full [`reposition`] is required.
    pub fn revise(&mut self) -> Option<RepositionOutcome> {
        let _span = tracing::debug_span!("revise").entered();
        let row = self.row_of(self.cursor)?;
        let band_top = self.vmargin as usize;
        let band_bottom = (self.height as usize).saturating_sub(self.vmargin as usize);
        if row < band_top || row >= band_bottom {
            return None;
        }
        let col = self.cursor_col_in_row(row);
        let outcome = RepositionOutcome {
            scrolled: false,
            cursor_row: row,
            cursor_col: col,
        };
        self.events.dispatch(&ViewportEvent::Reposition(outcome));
        Some(outcome)
    }

    fn cursor_col_in_row(&self, row: usize) -> u16 {
        let r = &self.rows[row];
        let mut col = 0u16;
        for cell in &r.cells {
            if r.doc_start.index + cell.doc_offset >= self.cursor.index {
                break;
            }
            col += cell.width;
        }
        col
    }

    /// spec.md §4.4 "reposition": the full algorithm. Render the window
    /// starting at the current `top`; if the cursor falls outside the
    /// margin band, move `top` to a line that puts the cursor back inside
    /// the band, and re-render. Falls back to centering the cursor if the
    /// document is shorter than the viewport.
    pub fn reposition<D: Doc>(&mut self, doc: &D) -> CoreResult<RepositionOutcome> {
        let _span = tracing::debug_span!("reposition").entered();
        self.rows = self.render_window(doc, self.top);

        if let Some(row) = self.row_of(self.cursor) {
            let band_top = self.vmargin as usize;
            let band_bottom = (self.height as usize).saturating_sub(self.vmargin as usize).max(band_top + 1);
            if row >= band_top && row < band_bottom.min(self.rows.len()) {
                let col = self.cursor_col_in_row(row);
                self.apply_shift(col);
                let outcome = RepositionOutcome {
                    scrolled: false,
                    cursor_row: row,
                    cursor_col: col,
                };
                self.events.dispatch(&ViewportEvent::Reposition(outcome));
                return Ok(outcome);
            }
        }

        // Cursor outside the band (or window): walk `top` to a line that
        // places the cursor `vmargin` rows from whichever edge it crossed.
        let mut new_top = self.cursor;
        for _ in 0..self.vmargin {
            let prev = doc.render_line_prev(new_top, true);
            if prev == new_top {
                break;
            }
            new_top = prev;
        }
        // Always land on a line start even if we didn't walk at all.
        new_top = doc.render_line_prev(new_top, false);
        self.top = new_top;
        self.rows = self.render_window(doc, self.top);

        let row = self.row_of(self.cursor).ok_or(CoreError::Inconsistent(
            "cursor not reachable from new viewport top".into(),
        ))?;
        let col = self.cursor_col_in_row(row);
        self.apply_shift(col);
        let outcome = RepositionOutcome {
            scrolled: true,
            cursor_row: row,
            cursor_col: col,
        };
        self.events.dispatch(&ViewportEvent::Reposition(outcome));
        Ok(outcome)
    }

    /// Non-wrap horizontal auto-shift (spec.md §4.4): keep the cursor
    /// column visible by adjusting `shift_left`.
    fn apply_shift(&mut self, cursor_col: u16) {
        if self.wrap {
            self.shift_left = 0;
            return;
        }
        if cursor_col < self.shift_left {
            self.shift_left = cursor_col;
        } else if cursor_col >= self.shift_left + self.width {
            self.shift_left = cursor_col + 1 - self.width;
        }
    }

    /// spec.md §4.4 "scroll": move `top` by `thousandths`/1000 of the
    /// viewport height (positive scrolls forward), re-rendering. Always
    /// reports `scrolled: true` since a scroll request that doesn't move
    /// `top` at all is the degenerate case of `thousandths == 0`.
    pub fn scroll<D: Doc>(&mut self, doc: &D, thousandths: i32) -> CoreResult<RepositionOutcome> {
        let _span = tracing::debug_span!("scroll").entered();
        let rows = (self.height as i64 * thousandths as i64) / 1000;
        let mut at = self.top;
        if rows >= 0 {
            for _ in 0..rows {
                let (_, end) = doc.render_line(at, None, None);
                if end == at {
                    break;
                }
                at = end;
            }
        } else {
            for _ in 0..(-rows) {
                let prev = doc.render_line_prev(at, true);
                if prev == at {
                    break;
                }
                at = prev;
            }
        }
        self.top = at;
        self.rows = self.render_window(doc, self.top);
        let row = self.row_of(self.cursor).unwrap_or(0);
        let col = if self.rows.is_empty() {
            0
        } else {
            self.cursor_col_in_row(row.min(self.rows.len() - 1))
        };
        let outcome = RepositionOutcome {
            scrolled: true,
            cursor_row: row,
            cursor_col: col,
        };
        self.events.dispatch(&ViewportEvent::Reposition(outcome));
        Ok(outcome)
    }

    /// spec.md §4.4 "cursor placement": move the cursor to an explicit
    /// document position and clear the sticky vertical-motion target.
    pub fn set_cursor(&mut self, at: DocRef) {
        self.cursor = at;
        self.target_x = None;
    }

    /// spec.md §4.4 "vertical motion": move the cursor up/down one wrapped
    /// row, holding a sticky target column across lines of differing
    /// length, without forcing a full [`reposition`] (callers call that
    /// afterward if this returns `true`).
    pub fn move_line<D: Doc>(&mut self, doc: &D, forward: bool) -> CoreResult<bool> {
        let row = self
            .row_of(self.cursor)
            .ok_or(CoreError::Fail("cursor outside current window"))?;
        let target_col = self.target_x.unwrap_or_else(|| self.cursor_col_in_row(row));
        self.target_x = Some(target_col);

        let dest_row = if forward {
            if row + 1 >= self.rows.len() {
                let (_, end) = doc.render_line(self.rows[row].doc_end, None, None);
                if end == self.rows[row].doc_end {
                    return Ok(false);
                }
                self.cursor = self.column_to_ref(doc, end, target_col);
                return Ok(true);
            }
            row + 1
        } else {
            if row == 0 {
                return Ok(false);
            }
            row - 1
        };
        let r = &self.rows[dest_row];
        self.cursor = self.column_to_ref_in_row(r, target_col);
        Ok(true)
    }

    fn column_to_ref_in_row(&self, r: &RenderedLine, target_col: u16) -> DocRef {
        let mut col = 0u16;
        for cell in &r.cells {
            if col + cell.width > target_col {
                return DocRef::new(r.doc_start.page, r.doc_start.index + cell.doc_offset);
            }
            col += cell.width;
        }
        // Past the last cell: clamp to the last position still inside this
        // row's content rather than `doc_end`, which already points at (or
        // past) the line terminator and so belongs to the row that follows.
        let content_chars: u32 = r.cells.iter().map(|c| c.cluster.chars().count() as u32).sum();
        DocRef::new(r.doc_start.page, r.doc_start.index + content_chars)
    }

    fn column_to_ref<D: Doc>(&self, doc: &D, line_start: DocRef, target_col: u16) -> DocRef {
        let rows = self.wrap_line(doc, line_start);
        rows.first()
            .map(|r| self.column_to_ref_in_row(r, target_col))
            .unwrap_or(line_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_doc::rope_doc::RopeDoc;
    use metrics::FixedMetrics;

    fn doc_lines(n: usize) -> RopeDoc {
        let text: String = (0..n).map(|i| format!("line{i}\n")).collect();
        RopeDoc::from_str(&text)
    }

    #[test]
    fn reposition_keeps_cursor_in_band_without_scroll() {
        let doc = doc_lines(20);
        let mut vp = Viewport::new(20, 10, false, 2, FixedMetrics);
        vp.set_cursor(DocRef::new(0, 0));
        let out = vp.reposition(&doc).unwrap();
        assert!(!out.scrolled);
        assert_eq!(out.cursor_row, 0);
    }

    #[test]
    fn reposition_scrolls_down_past_bottom_margin() {
        let doc = doc_lines(50);
        let mut vp = Viewport::new(20, 10, false, 2, FixedMetrics);
        vp.reposition(&doc).unwrap();
        let (_, far) = doc.render_line(DocRef::new(0, 0), None, None);
        let mut at = far;
        for _ in 0..19 {
            let (_, next) = doc.render_line(at, None, None);
            at = next;
        }
        vp.set_cursor(at);
        let out = vp.reposition(&doc).unwrap();
        assert!(out.scrolled);
        assert!(out.cursor_row >= vp.vmargin as usize);
        assert!(out.cursor_row < (vp.height - vp.vmargin) as usize);
    }

    #[test]
    fn wrap_mode_splits_long_line_into_multiple_rows() {
        let doc = RopeDoc::from_str("abcdefghij\n");
        let mut vp = Viewport::new(4, 5, true, 0, FixedMetrics);
        vp.reposition(&doc).unwrap();
        assert!(vp.rows().len() >= 3);
        assert!(!vp.rows()[0].continuation);
        assert!(vp.rows()[1].continuation);
    }

    #[test]
    fn non_wrap_shift_tracks_cursor_past_right_edge() {
        let doc = RopeDoc::from_str("abcdefghijklmnopqrst\n");
        let mut vp = Viewport::new(5, 3, false, 0, FixedMetrics);
        vp.set_cursor(DocRef::new(0, 12));
        vp.reposition(&doc).unwrap();
        assert!(vp.shift_left() > 0);
    }

    #[test]
    fn move_line_preserves_target_column_across_shorter_lines() {
        let doc = RopeDoc::from_str("abcdef\nxy\nabcdef\n");
        let mut vp = Viewport::new(10, 5, false, 0, FixedMetrics);
        vp.set_cursor(DocRef::new(0, 4)); // column 4 on first line
        vp.reposition(&doc).unwrap();
        vp.move_line(&doc, true).unwrap();
        vp.reposition(&doc).unwrap();
        // second line "xy" only has 2 columns; cursor should clamp there.
        let row = vp.row_of(vp.cursor()).unwrap();
        assert_eq!(row, 1);
        vp.move_line(&doc, true).unwrap();
        vp.reposition(&doc).unwrap();
        let col = vp.cursor_col_in_row(vp.row_of(vp.cursor()).unwrap());
        assert_eq!(col, 4);
    }

    #[test]
    fn revise_reports_cursor_without_scrolling_when_inside_band() {
        let doc = doc_lines(20);
        let mut vp = Viewport::new(20, 10, false, 2, FixedMetrics);
        vp.reposition(&doc).unwrap();
        let out = vp.revise().unwrap();
        assert!(!out.scrolled);
        assert_eq!(out.cursor_row, vp.row_of(vp.cursor()).unwrap());
    }

    #[test]
    fn revise_returns_none_when_cursor_left_the_margin_band() {
        let doc = doc_lines(20);
        let mut vp = Viewport::new(20, 10, false, 2, FixedMetrics);
        vp.reposition(&doc).unwrap();
        let (_, far) = doc.render_line(DocRef::new(0, 0), None, None);
        let mut at = far;
        for _ in 0..19 {
            let (_, next) = doc.render_line(at, None, None);
            at = next;
        }
        vp.set_cursor(at);
        assert!(vp.revise().is_none());
    }

    #[test]
    fn scroll_moves_top_forward_by_the_requested_fraction() {
        let doc = doc_lines(50);
        let mut vp = Viewport::new(20, 10, false, 2, FixedMetrics);
        vp.reposition(&doc).unwrap();
        let top_before = vp.top;
        let out = vp.scroll(&doc, 500).unwrap();
        assert!(out.scrolled);
        assert!(vp.top.index > top_before.index);
    }

    #[test]
    fn scroll_backward_with_negative_thousandths_moves_top_earlier() {
        let doc = doc_lines(50);
        let mut vp = Viewport::new(20, 10, false, 2, FixedMetrics);
        vp.reposition(&doc).unwrap();
        vp.scroll(&doc, 500).unwrap();
        let top_after_forward = vp.top;
        vp.scroll(&doc, -500).unwrap();
        assert!(vp.top.index < top_after_forward.index);
    }

    #[test]
    fn subscribers_are_notified_on_reposition_revise_and_scroll() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let doc = doc_lines(50);
        let mut vp = Viewport::new(20, 10, false, 2, FixedMetrics);
        let seen = Rc::new(RefCell::new(0usize));
        let seen_cb = seen.clone();
        vp.subscribe(move |_: &ViewportEvent| {
            *seen_cb.borrow_mut() += 1;
        });

        vp.reposition(&doc).unwrap();
        assert_eq!(*seen.borrow(), 1);

        vp.revise().unwrap();
        assert_eq!(*seen.borrow(), 2);

        vp.scroll(&doc, 500).unwrap();
        assert_eq!(*seen.borrow(), 3);
    }

    #[test]
    fn unsubscribe_stops_further_notifications() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let doc = doc_lines(20);
        let mut vp = Viewport::new(20, 10, false, 2, FixedMetrics);
        let seen = Rc::new(RefCell::new(0usize));
        let seen_cb = seen.clone();
        let sub = vp.subscribe(move |_: &ViewportEvent| {
            *seen_cb.borrow_mut() += 1;
        });
        vp.reposition(&doc).unwrap();
        assert_eq!(*seen.borrow(), 1);

        vp.unsubscribe(sub);
        vp.revise().unwrap();
        assert_eq!(*seen.borrow(), 1);
    }
}
