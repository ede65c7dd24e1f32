//! `Mark`/`Point`/`View` and `MarkStore`: per-view *ordered lists of
//! document positions*, owned by a small manager with a stable id type —
//! the same "manager owning a small collection of per-view state" shape
//! used elsewhere in this workspace, but for a different kind of view
//! entirely. Two representation choices favor safe Rust over an intrusive
//! C-style list-and-pointer layout:
//! - intrusive tagged lists -> `BTreeMap<i64, MarkId>` per view (see `seq`);
//! - raw cyclic pointers -> `slotmap` generation-checked handles, so a
//!   dangling `MarkId` is a catchable `None`, never a use-after-free.
//!
//! `MarkStore` does not subscribe to a `Doc`'s event bus itself — holding a
//! `Box<dyn FnMut>` closure back into the store it's relocating would need
//! `Rc<RefCell<_>>` or raw pointers to satisfy the borrow checker. Instead
//! callers that perform an edit invoke [`MarkStore::clip_for_replace`] with
//! the same `start`/`end`/`new_end` the edit used; `core-viewport` and the
//! counter/completion sidecars are expected to do this right after calling
//! a `Doc`'s mutation entry point, preserving synchronous, single-threaded
//! ordering without any shared mutable aliasing.

pub mod seq;

use bitflags::bitflags;
use core_attrs::AttrSet;
use core_attrs::error::{CoreError, CoreResult};
use core_doc::{CharDirection, Codepoint, Doc, DocEvent, DocRef, RefTerminus};
use slotmap::{SlotMap, new_key_type};
use std::collections::BTreeMap;

new_key_type! {
    /// Stable handle to a `Mark`. Generation-checked: a `MarkId` from a
    /// freed mark never aliases a later mark reusing the same slot.
    pub struct MarkId;
}

new_key_type! {
    /// Stable handle to a `View`'s ordered mark list.
    pub struct ViewId;
}

new_key_type! {
    /// Stable handle to a `Point` (spec.md §2 L2a `PointStore`): one
    /// document position that participates in every live view
    /// simultaneously, via one representative [`Mark`] per view.
    pub struct PointId;
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MarkFlags: u8 {
        /// Deliver a one-shot `MarkMoving` notification the next time this
        /// mark is relocated by an edit.
        const WATCHED = 0b0000_0001;
        /// This mark is one view's representative for a `Point`: carries
        /// the `moved` latch and is kept in lockstep with its sibling
        /// representatives in every other live view (spec.md §3 "Point
        /// (subclass)").
        const POINT   = 0b0000_0010;
    }
}

/// A tracked document position (spec.md §3 `Mark`).
#[derive(Debug, Clone)]
pub struct Mark {
    pub doc_ref: DocRef,
    seq: i64,
    pub view: ViewId,
    pub attrs: AttrSet,
    pub mdata: Option<String>,
    pub flags: MarkFlags,
    /// Set when a `Point`-flagged mark was relocated by an edit and not yet
    /// acknowledged via [`MarkStore::mark_ack`].
    moved: bool,
    /// `Some` when this mark is one view's representative for a `Point`;
    /// ties it back to the record that fans its movement out to every view.
    point: Option<PointId>,
}

impl Mark {
    pub fn seq(&self) -> i64 {
        self.seq
    }
    pub fn is_point(&self) -> bool {
        self.flags.contains(MarkFlags::POINT)
    }
    pub fn moved(&self) -> bool {
        self.moved
    }
}

/// One view's ordered list of marks, keyed by sparse sequence number so
/// relative order is an O(log n) lookup rather than an O(n) list walk.
#[derive(Debug, Default)]
pub struct View {
    order: BTreeMap<i64, MarkId>,
}

impl View {
    fn first_seq(&self) -> Option<i64> {
        self.order.keys().next().copied()
    }
    fn last_seq(&self) -> Option<i64> {
        self.order.keys().next_back().copied()
    }
    fn neighbors(&self, seq: i64) -> (Option<i64>, Option<i64>) {
        let before = self.order.range(..seq).next_back().map(|(k, _)| *k);
        let after = self.order.range(seq + 1..).next().map(|(k, _)| *k);
        (before, after)
    }
}

/// One `Point`: a single document position with a representative `Mark` in
/// every live view, kept at the same `doc_ref` everywhere it appears.
struct PointRecord {
    doc_ref: DocRef,
    members: BTreeMap<ViewId, MarkId>,
}

/// Owns every `Mark`/`Point` and the per-view ordering over them.
pub struct MarkStore {
    marks: SlotMap<MarkId, Mark>,
    views: SlotMap<ViewId, View>,
    points: SlotMap<PointId, PointRecord>,
}

impl Default for MarkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkStore {
    pub fn new() -> Self {
        Self {
            marks: SlotMap::with_key(),
            views: SlotMap::with_key(),
            points: SlotMap::with_key(),
        }
    }

    /// New view starts with a representative mark for every existing
    /// `Point` (spec.md §2 L2a, §8: "every Point appears in V's list" for
    /// every live view V).
    pub fn new_view(&mut self) -> ViewId {
        let view = self.views.insert(View::default());
        let point_ids: Vec<PointId> = self.points.keys().collect();
        for point in point_ids {
            self.seed_point_into_view(point, view);
        }
        view
    }

    /// spec.md §2 L2a `PointStore`: create a `Point` at `at`, with one
    /// representative mark fanned out into every currently live view.
    pub fn new_point(&mut self, at: DocRef) -> PointId {
        let point = self.points.insert(PointRecord {
            doc_ref: at,
            members: BTreeMap::new(),
        });
        let view_ids: Vec<ViewId> = self.views.keys().collect();
        for view in view_ids {
            self.seed_point_into_view(point, view);
        }
        point
    }

    /// Insert `point`'s representative mark into `view`, appended at that
    /// view's end, at the point's current `doc_ref`.
    fn seed_point_into_view(&mut self, point: PointId, view: ViewId) {
        let at = self.points[point].doc_ref;
        let last = self.views[view].last_seq();
        let seq = seq::midpoint(last, None).expect("append never exhausts seq space");
        let id = self.marks.insert(Mark {
            doc_ref: at,
            seq,
            view,
            attrs: AttrSet::new(),
            mdata: None,
            flags: MarkFlags::POINT,
            moved: false,
            point: Some(point),
        });
        self.insert_seq(view, seq, id);
        self.points[point].members.insert(view, id);
    }

    /// This `Point`'s representative mark in `view`, if that view exists.
    pub fn point_member(&self, point: PointId, view: ViewId) -> Option<MarkId> {
        self.points.get(point)?.members.get(&view).copied()
    }

    pub fn point_doc_ref(&self, point: PointId) -> Option<DocRef> {
        self.points.get(point).map(|p| p.doc_ref)
    }

    /// Advance/retreat a `Point` by one character using `doc`, relocating
    /// its representative mark in every view it appears in.
    pub fn point_step<D: Doc>(&mut self, point: PointId, doc: &D, forward: bool) -> CoreResult<Codepoint> {
        let at = self.points.get(point).ok_or(CoreError::Fail("no such point"))?.doc_ref;
        let dir = if forward {
            CharDirection::ForwardStep
        } else {
            CharDirection::BackwardStep
        };
        let (c, next) = doc.char_at(at, dir);
        if matches!(c, Codepoint::EndOfStream) {
            return Ok(c);
        }
        self.relocate_point(point, next)?;
        Ok(c)
    }

    /// Jump a `Point` to a document terminus, in every view it appears in.
    pub fn point_to_end<D: Doc>(&mut self, point: PointId, doc: &D, terminus: RefTerminus) -> CoreResult<()> {
        let at = doc.doc_terminus(terminus);
        self.relocate_point(point, at)
    }

    /// Move every view's representative mark for `point` to `new_ref`.
    fn relocate_point(&mut self, point: PointId, new_ref: DocRef) -> CoreResult<()> {
        let members: Vec<MarkId> = self
            .points
            .get(point)
            .ok_or(CoreError::Fail("no such point"))?
            .members
            .values()
            .copied()
            .collect();
        for m in members {
            self.relocate(m, new_ref)?;
        }
        self.points[point].doc_ref = new_ref;
        Ok(())
    }

    /// Remove a `Point` and every view's representative mark for it.
    pub fn free_point(&mut self, point: PointId) -> CoreResult<()> {
        let record = self.points.remove(point).ok_or(CoreError::Fail("no such point"))?;
        for (_, m) in record.members {
            self.free(m)?;
        }
        Ok(())
    }

    pub fn mark(&self, id: MarkId) -> Option<&Mark> {
        self.marks.get(id)
    }

    fn insert_seq(&mut self, view: ViewId, seq: i64, id: MarkId) {
        self.views
            .get_mut(view)
            .expect("view exists")
            .order
            .insert(seq, id);
    }

    fn allocate_seq_after(&mut self, view: ViewId, after: Option<MarkId>) -> i64 {
        let v = self.views.get(view).expect("view exists");
        let (before_seq, at_or_after_seq) = match after {
            None => (None, v.first_seq()),
            Some(m) => {
                let s = self.marks[m].seq;
                (Some(s), v.neighbors(s).1)
            }
        };
        match seq::midpoint(before_seq, at_or_after_seq) {
            Some(s) => s,
            None => {
                self.spread_view(view);
                let v = self.views.get(view).expect("view exists");
                let before_seq = after.map(|m| self.marks[m].seq);
                let at_or_after_seq = match after {
                    None => v.first_seq(),
                    Some(m) => v.neighbors(self.marks[m].seq).1,
                };
                seq::midpoint(before_seq, at_or_after_seq)
                    .expect("seq space exhausted even after spreading a view")
            }
        }
    }

    /// Renumber every mark in `view` to `seq::SPREAD_GAP`-spaced values,
    /// preserving relative order. A full-view renumber rather than a
    /// windowed one (spec.md §4.2 describes growing a local window first);
    /// simpler, and in practice views hold far fewer marks than a document
    /// has characters, so the O(n) cost is not the bottleneck here.
    fn spread_view(&mut self, view: ViewId) {
        let ids: Vec<MarkId> = self.views[view].order.values().copied().collect();
        let new_seqs = seq::spread_seqs(0, ids.len(), seq::SPREAD_GAP);
        let mut order = BTreeMap::new();
        for (id, s) in ids.into_iter().zip(new_seqs) {
            self.marks[id].seq = s;
            order.insert(s, id);
        }
        self.views[view].order = order;
    }

    /// spec.md §3/§4.2 `new_mark`: create a mark at `at` in `view`, appended
    /// after the view's current last mark.
    pub fn new_mark(&mut self, view: ViewId, at: DocRef) -> MarkId {
        let last = self.views[view].last_seq();
        let seq = seq::midpoint(last, None).expect("append never exhausts seq space");
        let id = self.marks.insert(Mark {
            doc_ref: at,
            seq,
            view,
            attrs: AttrSet::new(),
            mdata: None,
            flags: MarkFlags::empty(),
            moved: false,
            point: None,
        });
        self.insert_seq(view, seq, id);
        id
    }

    /// spec.md §4.2 `mark_dup`: a new mark at the same point, immediately
    /// after `m` in the same view.
    pub fn mark_dup(&mut self, m: MarkId) -> CoreResult<MarkId> {
        let (at, view, flags) = {
            let mk = self.marks.get(m).ok_or(CoreError::Fail("no such mark"))?;
            (mk.doc_ref, mk.view, mk.flags)
        };
        let seq = self.allocate_seq_after(view, Some(m));
        let id = self.marks.insert(Mark {
            doc_ref: at,
            seq,
            view,
            attrs: AttrSet::new(),
            mdata: None,
            flags,
            moved: false,
            point: None,
        });
        self.insert_seq(view, seq, id);
        Ok(id)
    }

    /// spec.md §4.2 `mark_dup_view`: duplicate `m`'s point into a different
    /// view's list, appended at that view's end.
    pub fn mark_dup_view(&mut self, m: MarkId, target: ViewId) -> CoreResult<MarkId> {
        let (at, flags) = {
            let mk = self.marks.get(m).ok_or(CoreError::Fail("no such mark"))?;
            (mk.doc_ref, mk.flags)
        };
        let id = self.new_mark(target, at);
        self.marks[id].flags = flags;
        Ok(id)
    }

    /// spec.md §4.2 `mark_to_mark`: relocate `m` to `other`'s point, seated
    /// immediately after `other` in view order.
    pub fn mark_to_mark(&mut self, m: MarkId, other: MarkId) -> CoreResult<()> {
        let (at, view) = {
            let o = self
                .marks
                .get(other)
                .ok_or(CoreError::Fail("no such mark"))?;
            (o.doc_ref, o.view)
        };
        if self.marks.get(m).ok_or(CoreError::Fail("no such mark"))?.view != view {
            return Err(CoreError::Invalid(
                "mark_to_mark across views is not defined".into(),
            ));
        }
        self.reseat(m, Some(other))?;
        self.marks[m].doc_ref = at;
        Ok(())
    }

    /// Remove `m` from its view's seq list, then reinsert immediately after
    /// `after` (or at the start if `after` is `None`).
    fn reseat(&mut self, m: MarkId, after: Option<MarkId>) -> CoreResult<()> {
        let view = self.marks.get(m).ok_or(CoreError::Fail("no such mark"))?.view;
        self.views.get_mut(view).unwrap().order.remove(&self.marks[m].seq);
        let seq = self.allocate_seq_after(view, after);
        self.marks[m].seq = seq;
        self.insert_seq(view, seq, m);
        Ok(())
    }

    /// spec.md §4.2 `mark_step`: advance/retreat `m` by one character using
    /// `doc`, reseating it to keep seq order consistent with doc order.
    pub fn mark_step<D: Doc>(&mut self, m: MarkId, doc: &D, forward: bool) -> CoreResult<Codepoint> {
        let at = self.marks.get(m).ok_or(CoreError::Fail("no such mark"))?.doc_ref;
        let dir = if forward {
            CharDirection::ForwardStep
        } else {
            CharDirection::BackwardStep
        };
        let (c, next) = doc.char_at(at, dir);
        if matches!(c, Codepoint::EndOfStream) {
            return Ok(c);
        }
        self.relocate(m, next)?;
        Ok(c)
    }

    /// spec.md §4.2 `mark_to_end`: jump `m` to a document terminus.
    pub fn mark_to_end<D: Doc>(&mut self, m: MarkId, doc: &D, terminus: RefTerminus) -> CoreResult<()> {
        let at = doc.doc_terminus(terminus);
        self.relocate(m, at)
    }

    /// Move `m` to `new_ref`, reseating it in its view's order if the new
    /// position no longer sits between the same neighbors.
    fn relocate(&mut self, m: MarkId, new_ref: DocRef) -> CoreResult<()> {
        let view = self.marks.get(m).ok_or(CoreError::Fail("no such mark"))?.view;
        let seq = self.marks[m].seq;
        let (before, after) = self.views[view].neighbors(seq);
        let before_ref = before.and_then(|s| self.views[view].order.get(&s)).map(|id| self.marks[*id].doc_ref);
        let after_ref = after.and_then(|s| self.views[view].order.get(&s)).map(|id| self.marks[*id].doc_ref);
        let still_ordered = before_ref.is_none_or(|b| b <= new_ref) && after_ref.is_none_or(|a| new_ref <= a);
        self.marks[m].doc_ref = new_ref;
        if !still_ordered {
            self.reposition_by_ref(m)?;
        }
        Ok(())
    }

    /// Remove `m` and reinsert at the seq position its current `doc_ref`
    /// implies, scanning the view's marks in order. O(n) in view size; see
    /// `spread_view` doc comment for why that's an acceptable trade-off here.
    fn reposition_by_ref(&mut self, m: MarkId) -> CoreResult<()> {
        let view = self.marks.get(m).ok_or(CoreError::Fail("no such mark"))?.view;
        let target_ref = self.marks[m].doc_ref;
        self.views.get_mut(view).unwrap().order.remove(&self.marks[m].seq);
        let after = self.views[view]
            .order
            .values()
            .copied()
            .filter(|&id| self.marks[id].doc_ref <= target_ref)
            .next_back();
        let seq = self.allocate_seq_after(view, after);
        self.marks[m].seq = seq;
        self.insert_seq(view, seq, m);
        Ok(())
    }

    /// spec.md §4.2 `free`: remove a mark from its view. If `m` is one
    /// view's representative for a `Point`, only that view's membership is
    /// dropped; use [`MarkStore::free_point`] to remove a `Point` entirely.
    pub fn free(&mut self, m: MarkId) -> CoreResult<()> {
        let mk = self.marks.remove(m).ok_or(CoreError::Fail("no such mark"))?;
        self.views
            .get_mut(mk.view)
            .map(|v| v.order.remove(&mk.seq));
        if let Some(p) = mk.point
            && let Some(record) = self.points.get_mut(p)
        {
            record.members.remove(&mk.view);
        }
        Ok(())
    }

    pub fn set_flags(&mut self, m: MarkId, flags: MarkFlags) -> CoreResult<()> {
        self.marks
            .get_mut(m)
            .ok_or(CoreError::Fail("no such mark"))?
            .flags = flags;
        Ok(())
    }

    /// Clear a `Point`'s `moved` latch after the caller has observed it
    /// (spec.md §3 Point "moved" / "mark_ack").
    pub fn mark_ack(&mut self, m: MarkId) -> CoreResult<()> {
        self.marks
            .get_mut(m)
            .ok_or(CoreError::Fail("no such mark"))?
            .moved = false;
        Ok(())
    }

    // --- vmark iteration (spec.md §4.2) ---

    pub fn vmark_first(&self, view: ViewId) -> Option<MarkId> {
        self.views.get(view)?.first_seq().map(|s| self.views[view].order[&s])
    }

    pub fn vmark_last(&self, view: ViewId) -> Option<MarkId> {
        self.views.get(view)?.last_seq().map(|s| self.views[view].order[&s])
    }

    pub fn vmark_next(&self, m: MarkId) -> Option<MarkId> {
        let mk = self.marks.get(m)?;
        let view = &self.views[mk.view];
        view.order.range(mk.seq + 1..).next().map(|(_, id)| *id)
    }

    pub fn vmark_prev(&self, m: MarkId) -> Option<MarkId> {
        let mk = self.marks.get(m)?;
        let view = &self.views[mk.view];
        view.order.range(..mk.seq).next_back().map(|(_, id)| *id)
    }

    /// Nearest mark in `view` whose `doc_ref` is `<= at`, preferring the
    /// closest one before it (spec.md §4.2 vmark "at-or-before").
    pub fn vmark_at_or_before(&self, view: ViewId, at: DocRef) -> Option<MarkId> {
        self.views
            .get(view)?
            .order
            .values()
            .copied()
            .filter(|&id| self.marks[id].doc_ref <= at)
            .next_back()
    }

    /// spec.md §4.2 vmark "matching": the nearest mark in `m`'s view, other
    /// than `m` itself, that sits at exactly `m`'s `doc_ref` — e.g. to find
    /// a selection's anchor sitting at the same point as its cursor. Prefers
    /// the neighbor immediately after `m` in seq order, falling back to the
    /// one immediately before if no same-position mark follows it.
    pub fn vmark_matching(&self, m: MarkId) -> Option<MarkId> {
        let at = self.marks.get(m)?.doc_ref;
        let mut candidate = self.vmark_next(m);
        while let Some(c) = candidate {
            if self.marks[c].doc_ref != at {
                break;
            }
            if c != m {
                return Some(c);
            }
            candidate = self.vmark_next(c);
        }
        let mut candidate = self.vmark_prev(m);
        while let Some(c) = candidate {
            if self.marks[c].doc_ref != at {
                break;
            }
            if c != m {
                return Some(c);
            }
            candidate = self.vmark_prev(c);
        }
        None
    }

    // --- clipping on content replace (spec.md §4.2, §5) ---

    /// After a `Doc::replace`-style edit over `[start, end)` that produced
    /// `new_end`, relocate every mark so the view stays consistent:
    /// marks strictly inside the removed span collapse to `new_end`; marks
    /// at or after `end` shift by the same delta the edit applied. Returns
    /// the ids of `WATCHED` marks that moved, so the caller can notify
    /// `doc` with `DocEvent::MarkMoving` for each (spec.md §5 ordering:
    /// callers should do this once, right after the edit, before any other
    /// observer runs).
    pub fn clip_for_replace<D: Doc>(
        &mut self,
        doc: &mut D,
        start: DocRef,
        end: DocRef,
        new_end: DocRef,
    ) -> Vec<MarkId> {
        let delta = new_end.index as i64 - end.index as i64;
        let ids: Vec<MarkId> = self.marks.keys().collect();
        let mut moved = Vec::new();
        for id in ids {
            let old = self.marks[id].doc_ref;
            let new_ref = if old.page != start.page {
                old
            } else if old.index >= start.index && old.index < end.index {
                new_end
            } else if old.index >= end.index {
                DocRef::new(old.page, (old.index as i64 + delta).max(0) as u32)
            } else {
                old
            };
            if new_ref != old {
                let was_point = self.marks[id].is_point();
                let watched = self.marks[id].flags.contains(MarkFlags::WATCHED);
                if let Err(e) = self.relocate(id, new_ref) {
                    tracing::warn!(error = %e, "mark relocation failed during clip");
                    continue;
                }
                if was_point {
                    self.marks[id].moved = true;
                    if let Some(p) = self.marks[id].point {
                        self.points[p].doc_ref = new_ref;
                    }
                }
                if watched {
                    moved.push(id);
                    doc.notify(DocEvent::MarkMoving { at: new_ref });
                }
            }
        }
        moved
    }

    /// spec.md §8 invariant: within every view, marks are stored in
    /// non-decreasing `doc_ref` order as `seq` increases.
    pub fn debug_check_consistency(&self) -> CoreResult<()> {
        for view in self.views.values() {
            let mut last: Option<DocRef> = None;
            for id in view.order.values() {
                let r = self.marks[*id].doc_ref;
                if let Some(prev) = last
                    && prev > r
                {
                    return Err(CoreError::Inconsistent(format!(
                        "marks out of order: {prev:?} precedes {r:?} in seq order"
                    )));
                }
                last = Some(r);
            }
        }
        for (point, record) in self.points.iter() {
            for view in self.views.keys() {
                if !record.members.contains_key(&view) {
                    return Err(CoreError::Inconsistent(format!(
                        "point {point:?} is missing a representative mark in view {view:?}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_doc::rope_doc::RopeDoc;

    #[test]
    fn new_mark_and_vmark_walk() {
        let mut store = MarkStore::new();
        let view = store.new_view();
        let a = store.new_mark(view, DocRef::new(0, 1));
        let b = store.new_mark(view, DocRef::new(0, 2));
        let c = store.new_mark(view, DocRef::new(0, 3));
        assert_eq!(store.vmark_first(view), Some(a));
        assert_eq!(store.vmark_next(a), Some(b));
        assert_eq!(store.vmark_next(b), Some(c));
        assert_eq!(store.vmark_last(view), Some(c));
        assert_eq!(store.vmark_prev(c), Some(b));
        store.debug_check_consistency().unwrap();
    }

    #[test]
    fn mark_dup_sits_immediately_after_original() {
        let mut store = MarkStore::new();
        let view = store.new_view();
        let a = store.new_mark(view, DocRef::new(0, 5));
        let z = store.new_mark(view, DocRef::new(0, 9));
        let dup = store.mark_dup(a).unwrap();
        assert_eq!(store.vmark_next(a), Some(dup));
        assert_eq!(store.vmark_next(dup), Some(z));
    }

    #[test]
    fn mark_step_advances_and_reports_eos() {
        let doc = RopeDoc::from_str("ab");
        let mut store = MarkStore::new();
        let view = store.new_view();
        let m = store.new_mark(view, DocRef::new(0, 0));
        let c1 = store.mark_step(m, &doc, true).unwrap();
        assert_eq!(c1, Codepoint::Char('a'));
        assert_eq!(store.mark(m).unwrap().doc_ref, DocRef::new(0, 1));
        let c2 = store.mark_step(m, &doc, true).unwrap();
        assert_eq!(c2, Codepoint::Char('b'));
        let c3 = store.mark_step(m, &doc, true).unwrap();
        assert_eq!(c3, Codepoint::EndOfStream);
        assert_eq!(store.mark(m).unwrap().doc_ref, DocRef::new(0, 2));
    }

    #[test]
    fn clip_for_replace_collapses_inside_marks_and_shifts_after() {
        let mut doc = RopeDoc::from_str("hello world");
        let mut store = MarkStore::new();
        let view = store.new_view();
        let inside = store.new_mark(view, DocRef::new(0, 3));
        let after = store.new_mark(view, DocRef::new(0, 8));
        let before = store.new_mark(view, DocRef::new(0, 0));

        let start = DocRef::new(0, 2);
        let end = DocRef::new(0, 5);
        let new_end = doc.replace(start, end, "XY");
        store.clip_for_replace(&mut doc, start, end, new_end);

        assert_eq!(store.mark(before).unwrap().doc_ref, DocRef::new(0, 0));
        assert_eq!(store.mark(inside).unwrap().doc_ref, new_end);
        assert_eq!(store.mark(after).unwrap().doc_ref, DocRef::new(0, 8 - 1));
        store.debug_check_consistency().unwrap();
    }

    #[test]
    fn watched_point_is_flagged_and_notifies() {
        let mut doc = RopeDoc::from_str("hello world");
        let mut store = MarkStore::new();
        let view = store.new_view();
        let point = store.new_point(DocRef::new(0, 3));
        let p = store.point_member(point, view).unwrap();
        store.set_flags(p, MarkFlags::WATCHED).unwrap();

        let start = DocRef::new(0, 2);
        let end = DocRef::new(0, 5);
        let new_end = doc.replace(start, end, "Z");
        let notified = store.clip_for_replace(&mut doc, start, end, new_end);

        assert_eq!(notified, vec![p]);
        assert!(store.mark(p).unwrap().moved());
        assert_eq!(store.point_doc_ref(point), Some(new_end));
        store.mark_ack(p).unwrap();
        assert!(!store.mark(p).unwrap().moved());
    }

    #[test]
    fn new_point_seeds_every_live_view_and_new_view_seeds_every_point() {
        let mut store = MarkStore::new();
        let v1 = store.new_view();
        let point = store.new_point(DocRef::new(0, 4));
        assert!(store.point_member(point, v1).is_some());

        let v2 = store.new_view();
        assert!(
            store.point_member(point, v2).is_some(),
            "a view created after the point must still get a representative"
        );
        assert_ne!(store.point_member(point, v1), store.point_member(point, v2));
        store.debug_check_consistency().unwrap();
    }

    #[test]
    fn point_step_relocates_representative_in_every_view() {
        let doc = RopeDoc::from_str("hello");
        let mut store = MarkStore::new();
        let v1 = store.new_view();
        let v2 = store.new_view();
        let point = store.new_point(DocRef::new(0, 0));

        let c = store.point_step(point, &doc, true).unwrap();
        assert_eq!(c, Codepoint::Char('h'));
        assert_eq!(store.point_doc_ref(point), Some(DocRef::new(0, 1)));
        assert_eq!(
            store.mark(store.point_member(point, v1).unwrap()).unwrap().doc_ref,
            DocRef::new(0, 1)
        );
        assert_eq!(
            store.mark(store.point_member(point, v2).unwrap()).unwrap().doc_ref,
            DocRef::new(0, 1)
        );
    }

    #[test]
    fn free_point_drops_every_representative() {
        let mut store = MarkStore::new();
        let v1 = store.new_view();
        let v2 = store.new_view();
        let point = store.new_point(DocRef::new(0, 0));
        let m1 = store.point_member(point, v1).unwrap();
        let m2 = store.point_member(point, v2).unwrap();

        store.free_point(point).unwrap();
        assert!(store.mark(m1).is_none());
        assert!(store.mark(m2).is_none());
        assert!(store.point_doc_ref(point).is_none());
    }

    #[test]
    fn vmark_matching_finds_same_position_neighbor() {
        let mut store = MarkStore::new();
        let view = store.new_view();
        let a = store.new_mark(view, DocRef::new(0, 3));
        let b = store.new_mark(view, DocRef::new(0, 3));
        let c = store.new_mark(view, DocRef::new(0, 9));

        assert_eq!(store.vmark_matching(a), Some(b));
        assert_eq!(store.vmark_matching(b), Some(a));
        assert_eq!(store.vmark_matching(c), None);
    }
}
