//! Pane tiler: a binary tree of panes covering a rectangular region, with
//! split/close/grow/navigate operations and a bottom-up/top-down
//! size-refresh pass.
//!
//! Generalizes the cell-geometry vocabulary (`LayoutRegion`: x, y, width,
//! height) from "exactly one full-screen region" to an actual split tree.
//! `PaneId` uses `slotmap` for the same generation-checked-handle reason as
//! `core-marks::MarkId`. The tree itself is a plain recursive enum
//! (`Node`) — an owned `Box` tree needs no arena to be safe, so only the
//! externally-referenced leaf identities go through `slotmap`.

use core_attrs::error::{CoreError, CoreResult};
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Stable handle to a leaf pane.
    pub struct PaneId;
}

/// Opaque content identifier a caller associates with a pane (e.g. a view
/// or document handle from a higher layer). This crate never interprets
/// it, only stores and swaps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDir {
    /// Panes side by side, dividing width.
    Horizontal,
    /// Panes stacked, dividing height.
    Vertical,
}

/// A pane narrower than this (in columns) is never given a side-by-side
/// sibling; a `Horizontal` split request on a pane this narrow is
/// redirected to `Vertical` instead (spec.md §4.7).
pub const AUTO_SPLIT_MIN_FULL_WIDTH: u16 = 120;

/// Panes are never sized below this in either dimension.
pub const MIN_PANE_DIM: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutRegion {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

struct PaneMeta {
    region: LayoutRegion,
    content: Option<ContentId>,
    buried: Vec<ContentId>,
}

enum Node {
    Leaf(PaneId),
    Split {
        dir: SplitDir,
        /// Percent of the region the left/first child receives, 1..=99.
        ratio_pct: u8,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// How to pick the pane a new document should appear in (spec.md §4.7
/// "OtherPane/ThisPane/DocPane chooser").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneChoice {
    ThisPane,
    OtherPane,
    DocPane(PaneId),
}

pub struct Tiler {
    root: Node,
    panes: SlotMap<PaneId, PaneMeta>,
    active: PaneId,
    width: u16,
    height: u16,
}

impl Tiler {
    pub fn new(width: u16, height: u16) -> Self {
        let mut panes = SlotMap::with_key();
        let id = panes.insert(PaneMeta {
            region: LayoutRegion { x: 0, y: 0, width, height },
            content: None,
            buried: Vec::new(),
        });
        Self {
            root: Node::Leaf(id),
            panes,
            active: id,
            width,
            height,
        }
    }

    pub fn active_pane(&self) -> PaneId {
        self.active
    }

    pub fn set_active(&mut self, pane: PaneId) -> CoreResult<()> {
        if !self.panes.contains_key(pane) {
            return Err(CoreError::Fail("no such pane"));
        }
        self.active = pane;
        Ok(())
    }

    pub fn region(&self, pane: PaneId) -> Option<LayoutRegion> {
        self.panes.get(pane).map(|m| m.region)
    }

    pub fn content(&self, pane: PaneId) -> Option<ContentId> {
        self.panes.get(pane).and_then(|m| m.content)
    }

    pub fn set_content(&mut self, pane: PaneId, content: ContentId) -> CoreResult<()> {
        self.panes
            .get_mut(pane)
            .ok_or(CoreError::Fail("no such pane"))?
            .content = Some(content);
        Ok(())
    }

    /// Leaves in left-to-right, depth-first order.
    pub fn panes_in_order(&self) -> Vec<PaneId> {
        let mut out = Vec::new();
        fn walk(node: &Node, out: &mut Vec<PaneId>) {
            match node {
                Node::Leaf(id) => out.push(*id),
                Node::Split { left, right, .. } => {
                    walk(left, out);
                    walk(right, out);
                }
            }
        }
        walk(&self.root, &mut out);
        out
    }

    pub fn next_pane(&self, from: PaneId) -> Option<PaneId> {
        let order = self.panes_in_order();
        let i = order.iter().position(|&p| p == from)?;
        Some(order[(i + 1) % order.len()])
    }

    pub fn prev_pane(&self, from: PaneId) -> Option<PaneId> {
        let order = self.panes_in_order();
        let i = order.iter().position(|&p| p == from)?;
        Some(order[(i + order.len() - 1) % order.len()])
    }

    /// spec.md §4.7 chooser: resolve an abstract placement choice to a
    /// concrete pane.
    pub fn resolve(&self, choice: PaneChoice) -> PaneId {
        match choice {
            PaneChoice::ThisPane => self.active,
            PaneChoice::OtherPane => self.next_pane(self.active).unwrap_or(self.active),
            PaneChoice::DocPane(id) => id,
        }
    }

    /// Split the active pane, returning the new sibling's id (which
    /// becomes active). `dir` may be auto-redirected from `Horizontal` to
    /// `Vertical` if the active pane is narrower than
    /// [`AUTO_SPLIT_MIN_FULL_WIDTH`].
    pub fn split(&mut self, dir: SplitDir) -> PaneId {
        let region = self.panes[self.active].region;
        let dir = if dir == SplitDir::Horizontal && region.width < AUTO_SPLIT_MIN_FULL_WIDTH {
            SplitDir::Vertical
        } else {
            dir
        };

        let new_content = self.panes[self.active].content;
        let new_id = self.panes.insert(PaneMeta {
            region,
            content: new_content,
            buried: Vec::new(),
        });

        let active = self.active;
        replace_leaf(&mut self.root, active, |_| Node::Split {
            dir,
            ratio_pct: 50,
            left: Box::new(Node::Leaf(active)),
            right: Box::new(Node::Leaf(new_id)),
        });
        self.active = new_id;
        self.refresh_size(self.width, self.height);
        new_id
    }

    /// Close `pane`; its sibling's subtree takes over the space. Errors if
    /// `pane` is the only remaining pane.
    pub fn close(&mut self, pane: PaneId) -> CoreResult<()> {
        if matches!(&self.root, Node::Leaf(id) if *id == pane) {
            return Err(CoreError::Invalid("cannot close the last pane".into()));
        }
        let removed = remove_leaf(&mut self.root, pane);
        if !removed {
            return Err(CoreError::Fail("no such pane"));
        }
        self.panes.remove(pane);
        if self.active == pane {
            self.active = *self.panes_in_order().first().expect("at least one pane remains");
        }
        self.refresh_size(self.width, self.height);
        Ok(())
    }

    /// Collapse the tree to a single pane, `keep`, discarding all others.
    pub fn close_others(&mut self, keep: PaneId) -> CoreResult<()> {
        if !self.panes.contains_key(keep) {
            return Err(CoreError::Fail("no such pane"));
        }
        let others: Vec<PaneId> = self.panes_in_order().into_iter().filter(|&p| p != keep).collect();
        for p in others {
            self.panes.remove(p);
        }
        self.root = Node::Leaf(keep);
        self.active = keep;
        self.refresh_size(self.width, self.height);
        Ok(())
    }

    /// Hide `pane`'s current content behind a buried stack, showing
    /// `next` instead. Returns the content that was buried, if any.
    pub fn bury(&mut self, pane: PaneId, next: ContentId) -> CoreResult<Option<ContentId>> {
        let meta = self.panes.get_mut(pane).ok_or(CoreError::Fail("no such pane"))?;
        let buried = meta.content.replace(next);
        if let Some(b) = buried {
            meta.buried.push(b);
        }
        Ok(buried)
    }

    /// Restore the most recently buried content for `pane`, if any.
    pub fn unbury(&mut self, pane: PaneId) -> CoreResult<Option<ContentId>> {
        let meta = self.panes.get_mut(pane).ok_or(CoreError::Fail("no such pane"))?;
        if let Some(prev) = meta.buried.pop() {
            meta.content = Some(prev);
            Ok(Some(prev))
        } else {
            Ok(None)
        }
    }

    /// Grow `pane` along `axis` by `delta_pct`, clamped to `[10, 90]` on
    /// whichever split ratio ends up adjusted (spec.md §4.7). Walks up from
    /// `pane`'s direct parent split toward the root, adjusting the nearest
    /// ancestor split whose own axis matches `axis` and leaving any
    /// mismatched-axis splits on the way untouched. No-op if no ancestor
    /// split has the requested axis.
    pub fn grow(&mut self, pane: PaneId, axis: SplitDir, delta_pct: i8) -> CoreResult<()> {
        if !self.panes.contains_key(pane) {
            return Err(CoreError::Fail("no such pane"));
        }
        if adjust_ratio(&mut self.root, pane, axis, delta_pct) {
            self.refresh_size(self.width, self.height);
            Ok(())
        } else {
            Ok(()) // no ancestor split along this axis; silently a no-op
        }
    }

    /// spec.md §4.7 "RefreshSize": recompute every pane's [`LayoutRegion`]
    /// for a new overall size. Bottom-up pass computes each subtree's
    /// minimum footprint; top-down pass distributes `width`/`height`
    /// honoring those minimums where the total allows it.
    pub fn refresh_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let region = LayoutRegion { x: 0, y: 0, width, height };
        assign_regions(&self.root, region, &mut self.panes);
    }
}

fn min_dims(node: &Node, panes: &SlotMap<PaneId, PaneMeta>) -> (u16, u16) {
    match node {
        Node::Leaf(_) => (MIN_PANE_DIM, MIN_PANE_DIM),
        Node::Split { dir, left, right, .. } => {
            let (lw, lh) = min_dims(left, panes);
            let (rw, rh) = min_dims(right, panes);
            match dir {
                SplitDir::Horizontal => (lw + rw, lh.max(rh)),
                SplitDir::Vertical => (lw.max(rw), lh + rh),
            }
        }
    }
}

fn assign_regions(node: &Node, region: LayoutRegion, panes: &mut SlotMap<PaneId, PaneMeta>) {
    match node {
        Node::Leaf(id) => {
            if let Some(meta) = panes.get_mut(*id) {
                meta.region = region;
            }
        }
        Node::Split { dir, ratio_pct, left, right } => {
            let (left_min, _) = min_dims(left, panes);
            let (right_min, _) = min_dims(right, panes);
            match dir {
                SplitDir::Horizontal => {
                    let mut left_w = (region.width as u32 * *ratio_pct as u32 / 100) as u16;
                    left_w = left_w.clamp(left_min.min(region.width), region.width.saturating_sub(right_min).max(left_min.min(region.width)));
                    let right_w = region.width.saturating_sub(left_w);
                    assign_regions(
                        left,
                        LayoutRegion { width: left_w, ..region },
                        panes,
                    );
                    assign_regions(
                        right,
                        LayoutRegion { x: region.x + left_w, width: right_w, ..region },
                        panes,
                    );
                }
                SplitDir::Vertical => {
                    let mut top_h = (region.height as u32 * *ratio_pct as u32 / 100) as u16;
                    top_h = top_h.clamp(left_min.min(region.height), region.height.saturating_sub(right_min).max(left_min.min(region.height)));
                    let bottom_h = region.height.saturating_sub(top_h);
                    assign_regions(
                        left,
                        LayoutRegion { height: top_h, ..region },
                        panes,
                    );
                    assign_regions(
                        right,
                        LayoutRegion { y: region.y + top_h, height: bottom_h, ..region },
                        panes,
                    );
                }
            }
        }
    }
}

fn contains_leaf(node: &Node, target: PaneId) -> bool {
    match node {
        Node::Leaf(id) => *id == target,
        Node::Split { left, right, .. } => contains_leaf(left, target) || contains_leaf(right, target),
    }
}

fn replace_leaf(node: &mut Node, target: PaneId, f: impl FnOnce(PaneId) -> Node) {
    if let Node::Leaf(id) = node {
        if *id == target {
            *node = f(target);
            return;
        }
    }
    if let Node::Split { left, right, .. } = node {
        if contains_leaf(left, target) {
            replace_leaf(left, target, f);
        } else {
            replace_leaf(right, target, f);
        }
    }
}

fn remove_leaf(node: &mut Node, target: PaneId) -> bool {
    match node {
        Node::Leaf(_) => false,
        Node::Split { left, right, .. } => {
            if matches!(&**left, Node::Leaf(id) if *id == target) {
                let promoted = std::mem::replace(right, Box::new(Node::Leaf(PaneId::default())));
                *node = *promoted;
                true
            } else if matches!(&**right, Node::Leaf(id) if *id == target) {
                let promoted = std::mem::replace(left, Box::new(Node::Leaf(PaneId::default())));
                *node = *promoted;
                true
            } else {
                remove_leaf(left, target) || remove_leaf(right, target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tiler_is_a_single_full_size_pane() {
        let t = Tiler::new(200, 50);
        let order = t.panes_in_order();
        assert_eq!(order.len(), 1);
        assert_eq!(t.active_pane(), order[0]);
        assert_eq!(t.region(order[0]), Some(LayoutRegion { x: 0, y: 0, width: 200, height: 50 }));
    }

    #[test]
    fn horizontal_split_divides_width_and_activates_the_new_pane() {
        let mut t = Tiler::new(200, 50);
        let first = t.active_pane();
        let second = t.split(SplitDir::Horizontal);
        assert_eq!(t.active_pane(), second);
        let r1 = t.region(first).unwrap();
        let r2 = t.region(second).unwrap();
        assert_eq!(r1.width + r2.width, 200);
        assert_eq!(r1.height, 50);
        assert_eq!(r2.height, 50);
        assert_eq!(r2.x, r1.x + r1.width);
    }

    #[test]
    fn narrow_pane_redirects_horizontal_split_to_vertical() {
        let mut t = Tiler::new(100, 50);
        let first = t.active_pane();
        let second = t.split(SplitDir::Horizontal);
        let r1 = t.region(first).unwrap();
        let r2 = t.region(second).unwrap();
        // Below AUTO_SPLIT_MIN_FULL_WIDTH, so the split stacks instead.
        assert_eq!(r1.width, 100);
        assert_eq!(r2.width, 100);
        assert_eq!(r1.height + r2.height, 50);
    }

    #[test]
    fn closing_a_pane_gives_its_space_to_the_sibling() {
        let mut t = Tiler::new(200, 50);
        let first = t.active_pane();
        let second = t.split(SplitDir::Horizontal);
        t.close(second).unwrap();
        assert_eq!(t.panes_in_order(), vec![first]);
        assert_eq!(t.region(first), Some(LayoutRegion { x: 0, y: 0, width: 200, height: 50 }));
        assert_eq!(t.active_pane(), first);
    }

    #[test]
    fn closing_the_last_pane_is_rejected() {
        let mut t = Tiler::new(200, 50);
        let only = t.active_pane();
        assert!(t.close(only).is_err());
    }

    #[test]
    fn next_and_prev_pane_wrap_around_in_tree_order() {
        let mut t = Tiler::new(200, 50);
        let a = t.active_pane();
        let b = t.split(SplitDir::Horizontal);
        assert_eq!(t.next_pane(b), Some(a));
        assert_eq!(t.prev_pane(a), Some(b));
    }

    #[test]
    fn bury_and_unbury_round_trip_content() {
        let mut t = Tiler::new(200, 50);
        let pane = t.active_pane();
        t.set_content(pane, ContentId(1)).unwrap();
        let prior = t.bury(pane, ContentId(2)).unwrap();
        assert_eq!(prior, Some(ContentId(1)));
        assert_eq!(t.content(pane), Some(ContentId(2)));
        let restored = t.unbury(pane).unwrap();
        assert_eq!(restored, Some(ContentId(1)));
        assert_eq!(t.content(pane), Some(ContentId(1)));
    }

    #[test]
    fn grow_adjusts_the_parent_split_ratio_and_resizes() {
        let mut t = Tiler::new(200, 50);
        let first = t.active_pane();
        let second = t.split(SplitDir::Horizontal);
        t.grow(first, SplitDir::Horizontal, 20).unwrap();
        let r1 = t.region(first).unwrap();
        // 50% + 20 = 70% of 200.
        assert_eq!(r1.width, 140);
        let r2 = t.region(second).unwrap();
        assert_eq!(r1.width + r2.width, 200);
    }

    #[test]
    fn grow_recurses_into_the_parent_when_the_local_axis_differs() {
        let mut t = Tiler::new(200, 50);
        let first = t.active_pane();
        let second = t.split(SplitDir::Horizontal);
        t.set_active(second).unwrap();
        let third = t.split(SplitDir::Vertical);
        // `third`'s direct parent split is Vertical; growing along
        // Horizontal must skip it and adjust the outer Horizontal split
        // between `first` and the (second, third) subtree instead. `third`
        // sits on the right of that split, so growing it shrinks `first`'s
        // (the left child's) share.
        t.grow(third, SplitDir::Horizontal, 20).unwrap();
        let r1 = t.region(first).unwrap();
        assert_eq!(r1.width, 60);
    }

    #[test]
    fn grow_is_a_no_op_when_no_ancestor_split_matches_the_axis() {
        let mut t = Tiler::new(200, 50);
        let first = t.active_pane();
        t.split(SplitDir::Horizontal);
        // Only a Horizontal split exists; asking to grow along Vertical
        // finds no matching ancestor and leaves the layout unchanged.
        let before = t.region(first).unwrap();
        t.grow(first, SplitDir::Vertical, 20).unwrap();
        let after = t.region(first).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn close_others_collapses_the_tree_to_one_pane() {
        let mut t = Tiler::new(200, 50);
        let first = t.active_pane();
        let second = t.split(SplitDir::Horizontal);
        let _third = t.split(SplitDir::Vertical);
        t.close_others(first).unwrap();
        assert_eq!(t.panes_in_order(), vec![first]);
        assert!(t.region(second).is_none());
        assert_eq!(t.region(first), Some(LayoutRegion { x: 0, y: 0, width: 200, height: 50 }));
    }

    #[test]
    fn resolve_chooses_this_other_or_named_pane() {
        let mut t = Tiler::new(200, 50);
        let first = t.active_pane();
        let second = t.split(SplitDir::Horizontal);
        assert_eq!(t.resolve(PaneChoice::ThisPane), second);
        assert_eq!(t.resolve(PaneChoice::OtherPane), first);
        assert_eq!(t.resolve(PaneChoice::DocPane(first)), first);
    }
}

/// Recurse toward `target`, then unwind trying each ancestor split in turn
/// (innermost first) until one whose `dir` matches `axis` is found. Growing
/// `target`'s side means increasing its share of the split: if `target`
/// sits in `left`, that's a positive adjustment to `ratio_pct` (the left
/// share); if it sits in `right`, a negative one.
fn adjust_ratio(node: &mut Node, target: PaneId, axis: SplitDir, delta_pct: i8) -> bool {
    match node {
        Node::Leaf(_) => false,
        Node::Split { dir, ratio_pct, left, right } => {
            let in_left = contains_leaf(left, target);
            let in_right = !in_left && contains_leaf(right, target);
            if !in_left && !in_right {
                return false;
            }
            if in_left && adjust_ratio(left, target, axis, delta_pct) {
                return true;
            }
            if in_right && adjust_ratio(right, target, axis, delta_pct) {
                return true;
            }
            if *dir != axis {
                return false;
            }
            let signed_delta = if in_left { delta_pct as i16 } else { -(delta_pct as i16) };
            let new_ratio = (*ratio_pct as i16 + signed_delta).clamp(10, 90) as u8;
            tracing::debug!(from = *ratio_pct, to = new_ratio, "adjusting split ratio");
            *ratio_pct = new_ratio;
            true
        }
    }
}
