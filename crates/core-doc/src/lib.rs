//! `Doc` contract (spec.md §3 "Doc (external, contract only)", L1) and
//! `LineOracle` contract (spec.md §4.3, L3).
//!
//! The core never names a file, a keystroke, or a glyph (spec.md §1); this
//! crate defines only the read-oriented interface other layers code
//! against, plus one concrete, in-memory implementation (`RopeDoc`) needed
//! so `core-marks` and `core-viewport` have something to run their tests
//! against (spec.md §1 lists file I/O and specific document types as
//! external collaborators — `RopeDoc` never touches a filesystem).

pub mod markup;
pub mod rope_doc;

pub use core_attrs::error::{CoreError, CoreResult};
use core_events::{EventBus, SubscriptionId};

/// Opaque content-identity reference (spec.md §3 Mark: "ref: an opaque
/// `(p: PageId, i: IndexInPage)` pair meaningful only to the owning Doc").
/// `RopeDoc` is single-page, so `page` is always 0; `index` is whatever the
/// concrete `Doc` wants it to mean — for `RopeDoc` it's an absolute char
/// offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocRef {
    pub page: u32,
    pub index: u32,
}

impl DocRef {
    pub fn new(page: u32, index: u32) -> Self {
        Self { page, index }
    }
}

/// Direction for a single-step/peek content read (spec.md §3 `char_at`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharDirection {
    ForwardPeek,
    ForwardStep,
    BackwardPeek,
    BackwardStep,
}

impl CharDirection {
    pub fn is_forward(self) -> bool {
        matches!(self, CharDirection::ForwardPeek | CharDirection::ForwardStep)
    }
    pub fn is_step(self) -> bool {
        matches!(self, CharDirection::ForwardStep | CharDirection::BackwardStep)
    }
}

/// A single content read result; `EndOfStream` is the sentinel spec.md §3
/// calls out explicitly rather than overloading `char`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codepoint {
    Char(char),
    EndOfStream,
}

/// `set_ref` terminus selector (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTerminus {
    ToStart,
    ToEnd,
}

/// Change notifications a `Doc` delivers (spec.md §3 `subscribe`, §5
/// "Ordering guarantees"). `point:moved` is deliberately absent here: it is
/// a `Point`-level coalesced notification owned by `core-marks`, not a
/// `Doc`-level one (see DESIGN.md for this Open-Question resolution).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocEvent {
    /// Content was replaced in `[start, end)` (end is the ref *before* the
    /// edit, i.e. the extent of the removed span).
    Replaced { start: DocRef, end: DocRef },
    /// An attribute changed at `at` without content moving.
    ReplacedAttr { at: DocRef },
    /// A specific mark was relocated. Re-emitted by `core-marks` through
    /// the same bus so all subscribers observe one consistently ordered
    /// stream, per spec.md §5's single ordering guarantee.
    MarkMoving { at: DocRef },
}

/// The read-oriented content oracle (L1) plus line oracle (L3) that every
/// higher layer (`core-marks`, `core-viewport`, the L5 sidecars) treats as
/// an opaque dependency.
pub trait Doc {
    /// Read or step one character in `direction` from `at`.
    fn char_at(&self, at: DocRef, direction: CharDirection) -> (Codepoint, DocRef);

    /// A `DocRef` at one terminus of the document.
    fn doc_terminus(&self, terminus: RefTerminus) -> DocRef;

    /// Render the text from `from` up to and including the next newline
    /// (spec.md §4.3), or fewer bytes if `max_bytes` bounds it, or if
    /// `stop` is reached first. Returns the rendered text and the ref at
    /// the end of what was produced.
    fn render_line(&self, from: DocRef, max_bytes: Option<usize>, stop: Option<DocRef>)
    -> (String, DocRef);

    /// Move `from` backward to a start-of-line; if `skip_newlines`, first
    /// step back across one newline.
    fn render_line_prev(&self, from: DocRef, skip_newlines: bool) -> DocRef;

    /// Byte offset within the line rendered from `start` at which `pm`
    /// sits (spec.md §4.3 `render_line_to_point`).
    fn render_line_to_point(&self, start: DocRef, pm: DocRef) -> usize;

    /// Content-identity: are `a` and `b` at the same logical position?
    fn mark_same(&self, a: DocRef, b: DocRef) -> bool;

    /// Register an observer for `Replaced` / `ReplacedAttr` / `MarkMoving`
    /// events, delivered synchronously and in registration order.
    fn subscribe(&mut self, observer: Box<dyn FnMut(&DocEvent)>) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Deliver `event` to every subscriber before returning. Exposed so
    /// `core-marks` can re-publish `MarkMoving` through the same bus a
    /// `Replaced` event travelled, preserving relative ordering.
    fn notify(&mut self, event: DocEvent);
}

/// Shared event-bus storage a concrete `Doc` embeds; factored out so
/// `RopeDoc` (and any future `Doc`) doesn't reimplement bookkeeping.
#[derive(Default)]
pub struct DocEvents {
    bus: EventBus<DocEvent>,
}

impl DocEvents {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn subscribe(&mut self, observer: Box<dyn FnMut(&DocEvent)>) -> SubscriptionId {
        self.bus.subscribe(observer)
    }
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.bus.unsubscribe(id);
    }
    pub fn notify(&mut self, event: DocEvent) {
        self.bus.dispatch(&event);
    }
}
