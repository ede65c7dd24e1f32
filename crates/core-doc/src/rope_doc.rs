//! `RopeDoc`: a concrete, in-memory `Doc` over a `ropey::Rope`.
//!
//! Backed by the same `ropey::Rope` storage this workspace's text layer
//! already uses elsewhere, pared down to exactly the `Doc` read contract,
//! plus one test-only mutation helper (`replace`). Content mutation is
//! explicitly external to the `Doc` contract itself; `replace` lives here
//! only as a convenience for exercising `core-marks`/`core-viewport`
//! against something real.

use crate::{CharDirection, Codepoint, Doc, DocEvent, DocEvents, DocRef, RefTerminus};
use core_events::SubscriptionId;
use ropey::Rope;

pub struct RopeDoc {
    rope: Rope,
    events: DocEvents,
}

impl RopeDoc {
    pub fn from_str(content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
            events: DocEvents::new(),
        }
    }

    pub fn char_len(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn to_string(&self) -> String {
        self.rope.to_string()
    }

    fn clamp(&self, idx: usize) -> usize {
        idx.min(self.rope.len_chars())
    }

    /// Replace `[start, end)` with `text`, emitting `DocEvent::Replaced`.
    /// Test/harness-only: not part of the `Doc` contract (see module docs).
    pub fn replace(&mut self, start: DocRef, end: DocRef, text: &str) -> DocRef {
        let s = self.clamp(start.index as usize);
        let e = self.clamp(end.index as usize).max(s);
        tracing::debug!(start = s, end = e, inserted = text.len(), "replacing content");
        self.rope.remove(s..e);
        self.rope.insert(s, text);
        let new_end = DocRef::new(0, (s + text.chars().count()) as u32);
        self.events.notify(DocEvent::Replaced {
            start: DocRef::new(0, s as u32),
            end: DocRef::new(0, e as u32),
        });
        new_end
    }
}

impl Doc for RopeDoc {
    fn char_at(&self, at: DocRef, direction: CharDirection) -> (Codepoint, DocRef) {
        let idx = at.index as usize;
        match direction {
            CharDirection::ForwardPeek => {
                if idx >= self.rope.len_chars() {
                    (Codepoint::EndOfStream, at)
                } else {
                    (Codepoint::Char(self.rope.char(idx)), at)
                }
            }
            CharDirection::ForwardStep => {
                if idx >= self.rope.len_chars() {
                    (Codepoint::EndOfStream, at)
                } else {
                    (
                        Codepoint::Char(self.rope.char(idx)),
                        DocRef::new(0, idx as u32 + 1),
                    )
                }
            }
            CharDirection::BackwardPeek => {
                if idx == 0 {
                    (Codepoint::EndOfStream, at)
                } else {
                    (Codepoint::Char(self.rope.char(idx - 1)), at)
                }
            }
            CharDirection::BackwardStep => {
                if idx == 0 {
                    (Codepoint::EndOfStream, at)
                } else {
                    (
                        Codepoint::Char(self.rope.char(idx - 1)),
                        DocRef::new(0, idx as u32 - 1),
                    )
                }
            }
        }
    }

    fn doc_terminus(&self, terminus: RefTerminus) -> DocRef {
        match terminus {
            RefTerminus::ToStart => DocRef::new(0, 0),
            RefTerminus::ToEnd => DocRef::new(0, self.rope.len_chars() as u32),
        }
    }

    fn render_line(
        &self,
        from: DocRef,
        max_bytes: Option<usize>,
        stop: Option<DocRef>,
    ) -> (String, DocRef) {
        let start = self.clamp(from.index as usize);
        if start >= self.rope.len_chars() {
            return (String::new(), from);
        }
        let stop_idx = stop.map(|s| s.index as usize);
        let mut out = String::new();
        let mut idx = start;
        loop {
            if idx >= self.rope.len_chars() {
                break;
            }
            if let Some(si) = stop_idx
                && idx >= si
            {
                break;
            }
            let c = self.rope.char(idx);
            if let Some(limit) = max_bytes
                && out.len() + c.len_utf8() > limit
            {
                break;
            }
            out.push(c);
            idx += 1;
            if c == '\n' {
                break;
            }
        }
        (out, DocRef::new(0, idx as u32))
    }

    fn render_line_prev(&self, from: DocRef, skip_newlines: bool) -> DocRef {
        let mut idx = self.clamp(from.index as usize);
        if skip_newlines && idx > 0 {
            idx -= 1;
        }
        while idx > 0 && self.rope.char(idx - 1) != '\n' {
            idx -= 1;
        }
        DocRef::new(0, idx as u32)
    }

    fn render_line_to_point(&self, start: DocRef, pm: DocRef) -> usize {
        let s = self.clamp(start.index as usize);
        let p = self.clamp(pm.index as usize).max(s);
        self.rope.slice(s..p).len_bytes()
    }

    fn mark_same(&self, a: DocRef, b: DocRef) -> bool {
        a == b
    }

    fn subscribe(&mut self, observer: Box<dyn FnMut(&DocEvent)>) -> SubscriptionId {
        self.events.subscribe(observer)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.events.unsubscribe(id);
    }

    fn notify(&mut self, event: DocEvent) {
        self.events.notify(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn render_line_then_prev_round_trips() {
        let doc = RopeDoc::from_str("ab\ncd");
        let start = doc.doc_terminus(RefTerminus::ToStart);
        let (_line, end) = doc.render_line(start, None, None);
        let back = doc.render_line_prev(end, true);
        assert_eq!(back, start);
    }

    #[test]
    fn render_line_to_point_advances_start() {
        let doc = RopeDoc::from_str("hello\nworld");
        let start = doc.doc_terminus(RefTerminus::ToStart);
        let pm = DocRef::new(0, 3);
        let n = doc.render_line_to_point(start, pm);
        let (line, new_start) = doc.render_line(start, Some(n), None);
        assert_eq!(line, "hel");
        assert_eq!(new_start, pm);
    }

    #[test]
    fn replace_emits_event_in_order() {
        let mut doc = RopeDoc::from_str("abc");
        let hits = Rc::new(RefCell::new(Vec::new()));
        let h1 = hits.clone();
        doc.subscribe(Box::new(move |e| h1.borrow_mut().push(format!("{e:?}"))));
        let start = DocRef::new(0, 1);
        let end = DocRef::new(0, 2);
        doc.replace(start, end, "XY");
        assert_eq!(doc.to_string(), "aXYc");
        assert_eq!(hits.borrow().len(), 1);
    }

    #[test]
    fn char_at_forward_and_backward() {
        let doc = RopeDoc::from_str("ab");
        let (c, next) = doc.char_at(DocRef::new(0, 0), CharDirection::ForwardStep);
        assert_eq!(c, Codepoint::Char('a'));
        assert_eq!(next, DocRef::new(0, 1));
        let (c2, _) = doc.char_at(next, CharDirection::BackwardPeek);
        assert_eq!(c2, Codepoint::Char('a'));
        let (eos, _) = doc.char_at(DocRef::new(0, 2), CharDirection::ForwardPeek);
        assert_eq!(eos, Codepoint::EndOfStream);
    }
}
