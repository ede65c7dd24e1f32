//! A minimal, synchronous, ordered publish/subscribe bus.
//!
//! Change notifications must be delivered *before* the initiating command
//! returns, in subscriber registration order. This document core is
//! single-threaded and synchronous end to end, so there's no event loop to
//! feed a channel into — direct, in-order callback invocation is the only
//! delivery mechanism that satisfies the ordering guarantee exactly, and a
//! `tokio::mpsc` channel would add a dependency this crate has no use for.
//! See DESIGN.md for that dependency-drop note.
//!
//! Generic over the event payload type so it can back `Doc`'s
//! `replaced` / `replaced-attr` / `mark-moving` / `point:moved` stream
//! (`core-doc`) without this crate needing to know what a `Mark` is.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Handle returned by [`EventBus::subscribe`], usable to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

struct Subscriber<E> {
    id: SubscriptionId,
    observer: Box<dyn FnMut(&E)>,
}

/// An ordered collection of observers, dispatched synchronously and in
/// registration order.
pub struct EventBus<E> {
    subscribers: Vec<Subscriber<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register an observer; returns a handle for later `unsubscribe`.
    pub fn subscribe(&mut self, observer: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(NEXT_ID.fetch_add(1, AtomicOrdering::Relaxed));
        self.subscribers.push(Subscriber {
            id,
            observer: Box::new(observer),
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|s| s.id != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `event` to every subscriber, in registration order, before
    /// returning — satisfying spec.md §5's ordering guarantee by
    /// construction rather than by convention.
    pub fn dispatch(&mut self, event: &E) {
        for sub in &mut self.subscribers {
            (sub.observer)(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn dispatch_is_in_registration_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut bus: EventBus<u32> = EventBus::new();
        let o1 = order.clone();
        bus.subscribe(move |_| o1.borrow_mut().push(1));
        let o2 = order.clone();
        bus.subscribe(move |_| o2.borrow_mut().push(2));
        let o3 = order.clone();
        bus.subscribe(move |_| o3.borrow_mut().push(3));
        bus.dispatch(&42);
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hits = Rc::new(RefCell::new(0));
        let mut bus: EventBus<()> = EventBus::new();
        let h = hits.clone();
        let id = bus.subscribe(move |_| *h.borrow_mut() += 1);
        bus.dispatch(&());
        bus.unsubscribe(id);
        bus.dispatch(&());
        assert_eq!(*hits.borrow(), 1);
    }
}
