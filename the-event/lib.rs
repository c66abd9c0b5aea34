//! Synchronous event buses with explicit subscriptions.
//!
//! Hosts emit events (text inserted, active document changed, config
//! changed) through an [`EventBus`]. Every call to [`EventBus::subscribe`]
//! hands back a [`Subscription`] whose [`Subscription::dispose`] removes the
//! listener again. Disposing is idempotent and stays safe after the bus
//! itself has been dropped, so teardown order never matters.
//!
//! Listeners receive a mutable context next to the event, which lets a
//! text-inserted listener edit the host that emitted the event:
//!
//! ```ignore
//! let bus: EventBus<char, String> = EventBus::new();
//! let sub = bus.subscribe(|buffer: &mut String, ch: &char| buffer.push(*ch));
//!
//! let mut buffer = String::new();
//! bus.emit(&mut buffer, &'a');
//! sub.dispose();
//! bus.emit(&mut buffer, &'b');
//! assert_eq!(buffer, "a");
//! ```
//!
//! # Re-entrancy
//!
//! Events are delivered synchronously. If a listener causes the same bus to
//! emit again while it is still running, the nested emission skips that
//! listener instead of calling it recursively.

use std::{
  cell::RefCell,
  fmt,
  rc::Rc,
};

use slotmap::{
  SlotMap,
  new_key_type,
};
use smallvec::SmallVec;

new_key_type! {
  pub struct ListenerKey;
}

/// A list of listeners for events of type `E`, each called with a mutable
/// context of type `C`.
pub struct EventBus<E: 'static, C: ?Sized + 'static = ()> {
  listeners: Rc<RefCell<SlotMap<ListenerKey, Listener<E, C>>>>,
}

struct Listener<E: 'static, C: ?Sized + 'static> {
  callback: Rc<RefCell<dyn FnMut(&mut C, &E)>>,
}

impl<E: 'static, C: ?Sized + 'static> Clone for Listener<E, C> {
  fn clone(&self) -> Self {
    Self {
      callback: self.callback.clone(),
    }
  }
}

impl<E: 'static, C: ?Sized + 'static> EventBus<E, C> {
  pub fn new() -> Self {
    Self {
      listeners: Rc::new(RefCell::new(SlotMap::with_key())),
    }
  }

  /// Register `listener`. It stays registered until the returned
  /// subscription is disposed or dropped.
  #[must_use = "dropping a subscription disposes it"]
  pub fn subscribe<F>(&self, listener: F) -> Subscription
  where
    F: FnMut(&mut C, &E) + 'static,
  {
    let callback: Rc<RefCell<dyn FnMut(&mut C, &E)>> = Rc::new(RefCell::new(listener));
    let key = self.listeners.borrow_mut().insert(Listener { callback });
    let listeners = Rc::downgrade(&self.listeners);

    Subscription::new(move || {
      if let Some(listeners) = listeners.upgrade() {
        listeners.borrow_mut().remove(key);
      }
    })
  }

  /// Deliver `event` to every listener, returning how many were called.
  ///
  /// Listeners disposed by an earlier listener during the same emission are
  /// not called. Listeners that are already running further up the stack
  /// are skipped.
  pub fn emit(&self, cx: &mut C, event: &E) -> usize {
    let snapshot: SmallVec<[(ListenerKey, Listener<E, C>); 4]> = self
      .listeners
      .borrow()
      .iter()
      .map(|(key, listener)| (key, listener.clone()))
      .collect();

    let mut delivered = 0;
    for (key, listener) in snapshot {
      if !self.listeners.borrow().contains_key(key) {
        continue;
      }

      let Ok(mut callback) = listener.callback.try_borrow_mut() else {
        log::trace!("skipping re-entrant listener {key:?}");
        continue;
      };
      (&mut *callback)(&mut *cx, event);
      delivered += 1;
    }
    delivered
  }

  pub fn len(&self) -> usize {
    self.listeners.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.listeners.borrow().is_empty()
  }
}

impl<E: 'static, C: ?Sized + 'static> Default for EventBus<E, C> {
  fn default() -> Self {
    Self::new()
  }
}

impl<E: 'static, C: ?Sized + 'static> fmt::Debug for EventBus<E, C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EventBus")
      .field("listeners", &self.len())
      .finish()
  }
}

/// Handle to a registered listener.
///
/// Dropping the handle disposes the listener; use [`Subscription::detach`]
/// to keep it registered for the lifetime of the bus.
pub struct Subscription {
  unsubscribe: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
  fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
    Self {
      unsubscribe: RefCell::new(Some(Box::new(unsubscribe))),
    }
  }

  /// Remove the listener. Calling this more than once, or after the bus is
  /// gone, does nothing.
  pub fn dispose(&self) {
    let unsubscribe = self.unsubscribe.borrow_mut().take();
    if let Some(unsubscribe) = unsubscribe {
      unsubscribe();
    }
  }

  pub fn is_disposed(&self) -> bool {
    self.unsubscribe.borrow().is_none()
  }

  /// Forget the handle without removing the listener.
  pub fn detach(self) {
    self.unsubscribe.borrow_mut().take();
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.dispose();
  }
}

impl fmt::Debug for Subscription {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Subscription")
      .field("disposed", &self.is_disposed())
      .finish()
  }
}

#[cfg(test)]
mod test {
  use std::cell::Cell;

  use super::*;

  #[test]
  fn emit_reaches_every_listener() {
    let bus: EventBus<u32, Vec<u32>> = EventBus::new();
    let _a = bus.subscribe(|seen: &mut Vec<u32>, n: &u32| seen.push(*n));
    let _b = bus.subscribe(|seen: &mut Vec<u32>, n: &u32| seen.push(n * 10));

    let mut seen = Vec::new();
    assert_eq!(bus.emit(&mut seen, &3), 2);
    seen.sort();
    assert_eq!(seen, vec![3, 30]);
  }

  #[test]
  fn dispose_is_idempotent() {
    let bus: EventBus<u32, u32> = EventBus::new();
    let sub = bus.subscribe(|total: &mut u32, n: &u32| *total += n);
    let _other = bus.subscribe(|total: &mut u32, _: &u32| *total += 100);

    sub.dispose();
    sub.dispose();
    assert!(sub.is_disposed());
    assert_eq!(bus.len(), 1);

    let mut total = 0;
    bus.emit(&mut total, &1);
    assert_eq!(total, 100);
  }

  #[test]
  fn dispose_after_bus_dropped() {
    let bus: EventBus<()> = EventBus::new();
    let sub = bus.subscribe(|_, _| {});
    drop(bus);

    sub.dispose();
    assert!(sub.is_disposed());
  }

  #[test]
  fn drop_disposes_and_detach_keeps() {
    let bus: EventBus<(), u32> = EventBus::new();
    drop(bus.subscribe(|count: &mut u32, _| *count += 1));
    assert!(bus.is_empty());

    bus.subscribe(|count: &mut u32, _| *count += 1).detach();
    let mut count = 0;
    bus.emit(&mut count, &());
    assert_eq!(count, 1);
    assert_eq!(bus.len(), 1);
  }

  #[test]
  fn listener_disposed_mid_emit_is_not_called() {
    let bus: EventBus<(), Vec<&'static str>> = EventBus::new();
    let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

    let first = {
      let victim = victim.clone();
      bus.subscribe(move |log: &mut Vec<&'static str>, _| {
        log.push("first");
        if let Some(sub) = victim.borrow().as_ref() {
          sub.dispose();
        }
      })
    };
    *victim.borrow_mut() = Some(bus.subscribe(|log: &mut Vec<&'static str>, _| log.push("victim")));

    let mut log = Vec::new();
    bus.emit(&mut log, &());
    assert_eq!(log, vec!["first"]);
    assert_eq!(bus.len(), 1);
    drop(first);
  }

  #[test]
  fn nested_emit_skips_running_listener() {
    let bus: Rc<EventBus<u32, u32>> = Rc::new(EventBus::new());
    let calls = Rc::new(Cell::new(0));

    let _sub = {
      let weak = Rc::downgrade(&bus);
      let calls = calls.clone();
      bus.subscribe(move |depth: &mut u32, _: &u32| {
        calls.set(calls.get() + 1);
        *depth += 1;
        if let Some(bus) = weak.upgrade() {
          assert_eq!(bus.emit(depth, &0), 0);
        }
      })
    };

    let mut depth = 0;
    assert_eq!(bus.emit(&mut depth, &0), 1);
    assert_eq!(calls.get(), 1);
    assert_eq!(depth, 1);
  }
}
