//! Pointer input surface and global listener registration.
//!
//! Hosts deliver `pointer down / move / up` in container pixel coordinates.
//! While a gesture is active, the gesture machine holds subscriptions for
//! document-wide move and up events through a [`PointerEventSource`], so
//! fast pointer motion that leaves the element is still delivered.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use uuid::Uuid;

/// Identifies one listener (one gesture machine) on a pointer source.
pub type ListenerId = Uuid;

/// Which region of an overlay a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleTarget {
    /// The element itself (starts a drag).
    Body,
    /// The bottom-right resize handle.
    ResizeHandle,
    /// The rotate handle outside the top-right corner.
    RotateHandle,
}

/// A single pointer event from the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, target: HandleTarget },
    Move { position: Point },
    Up,
}

/// Document-wide pointer channels a gesture listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerChannel {
    Move,
    Up,
}

/// Capability for registering document-wide pointer listeners.
///
/// Implementations use interior mutability, the same way a DOM event target
/// accepts listeners through a shared reference.
pub trait PointerEventSource {
    /// Start delivering global pointer-move events to `listener`.
    fn subscribe_global_pointer_move(&self, listener: ListenerId);
    /// Start delivering global pointer-up events to `listener`.
    fn subscribe_global_pointer_up(&self, listener: ListenerId);
    /// Stop delivering every channel to `listener`.
    fn unsubscribe(&self, listener: ListenerId);
}

/// Scoped registration of move + up listeners.
///
/// Acquired when a gesture starts; dropping it deregisters both channels.
pub struct Subscription {
    source: Rc<dyn PointerEventSource>,
    listener: ListenerId,
}

impl Subscription {
    /// Subscribe `listener` to global move and up events.
    pub fn acquire(source: Rc<dyn PointerEventSource>, listener: ListenerId) -> Self {
        source.subscribe_global_pointer_move(listener);
        source.subscribe_global_pointer_up(listener);
        Self { source, listener }
    }

    /// The listener this subscription belongs to.
    pub fn listener(&self) -> ListenerId {
        self.listener
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.source.unsubscribe(self.listener);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

/// In-process listener registry.
///
/// Used by hosts that dispatch pointer events themselves (the egui host, the
/// composition) and by tests as a fake event source.
#[derive(Debug, Default)]
pub struct PointerListeners {
    move_listeners: RefCell<HashSet<ListenerId>>,
    up_listeners: RefCell<HashSet<ListenerId>>,
}

impl PointerListeners {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `listener` receives events on `channel`.
    pub fn is_subscribed(&self, listener: ListenerId, channel: PointerChannel) -> bool {
        match channel {
            PointerChannel::Move => self.move_listeners.borrow().contains(&listener),
            PointerChannel::Up => self.up_listeners.borrow().contains(&listener),
        }
    }

    /// Snapshot of the listeners on `channel`.
    pub fn listeners(&self, channel: PointerChannel) -> Vec<ListenerId> {
        match channel {
            PointerChannel::Move => self.move_listeners.borrow().iter().copied().collect(),
            PointerChannel::Up => self.up_listeners.borrow().iter().copied().collect(),
        }
    }

    /// Total registrations across both channels.
    pub fn len(&self) -> usize {
        self.move_listeners.borrow().len() + self.up_listeners.borrow().len()
    }

    /// True when nothing is listening.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PointerEventSource for PointerListeners {
    fn subscribe_global_pointer_move(&self, listener: ListenerId) {
        self.move_listeners.borrow_mut().insert(listener);
    }

    fn subscribe_global_pointer_up(&self, listener: ListenerId) {
        self.up_listeners.borrow_mut().insert(listener);
    }

    fn unsubscribe(&self, listener: ListenerId) {
        self.move_listeners.borrow_mut().remove(&listener);
        self.up_listeners.borrow_mut().remove(&listener);
    }
}
