//! Drag / resize / rotate gesture state machine.
//!
//! A gesture is one `pointer down → move* → up` sequence. The machine turns
//! raw pixel positions into normalized updates and hands them to a
//! [`GestureSink`]; it never touches geometry itself.
//!
//! - Drag is incremental: the anchor moves to the pointer after every move.
//! - Resize is cumulative: width/height are always computed from the size
//!   and anchor captured at pointer-down.
//! - Rotate is incremental: the start angle is rebased after every move, and
//!   the element center is read fresh from the live frame each time.

use crate::geometry::{MIN_SIZE_PERCENT, OverlayGeometry};
use crate::input::{HandleTarget, ListenerId, PointerEvent, PointerEventSource, Subscription};
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use uuid::Uuid;

/// Receiver of normalized gesture output.
pub trait GestureSink {
    /// Position delta, percent of container width/height.
    fn on_drag(&mut self, dx: f64, dy: f64);
    /// New size, percent of container width/height.
    fn on_resize(&mut self, width: f64, height: f64);
    /// Rotation delta in radians.
    fn on_rotate(&mut self, delta: f64);
}

impl GestureSink for OverlayGeometry {
    fn on_drag(&mut self, dx: f64, dy: f64) {
        *self = self.apply_drag(Vec2::new(dx, dy));
    }

    fn on_resize(&mut self, width: f64, height: f64) {
        *self = self.apply_resize(width, height);
    }

    fn on_rotate(&mut self, delta: f64) {
        *self = self.apply_rotate(delta);
    }
}

/// One emitted update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GestureUpdate {
    Drag { dx: f64, dy: f64 },
    Resize { width: f64, height: f64 },
    Rotate { delta: f64 },
}

impl GestureUpdate {
    /// Forward this update to a sink.
    pub fn dispatch<S: GestureSink + ?Sized>(self, sink: &mut S) {
        match self {
            GestureUpdate::Drag { dx, dy } => sink.on_drag(dx, dy),
            GestureUpdate::Resize { width, height } => sink.on_resize(width, height),
            GestureUpdate::Rotate { delta } => sink.on_rotate(delta),
        }
    }
}

/// Live measurements of the element and its container, in pointer pixels.
///
/// Hosts build a fresh frame for every event; nothing here is cached across
/// events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementFrame {
    /// Axis-aligned bounding box of the (possibly rotated) element.
    pub bounds: Rect,
    /// Unrotated layout size of the element.
    pub layout_size: Size,
    /// Container size to normalize against. Must be non-zero on both axes.
    pub container: Size,
}

impl ElementFrame {
    /// Frame of an overlay inside a container of the given size.
    pub fn for_geometry(geometry: &OverlayGeometry, container: Size) -> Self {
        Self {
            bounds: geometry.rotated_bounds(container),
            layout_size: geometry.pixel_size(container),
            container,
        }
    }

    fn angle_to(&self, point: Point) -> f64 {
        let center = self.bounds.center();
        (point.y - center.y).atan2(point.x - center.x)
    }
}

/// Which kind of gesture is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GestureMode {
    #[default]
    Idle,
    Dragging,
    Resizing,
    Rotating,
}

/// Transient state of the active gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureSession {
    #[default]
    Idle,
    Dragging {
        /// Last observed pointer position.
        anchor: Point,
    },
    Resizing {
        /// Pointer position at gesture start. Never rebased.
        anchor: Point,
        /// Element pixel size at gesture start.
        start_size: Size,
    },
    Rotating {
        /// Pointer angle around the element center at the previous event.
        start_angle: f64,
    },
}

impl GestureSession {
    /// The mode this session is in.
    pub fn mode(&self) -> GestureMode {
        match self {
            GestureSession::Idle => GestureMode::Idle,
            GestureSession::Dragging { .. } => GestureMode::Dragging,
            GestureSession::Resizing { .. } => GestureMode::Resizing,
            GestureSession::Rotating { .. } => GestureMode::Rotating,
        }
    }
}

/// Gesture interpreter for a single overlay element.
///
/// Global move/up listeners are held only while a gesture is active and are
/// released on pointer-up or when the machine is dropped.
pub struct GestureMachine {
    id: ListenerId,
    session: GestureSession,
    source: Rc<dyn PointerEventSource>,
    subscription: Option<Subscription>,
}

impl GestureMachine {
    /// Create an idle machine that registers its listeners on `source`.
    pub fn new(source: Rc<dyn PointerEventSource>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session: GestureSession::Idle,
            source,
            subscription: None,
        }
    }

    /// Listener identity on the pointer source.
    pub fn listener_id(&self) -> ListenerId {
        self.id
    }

    /// Current session.
    pub fn session(&self) -> GestureSession {
        self.session
    }

    /// Current mode.
    pub fn mode(&self) -> GestureMode {
        self.session.mode()
    }

    /// True while a gesture is active.
    pub fn is_active(&self) -> bool {
        self.session != GestureSession::Idle
    }

    /// Start a gesture. Ignored (returns `false`) unless the machine is idle.
    pub fn pointer_down(&mut self, position: Point, target: HandleTarget, frame: &ElementFrame) -> bool {
        if self.is_active() {
            log::debug!("pointer down ignored, {:?} already active", self.mode());
            return false;
        }

        self.session = match target {
            HandleTarget::Body => GestureSession::Dragging { anchor: position },
            HandleTarget::ResizeHandle => GestureSession::Resizing {
                anchor: position,
                start_size: frame.layout_size,
            },
            HandleTarget::RotateHandle => GestureSession::Rotating {
                start_angle: frame.angle_to(position),
            },
        };
        self.subscription = Some(Subscription::acquire(self.source.clone(), self.id));

        log::debug!("gesture {} started: {:?} at {:?}", self.id, self.mode(), position);
        true
    }

    /// Process a pointer move and emit at most one update to `sink`.
    ///
    /// Returns the emitted update, or `None` when idle.
    pub fn pointer_move<S: GestureSink + ?Sized>(
        &mut self,
        position: Point,
        frame: &ElementFrame,
        sink: &mut S,
    ) -> Option<GestureUpdate> {
        let container = frame.container;
        let update = match &mut self.session {
            GestureSession::Idle => return None,
            GestureSession::Dragging { anchor } => {
                let dx = (position.x - anchor.x) / container.width * 100.0;
                let dy = (position.y - anchor.y) / container.height * 100.0;
                *anchor = position;
                GestureUpdate::Drag { dx, dy }
            }
            GestureSession::Resizing { anchor, start_size } => {
                let width = (start_size.width + (position.x - anchor.x)) / container.width * 100.0;
                let height = (start_size.height + (position.y - anchor.y)) / container.height * 100.0;
                GestureUpdate::Resize {
                    width: width.max(MIN_SIZE_PERCENT),
                    height: height.max(MIN_SIZE_PERCENT),
                }
            }
            GestureSession::Rotating { start_angle } => {
                let current = frame.angle_to(position);
                let delta = current - *start_angle;
                *start_angle = current;
                GestureUpdate::Rotate { delta }
            }
        };

        log::trace!("gesture {} update: {:?}", self.id, update);
        update.dispatch(sink);
        Some(update)
    }

    /// End the active gesture, wherever the pointer is. Returns `true` if one ended.
    pub fn pointer_up(&mut self) -> bool {
        let was_active = self.is_active();
        if was_active {
            log::debug!("gesture {} ended: {:?}", self.id, self.mode());
        }
        self.session = GestureSession::Idle;
        self.subscription = None;
        was_active
    }

    /// Feed any pointer event through the machine.
    pub fn handle_event<S: GestureSink + ?Sized>(
        &mut self,
        event: PointerEvent,
        frame: &ElementFrame,
        sink: &mut S,
    ) -> Option<GestureUpdate> {
        match event {
            PointerEvent::Down { position, target } => {
                self.pointer_down(position, target, frame);
                None
            }
            PointerEvent::Move { position } => self.pointer_move(position, frame, sink),
            PointerEvent::Up => {
                self.pointer_up();
                None
            }
        }
    }
}

impl std::fmt::Debug for GestureMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureMachine")
            .field("id", &self.id)
            .field("session", &self.session)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}
