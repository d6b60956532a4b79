//! End-to-end gesture scenarios: host events in, geometry and listener
//! bookkeeping out.

use kurbo::{Point, Size};
use std::cell::RefCell;
use std::f64::consts::FRAC_PI_2;
use std::rc::Rc;
use stitchink_core::gesture::ElementFrame;
use stitchink_core::input::{ListenerId, PointerChannel};
use stitchink_core::{
    Composition, ComposerConfig, EffectRequest, ExportFormat, GestureMachine, GestureMode,
    HandleTarget, OverlayGeometry, PointerEvent, PointerEventSource, PointerListeners,
};

const EPS: f64 = 1e-9;
const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Event source that records every registration call.
#[derive(Default)]
struct RecordingSource {
    inner: PointerListeners,
    calls: RefCell<Vec<(&'static str, ListenerId)>>,
}

impl PointerEventSource for RecordingSource {
    fn subscribe_global_pointer_move(&self, listener: ListenerId) {
        self.calls.borrow_mut().push(("move", listener));
        self.inner.subscribe_global_pointer_move(listener);
    }

    fn subscribe_global_pointer_up(&self, listener: ListenerId) {
        self.calls.borrow_mut().push(("up", listener));
        self.inner.subscribe_global_pointer_up(listener);
    }

    fn unsubscribe(&self, listener: ListenerId) {
        self.calls.borrow_mut().push(("unsubscribe", listener));
        self.inner.unsubscribe(listener);
    }
}

fn square_container() -> Composition {
    let mut composition = Composition::new(ComposerConfig::default()).unwrap();
    composition.set_container_size(512.0, 512.0);
    composition
}

#[test]
fn drag_resize_rotate_sequence() {
    let mut composition = square_container();
    composition.upload_image(&PNG_HEADER).unwrap();
    let container = Size::new(512.0, 512.0);

    // Drag the body 51.2px right and down: +10% on both axes.
    composition.handle_pointer_event(PointerEvent::Down {
        position: Point::new(128.0, 128.0),
        target: HandleTarget::Body,
    });
    composition.handle_pointer_event(PointerEvent::Move {
        position: Point::new(179.2, 179.2),
    });
    composition.handle_pointer_event(PointerEvent::Up);

    let geometry = composition.image().unwrap().geometry();
    assert!((geometry.position.x - 10.0).abs() < EPS);
    assert!((geometry.position.y - 10.0).abs() < EPS);

    // Grab the resize handle (bottom-right corner at 307.2,307.2) and shrink
    // by 102.4px: 50% -> 30%.
    let (_, target) = composition.pointer_down(Point::new(300.0, 300.0)).unwrap();
    assert_eq!(target, HandleTarget::ResizeHandle);
    composition.pointer_move(Point::new(250.0, 250.0));
    composition.pointer_move(Point::new(197.6, 197.6));
    composition.pointer_up();

    let geometry = composition.image().unwrap().geometry();
    assert!((geometry.size.width - 30.0).abs() < EPS);
    assert!((geometry.size.height - 30.0).abs() < EPS);

    // Rotate a quarter turn around the element center.
    let center = geometry.pixel_rect(container).center();
    let rotate_grab = composition.config().handles.rotate_rect(geometry.pixel_rect(container)).center();
    let (_, target) = composition.pointer_down(rotate_grab).unwrap();
    assert_eq!(target, HandleTarget::RotateHandle);
    let start = (rotate_grab.y - center.y).atan2(rotate_grab.x - center.x);
    let radius = 100.0;
    let end = start + FRAC_PI_2;
    composition.pointer_move(Point::new(
        center.x + radius * end.cos(),
        center.y + radius * end.sin(),
    ));
    composition.pointer_up();

    let geometry = composition.image().unwrap().geometry();
    assert!((geometry.rotation - FRAC_PI_2).abs() < 1e-6);
    assert!(!composition.is_manipulating());
}

#[test]
fn resize_never_goes_below_minimum() {
    let mut composition = square_container();
    composition.set_text("HOLA");

    // Text resize handle sits in the bottom-right 16px of (256,256)-(358.4,307.2).
    composition.pointer_down(Point::new(355.0, 305.0)).unwrap();
    composition.pointer_move(Point::new(-1000.0, -1000.0));
    composition.pointer_up();

    let size = composition.text_overlay().geometry().size;
    assert!((size.width - 5.0).abs() < EPS);
    assert!((size.height - 5.0).abs() < EPS);
}

#[test]
fn listeners_only_live_during_gesture() {
    let source = Rc::new(RecordingSource::default());
    let mut machine = GestureMachine::new(source.clone());
    let mut geometry = OverlayGeometry::default();
    let frame = ElementFrame::for_geometry(&geometry, Size::new(512.0, 512.0));
    let id = machine.listener_id();

    assert!(source.calls.borrow().is_empty());

    machine.handle_event(
        PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            target: HandleTarget::Body,
        },
        &frame,
        &mut geometry,
    );
    assert!(source.inner.is_subscribed(id, PointerChannel::Move));
    assert!(source.inner.is_subscribed(id, PointerChannel::Up));

    machine.handle_event(PointerEvent::Up, &frame, &mut geometry);
    assert!(source.inner.is_empty());
    assert_eq!(
        *source.calls.borrow(),
        vec![("move", id), ("up", id), ("unsubscribe", id)]
    );
}

#[test]
fn dropping_machine_mid_gesture_unsubscribes() {
    let source = Rc::new(RecordingSource::default());
    let mut machine = GestureMachine::new(source.clone());
    let geometry = OverlayGeometry::default();
    let frame = ElementFrame::for_geometry(&geometry, Size::new(512.0, 512.0));

    machine.pointer_down(Point::new(10.0, 10.0), HandleTarget::RotateHandle, &frame);
    assert_eq!(machine.mode(), GestureMode::Rotating);
    drop(machine);

    assert!(source.inner.is_empty());
    assert_eq!(source.calls.borrow().last().map(|c| c.0), Some("unsubscribe"));
}

#[test]
fn removing_image_mid_drag_releases_listeners() {
    let mut composition = square_container();
    composition.upload_image(&PNG_HEADER).unwrap();
    composition.pointer_down(Point::new(50.0, 50.0)).unwrap();
    assert!(composition.is_manipulating());

    let removed = composition.remove_image();
    assert!(removed.is_some());
    drop(removed);
    assert!(!composition.is_manipulating());
    assert!(composition.pointer_move(Point::new(100.0, 100.0)).is_empty());
}

#[test]
fn export_reflects_latest_geometry() {
    let mut composition = square_container();
    composition.set_text("HOLA");
    composition.pointer_down(Point::new(300.0, 280.0)).unwrap();
    composition.pointer_move(Point::new(248.8, 280.0));
    composition.pointer_up();
    composition.request_export(ExportFormat::Jpeg);

    let effects = composition.take_effects();
    let Some(EffectRequest::Export { file_name, layout, .. }) = effects.first() else {
        panic!("expected an export request, got {effects:?}");
    };
    assert_eq!(file_name, "customized_pullover.jpg");
    let text = &layout.overlays[0];
    // 50% - 10% of 512px.
    assert!((text.rect.x0 - 204.8).abs() < EPS);
    assert!(composition.take_effects().is_empty());
}
