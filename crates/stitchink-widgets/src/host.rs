//! Garment container view: background, overlays and their handles.
//!
//! Pointer presses inside the container start gestures through the
//! composition. Moves and releases are forwarded wherever the pointer is, so a
//! drag that leaves the container keeps going until the button is released.

use std::sync::Arc;

use egui::emath::Rot2;
use egui::epaint::TextShape;
use egui::text::{LayoutJob, TextFormat};
use egui::{
    Color32, CornerRadius, CursorIcon, FontFamily, FontId, Id, ImageSource, Pos2, Rect, Response,
    Sense, Shape, Stroke, Ui, Vec2, vec2,
};
use kurbo::Point;
use stitchink_core::handles::rotate_about;
use stitchink_core::{
    Composition, GestureMode, HandleTarget, ImageContent, Overlay, OverlayContent, OverlayId,
    TextContent, TextFont, parse_css_color,
};

use crate::colors::to_color32;
use crate::theme;

/// Interactive view of a [`Composition`].
pub struct OverlayHostView<'a> {
    composition: &'a mut Composition,
    background: Option<ImageSource<'a>>,
    aspect_ratio: f32,
    viewport_width: Option<f32>,
    font_family: FontFamily,
    registered_families: Vec<String>,
}

impl<'a> OverlayHostView<'a> {
    /// Create a view over `composition`.
    pub fn new(composition: &'a mut Composition) -> Self {
        Self {
            composition,
            background: None,
            aspect_ratio: 1.0,
            viewport_width: None,
            font_family: FontFamily::Proportional,
            registered_families: Vec::new(),
        }
    }

    /// Background mock-up image.
    pub fn background(mut self, source: impl Into<ImageSource<'a>>) -> Self {
        self.background = Some(source.into());
        self
    }

    /// Container height as a fraction of its width.
    pub fn aspect_ratio(mut self, ratio: f32) -> Self {
        self.aspect_ratio = ratio;
        self
    }

    /// Width that text sizes in viewport units refer to.
    /// Defaults to the window's inner width.
    pub fn viewport_width(mut self, width: f32) -> Self {
        self.viewport_width = Some(width);
        self
    }

    /// Family used when the composition's font is not registered with egui.
    pub fn font_family(mut self, family: FontFamily) -> Self {
        self.font_family = family;
        self
    }

    /// Names registered with egui as `FontFamily::Name`. When the composition's
    /// effective family is one of them, the text overlay is drawn with it.
    pub fn registered_families<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registered_families = names.into_iter().map(Into::into).collect();
        self
    }

    /// Show the container and handle pointer input.
    pub fn show(mut self, ui: &mut Ui) -> Response {
        let width = (self.composition.config().container_width as f32).min(ui.available_width());
        let size = vec2(width, width * self.aspect_ratio);
        let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());
        self.composition
            .set_container_size(rect.width() as f64, rect.height() as f64);

        self.forward_pointer(ui, rect);

        let hovered = response
            .hover_pos()
            .and_then(|pos| self.composition.hit_test(to_local(rect, pos)));

        if ui.is_rect_visible(rect) {
            let viewport_width = self.viewport_width.unwrap_or_else(|| {
                ui.ctx()
                    .input(|i| i.viewport().inner_rect.map(|r| r.width()))
                    .unwrap_or(rect.width())
            });
            self.paint(ui, rect, viewport_width, hovered.map(|(id, _)| id));
        }

        if self.composition.is_manipulating() {
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        } else if let Some((_, target)) = hovered {
            ui.ctx().set_cursor_icon(match target {
                HandleTarget::Body => CursorIcon::Move,
                HandleTarget::ResizeHandle => CursorIcon::ResizeSouthEast,
                HandleTarget::RotateHandle => CursorIcon::Grab,
            });
        }

        response
    }

    fn forward_pointer(&mut self, ui: &Ui, rect: Rect) {
        let (pressed, released, moved, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.delta() != Vec2::ZERO,
                i.pointer.latest_pos(),
            )
        });

        if pressed {
            if let Some(pos) = pos.filter(|p| rect.contains(*p)) {
                self.composition.pointer_down(to_local(rect, pos));
            }
        }
        if moved && self.composition.is_manipulating() {
            if let Some(pos) = pos {
                self.composition.pointer_move(to_local(rect, pos));
            }
        }
        if released {
            self.composition.pointer_up();
        }
    }

    fn paint(&self, ui: &Ui, rect: Rect, viewport_width: f32, hovered: Option<OverlayId>) {
        if let Some(source) = &self.background {
            egui::Image::new(source.clone()).paint_at(ui, rect);
        } else {
            ui.painter()
                .rect_filled(rect, CornerRadius::ZERO, theme::CONTAINER_BG);
        }

        for overlay in self.composition.overlays().filter(|o| o.is_visible()) {
            let placement = self.composition.placement(overlay);
            let element = to_rect(rect, placement.rect);
            let angle = placement.rotation as f32;

            match (&placement.content, &placement.font) {
                (OverlayContent::Image(image), _) => paint_image(ui, overlay, image, element, angle),
                (OverlayContent::Text(text), Some(font)) => {
                    let format = self.text_format(text, font, viewport_width);
                    paint_text(ui, text, format, element, angle);
                }
                (OverlayContent::Text(_), None) => {
                    log::warn!("text overlay {} resolved without a font", overlay.id());
                }
            }

            if hovered == Some(overlay.id()) || overlay.gesture_mode() != GestureMode::Idle {
                self.paint_handles(ui, rect, overlay);
            }
        }
    }

    fn text_format(&self, text: &TextContent, font: &TextFont, viewport_width: f32) -> TextFormat {
        let family = resolve_family(&self.registered_families, &font.family, &self.font_family);
        TextFormat {
            font_id: FontId::new(font.size_px(viewport_width as f64) as f32, family),
            color: parse_css_color(&text.color)
                .map(to_color32)
                .unwrap_or(Color32::BLACK),
            italics: font.style.italic,
            ..Default::default()
        }
    }

    fn paint_handles(&self, ui: &Ui, rect: Rect, overlay: &Overlay) {
        let container = self.composition.container_size();
        let geometry = overlay.geometry();
        let element = geometry.pixel_rect(container);
        let pivot = element.center();

        let outline = [
            Point::new(element.x0, element.y0),
            Point::new(element.x1, element.y0),
            Point::new(element.x1, element.y1),
            Point::new(element.x0, element.y1),
        ]
        .map(|p| to_pos(rect, rotate_about(p, pivot, geometry.rotation)));
        ui.painter()
            .add(Shape::closed_line(outline.to_vec(), Stroke::new(1.0, theme::ACCENT)));

        for handle in self.composition.config().handles.handles(&geometry, container) {
            let corners = handle.corners(pivot).map(|p| to_pos(rect, p)).to_vec();
            let (fill, stroke) = match handle.target {
                HandleTarget::ResizeHandle => (theme::ACCENT, Stroke::NONE),
                _ => (Color32::WHITE, Stroke::new(1.5, theme::ACCENT)),
            };
            ui.painter().add(Shape::convex_polygon(corners, fill, stroke));
        }
    }
}

fn paint_image(ui: &Ui, overlay: &Overlay, image: &ImageContent, element: Rect, angle: f32) {
    let Some((uri, bytes)) = cached_image_bytes(ui, overlay, image) else {
        return;
    };
    let picture = egui::Image::from_bytes(uri, bytes);
    // Shown whole inside the element box, centered, like `object-fit: contain`.
    let fitted = picture
        .load_for_size(ui.ctx(), element.size())
        .ok()
        .and_then(|poll| poll.size())
        .map_or(element, |natural| contain(element, natural));
    picture
        .rotate(angle, Vec2::splat(0.5))
        .paint_at(ui, fitted);
}

/// Decoded upload bytes, kept in egui's temp storage per overlay until the
/// overlay's content changes.
fn cached_image_bytes(ui: &Ui, overlay: &Overlay, image: &ImageContent) -> Option<(String, Arc<[u8]>)> {
    let key = Id::new(("stitchink_image", overlay.id()));
    let revision = overlay.content_revision();
    let uri = image_uri(overlay.id(), revision);

    if let Some((cached, bytes)) = ui.data_mut(|d| d.get_temp::<(u64, Arc<[u8]>)>(key)) {
        if cached == revision {
            return Some((uri, bytes));
        }
        ui.ctx().forget_image(&image_uri(overlay.id(), cached));
    }

    let bytes: Arc<[u8]> = match image.bytes() {
        Ok(bytes) => bytes.into(),
        Err(err) => {
            log::warn!("overlay {} has undecodable image data: {err}", overlay.id());
            return None;
        }
    };
    ui.data_mut(|d| d.insert_temp(key, (revision, bytes.clone())));
    Some((uri, bytes))
}

fn image_uri(id: OverlayId, revision: u64) -> String {
    format!("bytes://stitchink/{id}/{revision}")
}

/// Largest rect with the aspect ratio of `natural` that fits in `bounds`,
/// centered in it.
fn contain(bounds: Rect, natural: Vec2) -> Rect {
    if natural.x <= 0.0 || natural.y <= 0.0 {
        return bounds;
    }
    let scale = (bounds.width() / natural.x).min(bounds.height() / natural.y);
    Rect::from_center_size(bounds.center(), natural * scale)
}

fn resolve_family(registered: &[String], family: &str, fallback: &FontFamily) -> FontFamily {
    if registered.iter().any(|name| name == family) {
        FontFamily::Name(family.into())
    } else {
        fallback.clone()
    }
}

fn paint_text(ui: &Ui, text: &TextContent, format: TextFormat, element: Rect, angle: f32) {
    let color = format.color;
    let mut job = LayoutJob::default();
    job.append(&text.text, 0.0, format);
    let galley = ui.painter().layout_job(job);
    // Rotate around the element center, not the galley origin.
    let pos = element.center() - Rot2::from_angle(angle) * (galley.size() / 2.0);
    ui.painter()
        .add(TextShape::new(pos, galley, color).with_angle(angle));
}

fn to_local(rect: Rect, pos: Pos2) -> Point {
    Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64)
}

fn to_pos(rect: Rect, point: Point) -> Pos2 {
    rect.min + vec2(point.x as f32, point.y as f32)
}

fn to_rect(rect: Rect, r: kurbo::Rect) -> Rect {
    Rect::from_min_max(
        to_pos(rect, Point::new(r.x0, r.y0)),
        to_pos(rect, Point::new(r.x1, r.y1)),
    )
}
