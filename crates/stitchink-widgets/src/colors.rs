//! HSL color picker and color conversions.
//!
//! The picker is a saturation/lightness surface (saturation left to right,
//! lightness top to bottom) over a hue strip. It only reports input; the
//! caller applies it to a [`ColorPicker`] or a composition.

use egui::{Color32, CornerRadius, CursorIcon, Pos2, Rect, Sense, Stroke, StrokeKind, Ui, vec2};
use kurbo::Point;
use peniko::Color;
use stitchink_core::color::{ColorPicker, ColorState, MAX_HUE};

use crate::{sizing, theme};

/// Input produced by [`HslPicker`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickerInput {
    /// Click on the surface, in pixels from its top-left corner.
    Surface(Point),
    /// New hue in degrees.
    Hue(f64),
}

/// Saturation/lightness surface plus hue strip for a [`ColorPicker`].
pub struct HslPicker<'a> {
    picker: &'a ColorPicker,
    cells: usize,
}

impl<'a> HslPicker<'a> {
    /// Create a picker view over `picker`.
    pub fn new(picker: &'a ColorPicker) -> Self {
        Self {
            picker,
            cells: sizing::SURFACE_CELLS,
        }
    }

    /// Set the surface resolution (cells per axis).
    pub fn cells(mut self, cells: usize) -> Self {
        self.cells = cells.max(1);
        self
    }

    /// Show the surface and hue strip. Returns the input of this frame, if any.
    pub fn show(self, ui: &mut Ui) -> Option<PickerInput> {
        ui.vertical(|ui| self.show_inner(ui)).inner
    }

    fn show_inner(self, ui: &mut Ui) -> Option<PickerInput> {
        let surface = self.picker.surface();
        let state = self.picker.state();
        let size = vec2(surface.width as f32, surface.height as f32);
        let mut input = None;

        ui.spacing_mut().item_spacing = vec2(0.0, 6.0);

        // Saturation/lightness surface
        let (rect, response) = ui.allocate_exact_size(size, Sense::click());
        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            let cell = vec2(rect.width() / self.cells as f32, rect.height() / self.cells as f32);
            for row in 0..self.cells {
                for col in 0..self.cells {
                    let saturation = (col as f64 + 0.5) / self.cells as f64 * 100.0;
                    let lightness = 100.0 - (row as f64 + 0.5) / self.cells as f64 * 100.0;
                    let min = rect.min + vec2(col as f32 * cell.x, row as f32 * cell.y);
                    painter.rect_filled(
                        Rect::from_min_size(min, cell),
                        CornerRadius::ZERO,
                        hsl_to_color32(ColorState::new(state.hue, saturation, lightness)),
                    );
                }
            }
            painter.rect_stroke(
                rect,
                CornerRadius::ZERO,
                Stroke::new(1.0, theme::BORDER),
                StrokeKind::Outside,
            );

            let marker = self.picker.marker();
            let center = rect.min + vec2(marker.x as f32, marker.y as f32);
            painter.circle_stroke(center, sizing::MARKER_RADIUS, Stroke::new(2.0, Color32::WHITE));
            painter.circle_stroke(
                center,
                sizing::MARKER_RADIUS + 1.0,
                Stroke::new(1.0, Color32::from_gray(30)),
            );
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let local = pos - rect.min;
                input = Some(PickerInput::Surface(Point::new(local.x as f64, local.y as f64)));
            }
        }
        response.on_hover_cursor(CursorIcon::Crosshair);

        // Hue strip
        let (strip, response) =
            ui.allocate_exact_size(vec2(size.x, sizing::HUE_STRIP_HEIGHT), Sense::click_and_drag());
        if ui.is_rect_visible(strip) {
            let painter = ui.painter();
            let segments = 64;
            let width = strip.width() / segments as f32;
            for i in 0..segments {
                let min = Pos2::new(strip.left() + i as f32 * width, strip.top());
                painter.rect_filled(
                    Rect::from_min_size(min, vec2(width.ceil(), strip.height())),
                    CornerRadius::ZERO,
                    hue_to_rgb((i as f32 + 0.5) / segments as f32),
                );
            }

            let x = strip.left() + (state.hue / MAX_HUE) as f32 * strip.width();
            painter.rect_stroke(
                Rect::from_center_size(Pos2::new(x, strip.center().y), vec2(4.0, strip.height() + 4.0)),
                CornerRadius::same(sizing::CORNER_RADIUS / 2),
                Stroke::new(2.0, Color32::from_gray(30)),
                StrokeKind::Outside,
            );
        }
        if response.clicked() || response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                let t = ((pos.x - strip.left()) / strip.width()).clamp(0.0, 1.0);
                input = Some(PickerInput::Hue(t as f64 * MAX_HUE));
            }
        }
        response.on_hover_cursor(CursorIcon::PointingHand);

        input
    }
}

/// Convert a peniko color to egui.
pub fn to_color32(color: Color) -> Color32 {
    let rgba = color.to_rgba8();
    Color32::from_rgba_unmultiplied(rgba.r, rgba.g, rgba.b, rgba.a)
}

/// Convert a picker state to egui.
pub fn hsl_to_color32(state: ColorState) -> Color32 {
    to_color32(state.to_color())
}

/// Convert hue (0.0-1.0) to a fully saturated RGB color.
pub fn hue_to_rgb(hue: f32) -> Color32 {
    let h = hue.rem_euclid(1.0) * 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();

    let (r, g, b) = match h as i32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };

    Color32::from_rgb(
        (r * 255.0_f32).round() as u8,
        (g * 255.0_f32).round() as u8,
        (b * 255.0_f32).round() as u8,
    )
}
