//! HSL color selection.
//!
//! A square saturation/lightness surface (discrete clicks, no drag tracking)
//! and a hue slider compose into one `hsl(...)` color string. Every change
//! emits the composed string synchronously.

use kurbo::{Point, Size};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Default edge length of the saturation/lightness surface in pixels.
pub const DEFAULT_SURFACE_SIZE: f64 = 256.0;
/// Largest hue value accepted by the slider.
pub const MAX_HUE: f64 = 360.0;

/// Hue (degrees), saturation and lightness (percent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorState {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl Default for ColorState {
    fn default() -> Self {
        Self {
            hue: 0.0,
            saturation: 100.0,
            lightness: 50.0,
        }
    }
}

impl ColorState {
    /// Create a color state.
    pub fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    /// CSS color string, e.g. `hsl(0, 100%, 50%)`.
    pub fn css(&self) -> String {
        format!("hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }

    /// Convert to an opaque RGB color.
    pub fn to_color(&self) -> Color {
        let (r, g, b) = hsl_to_rgb(self.hue, self.saturation / 100.0, self.lightness / 100.0);
        Color::from_rgba8(to_channel(r), to_channel(g), to_channel(b), 255)
    }
}

/// HSL → RGB with all outputs in [0, 1]. Hue is taken modulo 360.
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (f64, f64, f64) {
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);
    let h = hue.rem_euclid(MAX_HUE) / 60.0;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (r + m, g + m, b + m)
}

fn to_channel(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Parse `#rrggbb` or `hsl(h, s%, l%)` into a color.
pub fn parse_css_color(color: &str) -> Option<Color> {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        return Some(Color::from_rgba8(r, g, b, 255));
    }

    let inner = color.strip_prefix("hsl(")?.strip_suffix(')')?;
    let mut parts = inner.split(',').map(str::trim);
    let hue: f64 = parts.next()?.parse().ok()?;
    let saturation: f64 = parts.next()?.strip_suffix('%')?.trim().parse().ok()?;
    let lightness: f64 = parts.next()?.strip_suffix('%')?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(ColorState::new(hue, saturation, lightness).to_color())
}

/// Callback invoked with every composed color string.
pub type ColorListener = Box<dyn FnMut(&str)>;

/// Saturation/lightness surface plus hue slider.
pub struct ColorPicker {
    state: ColorState,
    surface: Size,
    listener: Option<ColorListener>,
}

impl Default for ColorPicker {
    fn default() -> Self {
        Self::new(Size::new(DEFAULT_SURFACE_SIZE, DEFAULT_SURFACE_SIZE))
    }
}

impl ColorPicker {
    /// Create a picker whose surface is `surface` pixels.
    pub fn new(surface: Size) -> Self {
        Self {
            state: ColorState::default(),
            surface,
            listener: None,
        }
    }

    /// Register the change listener.
    pub fn on_change(mut self, listener: impl FnMut(&str) + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Current state.
    pub fn state(&self) -> ColorState {
        self.state
    }

    /// Surface size in pixels.
    pub fn surface(&self) -> Size {
        self.surface
    }

    /// Current composed color string.
    pub fn color(&self) -> String {
        self.state.css()
    }

    /// Click on the surface at `position` (pixels from its top-left corner).
    ///
    /// Positions outside the surface are clamped onto it.
    pub fn click(&mut self, position: Point) -> String {
        let x = position.x.clamp(0.0, self.surface.width);
        let y = position.y.clamp(0.0, self.surface.height);
        self.state.saturation = x / self.surface.width * 100.0;
        self.state.lightness = 100.0 - y / self.surface.height * 100.0;
        self.emit()
    }

    /// Set the hue from the slider, clamped to [0, 360].
    pub fn set_hue(&mut self, hue: f64) -> String {
        self.state.hue = hue.clamp(0.0, MAX_HUE);
        self.emit()
    }

    /// Set saturation directly, clamped to [0, 100].
    pub fn set_saturation(&mut self, saturation: f64) -> String {
        self.state.saturation = saturation.clamp(0.0, 100.0);
        self.emit()
    }

    /// Set lightness directly, clamped to [0, 100].
    pub fn set_lightness(&mut self, lightness: f64) -> String {
        self.state.lightness = lightness.clamp(0.0, 100.0);
        self.emit()
    }

    /// Marker position on the surface for the current state, in pixels.
    pub fn marker(&self) -> Point {
        Point::new(
            self.state.saturation / 100.0 * self.surface.width,
            (100.0 - self.state.lightness) / 100.0 * self.surface.height,
        )
    }

    fn emit(&mut self) -> String {
        let color = self.state.css();
        log::trace!("color changed: {color}");
        if let Some(listener) = self.listener.as_mut() {
            listener(&color);
        }
        color
    }
}

impl std::fmt::Debug for ColorPicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorPicker")
            .field("state", &self.state)
            .field("surface", &self.surface)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}
