//! egui widgets for the StitchInk garment designer.
//!
//! - **Colors**: HSL picker surface and hue strip, color conversions
//! - **Host**: the garment container with overlays and manipulation handles
//! - **Panel**: frames, labels and buttons for the customizer side panel

pub mod colors;
pub mod host;
pub mod panel;

pub use colors::{HslPicker, PickerInput, hsl_to_color32, hue_to_rgb, to_color32};
pub use host::OverlayHostView;
pub use panel::{
    CustomizerPanel, FONT_DIRECTORY_URL, PanelAction, REMOVE_BG_URL, action_button, panel_frame,
    section_label,
};

/// Standard sizing constants used across widgets.
pub mod sizing {
    /// Height of the hue strip under the color surface
    pub const HUE_STRIP_HEIGHT: f32 = 16.0;
    /// Cells per axis when painting the saturation/lightness surface
    pub const SURFACE_CELLS: usize = 32;
    /// Radius of the picker marker
    pub const MARKER_RADIUS: f32 = 6.0;
    /// Standard corner radius
    pub const CORNER_RADIUS: u8 = 4;
    /// Panel corner radius
    pub const PANEL_RADIUS: u8 = 8;
}

/// Standard colors used across widgets.
pub mod theme {
    use egui::Color32;

    /// Text color (dark gray)
    pub const TEXT: Color32 = Color32::from_rgb(60, 60, 60);
    /// Muted text color
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(120, 120, 120);
    /// Border color
    pub const BORDER: Color32 = Color32::from_rgb(220, 220, 220);
    /// Handle and active color (blue)
    pub const ACCENT: Color32 = Color32::from_rgb(59, 130, 246);
    /// Hover background
    pub const HOVER_BG: Color32 = Color32::from_rgb(245, 245, 245);
    /// Container background shown before the mock-up loads
    pub const CONTAINER_BG: Color32 = Color32::from_rgb(243, 244, 246);
    /// Panel background
    pub const PANEL_BG: Color32 = Color32::from_rgba_premultiplied(250, 250, 252, 250);
}
