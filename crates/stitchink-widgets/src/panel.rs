//! Customizer side panel: upload, text, fonts, color and export controls.

use egui::{
    Color32, CornerRadius, CursorIcon, Frame, Margin, Pos2, Sense, Stroke, StrokeKind, Ui, vec2,
};
use stitchink_core::fonts::SYSTEM_FONTS;
use stitchink_core::{Composition, ExportFormat, parse_css_color};

use crate::colors::{HslPicker, PickerInput, to_color32};
use crate::{sizing, theme};

/// Background removal service offered next to the upload button.
pub const REMOVE_BG_URL: &str = "https://www.remove.bg/es";
/// Web-font directory for browsing families.
pub const FONT_DIRECTORY_URL: &str = "https://fonts.google.com";

/// Upper bound for the order reference image preview.
const ORDER_IMAGE_MAX_WIDTH: f32 = 200.0;

/// Something the host has to do after the panel was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    /// Open a file picker and pass the chosen file to
    /// [`Composition::upload_image_file`].
    UploadImage,
}

/// Controls for a [`Composition`].
#[derive(Debug, Default)]
pub struct CustomizerPanel {
    custom_font: String,
}

impl CustomizerPanel {
    /// Create a panel with empty inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the panel. Returns the action the host must run, if any.
    pub fn show(&mut self, ui: &mut Ui, composition: &mut Composition) -> Option<PanelAction> {
        let mut action = None;

        panel_frame().show(ui, |ui| {
            ui.vertical(|ui| {
                ui.spacing_mut().item_spacing = vec2(0.0, 6.0);

                section_label(ui, "Image");
                ui.horizontal(|ui| {
                    if action_button(ui, "Upload image") {
                        action = Some(PanelAction::UploadImage);
                    }
                    ui.hyperlink_to("Visit remove.bg", REMOVE_BG_URL);
                });

                ui.add_space(4.0);
                section_label(ui, "Text");
                let mut text = composition.text().to_string();
                if ui.text_edit_singleline(&mut text).changed() {
                    composition.set_text(text);
                }

                ui.add_space(4.0);
                section_label(ui, "Font");
                self.font_controls(ui, composition);

                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    section_label(ui, "Text color");
                    color_preview(ui, composition.text_color());
                });
                if let Some(input) = HslPicker::new(composition.color_picker()).show(ui) {
                    let color = match input {
                        PickerInput::Surface(point) => composition.pick_color(point),
                        PickerInput::Hue(hue) => composition.set_hue(hue),
                    };
                    log::trace!("text color set to {color}");
                }

                ui.add_space(4.0);
                section_label(ui, "Export");
                ui.horizontal(|ui| {
                    if action_button(ui, "JPEG") {
                        composition.request_export(ExportFormat::Jpeg);
                    }
                    if action_button(ui, "PDF") {
                        composition.request_export(ExportFormat::Pdf);
                    }
                });

                order_info(ui, composition);
            });
        });

        action
    }

    fn font_controls(&mut self, ui: &mut Ui, composition: &mut Composition) {
        let mut system = None;
        egui::ComboBox::from_id_salt("system_font")
            .selected_text(composition.font().system())
            .show_ui(ui, |ui| {
                for family in SYSTEM_FONTS {
                    let selected = composition.font().system() == *family;
                    if ui.selectable_label(selected, *family).clicked() {
                        system = Some(*family);
                    }
                }
            });
        if let Some(family) = system {
            composition.set_system_font(family);
        }

        if !composition.font_catalog().is_empty() {
            let mut web = None;
            let mut clear = false;
            let current = composition.font().web().map(|f| f.family.clone());
            egui::ComboBox::from_id_salt("web_font")
                .selected_text(current.as_deref().unwrap_or("Web font"))
                .show_ui(ui, |ui| {
                    if ui.selectable_label(current.is_none(), "None").clicked() {
                        clear = true;
                    }
                    for font in composition.font_catalog().fonts() {
                        let selected = current.as_deref() == Some(font.family.as_str());
                        if ui.selectable_label(selected, font.family.as_str()).clicked() {
                            web = Some(font.family.clone());
                        }
                    }
                });
            if clear {
                composition.clear_web_font();
            } else if let Some(family) = web {
                if let Err(err) = composition.select_web_font(&family) {
                    log::warn!("failed to select web font: {err}");
                }
            }
        }
        ui.hyperlink_to("Browse web fonts", FONT_DIRECTORY_URL);

        if let Some(font) = composition.font().web().cloned() {
            let mut variant = None;
            egui::ComboBox::from_id_salt("font_variant")
                .selected_text(composition.font().variant())
                .show_ui(ui, |ui| {
                    for name in &font.variants {
                        let selected = composition.font().variant() == name;
                        if ui.selectable_label(selected, name.as_str()).clicked() {
                            variant = Some(name.clone());
                        }
                    }
                });
            if let Some(name) = variant {
                if let Err(err) = composition.set_font_variant(&name) {
                    log::warn!("failed to set font variant: {err}");
                }
            }
        }

        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.custom_font).hint_text("Custom web font"));
            if action_button(ui, "Load") && composition.load_custom_font(&self.custom_font) {
                self.custom_font.clear();
            }
        });
    }
}

/// Order notes and reference image from the config, when set.
fn order_info(ui: &mut Ui, composition: &Composition) {
    let config = composition.config();
    if !config.order_description.is_empty() {
        ui.add_space(4.0);
        section_label(ui, "Order description");
        ui.label(config.order_description.as_str());
    }
    if !config.order_image_url.is_empty() {
        ui.add_space(4.0);
        section_label(ui, "Order image");
        ui.add(egui::Image::from_uri(&config.order_image_url).max_width(ORDER_IMAGE_MAX_WIDTH));
        ui.hyperlink_to("Download order image", &config.order_image_url);
    }
}

/// Create the standard panel frame with shadow.
pub fn panel_frame() -> Frame {
    Frame::new()
        .fill(theme::PANEL_BG)
        .corner_radius(CornerRadius::same(sizing::PANEL_RADIUS))
        .stroke(Stroke::new(1.0, theme::BORDER))
        .shadow(egui::epaint::Shadow {
            spread: 0,
            blur: 8,
            offset: [0, 2],
            color: Color32::from_black_alpha(15),
        })
        .inner_margin(Margin::same(12))
}

/// Draw a section label (small, muted text).
pub fn section_label(ui: &mut Ui, text: &str) {
    ui.label(egui::RichText::new(text).size(11.0).color(theme::TEXT_MUTED));
}

/// A bordered text button. Returns true if clicked.
pub fn action_button(ui: &mut Ui, label: &str) -> bool {
    let galley = ui.painter().layout_no_wrap(
        label.to_string(),
        egui::FontId::proportional(12.0),
        theme::TEXT,
    );
    let size = vec2(galley.size().x + 16.0, 24.0);
    let (rect, response) = ui.allocate_exact_size(size, Sense::click());

    if ui.is_rect_visible(rect) {
        let bg_color = if response.hovered() {
            theme::HOVER_BG
        } else {
            Color32::WHITE
        };
        let radius = CornerRadius::same(sizing::CORNER_RADIUS);
        ui.painter().rect_filled(rect, radius, bg_color);
        ui.painter()
            .rect_stroke(rect, radius, Stroke::new(1.0, theme::BORDER), StrokeKind::Inside);
        ui.painter().galley(
            Pos2::new(rect.left() + 8.0, rect.center().y - galley.size().y / 2.0),
            galley,
            theme::TEXT,
        );
    }

    let clicked = response.clicked();
    response.on_hover_cursor(CursorIcon::PointingHand);
    clicked
}

fn color_preview(ui: &mut Ui, color: &str) {
    let (rect, _) = ui.allocate_exact_size(vec2(16.0, 16.0), Sense::hover());
    if ui.is_rect_visible(rect) {
        let fill = parse_css_color(color).map(to_color32).unwrap_or(Color32::BLACK);
        let radius = CornerRadius::same(sizing::CORNER_RADIUS);
        ui.painter().rect_filled(rect, radius, fill);
        ui.painter()
            .rect_stroke(rect, radius, Stroke::new(1.0, theme::BORDER), StrokeKind::Inside);
    }
}
