//! The garment composition: container, background and overlays.
//!
//! This is the overlay host model. It owns the container measurements, keeps
//! one image overlay and one text overlay (text stacked above image), routes
//! pointer events to whichever overlay was grabbed and applies the gesture
//! output to that overlay's geometry. Side effects leave as
//! [`EffectRequest`]s.

use crate::color::ColorPicker;
use crate::config::{ComposerConfig, ConfigResult};
use crate::effects::{EffectQueue, EffectRequest, ExportFormat, Layout};
use crate::fonts::{FontCatalog, FontResult, FontSelection, family_stylesheet_url};
use crate::geometry::Container;
use crate::gesture::GestureUpdate;
use crate::input::{HandleTarget, PointerChannel, PointerEvent, PointerListeners};
use crate::overlay::{
    ImageContent, Overlay, OverlayContent, OverlayId, Placement, TextContent, TextFont, UploadResult,
};
use kurbo::{Point, Size};
use std::rc::Rc;

/// A design in progress.
#[derive(Debug)]
pub struct Composition {
    config: ComposerConfig,
    container: Container,
    listeners: Rc<PointerListeners>,
    image: Option<Overlay>,
    text: Overlay,
    color_picker: ColorPicker,
    catalog: FontCatalog,
    font: FontSelection,
    effects: EffectQueue,
}

impl Default for Composition {
    fn default() -> Self {
        Self::with_valid_config(ComposerConfig::default())
    }
}

impl Composition {
    /// Create an empty composition: no image, empty text.
    ///
    /// The config is validated first; sizes are used as denominators.
    pub fn new(config: ComposerConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: ComposerConfig) -> Self {
        let listeners = Rc::new(PointerListeners::new());
        let text = Overlay::new(OverlayContent::Text(TextContent::default()), listeners.clone());
        Self {
            container: Container::new(config.fallback_container()),
            color_picker: ColorPicker::new(config.color_surface_size()),
            config,
            listeners,
            image: None,
            text,
            catalog: FontCatalog::default(),
            font: FontSelection::new(),
            effects: EffectQueue::new(),
        }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Record the live container size from the host.
    pub fn set_container_size(&mut self, width: f64, height: f64) {
        if width <= 0.0 || height <= 0.0 {
            log::warn!("container measured as {width}x{height}, falling back where zero");
        }
        self.container.set_measured(width, height);
    }

    /// Size gestures and layout are computed against.
    pub fn container_size(&self) -> Size {
        self.container.effective_size()
    }

    /// Pointer listener registry. Hosts use it to see which overlays are armed.
    pub fn listeners(&self) -> &PointerListeners {
        &self.listeners
    }

    // --- Content ---

    /// Place an uploaded image, replacing any previous one.
    ///
    /// A replacement keeps the previous image's position, size and rotation.
    pub fn set_image(&mut self, image: ImageContent) -> OverlayId {
        let content = OverlayContent::Image(image);
        match &mut self.image {
            Some(overlay) => {
                overlay.set_content(content);
                overlay.id()
            }
            None => {
                let overlay = Overlay::new(content, self.listeners.clone());
                let id = overlay.id();
                log::debug!("image overlay {id} created");
                self.image = Some(overlay);
                id
            }
        }
    }

    /// Upload raw image bytes.
    pub fn upload_image(&mut self, data: &[u8]) -> UploadResult<OverlayId> {
        let image = ImageContent::from_bytes(data)?;
        Ok(self.set_image(image))
    }

    /// Upload a picked file; the extension is a fallback for unsniffable data.
    pub fn upload_image_file(&mut self, name: &str, data: &[u8]) -> UploadResult<OverlayId> {
        let image = ImageContent::from_file(name, data)?;
        Ok(self.set_image(image))
    }

    /// Upload a `data:` URL.
    pub fn upload_image_data_url(&mut self, url: &str) -> UploadResult<OverlayId> {
        let image = ImageContent::from_data_url(url)?;
        Ok(self.set_image(image))
    }

    /// Remove the image overlay.
    pub fn remove_image(&mut self) -> Option<Overlay> {
        self.image.take()
    }

    pub fn image(&self) -> Option<&Overlay> {
        self.image.as_ref()
    }

    pub fn text_overlay(&self) -> &Overlay {
        &self.text
    }

    /// Current overlay text.
    pub fn text(&self) -> &str {
        self.text.text().map_or("", |t| t.text.as_str())
    }

    /// Set the overlay text. Empty text hides the overlay but keeps its geometry.
    pub fn set_text(&mut self, text: impl Into<String>) {
        if let Some(content) = self.text.text_mut() {
            content.text = text.into();
        }
    }

    /// Current text color string.
    pub fn text_color(&self) -> &str {
        self.text.text().map_or("", |t| t.color.as_str())
    }

    /// Set the text color directly.
    pub fn set_text_color(&mut self, color: impl Into<String>) {
        if let Some(content) = self.text.text_mut() {
            content.color = color.into();
        }
    }

    /// Look up an overlay by id.
    pub fn overlay(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays().find(|o| o.id() == id)
    }

    /// Overlays bottom to top.
    pub fn overlays(&self) -> impl Iterator<Item = &Overlay> {
        self.image.iter().chain(std::iter::once(&self.text))
    }

    fn overlays_mut(&mut self) -> impl Iterator<Item = &mut Overlay> {
        self.image.iter_mut().chain(std::iter::once(&mut self.text))
    }

    // --- Color ---

    pub fn color_picker(&self) -> &ColorPicker {
        &self.color_picker
    }

    /// Click on the color surface; the composed color goes to the text.
    pub fn pick_color(&mut self, position: Point) -> String {
        let color = self.color_picker.click(position);
        self.set_text_color(color.clone());
        color
    }

    /// Move the hue slider; the composed color goes to the text.
    pub fn set_hue(&mut self, hue: f64) -> String {
        let color = self.color_picker.set_hue(hue);
        self.set_text_color(color.clone());
        color
    }

    // --- Fonts ---

    /// Install a fetched web-font catalog.
    pub fn set_font_catalog(&mut self, catalog: FontCatalog) {
        self.catalog = catalog;
    }

    pub fn font_catalog(&self) -> &FontCatalog {
        &self.catalog
    }

    pub fn font(&self) -> &FontSelection {
        &self.font
    }

    /// Use an installed system font.
    pub fn set_system_font(&mut self, family: &str) {
        self.font.set_system(family);
    }

    /// Use a web font from the catalog; queues its stylesheet.
    pub fn select_web_font(&mut self, family: &str) -> FontResult<()> {
        let url = self.font.select_web(&self.catalog, family)?;
        self.effects.load_stylesheet(url);
        Ok(())
    }

    /// Go back to the system font.
    pub fn clear_web_font(&mut self) {
        self.font.clear_web();
    }

    /// Choose a variant of the selected web font.
    pub fn set_font_variant(&mut self, variant: &str) -> FontResult<()> {
        self.font.set_variant(variant)
    }

    /// Load a family by name without a catalog entry. Blank names are ignored.
    pub fn load_custom_font(&mut self, family: &str) -> bool {
        if family.trim().is_empty() {
            return false;
        }
        self.effects.load_stylesheet(family_stylesheet_url(family))
    }

    // --- Pointer routing ---

    /// Which overlay (top-most first) and region a pointer-down would grab.
    pub fn hit_test(&self, point: Point) -> Option<(OverlayId, HandleTarget)> {
        let container = self.container_size();
        let handles = &self.config.handles;
        std::iter::once(&self.text)
            .chain(self.image.iter())
            .find_map(|o| o.hit_test(handles, container, point).map(|t| (o.id(), t)))
    }

    /// Pointer pressed. Starts a gesture on the grabbed overlay, if any.
    pub fn pointer_down(&mut self, point: Point) -> Option<(OverlayId, HandleTarget)> {
        let (id, target) = self.hit_test(point)?;
        let container = self.container_size();
        let overlay = self.overlays_mut().find(|o| o.id() == id)?;
        overlay.pointer_down(point, target, container).then_some((id, target))
    }

    /// Pointer moved anywhere in the document. Only armed overlays react.
    pub fn pointer_move(&mut self, point: Point) -> Vec<(OverlayId, GestureUpdate)> {
        let container = self.container_size();
        let armed = self.listeners.listeners(PointerChannel::Move);
        let mut updates = Vec::new();
        for overlay in self.overlays_mut() {
            if !armed.contains(&overlay.listener_id()) {
                continue;
            }
            if let Some(update) = overlay.pointer_move(point, container) {
                updates.push((overlay.id(), update));
            }
        }
        updates
    }

    /// Pointer released anywhere in the document. Ends every armed gesture.
    pub fn pointer_up(&mut self) -> usize {
        let armed = self.listeners.listeners(PointerChannel::Up);
        self.overlays_mut()
            .filter(|o| armed.contains(&o.listener_id()))
            .map(|o| o.pointer_up())
            .filter(|ended| *ended)
            .count()
    }

    /// Dispatch a host pointer event. The `target` of a down event is
    /// re-derived from hit testing.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) -> Vec<(OverlayId, GestureUpdate)> {
        match event {
            PointerEvent::Down { position, .. } => {
                self.pointer_down(position);
                Vec::new()
            }
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up => {
                self.pointer_up();
                Vec::new()
            }
        }
    }

    /// True while any overlay is being manipulated.
    pub fn is_manipulating(&self) -> bool {
        !self.listeners.is_empty()
    }

    // --- Output ---

    /// Effective font of the text overlay: the web font if one is selected,
    /// else the system font.
    pub fn text_font(&self) -> TextFont {
        TextFont {
            family: self.font.family().to_string(),
            style: self.font.style(),
            size_vw: self.text.font_size_vw(),
        }
    }

    /// Resolve an overlay to container pixels, with its font if it is text.
    pub fn placement(&self, overlay: &Overlay) -> Placement {
        let mut placement = overlay.placement(self.container_size());
        if let OverlayContent::Text(_) = placement.content {
            placement.font = Some(self.text_font());
        }
        placement
    }

    /// Resolve every visible overlay to container pixels.
    pub fn layout(&self) -> Layout {
        Layout {
            container: self.container_size(),
            background_url: self.config.background_url.clone(),
            overlays: self
                .overlays()
                .filter(|o| o.is_visible())
                .map(|o| self.placement(o))
                .collect(),
        }
    }

    /// Queue an export of the current layout.
    pub fn request_export(&mut self, format: ExportFormat) {
        let file_name = format.file_name(&self.config.export_name);
        let layout = self.layout();
        self.effects.export(format, file_name, layout);
    }

    /// Take pending effect requests (drains the queue).
    pub fn take_effects(&mut self) -> Vec<EffectRequest> {
        self.effects.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::fonts::VariantStyle;
    use crate::gesture::GestureMode;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn composition() -> Composition {
        let mut composition = Composition::default();
        composition.set_container_size(512.0, 512.0);
        composition
    }

    #[test]
    fn test_empty_composition() {
        let composition = composition();
        assert!(composition.image().is_none());
        assert_eq!(composition.text(), "");
        assert_eq!(composition.text_color(), "#000000");
        assert!(composition.layout().overlays.is_empty());
        assert!(composition.hit_test(Point::new(300.0, 280.0)).is_none());
    }

    #[test]
    fn test_new_validates_config() {
        let config = ComposerConfig {
            color_surface: 0.0,
            ..ComposerConfig::default()
        };
        assert!(matches!(
            Composition::new(config),
            Err(ConfigError::NotPositive { field: "color_surface", .. })
        ));
        assert!(Composition::new(ComposerConfig::default()).is_ok());
    }

    #[test]
    fn test_container_falls_back_until_measured() {
        let mut composition = Composition::default();
        assert_eq!(composition.container_size(), Size::new(512.0, 800.0));
        composition.set_container_size(480.0, 0.0);
        assert_eq!(composition.container_size(), Size::new(480.0, 800.0));
    }

    #[test]
    fn test_text_above_image() {
        let mut composition = composition();
        let image_id = composition.upload_image(&PNG_HEADER).unwrap();
        composition.set_text("HOLA");

        // Image covers (0,0)-(256,256); text starts at (256,256).
        assert_eq!(composition.hit_test(Point::new(100.0, 100.0)), Some((image_id, HandleTarget::Body)));
        let text_id = composition.text_overlay().id();
        assert_eq!(composition.hit_test(Point::new(300.0, 280.0)), Some((text_id, HandleTarget::Body)));
        // Shared corner: the text body wins over the image's resize handle.
        assert_eq!(composition.hit_test(Point::new(256.0, 256.0)).map(|h| h.0), Some(text_id));
    }

    #[test]
    fn test_replacing_image_keeps_geometry() {
        let mut composition = composition();
        let first = composition.upload_image(&PNG_HEADER).unwrap();
        composition.pointer_down(Point::new(10.0, 10.0));
        composition.pointer_move(Point::new(61.2, 10.0));
        composition.pointer_up();

        let second = composition.upload_image(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        assert_eq!(first, second);
        let geometry = composition.image().unwrap().geometry();
        assert!((geometry.position.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_routes_to_grabbed_overlay_only() {
        let mut composition = composition();
        let image_id = composition.upload_image(&PNG_HEADER).unwrap();
        composition.set_text("HOLA");

        assert_eq!(composition.pointer_down(Point::new(100.0, 100.0)), Some((image_id, HandleTarget::Body)));
        assert!(composition.is_manipulating());

        let updates = composition.pointer_move(Point::new(150.0, 130.0));
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, image_id);

        let image = composition.image().unwrap().geometry();
        assert!((image.position.x - 9.765625).abs() < 1e-9);
        assert!((image.position.y - 5.859375).abs() < 1e-9);
        assert_eq!(composition.text_overlay().geometry().position, Point::new(50.0, 50.0));

        assert_eq!(composition.pointer_up(), 1);
        assert!(!composition.is_manipulating());
        assert!(composition.pointer_move(Point::new(500.0, 500.0)).is_empty());
    }

    #[test]
    fn test_drag_outside_element_is_not_lost() {
        let mut composition = composition();
        composition.set_text("HOLA");

        composition.pointer_down(Point::new(300.0, 280.0));
        // Far outside the element and the container.
        composition.pointer_move(Point::new(-200.0, -900.0));
        composition.pointer_up();

        assert_eq!(composition.text_overlay().geometry().position, Point::ZERO);
    }

    #[test]
    fn test_resize_through_handle() {
        let mut composition = composition();
        composition.set_text("HOLA");
        // Text rect is (256,256)-(358.4,307.2); resize handle in its bottom-right 16px.
        let (_, target) = composition.pointer_down(Point::new(350.0, 300.0)).unwrap();
        assert_eq!(target, HandleTarget::ResizeHandle);
        assert_eq!(composition.text_overlay().gesture_mode(), GestureMode::Resizing);

        composition.pointer_move(Point::new(401.2, 300.0));
        composition.pointer_up();

        let size = composition.text_overlay().geometry().size;
        assert!((size.width - 30.0).abs() < 1e-9);
        assert!((size.height - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_hidden_text_cannot_be_grabbed() {
        let mut composition = composition();
        composition.set_text("HOLA");
        composition.set_text("");
        assert!(composition.pointer_down(Point::new(300.0, 280.0)).is_none());
        assert!(!composition.is_manipulating());
    }

    #[test]
    fn test_color_feeds_text() {
        let mut composition = composition();
        composition.set_hue(240.0);
        assert_eq!(composition.text_color(), "hsl(240, 100%, 50%)");
        composition.pick_color(Point::new(0.0, 0.0));
        assert_eq!(composition.text_color(), "hsl(240, 0%, 100%)");
    }

    #[test]
    fn test_web_font_queues_stylesheet() {
        let mut composition = composition();
        let catalog = FontCatalog::from_json(
            r#"{"items": [{"family": "Open Sans", "variants": ["regular", "700"], "category": "sans-serif"}]}"#,
        )
        .unwrap();
        composition.set_font_catalog(catalog);

        composition.select_web_font("Open Sans").unwrap();
        composition.select_web_font("Open Sans").unwrap();
        assert!(composition.select_web_font("Missing").is_err());
        composition.set_font_variant("700").unwrap();

        let effects = composition.take_effects();
        assert_eq!(
            effects,
            vec![EffectRequest::LoadStylesheet {
                url: "https://fonts.googleapis.com/css?family=Open+Sans:regular,700".to_string()
            }]
        );
        assert_eq!(composition.font().family(), "Open Sans");
        assert_eq!(composition.font().style().weight, 700);
    }

    #[test]
    fn test_export_carries_text_font() {
        let mut composition = composition();
        let catalog = FontCatalog::from_json(
            r#"{"items": [{"family": "Lobster", "variants": ["regular", "700"], "category": "display"}]}"#,
        )
        .unwrap();
        composition.set_font_catalog(catalog);
        composition.set_system_font("Georgia");
        composition.set_text("HOLA");
        composition.select_web_font("Lobster").unwrap();
        composition.set_font_variant("700").unwrap();
        composition.take_effects();

        composition.request_export(ExportFormat::Jpeg);
        let effects = composition.take_effects();
        let [EffectRequest::Export { layout, .. }] = effects.as_slice() else {
            panic!("expected one export, got {effects:?}");
        };
        let font = layout.overlays[0].font.as_ref().unwrap();
        assert_eq!(font.family, "Lobster");
        assert_eq!(font.style, VariantStyle { weight: 700, italic: false });
        // Default text box is 20% x 10%.
        assert!((font.size_vw - 5.0).abs() < 1e-9);
        assert!((font.size_px(1000.0) - 50.0).abs() < 1e-9);

        composition.clear_web_font();
        assert_eq!(composition.text_font().family, "Georgia");
        assert_eq!(composition.text_font().style.weight, 400);
    }

    #[test]
    fn test_image_placement_has_no_font() {
        let mut composition = composition();
        composition.upload_image(&PNG_HEADER).unwrap();
        assert!(composition.layout().overlays[0].font.is_none());
    }

    #[test]
    fn test_upload_file_uses_extension_fallback() {
        let mut composition = composition();
        assert!(composition.upload_image_file("notes.txt", b"plain").is_err());
        assert!(composition.image().is_none());
        composition.upload_image_file("logo.webp", b"unsniffable").unwrap();
        assert!(composition.image().is_some());
    }

    #[test]
    fn test_custom_font() {
        let mut composition = composition();
        assert!(!composition.load_custom_font("   "));
        assert!(composition.load_custom_font("Press Start 2P"));
        assert_eq!(
            composition.take_effects(),
            vec![EffectRequest::LoadStylesheet {
                url: "https://fonts.googleapis.com/css?family=Press+Start+2P".to_string()
            }]
        );
    }

    #[test]
    fn test_export_request() {
        let mut composition = composition();
        composition.upload_image(&PNG_HEADER).unwrap();
        composition.set_text("HOLA");
        composition.request_export(ExportFormat::Pdf);

        let effects = composition.take_effects();
        let [EffectRequest::Export { format, file_name, layout }] = effects.as_slice() else {
            panic!("expected one export, got {effects:?}");
        };
        assert_eq!(*format, ExportFormat::Pdf);
        assert_eq!(file_name, "customized_pullover.pdf");
        assert_eq!(layout.overlays.len(), 2);
        assert!(matches!(layout.overlays[0].content, OverlayContent::Image(_)));
        assert!(matches!(layout.overlays[1].content, OverlayContent::Text(_)));
        assert_eq!(layout.container, Size::new(512.0, 512.0));
    }
}
