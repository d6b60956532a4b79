//! Overlay elements placed on top of the garment background.

use crate::fonts::VariantStyle;
use crate::gesture::{ElementFrame, GestureMachine, GestureMode, GestureUpdate};
use crate::geometry::OverlayGeometry;
use crate::handles::HandleLayout;
use crate::input::{HandleTarget, ListenerId, PointerEventSource};
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for an overlay.
pub type OverlayId = Uuid;

/// Default text color.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";

/// Image upload errors.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Uploaded file is empty")]
    Empty,
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Malformed data URL")]
    MalformedDataUrl,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Result type for uploads.
pub type UploadResult<T> = Result<T, UploadError>;

/// Image format of uploaded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Detect format from a MIME type.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/webp" => Some(ImageFormat::WebP),
            "image/gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            "gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Some(ImageFormat::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(ImageFormat::WebP)
        } else if data.starts_with(b"GIF8") {
            Some(ImageFormat::Gif)
        } else {
            None
        }
    }
}

/// An uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    pub format: ImageFormat,
    /// Image bytes, base64 encoded.
    pub data_base64: String,
}

impl ImageContent {
    /// Accept raw file bytes, sniffing the format.
    pub fn from_bytes(data: &[u8]) -> UploadResult<Self> {
        if data.is_empty() {
            return Err(UploadError::Empty);
        }
        let format = ImageFormat::from_magic_bytes(data).ok_or(UploadError::UnsupportedFormat)?;
        Ok(Self {
            format,
            data_base64: STANDARD.encode(data),
        })
    }

    /// Accept a picked file. The name's extension is only consulted when the
    /// bytes carry no recognizable signature.
    pub fn from_file(name: &str, data: &[u8]) -> UploadResult<Self> {
        if data.is_empty() {
            return Err(UploadError::Empty);
        }
        let format = ImageFormat::from_magic_bytes(data)
            .or_else(|| {
                let (_, ext) = name.rsplit_once('.')?;
                ImageFormat::from_extension(ext)
            })
            .ok_or(UploadError::UnsupportedFormat)?;
        Ok(Self {
            format,
            data_base64: STANDARD.encode(data),
        })
    }

    /// Accept a `data:image/...;base64,...` URL as produced by a file reader.
    pub fn from_data_url(url: &str) -> UploadResult<Self> {
        let rest = url.strip_prefix("data:").ok_or(UploadError::MalformedDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(UploadError::MalformedDataUrl)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(UploadError::MalformedDataUrl)?;
        let bytes = STANDARD.decode(payload.trim())?;
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        let format = ImageFormat::from_magic_bytes(&bytes)
            .or_else(|| ImageFormat::from_mime_type(mime))
            .ok_or(UploadError::UnsupportedFormat)?;
        Ok(Self {
            format,
            data_base64: payload.trim().to_string(),
        })
    }

    /// Decode the stored bytes.
    pub fn bytes(&self) -> UploadResult<Vec<u8>> {
        Ok(STANDARD.decode(&self.data_base64)?)
    }

    /// Data URL for the host's image element.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.data_base64)
    }
}

/// User-entered text and its color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    /// CSS color string (`#rrggbb` or `hsl(...)`).
    pub color: String,
}

impl Default for TextContent {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: DEFAULT_TEXT_COLOR.to_string(),
        }
    }
}

/// What an overlay shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OverlayContent {
    Image(ImageContent),
    Text(TextContent),
}

impl OverlayContent {
    /// Initial geometry for this kind of content.
    pub fn default_geometry(&self) -> OverlayGeometry {
        match self {
            OverlayContent::Image(_) => OverlayGeometry::new(Point::ZERO, Size::new(50.0, 50.0)),
            OverlayContent::Text(_) => {
                OverlayGeometry::new(Point::new(50.0, 50.0), Size::new(20.0, 10.0))
            }
        }
    }
}

/// Font a text overlay is drawn with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFont {
    pub family: String,
    pub style: VariantStyle,
    /// Size in viewport-width units.
    pub size_vw: f64,
}

impl TextFont {
    /// Size in pixels for a viewport of the given width.
    pub fn size_px(&self, viewport_width: f64) -> f64 {
        self.size_vw / 100.0 * viewport_width
    }
}

/// An overlay resolved to container pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: OverlayId,
    pub content: OverlayContent,
    /// Unrotated element rectangle.
    pub rect: Rect,
    /// Rotation around the rectangle center, radians.
    pub rotation: f64,
    /// Set for text overlays resolved by a composition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<TextFont>,
}

/// An overlay element with its own geometry and gesture machine.
#[derive(Debug)]
pub struct Overlay {
    id: OverlayId,
    content: OverlayContent,
    /// Bumped whenever the content is replaced.
    revision: u64,
    geometry: OverlayGeometry,
    gesture: GestureMachine,
}

impl Overlay {
    /// Create an overlay at the default geometry for its content.
    pub fn new(content: OverlayContent, source: Rc<dyn PointerEventSource>) -> Self {
        let geometry = content.default_geometry();
        Self::with_geometry(content, geometry, source)
    }

    /// Create an overlay at a specific geometry.
    pub fn with_geometry(
        content: OverlayContent,
        geometry: OverlayGeometry,
        source: Rc<dyn PointerEventSource>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            revision: 0,
            geometry,
            gesture: GestureMachine::new(source),
        }
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn content(&self) -> &OverlayContent {
        &self.content
    }

    /// Replace the content, keeping geometry.
    pub fn set_content(&mut self, content: OverlayContent) {
        self.content = content;
        self.revision += 1;
    }

    /// Number of times the content was replaced. Renderers key caches on it.
    pub fn content_revision(&self) -> u64 {
        self.revision
    }

    pub fn geometry(&self) -> OverlayGeometry {
        self.geometry
    }

    /// Overwrite the geometry. Values are not clamped until the next gesture update.
    pub fn set_geometry(&mut self, geometry: OverlayGeometry) {
        self.geometry = geometry;
    }

    /// Text content, if this is a text overlay.
    pub fn text(&self) -> Option<&TextContent> {
        match &self.content {
            OverlayContent::Text(text) => Some(text),
            OverlayContent::Image(_) => None,
        }
    }

    /// Mutable text content, if this is a text overlay.
    pub fn text_mut(&mut self) -> Option<&mut TextContent> {
        match &mut self.content {
            OverlayContent::Text(text) => Some(text),
            OverlayContent::Image(_) => None,
        }
    }

    /// Whether the overlay is rendered (and therefore hit-testable).
    /// Text overlays with empty text are hidden.
    pub fn is_visible(&self) -> bool {
        match &self.content {
            OverlayContent::Image(_) => true,
            OverlayContent::Text(text) => !text.text.is_empty(),
        }
    }

    /// Font size in viewport-width units: half the smaller size percentage.
    pub fn font_size_vw(&self) -> f64 {
        self.geometry.size.width.min(self.geometry.size.height) / 2.0
    }

    /// Font size in pixels for a viewport of the given width.
    pub fn font_size_px(&self, viewport_width: f64) -> f64 {
        self.font_size_vw() / 100.0 * viewport_width
    }

    /// Listener identity of this overlay's gesture machine.
    pub fn listener_id(&self) -> ListenerId {
        self.gesture.listener_id()
    }

    /// Current gesture mode.
    pub fn gesture_mode(&self) -> GestureMode {
        self.gesture.mode()
    }

    /// Live frame for a container of the given size.
    pub fn frame(&self, container: Size) -> ElementFrame {
        ElementFrame::for_geometry(&self.geometry, container)
    }

    /// What a pointer-down at `point` would grab, if visible.
    pub fn hit_test(&self, handles: &HandleLayout, container: Size, point: Point) -> Option<HandleTarget> {
        if !self.is_visible() {
            return None;
        }
        handles.hit_test(&self.geometry, container, point)
    }

    /// Start a gesture on this overlay.
    pub fn pointer_down(&mut self, point: Point, target: HandleTarget, container: Size) -> bool {
        let frame = self.frame(container);
        self.gesture.pointer_down(point, target, &frame)
    }

    /// Continue the active gesture and apply the update to the geometry.
    pub fn pointer_move(&mut self, point: Point, container: Size) -> Option<GestureUpdate> {
        let frame = self.frame(container);
        self.gesture.pointer_move(point, &frame, &mut self.geometry)
    }

    /// End the active gesture.
    pub fn pointer_up(&mut self) -> bool {
        self.gesture.pointer_up()
    }

    /// Resolve to container pixels.
    pub fn placement(&self, container: Size) -> Placement {
        Placement {
            id: self.id,
            content: self.content.clone(),
            rect: self.geometry.pixel_rect(container),
            rotation: self.geometry.rotation,
            font: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::PointerListeners;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn text_overlay(text: &str) -> Overlay {
        let content = OverlayContent::Text(TextContent {
            text: text.to_string(),
            ..TextContent::default()
        });
        Overlay::new(content, Rc::new(PointerListeners::new()))
    }

    #[test]
    fn test_detect_formats() {
        assert_eq!(ImageFormat::from_magic_bytes(&PNG_HEADER), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_magic_bytes(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_magic_bytes(b"hello"), None);
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_image_from_file() {
        let image = ImageContent::from_file("shirt.gif", &PNG_HEADER).unwrap();
        assert_eq!(image.format, ImageFormat::Png);

        let image = ImageContent::from_file("logo.WEBP", b"not sniffable").unwrap();
        assert_eq!(image.format, ImageFormat::WebP);

        assert!(matches!(ImageContent::from_file("notes.txt", b"hello"), Err(UploadError::UnsupportedFormat)));
        assert!(matches!(ImageContent::from_file("noext", b"hello"), Err(UploadError::UnsupportedFormat)));
        assert!(matches!(ImageContent::from_file("a.png", &[]), Err(UploadError::Empty)));
    }

    #[test]
    fn test_image_from_bytes() {
        let image = ImageContent::from_bytes(&PNG_HEADER).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.bytes().unwrap(), PNG_HEADER.to_vec());
        assert!(image.data_url().starts_with("data:image/png;base64,"));

        assert!(matches!(ImageContent::from_bytes(&[]), Err(UploadError::Empty)));
        assert!(matches!(ImageContent::from_bytes(b"text"), Err(UploadError::UnsupportedFormat)));
    }

    #[test]
    fn test_image_from_data_url() {
        let url = ImageContent::from_bytes(&PNG_HEADER).unwrap().data_url();
        let image = ImageContent::from_data_url(&url).unwrap();
        assert_eq!(image.format, ImageFormat::Png);

        assert!(matches!(
            ImageContent::from_data_url("image/png;base64,AAAA"),
            Err(UploadError::MalformedDataUrl)
        ));
        assert!(matches!(
            ImageContent::from_data_url("data:image/png;base64,***"),
            Err(UploadError::Base64(_))
        ));
    }

    #[test]
    fn test_default_geometries() {
        let image = OverlayContent::Image(ImageContent::from_bytes(&PNG_HEADER).unwrap());
        assert_eq!(image.default_geometry().position, Point::ZERO);
        assert_eq!(image.default_geometry().size, Size::new(50.0, 50.0));

        let text = OverlayContent::Text(TextContent::default());
        assert_eq!(text.default_geometry().position, Point::new(50.0, 50.0));
        assert_eq!(text.default_geometry().size, Size::new(20.0, 10.0));
    }

    #[test]
    fn test_empty_text_is_hidden() {
        let container = Size::new(512.0, 512.0);
        let handles = HandleLayout::default();

        let hidden = text_overlay("");
        assert!(!hidden.is_visible());
        assert_eq!(hidden.hit_test(&handles, container, Point::new(300.0, 280.0)), None);

        let shown = text_overlay("HOLA");
        assert_eq!(shown.hit_test(&handles, container, Point::new(300.0, 280.0)), Some(HandleTarget::Body));
    }

    #[test]
    fn test_font_size() {
        let overlay = text_overlay("hi");
        assert!((overlay.font_size_vw() - 5.0).abs() < 1e-9);
        assert!((overlay.font_size_px(1200.0) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_gesture_applies_to_geometry() {
        let mut overlay = text_overlay("hi");
        let container = Size::new(512.0, 512.0);

        assert!(overlay.pointer_down(Point::new(300.0, 280.0), HandleTarget::Body, container));
        assert_eq!(overlay.gesture_mode(), GestureMode::Dragging);
        overlay.pointer_move(Point::new(351.2, 280.0), container);
        overlay.pointer_up();

        assert!((overlay.geometry().position.x - 60.0).abs() < 1e-9);
        assert_eq!(overlay.gesture_mode(), GestureMode::Idle);
    }

    #[test]
    fn test_injected_geometry_clamped_on_next_update() {
        let mut overlay = text_overlay("hi");
        let container = Size::new(512.0, 512.0);
        let injected = OverlayGeometry::new(Point::new(150.0, -10.0), Size::new(2.0, 2.0));
        overlay.set_geometry(injected);

        // Reading back does not clamp.
        assert_eq!(overlay.geometry(), injected);

        // A zero-length drag re-applies the position bounds.
        let grab = overlay.geometry().pixel_rect(container).center();
        assert!(overlay.pointer_down(grab, HandleTarget::Body, container));
        overlay.pointer_move(grab, container);
        overlay.pointer_up();
        assert_eq!(overlay.geometry().position, Point::new(100.0, 0.0));
        assert_eq!(overlay.geometry().size, Size::new(2.0, 2.0));

        // A zero-length resize re-applies the size floor.
        let corner = Point::new(10.0, 10.0);
        assert!(overlay.pointer_down(corner, HandleTarget::ResizeHandle, container));
        overlay.pointer_move(corner, container);
        overlay.pointer_up();
        assert_eq!(overlay.geometry().size, Size::new(5.0, 5.0));
    }

    #[test]
    fn test_replacing_content_bumps_revision() {
        let mut overlay = text_overlay("hi");
        assert_eq!(overlay.content_revision(), 0);
        overlay.set_content(OverlayContent::Image(ImageContent::from_bytes(&PNG_HEADER).unwrap()));
        assert_eq!(overlay.content_revision(), 1);
    }

    #[test]
    fn test_placement() {
        let overlay = text_overlay("hi");
        let placement = overlay.placement(Size::new(512.0, 800.0));
        assert_eq!(placement.id, overlay.id());
        assert!((placement.rect.x0 - 256.0).abs() < 1e-9);
        assert!((placement.rect.y0 - 400.0).abs() < 1e-9);
        assert!((placement.rect.height() - 80.0).abs() < 1e-9);
        assert!(placement.font.is_none());
    }
}
