//! StitchInk Core Library
//!
//! Platform-agnostic overlay geometry, gesture handling, color selection and
//! font state for the StitchInk garment designer.

pub mod color;
pub mod composition;
pub mod config;
pub mod effects;
pub mod fonts;
pub mod geometry;
pub mod gesture;
pub mod handles;
pub mod input;
pub mod overlay;

pub use color::{ColorPicker, ColorState, hsl_to_rgb, parse_css_color};
pub use composition::Composition;
pub use config::{ComposerConfig, ConfigError, ConfigResult};
pub use effects::{EffectQueue, EffectRequest, ExportFormat, Layout};
pub use fonts::{FontCatalog, FontCatalogError, FontResult, FontSelection, VariantStyle, WebFont};
pub use geometry::{Container, MIN_SIZE_PERCENT, OverlayGeometry};
pub use gesture::{ElementFrame, GestureMachine, GestureMode, GestureSink, GestureUpdate};
pub use handles::{Handle, HandleLayout};
pub use input::{HandleTarget, PointerEvent, PointerEventSource, PointerListeners, Subscription};
pub use overlay::{
    ImageContent, Overlay, OverlayContent, OverlayId, Placement, TextContent, TextFont, UploadError,
};
