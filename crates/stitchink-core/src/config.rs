//! Composer configuration.

use crate::color::DEFAULT_SURFACE_SIZE;
use crate::handles::HandleLayout;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default background mock-up.
pub const DEFAULT_BACKGROUND_URL: &str = "https://hebbkx1anhila5yf.public.blob.vercel-storage.com/image_1024-uwDKYkgxkpsCm4laIvnvkQnxLcm6xa.png";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("Export name must not be empty")]
    EmptyExportName,
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for a [`Composition`](crate::Composition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Container width used until the host reports a measured width.
    pub container_width: f64,
    /// Container height used until the host reports a measured height
    /// (the viewport height on hosts that have one).
    pub fallback_height: f64,
    /// Manipulation handle dimensions.
    pub handles: HandleLayout,
    /// Edge length of the color picker surface.
    pub color_surface: f64,
    /// Background mock-up image.
    pub background_url: String,
    /// Base file name for exports, without extension.
    pub export_name: String,
    /// Order notes shown next to the controls. Empty hides them.
    pub order_description: String,
    /// Reference image for the order. Empty hides it.
    pub order_image_url: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            container_width: 512.0,
            fallback_height: 800.0,
            handles: HandleLayout::default(),
            color_surface: DEFAULT_SURFACE_SIZE,
            background_url: DEFAULT_BACKGROUND_URL.to_string(),
            export_name: "customized_pullover".to_string(),
            order_description: String::new(),
            order_image_url: String::new(),
        }
    }
}

impl ComposerConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all sizes are usable as denominators.
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("container_width", self.container_width),
            ("fallback_height", self.fallback_height),
            ("color_surface", self.color_surface),
            ("handles.resize_size", self.handles.resize_size),
            ("handles.rotate_size", self.handles.rotate_size),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.export_name.trim().is_empty() {
            return Err(ConfigError::EmptyExportName);
        }
        Ok(())
    }

    /// Container size used when nothing has been measured.
    pub fn fallback_container(&self) -> Size {
        Size::new(self.container_width, self.fallback_height)
    }

    /// Color picker surface size.
    pub fn color_surface_size(&self) -> Size {
        Size::new(self.color_surface, self.color_surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ComposerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fallback_container(), Size::new(512.0, 800.0));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ComposerConfig::from_json(r#"{"fallback_height": 900, "handles": {"resize_size": 20}}"#).unwrap();
        assert_eq!(config.fallback_height, 900.0);
        assert_eq!(config.container_width, 512.0);
        assert_eq!(config.handles.resize_size, 20.0);
        assert_eq!(config.handles.rotate_size, 24.0);
        assert_eq!(config.export_name, "customized_pullover");
    }

    #[test]
    fn test_order_info() {
        let config = ComposerConfig::from_json(
            r#"{"order_description": "Navy, size M", "order_image_url": "https://example.com/order.png"}"#,
        )
        .unwrap();
        assert_eq!(config.order_description, "Navy, size M");
        assert_eq!(config.order_image_url, "https://example.com/order.png");
        assert!(ComposerConfig::default().order_description.is_empty());
    }

    #[test]
    fn test_rejects_zero_width() {
        let err = ComposerConfig::from_json(r#"{"container_width": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { field: "container_width", .. }));
    }

    #[test]
    fn test_rejects_blank_export_name() {
        let err = ComposerConfig::from_json(r#"{"export_name": "  "}"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyExportName));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(ComposerConfig::from_json("{"), Err(ConfigError::Parse(_))));
    }
}
