//! Font catalog and font selection for the text overlay.
//!
//! The web-font catalog is fetched by the host (it needs an API key and a
//! network stack); this module parses the response, builds stylesheet URLs
//! and tracks which family/variant the text overlay uses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base URL for web-font stylesheets.
pub const STYLESHEET_BASE_URL: &str = "https://fonts.googleapis.com/css";
/// Variant selected whenever a new web font is chosen.
pub const DEFAULT_VARIANT: &str = "regular";
/// System font used until the user picks something else.
pub const DEFAULT_SYSTEM_FONT: &str = "Arial";

/// Fonts that are assumed to be installed on the rendering surface.
pub const SYSTEM_FONTS: &[&str] = &[
    "Arial",
    "Helvetica",
    "Times New Roman",
    "Courier",
    "Verdana",
    "Georgia",
    "Palatino",
    "Garamond",
    "Bookman",
    "Comic Sans MS",
    "Trebuchet MS",
    "Arial Black",
    "Impact",
];

/// Font catalog errors.
#[derive(Debug, Error)]
pub enum FontCatalogError {
    #[error("Invalid catalog response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Font API error {code}: {message}")]
    Api { code: u16, message: String },
    #[error("Unknown font family: {0}")]
    UnknownFamily(String),
    #[error("Font {family} has no variant {variant}")]
    UnknownVariant { family: String, variant: String },
    #[error("No web font selected")]
    NoWebFont,
}

/// Result type for font operations.
pub type FontResult<T> = Result<T, FontCatalogError>;

/// One web-font family from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebFont {
    pub family: String,
    #[serde(default)]
    pub variants: Vec<String>,
    #[serde(default)]
    pub category: String,
}

impl WebFont {
    /// Stylesheet URL loading every variant of this family.
    pub fn stylesheet_url(&self) -> String {
        if self.variants.is_empty() {
            family_stylesheet_url(&self.family)
        } else {
            format!(
                "{}:{}",
                family_stylesheet_url(&self.family),
                self.variants.join(",")
            )
        }
    }

    /// Check whether this family offers `variant`.
    pub fn has_variant(&self, variant: &str) -> bool {
        self.variants.iter().any(|v| v == variant)
    }
}

/// Stylesheet URL for a bare family name.
pub fn family_stylesheet_url(family: &str) -> String {
    format!("{}?family={}", STYLESHEET_BASE_URL, family.trim().replace(' ', "+"))
}

/// Weight and style encoded in a variant name such as `700italic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantStyle {
    pub weight: u16,
    pub italic: bool,
}

impl VariantStyle {
    /// Decode a variant name. Unknown names fall back to regular weight.
    pub fn parse(variant: &str) -> Self {
        let italic = variant.ends_with("italic");
        let digits: String = variant.chars().take_while(char::is_ascii_digit).collect();
        let weight = digits.parse().unwrap_or(400);
        Self { weight, italic }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    items: Vec<WebFont>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: u16,
    #[serde(default)]
    message: String,
}

/// Parsed web-font catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontCatalog {
    fonts: Vec<WebFont>,
}

impl FontCatalog {
    /// Build a catalog from already-parsed fonts.
    pub fn new(fonts: Vec<WebFont>) -> Self {
        Self { fonts }
    }

    /// Parse a webfonts API response body (`{"items": [...]}`).
    pub fn from_json(json: &str) -> FontResult<Self> {
        let response: CatalogResponse = serde_json::from_str(json)?;
        if let Some(error) = response.error {
            return Err(FontCatalogError::Api {
                code: error.code,
                message: error.message,
            });
        }
        log::debug!("font catalog loaded with {} families", response.items.len());
        Ok(Self::new(response.items))
    }

    /// All families in catalog order.
    pub fn fonts(&self) -> &[WebFont] {
        &self.fonts
    }

    /// Look up a family by exact name.
    pub fn find(&self, family: &str) -> Option<&WebFont> {
        self.fonts.iter().find(|f| f.family == family)
    }

    /// Families in a category (e.g. `serif`, `handwriting`).
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a WebFont> + 'a {
        self.fonts.iter().filter(move |f| f.category == category)
    }

    /// Number of families.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// True when the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

/// Font used by the text overlay.
///
/// A selected web font takes precedence over the system font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSelection {
    system: String,
    web: Option<WebFont>,
    variant: String,
}

impl Default for FontSelection {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_FONT.to_string(),
            web: None,
            variant: DEFAULT_VARIANT.to_string(),
        }
    }
}

impl FontSelection {
    /// Create the default selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick a system font. Names outside [`SYSTEM_FONTS`] are accepted but logged.
    pub fn set_system(&mut self, family: &str) {
        if !SYSTEM_FONTS.contains(&family) {
            log::warn!("{family} is not a known system font");
        }
        self.system = family.to_string();
    }

    /// Pick a web font from the catalog and reset the variant to `regular`.
    ///
    /// Returns the stylesheet URL the host must load.
    pub fn select_web(&mut self, catalog: &FontCatalog, family: &str) -> FontResult<String> {
        let font = catalog
            .find(family)
            .ok_or_else(|| FontCatalogError::UnknownFamily(family.to_string()))?;
        let url = font.stylesheet_url();
        self.web = Some(font.clone());
        self.variant = DEFAULT_VARIANT.to_string();
        Ok(url)
    }

    /// Drop the web font and fall back to the system font.
    pub fn clear_web(&mut self) {
        self.web = None;
        self.variant = DEFAULT_VARIANT.to_string();
    }

    /// Choose a variant of the selected web font.
    pub fn set_variant(&mut self, variant: &str) -> FontResult<()> {
        let font = self.web.as_ref().ok_or(FontCatalogError::NoWebFont)?;
        if !font.has_variant(variant) {
            return Err(FontCatalogError::UnknownVariant {
                family: font.family.clone(),
                variant: variant.to_string(),
            });
        }
        self.variant = variant.to_string();
        Ok(())
    }

    /// Family name to render with.
    pub fn family(&self) -> &str {
        self.web.as_ref().map_or(&self.system, |f| &f.family)
    }

    /// The selected system font.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// The selected web font, if any.
    pub fn web(&self) -> Option<&WebFont> {
        self.web.as_ref()
    }

    /// Selected variant name.
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Weight and style of the selected variant.
    pub fn style(&self) -> VariantStyle {
        VariantStyle::parse(&self.variant)
    }
}
