//! Side-effect requests for the host.
//!
//! The core never touches the rendering surface or the file system. Loading a
//! font stylesheet or exporting the composition is queued here as a request
//! and drained by whatever runs effects on the host side.

use crate::overlay::Placement;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Output file type for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Raster image at full quality.
    Jpeg,
    /// Single-page document sized to the composition.
    Pdf,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// MIME type of the output.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// File name for a base name, e.g. `customized_pullover.jpg`.
    pub fn file_name(&self, base: &str) -> String {
        format!("{}.{}", base, self.extension())
    }
}

/// Pixel layout of the whole composition, for the rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Container size the layout was resolved against.
    pub container: Size,
    /// Background image URL.
    pub background_url: String,
    /// Overlays bottom to top.
    pub overlays: Vec<Placement>,
}

/// A request for the host's effect runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectRequest {
    /// Inject a stylesheet link into the rendering surface.
    LoadStylesheet { url: String },
    /// Rasterize the layout and save it under `file_name`.
    Export {
        format: ExportFormat,
        file_name: String,
        layout: Layout,
    },
}

/// Pending effect requests.
#[derive(Debug, Clone, Default)]
pub struct EffectQueue {
    pending: Vec<EffectRequest>,
    loaded_stylesheets: HashSet<String>,
}

impl EffectQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a stylesheet load. Each URL is requested once per queue.
    pub fn load_stylesheet(&mut self, url: String) -> bool {
        if !self.loaded_stylesheets.insert(url.clone()) {
            log::debug!("stylesheet already requested: {url}");
            return false;
        }
        log::debug!("queueing stylesheet {url}");
        self.pending.push(EffectRequest::LoadStylesheet { url });
        true
    }

    /// Queue an export.
    pub fn export(&mut self, format: ExportFormat, file_name: String, layout: Layout) {
        log::debug!("queueing {format:?} export to {file_name}");
        self.pending.push(EffectRequest::Export {
            format,
            file_name,
            layout,
        });
    }

    /// Take pending requests (drains the queue).
    pub fn take(&mut self) -> Vec<EffectRequest> {
        std::mem::take(&mut self.pending)
    }

    /// Check if anything is pending.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
