//! High-level analysis API.
//!
//! [`Analyzer`] is the primary entry point. It wraps an [`AssayConfig`];
//! create once, analyze many images.

use image::RgbImage;
use std::path::Path;

use crate::config::AssayConfig;
use crate::error::Result;
use crate::layout::{GridLayoutResolver, LayoutResolver};
use crate::pipeline::AssayResult;

/// Primary analysis interface.
///
/// # Examples
///
/// ```no_run
/// use stripquant::Analyzer;
///
/// let image = image::open("card.jpg").unwrap().to_rgb8();
/// let result = Analyzer::new().analyze(&image)?;
/// println!("{}", result);
/// # Ok::<(), stripquant::AssayError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AssayConfig,
    resolver: GridLayoutResolver,
}

impl Analyzer {
    /// Analyzer with default parameters and reference table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with full config control.
    pub fn with_config(config: AssayConfig) -> Self {
        Self {
            config,
            resolver: GridLayoutResolver::default(),
        }
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::with_config(AssayConfig::from_json_file(path)?))
    }

    pub fn config(&self) -> &AssayConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut AssayConfig {
        &mut self.config
    }

    /// Analyze a card photograph with the grid layout resolver.
    pub fn analyze(&self, image: &RgbImage) -> Result<AssayResult> {
        crate::pipeline::run(image, &self.config, &self.resolver)
    }

    /// Analyze with a caller-supplied layout resolver.
    pub fn analyze_with_resolver(
        &self,
        image: &RgbImage,
        resolver: &dyn LayoutResolver,
    ) -> Result<AssayResult> {
        crate::pipeline::run(image, &self.config, resolver)
    }
}
