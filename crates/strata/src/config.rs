//! Configuration types for timeline layout and rendering.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file. Every field is optional; missing fields take the defaults
//! documented on each getter.
//!
//! # Example
//!
//! ```
//! # use strata::config::AppConfig;
//! let config: AppConfig = toml::from_str(
//!     r#"
//!     [layout]
//!     adjustment_pass = false
//!
//!     [style]
//!     bar_color = "teal"
//!     year_width = 2.5
//!     "#,
//! )
//! .unwrap();
//!
//! assert!(!config.layout().adjustment_pass());
//! assert_eq!(config.style().year_width(), 2.5);
//! assert_eq!(config.style().row_height(), 24.0);
//! ```

use serde::Deserialize;

use strata_core::color::Color;

/// Top-level application configuration combining layout and style settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    layout: LayoutConfig,

    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its two sections.
    pub fn new(layout: LayoutConfig, style: StyleConfig) -> Self {
        Self { layout, style }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

/// Switches for the row positioner.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    #[serde(default = "default_true")]
    adjustment_pass: bool,
}

impl LayoutConfig {
    pub fn new(adjustment_pass: bool) -> Self {
        Self { adjustment_pass }
    }

    /// Whether clustered entities are moved closer to their targets after
    /// placement. Defaults to `true`.
    pub fn adjustment_pass(&self) -> bool {
        self.adjustment_pass
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new(true)
    }
}

fn default_true() -> bool {
    true
}

/// Visual styling of the rendered timeline.
///
/// Colors are kept as strings and parsed on access, so an invalid color in a
/// config file is reported when rendering starts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    background_color: Option<String>,
    bar_color: Option<String>,
    line_color: Option<String>,
    text_color: Option<String>,
    year_width: f32,
    row_height: f32,
    bar_height: f32,
    padding: f32,
    stroke_width: f32,
    axis_step: u32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: None,
            bar_color: None,
            line_color: None,
            text_color: None,
            year_width: 4.0,
            row_height: 24.0,
            bar_height: 14.0,
            padding: 20.0,
            stroke_width: 1.5,
            axis_step: 50,
        }
    }
}

impl StyleConfig {
    /// Background [`Color`], white by default.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Color, String> {
        parse_color("background", self.background_color.as_deref(), "white")
    }

    /// Fill [`Color`] for bars that do not set their own.
    pub fn bar_color(&self) -> Result<Color, String> {
        parse_color("bar", self.bar_color.as_deref(), "#4a7ab5")
    }

    /// Stroke [`Color`] of relation lines and the axis.
    pub fn line_color(&self) -> Result<Color, String> {
        parse_color("line", self.line_color.as_deref(), "#444444")
    }

    /// [`Color`] of labels.
    pub fn text_color(&self) -> Result<Color, String> {
        parse_color("text", self.text_color.as_deref(), "#222222")
    }

    /// Horizontal pixels per year.
    pub fn year_width(&self) -> f32 {
        self.year_width
    }

    /// Vertical pixels per row.
    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    pub fn bar_height(&self) -> f32 {
        self.bar_height
    }

    /// Margin around the drawing.
    pub fn padding(&self) -> f32 {
        self.padding
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    /// Years between axis ticks; `0` disables the axis.
    pub fn axis_step(&self) -> u32 {
        self.axis_step
    }
}

fn parse_color(what: &str, configured: Option<&str>, default: &str) -> Result<Color, String> {
    Color::new(configured.unwrap_or(default))
        .map_err(|err| format!("Invalid {what} color in config: {err}"))
}
