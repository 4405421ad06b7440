//! Stroke definitions for bars and relation lines.
//!
//! - [`StrokeDefinition`]: color, width and dash pattern of a stroke
//! - [`StrokeStyle`]: line pattern
//! - [`apply_stroke!`](crate::apply_stroke!): applies a stroke to an SVG element
//!
//! # SVG Attribute Mapping
//!
//! | Rust Property | SVG Attribute | Example Values |
//! |--------------|---------------|----------------|
//! | `color` | `stroke`, `stroke-opacity` | `"#000000"`, `0.5` |
//! | `width` | `stroke-width` | `1.5` |
//! | `style` | `stroke-dasharray` | `"5,5"` |
//!
//! ```
//! use strata_core::draw::{StrokeDefinition, StrokeStyle};
//! use strata_core::color::Color;
//!
//! let merge = StrokeDefinition::solid(Color::new("black").unwrap(), 1.5);
//! let link = StrokeDefinition::dashed(Color::new("gray").unwrap(), 1.0);
//! assert_eq!(merge.style().to_svg_value(), None);
//! assert_eq!(link.style().to_svg_value(), Some("5,5"));
//! ```

use crate::color::Color;

/// Dash pattern of a stroke.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
}

impl StrokeStyle {
    /// Returns the SVG dasharray value for this style, or None for solid lines
    pub fn to_svg_value(self) -> Option<&'static str> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some("5,5"),
        }
    }
}

/// A stroke for rendering lines and bar outlines.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDefinition {
    color: Color,
    width: f32,
    style: StrokeStyle,
}

impl StrokeDefinition {
    /// Creates a solid stroke.
    pub fn solid(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            style: StrokeStyle::Solid,
        }
    }

    /// Creates a dashed stroke.
    pub fn dashed(color: Color, width: f32) -> Self {
        Self {
            style: StrokeStyle::Dashed,
            ..Self::solid(color, width)
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub fn set_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }
}

impl Default for StrokeDefinition {
    fn default() -> Self {
        Self::solid(Color::default(), 1.0)
    }
}

/// Apply all stroke attributes to an SVG element.
///
/// ```
/// use strata_core::draw::StrokeDefinition;
/// use strata_core::color::Color;
/// use svg::node::element as svg_element;
///
/// let stroke = StrokeDefinition::dashed(Color::new("black").unwrap(), 2.0);
/// let line = svg_element::Line::new()
///     .set("x1", 0)
///     .set("y1", 0)
///     .set("x2", 10)
///     .set("y2", 10);
///
/// let line = strata_core::apply_stroke!(line, &stroke);
/// ```
#[macro_export]
macro_rules! apply_stroke {
    ($element:expr, $stroke:expr) => {{
        let mut elem = $element
            .set("stroke", $stroke.color().to_string())
            .set("stroke-opacity", $stroke.color().alpha())
            .set("stroke-width", $stroke.width());

        if let Some(dasharray) = $stroke.style().to_svg_value() {
            elem = elem.set("stroke-dasharray", dasharray);
        }

        elem
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_default() {
        let stroke = StrokeDefinition::default();
        assert_eq!(stroke.width(), 1.0);
        assert_eq!(stroke.color(), Color::default());
        assert_eq!(stroke.style(), StrokeStyle::Solid);
    }

    #[test]
    fn test_stroke_constructors() {
        let color = Color::new("red").unwrap();

        let solid = StrokeDefinition::solid(color, 2.0);
        assert_eq!(solid.width(), 2.0);
        assert_eq!(solid.style(), StrokeStyle::Solid);

        let dashed = StrokeDefinition::dashed(color, 1.5);
        assert_eq!(dashed.color(), color);
        assert_eq!(dashed.style(), StrokeStyle::Dashed);
    }

    #[test]
    fn test_set_style() {
        let mut stroke = StrokeDefinition::solid(Color::new("green").unwrap(), 2.5);

        stroke.set_style(StrokeStyle::Dashed);

        assert_eq!(stroke.style(), StrokeStyle::Dashed);
        assert_eq!(stroke.width(), 2.5);
    }
}
