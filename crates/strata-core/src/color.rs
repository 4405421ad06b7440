//! Color handling for Strata timelines
//!
//! This module provides the [`Color`] type which wraps the `DynamicColor` type
//! from the color crate. Entry bars, relation lines and marker definitions all
//! carry a [`Color`].

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::DynamicColor;

/// Wrapper around the `DynamicColor` type from the color crate.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Color {
    /// Create a new `Color` from a CSS color string such as "#ff0000",
    /// "rgb(255, 0, 0)" or "red".
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_core::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// let blue = Color::new("blue").unwrap();
    /// assert!(Color::new("not-a-color").is_err());
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        DynamicColor::from_str(color_str)
            .map(|color| Self { color })
            .map_err(|err| format!("invalid color `{color_str}`: {err}"))
    }

    /// Returns a string usable inside an SVG `id` attribute.
    ///
    /// Marker definitions are shared per color, so their ids are derived from
    /// the color itself.
    ///
    /// ```
    /// use strata_core::color::Color;
    ///
    /// let id = Color::new("#ff8000").unwrap().to_id_safe_string();
    /// assert!(id.chars().all(|c| c.is_alphanumeric() || c == '_'));
    /// ```
    pub fn to_id_safe_string(self) -> String {
        let mut sanitized: String = self
            .to_string()
            .replace('#', "hex")
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();

        if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            sanitized = format!("c_{sanitized}");
        }

        sanitized
    }

    /// Creates a new color with the specified alpha value (0.0 transparent, 1.0 opaque).
    ///
    /// ```
    /// use strata_core::color::Color;
    ///
    /// let faded = Color::new("red").unwrap().with_alpha(0.5);
    /// assert_eq!(faded.alpha(), 0.5);
    /// ```
    pub fn with_alpha(self, alpha: f32) -> Self {
        Color {
            color: self.color.with_alpha(alpha),
        }
    }

    /// Returns the alpha component of this color.
    pub fn alpha(&self) -> f32 {
        self.color.components[3]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new("black").expect("'black' is a valid CSS color")
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.color)
    }
}

impl From<Color> for svg::node::Value {
    fn from(color: Color) -> Self {
        Self::from(color.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_color_new() {
        assert!(Color::new("#ff0000").is_ok());
        assert!(Color::new("rgb(10, 20, 30)").is_ok());

        let err = Color::new("not-a-color").unwrap_err();
        assert!(err.contains("invalid color `not-a-color`"));
    }

    #[test]
    fn test_color_default_is_black() {
        let color = Color::default();
        assert_eq!(color, Color::new("black").unwrap());
        assert_eq!(color.alpha(), 1.0);
    }

    #[test]
    fn test_color_with_alpha() {
        let color = Color::new("red").unwrap();
        let transparent = color.with_alpha(0.25);
        assert!((transparent.alpha() - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_color_to_id_safe_string() {
        for input in ["#ff0000", "rgb(1, 2, 3)", "teal"] {
            let safe_id = Color::new(input).unwrap().to_id_safe_string();
            assert!(safe_id.chars().all(|c| c.is_alphanumeric() || c == '_'));
            assert!(!safe_id.starts_with(|c: char| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_color_from_str() {
        let color: Color = "blue".parse().unwrap();
        assert_eq!(color, Color::new("blue").unwrap());
    }

    #[test]
    fn test_color_eq_hash() {
        let color1 = Color::new("red").unwrap();
        let color2 = Color::new("red").unwrap();
        let color3 = Color::new("blue").unwrap();

        assert_eq!(color1, color2);
        assert_ne!(color1, color3);

        let mut set = HashSet::new();
        set.insert(color1);
        assert!(set.contains(&color2));
        assert!(!set.contains(&color3));
    }
}
