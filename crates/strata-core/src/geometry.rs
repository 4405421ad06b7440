//! Geometric primitives for timeline rendering.
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangle defined by minimum and maximum coordinates
//!
//! # Coordinate System
//!
//! Strata uses a coordinate system consistent with SVG:
//!
//! ```text
//!   (0,0) ────────► +X  (years grow to the right)
//!     │
//!     │
//!     ▼
//!    +Y                 (rows grow downward)
//! ```

/// A 2D point in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use strata_core::geometry::Point;
/// let p = Point::new(10.0, 20.0);
/// assert_eq!(p.x(), 10.0);
/// assert_eq!(p.y(), 20.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

}

/// A rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Clamps an x-coordinate into the horizontal extent of the bounds.
    pub fn clamp_x(self, x: f32) -> f32 {
        x.clamp(self.min_x, self.max_x)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_bounds_from_top_left() {
        let bounds = Bounds::new_from_top_left(Point::new(10.0, 20.0), Size::new(30.0, 40.0));

        assert_approx_eq!(f32, bounds.min_x(), 10.0);
        assert_approx_eq!(f32, bounds.min_y(), 20.0);
        assert_approx_eq!(f32, bounds.max_x(), 40.0);
        assert_approx_eq!(f32, bounds.max_y(), 60.0);
        assert_eq!(bounds.center(), Point::new(25.0, 40.0));
        assert_approx_eq!(f32, bounds.width(), 30.0);
        assert_approx_eq!(f32, bounds.height(), 40.0);
    }

    #[test]
    fn test_bounds_clamp_x() {
        let bounds = Bounds::new_from_top_left(Point::new(10.0, 0.0), Size::new(20.0, 5.0));

        assert_approx_eq!(f32, bounds.clamp_x(0.0), 10.0);
        assert_approx_eq!(f32, bounds.clamp_x(15.0), 15.0);
        assert_approx_eq!(f32, bounds.clamp_x(99.0), 30.0);
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (
            -1000.0f32..1000.0,
            -1000.0f32..1000.0,
            1.0f32..500.0,
            1.0f32..500.0,
        )
            .prop_map(|(x, y, w, h)| Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h)))
    }

    fn check_clamp_x_stays_inside(bounds: Bounds, x: f32) -> Result<(), TestCaseError> {
        let clamped = bounds.clamp_x(x);

        prop_assert!(clamped >= bounds.min_x());
        prop_assert!(clamped <= bounds.max_x());
        if x >= bounds.min_x() && x <= bounds.max_x() {
            prop_assert!(approx_eq!(f32, clamped, x));
        }
        Ok(())
    }

    fn check_center_is_inside(bounds: Bounds) -> Result<(), TestCaseError> {
        let center = bounds.center();

        prop_assert!(approx_eq!(f32, center.x() - bounds.min_x(), bounds.max_x() - center.x(), epsilon = 0.001));
        prop_assert!(center.y() > bounds.min_y() && center.y() < bounds.max_y());
        Ok(())
    }

    proptest! {
        #[test]
        fn clamp_x_stays_inside(bounds in bounds_strategy(), x in -2000.0f32..2000.0) {
            check_clamp_x_stays_inside(bounds, x)?;
        }

        #[test]
        fn center_is_inside(bounds in bounds_strategy()) {
            check_center_is_inside(bounds)?;
        }
    }
}
