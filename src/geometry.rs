//! Structures used to map areas on the screen

use serde::{Deserialize, Serialize};
use std::fmt;
use x11rb::protocol::xproto::ConfigureWindowAux;

// =============================== Point ==============================
// ====================================================================

/// A location on the screen. When this is used with a [`Rectangle`], it
/// represents the top-left corner
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub(crate) struct Point {
    /// X-coordinate
    pub(crate) x: i32,
    /// Y-coordinate
    pub(crate) y: i32,
}

impl Point {
    /// Create a new [`Point`]
    pub(crate) const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "x: {}, y: {}", self.x, self.y)
    }
}

// ============================= Dimension ===========================
// ====================================================================

/// A `width` and a `height`. The area of a [`Rectangle`]
#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) struct Dimension {
    /// The width of the [`Rectangle`]
    pub(crate) width:  u32,
    /// The height of the [`Rectangle`]
    pub(crate) height: u32,
}

impl Default for Dimension {
    fn default() -> Self {
        Self { width: 1, height: 1 }
    }
}

impl Dimension {
    /// Create a new [`Dimension`]
    pub(crate) const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "width: {}, height: {}", self.width, self.height)
    }
}

// ============================= Rectangle ============================
// ====================================================================

/// Equivalent to `xcb_rectangle_t`
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub(crate) struct Rectangle {
    /// Represents the top-left corner of the rectangle
    pub(crate) point:     Point,
    /// The width and height of the rectangle
    pub(crate) dimension: Dimension,
}

impl Rectangle {
    /// Create a new [`Rectangle`]
    pub(crate) const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            point:     Point::new(x, y),
            dimension: Dimension::new(width, height),
        }
    }

    /// The left edge
    pub(crate) const fn x(&self) -> i32 {
        self.point.x
    }

    /// The top edge
    pub(crate) const fn y(&self) -> i32 {
        self.point.y
    }

    /// The width
    pub(crate) const fn w(&self) -> u32 {
        self.dimension.width
    }

    /// The height
    pub(crate) const fn h(&self) -> u32 {
        self.dimension.height
    }

    /// The X-coordinate one past the right edge
    pub(crate) const fn right(&self) -> i32 {
        self.point.x + self.dimension.width as i32
    }

    /// The Y-coordinate one past the bottom edge
    pub(crate) const fn bottom(&self) -> i32 {
        self.point.y + self.dimension.height as i32
    }

    /// Return the [`Point`] at the center of the [`Rectangle`]
    pub(crate) const fn center(&self) -> Point {
        Point {
            x: self.point.x + (self.dimension.width / 2) as i32,
            y: self.point.y + (self.dimension.height / 2) as i32,
        }
    }

    /// Test whether the given [`Point`] is contained within the [`Rectangle`]
    pub(crate) const fn contains(&self, point: Point) -> bool {
        point.x >= self.point.x
            && point.x < self.right()
            && point.y >= self.point.y
            && point.y < self.bottom()
    }

    /// Create a [`ConfigureWindowAux`] from a [`Rectangle`] and a border
    /// width
    pub(crate) fn to_aux(self, border_width: u32) -> ConfigureWindowAux {
        ConfigureWindowAux::new()
            .x(self.point.x)
            .y(self.point.y)
            .width(self.dimension.width)
            .height(self.dimension.height)
            .border_width(border_width)
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}), ({})", self.point, self.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rectangle};

    #[test]
    fn contains_is_half_open() {
        let r = Rectangle::new(10, 20, 100, 50);

        assert!(r.contains(Point::new(10, 20)));
        assert!(r.contains(Point::new(109, 69)));
        assert!(!r.contains(Point::new(110, 20)));
        assert!(!r.contains(Point::new(10, 70)));
        assert!(!r.contains(Point::new(9, 20)));
    }

    #[test]
    fn center_of_odd_rect() {
        let r = Rectangle::new(0, 14, 1920, 1066);
        assert_eq!(r.center(), Point::new(960, 547));
    }
}
