//! Pixel geometry shared by every recognition stage.
//!
//! All coordinates live in the capture's pixel space: x grows rightward,
//! y grows downward, origin at the top-left corner of the grab.

use std::fmt;

/// A pixel position on the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis-aligned rectangle anchored at `left`/`top`.
///
/// The anchor may be negative: cell search boxes near the capture edge are
/// allowed to hang off it and are clamped only when pixels are actually read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.left + (self.width / 2) as i32,
            self.top + (self.height / 2) as i32,
        )
    }

    /// Whether `point` lies inside this rectangle. All four edges count as
    /// inside, so rectangles that merely touch still register contact.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }

    fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right(), self.top),
            Point::new(self.left, self.bottom()),
            Point::new(self.right(), self.bottom()),
        ]
    }

    /// Corner containment test: two rectangles overlap when any corner of
    /// one lies inside the other. Checking both directions keeps the
    /// predicate symmetric even when one rectangle swallows the other whole.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.corners().iter().any(|c| other.contains(*c))
            || other.corners().iter().any(|c| self.contains(*c))
    }
}
