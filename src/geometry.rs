//! Axis-aligned rectangles in logical layout space.

use serde::Serialize;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0,
        height: 0,
    };

    pub fn new(width: i32, height: i32) -> Self {
        Size { width, height }
    }

    /// The same size turned a quarter.
    pub fn transposed(self) -> Self {
        Size::new(self.height, self.width)
    }
}

/// Footprint of a logical monitor, or the union of several.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    pub fn at(x: i32, y: i32, size: Size) -> Self {
        Rect::new(x, y, size.width, size.height)
    }

    /// Edges are widened so that coordinates near the end of the range can't overflow.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Smallest rectangle covering both `self` and `other`.
    ///
    /// `None` when that rectangle is too large to be described in `i32`.
    pub fn extend(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let width = i32::try_from(self.right().max(other.right()) - i64::from(x)).ok()?;
        let height = i32::try_from(self.bottom().max(other.bottom()) - i64::from(y)).ok()?;
        Some(Rect::new(x, y, width, height))
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        i64::from(self.x) < other.right()
            && i64::from(other.x) < self.right()
            && i64::from(self.y) < other.bottom()
            && i64::from(other.y) < self.bottom()
    }

    pub fn pivot(&self) -> Pivot {
        Pivot {
            x2: 2 * i64::from(self.x) + i64::from(self.width),
            y2: 2 * i64::from(self.y) + i64::from(self.height),
        }
    }
}

/// Center of a rectangle, kept at twice the resolution so odd sizes stay exact.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Pivot {
    pub x2: i64,
    pub y2: i64,
}
