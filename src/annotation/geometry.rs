//! Planar geometry values: points, rectangles, polygons, and polylines.
//!
//! All coordinates are absolute pixel values (or document points for
//! paged media) stored as `f64`. Geometry is kept exactly as constructed;
//! rectangles gain a canonical (min-corner, max-corner) form only when
//! they cross the wire, so callers may build them from any corner pair.

use crate::error::LabelwireError;

/// A single 2D coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point with the given x and y values.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns true if both coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Measurement unit for rectangles over paged media.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RectangleUnit {
    Points,
    Pixels,
    Percent,
}

impl RectangleUnit {
    /// The wire spelling of this unit.
    pub fn as_str(&self) -> &'static str {
        match self {
            RectangleUnit::Points => "POINTS",
            RectangleUnit::Pixels => "PIXELS",
            RectangleUnit::Percent => "PERCENT",
        }
    }

    /// Parses the wire spelling of a unit.
    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "POINTS" => Some(RectangleUnit::Points),
            "PIXELS" => Some(RectangleUnit::Pixels),
            "PERCENT" => Some(RectangleUnit::Percent),
            _ => None,
        }
    }
}

/// An axis-aligned rectangle described by two opposite corners.
///
/// The corners are stored exactly as given. `canonical()` returns the
/// ordered form with `start` at the minimum corner; the wire bbox encoding
/// (top/left/height/width) is inherently canonical, so any corner order
/// normalizes on a serialize/deserialize round trip.
#[derive(Clone, Debug, PartialEq)]
pub struct Rectangle {
    pub start: Point,
    pub end: Point,
    /// 1-indexed page for document media.
    pub page: Option<u32>,
    pub unit: Option<RectangleUnit>,
}

impl Rectangle {
    /// Creates a rectangle from two opposite corners, in any order.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            page: None,
            unit: None,
        }
    }

    /// Sets the 1-indexed page this rectangle refers to.
    ///
    /// Page 0 is rejected; pages are 1-indexed on the wire and in memory.
    pub fn with_page(mut self, page: u32) -> Result<Self, LabelwireError> {
        if page == 0 {
            return Err(LabelwireError::invalid(
                "rectangle.page",
                "pages are 1-indexed; got 0",
            ));
        }
        self.page = Some(page);
        Ok(self)
    }

    /// Sets the measurement unit.
    pub fn with_unit(mut self, unit: RectangleUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Returns the canonical form with `start` at the minimum corner.
    pub fn canonical(&self) -> Rectangle {
        Rectangle {
            start: Point::new(self.start.x.min(self.end.x), self.start.y.min(self.end.y)),
            end: Point::new(self.start.x.max(self.end.x), self.start.y.max(self.end.y)),
            page: self.page,
            unit: self.unit,
        }
    }

    /// Returns true if the corners are already ordered (start <= end on both axes).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.start.x <= self.end.x && self.start.y <= self.end.y
    }

    /// Returns true if all coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite()
    }

    /// Width of the canonical form. Always non-negative.
    #[inline]
    pub fn width(&self) -> f64 {
        (self.end.x - self.start.x).abs()
    }

    /// Height of the canonical form. Always non-negative.
    #[inline]
    pub fn height(&self) -> f64 {
        (self.end.y - self.start.y).abs()
    }

    /// Builds a rectangle from the wire bbox encoding (top/left/height/width).
    pub fn from_bbox(top: f64, left: f64, height: f64, width: f64) -> Self {
        Rectangle::new(
            Point::new(left, top),
            Point::new(left + width, top + height),
        )
    }

    /// The wire bbox encoding (top, left, height, width) of the canonical form.
    pub fn to_bbox(&self) -> (f64, f64, f64, f64) {
        let canonical = self.canonical();
        (
            canonical.start.y,
            canonical.start.x,
            canonical.height(),
            canonical.width(),
        )
    }
}

/// A closed polygon with at least three vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Creates a polygon, rejecting fewer than three vertices.
    pub fn new(points: Vec<Point>) -> Result<Self, LabelwireError> {
        if points.len() < 3 {
            return Err(LabelwireError::invalid(
                "polygon.points",
                format!("polygons need at least 3 vertices; got {}", points.len()),
            ));
        }
        Ok(Self { points })
    }

    /// The ordered vertices.
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}

/// An open polyline with at least two vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    points: Vec<Point>,
}

impl Line {
    /// Creates a polyline, rejecting fewer than two vertices.
    pub fn new(points: Vec<Point>) -> Result<Self, LabelwireError> {
        if points.len() < 2 {
            return Err(LabelwireError::invalid(
                "line.points",
                format!("lines need at least 2 vertices; got {}", points.len()),
            ));
        }
        Ok(Self { points })
    }

    /// The ordered vertices.
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}
