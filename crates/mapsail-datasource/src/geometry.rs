use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Coord2d {
    pub x: f64,
    pub y: f64,
}

impl Coord2d {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Box2d {
    minx: f64,
    miny: f64,
    maxx: f64,
    maxy: f64,
}

impl Box2d {
    /// Creates a box from two corners given in any order.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            minx: x0.min(x1),
            miny: y0.min(y1),
            maxx: x0.max(x1),
            maxy: y0.max(y1),
        }
    }

    pub fn minx(&self) -> f64 {
        self.minx
    }

    pub fn miny(&self) -> f64 {
        self.miny
    }

    pub fn maxx(&self) -> f64 {
        self.maxx
    }

    pub fn maxy(&self) -> f64 {
        self.maxy
    }

    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }

    /// Returns whether the two boxes share at least one point.
    /// Boxes that only touch along an edge or a corner intersect.
    pub fn intersects(&self, other: &Box2d) -> bool {
        !(other.minx > self.maxx
            || other.maxx < self.minx
            || other.miny > self.maxy
            || other.maxy < self.miny)
    }

    pub fn contains(&self, point: Coord2d) -> bool {
        point.x >= self.minx && point.x <= self.maxx && point.y >= self.miny && point.y <= self.maxy
    }
}

impl fmt::Display for Box2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "box2d({}, {}, {}, {})",
            self.minx, self.miny, self.maxx, self.maxy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_normalizes_corners() {
        let b = Box2d::new(10.0, 5.0, -10.0, -5.0);
        assert_eq!(b.minx(), -10.0);
        assert_eq!(b.miny(), -5.0);
        assert_eq!(b.maxx(), 10.0);
        assert_eq!(b.maxy(), 5.0);
        assert_eq!(b.width(), 20.0);
        assert_eq!(b.height(), 10.0);
    }

    #[test]
    fn test_box_intersects() {
        let world = Box2d::new(-180.0, -90.0, 180.0, 90.0);
        assert!(world.intersects(&Box2d::new(0.0, 0.0, 1.0, 1.0)));
        assert!(world.intersects(&Box2d::new(-200.0, -100.0, 200.0, 100.0)));
        assert!(world.intersects(&Box2d::new(180.0, 90.0, 190.0, 95.0)));
        assert!(!world.intersects(&Box2d::new(181.0, 0.0, 190.0, 1.0)));
        assert!(!world.intersects(&Box2d::new(0.0, -100.0, 1.0, -91.0)));
    }

    #[test]
    fn test_box_contains() {
        let b = Box2d::new(0.0, 0.0, 2.0, 2.0);
        assert!(b.contains(Coord2d::new(1.0, 1.0)));
        assert!(b.contains(Coord2d::new(2.0, 0.0)));
        assert!(!b.contains(Coord2d::new(2.5, 1.0)));
    }
}
