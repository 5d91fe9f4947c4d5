use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Whether `point` lies inside the rectangle grown by `margin` on every side
    pub fn contains_with_margin(&self, point: Point, margin: f32) -> bool {
        point.x >= self.x - margin
            && point.x <= self.x + self.width + margin
            && point.y >= self.y - margin
            && point.y <= self.y + self.height + margin
    }

    pub fn contains(&self, point: Point) -> bool {
        self.contains_with_margin(point, 0.0)
    }
}

/// Region the surface is horizontally centered on, usually the primary monitor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

impl Anchor {
    pub const fn new(x: f32, y: f32, width: f32) -> Self {
        Self { x, y, width }
    }

    /// Rectangle of the given size centered on the anchor, `margin_top` below its top
    pub fn place(&self, width: f32, height: f32, margin_top: f32) -> Rect {
        Rect {
            x: self.x + ((self.width - width) / 2.0).floor(),
            y: self.y + margin_top,
            width,
            height,
        }
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1920.0)
    }
}

pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_centers_on_anchor() {
        let anchor = Anchor::new(100.0, 0.0, 1920.0);
        let rect = anchor.place(180.0, 40.0, 5.0);
        assert_eq!(rect, Rect::new(100.0 + 870.0, 5.0, 180.0, 40.0));
    }

    #[test]
    fn test_place_floors_odd_offsets() {
        let anchor = Anchor::new(0.0, 0.0, 1000.0);
        let rect = anchor.place(333.0, 40.0, 0.0);
        assert_eq!(rect.x, 333.0);
    }

    #[test]
    fn test_contains_with_margin() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(110.0, 60.0)));
        assert!(!rect.contains(Point::new(115.0, 30.0)));
        assert!(rect.contains_with_margin(Point::new(115.0, 30.0), 30.0));
        assert!(!rect.contains_with_margin(Point::new(141.0, 30.0), 30.0));
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(180.0, 440.0, 0.0), 180.0);
        assert_eq!(lerp(180.0, 440.0, 1.0), 440.0);
        assert_eq!(lerp(0.5, 1.0, 0.5), 0.75);
    }
}
