//! Geometry
//!
//! Rectangles and intersection ratios against the viewport.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
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

    pub fn right(&self) -> f32 { self.x + self.width }
    pub fn bottom(&self) -> f32 { self.y + self.height }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Calculate intersection with another rect
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right > x && bottom > y {
            Some(Rect {
                x,
                y,
                width: right - x,
                height: bottom - y,
            })
        } else {
            None
        }
    }

    /// Check if `other` lies entirely inside this rect
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Grow by `margin` on every side
    pub fn expand(&self, margin: f32) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }

    /// Same rect moved by (`dx`, `dy`)
    pub fn translate(&self, dx: f32, dy: f32) -> Rect {
        Rect { x: self.x + dx, y: self.y + dy, ..*self }
    }

    /// Fraction of this rect's area visible inside `root`.
    ///
    /// Exactly `1.0` when fully contained and `0.0` when disjoint, so the
    /// full-enter / full-exit checks can compare without tolerance.
    pub fn intersection_ratio(&self, root: &Rect) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        if root.contains(self) {
            return 1.0;
        }
        match self.intersect(root) {
            Some(visible) => (visible.area() / self.area()).clamp(0.0, 1.0),
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

    #[test]
    fn test_fully_inside() {
        let rect = Rect::new(100.0, 100.0, 200.0, 200.0);
        assert_eq!(rect.intersection_ratio(&VIEWPORT), 1.0);
    }

    #[test]
    fn test_edge_touching_counts_as_inside() {
        let rect = Rect::new(0.0, 400.0, 800.0, 200.0);
        assert_eq!(rect.intersection_ratio(&VIEWPORT), 1.0);
    }

    #[test]
    fn test_partially_inside() {
        let rect = Rect::new(0.0, 500.0, 100.0, 200.0);
        assert_eq!(rect.intersection_ratio(&VIEWPORT), 0.5);
    }

    #[test]
    fn test_outside() {
        let rect = Rect::new(0.0, 600.0, 100.0, 100.0);
        assert_eq!(rect.intersection_ratio(&VIEWPORT), 0.0);
    }

    #[test]
    fn test_zero_area_is_never_visible() {
        let rect = Rect::new(10.0, 10.0, 0.0, 50.0);
        assert_eq!(rect.intersection_ratio(&VIEWPORT), 0.0);
    }

    #[test]
    fn test_expand() {
        let grown = VIEWPORT.expand(10.0);
        assert_eq!(grown, Rect::new(-10.0, -10.0, 820.0, 620.0));
    }
}
