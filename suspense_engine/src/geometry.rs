use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in scene coordinates, half-open on the far edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn contains(&self, point: (i32, i32)) -> bool {
        let (px, py) = point;
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// The hit-test region of one interact: a single rectangle, a union of
/// rectangles, or not yet bound to anything (which never matches).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HitRegion {
    Single(Rect),
    Union(Vec<Rect>),
    Unbound,
}

impl HitRegion {
    pub fn contains(&self, point: (i32, i32)) -> bool {
        match self {
            HitRegion::Single(rect) => rect.contains(point),
            HitRegion::Union(rects) => rects.iter().any(|rect| rect.contains(point)),
            HitRegion::Unbound => false,
        }
    }

    pub fn translated(&self, dx: i32, dy: i32) -> HitRegion {
        match self {
            HitRegion::Single(rect) => HitRegion::Single(rect.translated(dx, dy)),
            HitRegion::Union(rects) => {
                HitRegion::Union(rects.iter().map(|rect| rect.translated(dx, dy)).collect())
            }
            HitRegion::Unbound => HitRegion::Unbound,
        }
    }
}
