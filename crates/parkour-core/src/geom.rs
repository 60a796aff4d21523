use serde::{Deserialize, Serialize};

/// Width of a wall tile in world units.
pub const WALL_TILE_WIDTH: f32 = 10.0;
/// Height of a wall tile in world units.
pub const WALL_TILE_HEIGHT: f32 = 40.0;
/// Default obstacle bounding-box width.
pub const OBSTACLE_WIDTH: f32 = 30.0;
/// Default obstacle bounding-box height.
pub const OBSTACLE_HEIGHT: f32 = 50.0;

/// Axis-aligned rectangle. The y axis points down (screen convention), so
/// `top` is the smaller y and `bottom` the larger.
///
/// The player hitbox is a `Rect` and every collision test in the engine goes
/// through this type; nothing is derived from a render rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Move the rect so its bottom edge sits exactly at `y`.
    pub fn set_bottom(&mut self, y: f32) {
        self.y = y - self.h;
    }

    /// Move the rect so its right edge sits exactly at `x`.
    pub fn set_right(&mut self, x: f32) {
        self.x = x - self.w;
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Shift the rect horizontally (used to bring world geometry into
    /// screen space by subtracting the scroll offset).
    pub fn shifted_x(&self, dx: f32) -> Rect {
        Rect {
            x: self.x + dx,
            ..*self
        }
    }
}

/// A one-sided horizontal surface: collidable from above only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub origin_x: f32,
    pub surface_y: f32,
    pub length: f32,
}

impl Platform {
    pub fn new(origin_x: f32, surface_y: f32, length: f32) -> Self {
        Self {
            origin_x,
            surface_y,
            length,
        }
    }

    pub fn right(&self) -> f32 {
        self.origin_x + self.length
    }
}

/// A vertical collidable strip of fixed size, stacked to form wall faces.
///
/// `synthetic` walls are the invisible physics-only flanks generated at
/// platform edges; authored walls belong to wall-jump shafts and are drawn
/// by the render layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallTile {
    pub origin_x: f32,
    pub origin_y: f32,
    pub synthetic: bool,
}

impl WallTile {
    pub fn new(origin_x: f32, origin_y: f32, synthetic: bool) -> Self {
        Self {
            origin_x,
            origin_y,
            synthetic,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.origin_x, self.origin_y, WALL_TILE_WIDTH, WALL_TILE_HEIGHT)
    }
}

/// Whether contact with an obstacle ends the session or is a decoy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    #[serde(alias = "enemy")]
    Real,
    #[serde(alias = "illusion")]
    Fake,
}

/// A point hazard anchored at its bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub world_x: f32,
    pub world_y: f32,
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn new(world_x: f32, world_y: f32, kind: ObstacleKind) -> Self {
        Self {
            world_x,
            world_y,
            kind,
        }
    }

    /// Bounding box, anchored at the bottom.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.world_x,
            self.world_y - OBSTACLE_HEIGHT,
            OBSTACLE_WIDTH,
            OBSTACLE_HEIGHT,
        )
    }
}
