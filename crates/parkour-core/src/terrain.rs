use serde::{Deserialize, Serialize};

use crate::geom::{Obstacle, ObstacleKind, Platform, WallTile, WALL_TILE_HEIGHT, WALL_TILE_WIDTH};

/// World y of the default running surface.
pub const GROUND_Y: f32 = 360.0;
/// Height above a section's base at which the `"midair"` sentinel places an
/// obstacle.
pub const MIDAIR_CLEARANCE: f32 = 120.0;
/// Wall tiles synthesized below each platform edge (cling depth).
const FLANK_TILES: u32 = 3;

fn default_entry_length() -> f32 {
    120.0
}

fn default_exit_length() -> f32 {
    120.0
}

fn default_kind() -> ObstacleKind {
    ObstacleKind::Real
}

/// Terrain-segment discriminant. Closed set: every variant has exactly one
/// generator and the match in `generate_segment` is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Straight,
    StairsUp,
    StairsDown,
    Gap,
    WallJump,
}

/// Vertical addressing for an obstacle: the `"ground"` keyword, a numeric
/// offset, or the `"midair"` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObstacleY {
    Keyword(YKeyword),
    Offset(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YKeyword {
    Ground,
    Midair,
}

impl Default for ObstacleY {
    fn default() -> Self {
        ObstacleY::Keyword(YKeyword::Ground)
    }
}

impl ObstacleY {
    /// Resolve against a surface y. `Offset` is added in screen coordinates
    /// (negative = above the surface), matching the level JSON convention.
    fn resolve(self, surface_y: f32) -> f32 {
        match self {
            ObstacleY::Keyword(YKeyword::Ground) => surface_y,
            ObstacleY::Keyword(YKeyword::Midair) => surface_y - MIDAIR_CLEARANCE,
            ObstacleY::Offset(dy) => surface_y + dy,
        }
    }
}

/// Obstacle placed relative to a section (or platform) start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleSpec {
    pub x: f32,
    #[serde(default)]
    pub y: ObstacleY,
    #[serde(default = "default_kind")]
    pub kind: ObstacleKind,
}

/// Obstacle addressed by stair step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StairObstacleSpec {
    pub step_index: usize,
    pub x: f32,
    #[serde(default)]
    pub y: ObstacleY,
    #[serde(default = "default_kind")]
    pub kind: ObstacleKind,
}

/// One floating platform inside a gap section. `y_offset` is height above
/// the section base (positive = higher).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GapPlatformSpec {
    pub x: f32,
    #[serde(default)]
    pub y_offset: f32,
    pub width: f32,
}

/// Gap obstacles are addressed either relative to one of the section's
/// platforms or absolutely within the section, where a numeric `y` is
/// height above the base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GapObstacleSpec {
    OnPlatform {
        platform_index: usize,
        x: f32,
        #[serde(default)]
        y: ObstacleY,
        #[serde(default = "default_kind")]
        kind: ObstacleKind,
    },
    Absolute {
        x: f32,
        #[serde(default)]
        y: ObstacleY,
        #[serde(default = "default_kind")]
        kind: ObstacleKind,
    },
}

/// Stair geometry shared by the up and down variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StairsSpec {
    pub step_count: u32,
    pub step_width: f32,
    pub step_height: f32,
    #[serde(default)]
    pub obstacles: Vec<StairObstacleSpec>,
}

/// Declarative description of one terrain section, as it appears in level
/// descriptor JSON. Absent fields take documented defaults (ground level,
/// zero offset, `real` kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionSpec {
    Straight {
        length: f32,
        #[serde(default)]
        platform_y: Option<f32>,
        #[serde(default)]
        obstacles: Vec<ObstacleSpec>,
    },
    StairsUp(StairsSpec),
    StairsDown(StairsSpec),
    Gap {
        #[serde(default)]
        base_y: Option<f32>,
        platforms: Vec<GapPlatformSpec>,
        #[serde(default)]
        obstacles: Vec<GapObstacleSpec>,
    },
    WallJump {
        shaft_width: f32,
        height: f32,
        #[serde(default = "default_entry_length")]
        entry_length: f32,
        #[serde(default = "default_exit_length")]
        exit_length: f32,
    },
}

impl SectionSpec {
    pub fn kind(&self) -> SegmentKind {
        match self {
            SectionSpec::Straight { .. } => SegmentKind::Straight,
            SectionSpec::StairsUp(_) => SegmentKind::StairsUp,
            SectionSpec::StairsDown(_) => SegmentKind::StairsDown,
            SectionSpec::Gap { .. } => SegmentKind::Gap,
            SectionSpec::WallJump { .. } => SegmentKind::WallJump,
        }
    }

    /// Fallback section substituted for unknown or malformed entries.
    pub fn fallback_straight() -> Self {
        SectionSpec::Straight {
            length: 400.0,
            platform_y: None,
            obstacles: Vec::new(),
        }
    }
}

/// A materialized stretch of terrain. Immutable after generation; owned by
/// the level stream and dropped wholesale when evicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start_x: f32,
    pub length: f32,
    pub platforms: Vec<Platform>,
    pub walls: Vec<WallTile>,
    pub obstacles: Vec<Obstacle>,
}

impl Segment {
    /// World x where the next segment begins.
    pub fn end_x(&self) -> f32 {
        self.start_x + self.length
    }
}

/// Generate a segment anchored at `cursor_x`. Pure: same spec and cursor
/// always produce the same geometry.
///
/// `length` of the returned segment is the rightmost extent of the authored
/// geometry, so `segment.end_x()` is the anchor for the next section.
/// Synthetic edge flanks protrude one wall-tile width past it; adjoining
/// segments' flanks abut exactly and never overlap.
pub fn generate_segment(spec: &SectionSpec, cursor_x: f32) -> Segment {
    match spec {
        SectionSpec::Straight {
            length,
            platform_y,
            obstacles,
        } => generate_straight(cursor_x, *length, *platform_y, obstacles),
        SectionSpec::StairsUp(stairs) => generate_stairs(cursor_x, stairs, true),
        SectionSpec::StairsDown(stairs) => generate_stairs(cursor_x, stairs, false),
        SectionSpec::Gap {
            base_y,
            platforms,
            obstacles,
        } => generate_gap(cursor_x, base_y.unwrap_or(GROUND_Y), platforms, obstacles),
        SectionSpec::WallJump {
            shaft_width,
            height,
            entry_length,
            exit_length,
        } => generate_wall_jump(cursor_x, *shaft_width, *height, *entry_length, *exit_length),
    }
}

/// An obstacle-free straight stretch, prepended to every level so the
/// player has time to orient.
pub fn safe_zone(cursor_x: f32, length: f32) -> Segment {
    generate_straight(cursor_x, length, None, &[])
}

fn generate_straight(
    cursor_x: f32,
    length: f32,
    platform_y: Option<f32>,
    obstacle_specs: &[ObstacleSpec],
) -> Segment {
    let surface_y = platform_y.unwrap_or(GROUND_Y);
    let platform = Platform::new(cursor_x, surface_y, length);

    let obstacles = obstacle_specs
        .iter()
        .map(|ob| Obstacle::new(cursor_x + ob.x, ob.y.resolve(surface_y), ob.kind))
        .collect();

    let mut walls = Vec::new();
    push_flank_walls(&mut walls, &platform);

    Segment {
        kind: SegmentKind::Straight,
        start_x: cursor_x,
        length,
        platforms: vec![platform],
        walls,
        obstacles,
    }
}

fn generate_stairs(cursor_x: f32, spec: &StairsSpec, ascending: bool) -> Segment {
    let mut platforms = Vec::with_capacity(spec.step_count as usize);
    let mut walls = Vec::new();

    for i in 0..spec.step_count {
        let dy = (i + 1) as f32 * spec.step_height;
        let surface_y = if ascending { GROUND_Y - dy } else { GROUND_Y + dy };
        let step = Platform::new(
            cursor_x + i as f32 * spec.step_width,
            surface_y,
            spec.step_width,
        );
        push_flank_walls(&mut walls, &step);
        platforms.push(step);
    }

    let obstacles = spec
        .obstacles
        .iter()
        .filter_map(|ob| {
            let step = platforms.get(ob.step_index)?;
            Some(Obstacle::new(
                step.origin_x + ob.x,
                ob.y.resolve(step.surface_y),
                ob.kind,
            ))
        })
        .collect();

    Segment {
        kind: if ascending {
            SegmentKind::StairsUp
        } else {
            SegmentKind::StairsDown
        },
        start_x: cursor_x,
        length: spec.step_count as f32 * spec.step_width,
        platforms,
        walls,
        obstacles,
    }
}

fn generate_gap(
    cursor_x: f32,
    base_y: f32,
    platform_specs: &[GapPlatformSpec],
    obstacle_specs: &[GapObstacleSpec],
) -> Segment {
    let mut platforms = Vec::with_capacity(platform_specs.len());
    let mut walls = Vec::new();
    let mut length = 0.0f32;

    for p in platform_specs {
        let platform = Platform::new(cursor_x + p.x, base_y - p.y_offset, p.width);
        length = length.max(p.x + p.width);
        push_flank_walls(&mut walls, &platform);
        platforms.push(platform);
    }

    let obstacles = obstacle_specs
        .iter()
        .filter_map(|ob| match ob {
            GapObstacleSpec::OnPlatform {
                platform_index,
                x,
                y,
                kind,
            } => {
                let platform = platforms.get(*platform_index)?;
                Some(Obstacle::new(
                    platform.origin_x + x,
                    y.resolve(platform.surface_y),
                    *kind,
                ))
            },
            GapObstacleSpec::Absolute { x, y, kind } => {
                // Absolute numeric y is height above the base, not a
                // screen-space offset.
                let world_y = match y {
                    ObstacleY::Offset(height) => base_y - height,
                    keyword => keyword.resolve(base_y),
                };
                Some(Obstacle::new(cursor_x + x, world_y, *kind))
            },
        })
        .collect();

    Segment {
        kind: SegmentKind::Gap,
        start_x: cursor_x,
        length,
        platforms,
        walls,
        obstacles,
    }
}

fn generate_wall_jump(
    cursor_x: f32,
    shaft_width: f32,
    height: f32,
    entry_length: f32,
    exit_length: f32,
) -> Segment {
    let entry = Platform::new(cursor_x, GROUND_Y, entry_length);
    let left_wall_x = cursor_x + entry_length;
    let right_wall_x = left_wall_x + WALL_TILE_WIDTH + shaft_width;
    let exit = Platform::new(
        right_wall_x + WALL_TILE_WIDTH,
        GROUND_Y - height,
        exit_length,
    );

    let mut walls = Vec::new();
    push_wall_column(&mut walls, left_wall_x, GROUND_Y, height);
    push_wall_column(&mut walls, right_wall_x, GROUND_Y, height);
    push_flank_walls(&mut walls, &entry);
    push_flank_walls(&mut walls, &exit);

    Segment {
        kind: SegmentKind::WallJump,
        start_x: cursor_x,
        length: entry_length + 2.0 * WALL_TILE_WIDTH + shaft_width + exit_length,
        platforms: vec![entry, exit],
        walls,
        obstacles: Vec::new(),
    }
}

/// Authored shaft column: tiles stacked upward from `base_y`, ending at
/// `base_y - height`. Begins at the surface and extends away from it, so it
/// never overlaps the platform it bounds.
fn push_wall_column(walls: &mut Vec<WallTile>, x: f32, base_y: f32, height: f32) {
    let tiles = (height / WALL_TILE_HEIGHT).ceil() as u32;
    for i in 0..tiles {
        walls.push(WallTile::new(
            x,
            base_y - (i + 1) as f32 * WALL_TILE_HEIGHT,
            false,
        ));
    }
}

/// Invisible cling walls at both edges of a platform, extending downward
/// from the surface.
fn push_flank_walls(walls: &mut Vec<WallTile>, platform: &Platform) {
    for i in 0..FLANK_TILES {
        let y = platform.surface_y + i as f32 * WALL_TILE_HEIGHT;
        walls.push(WallTile::new(platform.origin_x - WALL_TILE_WIDTH, y, true));
        walls.push(WallTile::new(platform.right(), y, true));
    }
}
