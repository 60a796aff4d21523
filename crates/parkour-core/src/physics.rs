use serde::{Deserialize, Serialize};

use crate::geom::{Obstacle, ObstacleKind, Platform, WallTile};
use crate::player::{AnimState, Player};
use crate::wall::WallSide;

/// Gravity acceleration (units/s^2, downward, y axis points down).
pub const GRAVITY: f32 = 1800.0;
/// Ground-jump initial velocity.
pub const JUMP_VELOCITY: f32 = -780.0;
/// Wall-jump initial velocity, weaker than a ground jump.
pub const WALL_JUMP_VELOCITY: f32 = -600.0;
/// Horizontal kick applied by the `KickAway` wall-jump style.
pub const WALL_JUMP_KICK: f32 = 300.0;
/// Horizontal drag factor per reference frame (1/60 s).
pub const DRAG_COEFFICIENT: f32 = 0.85;
/// Speeds below this are snapped to zero after drag.
pub const VELOCITY_EPSILON: f32 = 6.0;
/// Terminal velocity while sliding down a wall.
pub const MAX_WALL_SLIDE_SPEED: f32 = 150.0;
/// Screen width in world units.
pub const VIEWPORT_WIDTH: f32 = 1024.0;
/// Screen height in world units.
pub const VIEWPORT_HEIGHT: f32 = 700.0;

/// Base auto-run scroll speed (units/s).
pub const RUN_SPEED: f32 = 210.0;
/// Cap for the endless-mode speed ramp.
pub const MAX_RUN_SPEED: f32 = 900.0;
/// Endless-mode scroll acceleration (units/s^2).
pub const SPEED_RAMP_RATE: f32 = 12.0;
/// Screen x the camera pins the player hitbox to.
pub const PLAYER_TARGET_X: f32 = 300.0;

/// Leading stretch of every level kept free of obstacles.
pub const SAFE_ZONE_DISTANCE: f32 = 200.0;
/// Length of the plain straight segment prepended to every level.
pub const SAFE_ZONE_LENGTH: f32 = 400.0;
/// Segments are generated out to this many viewport widths ahead.
pub const LOOKAHEAD_FACTOR: f32 = 1.5;
/// Segments whose trailing edge falls this far behind the scroll are evicted.
pub const DESPAWN_MARGIN: f32 = 200.0;

/// Horizontal impulse policy for wall jumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallJumpStyle {
    /// Pure vertical boost; the auto-run carries the player back onto the
    /// face, giving a ladder-like repeated climb.
    #[default]
    StraightUp,
    /// Vertical boost plus a kick away from the wall.
    KickAway,
}

/// Configurable kinematics parameters, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub jump_velocity: f32,
    pub wall_jump_velocity: f32,
    pub wall_jump_kick: f32,
    pub wall_jump_style: WallJumpStyle,
    pub drag_coefficient: f32,
    pub velocity_epsilon: f32,
    pub max_wall_slide_speed: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            wall_jump_velocity: WALL_JUMP_VELOCITY,
            wall_jump_kick: WALL_JUMP_KICK,
            wall_jump_style: WallJumpStyle::default(),
            drag_coefficient: DRAG_COEFFICIENT,
            velocity_epsilon: VELOCITY_EPSILON,
            max_wall_slide_speed: MAX_WALL_SLIDE_SPEED,
        }
    }
}

/// Scroll-controller parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub target_x: f32,
    pub base_run_speed: f32,
    pub max_run_speed: f32,
    pub ramp_rate: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            target_x: PLAYER_TARGET_X,
            base_run_speed: RUN_SPEED,
            max_run_speed: MAX_RUN_SPEED,
            ramp_rate: SPEED_RAMP_RATE,
        }
    }
}

/// Level-stream window parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub viewport_width: f32,
    pub safe_zone_distance: f32,
    pub safe_zone_length: f32,
    pub lookahead_factor: f32,
    pub despawn_margin: f32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            viewport_width: VIEWPORT_WIDTH,
            safe_zone_distance: SAFE_ZONE_DISTANCE,
            safe_zone_length: SAFE_ZONE_LENGTH,
            lookahead_factor: LOOKAHEAD_FACTOR,
            despawn_margin: DESPAWN_MARGIN,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkourConfig {
    pub physics: PhysicsConfig,
    pub camera: CameraConfig,
    pub stream: StreamConfig,
}

impl ParkourConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is
    /// missing or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("PARKOUR_CONFIG")
            .unwrap_or_else(|_| "config/parkour.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<ParkourConfig>(&content) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!("Failed to parse {path}: {e}, using defaults");
                    ParkourConfig::default()
                },
            },
            Err(_) => ParkourConfig::default(),
        }
    }
}

/// How a frame ended. Normal gameplay outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalSignal {
    #[default]
    None,
    Died,
    WallTimeExceeded,
    LevelComplete,
}

/// Per-frame outcome of the physics step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    pub signal: TerminalSignal,
    /// The player touched a fake obstacle this frame.
    pub decoy_contact: bool,
}

impl FrameReport {
    /// First signal wins; later checks never downgrade an earlier one.
    fn raise(&mut self, signal: TerminalSignal) {
        if self.signal == TerminalSignal::None {
            self.signal = signal;
        }
    }
}

/// Input sampled for one frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub jump: bool,
}

/// Read-only slice of the world visible to the resolver. Geometry is in
/// world space; the player hitbox is in screen space, so every test shifts
/// geometry left by `scroll`.
#[derive(Debug, Clone, Copy)]
pub struct WorldView<'a> {
    pub platforms: &'a [Platform],
    pub walls: &'a [WallTile],
    pub obstacles: &'a [Obstacle],
    pub scroll: f32,
    pub viewport_h: f32,
    /// Total level length in fixed mode; `None` in endless mode.
    pub level_length: Option<f32>,
}

/// Advance the player by one frame.
///
/// Order within the frame: jump intent, horizontal integration and drag,
/// wall contact, vertical integration with the slide clamp, one-sided
/// platform landing, then hazard and terminal checks. All integration
/// scales by `dt`; drag is exponential in `dt` so damping is identical at
/// any frame rate.
pub fn step_player(
    player: &mut Player,
    input: &FrameInput,
    view: &WorldView<'_>,
    cfg: &PhysicsConfig,
    dt: f32,
) -> FrameReport {
    let mut report = FrameReport::default();

    // 1. Cooldowns and jump intent.
    player.wall.tick(dt);
    if input.jump {
        if player.on_ground {
            player.vy = cfg.jump_velocity;
            player.on_ground = false;
        } else if let Some(side) = player.wall.consume_jump() {
            player.vy = cfg.wall_jump_velocity;
            player.vx = match cfg.wall_jump_style {
                WallJumpStyle::StraightUp => 0.0,
                WallJumpStyle::KickAway => match side {
                    WallSide::Left => cfg.wall_jump_kick,
                    WallSide::Right => -cfg.wall_jump_kick,
                },
            };
        }
    }

    // 2. Horizontal integration and exponential drag.
    player.hitbox.x += player.vx * dt;
    player.vx *= cfg.drag_coefficient.powf(60.0 * dt);
    if player.vx.abs() < cfg.velocity_epsilon {
        player.vx = 0.0;
    }

    // 3. Wall contact. Side is whichever face is penetrated least; the
    // player is clamped flush and may begin sliding only while airborne.
    let mut touching_left = false;
    let mut touching_right = false;
    for wall in view.walls {
        let rect = wall.rect().shifted_x(-view.scroll);
        if !player.hitbox.overlaps(&rect) {
            continue;
        }
        let pen_right = player.hitbox.right() - rect.left();
        let pen_left = rect.right() - player.hitbox.left();
        if pen_right <= pen_left {
            // Wall on the player's right. Ignored while moving away.
            if player.vx >= 0.0 {
                player.hitbox.set_right(rect.left());
                player.vx = 0.0;
                touching_right = true;
                if !player.on_ground {
                    player.wall.attach(WallSide::Right);
                }
            }
        } else if player.vx <= 0.0 {
            player.hitbox.x = rect.right();
            player.vx = 0.0;
            touching_left = true;
            if !player.on_ground {
                player.wall.attach(WallSide::Left);
            }
        }
    }
    match player.wall.sliding {
        Some(WallSide::Left) if !touching_left => player.wall.detach(),
        Some(WallSide::Right) if !touching_right => player.wall.detach(),
        _ => {},
    }

    // 4. Vertical integration. Sliding caps the fall and runs the cling
    // timer; both only while airborne.
    player.vy += cfg.gravity * dt;
    if player.wall.sliding.is_some() && !player.on_ground {
        player.vy = player.vy.min(cfg.max_wall_slide_speed);
        player.wall.time_elapsed += dt;
    }
    let pre_bottom = player.hitbox.bottom();
    player.hitbox.y += player.vy * dt;

    // 5. One-sided platform landing. A landing is a downward crossing of
    // the surface within the platform's horizontal span; the pre-move
    // check rejects contact from below or from the side.
    player.on_ground = false;
    for platform in view.platforms {
        let left = platform.origin_x - view.scroll;
        let right = platform.right() - view.scroll;
        if player.vy >= 0.0
            && player.hitbox.right() > left
            && player.hitbox.left() < right
            && pre_bottom <= platform.surface_y
            && player.hitbox.bottom() >= platform.surface_y
        {
            player.hitbox.set_bottom(platform.surface_y);
            player.vy = 0.0;
            player.on_ground = true;
            player.wall.reset_on_landing();
        }
    }

    // 6. Obstacles. Real contact ends the session; fake contact is only
    // reported and the consumer decides what it costs.
    for obstacle in view.obstacles {
        let rect = obstacle.rect().shifted_x(-view.scroll);
        if player.hitbox.overlaps(&rect) {
            match obstacle.kind {
                ObstacleKind::Real => report.raise(TerminalSignal::Died),
                ObstacleKind::Fake => report.decoy_contact = true,
            }
        }
    }

    // 7. Falling out of the world.
    if player.hitbox.top() > view.viewport_h {
        report.raise(TerminalSignal::Died);
    }

    // 8. Wall-time limit.
    if player.wall.sliding.is_some() && !player.on_ground && player.wall.exceeded() {
        report.raise(TerminalSignal::WallTimeExceeded);
    }

    // 9. Completion (fixed mode only).
    if let Some(length) = view.level_length
        && view.scroll + player.hitbox.right() >= length
    {
        report.raise(TerminalSignal::LevelComplete);
    }

    // 10. Animation bucket.
    let anim = if player.on_ground {
        AnimState::Run
    } else if player.wall.sliding.is_some() {
        AnimState::WallSlide
    } else if player.vy < 0.0 {
        AnimState::Jump
    } else {
        AnimState::Fall
    };
    player.set_anim(anim);
    player.advance_anim();

    report
}
