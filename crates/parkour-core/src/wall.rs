use serde::{Deserialize, Serialize};

/// Seconds a player may hang on walls before the session ends.
pub const WALL_CLIMB_TIME_LIMIT: f32 = 3.0;
/// Elapsed cling time past which the UI should warn the player.
pub const WALL_CLIMB_WARNING_TIME: f32 = 1.5;
/// Minimum interval between consecutive wall jumps.
pub const WALL_JUMP_COOLDOWN: f32 = 0.1;
/// Delay before the player may grab a wall again after jumping off one.
pub const WALL_REATTACH_COOLDOWN: f32 = 0.15;

/// Which side of the player the wall is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallSide {
    Left,
    Right,
}

/// Wall-interaction state machine.
///
/// The cling timer restarts whenever sliding starts or stops; it measures
/// one continuous cling, not a lifetime total. All timers run on the
/// frame delta, so behavior is frame-rate independent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallState {
    /// `Some(side)` while sliding on a wall face.
    pub sliding: Option<WallSide>,
    /// Duration of the current continuous cling.
    pub time_elapsed: f32,
    jump_cooldown: f32,
    re_attach_cooldown: f32,
}

impl Default for WallState {
    fn default() -> Self {
        Self::new()
    }
}

impl WallState {
    pub fn new() -> Self {
        Self {
            sliding: None,
            time_elapsed: 0.0,
            jump_cooldown: 0.0,
            re_attach_cooldown: 0.0,
        }
    }

    /// Advance cooldown timers. The cling timer itself is advanced by the
    /// physics step, only while actually sliding and airborne.
    pub fn tick(&mut self, dt: f32) {
        self.jump_cooldown = (self.jump_cooldown - dt).max(0.0);
        self.re_attach_cooldown = (self.re_attach_cooldown - dt).max(0.0);
    }

    /// Try to begin sliding on `side`. Refused while the re-attach
    /// cooldown is running. Returns whether the attach took effect.
    /// Re-affirming the current side keeps the running timer; anything
    /// else starts a fresh cling.
    pub fn attach(&mut self, side: WallSide) -> bool {
        if self.re_attach_cooldown > 0.0 {
            return false;
        }
        if self.sliding != Some(side) {
            self.time_elapsed = 0.0;
        }
        self.sliding = Some(side);
        true
    }

    /// Release the wall without jumping. Stopping the slide restarts the
    /// cling timer.
    pub fn detach(&mut self) {
        self.sliding = None;
        self.time_elapsed = 0.0;
    }

    /// Landing on a platform clears everything, including the cling timer.
    pub fn reset_on_landing(&mut self) {
        *self = Self::new();
    }

    /// Whether a wall jump is allowed this frame.
    pub fn can_jump(&self) -> bool {
        self.sliding.is_some() && self.jump_cooldown <= 0.0
    }

    /// Perform the bookkeeping for a wall jump. Caller applies the
    /// velocity impulse. Returns the side jumped from.
    pub fn consume_jump(&mut self) -> Option<WallSide> {
        if !self.can_jump() {
            return None;
        }
        let side = self.sliding.take();
        self.time_elapsed = 0.0;
        self.jump_cooldown = WALL_JUMP_COOLDOWN;
        self.re_attach_cooldown = WALL_REATTACH_COOLDOWN;
        side
    }

    /// True once the cling timer has passed the warning threshold.
    pub fn warning(&self) -> bool {
        self.time_elapsed > WALL_CLIMB_WARNING_TIME
    }

    /// True once the cling timer has exceeded the hard limit.
    pub fn exceeded(&self) -> bool {
        self.time_elapsed > WALL_CLIMB_TIME_LIMIT
    }
}
