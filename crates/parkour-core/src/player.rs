use serde::{Deserialize, Serialize};

use crate::geom::Rect;
use crate::wall::WallState;

/// Player hitbox width in world units.
pub const PLAYER_WIDTH: f32 = 22.0;
/// Player hitbox height in world units.
pub const PLAYER_HEIGHT: f32 = 36.0;

/// Animation bucket derived from physical state each frame. The render
/// layer maps these to sprite strips; the core only tracks which bucket is
/// active and resets the frame counter on transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimState {
    Run,
    Jump,
    Fall,
    WallSlide,
}

/// The player: one authoritative hitbox in screen space, velocities in
/// units per second, and the wall-interaction machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub hitbox: Rect,
    pub vx: f32,
    pub vy: f32,
    pub on_ground: bool,
    pub wall: WallState,
    pub anim: AnimState,
    pub anim_frame: u32,
}

impl Player {
    /// Spawn standing with the hitbox bottom at `(x, bottom_y)`.
    pub fn spawn(x: f32, bottom_y: f32) -> Self {
        Self {
            hitbox: Rect::new(x, bottom_y - PLAYER_HEIGHT, PLAYER_WIDTH, PLAYER_HEIGHT),
            vx: 0.0,
            vy: 0.0,
            on_ground: true,
            wall: WallState::new(),
            anim: AnimState::Run,
            anim_frame: 0,
        }
    }

    /// Switch animation bucket, restarting the frame counter only on an
    /// actual transition.
    pub fn set_anim(&mut self, anim: AnimState) {
        if self.anim != anim {
            self.anim = anim;
            self.anim_frame = 0;
        }
    }

    pub fn advance_anim(&mut self) {
        self.anim_frame = self.anim_frame.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_places_bottom_exactly() {
        let p = Player::spawn(300.0, 360.0);
        assert_eq!(p.hitbox.bottom(), 360.0);
        assert_eq!(p.hitbox.x, 300.0);
        assert!(p.on_ground);
    }

    #[test]
    fn anim_frame_resets_only_on_transition() {
        let mut p = Player::spawn(0.0, 360.0);
        p.anim_frame = 7;
        p.set_anim(AnimState::Run);
        assert_eq!(p.anim_frame, 7, "same bucket keeps the frame counter");
        p.set_anim(AnimState::Jump);
        assert_eq!(p.anim_frame, 0);
    }
}
