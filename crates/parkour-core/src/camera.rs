use serde::{Deserialize, Serialize};

use crate::physics::CameraConfig;
use crate::player::Player;

/// Forward-scroll controller. The world moves; the player's screen x is
/// pinned.
///
/// Pinning folds any screen-space displacement the resolver produced into
/// the scroll offset, so a player clamped against a wall stalls the scroll
/// instead of drifting off the pin. No separate counter-scroll mechanism
/// is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub scroll: f32,
    pub run_speed: f32,
    target_x: f32,
    base_run_speed: f32,
    max_run_speed: f32,
    ramp_rate: f32,
    endless: bool,
}

impl Camera {
    pub fn new(cfg: &CameraConfig, endless: bool) -> Self {
        Self {
            scroll: 0.0,
            run_speed: cfg.base_run_speed,
            target_x: cfg.target_x,
            base_run_speed: cfg.base_run_speed,
            max_run_speed: cfg.max_run_speed,
            ramp_rate: cfg.ramp_rate,
            endless,
        }
    }

    pub fn target_x(&self) -> f32 {
        self.target_x
    }

    /// Advance the scroll for one frame. Endless mode ramps the run speed
    /// toward the cap; fixed mode holds the base speed.
    pub fn begin_frame(&mut self, dt: f32) {
        if self.endless {
            self.run_speed = (self.run_speed + self.ramp_rate * dt).min(self.max_run_speed);
        }
        self.scroll += self.run_speed * dt;
    }

    /// Pin the player to the target screen x, moving the displacement into
    /// the scroll offset. Exact: after this call the hitbox x equals the
    /// target.
    pub fn pin(&mut self, player: &mut Player) {
        let diff = player.hitbox.x - self.target_x;
        self.scroll += diff;
        player.hitbox.x = self.target_x;
    }

    pub fn reset(&mut self) {
        self.scroll = 0.0;
        self.run_speed = self.base_run_speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_mode_speed_is_constant() {
        let mut cam = Camera::new(&CameraConfig::default(), false);
        let speed = cam.run_speed;
        for _ in 0..600 {
            cam.begin_frame(1.0 / 60.0);
        }
        assert_eq!(cam.run_speed, speed);
        assert!((cam.scroll - speed * 10.0).abs() < 0.5);
    }

    #[test]
    fn endless_ramp_is_clamped() {
        let cfg = CameraConfig {
            base_run_speed: 200.0,
            max_run_speed: 230.0,
            ramp_rate: 12.0,
            ..CameraConfig::default()
        };
        let mut cam = Camera::new(&cfg, true);
        // 12/s for 10 s would be 320 without the cap.
        for _ in 0..600 {
            cam.begin_frame(1.0 / 60.0);
        }
        assert_eq!(cam.run_speed, 230.0);
    }

    #[test]
    fn pin_is_exact_and_conserves_world_position() {
        let mut cam = Camera::new(&CameraConfig::default(), false);
        cam.scroll = 1000.0;
        let mut player = Player::spawn(cam.target_x() + 37.5, 360.0);

        let world_before = cam.scroll + player.hitbox.x;
        cam.pin(&mut player);
        assert_eq!(player.hitbox.x, cam.target_x());
        assert_eq!(cam.scroll + player.hitbox.x, world_before);
    }

    #[test]
    fn pin_stalls_scroll_for_wall_pushback() {
        let mut cam = Camera::new(&CameraConfig::default(), false);
        cam.scroll = 500.0;
        // Resolver pushed the player 20 units left of the pin.
        let mut player = Player::spawn(cam.target_x() - 20.0, 360.0);
        cam.pin(&mut player);
        assert_eq!(cam.scroll, 480.0);
    }

    #[test]
    fn reset_restores_base_state() {
        let mut cam = Camera::new(&CameraConfig::default(), true);
        for _ in 0..600 {
            cam.begin_frame(1.0 / 60.0);
        }
        cam.reset();
        assert_eq!(cam.scroll, 0.0);
        assert_eq!(cam.run_speed, CameraConfig::default().base_run_speed);
    }
}
