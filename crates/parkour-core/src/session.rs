use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::geom::{Obstacle, Platform, WallTile};
use crate::level::{LevelDescriptor, LevelMode};
use crate::physics::{
    step_player, FrameInput, ParkourConfig, TerminalSignal, WorldView, VIEWPORT_HEIGHT,
};
use crate::player::Player;
use crate::stream::LevelStream;
use crate::terrain::GROUND_Y;

/// Metadata for one sprite strip, served by the asset catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteMeta {
    pub sheet: String,
    pub frames: u32,
}

/// Read-only asset lookup injected into the session. The core never loads
/// images; render layers implement this against their own asset store and
/// headless consumers use [`NullCatalog`].
pub trait SpriteCatalog {
    fn lookup(&self, kind: &str, name: &str) -> Option<SpriteMeta>;
}

/// Catalog that knows no sprites. Physics and streaming are unaffected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCatalog;

impl SpriteCatalog for NullCatalog {
    fn lookup(&self, _kind: &str, _name: &str) -> Option<SpriteMeta> {
        None
    }
}

/// Latched outcome of a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Died,
    WallTimeExceeded,
    Completed,
}

/// One play-through: player, camera, and terrain window driven frame by
/// frame. Once a terminal status latches, further updates are no-ops until
/// `reset`.
pub struct Session {
    config: ParkourConfig,
    level: LevelDescriptor,
    seed: u64,
    player: Player,
    camera: Camera,
    stream: LevelStream,
    status: SessionStatus,
    score: f32,
    decoy_hits: u32,
    decoy_touching: bool,
    elapsed: f32,
    catalog: Box<dyn SpriteCatalog>,
    // View buffers reused across frames.
    platforms: Vec<Platform>,
    walls: Vec<WallTile>,
    obstacles: Vec<Obstacle>,
}

impl Session {
    pub fn new(
        level: LevelDescriptor,
        config: ParkourConfig,
        seed: u64,
        catalog: Box<dyn SpriteCatalog>,
    ) -> Self {
        let endless = level.mode == LevelMode::Endless;
        let camera = Camera::new(&config.camera, endless);
        let mut stream = LevelStream::new(&level, config.stream.clone(), seed);
        stream.advance(0.0);
        let player = Player::spawn(config.camera.target_x, GROUND_Y);
        tracing::info!(level = %level.name, seed, endless, "session start");
        Self {
            config,
            level,
            seed,
            player,
            camera,
            stream,
            status: SessionStatus::Running,
            score: 0.0,
            decoy_hits: 0,
            decoy_touching: false,
            elapsed: 0.0,
            catalog,
            platforms: Vec::new(),
            walls: Vec::new(),
            obstacles: Vec::new(),
        }
    }

    /// Advance the session by one frame.
    pub fn update(&mut self, dt: f32, jump: bool) -> SessionStatus {
        if self.status != SessionStatus::Running {
            return self.status;
        }

        self.camera.begin_frame(dt);
        self.stream
            .collect_view_into(&mut self.platforms, &mut self.walls, &mut self.obstacles);
        let view = WorldView {
            platforms: &self.platforms,
            walls: &self.walls,
            obstacles: &self.obstacles,
            scroll: self.camera.scroll,
            viewport_h: VIEWPORT_HEIGHT,
            level_length: self.stream.level_length(),
        };
        let report = step_player(
            &mut self.player,
            &FrameInput { jump },
            &view,
            &self.config.physics,
            dt,
        );

        // Count a decoy on the contact edge, not per overlapping frame.
        if report.decoy_contact && !self.decoy_touching {
            self.decoy_hits += 1;
        }
        self.decoy_touching = report.decoy_contact;
        match report.signal {
            TerminalSignal::None => {},
            TerminalSignal::Died => {
                tracing::info!(score = self.score, "player died");
                self.status = SessionStatus::Died;
            },
            TerminalSignal::WallTimeExceeded => {
                tracing::info!(score = self.score, "wall time limit exceeded");
                self.status = SessionStatus::WallTimeExceeded;
            },
            TerminalSignal::LevelComplete => {
                tracing::info!(score = self.score, "level complete");
                self.status = SessionStatus::Completed;
            },
        }

        self.camera.pin(&mut self.player);
        self.stream.advance(self.camera.scroll);

        self.score += self.camera.run_speed * dt / 10.0;
        self.elapsed += dt;
        self.status
    }

    /// Start over on the same level and seed.
    pub fn reset(&mut self) {
        self.camera.reset();
        self.stream = LevelStream::new(&self.level, self.config.stream.clone(), self.seed);
        self.stream.advance(0.0);
        self.player = Player::spawn(self.config.camera.target_x, GROUND_Y);
        self.status = SessionStatus::Running;
        self.score = 0.0;
        self.decoy_hits = 0;
        self.decoy_touching = false;
        self.elapsed = 0.0;
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn decoy_hits(&self) -> u32 {
        self.decoy_hits
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn stream(&self) -> &LevelStream {
        &self.stream
    }

    pub fn level(&self) -> &LevelDescriptor {
        &self.level
    }

    /// Cling-timer warning for the HUD.
    pub fn wall_warning(&self) -> bool {
        self.player.wall.warning()
    }

    pub fn sprite(&self, kind: &str, name: &str) -> Option<SpriteMeta> {
        self.catalog.lookup(kind, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn flat_level(length: f32, obstacles: &str) -> LevelDescriptor {
        LevelDescriptor::from_json(&format!(
            r#"{{
                "name": "flat",
                "mode": "fixed",
                "sections": [
                    {{ "type": "straight", "length": {length}, "obstacles": [{obstacles}] }}
                ]
            }}"#
        ))
        .unwrap()
    }

    fn session(level: LevelDescriptor) -> Session {
        Session::new(level, ParkourConfig::default(), 1, Box::new(NullCatalog))
    }

    #[test]
    fn clear_level_runs_to_completion() {
        let mut s = session(flat_level(2000.0, ""));
        let mut status = SessionStatus::Running;
        for _ in 0..2000 {
            status = s.update(DT, false);
            if status != SessionStatus::Running {
                break;
            }
        }
        assert_eq!(status, SessionStatus::Completed);
        assert!(s.score() > 0.0);
        // Pin held the whole way.
        assert_eq!(s.player().hitbox.x, s.camera().target_x());
    }

    #[test]
    fn real_obstacle_latches_death() {
        let mut s = session(flat_level(3000.0, r#"{ "x": 500, "kind": "real" }"#));
        let mut status = SessionStatus::Running;
        for _ in 0..2000 {
            status = s.update(DT, false);
            if status != SessionStatus::Running {
                break;
            }
        }
        assert_eq!(status, SessionStatus::Died);

        // Latched: further updates change nothing.
        let scroll = s.camera().scroll;
        let score = s.score();
        assert_eq!(s.update(DT, true), SessionStatus::Died);
        assert_eq!(s.camera().scroll, scroll);
        assert_eq!(s.score(), score);
    }

    #[test]
    fn fake_obstacle_is_survivable_and_counted() {
        let mut s = session(flat_level(2000.0, r#"{ "x": 500, "kind": "illusion" }"#));
        let mut status = SessionStatus::Running;
        for _ in 0..2000 {
            status = s.update(DT, false);
            if status != SessionStatus::Running {
                break;
            }
        }
        assert_eq!(status, SessionStatus::Completed);
        // The overlap lasts many frames; one decoy still counts once.
        assert_eq!(s.decoy_hits(), 1);
    }

    #[test]
    fn reset_restores_a_fresh_run() {
        let mut s = session(flat_level(3000.0, r#"{ "x": 500, "kind": "real" }"#));
        for _ in 0..2000 {
            if s.update(DT, false) != SessionStatus::Running {
                break;
            }
        }
        assert_eq!(s.status(), SessionStatus::Died);

        s.reset();
        assert_eq!(s.status(), SessionStatus::Running);
        assert_eq!(s.score(), 0.0);
        assert_eq!(s.camera().scroll, 0.0);
        assert_eq!(s.player().hitbox.bottom(), GROUND_Y);
    }

    #[test]
    fn null_catalog_serves_nothing() {
        let s = session(flat_level(500.0, ""));
        assert_eq!(s.sprite("player", "run"), None);
    }
}
