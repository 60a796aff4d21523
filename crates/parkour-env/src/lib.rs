//! Gym-style environment for training runner agents.
//!
//! Exposes the classic `reset`/`step` loop over a simplified, branchless
//! rendition of the runner: a flat ground plane, auto-run at the base
//! speed, a single jump action, and the level's obstacles. Wall mechanics
//! and platform elevation are deliberately absent so the observation stays
//! a compact four-feature vector. Unlike the interactive core, the
//! environment runs on a fixed internal timestep for reproducible rollouts.

use serde::{Deserialize, Serialize};

use parkour_core::geom::{Obstacle, ObstacleKind, Rect};
use parkour_core::level::{LevelDescriptor, LevelMode};
use parkour_core::physics::{
    GRAVITY, JUMP_VELOCITY, RUN_SPEED, StreamConfig, VIEWPORT_HEIGHT,
};
use parkour_core::player::{PLAYER_HEIGHT, PLAYER_WIDTH};
use parkour_core::stream::LevelStream;
use parkour_core::terrain::GROUND_Y;

/// Fixed simulation timestep.
pub const DT: f32 = 1.0 / 60.0;
/// Episode length cap.
pub const MAX_STEPS: u32 = 2000;
/// Reward for surviving one step.
pub const STEP_REWARD: f32 = 0.1;
/// Penalty for hitting a real obstacle (episode ends).
pub const DEATH_PENALTY: f32 = -50.0;
/// Penalty for hitting a decoy (episode continues).
pub const DECOY_PENALTY: f32 = -5.0;
/// Backward shove applied on a decoy hit.
pub const DECOY_KNOCKBACK: f32 = 20.0;
/// Bonus for reaching the end of the level.
pub const COMPLETION_BONUS: f32 = 200.0;

/// Normalization scale for vertical velocity.
const VY_SCALE: f32 = 1200.0;
/// Obstacle distances at or beyond this read as 1.0.
const DIST_SCALE: f32 = 500.0;

/// Agent actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Idle,
    Jump,
}

/// Four features, each roughly in [0, 1] (vy in [-1, 1]):
/// `[height, vertical velocity, distance to next obstacle, obstacle kind]`.
/// Kind reads 1.0 for a real obstacle, 0.5 for a decoy, 0.0 for none.
pub type Observation = [f32; 4];

/// One transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub obs: Observation,
    pub reward: f32,
    pub done: bool,
}

/// The training environment. Obstacles come from a fixed level descriptor,
/// materialized once; decoys are consumed on contact so each is punished
/// once.
pub struct ParkourEnv {
    level: LevelDescriptor,
    obstacles: Vec<Obstacle>,
    live: Vec<Obstacle>,
    length: f32,
    world_x: f32,
    hitbox: Rect,
    vy: f32,
    on_ground: bool,
    steps: u32,
    total_reward: f32,
    done: bool,
}

impl ParkourEnv {
    pub fn new(level: LevelDescriptor) -> Self {
        let level = if level.mode == LevelMode::Endless {
            tracing::warn!(
                "environment requires a fixed level, {} is endless; using the default",
                level.name
            );
            LevelDescriptor::default_level()
        } else {
            level
        };

        // Materialize once through the stream so obstacle placement and
        // the safe zone match the interactive game exactly.
        let stream = LevelStream::new(&level, StreamConfig::default(), 0);
        let obstacles: Vec<Obstacle> = stream
            .segments()
            .flat_map(|s| s.obstacles.iter().copied())
            .collect();
        let length = stream.level_length().unwrap_or(f32::INFINITY);

        let mut env = Self {
            level,
            obstacles,
            live: Vec::new(),
            length,
            world_x: 0.0,
            hitbox: Rect::new(0.0, GROUND_Y - PLAYER_HEIGHT, PLAYER_WIDTH, PLAYER_HEIGHT),
            vy: 0.0,
            on_ground: true,
            steps: 0,
            total_reward: 0.0,
            done: false,
        };
        env.reset();
        env
    }

    pub fn reset(&mut self) -> Observation {
        self.live = self.obstacles.clone();
        self.world_x = 0.0;
        self.hitbox = Rect::new(0.0, GROUND_Y - PLAYER_HEIGHT, PLAYER_WIDTH, PLAYER_HEIGHT);
        self.vy = 0.0;
        self.on_ground = true;
        self.steps = 0;
        self.total_reward = 0.0;
        self.done = false;
        self.observe()
    }

    pub fn step(&mut self, action: Action) -> Step {
        if self.done {
            return Step {
                obs: self.observe(),
                reward: 0.0,
                done: true,
            };
        }

        let mut reward = STEP_REWARD;

        self.world_x += RUN_SPEED * DT;
        if action == Action::Jump && self.on_ground {
            self.vy = JUMP_VELOCITY;
            self.on_ground = false;
        }
        self.vy += GRAVITY * DT;
        self.hitbox.y += self.vy * DT;
        if self.hitbox.bottom() >= GROUND_Y {
            self.hitbox.set_bottom(GROUND_Y);
            self.vy = 0.0;
            self.on_ground = true;
        }

        let body = self.hitbox.shifted_x(self.world_x);
        let mut hit_real = false;
        let mut decoys = 0;
        self.live.retain(|ob| {
            if !body.overlaps(&ob.rect()) {
                return true;
            }
            match ob.kind {
                ObstacleKind::Real => {
                    hit_real = true;
                    true
                },
                ObstacleKind::Fake => {
                    decoys += 1;
                    false
                },
            }
        });
        if hit_real {
            reward += DEATH_PENALTY;
            self.done = true;
        }
        if decoys > 0 {
            reward += DECOY_PENALTY * decoys as f32;
            self.world_x -= DECOY_KNOCKBACK * decoys as f32;
        }

        if !self.done && self.world_x + self.hitbox.w >= self.length {
            reward += COMPLETION_BONUS;
            self.done = true;
        }

        self.steps += 1;
        if self.steps >= MAX_STEPS {
            self.done = true;
        }

        self.total_reward += reward;
        Step {
            obs: self.observe(),
            reward,
            done: self.done,
        }
    }

    fn observe(&self) -> Observation {
        let height = self.hitbox.y / VIEWPORT_HEIGHT;
        let vy = (self.vy / VY_SCALE).clamp(-1.0, 1.0);

        let front = self.world_x + self.hitbox.right();
        let next = self
            .live
            .iter()
            .filter(|ob| ob.world_x + ob.rect().w >= front - self.hitbox.w)
            .min_by(|a, b| a.world_x.total_cmp(&b.world_x));
        let (dist, kind) = match next {
            Some(ob) => (
                ((ob.world_x - front).max(0.0) / DIST_SCALE).min(1.0),
                match ob.kind {
                    ObstacleKind::Real => 1.0,
                    ObstacleKind::Fake => 0.5,
                },
            ),
            None => (1.0, 0.0),
        };
        [height, vy, dist, kind]
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn total_reward(&self) -> f32 {
        self.total_reward
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn level(&self) -> &LevelDescriptor {
        &self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(length: f32, obstacles: &str) -> LevelDescriptor {
        LevelDescriptor::from_json(&format!(
            r#"{{
                "name": "env-test",
                "mode": "fixed",
                "sections": [
                    {{ "type": "straight", "length": {length}, "obstacles": [{obstacles}] }}
                ]
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn reset_observation_is_grounded_and_clear() {
        let mut env = ParkourEnv::new(flat(2000.0, ""));
        let obs = env.reset();
        assert!((obs[0] - (GROUND_Y - PLAYER_HEIGHT) / VIEWPORT_HEIGHT).abs() < 1e-6);
        assert_eq!(obs[1], 0.0);
        assert_eq!(obs[2], 1.0, "no obstacle ahead reads as max distance");
        assert_eq!(obs[3], 0.0);
    }

    #[test]
    fn idle_run_completes_a_clear_level() {
        let mut env = ParkourEnv::new(flat(1000.0, ""));
        env.reset();
        let mut last = None;
        for _ in 0..MAX_STEPS {
            let step = env.step(Action::Idle);
            if step.done {
                last = Some(step);
                break;
            }
        }
        let last = last.expect("level should complete within the cap");
        assert!(last.reward > COMPLETION_BONUS - 1.0);
        assert!(env.total_reward() > COMPLETION_BONUS);
    }

    #[test]
    fn real_obstacle_ends_the_episode_with_the_penalty() {
        let mut env = ParkourEnv::new(flat(3000.0, r#"{ "x": 400, "kind": "real" }"#));
        env.reset();
        let mut terminal = None;
        for _ in 0..MAX_STEPS {
            let step = env.step(Action::Idle);
            if step.done {
                terminal = Some(step);
                break;
            }
        }
        let terminal = terminal.expect("collision expected");
        assert!(terminal.reward < DEATH_PENALTY + 1.0);
        assert!(env.is_done());
    }

    #[test]
    fn decoy_knocks_back_once_and_play_continues() {
        let mut env = ParkourEnv::new(flat(3000.0, r#"{ "x": 400, "kind": "illusion" }"#));
        env.reset();

        let mut decoy_steps = 0;
        let mut knocked_back = false;
        let mut prev_x = env.world_x;
        for _ in 0..MAX_STEPS {
            let step = env.step(Action::Idle);
            if step.reward < 0.0 {
                decoy_steps += 1;
                if env.world_x < prev_x {
                    knocked_back = true;
                }
            }
            prev_x = env.world_x;
            if step.done {
                break;
            }
        }
        assert_eq!(decoy_steps, 1, "a decoy is punished exactly once");
        assert!(knocked_back);
        assert!(env.total_reward() > 0.0, "episode should still complete");
    }

    #[test]
    fn jumping_clears_a_real_obstacle() {
        let mut env = ParkourEnv::new(flat(1200.0, r#"{ "x": 500, "kind": "real" }"#));
        let mut obs = env.reset();
        for _ in 0..MAX_STEPS {
            // Jump when an obstacle is close.
            let action = if obs[2] < 0.15 { Action::Jump } else { Action::Idle };
            let step = env.step(action);
            obs = step.obs;
            if step.done {
                assert!(
                    step.reward > 0.0,
                    "agent died instead of clearing the obstacle: {}",
                    step.reward
                );
                return;
            }
        }
        panic!("episode never finished");
    }

    #[test]
    fn step_cap_ends_long_episodes() {
        let mut env = ParkourEnv::new(flat(50_000.0, ""));
        env.reset();
        let mut done = false;
        for _ in 0..MAX_STEPS {
            done = env.step(Action::Idle).done;
        }
        assert!(done);
        assert_eq!(env.steps(), MAX_STEPS);
    }

    #[test]
    fn endless_levels_are_rejected_for_the_default() {
        let endless = LevelDescriptor::from_json(
            r#"{ "name": "forever", "mode": "endless",
                 "patterns": [ { "type": "straight", "length": 400 } ] }"#,
        )
        .unwrap();
        let env = ParkourEnv::new(endless);
        assert_eq!(env.level().name, "training-grounds");
    }
}
