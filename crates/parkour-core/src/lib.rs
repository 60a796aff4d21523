//! Physics and streaming core of the side-scrolling parkour runner.
//!
//! The world scrolls; the player is pinned to a fixed screen x. Levels are
//! declarative JSON descriptors expanded into terrain segments, streamed
//! in a sliding window, and resolved against a single per-frame kinematics
//! pass. Everything is delta-time scaled and free of rendering concerns.

pub mod analysis;
pub mod camera;
pub mod geom;
pub mod level;
pub mod physics;
pub mod player;
pub mod session;
pub mod stream;
pub mod terrain;
pub mod wall;

pub use camera::Camera;
pub use geom::{Obstacle, ObstacleKind, Platform, Rect, WallTile};
pub use level::{LevelDescriptor, LevelMode, Progress};
pub use physics::{
    step_player, FrameInput, FrameReport, ParkourConfig, PhysicsConfig, TerminalSignal, WorldView,
};
pub use player::{AnimState, Player};
pub use session::{NullCatalog, Session, SessionStatus, SpriteCatalog, SpriteMeta};
pub use stream::{LevelStream, StreamDelta};
pub use terrain::{generate_segment, SectionSpec, Segment, SegmentKind, GROUND_Y};
pub use wall::{WallSide, WallState};
