use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geom::{Obstacle, Platform, WallTile};
use crate::level::{LevelDescriptor, LevelMode, Pattern, SpawnLogic, SpawnOrder};
use crate::physics::StreamConfig;
use crate::terrain::{generate_segment, safe_zone, SectionSpec, Segment};

/// What one `advance` call changed. Newly spawned segments sit at the
/// back of the window; evicted ones are handed to the caller so a render
/// layer can tear down whatever it attached to them.
#[derive(Debug, Clone, Default)]
pub struct StreamDelta {
    pub spawned: usize,
    pub evicted: Vec<Segment>,
}

enum Mode {
    Fixed,
    Endless {
        patterns: Vec<Pattern>,
        spawn: SpawnLogic,
        rng: StdRng,
        last_key: Option<String>,
        next_index: usize,
    },
}

/// Sliding window of live terrain segments.
///
/// Fixed levels are materialized in full at construction; endless levels
/// generate pattern by pattern ahead of the scroll. Both modes evict
/// segments that fall behind the despawn margin. Segments generated inside
/// the safe-zone distance spawn without obstacles so the opening stretch is
/// always survivable.
pub struct LevelStream {
    config: StreamConfig,
    mode: Mode,
    segments: VecDeque<Segment>,
    cursor_x: f32,
    level_length: Option<f32>,
}

impl LevelStream {
    pub fn new(level: &LevelDescriptor, config: StreamConfig, seed: u64) -> Self {
        let mut stream = match level.mode {
            LevelMode::Fixed => Self {
                config,
                mode: Mode::Fixed,
                segments: VecDeque::new(),
                cursor_x: 0.0,
                level_length: None,
            },
            LevelMode::Endless => {
                let mut patterns = level.patterns.clone();
                if patterns.is_empty() {
                    tracing::warn!("Endless level {} has no patterns, using a fallback", level.name);
                    patterns.push(Pattern {
                        id: None,
                        sections: vec![SectionSpec::fallback_straight()],
                    });
                }
                Self {
                    config,
                    mode: Mode::Endless {
                        patterns,
                        spawn: level.spawn_logic.clone(),
                        rng: StdRng::seed_from_u64(seed),
                        last_key: None,
                        next_index: 0,
                    },
                    segments: VecDeque::new(),
                    cursor_x: 0.0,
                    level_length: None,
                }
            },
        };

        // Both modes open with a plain stretch so the player can orient.
        stream.push_safe_zone();
        if let Mode::Fixed = stream.mode {
            for spec in &level.sections {
                stream.spawn_section(spec);
            }
            stream.level_length = Some(stream.cursor_x);
        }
        stream
    }

    fn push_safe_zone(&mut self) {
        let segment = safe_zone(self.cursor_x, self.config.safe_zone_length);
        self.cursor_x = segment.end_x();
        self.segments.push_back(segment);
    }

    /// `Some(total length)` for fixed levels, `None` for endless.
    pub fn level_length(&self) -> Option<f32> {
        self.level_length
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// World x up to which terrain has been generated.
    pub fn cursor_x(&self) -> f32 {
        self.cursor_x
    }

    /// Refill the given buffers with the live geometry. The caller reuses
    /// its allocations frame to frame.
    pub fn collect_view_into(
        &self,
        platforms: &mut Vec<Platform>,
        walls: &mut Vec<WallTile>,
        obstacles: &mut Vec<Obstacle>,
    ) {
        platforms.clear();
        walls.clear();
        obstacles.clear();
        for segment in &self.segments {
            platforms.extend_from_slice(&segment.platforms);
            walls.extend_from_slice(&segment.walls);
            obstacles.extend_from_slice(&segment.obstacles);
        }
    }

    /// Keep the window aligned with the scroll: spawn endless terrain out
    /// to the look-ahead distance, evict whatever fell behind the despawn
    /// margin.
    pub fn advance(&mut self, scroll: f32) -> StreamDelta {
        let mut delta = StreamDelta::default();

        let horizon = scroll + self.config.lookahead_factor * self.config.viewport_width;
        if matches!(self.mode, Mode::Endless { .. }) {
            while self.cursor_x < horizon {
                let before = self.cursor_x;
                delta.spawned += self.spawn_next_pattern();
                if self.cursor_x <= before {
                    // Degenerate pattern made no forward progress.
                    break;
                }
            }
        }

        let eviction_edge = scroll - self.config.despawn_margin;
        while let Some(front) = self.segments.front() {
            if front.end_x() >= eviction_edge {
                break;
            }
            if let Some(segment) = self.segments.pop_front() {
                tracing::debug!(
                    kind = ?segment.kind,
                    start_x = segment.start_x,
                    "evicting segment behind the despawn margin"
                );
                delta.evicted.push(segment);
            }
        }

        delta
    }

    fn spawn_section(&mut self, spec: &SectionSpec) {
        let mut segment = generate_segment(spec, self.cursor_x);
        // A segment whose cursor starts inside the safe zone spawns clean,
        // obstacles and all, not just the ones short of the boundary.
        if segment.start_x < self.config.safe_zone_distance {
            segment.obstacles.clear();
        }
        self.cursor_x = segment.end_x();
        self.segments.push_back(segment);
    }

    fn spawn_next_pattern(&mut self) -> usize {
        let Mode::Endless {
            patterns,
            spawn,
            rng,
            last_key,
            next_index,
        } = &mut self.mode
        else {
            return 0;
        };

        let index = match spawn.order {
            SpawnOrder::Sequential => {
                let index = *next_index % patterns.len();
                *next_index += 1;
                index
            },
            SpawnOrder::Random => {
                pick_random(patterns, rng, spawn.avoid_consecutive_same, last_key.as_deref())
            },
        };
        *last_key = Some(patterns[index].key(index));

        let sections: Vec<SectionSpec> = patterns[index].sections.clone();
        let mut spawned = 0;
        for spec in &sections {
            self.spawn_section(spec);
            spawned += 1;
        }
        spawned
    }
}

fn pick_random(
    patterns: &[Pattern],
    rng: &mut StdRng,
    avoid_consecutive_same: bool,
    last_key: Option<&str>,
) -> usize {
    if avoid_consecutive_same
        && patterns.len() > 1
        && let Some(last) = last_key
    {
        let candidates: Vec<usize> = (0..patterns.len())
            .filter(|&i| patterns[i].key(i) != last)
            .collect();
        if !candidates.is_empty() {
            return candidates[rng.random_range(0..candidates.len())];
        }
    }
    rng.random_range(0..patterns.len())
}
