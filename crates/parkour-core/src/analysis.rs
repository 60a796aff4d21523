//! Offline level tooling: difficulty metrics, playability validation, and
//! seeded random level generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::geom::ObstacleKind;
use crate::level::{LevelDescriptor, LevelMode, SpawnLogic};
use crate::terrain::{generate_segment, ObstacleSpec, ObstacleY, SectionSpec, Segment};

/// Obstacles closer than this are flagged as likely unfair.
pub const MIN_OBSTACLE_SPACING: f32 = 60.0;
/// Horizontal gap between platforms beyond which a jump is unreachable.
pub const MAX_JUMPABLE_GAP: f32 = 250.0;

/// Summary metrics for a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyReport {
    pub length: f32,
    pub section_count: usize,
    pub real_obstacles: usize,
    pub fake_obstacles: usize,
    pub obstacles_per_1000: f32,
    /// 1 (easy) to 5 (brutal), from obstacle density.
    pub score: u8,
}

fn materialize(level: &LevelDescriptor) -> Vec<Segment> {
    let sections: Vec<&SectionSpec> = match level.mode {
        LevelMode::Fixed => level.sections.iter().collect(),
        // Endless levels are scored on one pass through the pattern pool.
        LevelMode::Endless => level
            .patterns
            .iter()
            .flat_map(|p| p.sections.iter())
            .collect(),
    };
    let mut cursor = 0.0;
    let mut segments = Vec::with_capacity(sections.len());
    for spec in sections {
        let segment = generate_segment(spec, cursor);
        cursor = segment.end_x();
        segments.push(segment);
    }
    segments
}

pub fn analyze(level: &LevelDescriptor) -> DifficultyReport {
    let segments = materialize(level);
    let length = segments.last().map(Segment::end_x).unwrap_or(0.0);
    let mut real = 0;
    let mut fake = 0;
    for segment in &segments {
        for obstacle in &segment.obstacles {
            match obstacle.kind {
                ObstacleKind::Real => real += 1,
                ObstacleKind::Fake => fake += 1,
            }
        }
    }
    let per_1000 = if length > 0.0 {
        (real + fake) as f32 * 1000.0 / length
    } else {
        0.0
    };
    let score = match per_1000 {
        d if d < 2.0 => 1,
        d if d < 4.0 => 2,
        d if d < 6.0 => 3,
        d if d < 8.0 => 4,
        _ => 5,
    };
    DifficultyReport {
        length,
        section_count: segments.len(),
        real_obstacles: real,
        fake_obstacles: fake,
        obstacles_per_1000: per_1000,
        score,
    }
}

/// Check a level for layouts the physics cannot reward: returns
/// human-readable warnings, empty when the level looks playable.
pub fn validate(level: &LevelDescriptor) -> Vec<String> {
    let mut warnings = Vec::new();

    match level.mode {
        LevelMode::Fixed if level.sections.is_empty() => {
            warnings.push("fixed level has no sections".to_string());
        },
        LevelMode::Endless if level.patterns.is_empty() => {
            warnings.push("endless level has no patterns".to_string());
        },
        _ => {},
    }

    let segments = materialize(level);

    let mut obstacle_xs: Vec<f32> = segments
        .iter()
        .flat_map(|s| s.obstacles.iter().map(|o| o.world_x))
        .collect();
    obstacle_xs.sort_by(f32::total_cmp);
    for pair in obstacle_xs.windows(2) {
        let spacing = pair[1] - pair[0];
        if spacing < MIN_OBSTACLE_SPACING {
            warnings.push(format!(
                "obstacles at x={:.0} and x={:.0} are only {spacing:.0} apart",
                pair[0], pair[1]
            ));
        }
    }

    for segment in &segments {
        let mut platforms = segment.platforms.clone();
        platforms.sort_by(|a, b| a.origin_x.total_cmp(&b.origin_x));
        for pair in platforms.windows(2) {
            let gap = pair[1].origin_x - pair[0].right();
            if gap > MAX_JUMPABLE_GAP {
                warnings.push(format!(
                    "unjumpable {gap:.0}-unit gap after platform at x={:.0}",
                    pair[0].origin_x
                ));
            }
        }
    }

    warnings
}

/// Per-tier generation parameters: obstacle spacing band and decoy share.
fn tier_params(difficulty: u8) -> (f32, f32, f64) {
    match difficulty {
        0 | 1 => (150.0, 250.0, 0.3),
        2 => (120.0, 200.0, 0.4),
        3 => (100.0, 150.0, 0.5),
        4 => (80.0, 120.0, 0.65),
        _ => (70.0, 100.0, 0.8),
    }
}

/// Generate a fixed level of `section_count` sections at the given
/// difficulty. Deterministic for a given seed.
pub fn generate_random_level(difficulty: u8, section_count: usize, seed: u64) -> LevelDescriptor {
    let (min_spacing, max_spacing, fake_share) = tier_params(difficulty);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sections = Vec::with_capacity(section_count);

    for i in 0..section_count {
        // Alternate runs with features; always open with a plain run.
        let roll = if i == 0 { 0 } else { rng.random_range(0..4) };
        let section = match roll {
            0 => {
                let length = rng.random_range(500.0..900.0);
                let mut obstacles = Vec::new();
                let mut x = rng.random_range(min_spacing..max_spacing);
                while x < length - 50.0 {
                    let kind = if rng.random_bool(fake_share) {
                        ObstacleKind::Fake
                    } else {
                        ObstacleKind::Real
                    };
                    obstacles.push(ObstacleSpec {
                        x,
                        y: ObstacleY::default(),
                        kind,
                    });
                    x += rng.random_range(min_spacing..max_spacing);
                }
                SectionSpec::Straight {
                    length,
                    platform_y: None,
                    obstacles,
                }
            },
            1 => SectionSpec::StairsUp(stairs(&mut rng)),
            2 => SectionSpec::StairsDown(stairs(&mut rng)),
            _ => SectionSpec::WallJump {
                shaft_width: rng.random_range(50.0..90.0),
                height: rng.random_range(120.0..240.0),
                entry_length: 120.0,
                exit_length: 120.0,
            },
        };
        sections.push(section);
    }

    LevelDescriptor {
        name: format!("generated-d{}", difficulty.clamp(1, 5)),
        theme: None,
        mode: LevelMode::Fixed,
        sections,
        patterns: Vec::new(),
        spawn_logic: SpawnLogic::default(),
    }
}

fn stairs(rng: &mut StdRng) -> crate::terrain::StairsSpec {
    crate::terrain::StairsSpec {
        step_count: rng.random_range(3..6),
        step_width: rng.random_range(70.0..110.0),
        step_height: 40.0,
        obstacles: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_scores_low_and_validates_clean() {
        let level = LevelDescriptor::default_level();
        let report = analyze(&level);
        assert!(report.length > 0.0);
        assert_eq!(report.real_obstacles, 1);
        assert!(report.score <= 2);
        assert!(validate(&level).is_empty(), "{:?}", validate(&level));
    }

    #[test]
    fn crowded_obstacles_are_flagged() {
        let level = LevelDescriptor::from_json(
            r#"{
                "name": "unfair",
                "sections": [
                    { "type": "straight", "length": 600, "obstacles": [
                        { "x": 300, "kind": "real" },
                        { "x": 330, "kind": "real" }
                    ] }
                ]
            }"#,
        )
        .unwrap();
        let warnings = validate(&level);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("apart"));
    }

    #[test]
    fn unjumpable_gap_is_flagged() {
        let level = LevelDescriptor::from_json(
            r#"{
                "name": "chasm",
                "sections": [
                    { "type": "gap", "platforms": [
                        { "x": 0, "width": 100 },
                        { "x": 500, "width": 100 }
                    ] }
                ]
            }"#,
        )
        .unwrap();
        let warnings = validate(&level);
        assert!(warnings.iter().any(|w| w.contains("unjumpable")));
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = generate_random_level(3, 8, 42);
        let b = generate_random_level(3, 8, 42);
        assert_eq!(
            serde_json::to_string(&a.sections).unwrap(),
            serde_json::to_string(&b.sections).unwrap()
        );
        let c = generate_random_level(3, 8, 43);
        assert_ne!(
            serde_json::to_string(&a.sections).unwrap(),
            serde_json::to_string(&c.sections).unwrap()
        );
    }

    #[test]
    fn difficulty_raises_obstacle_density() {
        // One section: the opener is always a straight with obstacles, so
        // the two tiers draw the same length and differ only in spacing.
        let easy = analyze(&generate_random_level(1, 1, 7));
        let hard = analyze(&generate_random_level(5, 1, 7));
        assert_eq!(easy.length, hard.length);
        assert!(
            hard.obstacles_per_1000 > easy.obstacles_per_1000,
            "hard {} vs easy {}",
            hard.obstacles_per_1000,
            easy.obstacles_per_1000
        );
    }

    #[test]
    fn endless_levels_are_scored_on_the_pattern_pool() {
        let level = LevelDescriptor::from_json(
            r#"{
                "name": "forever",
                "mode": "endless",
                "patterns": [
                    { "type": "straight", "length": 500,
                      "obstacles": [ { "x": 250, "kind": "illusion" } ] }
                ]
            }"#,
        )
        .unwrap();
        let report = analyze(&level);
        assert_eq!(report.fake_obstacles, 1);
        assert_eq!(report.length, 500.0);
    }
}
