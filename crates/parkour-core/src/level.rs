use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::terrain::SectionSpec;

/// Whether a level has a fixed end or streams forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelMode {
    #[default]
    Fixed,
    Endless,
}

/// How endless mode picks the next pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnOrder {
    Sequential,
    #[default]
    Random,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnLogic {
    pub order: SpawnOrder,
    pub avoid_consecutive_same: bool,
}

/// One endless-mode spawn unit: a named group of sections. Descriptors may
/// also list a bare section where a pattern is expected; it becomes a
/// one-section pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    #[serde(default)]
    pub id: Option<String>,
    pub sections: Vec<SectionSpec>,
}

impl Pattern {
    /// Identity used by `avoid_consecutive_same`: the declared id, else
    /// the pool index.
    pub fn key(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| index.to_string())
    }
}

/// A parsed level file. Fixed levels list `sections`; endless levels list
/// `patterns` plus `spawn_logic`.
#[derive(Debug, Clone, Serialize)]
pub struct LevelDescriptor {
    pub name: String,
    pub theme: Option<String>,
    pub mode: LevelMode,
    pub sections: Vec<SectionSpec>,
    pub patterns: Vec<Pattern>,
    pub spawn_logic: SpawnLogic,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawDescriptor {
    name: String,
    theme: Option<String>,
    mode: LevelMode,
    sections: Vec<Value>,
    patterns: Vec<Value>,
    spawn_logic: SpawnLogic,
}

impl Default for RawDescriptor {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            theme: None,
            mode: LevelMode::Fixed,
            sections: Vec::new(),
            patterns: Vec::new(),
            spawn_logic: SpawnLogic::default(),
        }
    }
}

/// Sections are parsed one at a time so a single unknown or malformed
/// entry degrades to a plain straight stretch instead of rejecting the
/// whole file.
fn parse_section(value: &Value, context: &str) -> SectionSpec {
    match serde_json::from_value::<SectionSpec>(value.clone()) {
        Ok(spec) => spec,
        Err(e) => {
            tracing::warn!("Unrecognized section in {context}: {e}, substituting straight");
            SectionSpec::fallback_straight()
        },
    }
}

fn parse_pattern(value: &Value, context: &str) -> Pattern {
    // A bare section object is promoted to a one-section pattern.
    if value.get("type").is_some() {
        return Pattern {
            id: None,
            sections: vec![parse_section(value, context)],
        };
    }
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string);
    let sections = value
        .get("sections")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| parse_section(entry, context))
                .collect()
        })
        .unwrap_or_default();
    Pattern { id, sections }
}

impl LevelDescriptor {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawDescriptor = serde_json::from_str(text)?;
        let name = raw.name;
        let sections = raw
            .sections
            .iter()
            .map(|v| parse_section(v, &name))
            .collect();
        let patterns = raw
            .patterns
            .iter()
            .map(|v| parse_pattern(v, &name))
            .collect();
        Ok(Self {
            name,
            theme: raw.theme,
            mode: raw.mode,
            sections,
            patterns,
            spawn_logic: raw.spawn_logic,
        })
    }

    /// Load a level file. Falls back to the built-in default level if the
    /// file is missing or unparseable.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => match Self::from_json(&text) {
                Ok(level) => level,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using default level", path.display());
                    Self::default_level()
                },
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using default level", path.display());
                Self::default_level()
            },
        }
    }

    /// A short fixed course exercising every terrain kind.
    pub fn default_level() -> Self {
        let json = r#"{
            "name": "training-grounds",
            "mode": "fixed",
            "sections": [
                { "type": "straight", "length": 800 },
                { "type": "stairs_up", "step_count": 4, "step_width": 90, "step_height": 40 },
                { "type": "straight", "length": 400,
                  "obstacles": [ { "x": 200, "kind": "real" } ] },
                { "type": "stairs_down", "step_count": 4, "step_width": 90, "step_height": 40 },
                { "type": "gap", "platforms": [
                    { "x": 120, "y_offset": 20, "width": 140 },
                    { "x": 340, "y_offset": 60, "width": 140 },
                    { "x": 560, "y_offset": 20, "width": 140 }
                ] },
                { "type": "wall_jump", "shaft_width": 70, "height": 160 },
                { "type": "straight", "length": 600 }
            ]
        }"#;
        Self::from_json(json).unwrap_or_else(|_| Self {
            name: "empty".to_string(),
            theme: None,
            mode: LevelMode::Fixed,
            sections: vec![SectionSpec::fallback_straight()],
            patterns: Vec::new(),
            spawn_logic: SpawnLogic::default(),
        })
    }
}

/// Persistent record of completed levels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    completed: BTreeSet<String>,
}

impl Progress {
    /// Load from disk. Missing or corrupt files yield empty progress
    /// rather than an error; a run must never be blocked by a bad save.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(progress) => progress,
                Err(e) => {
                    tracing::warn!("Corrupt progress file {}: {e}, starting fresh", path.display());
                    Self::default()
                },
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let text = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, text)
    }

    pub fn mark_completed(&mut self, level: &str) {
        self.completed.insert(level.to_string());
    }

    pub fn is_completed(&self, level: &str) -> bool {
        self.completed.contains(level)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::SegmentKind;

    #[test]
    fn fixed_descriptor_parses_sections_in_order() {
        let level = LevelDescriptor::from_json(
            r#"{
                "name": "demo",
                "theme": "ruins",
                "sections": [
                    { "type": "straight", "length": 500 },
                    { "type": "wall_jump", "shaft_width": 60, "height": 200 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(level.mode, LevelMode::Fixed);
        assert_eq!(level.theme.as_deref(), Some("ruins"));
        assert_eq!(level.sections.len(), 2);
        assert_eq!(level.sections[0].kind(), SegmentKind::Straight);
        assert_eq!(level.sections[1].kind(), SegmentKind::WallJump);
    }

    #[test]
    fn unknown_section_type_degrades_to_straight() {
        let level = LevelDescriptor::from_json(
            r#"{
                "name": "demo",
                "sections": [
                    { "type": "teleporter", "length": 100 },
                    { "type": "straight", "length": 300 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(level.sections.len(), 2);
        assert_eq!(level.sections[0].kind(), SegmentKind::Straight);
    }

    #[test]
    fn endless_descriptor_with_bare_section_patterns() {
        let level = LevelDescriptor::from_json(
            r#"{
                "name": "forever",
                "mode": "endless",
                "spawn_logic": { "order": "random", "avoid_consecutive_same": true },
                "patterns": [
                    { "type": "straight", "length": 400 },
                    { "id": "shaft", "sections": [
                        { "type": "wall_jump", "shaft_width": 60, "height": 160 }
                    ] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(level.mode, LevelMode::Endless);
        assert!(level.spawn_logic.avoid_consecutive_same);
        assert_eq!(level.patterns.len(), 2);
        assert_eq!(level.patterns[0].key(0), "0");
        assert_eq!(level.patterns[1].key(1), "shaft");
        assert_eq!(level.patterns[1].sections[0].kind(), SegmentKind::WallJump);
    }

    #[test]
    fn missing_file_yields_default_level() {
        let level = LevelDescriptor::load("/nonexistent/level.json");
        assert_eq!(level.name, "training-grounds");
        assert!(!level.sections.is_empty());
    }

    #[test]
    fn default_level_covers_every_kind() {
        let level = LevelDescriptor::default_level();
        for kind in [
            SegmentKind::Straight,
            SegmentKind::StairsUp,
            SegmentKind::StairsDown,
            SegmentKind::Gap,
            SegmentKind::WallJump,
        ] {
            assert!(
                level.sections.iter().any(|s| s.kind() == kind),
                "default level lacks {kind:?}"
            );
        }
    }

    #[test]
    fn progress_round_trips_and_tolerates_absence() {
        let mut progress = Progress::load("/nonexistent/progress.json");
        assert_eq!(progress.completed_count(), 0);

        progress.mark_completed("training-grounds");
        progress.mark_completed("training-grounds");
        assert!(progress.is_completed("training-grounds"));
        assert_eq!(progress.completed_count(), 1);

        let text = serde_json::to_string(&progress).unwrap();
        let restored: Progress = serde_json::from_str(&text).unwrap();
        assert!(restored.is_completed("training-grounds"));
    }
}
