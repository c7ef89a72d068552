//! Level descriptors and the built-in level table
//!
//! A descriptor lists authored obstacles by gap centre and height; the floor
//! is drawn from `floor_range` when the level is loaded.

use std::collections::BTreeMap;

use rand::distr::Uniform;
use serde::{Deserialize, Serialize};

use crate::error::LevelError;

/// Level used when an unknown id is requested
pub const DEFAULT_LEVEL_ID: &str = "marathon";

/// Inclusive range the floor height is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorRange {
    pub min: f32,
    pub max: f32,
}

impl FloorRange {
    /// Sampler for the floor height
    pub fn sampler(&self) -> Result<Uniform<f32>, LevelError> {
        Uniform::new_inclusive(self.min, self.max).map_err(|err| {
            LevelError::UnsampleableFloorRange {
                min: self.min,
                max: self.max,
                reason: err.to_string(),
            }
        })
    }
}

/// One authored obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleSpec {
    #[serde(alias = "xPosition")]
    pub x: f32,
    #[serde(alias = "gapCenter")]
    pub gap_center_y: f32,
    pub gap_height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "floor")]
    pub floor_range: FloorRange,
    #[serde(default, alias = "pipes")]
    pub obstacles: Vec<ObstacleSpec>,
}

impl LevelDescriptor {
    /// Parse and validate a descriptor from JSON
    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let descriptor: LevelDescriptor = serde_json::from_str(json)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Reject descriptors that cannot produce a playable run.
    ///
    /// Gaps that close after floor clipping are caught at load time, once
    /// the floor is known.
    pub fn validate(&self) -> Result<(), LevelError> {
        let range = self.floor_range;
        if !range.min.is_finite() {
            return Err(LevelError::NonFinite {
                field: "floorRange.min",
            });
        }
        if !range.max.is_finite() {
            return Err(LevelError::NonFinite {
                field: "floorRange.max",
            });
        }
        if range.min > range.max {
            return Err(LevelError::InvertedFloorRange {
                min: range.min,
                max: range.max,
            });
        }
        range.sampler()?;

        for (index, spec) in self.obstacles.iter().enumerate() {
            if !spec.x.is_finite() {
                return Err(LevelError::NonFinite { field: "x" });
            }
            if !spec.gap_center_y.is_finite() {
                return Err(LevelError::NonFinite {
                    field: "gapCenterY",
                });
            }
            if !spec.gap_height.is_finite() || spec.gap_height <= 0.0 {
                return Err(LevelError::NonPositiveGap {
                    index,
                    gap_height: spec.gap_height,
                });
            }
        }
        Ok(())
    }
}

/// Catalog entry exposed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Levels addressable by id, with a guaranteed fallback
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels: BTreeMap<String, LevelDescriptor>,
    default_id: String,
    fallback: LevelDescriptor,
}

impl LevelCatalog {
    /// The shipped level table
    pub fn builtin() -> Self {
        let mut levels = BTreeMap::new();
        levels.insert("simple".to_string(), simple());
        levels.insert("medium".to_string(), medium());
        levels.insert("hard".to_string(), hard());
        levels.insert("floor_test".to_string(), floor_test());
        levels.insert(DEFAULT_LEVEL_ID.to_string(), marathon());
        Self {
            levels,
            default_id: DEFAULT_LEVEL_ID.to_string(),
            fallback: marathon(),
        }
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn get(&self, id: &str) -> Option<&LevelDescriptor> {
        self.levels.get(id)
    }

    /// Look up a level, falling back to the default for unknown ids.
    /// Returns the id that was actually resolved.
    pub fn resolve<'a>(&'a self, id: &'a str) -> (&'a str, &'a LevelDescriptor) {
        match self.levels.get(id) {
            Some(level) => (id, level),
            None => {
                log::warn!("Unknown level '{}', falling back to '{}'", id, self.default_id);
                (&self.default_id, &self.fallback)
            }
        }
    }

    /// Add or replace a level after validating it
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        descriptor: LevelDescriptor,
    ) -> Result<(), LevelError> {
        descriptor.validate()?;
        let id = id.into();
        if id == self.default_id {
            self.fallback = descriptor.clone();
        }
        self.levels.insert(id, descriptor);
        Ok(())
    }

    /// Id, name and description of every level, ordered by id
    pub fn summaries(&self) -> Vec<LevelSummary> {
        self.levels
            .iter()
            .map(|(id, level)| LevelSummary {
                id: id.clone(),
                name: level.name.clone(),
                description: level.description.clone(),
            })
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn spec(x: f32, gap_center_y: f32, gap_height: f32) -> ObstacleSpec {
    ObstacleSpec {
        x,
        gap_center_y,
        gap_height,
    }
}

fn level(
    name: &str,
    description: &str,
    min: f32,
    max: f32,
    obstacles: Vec<ObstacleSpec>,
) -> LevelDescriptor {
    LevelDescriptor {
        name: name.to_string(),
        description: description.to_string(),
        floor_range: FloorRange { min, max },
        obstacles,
    }
}

fn simple() -> LevelDescriptor {
    level(
        "Simple (1 Pipe)",
        "Single pipe to test basic logic",
        500.0,
        600.0,
        vec![spec(400.0, 300.0, 150.0)],
    )
}

fn medium() -> LevelDescriptor {
    level(
        "Medium (5 Pipes)",
        "Five pipes with varying gaps",
        480.0,
        600.0,
        vec![
            spec(400.0, 300.0, 150.0),
            spec(650.0, 250.0, 150.0),
            spec(900.0, 350.0, 140.0),
            spec(1150.0, 280.0, 160.0),
            spec(1400.0, 320.0, 150.0),
        ],
    )
}

fn hard() -> LevelDescriptor {
    level(
        "Hard (10 Pipes)",
        "Ten pipes with challenging gaps",
        450.0,
        600.0,
        vec![
            spec(400.0, 300.0, 150.0),
            spec(650.0, 200.0, 140.0),
            spec(900.0, 380.0, 140.0),
            spec(1150.0, 250.0, 145.0),
            spec(1400.0, 350.0, 140.0),
            spec(1650.0, 220.0, 150.0),
            spec(1900.0, 330.0, 140.0),
            spec(2150.0, 270.0, 145.0),
            spec(2400.0, 310.0, 140.0),
            spec(2650.0, 290.0, 150.0),
        ],
    )
}

fn floor_test() -> LevelDescriptor {
    level(
        "Floor Test",
        "No pipes, only a randomized floor",
        450.0,
        550.0,
        Vec::new(),
    )
}

fn marathon() -> LevelDescriptor {
    // Gap centres cycle 150..=510, heights cycle 140..=180
    let obstacles = (0..200u16)
        .map(|i| {
            spec(
                450.0 + f32::from(i) * 200.0,
                150.0 + f32::from(i % 10) * 40.0,
                140.0 + f32::from(i % 5) * 10.0,
            )
        })
        .collect();
    level(
        "Marathon (200 Pipes!)",
        "Ultimate stress test with 200 pipes",
        480.0,
        580.0,
        obstacles,
    )
}
