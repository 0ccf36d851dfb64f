//! Data-driven game balance
//!
//! Every constant the simulation uses lives here so a JSON file can override
//! it. `Tuning::default()` is the shipped balance.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::consts::*;
use crate::error::TuningError;

/// Parameters for one spawn window category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowTuning {
    /// Vertical distance between successive spawns
    pub spacing: f32,
    /// Generation stops this far above the ground
    pub stop_buffer: f32,
    /// Extra lookahead when deciding whether to pre-spawn
    pub lookahead_margin: f32,
    /// Entities this far above the character are culled
    pub cull_margin: f32,
    /// Horizontal offset is sampled from [-range, range] on X and Z
    pub horizontal_range: f32,
    /// Jitter spawn height upward inside the spacing band
    pub vertical_jitter: bool,
    /// Pieces per spawn (clouds, terrain clusters)
    pub batch_size: u32,
    /// Scale is sampled from [1 - jitter, 1 + jitter]
    pub scale_jitter: f32,
}

impl WindowTuning {
    pub fn rings() -> Self {
        Self {
            spacing: 30.0,
            stop_buffer: 150.0,
            lookahead_margin: LOOKAHEAD_MARGIN,
            cull_margin: CULL_MARGIN,
            horizontal_range: 8.0,
            vertical_jitter: false,
            batch_size: 1,
            scale_jitter: 0.0,
        }
    }

    pub fn flyers() -> Self {
        Self {
            spacing: 60.0,
            stop_buffer: 150.0,
            horizontal_range: 10.0,
            ..Self::rings()
        }
    }

    pub fn clouds() -> Self {
        Self {
            spacing: 15.0,
            stop_buffer: 50.0,
            horizontal_range: 40.0,
            vertical_jitter: true,
            batch_size: 3,
            scale_jitter: 0.4,
            ..Self::rings()
        }
    }

    pub fn terrain() -> Self {
        Self {
            spacing: 40.0,
            stop_buffer: 0.0,
            horizontal_range: 60.0,
            vertical_jitter: true,
            batch_size: 4,
            scale_jitter: 0.5,
            ..Self::rings()
        }
    }

    fn validate(&self, category: &'static str) -> Result<(), TuningError> {
        if !(self.spacing > 0.0) {
            return Err(TuningError::InvalidSpacing {
                category,
                spacing: self.spacing,
            });
        }
        if self.lookahead_margin < 0.0 {
            return Err(TuningError::InvalidValue {
                name: "lookahead_margin",
                value: self.lookahead_margin,
            });
        }
        if self.cull_margin < 0.0 {
            return Err(TuningError::InvalidValue {
                name: "cull_margin",
                value: self.cull_margin,
            });
        }
        if !(0.0..1.0).contains(&self.scale_jitter) {
            return Err(TuningError::InvalidValue {
                name: "scale_jitter",
                value: self.scale_jitter,
            });
        }
        Ok(())
    }
}

/// Partial window settings; absent fields keep the category's defaults
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct WindowOverride {
    spacing: Option<f32>,
    stop_buffer: Option<f32>,
    lookahead_margin: Option<f32>,
    cull_margin: Option<f32>,
    horizontal_range: Option<f32>,
    vertical_jitter: Option<bool>,
    batch_size: Option<u32>,
    scale_jitter: Option<f32>,
}

impl WindowOverride {
    fn apply(self, base: WindowTuning) -> WindowTuning {
        WindowTuning {
            spacing: self.spacing.unwrap_or(base.spacing),
            stop_buffer: self.stop_buffer.unwrap_or(base.stop_buffer),
            lookahead_margin: self.lookahead_margin.unwrap_or(base.lookahead_margin),
            cull_margin: self.cull_margin.unwrap_or(base.cull_margin),
            horizontal_range: self.horizontal_range.unwrap_or(base.horizontal_range),
            vertical_jitter: self.vertical_jitter.unwrap_or(base.vertical_jitter),
            batch_size: self.batch_size.unwrap_or(base.batch_size),
            scale_jitter: self.scale_jitter.unwrap_or(base.scale_jitter),
        }
    }
}

fn ring_window<'de, D: Deserializer<'de>>(d: D) -> Result<WindowTuning, D::Error> {
    WindowOverride::deserialize(d).map(|o| o.apply(WindowTuning::rings()))
}

fn flyer_window<'de, D: Deserializer<'de>>(d: D) -> Result<WindowTuning, D::Error> {
    WindowOverride::deserialize(d).map(|o| o.apply(WindowTuning::flyers()))
}

fn cloud_window<'de, D: Deserializer<'de>>(d: D) -> Result<WindowTuning, D::Error> {
    WindowOverride::deserialize(d).map(|o| o.apply(WindowTuning::clouds()))
}

fn terrain_window<'de, D: Deserializer<'de>>(d: D) -> Result<WindowTuning, D::Error> {
    WindowOverride::deserialize(d).map(|o| o.apply(WindowTuning::terrain()))
}

/// Flyer movement parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyerTuning {
    /// Per-frame velocity cap (round scaling never exceeds 95% of this)
    pub max_velocity: f32,
    /// Target-point flyers never drift further than this from their target
    pub oscillation_radius: f32,
    pub turn_distance: f32,
    pub deadzone: f32,
    /// Per-frame probability of a spontaneous reversal
    pub flip_chance: f32,
    pub away_ms: u64,
}

impl Default for FlyerTuning {
    fn default() -> Self {
        Self {
            max_velocity: 0.3,
            oscillation_radius: 6.0,
            turn_distance: FLYER_TURN_DISTANCE,
            deadzone: FLYER_DEADZONE,
            flip_chance: FLYER_FLIP_CHANCE,
            away_ms: FLYER_AWAY_MS,
        }
    }
}

/// Falling character parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterTuning {
    pub start_y: f32,
    /// Added to fall velocity each frame (negative = downward)
    pub gravity: f32,
    /// Fall velocity never goes below this
    pub terminal_velocity: f32,
    /// Horizontal units per frame at full movement intent
    pub steer_speed: f32,
    /// Horizontal position is clamped to [-half_width, half_width]
    pub corridor_half_width: f32,
    /// Camera sits this far above the character
    pub camera_offset: f32,
}

impl Default for CharacterTuning {
    fn default() -> Self {
        Self {
            start_y: START_Y,
            gravity: -0.01,
            terminal_velocity: -0.6,
            steer_speed: 0.25,
            corridor_half_width: 10.0,
            camera_offset: 6.0,
        }
    }
}

/// Round/ground progression parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundTuning {
    pub initial_ground_level: f32,
    pub recession_per_round: f32,
    pub ground_floor: f32,
    pub end_margin: f32,
}

impl Default for RoundTuning {
    fn default() -> Self {
        Self {
            initial_ground_level: INITIAL_GROUND_LEVEL,
            recession_per_round: GROUND_RECESSION_PER_ROUND,
            ground_floor: GROUND_FLOOR,
            end_margin: ROUND_END_MARGIN,
        }
    }
}

/// Collision and vitals parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// A ray hit counts only below this distance
    pub threshold: f32,
    pub immunity_ms: u64,
    pub max_health: u32,
    pub ring_heal: u32,
    pub flyer_damage: u32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            threshold: COLLISION_THRESHOLD,
            immunity_ms: IMMUNITY_MS,
            max_health: MAX_HEALTH,
            ring_heal: RING_HEAL,
            flyer_damage: FLYER_DAMAGE,
        }
    }
}

/// Complete game balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    #[serde(deserialize_with = "ring_window")]
    pub rings: WindowTuning,
    #[serde(deserialize_with = "flyer_window")]
    pub flyers: WindowTuning,
    #[serde(deserialize_with = "cloud_window")]
    pub clouds: WindowTuning,
    #[serde(deserialize_with = "terrain_window")]
    pub terrain: WindowTuning,
    pub flyer: FlyerTuning,
    pub character: CharacterTuning,
    pub round: RoundTuning,
    pub collision: CollisionTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            rings: WindowTuning::rings(),
            flyers: WindowTuning::flyers(),
            clouds: WindowTuning::clouds(),
            terrain: WindowTuning::terrain(),
            flyer: FlyerTuning::default(),
            character: CharacterTuning::default(),
            round: RoundTuning::default(),
            collision: CollisionTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document (missing fields use defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every value the simulation relies on being in range
    pub fn validate(&self) -> Result<(), TuningError> {
        self.rings.validate("ring")?;
        self.flyers.validate("flyer")?;
        self.clouds.validate("cloud")?;
        self.terrain.validate("terrain")?;

        if !(0.0..=1.0).contains(&self.flyer.flip_chance) {
            return Err(TuningError::InvalidValue {
                name: "flyer.flip_chance",
                value: self.flyer.flip_chance,
            });
        }
        if self.flyer.max_velocity < 0.0 {
            return Err(TuningError::InvalidValue {
                name: "flyer.max_velocity",
                value: self.flyer.max_velocity,
            });
        }
        if self.round.ground_floor > self.round.initial_ground_level {
            return Err(TuningError::InvalidValue {
                name: "round.ground_floor",
                value: self.round.ground_floor,
            });
        }
        if self.collision.threshold <= 0.0 {
            return Err(TuningError::InvalidValue {
                name: "collision.threshold",
                value: self.collision.threshold,
            });
        }
        // Starting inside the round-end band would end round 1 on its first frame
        if self.character.start_y < self.round.initial_ground_level + self.round.end_margin {
            return Err(TuningError::InvalidValue {
                name: "character.start_y",
                value: self.character.start_y,
            });
        }
        if self.character.terminal_velocity > 0.0 {
            return Err(TuningError::InvalidValue {
                name: "character.terminal_velocity",
                value: self.character.terminal_velocity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_margins_kept_separate() {
        let tuning = Tuning::default();
        assert_eq!(tuning.rings.lookahead_margin, 50.0);
        assert_eq!(tuning.rings.cull_margin, 20.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "flyer": { "max_velocity": 0.5 } }"#).unwrap();
        assert_eq!(tuning.flyer.max_velocity, 0.5);
        assert_eq!(tuning.flyer.away_ms, FLYER_AWAY_MS);
        assert_eq!(tuning.rings, WindowTuning::rings());
    }

    #[test]
    fn test_partial_window_override_keeps_category_defaults() {
        let tuning = Tuning::from_json(r#"{ "rings": { "spacing": 20.0 }, "clouds": { "batch_size": 5 } }"#)
            .unwrap();
        assert_eq!(tuning.rings.spacing, 20.0);
        assert_eq!(tuning.rings.stop_buffer, WindowTuning::rings().stop_buffer);
        assert_eq!(tuning.clouds.batch_size, 5);
        assert_eq!(tuning.clouds.scale_jitter, WindowTuning::clouds().scale_jitter);
        assert!(tuning.clouds.vertical_jitter);
        assert_eq!(tuning.terrain, WindowTuning::terrain());
    }

    #[test]
    fn test_rejects_unknown_window_field() {
        assert!(matches!(
            Tuning::from_json(r#"{ "rings": { "spacnig": 20.0 } }"#),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_start_inside_round_end_band() {
        let mut tuning = Tuning::default();
        tuning.character.start_y = -50.0;
        match tuning.validate() {
            Err(TuningError::InvalidValue { name, .. }) => assert_eq!(name, "character.start_y"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_non_positive_spacing() {
        let mut tuning = Tuning::default();
        tuning.clouds.spacing = 0.0;
        match tuning.validate() {
            Err(TuningError::InvalidSpacing { category, .. }) => assert_eq!(category, "cloud"),
            other => panic!("expected InvalidSpacing, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_preserves_defaults() {
        let json = Tuning::default().to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), Tuning::default());
    }
}
