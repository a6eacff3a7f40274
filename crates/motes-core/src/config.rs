//! Engine configuration. Every field has a default so a TOML file only needs to name what it
//! changes. Frame-based values (lives, speeds) are per display frame; `_ms` values are engine
//! clock milliseconds.

use std::path::Path;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Orbit around a resting pointer, trails while moving, click and long-press gestures.
    #[default]
    Orbit,
    /// Glowing head with a tail and click sparks.
    Meteor,
}

impl EffectKind {
    pub const ALL: [EffectKind; 2] = [EffectKind::Orbit, EffectKind::Meteor];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Orbit => "orbit",
            EffectKind::Meteor => "meteor",
        }
    }
}

/// What a double-click does after its two constituent clicks already fired. Only the orbit
/// effect reacts to double-clicks; the meteor effect ignores them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubleClickPolicy {
    /// The double-click is absorbed when it lands where a click effect just fired.
    #[default]
    Once,
    /// The double-click applies the click effect again.
    Repeat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookConfig {
    pub particle_size: f32,
    pub color: Vec4,
}

impl Default for LookConfig {
    fn default() -> Self {
        Self {
            particle_size: 2.0,
            color: Vec4::new(1.0, 1.0, 1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub max_particles: usize,
    pub stationary_threshold_ms: f64,

    pub orbital_count: usize,
    pub radius_min: f32,
    pub radius_max: f32,
    /// Radians per frame.
    pub base_speed: f32,
    pub speed_variation: f32,

    pub shrink_speed: f32,
    pub shrink_snap: f32,
    pub shrink_life: f32,

    pub disperse_speed: f32,
    pub disperse_life: f32,
    pub disperse_snap: f32,
    pub disperse_opacity: f32,

    pub trail_per_frame: usize,
    pub trail_life_min: f32,
    pub trail_life_max: f32,
    /// Full width of the square a trail particle is scattered in around the pointer.
    pub trail_jitter: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            max_particles: 2000,
            stationary_threshold_ms: 150.0,
            orbital_count: 60,
            radius_min: 20.0,
            radius_max: 40.0,
            base_speed: 0.01,
            speed_variation: 0.02,
            shrink_speed: 0.15,
            shrink_snap: 5.0,
            shrink_life: 75.0,
            disperse_speed: 0.08,
            disperse_life: 90.0,
            disperse_snap: 2.0,
            disperse_opacity: 0.1,
            trail_per_frame: 2,
            trail_life_min: 20.0,
            trail_life_max: 50.0,
            trail_jitter: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// With gestures off the orbit effect ignores clicks and presses entirely.
    pub enabled: bool,
    pub click_shrink_life: f32,
    pub event_shrink_speed: f32,
    pub double_click: DoubleClickPolicy,
    pub double_click_window_ms: f64,

    pub long_press_threshold_ms: f64,
    pub long_press_tolerance_px: f32,
    pub long_press_shrink_life: f32,

    pub explode_base_speed: f32,
    pub explode_boost_per_100ms: f32,
    pub explode_life: f32,
    /// Explosions carry at least `orbital_count * explode_min_fraction` particles.
    pub explode_min_fraction: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            click_shrink_life: 25.0,
            event_shrink_speed: 0.25,
            double_click: DoubleClickPolicy::Once,
            double_click_window_ms: 500.0,
            long_press_threshold_ms: 400.0,
            long_press_tolerance_px: 10.0,
            long_press_shrink_life: 35.0,
            explode_base_speed: 0.8,
            explode_boost_per_100ms: 0.2,
            explode_life: 100.0,
            explode_min_fraction: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeteorConfig {
    pub max_particles: usize,
    pub stationary_check_ms: f64,

    pub head_core_size: f32,
    pub glow_size_factor: f32,
    pub brightness_stationary: f32,
    pub brightness_moving: f32,

    pub tail_size_min: f32,
    pub tail_size_max: f32,
    pub tail_life_min: f32,
    pub tail_life_max: f32,
    pub tail_opacity_base: f32,
    pub min_dist_for_tail: f32,
    pub px_per_extra_tail: f32,
    pub max_tail_per_frame: usize,

    pub spark_count: usize,
    pub spark_life_min: f32,
    pub spark_life_max: f32,
    pub spark_size_min: f32,
    pub spark_size_max: f32,
    pub spark_speed_min: f32,
    pub spark_speed_max: f32,
    pub spark_drag: f32,
    pub spark_opacity_base: f32,

    pub flare_frames: u32,
    pub flare_brightness_boost: f32,
    pub flare_size_boost: f32,
}

impl Default for MeteorConfig {
    fn default() -> Self {
        Self {
            max_particles: 5000,
            stationary_check_ms: 100.0,
            head_core_size: 2.5,
            glow_size_factor: 4.0,
            brightness_stationary: 1.2,
            brightness_moving: 2.0,
            tail_size_min: 1.8,
            tail_size_max: 4.8,
            tail_life_min: 25.0,
            tail_life_max: 50.0,
            tail_opacity_base: 0.7,
            min_dist_for_tail: 1.0,
            px_per_extra_tail: 2.0,
            max_tail_per_frame: 10,
            spark_count: 200,
            spark_life_min: 50.0,
            spark_life_max: 200.0,
            spark_size_min: 0.8,
            spark_size_max: 10.0,
            spark_speed_min: 1.0,
            spark_speed_max: 40.0,
            spark_drag: 0.56,
            spark_opacity_base: 0.9,
            flare_frames: 8,
            flare_brightness_boost: 1.8,
            flare_size_boost: 1.3,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub effect: EffectKind,
    /// Fixed RNG seed; `None` seeds from the OS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub look: LookConfig,
    pub orbit: OrbitConfig,
    pub gestures: GestureConfig,
    pub meteor: MeteorConfig,
}

impl EngineConfig {
    pub fn for_effect(effect: EffectKind) -> Self {
        Self {
            effect,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Upper bound on live particles for the selected effect.
    pub fn max_particles(&self) -> usize {
        match self.effect {
            EffectKind::Orbit => self.orbit.max_particles,
            EffectKind::Meteor => self.meteor.max_particles,
        }
    }

    pub fn validate(&self) -> Result<()> {
        fn ordered(name: &str, min: f32, max: f32) -> Result<()> {
            if min > max {
                return Err(EngineError::InvalidConfig(format!(
                    "{name}: min {min} exceeds max {max}"
                )));
            }
            Ok(())
        }
        fn positive(name: &str, value: f32) -> Result<()> {
            if value.is_nan() || value <= 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
            Ok(())
        }

        positive("look.particle_size", self.look.particle_size)?;
        ordered("orbit.radius", self.orbit.radius_min, self.orbit.radius_max)?;
        ordered(
            "orbit.trail_life",
            self.orbit.trail_life_min,
            self.orbit.trail_life_max,
        )?;
        positive("orbit.shrink_life", self.orbit.shrink_life)?;
        positive("orbit.disperse_life", self.orbit.disperse_life)?;
        positive("gestures.click_shrink_life", self.gestures.click_shrink_life)?;
        positive(
            "gestures.long_press_shrink_life",
            self.gestures.long_press_shrink_life,
        )?;
        positive("gestures.explode_life", self.gestures.explode_life)?;
        ordered(
            "meteor.tail_size",
            self.meteor.tail_size_min,
            self.meteor.tail_size_max,
        )?;
        ordered(
            "meteor.tail_life",
            self.meteor.tail_life_min,
            self.meteor.tail_life_max,
        )?;
        ordered(
            "meteor.spark_life",
            self.meteor.spark_life_min,
            self.meteor.spark_life_max,
        )?;
        ordered(
            "meteor.spark_size",
            self.meteor.spark_size_min,
            self.meteor.spark_size_max,
        )?;
        ordered(
            "meteor.spark_speed",
            self.meteor.spark_speed_min,
            self.meteor.spark_speed_max,
        )?;
        positive("meteor.px_per_extra_tail", self.meteor.px_per_extra_tail)?;
        positive("meteor.tail_life_min", self.meteor.tail_life_min)?;
        positive("meteor.spark_life_min", self.meteor.spark_life_min)?;
        if self.max_particles() == 0 {
            return Err(EngineError::InvalidConfig(
                "max_particles must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.effect, EffectKind::Orbit);
        assert_eq!(config.orbit.orbital_count, 60);
        assert_eq!(config.gestures.long_press_threshold_ms, 400.0);
        assert_eq!(config.meteor.spark_count, 200);
        assert!(config.seed.is_none());
    }

    #[test]
    fn partial_tables_override_only_named_fields() {
        let config = EngineConfig::from_toml_str(
            r#"
            effect = "meteor"
            seed = 7

            [look]
            color = [1.0, 0.5, 0.0, 1.0]

            [orbit]
            orbital_count = 12

            [gestures]
            double_click = "repeat"
            "#,
        )
        .unwrap();
        assert_eq!(config.effect, EffectKind::Meteor);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.look.color, Vec4::new(1.0, 0.5, 0.0, 1.0));
        assert_eq!(config.look.particle_size, 2.0);
        assert_eq!(config.orbit.orbital_count, 12);
        assert_eq!(config.orbit.radius_max, 40.0);
        assert_eq!(config.gestures.double_click, DoubleClickPolicy::Repeat);
        assert_eq!(config.max_particles(), 5000);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = EngineConfig::from_toml_str("[orbit]\nradius_min = 50.0\nradius_max = 10.0\n")
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_effect_is_a_parse_error() {
        let err = EngineConfig::from_toml_str("effect = \"fireworks\"").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[orbit]\ntrail_per_frame = 4").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.orbit.trail_per_frame, 4);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }

    #[test]
    fn serialized_defaults_parse_back() {
        let text = toml::to_string(&EngineConfig::default()).unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.orbit.shrink_life, 75.0);
        assert_eq!(parsed.meteor.flare_frames, 8);
    }
}
