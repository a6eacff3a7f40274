//! Meteor effect: a glowing head rides the pointer, drops a tail along its path and throws
//! sparks on click.

use glam::Vec2;
use rand::Rng;
use tracing::debug;

use super::{random_direction, uniform, Effect, Scene};
use crate::config::{EffectKind, EngineConfig, MeteorConfig};
use crate::gesture::Gesture;
use crate::particle::{Particle, ParticleState};

const MIN_SIZE: f32 = 0.1;
/// Resting core size relative to `head_core_size`.
const STATIONARY_CORE_FACTOR: f32 = 0.8;

/// Pointer marker as of the last frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Head {
    pub pos: Vec2,
    pub core_size: f32,
    pub glow_size: f32,
    pub brightness: f32,
    /// sin(π × remaining flare fraction); 0 when not flaring.
    pub shine: f32,
    pub flaring: bool,
}

pub struct MeteorEffect {
    config: MeteorConfig,
    moving: bool,
    flare_remaining: u32,
    head: Head,
}

impl MeteorEffect {
    pub fn new(config: &EngineConfig) -> Self {
        let meteor = config.meteor.clone();
        let core_size = meteor.head_core_size;
        Self {
            head: Head {
                pos: Vec2::ZERO,
                core_size,
                glow_size: core_size * meteor.glow_size_factor,
                brightness: meteor.brightness_stationary,
                shine: 0.0,
                flaring: false,
            },
            config: meteor,
            moving: false,
            flare_remaining: 0,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn flare_remaining(&self) -> u32 {
        self.flare_remaining
    }

    /// Number of tail particles for a frame that covered `distance` pixels.
    pub fn tail_count(&self, distance: f32) -> usize {
        let c = &self.config;
        if distance < c.min_dist_for_tail {
            return 0;
        }
        let extra = ((distance - c.min_dist_for_tail) / c.px_per_extra_tail).floor() as usize;
        (1 + extra).min(c.max_tail_per_frame)
    }

    fn update_head(&mut self, pos: Vec2) {
        let c = &self.config;
        let (base_brightness, base_core) = if self.moving {
            (c.brightness_moving, c.head_core_size)
        } else {
            (
                c.brightness_stationary,
                c.head_core_size * STATIONARY_CORE_FACTOR,
            )
        };

        self.head.pos = pos;
        if self.flare_remaining > 0 {
            let pulse = flare_pulse(self.flare_remaining, c.flare_frames);
            self.head.brightness = base_brightness * (1.0 + (c.flare_brightness_boost - 1.0) * pulse);
            self.head.core_size = base_core * (1.0 + (c.flare_size_boost - 1.0) * pulse);
            self.flare_remaining -= 1;
        } else {
            self.head.brightness = base_brightness;
            self.head.core_size = base_core;
        }
        self.head.glow_size = self.head.core_size * c.glow_size_factor;
        self.head.flaring = self.flare_remaining > 0;
        self.head.shine = if self.head.flaring {
            flare_pulse(self.flare_remaining, c.flare_frames)
        } else {
            0.0
        };
    }

    fn spawn_tail(&mut self, scene: &mut Scene<'_>) {
        let from = scene.pointer.prev;
        let to = scene.pointer.pos;
        let n = self.tail_count(from.distance(to));
        let c = &self.config;
        for i in 0..n {
            let t = if n > 1 {
                (i as f32 + 0.5) / n as f32
            } else {
                0.5
            };
            let size = uniform(scene.rng, c.tail_size_min, c.tail_size_max);
            let life = uniform(scene.rng, c.tail_life_min, c.tail_life_max);
            let opacity = uniform(scene.rng, c.tail_opacity_base, 1.0);
            let Some(p) = scene.field.spawn(
                from.lerp(to, t),
                size,
                life,
                ParticleState::Tail { initial_size: size },
            ) else {
                break;
            };
            p.opacity = opacity;
        }
    }

    fn burst(&mut self, scene: &mut Scene<'_>, at: Vec2) {
        self.flare_remaining = self.config.flare_frames;
        let c = &self.config;
        let mut spawned = 0;
        for _ in 0..c.spark_count {
            let size = uniform(scene.rng, c.spark_size_min, c.spark_size_max);
            let life = uniform(scene.rng, c.spark_life_min, c.spark_life_max);
            let speed = uniform(scene.rng, c.spark_speed_min, c.spark_speed_max);
            let vel = random_direction(scene.rng) * speed;
            let opacity = uniform(scene.rng, c.spark_opacity_base, 1.0);
            let Some(p) =
                scene
                    .field
                    .spawn(at, size, life, ParticleState::Spark { initial_size: size })
            else {
                break;
            };
            p.vel = vel;
            p.opacity = opacity;
            spawned += 1;
        }
        debug!(?at, spawned, "sparks");
    }
}

fn flare_pulse(remaining: u32, frames: u32) -> f32 {
    if frames == 0 {
        return 0.0;
    }
    (std::f32::consts::PI * remaining as f32 / frames as f32).sin()
}

fn step_particle(p: &mut Particle, config: &MeteorConfig, rng: &mut impl Rng) {
    let ratio = p.life / p.initial_life;
    match p.state {
        ParticleState::Tail { initial_size } => {
            p.vel = Vec2::ZERO;
            p.opacity = ratio * uniform(rng, config.tail_opacity_base, 1.0);
            p.size = initial_size * ratio;
        }
        ParticleState::Spark { initial_size } => {
            p.pos += p.vel;
            p.vel *= config.spark_drag;
            p.opacity = ratio * uniform(rng, config.spark_opacity_base, 1.0);
            p.size = initial_size * (0.5 + ratio * 0.5);
        }
        _ => {
            p.pos += p.vel;
            p.opacity = ratio.max(0.0);
        }
    }
    p.size = p.size.max(MIN_SIZE);
}

impl Effect for MeteorEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Meteor
    }

    fn on_gesture(&mut self, scene: &mut Scene<'_>, gesture: Gesture) {
        match gesture {
            Gesture::Moved(_) => self.moving = true,
            Gesture::Entered => {
                self.moving = true;
                scene.pointer.last_move_ms = scene.now_ms;
            }
            Gesture::Left => self.moving = false,
            Gesture::Click(at) => self.burst(scene, at),
            // each half of a double-click already burst
            Gesture::DoubleClick(_)
            | Gesture::LongPressStart { .. }
            | Gesture::LongPressRelease { .. } => {}
        }
    }

    fn step(&mut self, scene: &mut Scene<'_>) {
        if scene.pointer.idle_for(scene.now_ms) > self.config.stationary_check_ms {
            self.moving = false;
        }
        self.update_head(scene.pointer.pos);

        if self.moving && scene.pointer.inside {
            self.spawn_tail(scene);
        }

        let config = &self.config;
        let rng = &mut *scene.rng;
        scene.field.retain_mut(|p| {
            p.life -= 1.0;
            if p.life <= 0.0 {
                return false;
            }
            step_particle(p, config, rng);
            true
        });
    }

    fn head(&self) -> Option<Head> {
        Some(self.head)
    }

    fn reset(&mut self) {
        self.moving = false;
        self.flare_remaining = 0;
        self.head.flaring = false;
        self.head.shine = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ParticleField;
    use crate::particle::ParticleId;
    use crate::pointer::PointerTracker;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn config() -> EngineConfig {
        EngineConfig::for_effect(EffectKind::Meteor)
    }

    #[test]
    fn tail_count_grows_with_distance_and_caps() {
        let effect = MeteorEffect::new(&config());
        assert_eq!(effect.tail_count(0.5), 0);
        assert_eq!(effect.tail_count(1.0), 1);
        assert_eq!(effect.tail_count(2.9), 1);
        assert_eq!(effect.tail_count(3.0), 2);
        assert_eq!(effect.tail_count(500.0), 10);
    }

    #[test]
    fn tail_is_spread_along_the_segment() {
        let mut effect = MeteorEffect::new(&config());
        let mut field = ParticleField::new(100);
        let mut pointer = PointerTracker::new(Vec2::ZERO, 0.0);
        pointer.moved_to(Vec2::new(9.0, 0.0), 0.0, true);
        let mut rng = SmallRng::seed_from_u64(5);
        let mut scene = Scene {
            field: &mut field,
            pointer: &mut pointer,
            rng: &mut rng,
            now_ms: 0.0,
            long_press_held: false,
        };
        effect.spawn_tail(&mut scene);

        // 1 + floor((9 - 1) / 2) = 5 particles at x = 0.9, 2.7, 4.5, 6.3, 8.1
        let mut xs: Vec<f32> = field.iter().map(|p| p.pos.x).collect();
        xs.sort_by(f32::total_cmp);
        let expected = [0.9, 2.7, 4.5, 6.3, 8.1];
        assert_eq!(xs.len(), expected.len());
        for (x, e) in xs.iter().zip(expected) {
            assert!((x - e).abs() < 1e-4, "{x} vs {e}");
        }
    }

    #[test]
    fn flare_pulses_then_settles() {
        let mut effect = MeteorEffect::new(&config());
        let mut field = ParticleField::new(1000);
        let mut pointer = PointerTracker::new(Vec2::new(10.0, 10.0), 0.0);
        let mut rng = SmallRng::seed_from_u64(6);
        let mut scene = Scene {
            field: &mut field,
            pointer: &mut pointer,
            rng: &mut rng,
            now_ms: 0.0,
            long_press_held: false,
        };
        effect.on_gesture(&mut scene, Gesture::Click(Vec2::new(10.0, 10.0)));
        assert_eq!(effect.flare_remaining(), 8);
        assert_eq!(scene.field.len(), 200);

        effect.step(&mut scene);
        let head = effect.head().unwrap();
        assert!(head.flaring);
        assert_eq!(head.pos, Vec2::new(10.0, 10.0));
        assert!(head.shine > 0.0);

        for _ in 0..8 {
            effect.step(&mut scene);
        }
        let head = effect.head().unwrap();
        assert!(!head.flaring);
        assert_eq!(head.brightness, 1.2);
        assert!((head.core_size - 2.0).abs() < 1e-6);
        assert!((head.glow_size - 8.0).abs() < 1e-5);
    }

    #[test]
    fn sparks_respect_capacity() {
        let mut effect = MeteorEffect::new(&config());
        let mut field = ParticleField::new(150);
        let mut pointer = PointerTracker::new(Vec2::ZERO, 0.0);
        let mut rng = SmallRng::seed_from_u64(7);
        let mut scene = Scene {
            field: &mut field,
            pointer: &mut pointer,
            rng: &mut rng,
            now_ms: 0.0,
            long_press_held: false,
        };
        effect.on_gesture(&mut scene, Gesture::Click(Vec2::ZERO));
        effect.on_gesture(&mut scene, Gesture::Click(Vec2::ZERO));
        assert_eq!(field.len(), 150);
    }

    #[test]
    fn double_click_adds_no_sparks() {
        let mut effect = MeteorEffect::new(&config());
        let mut field = ParticleField::new(1000);
        let mut pointer = PointerTracker::new(Vec2::ZERO, 0.0);
        let mut rng = SmallRng::seed_from_u64(11);
        let mut scene = Scene {
            field: &mut field,
            pointer: &mut pointer,
            rng: &mut rng,
            now_ms: 0.0,
            long_press_held: false,
        };
        effect.on_gesture(&mut scene, Gesture::DoubleClick(Vec2::ZERO));
        assert_eq!(effect.flare_remaining(), 0);
        assert!(field.is_empty());
    }

    #[test]
    fn spark_slows_and_shrinks() {
        let c = MeteorConfig::default();
        let mut rng = SmallRng::seed_from_u64(8);
        let mut p = Particle::new(
            ParticleId(0),
            Vec2::ZERO,
            4.0,
            100.0,
            ParticleState::Spark { initial_size: 4.0 },
        );
        p.vel = Vec2::new(10.0, 0.0);
        p.life = 50.0;
        step_particle(&mut p, &c, &mut rng);
        assert_eq!(p.pos, Vec2::new(10.0, 0.0));
        assert!((p.vel.x - 5.6).abs() < 1e-5);
        assert!((p.size - 3.0).abs() < 1e-6);
        assert!(p.opacity >= 0.45 && p.opacity <= 0.5);
    }

    #[test]
    fn tail_size_floors() {
        let c = MeteorConfig::default();
        let mut rng = SmallRng::seed_from_u64(9);
        let mut p = Particle::new(
            ParticleId(0),
            Vec2::ZERO,
            2.0,
            100.0,
            ParticleState::Tail { initial_size: 2.0 },
        );
        p.life = 1.0;
        step_particle(&mut p, &c, &mut rng);
        assert_eq!(p.size, MIN_SIZE);
        assert_eq!(p.vel, Vec2::ZERO);
    }

    #[test]
    fn stops_moving_after_quiet_interval() {
        let mut effect = MeteorEffect::new(&config());
        let mut field = ParticleField::new(100);
        let mut pointer = PointerTracker::new(Vec2::ZERO, 0.0);
        let mut rng = SmallRng::seed_from_u64(10);
        let mut scene = Scene {
            field: &mut field,
            pointer: &mut pointer,
            rng: &mut rng,
            now_ms: 50.0,
            long_press_held: false,
        };
        effect.on_gesture(&mut scene, Gesture::Moved(Vec2::ZERO));
        effect.step(&mut scene);
        assert!(effect.is_moving());
        scene.now_ms = 101.0;
        effect.step(&mut scene);
        assert!(!effect.is_moving());
    }
}
