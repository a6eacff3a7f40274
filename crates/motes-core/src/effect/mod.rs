//! Spawn and gesture policies. An effect decides which particles exist and how they move; the
//! engine owns the particles, pointer and clock and lends them out through [`Scene`].

mod meteor;
mod orbit;

pub use meteor::{Head, MeteorEffect};
pub use orbit::OrbitEffect;

use rand::rngs::SmallRng;
use rand::Rng;

use crate::config::{EffectKind, EngineConfig};
use crate::field::ParticleField;
use crate::gesture::Gesture;
use crate::pointer::PointerTracker;

/// Mutable engine state an effect works on during one call.
pub struct Scene<'a> {
    pub field: &'a mut ParticleField,
    pub pointer: &'a mut PointerTracker,
    pub rng: &'a mut SmallRng,
    pub now_ms: f64,
    /// A long-press is confirmed and the button is still down.
    pub long_press_held: bool,
}

pub trait Effect {
    fn kind(&self) -> EffectKind;

    /// Whether the engine should run press detection and report long-press gestures.
    fn wants_long_press(&self) -> bool {
        false
    }

    fn on_gesture(&mut self, scene: &mut Scene<'_>, gesture: Gesture);

    /// One frame: state re-evaluation, spawning and the particle update pass.
    fn step(&mut self, scene: &mut Scene<'_>);

    /// Pointer marker for styles that draw one.
    fn head(&self) -> Option<Head> {
        None
    }

    /// Forget transient state when the engine is deactivated.
    fn reset(&mut self);
}

pub fn build(config: &EngineConfig) -> Box<dyn Effect> {
    match config.effect {
        EffectKind::Orbit => Box::new(OrbitEffect::new(config)),
        EffectKind::Meteor => Box::new(MeteorEffect::new(config)),
    }
}

/// Uniform sample in [min, max); returns `min` for an empty range.
pub(crate) fn uniform(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    min + rng.gen::<f32>() * (max - min)
}

/// Unit vector at a uniformly random angle.
pub(crate) fn random_direction(rng: &mut impl Rng) -> glam::Vec2 {
    let angle = rng.gen::<f32>() * std::f32::consts::TAU;
    glam::Vec2::new(angle.cos(), angle.sin())
}
