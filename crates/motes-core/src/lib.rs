//! Motes core engine: platform-agnostic particle state machine, cursor gestures and draw styles.

pub mod config;
pub mod effect;
pub mod engine;
pub mod error;
pub mod field;
pub mod gesture;
pub mod particle;
pub mod pointer;
pub mod render;

pub use config::{
    DoubleClickPolicy, EffectKind, EngineConfig, GestureConfig, LookConfig, MeteorConfig,
    OrbitConfig,
};
pub use effect::{Effect, Head, MeteorEffect, OrbitEffect, Scene};
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use field::{FieldStats, ParticleField};
pub use gesture::{DeadlineTimer, Gesture, PressPhase, PressTracker};
pub use particle::{Orbit, OrbitSeed, OrbitSlot, Particle, ParticleId, ParticleState, StateKind};
pub use pointer::PointerTracker;
pub use render::{MeteorStyle, SquareStyle, Style};
