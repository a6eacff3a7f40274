//! Particle record and its per-state payload.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub u64);

/// Where a dispersing particle will orbit once it lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSeed {
    pub anchor: Vec2,
    pub speed: f32,
}

/// Landing slot picked on a dispersing particle's first update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitSlot {
    pub angle: f32,
    pub radius: f32,
    pub target: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub anchor: Vec2,
    pub angle: f32,
    pub radius: f32,
    /// Radians per frame.
    pub speed: f32,
}

impl Orbit {
    pub fn position(&self) -> Vec2 {
        self.anchor + Vec2::new(self.angle.cos(), self.angle.sin()) * self.radius
    }
}

/// Behavioural state. Each variant carries exactly the data its update rule needs, so leaving a
/// state drops that data with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleState {
    /// Left behind on the pointer path; fades in place.
    Trail,
    /// Chasing the live pointer.
    Shrinking,
    /// Flying from the anchor to its orbit slot. `slot` is `None` until the first update.
    Dispersing {
        seed: OrbitSeed,
        slot: Option<OrbitSlot>,
    },
    Orbiting(Orbit),
    /// Converging on a gesture point. `parked` while held there during a confirmed long-press.
    EventShrinking { target: Vec2, parked: bool },
    /// Ballistic flight after a long-press release.
    Exploding,
    /// Meteor tail segment.
    Tail { initial_size: f32 },
    /// Meteor click spark.
    Spark { initial_size: f32 },
}

/// Payload-free tag of [`ParticleState`], for counting and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Trail,
    Shrinking,
    Dispersing,
    Orbiting,
    EventShrinking,
    Exploding,
    Tail,
    Spark,
}

impl StateKind {
    pub const ALL: [StateKind; 8] = [
        StateKind::Trail,
        StateKind::Shrinking,
        StateKind::Dispersing,
        StateKind::Orbiting,
        StateKind::EventShrinking,
        StateKind::Exploding,
        StateKind::Tail,
        StateKind::Spark,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: ParticleId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub opacity: f32,
    pub size: f32,
    /// Remaining frames; `f32::INFINITY` for orbiting particles.
    pub life: f32,
    pub initial_life: f32,
    pub state: ParticleState,
}

impl Particle {
    pub fn new(id: ParticleId, pos: Vec2, size: f32, life: f32, state: ParticleState) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            opacity: 1.0,
            size,
            life,
            initial_life: life,
            state,
        }
    }

    pub fn kind(&self) -> StateKind {
        match self.state {
            ParticleState::Trail => StateKind::Trail,
            ParticleState::Shrinking => StateKind::Shrinking,
            ParticleState::Dispersing { .. } => StateKind::Dispersing,
            ParticleState::Orbiting(_) => StateKind::Orbiting,
            ParticleState::EventShrinking { .. } => StateKind::EventShrinking,
            ParticleState::Exploding => StateKind::Exploding,
            ParticleState::Tail { .. } => StateKind::Tail,
            ParticleState::Spark { .. } => StateKind::Spark,
        }
    }

    /// Normalized remaining life in [0, 1].
    pub fn life_ratio(&self) -> f32 {
        if self.initial_life <= 0.0 || !self.life.is_finite() {
            1.0
        } else {
            (self.life / self.initial_life).clamp(0.0, 1.0)
        }
    }

    /// Orbiting, or on the way there.
    pub fn is_orbital(&self) -> bool {
        matches!(
            self.state,
            ParticleState::Orbiting(_) | ParticleState::Dispersing { .. }
        )
    }

    /// States that gestures are allowed to take over.
    pub fn is_interactive(&self) -> bool {
        matches!(
            self.state,
            ParticleState::Orbiting(_)
                | ParticleState::Dispersing { .. }
                | ParticleState::Trail
                | ParticleState::Shrinking
        )
    }

    /// Whether the frame's life decrement applies.
    pub fn decays(&self, long_press_held: bool) -> bool {
        match self.state {
            ParticleState::Orbiting(_) | ParticleState::Exploding => self.life.is_finite(),
            ParticleState::EventShrinking { parked, .. } => !(parked && long_press_held),
            _ => true,
        }
    }

    fn reset_life(&mut self, life: f32) {
        self.life = life;
        self.initial_life = life;
    }

    pub fn begin_shrinking(&mut self, life: f32) {
        self.state = ParticleState::Shrinking;
        self.reset_life(life);
    }

    pub fn begin_event_shrink(&mut self, target: Vec2, life: f32) {
        self.state = ParticleState::EventShrinking {
            target,
            parked: false,
        };
        self.reset_life(life);
    }

    pub fn begin_dispersing(&mut self, seed: OrbitSeed, life: f32) {
        self.state = ParticleState::Dispersing { seed, slot: None };
        self.vel = Vec2::ZERO;
        self.reset_life(life);
    }

    /// Land exactly on the orbit and stop decaying.
    pub fn settle_into_orbit(&mut self, orbit: Orbit, at: Vec2) {
        self.state = ParticleState::Orbiting(orbit);
        self.pos = at;
        self.vel = Vec2::ZERO;
        self.opacity = 1.0;
        self.life = f32::INFINITY;
    }

    pub fn launch(&mut self, origin: Vec2, vel: Vec2, life: f32) {
        self.state = ParticleState::Exploding;
        self.pos = origin;
        self.vel = vel;
        self.opacity = 1.0;
        self.reset_life(life);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orbit() -> Orbit {
        Orbit {
            anchor: Vec2::new(100.0, 100.0),
            angle: 0.5,
            radius: 30.0,
            speed: 0.01,
        }
    }

    #[test]
    fn orbit_position_lies_on_circle() {
        let o = orbit();
        let d = o.position().distance(o.anchor);
        assert!((d - o.radius).abs() < 1e-4);
    }

    #[test]
    fn leaving_orbit_drops_orbit_data() {
        let mut p = Particle::new(ParticleId(1), Vec2::ZERO, 2.0, 10.0, ParticleState::Trail);
        p.settle_into_orbit(orbit(), orbit().position());
        assert_eq!(p.kind(), StateKind::Orbiting);
        assert!(p.life.is_infinite());

        p.begin_shrinking(75.0);
        assert_eq!(p.state, ParticleState::Shrinking);
        assert_eq!(p.initial_life, 75.0);
    }

    #[test]
    fn dispersing_starts_without_slot() {
        let mut p = Particle::new(ParticleId(2), Vec2::ONE, 2.0, 10.0, ParticleState::Shrinking);
        p.vel = Vec2::new(3.0, 3.0);
        let seed = OrbitSeed {
            anchor: Vec2::ZERO,
            speed: 0.02,
        };
        p.begin_dispersing(seed, 90.0);
        assert_eq!(p.state, ParticleState::Dispersing { seed, slot: None });
        assert_eq!(p.vel, Vec2::ZERO);
    }

    #[test]
    fn decay_rules() {
        let mut p = Particle::new(ParticleId(3), Vec2::ZERO, 2.0, 10.0, ParticleState::Trail);
        assert!(p.decays(false));

        p.settle_into_orbit(orbit(), Vec2::ZERO);
        assert!(!p.decays(false));

        p.state = ParticleState::EventShrinking {
            target: Vec2::ZERO,
            parked: true,
        };
        assert!(!p.decays(true));
        assert!(p.decays(false));

        p.launch(Vec2::ZERO, Vec2::X, 100.0);
        assert!(p.decays(false));
    }

    #[test]
    fn life_ratio_clamps() {
        let mut p = Particle::new(ParticleId(4), Vec2::ZERO, 2.0, 10.0, ParticleState::Trail);
        p.life = 5.0;
        assert!((p.life_ratio() - 0.5).abs() < 1e-6);
        p.life = -1.0;
        assert_eq!(p.life_ratio(), 0.0);
        p.life = f32::INFINITY;
        assert_eq!(p.life_ratio(), 1.0);
    }
}
