//! Orbit effect: particles circle a resting pointer, chase it when it moves, leave a trail behind
//! it, and react to clicks and long-presses.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;
use tracing::debug;

use super::{random_direction, uniform, Effect, Scene};
use crate::config::{EffectKind, EngineConfig, GestureConfig, OrbitConfig};
use crate::field::ParticleField;
use crate::gesture::Gesture;
use crate::particle::{Orbit, OrbitSeed, OrbitSlot, Particle, ParticleState};

/// Extra margin when back-dating the last move so the stationary check passes immediately.
const BACKDATE_MARGIN_MS: f64 = 10.0;

pub struct OrbitEffect {
    orbit: OrbitConfig,
    gestures: GestureConfig,
    particle_size: f32,
    stationary: bool,
    anchor: Vec2,
}

impl OrbitEffect {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            orbit: config.orbit.clone(),
            gestures: config.gestures.clone(),
            particle_size: config.look.particle_size,
            stationary: false,
            anchor: Vec2::ZERO,
        }
    }

    pub fn is_stationary(&self) -> bool {
        self.stationary
    }

    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    fn seed(&self, rng: &mut SmallRng) -> OrbitSeed {
        OrbitSeed {
            anchor: self.anchor,
            speed: self.orbit.base_speed + (rng.gen::<f32>() - 0.5) * self.orbit.speed_variation,
        }
    }

    /// Moving → Stationary once the pointer has rested long enough. Promotion re-anchors the
    /// orbit and recruits trail and shrinking particles, nearest first.
    fn update_system_state(&mut self, scene: &mut Scene<'_>) {
        if scene.long_press_held {
            self.stationary = false;
            return;
        }
        if self.stationary
            || !scene.pointer.inside
            || scene.pointer.idle_for(scene.now_ms) <= self.orbit.stationary_threshold_ms
        {
            return;
        }

        self.stationary = true;
        self.anchor = scene.pointer.pos;

        let mut candidates: Vec<(f32, usize)> = scene
            .field
            .iter()
            .enumerate()
            .filter(|(_, p)| match p.state {
                ParticleState::Trail => true,
                ParticleState::Shrinking => p.life > 0.0,
                _ => false,
            })
            .map(|(i, p)| (p.pos.distance(self.anchor), i))
            .collect();
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut orbital = scene.field.count(Particle::is_orbital);
        let mut recruited = 0;
        for (_, index) in candidates {
            if orbital >= self.orbit.orbital_count {
                break;
            }
            let seed = self.seed(scene.rng);
            scene.field.as_mut_slice()[index].begin_dispersing(seed, self.orbit.disperse_life);
            orbital += 1;
            recruited += 1;
        }
        debug!(
            anchor = ?self.anchor,
            recruited,
            "pointer stationary"
        );
    }

    fn spawn(&mut self, scene: &mut Scene<'_>) {
        if !scene.pointer.inside {
            return;
        }
        if self.stationary {
            let orbital = scene.field.count(Particle::is_orbital);
            for _ in orbital..self.orbit.orbital_count {
                let seed = self.seed(scene.rng);
                let Some(p) = scene.field.spawn(
                    self.anchor,
                    self.particle_size,
                    self.orbit.disperse_life,
                    ParticleState::Dispersing { seed, slot: None },
                ) else {
                    break;
                };
                p.opacity = self.orbit.disperse_opacity;
            }
        } else {
            let jitter = self.orbit.trail_jitter;
            for _ in 0..self.orbit.trail_per_frame {
                let life = uniform(
                    scene.rng,
                    self.orbit.trail_life_min,
                    self.orbit.trail_life_max,
                );
                let offset = Vec2::new(
                    (scene.rng.gen::<f32>() - 0.5) * jitter,
                    (scene.rng.gen::<f32>() - 0.5) * jitter,
                );
                if scene
                    .field
                    .spawn(
                        scene.pointer.pos + offset,
                        self.particle_size,
                        life,
                        ParticleState::Trail,
                    )
                    .is_none()
                {
                    break;
                }
            }
        }
    }

    fn update_particles(&mut self, scene: &mut Scene<'_>) {
        let orbit = &self.orbit;
        let gestures = &self.gestures;
        let pointer = scene.pointer.pos;
        let held = scene.long_press_held;
        let rng = &mut *scene.rng;

        scene.field.retain_mut(|p| {
            if p.decays(held) {
                p.life -= 1.0;
            }
            if p.life <= 0.0 && !matches!(p.state, ParticleState::Orbiting(_)) {
                return false;
            }
            match p.state {
                ParticleState::Trail
                | ParticleState::Tail { .. }
                | ParticleState::Spark { .. } => step_trail(p),
                ParticleState::Shrinking => step_shrinking(p, pointer, orbit),
                ParticleState::Dispersing { .. } => step_dispersing(p, orbit, rng),
                ParticleState::Orbiting(_) => step_orbiting(p),
                ParticleState::EventShrinking { .. } => step_event_shrinking(
                    p,
                    gestures.event_shrink_speed,
                    orbit.shrink_snap,
                    held,
                ),
                ParticleState::Exploding => step_exploding(p),
            }
        });
    }

    fn pull_to(field: &mut ParticleField, target: Vec2, life: f32) -> usize {
        let mut pulled = 0;
        for p in field.iter_mut().filter(|p| p.is_interactive()) {
            p.begin_event_shrink(target, life);
            pulled += 1;
        }
        pulled
    }

    fn click(&mut self, scene: &mut Scene<'_>, at: Vec2) {
        self.stationary = false;
        let pulled = Self::pull_to(scene.field, at, self.gestures.click_shrink_life);
        debug!(?at, pulled, "click");

        // Regenerate around the click point rather than wherever the pointer drifts to.
        scene.pointer.pos = at;
        scene.pointer.backdate(
            scene.now_ms,
            self.orbit.stationary_threshold_ms + BACKDATE_MARGIN_MS,
        );
        self.update_system_state(scene);
    }

    fn explode(&mut self, scene: &mut Scene<'_>, origin: Vec2, held_ms: f64) {
        let speed = self.gestures.explode_base_speed
            + (held_ms / 100.0) as f32 * self.gestures.explode_boost_per_100ms;
        let life = self.gestures.explode_life;
        let min_count = (self.orbit.orbital_count as f32 * self.gestures.explode_min_fraction)
            .floor() as usize;

        let mut launched = 0;
        for p in scene.field.iter_mut() {
            if matches!(p.state, ParticleState::EventShrinking { .. }) {
                p.launch(origin, random_direction(scene.rng) * speed, life);
                launched += 1;
            }
        }
        let converted = launched;
        while launched < min_count {
            let vel = random_direction(scene.rng) * speed;
            let Some(p) =
                scene
                    .field
                    .spawn(origin, self.particle_size, life, ParticleState::Exploding)
            else {
                break;
            };
            p.vel = vel;
            launched += 1;
        }
        debug!(?origin, held_ms, speed, converted, launched, "explosion");
    }
}

impl Effect for OrbitEffect {
    fn kind(&self) -> EffectKind {
        EffectKind::Orbit
    }

    fn wants_long_press(&self) -> bool {
        self.gestures.enabled
    }

    fn on_gesture(&mut self, scene: &mut Scene<'_>, gesture: Gesture) {
        match gesture {
            Gesture::Moved(_) => {
                if scene.long_press_held || !self.stationary {
                    return;
                }
                self.stationary = false;
                let life = self.orbit.shrink_life;
                for p in scene.field.iter_mut().filter(|p| p.is_orbital()) {
                    p.begin_shrinking(life);
                }
            }
            Gesture::Entered => {}
            Gesture::Left => {
                self.stationary = false;
                let shrink_life = self.orbit.shrink_life / 2.0;
                let trail_cap = self.orbit.trail_life_min / 2.0;
                for p in scene.field.iter_mut() {
                    if p.is_orbital() {
                        // in-flight ones too
                        p.begin_shrinking(shrink_life);
                    } else if p.state == ParticleState::Trail {
                        p.life = p.life.min(trail_cap);
                    }
                }
            }
            Gesture::Click(at) | Gesture::DoubleClick(at) => {
                if self.gestures.enabled {
                    self.click(scene, at);
                }
            }
            Gesture::LongPressStart { origin } => {
                self.stationary = false;
                let pulled = Self::pull_to(
                    scene.field,
                    origin,
                    self.gestures.long_press_shrink_life,
                );
                debug!(?origin, pulled, "long-press confirmed");
            }
            Gesture::LongPressRelease { origin, held_ms } => {
                self.explode(scene, origin, held_ms);
                scene.pointer.backdate(
                    scene.now_ms,
                    self.orbit.stationary_threshold_ms + BACKDATE_MARGIN_MS,
                );
                self.update_system_state(scene);
            }
        }
    }

    fn step(&mut self, scene: &mut Scene<'_>) {
        self.update_system_state(scene);
        self.spawn(scene);
        self.update_particles(scene);
    }

    fn reset(&mut self) {
        self.stationary = false;
    }
}

fn step_trail(p: &mut Particle) -> bool {
    p.opacity = (p.life / p.initial_life).max(0.0);
    p.opacity > 0.0
}

fn step_shrinking(p: &mut Particle, pointer: Vec2, config: &OrbitConfig) -> bool {
    let to = pointer - p.pos;
    if to.length() < config.shrink_snap || p.life <= 0.0 {
        return false;
    }
    p.vel = to * config.shrink_speed;
    p.pos += p.vel;
    p.opacity = (p.life / p.initial_life * 0.9 + 0.1).max(0.0);
    true
}

fn pick_slot(seed: OrbitSeed, config: &OrbitConfig, rng: &mut SmallRng) -> OrbitSlot {
    let angle = rng.gen::<f32>() * std::f32::consts::TAU;
    let radius = uniform(rng, config.radius_min, config.radius_max);
    let target = Orbit {
        anchor: seed.anchor,
        angle,
        radius,
        speed: seed.speed,
    }
    .position();
    OrbitSlot {
        angle,
        radius,
        target,
    }
}

fn step_dispersing(p: &mut Particle, config: &OrbitConfig, rng: &mut SmallRng) -> bool {
    let ParticleState::Dispersing { seed, slot } = p.state else {
        return true;
    };

    let slot = match slot {
        Some(slot) => slot,
        None => {
            let slot = pick_slot(seed, config, rng);
            p.state = ParticleState::Dispersing {
                seed,
                slot: Some(slot),
            };
            slot
        }
    };

    let to = slot.target - p.pos;
    if to.length() < config.disperse_snap {
        p.settle_into_orbit(orbit_for(seed, slot), slot.target);
    } else {
        p.vel = to * config.disperse_speed;
        p.pos += p.vel;
        p.opacity = (p.life / p.initial_life).max(config.disperse_opacity);
    }
    true
}

fn orbit_for(seed: OrbitSeed, slot: OrbitSlot) -> Orbit {
    Orbit {
        anchor: seed.anchor,
        angle: slot.angle,
        radius: slot.radius,
        speed: seed.speed,
    }
}

fn step_orbiting(p: &mut Particle) -> bool {
    if let ParticleState::Orbiting(orbit) = &mut p.state {
        orbit.angle += orbit.speed;
        let at = orbit.position();
        p.pos = at;
        p.opacity = 1.0;
    }
    true
}

fn step_event_shrinking(p: &mut Particle, speed: f32, snap: f32, held: bool) -> bool {
    let ParticleState::EventShrinking { target, .. } = p.state else {
        return true;
    };
    let to = target - p.pos;
    if to.length() < snap || p.life <= 0.0 {
        if !held || p.life <= 0.0 {
            return false;
        }
        p.state = ParticleState::EventShrinking {
            target,
            parked: true,
        };
        p.pos = target;
        p.vel = Vec2::ZERO;
        return true;
    }
    p.vel = to * speed;
    p.pos += p.vel;
    p.opacity = (p.life / p.initial_life).max(0.1);
    true
}

fn step_exploding(p: &mut Particle) -> bool {
    p.pos += p.vel;
    p.opacity = (p.life / p.initial_life).max(0.0);
    p.opacity > 0.0
}
