//! Bounded particle store. Order is not meaningful, so kills are swap-removes.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::Serialize;

use crate::particle::{Particle, ParticleId, ParticleState, StateKind};

pub struct ParticleField {
    particles: Vec<Particle>,
    next_id: u64,
    capacity: usize,
}

impl ParticleField {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity.min(1024)),
            next_id: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Free slots before the capacity bound.
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.particles.len())
    }

    /// Spawn one particle, returning a mutable ref to finish initializing it.
    /// Returns None if the field is full.
    pub fn spawn(
        &mut self,
        pos: Vec2,
        size: f32,
        life: f32,
        state: ParticleState,
    ) -> Option<&mut Particle> {
        if self.particles.len() >= self.capacity {
            return None;
        }
        let id = ParticleId(self.next_id);
        self.next_id += 1;
        self.particles.push(Particle::new(id, pos, size, life, state));
        self.particles.last_mut()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.particles.iter_mut()
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn count(&self, pred: impl Fn(&Particle) -> bool) -> usize {
        self.particles.iter().filter(|&p| pred(p)).count()
    }

    pub fn count_kind(&self, kind: StateKind) -> usize {
        self.count(|p| p.kind() == kind)
    }

    /// Visit every particle, killing those for which `keep` returns false.
    pub fn retain_mut(&mut self, mut keep: impl FnMut(&mut Particle) -> bool) {
        let mut i = 0;
        while i < self.particles.len() {
            if keep(&mut self.particles[i]) {
                i += 1;
            } else {
                // Don't increment i; the swapped-in particle still needs visiting
                self.particles.swap_remove(i);
            }
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn stats(&self) -> FieldStats {
        let mut by_state = BTreeMap::new();
        for p in &self.particles {
            *by_state.entry(p.kind()).or_insert(0) += 1;
        }
        FieldStats {
            total: self.particles.len(),
            by_state,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldStats {
    pub total: usize,
    pub by_state: BTreeMap<StateKind, usize>,
}

impl FieldStats {
    pub fn get(&self, kind: StateKind) -> usize {
        self.by_state.get(&kind).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_respects_capacity() {
        let mut field = ParticleField::new(3);
        for _ in 0..3 {
            assert!(field
                .spawn(Vec2::ZERO, 1.0, 10.0, ParticleState::Trail)
                .is_some());
        }
        assert!(field
            .spawn(Vec2::ZERO, 1.0, 10.0, ParticleState::Trail)
            .is_none());
        assert_eq!(field.remaining(), 0);
    }

    #[test]
    fn ids_keep_increasing_after_kills() {
        let mut field = ParticleField::new(8);
        for _ in 0..4 {
            field.spawn(Vec2::ZERO, 1.0, 10.0, ParticleState::Trail);
        }
        field.retain_mut(|p| p.id.0 % 2 == 0);
        assert_eq!(field.len(), 2);
        let id = field
            .spawn(Vec2::ZERO, 1.0, 10.0, ParticleState::Trail)
            .unwrap()
            .id;
        assert_eq!(id, ParticleId(4));
    }

    #[test]
    fn retain_visits_swapped_in_particles() {
        let mut field = ParticleField::new(8);
        for _ in 0..5 {
            field.spawn(Vec2::ZERO, 1.0, 10.0, ParticleState::Trail);
        }
        let mut visited = 0;
        field.retain_mut(|p| {
            visited += 1;
            p.id.0 >= 3
        });
        assert_eq!(visited, 5);
        assert_eq!(field.len(), 2);
    }

    #[test]
    fn stats_group_by_state() {
        let mut field = ParticleField::new(8);
        field.spawn(Vec2::ZERO, 1.0, 10.0, ParticleState::Trail);
        field.spawn(Vec2::ZERO, 1.0, 10.0, ParticleState::Trail);
        field.spawn(Vec2::ZERO, 1.0, 10.0, ParticleState::Exploding);
        let stats = field.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.get(StateKind::Trail), 2);
        assert_eq!(stats.get(StateKind::Exploding), 1);
        assert_eq!(stats.get(StateKind::Orbiting), 0);
    }
}
