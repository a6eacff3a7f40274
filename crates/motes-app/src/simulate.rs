//! Headless runs: drives an engine on the in-memory host from a script.

use glam::Vec2;
use motes_core::{EffectKind, Engine, EngineConfig, FieldStats, PressPhase, StateKind};
use motes_platform::headless::{
    DrawCommand, HeadlessHandles, HeadlessHost, DEFAULT_REGION_ID, DEFAULT_SURFACE_ID,
};
use motes_platform::{EventOrigin, PointerButton, RawPointerEvent, Subscription, SurfaceSize};
use serde::Serialize;
use tracing::debug;

use crate::script::{Script, Step};

pub struct Simulation {
    engine: Engine,
    handles: HeadlessHandles,
    cursor: Vec2,
    frame_ms: f64,
    frames: u64,
}

impl Simulation {
    pub fn new(config: EngineConfig, size: SurfaceSize, frame_ms: f64) -> motes_core::Result<Self> {
        let mut host = HeadlessHost::new(size);
        let handles = host.handles();
        let engine = Engine::new(&mut host, DEFAULT_SURFACE_ID, DEFAULT_REGION_ID, config)?;
        let cursor = engine.pointer().pos;
        Ok(Self {
            engine,
            handles,
            cursor,
            frame_ms,
            frames: 0,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn run(&mut self, script: &Script) {
        if let Some(frame_ms) = script.frame_ms {
            self.frame_ms = frame_ms;
        }
        for step in &script.steps {
            self.apply(step);
        }
    }

    /// Advance `n` frames. Frames only reach the engine while it has one requested.
    pub fn advance(&mut self, n: u64) {
        for _ in 0..n {
            if self.handles.take_frame() {
                self.engine.on_frame(self.frame_ms);
            }
            self.frames += 1;
        }
    }

    pub fn apply(&mut self, step: &Step) {
        debug!(?step, "script step");
        match *step {
            Step::Move { x, y } => self.move_to(Vec2::new(x, y)),
            Step::Glide { x, y, frames } => {
                let from = self.cursor;
                let to = Vec2::new(x, y);
                for i in 1..=frames {
                    self.move_to(from.lerp(to, i as f32 / frames as f32));
                    self.advance(1);
                }
            }
            Step::Wait { frames } => self.advance(frames as u64),
            Step::Press => self.region(RawPointerEvent::ButtonDown {
                client: self.cursor,
                button: PointerButton::Primary,
            }),
            Step::Release => self.release(),
            Step::Click => self.click(),
            Step::DoubleClick => {
                self.click();
                self.click();
                self.region(RawPointerEvent::DoubleClick {
                    client: self.cursor,
                });
            }
            Step::Enter => self.region(RawPointerEvent::Enter),
            Step::Leave => self.region(RawPointerEvent::Leave),
            Step::Resize { width, height } => {
                self.handles
                    .set_container_size(SurfaceSize::new(width, height));
                self.engine
                    .dispatch(EventOrigin::Window, RawPointerEvent::Resize);
            }
            Step::SetActive { active } => self.engine.set_active(active),
        }
    }

    fn region(&mut self, event: RawPointerEvent) {
        self.engine.dispatch(EventOrigin::Region, event);
    }

    fn move_to(&mut self, pos: Vec2) {
        self.cursor = pos;
        self.region(RawPointerEvent::Move { client: pos });
        if self.engine.is_listening(Subscription::PressCapture) {
            self.engine
                .dispatch(EventOrigin::Window, RawPointerEvent::Move { client: pos });
        }
    }

    fn release(&mut self) {
        self.engine.dispatch(
            EventOrigin::Window,
            RawPointerEvent::ButtonUp {
                client: self.cursor,
                button: PointerButton::Primary,
            },
        );
        self.region(RawPointerEvent::Click {
            client: self.cursor,
        });
    }

    fn click(&mut self) {
        self.region(RawPointerEvent::ButtonDown {
            client: self.cursor,
            button: PointerButton::Primary,
        });
        self.release();
    }

    /// Commands of the last rendered frame.
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.handles.commands()
    }

    pub fn report(&self) -> Report {
        let pointer = self.engine.pointer().pos;
        Report {
            effect: self.engine.effect_kind(),
            frames: self.frames,
            clock_ms: self.engine.clock_ms(),
            active: self.engine.is_active(),
            pointer: [pointer.x, pointer.y],
            pressing: self.engine.press_phase() != PressPhase::Idle,
            stats: self.engine.stats(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub effect: EffectKind,
    pub frames: u64,
    pub clock_ms: f64,
    pub active: bool,
    pub pointer: [f32; 2],
    pub pressing: bool,
    pub stats: FieldStats,
}

impl Report {
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "effect {} after {} frames ({:.0} ms), {} particles\n",
            self.effect.name(),
            self.frames,
            self.clock_ms,
            self.stats.total
        );
        for kind in StateKind::ALL {
            let count = self.stats.get(kind);
            if count > 0 {
                out.push_str(&format!("  {kind:?}: {count}\n"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Scenario;

    const SIZE: SurfaceSize = SurfaceSize {
        width: 400,
        height: 300,
    };

    fn simulation(effect: EffectKind) -> Simulation {
        Simulation::new(EngineConfig::for_effect(effect).with_seed(3), SIZE, 16.0).unwrap()
    }

    #[test]
    fn idle_scenario_forms_a_full_orbit() {
        let mut sim = simulation(EffectKind::Orbit);
        sim.run(&Scenario::Idle.script(SIZE));
        let report = sim.report();
        assert_eq!(report.frames, 120);
        assert_eq!(report.stats.get(StateKind::Orbiting), 60);
        assert_eq!(report.pointer, [200.0, 150.0]);
    }

    #[test]
    fn long_press_scenario_explodes() {
        let mut sim = simulation(EffectKind::Orbit);
        let script = Scenario::LongPress.script(SIZE);
        // stop right after the release
        let upto = script.steps.len() - 1;
        for step in &script.steps[..upto] {
            sim.apply(step);
        }
        let report = sim.report();
        assert!(!report.pressing);
        assert!(report.stats.get(StateKind::Exploding) >= 30);
    }

    #[test]
    fn inactive_run_does_not_advance_the_clock() {
        let mut sim = simulation(EffectKind::Orbit);
        sim.apply(&Step::SetActive { active: false });
        sim.apply(&Step::Wait { frames: 10 });
        let report = sim.report();
        assert_eq!(report.frames, 10);
        assert_eq!(report.clock_ms, 0.0);
        assert_eq!(report.stats.total, 0);
    }

    #[test]
    fn meteor_sweep_leaves_a_tail() {
        let mut sim = simulation(EffectKind::Meteor);
        sim.apply(&Step::Move { x: 10.0, y: 10.0 });
        sim.apply(&Step::Glide {
            x: 300.0,
            y: 10.0,
            frames: 10,
        });
        assert!(sim.report().stats.get(StateKind::Tail) > 0);
    }

    #[test]
    fn text_report_lists_nonzero_states() {
        let mut sim = simulation(EffectKind::Orbit);
        sim.run(&Scenario::Idle.script(SIZE));
        let text = sim.report().to_text();
        assert!(text.starts_with("effect orbit after 120 frames"));
        assert!(text.contains("Orbiting: 60"));
        assert!(!text.contains("Exploding"));
    }
}
