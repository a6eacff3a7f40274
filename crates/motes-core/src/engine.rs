//! Engine lifecycle: binds to a host surface and input region, turns raw pointer events into
//! gestures, and runs the update/render pass once per frame.

use glam::Vec2;
use motes_platform::{
    DrawSurface, EventOrigin, FrameRequest, FrameScheduler, Host, InputSource, PointerButton,
    RawPointerEvent, Subscription, SurfaceSize,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, trace, warn};

use crate::config::{DoubleClickPolicy, EffectKind, EngineConfig};
use crate::effect::{self, Effect, Head, Scene};
use crate::error::{EngineError, Result};
use crate::field::{FieldStats, ParticleField};
use crate::gesture::{Gesture, PressPhase, PressTracker};
use crate::particle::Particle;
use crate::pointer::PointerTracker;
use crate::render::{self, Style};

/// Listeners currently installed on the input source.
#[derive(Debug, Default)]
struct Subscriptions {
    held: Vec<Subscription>,
}

impl Subscriptions {
    fn holds(&self, subscription: Subscription) -> bool {
        self.held.contains(&subscription)
    }

    fn acquire(&mut self, source: &mut dyn InputSource, subscription: Subscription) {
        if self.holds(subscription) {
            return;
        }
        match source.listen(subscription) {
            Ok(()) => self.held.push(subscription),
            Err(e) => warn!("failed to install {subscription:?} listener: {e}"),
        }
    }

    fn release(&mut self, source: &mut dyn InputSource, subscription: Subscription) {
        if let Some(index) = self.held.iter().position(|s| *s == subscription) {
            self.held.swap_remove(index);
            source.unlisten(subscription);
        }
    }

    fn release_all(&mut self, source: &mut dyn InputSource) {
        for subscription in self.held.drain(..) {
            source.unlisten(subscription);
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    surface: Box<dyn DrawSurface>,
    source: Box<dyn InputSource>,
    scheduler: Box<dyn FrameScheduler>,
    subscriptions: Subscriptions,
    pending_frame: Option<FrameRequest>,

    field: ParticleField,
    pointer: PointerTracker,
    press: PressTracker,
    effect: Box<dyn Effect>,
    style: Box<dyn Style>,
    rng: SmallRng,

    clock_ms: f64,
    active: bool,
    destroyed: bool,
}

impl Engine {
    /// Bind to the host's surface `surface_id` and input region `region_id` and start running.
    pub fn new(
        host: &mut dyn Host,
        surface_id: &str,
        region_id: &str,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;

        let mut surface = host
            .surface(surface_id)
            .ok_or_else(|| EngineError::SurfaceNotFound(surface_id.to_string()))?;
        let source = host
            .input_region(region_id)
            .ok_or_else(|| EngineError::RegionNotFound(region_id.to_string()))?;
        if surface.context_2d().is_none() {
            return Err(EngineError::ContextUnavailable(surface_id.to_string()));
        }
        let scheduler = host.scheduler();

        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let mut engine = Self {
            field: ParticleField::new(config.max_particles()),
            pointer: PointerTracker::new(Vec2::ZERO, 0.0),
            press: PressTracker::default(),
            effect: effect::build(&config),
            style: render::style_for(&config),
            rng,
            surface,
            source,
            scheduler,
            subscriptions: Subscriptions::default(),
            pending_frame: None,
            clock_ms: 0.0,
            active: false,
            destroyed: false,
            config,
        };

        engine.resize();
        engine.pointer = PointerTracker::new(engine.surface.buffer_size().center(), 0.0);
        engine.set_active(true);

        info!(
            effect = engine.config.effect.name(),
            surface = surface_id,
            region = region_id,
            "particle engine started"
        );
        Ok(engine)
    }

    /// Start or stop the effect. Stopping releases every listener, cancels the pending frame,
    /// blanks the surface and drops all particles. Setting the current value again does nothing.
    pub fn set_active(&mut self, active: bool) {
        if self.destroyed || active == self.active {
            return;
        }
        self.active = active;

        if active {
            self.subscriptions
                .acquire(&mut *self.source, Subscription::Region);
            self.subscriptions
                .acquire(&mut *self.source, Subscription::Resize);
            self.request_frame();
        } else {
            self.subscriptions.release_all(&mut *self.source);
            if let Some(request) = self.pending_frame.take() {
                self.scheduler.cancel_frame(request);
            }
            self.press.cancel();
            self.effect.reset();
            self.field.clear();
            if let Some(canvas) = self.surface.context_2d() {
                canvas.clear();
            }
        }
        info!(active, "particle engine activity changed");
    }

    /// Deactivate for good. Later calls, and any other operation, are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.set_active(false);
        self.destroyed = true;
        info!("particle engine destroyed");
    }

    /// Swap the running effect and its style. Particles of the old effect are dropped.
    pub fn set_effect(&mut self, kind: EffectKind) {
        if self.destroyed || kind == self.config.effect {
            return;
        }
        self.config.effect = kind;
        self.effect = effect::build(&self.config);
        self.style = render::style_for(&self.config);
        self.field = ParticleField::new(self.config.max_particles());
        self.cancel_press();
        info!(effect = kind.name(), "effect switched");
    }

    /// Match the drawing buffer to the container.
    pub fn resize(&mut self) {
        let size = self.surface.container_size();
        self.surface.set_buffer_size(size);
        debug!(width = size.width, height = size.height, "surface resized");
    }

    /// Feed one host event. Events for listeners the engine does not hold are dropped.
    pub fn dispatch(&mut self, origin: EventOrigin, event: RawPointerEvent) {
        if !self.active {
            return;
        }
        let region = self.source.region_origin();
        let local = |client: Vec2| client - region;

        match (origin, event) {
            (EventOrigin::Region, event) if self.subscriptions.holds(Subscription::Region) => {
                match event {
                    RawPointerEvent::Move { client } => self.on_move(local(client)),
                    RawPointerEvent::Enter => {
                        self.pointer.inside = true;
                        self.emit(Gesture::Entered);
                    }
                    RawPointerEvent::Leave => self.on_leave(),
                    RawPointerEvent::Click { client } => self.on_click(local(client)),
                    RawPointerEvent::DoubleClick { client } => {
                        self.on_double_click(local(client))
                    }
                    RawPointerEvent::ButtonDown {
                        client,
                        button: PointerButton::Primary,
                    } => self.on_button_down(local(client)),
                    other => trace!(?other, "ignored region event"),
                }
            }
            (EventOrigin::Window, RawPointerEvent::Move { client })
                if self.subscriptions.holds(Subscription::PressCapture) =>
            {
                let pos = local(client);
                if self
                    .press
                    .exceeds_tolerance(pos, self.config.gestures.long_press_tolerance_px)
                {
                    debug!(?pos, "press moved past tolerance");
                    self.cancel_press();
                }
            }
            (
                EventOrigin::Window,
                RawPointerEvent::ButtonUp {
                    button: PointerButton::Primary,
                    ..
                },
            ) if self.subscriptions.holds(Subscription::PressCapture) => self.on_button_up(),
            (EventOrigin::Window, RawPointerEvent::Resize)
                if self.subscriptions.holds(Subscription::Resize) =>
            {
                self.resize()
            }
            (origin, event) => trace!(?origin, ?event, "dropped event without listener"),
        }
    }

    /// One display frame, `dt_ms` after the previous one.
    pub fn on_frame(&mut self, dt_ms: f64) {
        self.pending_frame = None;
        if !self.active {
            return;
        }
        self.clock_ms += dt_ms.max(0.0);

        if let Some(origin) = self.press.poll(self.clock_ms) {
            debug!(?origin, "long-press confirmed");
            self.emit(Gesture::LongPressStart { origin });
        }

        let mut scene = Scene {
            field: &mut self.field,
            pointer: &mut self.pointer,
            rng: &mut self.rng,
            now_ms: self.clock_ms,
            long_press_held: self.press.is_confirmed(),
        };
        self.effect.step(&mut scene);
        self.pointer.end_frame();

        let head = self.effect.head();
        if let Some(canvas) = self.surface.context_2d() {
            self.style.draw(canvas, self.field.as_slice(), head.as_ref());
        }
        trace!(particles = self.field.len(), clock_ms = self.clock_ms, "frame");

        self.request_frame();
    }

    pub fn particles(&self) -> &[Particle] {
        self.field.as_slice()
    }

    pub fn stats(&self) -> FieldStats {
        self.field.stats()
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn press_phase(&self) -> PressPhase {
        self.press.phase()
    }

    pub fn head(&self) -> Option<Head> {
        self.effect.head()
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn effect_kind(&self) -> EffectKind {
        self.config.effect
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_listening(&self, subscription: Subscription) -> bool {
        self.subscriptions.holds(subscription)
    }

    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.pending_frame
    }

    pub fn buffer_size(&self) -> SurfaceSize {
        self.surface.buffer_size()
    }

    fn request_frame(&mut self) {
        if self.pending_frame.is_none() {
            self.pending_frame = Some(self.scheduler.request_frame());
        }
    }

    fn emit(&mut self, gesture: Gesture) {
        let mut scene = Scene {
            field: &mut self.field,
            pointer: &mut self.pointer,
            rng: &mut self.rng,
            now_ms: self.clock_ms,
            long_press_held: self.press.is_confirmed(),
        };
        self.effect.on_gesture(&mut scene, gesture);
    }

    fn cancel_press(&mut self) {
        self.press.cancel();
        self.subscriptions
            .release(&mut *self.source, Subscription::PressCapture);
    }

    fn on_move(&mut self, pos: Vec2) {
        let stamp = !self.press.is_confirmed();
        self.pointer.moved_to(pos, self.clock_ms, stamp);
        self.emit(Gesture::Moved(pos));
    }

    fn on_leave(&mut self) {
        if self.press.is_pressing() {
            debug!("press cancelled by leave");
        }
        self.cancel_press();
        self.pointer.inside = false;
        self.emit(Gesture::Left);
    }

    fn on_button_down(&mut self, pos: Vec2) {
        if !self.effect.wants_long_press() {
            return;
        }
        self.press.begin(
            pos,
            self.clock_ms,
            self.config.gestures.long_press_threshold_ms,
        );
        self.subscriptions
            .acquire(&mut *self.source, Subscription::PressCapture);
    }

    fn on_button_up(&mut self) {
        let released = self.press.release(self.clock_ms);
        self.subscriptions
            .release(&mut *self.source, Subscription::PressCapture);
        if let Some((origin, held_ms)) = released {
            self.emit(Gesture::LongPressRelease { origin, held_ms });
        }
    }

    fn on_click(&mut self, pos: Vec2) {
        if self.press.take_swallowed_click() {
            trace!(?pos, "click ending a long-press ignored");
            return;
        }
        if self.press.is_detecting() {
            self.cancel_press();
        }
        self.emit(Gesture::Click(pos));
        self.press.note_click(pos, self.clock_ms);
    }

    fn on_double_click(&mut self, pos: Vec2) {
        self.cancel_press();
        let gestures = &self.config.gestures;
        if gestures.double_click == DoubleClickPolicy::Once
            && self.press.repeats_last_click(
                pos,
                self.clock_ms,
                gestures.double_click_window_ms,
                gestures.long_press_tolerance_px,
            )
        {
            trace!(?pos, "double-click absorbed by preceding click");
            return;
        }
        self.emit(Gesture::DoubleClick(pos));
        self.press.note_click(pos, self.clock_ms);
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motes_platform::headless::{HeadlessHost, DEFAULT_REGION_ID, DEFAULT_SURFACE_ID};

    fn engine(host: &mut HeadlessHost) -> Engine {
        Engine::new(
            host,
            DEFAULT_SURFACE_ID,
            DEFAULT_REGION_ID,
            EngineConfig::default().with_seed(11),
        )
        .unwrap()
    }

    #[test]
    fn construction_installs_listeners_and_requests_a_frame() {
        let mut host = HeadlessHost::new(SurfaceSize::new(200, 100));
        let handles = host.handles();
        let engine = engine(&mut host);

        assert!(engine.is_active());
        assert!(handles.is_listening(Subscription::Region));
        assert!(handles.is_listening(Subscription::Resize));
        assert!(!handles.is_listening(Subscription::PressCapture));
        assert_eq!(handles.pending_frames(), 1);
        assert_eq!(engine.buffer_size(), SurfaceSize::new(200, 100));
        assert_eq!(engine.pointer().pos, Vec2::new(100.0, 50.0));
    }

    #[test]
    fn events_are_translated_to_surface_coordinates() {
        let mut host =
            HeadlessHost::new(SurfaceSize::new(200, 100)).with_region_origin(Vec2::new(30.0, 40.0));
        let mut engine = engine(&mut host);
        engine.dispatch(
            EventOrigin::Region,
            RawPointerEvent::Move {
                client: Vec2::new(50.0, 50.0),
            },
        );
        assert_eq!(engine.pointer().pos, Vec2::new(20.0, 10.0));
    }

    #[test]
    fn window_events_need_press_capture() {
        let mut host = HeadlessHost::new(SurfaceSize::new(200, 100));
        let mut engine = engine(&mut host);
        engine.dispatch(
            EventOrigin::Window,
            RawPointerEvent::ButtonUp {
                client: Vec2::ZERO,
                button: PointerButton::Primary,
            },
        );
        assert_eq!(engine.press_phase(), PressPhase::Idle);

        engine.dispatch(
            EventOrigin::Region,
            RawPointerEvent::ButtonDown {
                client: Vec2::new(10.0, 10.0),
                button: PointerButton::Primary,
            },
        );
        assert!(engine.is_listening(Subscription::PressCapture));
        engine.dispatch(
            EventOrigin::Window,
            RawPointerEvent::ButtonUp {
                client: Vec2::new(10.0, 10.0),
                button: PointerButton::Primary,
            },
        );
        assert!(!engine.is_listening(Subscription::PressCapture));
        assert_eq!(engine.press_phase(), PressPhase::Idle);
    }

    #[test]
    fn secondary_button_does_not_start_a_press() {
        let mut host = HeadlessHost::new(SurfaceSize::new(200, 100));
        let mut engine = engine(&mut host);
        engine.dispatch(
            EventOrigin::Region,
            RawPointerEvent::ButtonDown {
                client: Vec2::new(10.0, 10.0),
                button: PointerButton::Secondary,
            },
        );
        assert_eq!(engine.press_phase(), PressPhase::Idle);
    }

    #[test]
    fn inactive_engine_ignores_frames_and_events() {
        let mut host = HeadlessHost::new(SurfaceSize::new(200, 100));
        let mut engine = engine(&mut host);
        engine.set_active(false);
        engine.on_frame(16.0);
        engine.dispatch(EventOrigin::Region, RawPointerEvent::Enter);
        assert_eq!(engine.clock_ms(), 0.0);
        assert!(engine.particles().is_empty());
        assert!(engine.pending_frame().is_none());
    }

    #[test]
    fn effect_switch_starts_clean() {
        let mut host = HeadlessHost::new(SurfaceSize::new(200, 100));
        let mut engine = engine(&mut host);
        for _ in 0..5 {
            engine.on_frame(16.0);
        }
        assert!(!engine.particles().is_empty());
        engine.set_effect(EffectKind::Meteor);
        assert!(engine.particles().is_empty());
        assert_eq!(engine.effect_kind(), EffectKind::Meteor);
        assert!(engine.head().is_some());
    }
}
