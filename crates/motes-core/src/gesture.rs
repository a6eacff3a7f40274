//! Press tracking (Idle → Detecting → Confirmed) and the gestures the engine hands to effects.

use glam::Vec2;

/// High-level pointer input, in surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Moved(Vec2),
    Entered,
    Left,
    Click(Vec2),
    DoubleClick(Vec2),
    /// The press at `origin` was held past the long-press threshold.
    LongPressStart { origin: Vec2 },
    /// A confirmed long-press ended after `held_ms`.
    LongPressRelease { origin: Vec2, held_ms: f64 },
}

/// Single-shot deadline on the engine clock.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeadlineTimer {
    deadline_ms: Option<f64>,
}

impl DeadlineTimer {
    pub fn arm(&mut self, deadline_ms: f64) {
        self.deadline_ms = Some(deadline_ms);
    }

    /// Safe to call whether armed, fired or already cancelled.
    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// Fires at most once per `arm`.
    pub fn fire_if_due(&mut self, now_ms: f64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressPhase {
    Idle,
    Detecting { origin: Vec2, started_ms: f64 },
    Confirmed { origin: Vec2, started_ms: f64 },
}

#[derive(Debug, Clone)]
pub struct PressTracker {
    phase: PressPhase,
    timer: DeadlineTimer,
    /// Set when a confirmed long-press ends; the click the host reports next belongs to it.
    swallow_click: bool,
    last_click: Option<(Vec2, f64)>,
}

impl Default for PressTracker {
    fn default() -> Self {
        Self {
            phase: PressPhase::Idle,
            timer: DeadlineTimer::default(),
            swallow_click: false,
            last_click: None,
        }
    }
}

impl PressTracker {
    pub fn phase(&self) -> PressPhase {
        self.phase
    }

    pub fn is_detecting(&self) -> bool {
        matches!(self.phase, PressPhase::Detecting { .. })
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.phase, PressPhase::Confirmed { .. })
    }

    pub fn is_pressing(&self) -> bool {
        !matches!(self.phase, PressPhase::Idle)
    }

    pub fn timer(&self) -> &DeadlineTimer {
        &self.timer
    }

    /// Primary button went down; any earlier press is replaced.
    pub fn begin(&mut self, origin: Vec2, now_ms: f64, threshold_ms: f64) {
        self.timer.cancel();
        self.phase = PressPhase::Detecting {
            origin,
            started_ms: now_ms,
        };
        self.timer.arm(now_ms + threshold_ms);
        self.swallow_click = false;
    }

    /// Whether `pos` is far enough from a still-detecting press to abandon it.
    pub fn exceeds_tolerance(&self, pos: Vec2, tolerance_px: f32) -> bool {
        match self.phase {
            PressPhase::Detecting { origin, .. } => pos.distance(origin) > tolerance_px,
            _ => false,
        }
    }

    /// Promote Detecting to Confirmed when the timer is due. Returns the press origin on promotion.
    pub fn poll(&mut self, now_ms: f64) -> Option<Vec2> {
        if !self.timer.fire_if_due(now_ms) {
            return None;
        }
        match self.phase {
            PressPhase::Detecting { origin, started_ms } => {
                self.phase = PressPhase::Confirmed { origin, started_ms };
                Some(origin)
            }
            _ => None,
        }
    }

    /// Primary button went up. Returns origin and held time when a long-press was confirmed.
    pub fn release(&mut self, now_ms: f64) -> Option<(Vec2, f64)> {
        self.timer.cancel();
        let released = match self.phase {
            PressPhase::Confirmed { origin, started_ms } => {
                self.swallow_click = true;
                Some((origin, now_ms - started_ms))
            }
            _ => None,
        };
        self.phase = PressPhase::Idle;
        released
    }

    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.phase = PressPhase::Idle;
    }

    /// True once for the click that trails a confirmed long-press.
    pub fn take_swallowed_click(&mut self) -> bool {
        std::mem::take(&mut self.swallow_click)
    }

    pub fn note_click(&mut self, pos: Vec2, now_ms: f64) {
        self.last_click = Some((pos, now_ms));
    }

    /// Whether a double-click at `pos` lands on the click effect that just fired.
    pub fn repeats_last_click(
        &self,
        pos: Vec2,
        now_ms: f64,
        window_ms: f64,
        tolerance_px: f32,
    ) -> bool {
        match self.last_click {
            Some((at, when)) => now_ms - when <= window_ms && at.distance(pos) <= tolerance_px,
            None => false,
        }
    }
}
