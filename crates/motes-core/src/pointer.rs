use glam::Vec2;

/// Last known pointer position and movement timing, in surface-local coordinates and engine
/// clock milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerTracker {
    pub pos: Vec2,
    /// Position at the end of the previous frame.
    pub prev: Vec2,
    pub last_move_ms: f64,
    /// False after the pointer left the region, until it enters or moves again.
    pub inside: bool,
}

impl PointerTracker {
    pub fn new(pos: Vec2, now_ms: f64) -> Self {
        Self {
            pos,
            prev: pos,
            last_move_ms: now_ms,
            inside: true,
        }
    }

    /// Record a move. `stamp` refreshes the last-move time; a confirmed long-press moves the
    /// pointer without counting as movement.
    pub fn moved_to(&mut self, pos: Vec2, now_ms: f64, stamp: bool) {
        self.pos = pos;
        self.inside = true;
        if stamp {
            self.last_move_ms = now_ms;
        }
    }

    pub fn idle_for(&self, now_ms: f64) -> f64 {
        now_ms - self.last_move_ms
    }

    /// Pretend the last move happened `by_ms` ago, forcing the next stationary check through.
    pub fn backdate(&mut self, now_ms: f64, by_ms: f64) {
        self.last_move_ms = now_ms - by_ms;
    }

    /// Distance covered since the previous frame.
    pub fn travelled(&self) -> f32 {
        self.pos.distance(self.prev)
    }

    pub fn end_frame(&mut self) {
        self.prev = self.pos;
    }
}
