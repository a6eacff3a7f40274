//! Host abstraction traits so `motes-core` stays surface- and OS-agnostic.

use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

pub mod headless;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

/// One colour stop of a radial gradient. `offset` runs from 0 (inner circle) to 1 (outer circle).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Vec4,
}

impl GradientStop {
    pub fn new(offset: f32, color: Vec4) -> Self {
        Self { offset, color }
    }
}

/// Colour at `t` along sorted `stops`, clamped to the first and last stop.
pub fn sample_gradient(stops: &[GradientStop], t: f32) -> Vec4 {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Vec4::ZERO;
    };
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            if span <= f32::EPSILON {
                return b.color;
            }
            return a.color.lerp(b.color, (t - a.offset) / span);
        }
    }
    last.color
}

/// Immediate-mode 2-D drawing context. Colours are straight (unpremultiplied) RGBA in 0..=1.
pub trait Canvas2d {
    fn clear(&mut self);
    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Vec4);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Vec4);
    fn fill_radial_gradient(
        &mut self,
        center: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        stops: &[GradientStop],
    );
}

/// Drawing surface sized to its container.
pub trait DrawSurface {
    /// Current size of the element the surface should fill.
    fn container_size(&self) -> SurfaceSize;
    /// Pixel dimensions of the drawing buffer.
    fn buffer_size(&self) -> SurfaceSize;
    fn set_buffer_size(&mut self, size: SurfaceSize);
    /// `None` when the backend cannot provide a 2-D context.
    fn context_2d(&mut self) -> Option<&mut dyn Canvas2d>;
}

/// Listener sets an engine can hold on its input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subscription {
    /// move / enter / leave / click / double-click / button-down on the bounded region.
    Region,
    /// Host resize notification.
    Resize,
    /// Window-wide move and button-up, held only while a press is being tracked.
    PressCapture,
}

/// Where a raw event was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOrigin {
    Region,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Pointer input as the host sees it. Positions are client (window) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPointerEvent {
    Move { client: Vec2 },
    Enter,
    Leave,
    Click { client: Vec2 },
    DoubleClick { client: Vec2 },
    ButtonDown { client: Vec2, button: PointerButton },
    ButtonUp { client: Vec2, button: PointerButton },
    Resize,
}

/// Source of pointer events for one bounded region.
pub trait InputSource {
    /// Client-space position of the region's top-left corner.
    fn region_origin(&self) -> Vec2;
    fn listen(&mut self, subscription: Subscription) -> Result<()>;
    /// Removing a listener that is not installed is a no-op.
    fn unlisten(&mut self, subscription: Subscription);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Display-refresh driven frame pacing.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequest;
    /// Cancelling a request that already fired or was cancelled is a no-op.
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Resolves the handles an engine binds to at construction.
pub trait Host {
    fn surface(&mut self, id: &str) -> Option<Box<dyn DrawSurface>>;
    fn input_region(&mut self, id: &str) -> Option<Box<dyn InputSource>>;
    fn scheduler(&mut self) -> Box<dyn FrameScheduler>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_interpolates_between_stops() {
        let stops = [
            GradientStop::new(0.0, Vec4::new(1.0, 1.0, 1.0, 0.8)),
            GradientStop::new(0.5, Vec4::new(1.0, 1.0, 1.0, 0.4)),
            GradientStop::new(1.0, Vec4::ZERO),
        ];
        assert_eq!(sample_gradient(&stops, -1.0).w, 0.8);
        assert!((sample_gradient(&stops, 0.25).w - 0.6).abs() < 1e-6);
        assert!((sample_gradient(&stops, 0.75).w - 0.2).abs() < 1e-6);
        assert_eq!(sample_gradient(&stops, 2.0), Vec4::ZERO);
        assert_eq!(sample_gradient(&[], 0.5), Vec4::ZERO);
    }

    #[test]
    fn center_of_odd_size() {
        assert_eq!(SurfaceSize::new(5, 3).center(), Vec2::new(2.5, 1.5));
    }
}
