//! In-memory host: a surface that records draw commands, an input source that records its
//! listeners, and a scheduler that only fires when told to. Used by the simulator and by tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use glam::{Vec2, Vec4};
use tracing::trace;

use crate::{
    Canvas2d, DrawSurface, FrameRequest, FrameScheduler, GradientStop, Host, InputSource, Result,
    Subscription, SurfaceSize,
};

pub const DEFAULT_SURFACE_ID: &str = "particle-canvas";
pub const DEFAULT_REGION_ID: &str = "particle-area";

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Rect {
        min: Vec2,
        size: Vec2,
        color: Vec4,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Vec4,
    },
    RadialGradient {
        center: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        stops: Vec<GradientStop>,
    },
}

/// Commands drawn since the last `clear`, i.e. the most recent frame.
#[derive(Debug, Default)]
pub struct DrawLog {
    pub commands: Vec<DrawCommand>,
    pub clears: usize,
}

impl Canvas2d for DrawLog {
    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
        self.clears += 1;
    }

    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Vec4) {
        self.commands.push(DrawCommand::Rect { min, size, color });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Vec4) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn fill_radial_gradient(
        &mut self,
        center: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        stops: &[GradientStop],
    ) {
        self.commands.push(DrawCommand::RadialGradient {
            center,
            inner_radius,
            outer_radius,
            stops: stops.to_vec(),
        });
    }
}

struct RecordingCanvas {
    log: Rc<RefCell<DrawLog>>,
}

impl Canvas2d for RecordingCanvas {
    fn clear(&mut self) {
        self.log.borrow_mut().clear();
    }

    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Vec4) {
        self.log.borrow_mut().fill_rect(min, size, color);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Vec4) {
        self.log.borrow_mut().fill_circle(center, radius, color);
    }

    fn fill_radial_gradient(
        &mut self,
        center: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        stops: &[GradientStop],
    ) {
        self.log
            .borrow_mut()
            .fill_radial_gradient(center, inner_radius, outer_radius, stops);
    }
}

pub struct RecordingSurface {
    container: Rc<Cell<SurfaceSize>>,
    buffer: SurfaceSize,
    canvas: Option<RecordingCanvas>,
}

impl RecordingSurface {
    fn new(container: Rc<Cell<SurfaceSize>>, log: Option<Rc<RefCell<DrawLog>>>) -> Self {
        Self {
            container,
            buffer: SurfaceSize::default(),
            canvas: log.map(|log| RecordingCanvas { log }),
        }
    }
}

impl DrawSurface for RecordingSurface {
    fn container_size(&self) -> SurfaceSize {
        self.container.get()
    }

    fn buffer_size(&self) -> SurfaceSize {
        self.buffer
    }

    fn set_buffer_size(&mut self, size: SurfaceSize) {
        self.buffer = size;
    }

    fn context_2d(&mut self) -> Option<&mut dyn Canvas2d> {
        self.canvas.as_mut().map(|c| c as &mut dyn Canvas2d)
    }
}

#[derive(Debug, Default)]
pub struct InputLog {
    pub active: HashSet<Subscription>,
    /// Every listen (`true`) / unlisten (`false`) call in order.
    pub history: Vec<(Subscription, bool)>,
}

pub struct RecordingInput {
    origin: Vec2,
    log: Rc<RefCell<InputLog>>,
}

impl InputSource for RecordingInput {
    fn region_origin(&self) -> Vec2 {
        self.origin
    }

    fn listen(&mut self, subscription: Subscription) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.active.insert(subscription);
        log.history.push((subscription, true));
        Ok(())
    }

    fn unlisten(&mut self, subscription: Subscription) {
        let mut log = self.log.borrow_mut();
        if log.active.remove(&subscription) {
            log.history.push((subscription, false));
        }
    }
}

#[derive(Debug, Default)]
pub struct SchedulerState {
    next_id: u64,
    pub pending: Vec<FrameRequest>,
    pub requested: usize,
    pub cancelled: usize,
}

pub struct ManualScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameRequest {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let request = FrameRequest(state.next_id);
        state.pending.push(request);
        state.requested += 1;
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let mut state = self.state.borrow_mut();
        let before = state.pending.len();
        state.pending.retain(|r| *r != request);
        if state.pending.len() != before {
            state.cancelled += 1;
        }
    }
}

/// Shared views into everything a [`HeadlessHost`] hands out.
#[derive(Clone, Default)]
pub struct HeadlessHandles {
    pub container: Rc<Cell<SurfaceSize>>,
    pub draw: Rc<RefCell<DrawLog>>,
    pub input: Rc<RefCell<InputLog>>,
    pub frames: Rc<RefCell<SchedulerState>>,
}

impl HeadlessHandles {
    /// Consume all pending frame requests; `true` if at least one was due.
    pub fn take_frame(&self) -> bool {
        let mut frames = self.frames.borrow_mut();
        let due = !frames.pending.is_empty();
        frames.pending.clear();
        due
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().pending.len()
    }

    pub fn is_listening(&self, subscription: Subscription) -> bool {
        self.input.borrow().active.contains(&subscription)
    }

    pub fn commands(&self) -> Vec<DrawCommand> {
        self.draw.borrow().commands.clone()
    }

    pub fn set_container_size(&self, size: SurfaceSize) {
        self.container.set(size);
    }
}

pub struct HeadlessHost {
    surface_id: String,
    region_id: String,
    region_origin: Vec2,
    context_available: bool,
    handles: HeadlessHandles,
}

impl HeadlessHost {
    pub fn new(size: SurfaceSize) -> Self {
        let handles = HeadlessHandles::default();
        handles.container.set(size);
        Self {
            surface_id: DEFAULT_SURFACE_ID.to_string(),
            region_id: DEFAULT_REGION_ID.to_string(),
            region_origin: Vec2::ZERO,
            context_available: true,
            handles,
        }
    }

    pub fn with_region_origin(mut self, origin: Vec2) -> Self {
        self.region_origin = origin;
        self
    }

    /// Surfaces handed out by this host will refuse to provide a 2-D context.
    pub fn without_context(mut self) -> Self {
        self.context_available = false;
        self
    }

    pub fn handles(&self) -> HeadlessHandles {
        self.handles.clone()
    }
}

impl Host for HeadlessHost {
    fn surface(&mut self, id: &str) -> Option<Box<dyn DrawSurface>> {
        if id != self.surface_id {
            trace!("headless host: unknown surface {id:?}");
            return None;
        }
        let log = self
            .context_available
            .then(|| Rc::clone(&self.handles.draw));
        Some(Box::new(RecordingSurface::new(
            Rc::clone(&self.handles.container),
            log,
        )))
    }

    fn input_region(&mut self, id: &str) -> Option<Box<dyn InputSource>> {
        if id != self.region_id {
            trace!("headless host: unknown region {id:?}");
            return None;
        }
        Some(Box::new(RecordingInput {
            origin: self.region_origin,
            log: Rc::clone(&self.handles.input),
        }))
    }

    fn scheduler(&mut self) -> Box<dyn FrameScheduler> {
        Box::new(ManualScheduler {
            state: Rc::clone(&self.handles.frames),
        })
    }
}
