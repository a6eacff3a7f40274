//! egui-backed host: the engine draws into a shape list that the app paints each frame, input
//! arrives as translated egui events, and frame requests become repaint requests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use egui::{Color32, Pos2, Rect, Shape};
use glam::{Vec2, Vec4};
use motes_platform::headless::{DEFAULT_REGION_ID, DEFAULT_SURFACE_ID};
use motes_platform::{
    sample_gradient, Canvas2d, DrawSurface, EventOrigin, FrameRequest, FrameScheduler,
    GradientStop, Host, InputSource, PointerButton, RawPointerEvent, Result, Subscription,
    SurfaceSize,
};
use tracing::trace;

/// Circles used to approximate one radial gradient.
const GRADIENT_RINGS: usize = 12;

pub fn to_color32(color: Vec4) -> Color32 {
    let c = color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
    Color32::from_rgba_unmultiplied(
        c.x.round() as u8,
        c.y.round() as u8,
        c.z.round() as u8,
        c.w.round() as u8,
    )
}

fn pos2(v: Vec2) -> Pos2 {
    Pos2::new(v.x, v.y)
}

/// Concentric circles, outermost first, whose stacked alpha follows the gradient.
pub fn gradient_rings(inner_radius: f32, outer_radius: f32, stops: &[GradientStop]) -> Vec<(f32, Vec4)> {
    let span = outer_radius - inner_radius;
    let mut rings = Vec::with_capacity(GRADIENT_RINGS + 1);
    let mut covered = 0.0_f32;
    for i in 0..=GRADIENT_RINGS {
        let t = 1.0 - i as f32 / GRADIENT_RINGS as f32;
        let sample = sample_gradient(stops, t);
        let alpha = if sample.w <= covered {
            0.0
        } else {
            1.0 - (1.0 - sample.w) / (1.0 - covered)
        };
        covered += alpha * (1.0 - covered);
        rings.push((
            inner_radius + span * t,
            Vec4::new(sample.x, sample.y, sample.z, alpha),
        ));
    }
    rings
}

/// Shapes of the last drawn frame, in surface-local coordinates.
#[derive(Clone, Default)]
pub struct ShapeList(Rc<RefCell<Vec<Shape>>>);

impl ShapeList {
    /// Copy of the frame moved to where the surface sits on screen.
    pub fn placed_at(&self, offset: egui::Vec2) -> Vec<Shape> {
        self.0
            .borrow()
            .iter()
            .cloned()
            .map(|mut shape| {
                shape.translate(offset);
                shape
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    fn push(&self, shape: Shape) {
        self.0.borrow_mut().push(shape);
    }
}

struct ShapeCanvas {
    shapes: ShapeList,
}

impl Canvas2d for ShapeCanvas {
    fn clear(&mut self) {
        self.shapes.0.borrow_mut().clear();
    }

    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Vec4) {
        let rect = Rect::from_min_size(pos2(min), egui::vec2(size.x, size.y));
        self.shapes
            .push(Shape::rect_filled(rect, 0.0, to_color32(color)));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Vec4) {
        self.shapes
            .push(Shape::circle_filled(pos2(center), radius, to_color32(color)));
    }

    fn fill_radial_gradient(
        &mut self,
        center: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        stops: &[GradientStop],
    ) {
        for (radius, color) in gradient_rings(inner_radius, outer_radius, stops) {
            if radius > 0.0 && color.w > 0.0 {
                self.shapes
                    .push(Shape::circle_filled(pos2(center), radius, to_color32(color)));
            }
        }
    }
}

struct PainterSurface {
    container: Rc<Cell<SurfaceSize>>,
    buffer: SurfaceSize,
    canvas: ShapeCanvas,
}

impl DrawSurface for PainterSurface {
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
        Some(&mut self.canvas)
    }
}

struct EguiInput {
    origin: Rc<Cell<Vec2>>,
    listening: Rc<RefCell<HashSet<Subscription>>>,
}

impl InputSource for EguiInput {
    fn region_origin(&self) -> Vec2 {
        self.origin.get()
    }

    fn listen(&mut self, subscription: Subscription) -> Result<()> {
        trace!(?subscription, "listen");
        self.listening.borrow_mut().insert(subscription);
        Ok(())
    }

    fn unlisten(&mut self, subscription: Subscription) {
        if self.listening.borrow_mut().remove(&subscription) {
            trace!(?subscription, "unlisten");
        }
    }
}

struct RepaintScheduler {
    ctx: egui::Context,
    next_id: u64,
    due: Rc<Cell<Option<FrameRequest>>>,
}

impl FrameScheduler for RepaintScheduler {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        self.due.set(Some(request));
        self.ctx.request_repaint();
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.due.get() == Some(request) {
            self.due.set(None);
        }
    }
}

/// State shared between the host objects handed to the engine and the app that drives them.
#[derive(Clone, Default)]
pub struct HostShared {
    pub container: Rc<Cell<SurfaceSize>>,
    pub origin: Rc<Cell<Vec2>>,
    pub shapes: ShapeList,
    pub listening: Rc<RefCell<HashSet<Subscription>>>,
    pub due: Rc<Cell<Option<FrameRequest>>>,
}

impl HostShared {
    /// Whether the engine asked for a frame since the last call.
    pub fn take_due(&self) -> bool {
        self.due.take().is_some()
    }
}

pub struct EguiHost {
    ctx: egui::Context,
    shared: HostShared,
}

impl EguiHost {
    pub fn new(ctx: egui::Context, size: SurfaceSize) -> Self {
        let shared = HostShared::default();
        shared.container.set(size);
        Self { ctx, shared }
    }

    pub fn shared(&self) -> HostShared {
        self.shared.clone()
    }
}

impl Host for EguiHost {
    fn surface(&mut self, id: &str) -> Option<Box<dyn DrawSurface>> {
        if id != DEFAULT_SURFACE_ID {
            return None;
        }
        Some(Box::new(PainterSurface {
            container: Rc::clone(&self.shared.container),
            buffer: SurfaceSize::default(),
            canvas: ShapeCanvas {
                shapes: self.shared.shapes.clone(),
            },
        }))
    }

    fn input_region(&mut self, id: &str) -> Option<Box<dyn InputSource>> {
        if id != DEFAULT_REGION_ID {
            return None;
        }
        Some(Box::new(EguiInput {
            origin: Rc::clone(&self.shared.origin),
            listening: Rc::clone(&self.shared.listening),
        }))
    }

    fn scheduler(&mut self) -> Box<dyn FrameScheduler> {
        Box::new(RepaintScheduler {
            ctx: self.ctx.clone(),
            next_id: 0,
            due: Rc::clone(&self.shared.due),
        })
    }
}

fn map_button(button: egui::PointerButton) -> Option<PointerButton> {
    match button {
        egui::PointerButton::Primary => Some(PointerButton::Primary),
        egui::PointerButton::Secondary => Some(PointerButton::Secondary),
        egui::PointerButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Turns egui's raw pointer events into region/window events, synthesizing enter and leave
/// from the painter rect.
#[derive(Debug, Default)]
pub struct PointerBridge {
    inside: bool,
}

impl PointerBridge {
    pub fn translate(&mut self, event: &egui::Event, rect: Rect) -> Vec<(EventOrigin, RawPointerEvent)> {
        let mut out = Vec::new();
        match event {
            egui::Event::PointerMoved(pos) => {
                let client = Vec2::new(pos.x, pos.y);
                if rect.contains(*pos) {
                    if !self.inside {
                        self.inside = true;
                        out.push((EventOrigin::Region, RawPointerEvent::Enter));
                    }
                    out.push((EventOrigin::Region, RawPointerEvent::Move { client }));
                } else if self.inside {
                    self.inside = false;
                    out.push((EventOrigin::Region, RawPointerEvent::Leave));
                }
                out.push((EventOrigin::Window, RawPointerEvent::Move { client }));
            }
            egui::Event::PointerButton {
                pos,
                button,
                pressed,
                ..
            } => {
                let Some(button) = map_button(*button) else {
                    return out;
                };
                let client = Vec2::new(pos.x, pos.y);
                if !*pressed {
                    out.push((EventOrigin::Window, RawPointerEvent::ButtonUp { client, button }));
                } else if rect.contains(*pos) {
                    out.push((
                        EventOrigin::Region,
                        RawPointerEvent::ButtonDown { client, button },
                    ));
                }
            }
            egui::Event::PointerGone if self.inside => {
                self.inside = false;
                out.push((EventOrigin::Region, RawPointerEvent::Leave));
            }
            _ => {}
        }
        out
    }
}
