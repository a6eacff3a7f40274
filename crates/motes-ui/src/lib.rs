use egui::{Color32, Rect};
use glam::Vec2;
use motes_core::{EffectKind, Engine, EngineConfig};
use motes_platform::headless::{DEFAULT_REGION_ID, DEFAULT_SURFACE_ID};
use motes_platform::{EventOrigin, RawPointerEvent, SurfaceSize};
use tracing::info;

pub mod host;

use host::{EguiHost, HostShared, PointerBridge};

/// Open a native window running the engine until it is closed.
pub fn run_window(config: EngineConfig) -> eframe::Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Motes")
            .with_inner_size([960.0, 640.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Motes",
        native_options,
        Box::new(move |creation_context| {
            let app = MotesApp::new(&creation_context.egui_ctx, config)?;
            Ok(Box::new(app))
        }),
    )
}

pub struct MotesApp {
    engine: Engine,
    host: HostShared,
    bridge: PointerBridge,
    last_rect: Option<Rect>,
}

impl MotesApp {
    pub fn new(context: &egui::Context, config: EngineConfig) -> motes_core::Result<Self> {
        let mut host = EguiHost::new(context.clone(), SurfaceSize::new(960, 600));
        let shared = host.shared();
        let engine = Engine::new(&mut host, DEFAULT_SURFACE_ID, DEFAULT_REGION_ID, config)?;
        Ok(Self {
            engine,
            host: shared,
            bridge: PointerBridge::default(),
            last_rect: None,
        })
    }

    /// Keep the region origin and container size in step with the painter rect.
    fn sync_rect(&mut self, rect: Rect) {
        if self.last_rect == Some(rect) {
            return;
        }
        self.host.origin.set(Vec2::new(rect.min.x, rect.min.y));
        let size = SurfaceSize::new(rect.width().max(0.0) as u32, rect.height().max(0.0) as u32);
        if self.host.container.get() != size {
            self.host.container.set(size);
            self.engine
                .dispatch(EventOrigin::Window, RawPointerEvent::Resize);
        }
        self.last_rect = Some(rect);
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let mut active = self.engine.is_active();
            if ui.checkbox(&mut active, "Active").changed() {
                self.engine.set_active(active);
            }

            let mut effect = self.engine.effect_kind();
            egui::ComboBox::from_label("Effect")
                .selected_text(effect.name())
                .show_ui(ui, |ui| {
                    for kind in EffectKind::ALL {
                        ui.selectable_value(&mut effect, kind, kind.name());
                    }
                });
            if effect != self.engine.effect_kind() {
                self.engine.set_effect(effect);
            }

            ui.separator();
            ui.label(format!("{} particles", self.engine.particles().len()));
        });
    }
}

impl eframe::App for MotesApp {
    fn update(&mut self, context: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("controls").show(context, |ui| self.controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(Color32::BLACK))
            .show(context, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::click());
                let rect = response.rect;
                self.sync_rect(rect);

                let events = ui.input(|i| i.events.clone());
                for event in &events {
                    for (origin, raw) in self.bridge.translate(event, rect) {
                        self.engine.dispatch(origin, raw);
                    }
                }
                if let Some(pos) = response.interact_pointer_pos() {
                    let client = Vec2::new(pos.x, pos.y);
                    if response.clicked() {
                        self.engine
                            .dispatch(EventOrigin::Region, RawPointerEvent::Click { client });
                    }
                    if response.double_clicked() {
                        self.engine.dispatch(
                            EventOrigin::Region,
                            RawPointerEvent::DoubleClick { client },
                        );
                    }
                }

                if self.host.take_due() {
                    let dt_ms = ui.input(|i| i.stable_dt) as f64 * 1000.0;
                    self.engine.on_frame(dt_ms);
                }
                painter.extend(self.host.shapes.placed_at(rect.min.to_vec2()));
            });
    }
}

impl Drop for MotesApp {
    fn drop(&mut self) {
        info!(
            particles = self.engine.particles().len(),
            "closing window"
        );
    }
}
