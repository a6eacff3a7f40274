//! Draw policies. A style clears the canvas and paints one frame from the particle list.

use glam::{Vec2, Vec4};
use motes_platform::{Canvas2d, GradientStop};

use crate::config::{EffectKind, EngineConfig};
use crate::effect::Head;
use crate::particle::{Particle, ParticleState};

pub trait Style {
    fn draw(&self, canvas: &mut dyn Canvas2d, particles: &[Particle], head: Option<&Head>);
}

pub fn style_for(config: &EngineConfig) -> Box<dyn Style> {
    match config.effect {
        EffectKind::Orbit => Box::new(SquareStyle::new(config)),
        EffectKind::Meteor => Box::new(MeteorStyle::new(config)),
    }
}

fn rgba(r: u8, g: u8, b: u8, a: f32) -> Vec4 {
    Vec4::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a)
}

fn with_alpha(color: Vec4, alpha: f32) -> Vec4 {
    Vec4::new(color.x, color.y, color.z, alpha.clamp(0.0, 1.0))
}

/// Filled squares of side `size` centred on each particle.
pub struct SquareStyle {
    color: Vec4,
}

impl SquareStyle {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            color: config.look.color,
        }
    }
}

impl Style for SquareStyle {
    fn draw(&self, canvas: &mut dyn Canvas2d, particles: &[Particle], _head: Option<&Head>) {
        canvas.clear();
        for p in particles {
            let side = Vec2::splat(p.size);
            canvas.fill_rect(
                p.pos - side / 2.0,
                side,
                with_alpha(self.color, p.opacity * self.color.w),
            );
        }
    }
}

const SPARK_ALPHA: f32 = 0.9;
/// Circles at or below this size are not drawn.
const MIN_DRAW_SIZE: f32 = 0.1;
const MIN_HEAD_SIZE: f32 = 0.5;

/// Round tail and spark particles, then the glowing head on top.
pub struct MeteorStyle {
    color: Vec4,
    flare_size_boost: f32,
}

impl MeteorStyle {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            color: config.look.color,
            flare_size_boost: config.meteor.flare_size_boost,
        }
    }

    fn draw_head(&self, canvas: &mut dyn Canvas2d, head: &Head) {
        let b = head.brightness;

        let glow = head.glow_size * b;
        if glow > MIN_HEAD_SIZE {
            let inner = head.core_size
                * 0.3
                * if head.flaring {
                    self.flare_size_boost
                } else {
                    1.0
                };
            let stops = [
                GradientStop::new(
                    0.0,
                    rgba(255, 255, 240, ((0.3 + head.shine * 0.5) * b).min(0.8)),
                ),
                GradientStop::new(
                    0.7,
                    rgba(220, 230, 255, ((0.1 + head.shine * 0.2) * b).min(0.3)),
                ),
                GradientStop::new(1.0, rgba(200, 220, 255, 0.0)),
            ];
            canvas.fill_radial_gradient(head.pos, inner, glow, &stops);
        }

        let core = head.core_size;
        if core > MIN_HEAD_SIZE {
            let radius = core / 2.0;
            let blur = core * 1.5 * if head.flaring { 1.2 } else { 1.0 };
            let halo = [
                GradientStop::new(0.0, rgba(255, 255, 255, (0.7 * b).min(1.0))),
                GradientStop::new(1.0, rgba(255, 255, 255, 0.0)),
            ];
            canvas.fill_radial_gradient(head.pos, radius, radius + blur, &halo);

            let alpha = (b * if head.flaring { 1.1 } else { 1.0 }).min(1.0);
            canvas.fill_circle(head.pos, radius, rgba(255, 255, 255, alpha));
        }
    }
}

impl Style for MeteorStyle {
    fn draw(&self, canvas: &mut dyn Canvas2d, particles: &[Particle], head: Option<&Head>) {
        canvas.clear();
        let brightness = head.map_or(1.0, |h| h.brightness);
        for p in particles {
            if p.size <= MIN_DRAW_SIZE {
                continue;
            }
            let alpha = match p.state {
                ParticleState::Spark { .. } => p.opacity * SPARK_ALPHA,
                _ => p.opacity * brightness,
            };
            canvas.fill_circle(p.pos, p.size / 2.0, with_alpha(self.color, alpha));
        }
        if let Some(head) = head {
            self.draw_head(canvas, head);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleId;
    use motes_platform::headless::{DrawCommand, DrawLog};

    fn particle(pos: Vec2, size: f32, state: ParticleState) -> Particle {
        let mut p = Particle::new(ParticleId(0), pos, size, 10.0, state);
        p.opacity = 0.5;
        p
    }

    #[test]
    fn squares_are_centred() {
        let style = SquareStyle::new(&EngineConfig::default());
        let mut log = DrawLog::default();
        style.draw(
            &mut log,
            &[particle(Vec2::new(10.0, 10.0), 2.0, ParticleState::Trail)],
            None,
        );
        assert_eq!(log.commands.len(), 2);
        assert_eq!(log.commands[0], DrawCommand::Clear);
        assert_eq!(
            log.commands[1],
            DrawCommand::Rect {
                min: Vec2::new(9.0, 9.0),
                size: Vec2::new(2.0, 2.0),
                color: Vec4::new(1.0, 1.0, 1.0, 0.5),
            }
        );
    }

    #[test]
    fn meteor_skips_tiny_particles_and_draws_head_last() {
        let config = EngineConfig::for_effect(EffectKind::Meteor);
        let style = MeteorStyle::new(&config);
        let head = Head {
            pos: Vec2::new(5.0, 5.0),
            core_size: 2.5,
            glow_size: 10.0,
            brightness: 2.0,
            shine: 0.0,
            flaring: false,
        };
        let particles = [
            particle(Vec2::ZERO, 0.1, ParticleState::Tail { initial_size: 2.0 }),
            particle(Vec2::ONE, 2.0, ParticleState::Tail { initial_size: 2.0 }),
            particle(Vec2::ONE, 4.0, ParticleState::Spark { initial_size: 4.0 }),
        ];
        let mut log = DrawLog::default();
        style.draw(&mut log, &particles, Some(&head));

        let cmds = &log.commands;
        assert_eq!(cmds.len(), 6);
        // tail alpha is boosted by head brightness and clamped
        assert!(matches!(cmds[1], DrawCommand::Circle { color, .. } if color.w == 1.0));
        assert!(
            matches!(cmds[2], DrawCommand::Circle { radius, color, .. } if radius == 2.0 && (color.w - 0.45).abs() < 1e-6)
        );
        match &cmds[3] {
            DrawCommand::RadialGradient {
                inner_radius,
                outer_radius,
                stops,
                ..
            } => {
                assert!((inner_radius - 0.75).abs() < 1e-6);
                assert_eq!(*outer_radius, 20.0);
                assert_eq!(stops.len(), 3);
                assert!((stops[0].color.w - 0.6).abs() < 1e-6);
            }
            other => panic!("expected glow, got {other:?}"),
        }
        assert!(matches!(cmds[4], DrawCommand::RadialGradient { .. }));
        assert!(
            matches!(cmds[5], DrawCommand::Circle { center, radius, .. } if center == head.pos && radius == 1.25)
        );
    }
}
