//! Pointer timelines for headless runs: TOML scripts and a few built-in scenarios.

use std::path::Path;

use clap::ValueEnum;
use glam::Vec2;
use motes_platform::SurfaceSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid script: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },
}

/// One scripted action. Positions are surface-local pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Jump the pointer to a point.
    Move { x: f32, y: f32 },
    /// Move in a straight line over `frames` frames, one move per frame.
    Glide { x: f32, y: f32, frames: u32 },
    Wait { frames: u32 },
    /// Primary button down at the pointer.
    Press,
    /// Primary button up, followed by the click the host reports for it.
    Release,
    /// Press and release without any frame in between.
    Click,
    /// Two clicks and the double-click event.
    DoubleClick,
    Enter,
    Leave,
    Resize { width: u32, height: u32 },
    SetActive { active: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Frame interval in milliseconds; the CLI default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_ms: Option<f64>,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_toml_str(source: &str) -> Result<Self, ScriptError> {
        let script: Self = toml::from_str(source)?;
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    fn validate(&self) -> Result<(), ScriptError> {
        if let Some(frame_ms) = self.frame_ms {
            if frame_ms.is_nan() || frame_ms <= 0.0 {
                return Err(ScriptError::InvalidStep {
                    index: 0,
                    reason: format!("frame_ms must be positive, got {frame_ms}"),
                });
            }
        }
        for (index, step) in self.steps.iter().enumerate() {
            if let Step::Glide { frames: 0, .. } = step {
                return Err(ScriptError::InvalidStep {
                    index,
                    reason: "glide needs at least one frame".into(),
                });
            }
        }
        Ok(())
    }

    /// Total frames the script advances.
    pub fn frame_count(&self) -> u64 {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Glide { frames, .. } | Step::Wait { frames } => *frames as u64,
                _ => 0,
            })
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Rest in the middle until the orbit forms.
    Idle,
    /// Drag across the surface and back, then rest.
    Sweep,
    /// Form an orbit, then click in the middle of it.
    Click,
    /// Form an orbit, hold the button past the long-press threshold, release.
    LongPress,
}

impl Scenario {
    pub fn script(self, size: SurfaceSize) -> Script {
        let center = size.center();
        let at = |p: Vec2| Step::Move { x: p.x, y: p.y };
        let steps = match self {
            Scenario::Idle => vec![at(center), Step::Wait { frames: 120 }],
            Scenario::Sweep => {
                let left = Vec2::new(size.width as f32 * 0.1, center.y);
                let right = Vec2::new(size.width as f32 * 0.9, center.y);
                vec![
                    at(left),
                    Step::Glide {
                        x: right.x,
                        y: right.y,
                        frames: 60,
                    },
                    Step::Glide {
                        x: left.x,
                        y: left.y,
                        frames: 60,
                    },
                    Step::Wait { frames: 30 },
                ]
            }
            Scenario::Click => vec![
                at(center),
                Step::Wait { frames: 60 },
                Step::Click,
                Step::Wait { frames: 60 },
            ],
            Scenario::LongPress => vec![
                at(center),
                Step::Wait { frames: 60 },
                Step::Press,
                Step::Wait { frames: 40 },
                Step::Release,
                Step::Wait { frames: 20 },
            ],
        };
        Script {
            frame_ms: None,
            steps,
        }
    }
}
