use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use motes_core::{EffectKind, EngineConfig};
use motes_platform::SurfaceSize;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod error;
mod script;
mod simulate;
mod snapshot;

use error::AppError;
use script::{Scenario, Script, Step};
use simulate::Simulation;

#[derive(Debug, Parser)]
#[command(name = "motes", version, about = "Cursor-reactive particle effects")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open a window running the effect.
    Window(EngineArgs),
    /// Run the engine headlessly against a pointer script and report the particle counts.
    Simulate(SimulateArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EffectArg {
    Orbit,
    Meteor,
}

impl From<EffectArg> for EffectKind {
    fn from(arg: EffectArg) -> Self {
        match arg {
            EffectArg::Orbit => EffectKind::Orbit,
            EffectArg::Meteor => EffectKind::Meteor,
        }
    }
}

#[derive(Debug, Args)]
struct EngineArgs {
    /// Engine configuration (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured effect.
    #[arg(short, long, value_enum)]
    effect: Option<EffectArg>,

    /// Fixed RNG seed.
    #[arg(long)]
    seed: Option<u64>,
}

impl EngineArgs {
    fn load(&self) -> Result<EngineConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(effect) = self.effect {
            config.effect = effect.into();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        Ok(config)
    }
}

#[derive(Debug, Args)]
struct SimulateArgs {
    #[command(flatten)]
    engine: EngineArgs,

    /// Pointer script (TOML). Takes precedence over --scenario.
    #[arg(short, long)]
    script: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "idle")]
    scenario: Scenario,

    /// Extra frames to run after the script.
    #[arg(short, long, default_value_t = 0)]
    frames: u32,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Frame interval in milliseconds, unless the script sets one.
    #[arg(long, default_value_t = 16.0)]
    frame_ms: f64,

    /// Write the last frame to this PNG file.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

fn simulate(args: &SimulateArgs) -> Result<(), AppError> {
    let config = args.engine.load()?;
    let size = SurfaceSize::new(args.width, args.height);
    let mut script = match &args.script {
        Some(path) => Script::load(path)?,
        None => args.scenario.script(size),
    };
    if args.frames > 0 {
        script.steps.push(Step::Wait {
            frames: args.frames,
        });
    }
    info!(
        effect = config.effect.name(),
        frames = script.frame_count(),
        "simulating"
    );

    let mut simulation = Simulation::new(config, size, args.frame_ms)?;
    simulation.run(&script);
    let report = simulation.report();

    if let Some(path) = &args.snapshot {
        let frame = snapshot::rasterize(&simulation.commands(), simulation.engine().buffer_size());
        snapshot::save_png(&frame, path)?;
        info!(path = %path.display(), "snapshot written");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Window(args) => {
            let config = args.load()?;
            info!(effect = config.effect.name(), "opening window");
            motes_ui::run_window(config).map_err(|e| AppError::Window(e.to_string()))
        }
        Command::Simulate(args) => simulate(&args),
    }
}

fn main() {
    let cli = Cli::parse();

    // Init logging
    let (level, directive) = if cli.verbose {
        (Level::DEBUG, "debug")
    } else {
        (Level::INFO, "info")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    info!("Motes starting");
    if let Err(e) = run(cli) {
        eprintln!("Motes error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn simulate_flags_parse() {
        let cli = Cli::parse_from([
            "motes",
            "simulate",
            "--effect",
            "meteor",
            "--scenario",
            "long-press",
            "--frames",
            "30",
            "--json",
        ]);
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert!(args.json);
        assert_eq!(args.frames, 30);
        assert_eq!(args.scenario, Scenario::LongPress);
        let config = args.engine.load().unwrap();
        assert_eq!(config.effect, EffectKind::Meteor);
    }

    #[test]
    fn config_file_and_overrides_combine() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"seed = 1\n[orbit]\norbital_count = 8\n").unwrap();
        let args = EngineArgs {
            config: Some(file.path().to_path_buf()),
            effect: None,
            seed: Some(99),
        };
        let config = args.load().unwrap();
        assert_eq!(config.orbit.orbital_count, 8);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.effect, EffectKind::Orbit);
    }
}
