//! Puppy Quest headless driver
//!
//! Generates plans and runs levels with scripted input at a fixed frame
//! rate. Rendering and audio are external; events are logged instead.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use puppy_quest::Tuning;
use puppy_quest::sim::{
    EventSink, GameEvent, GameInfo, InputState, Level, LevelGenerator, SoundCue, Status,
};

#[derive(Parser, Debug)]
#[command(name = "puppy-quest")]
#[command(about = "Headless driver for the Puppy Quest platformer simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a generated level plan
    Generate {
        #[arg(long, default_value_t = 1)]
        difficulty: u32,
        /// Random when omitted
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run a level with scripted input and report the outcome
    Simulate {
        #[arg(long, default_value_t = 1)]
        difficulty: u32,
        #[arg(long)]
        seed: Option<u64>,
        /// Plan file (one row per line) instead of a generated level
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Tuning JSON; missing fields keep their defaults
        #[arg(long)]
        tuning: Option<PathBuf>,
        #[arg(long, default_value_t = 30.0)]
        seconds: f64,
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
        #[arg(long, value_enum, default_value_t = Script::JumpRight)]
        script: Script,
        /// Print a JSON snapshot instead of a summary
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// Canned input sequences
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Script {
    /// Hold right
    Right,
    /// Hold right, hopping periodically
    JumpRight,
    Idle,
}

impl Script {
    fn input(self, frame: u64) -> InputState {
        match self {
            Script::Right => InputState {
                right: true,
                ..Default::default()
            },
            Script::JumpRight => InputState {
                right: true,
                up: frame % 30 < 12,
                ..Default::default()
            },
            Script::Idle => InputState::default(),
        }
    }
}

/// Logs every event and tallies a few interesting ones
#[derive(Debug, Default, Serialize)]
struct LogSink {
    events: u64,
    jumps: u64,
    pickups: u64,
}

impl EventSink for LogSink {
    fn handle(&mut self, event: GameEvent) {
        self.events += 1;
        match event {
            GameEvent::Sound(SoundCue::Jump | SoundCue::WallJump) => self.jumps += 1,
            GameEvent::Sound(SoundCue::Collect | SoundCue::PowerUp) => self.pickups += 1,
            _ => {}
        }
        log::debug!("event: {:?}", event);
    }
}

#[derive(Serialize)]
struct Snapshot<'a> {
    frames: u64,
    finished: bool,
    status: Option<Status>,
    info: &'a GameInfo,
    events: &'a LogSink,
    level: &'a Level,
}

fn load_plan(path: &PathBuf) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading plan {}", path.display()))?;
    Ok(text
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

fn load_tuning(path: Option<&PathBuf>) -> Result<Tuning> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading tuning {}", path.display()))?;
    let tuning = Tuning::from_json_str(&text)
        .with_context(|| format!("loading tuning {}", path.display()))?;
    Ok(tuning)
}

fn generate(difficulty: u32, seed: Option<u64>) -> Vec<String> {
    let generator = LevelGenerator::new(difficulty);
    match seed {
        Some(seed) => generator.generate_seeded(seed),
        None => generator.generate(),
    }
}

#[allow(clippy::too_many_arguments)]
fn simulate(
    difficulty: u32,
    seed: Option<u64>,
    plan: Option<PathBuf>,
    tuning: Option<PathBuf>,
    seconds: f64,
    fps: f64,
    script: Script,
    json: bool,
) -> Result<()> {
    ensure!(fps > 0.0, "--fps must be positive");
    ensure!(seconds >= 0.0, "--seconds must not be negative");

    let plan = match plan {
        Some(path) => load_plan(&path)?,
        None => generate(difficulty, seed),
    };
    let tuning = load_tuning(tuning.as_ref())?;

    let mut info = GameInfo::default();
    let mut level = Level::with_tuning(&plan, &mut info, tuning).context("building level")?;
    log::info!(
        "Simulating {}x{} level with {} bones for {:.1}s at {} fps",
        level.grid().width(),
        level.grid().height(),
        info.total_bone,
        seconds,
        fps
    );

    let dt = 1.0 / fps;
    let max_frames = (seconds * fps).ceil() as u64;
    let mut sink = LogSink::default();
    let mut frames = 0;
    while frames < max_frames && !level.is_finished() {
        level.animate(dt, &script.input(frames), &mut info);
        level.forward_events(&mut sink);
        frames += 1;
    }

    if json {
        let snapshot = Snapshot {
            frames,
            finished: level.is_finished(),
            status: level.status(),
            info: &info,
            events: &sink,
            level: &level,
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let status = match level.status() {
        Some(Status::Won) => "won",
        Some(Status::Lost) => "lost",
        None => "unresolved",
    };
    println!("status:  {}", status);
    println!("time:    {:.2}s ({} frames)", level.timer(), frames);
    println!("bones:   {}/{}", info.total_bone - info.bone, info.total_bone);
    println!("score:   {}", info.score);
    println!("combo:   {}", level.combo());
    println!(
        "events:  {} ({} jumps, {} pickups)",
        sink.events, sink.jumps, sink.pickups
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { difficulty, seed } => {
            for row in generate(difficulty, seed) {
                println!("{}", row);
            }
            Ok(())
        }
        Commands::Simulate {
            difficulty,
            seed,
            plan,
            tuning,
            seconds,
            fps,
            script,
            json,
        } => simulate(difficulty, seed, plan, tuning, seconds, fps, script, json),
    }
}
