#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line harness that explores a simulated maze.

mod settings;

use std::{fs, path::Path, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use micromouse_core::{to_list_grid, Event, EventError, PositionReset, StartData};
use micromouse_maze::WallGrid;
use micromouse_simulator::{generate_maze, SimulatedMouse};
use micromouse_system_explorer::{RunOutcome, RunStatus, Session};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use settings::Settings;

const DEFAULT_FILTER: &str = "micromouse=info";

/// Explores a simulated 16x16 micromouse maze and prints what was learnt.
#[derive(Debug, Parser)]
#[command(name = "micromouse", version)]
pub(crate) struct Args {
    /// TOML settings file with `[explore]`, `[explore.tracker]` and `[simulator]` sections.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Ground-truth layout file. A maze is generated when absent.
    #[arg(long)]
    maze: Option<PathBuf>,
    /// Seed for the generated maze and sensor noise.
    #[arg(long)]
    seed: Option<u64>,
    /// Share of interior walls removed from a generated maze.
    #[arg(long, default_value_t = 0.1)]
    braid: f64,
    /// Number of consecutive runs.
    #[arg(long, default_value_t = 1)]
    runs: u32,
    /// Time budget of each run in seconds.
    #[arg(long, default_value_t = 60.0)]
    time: f64,
    /// Ends each run after this many seconds.
    #[arg(long)]
    cancel_after: Option<f64>,
    /// Start position in map coordinates.
    #[arg(long, value_parser = parse_point, default_value = "-7.5,-7.5", allow_hyphen_values = true)]
    start: (f64, f64),
    /// Start heading in degrees.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    heading: f64,
    /// Goal position in map coordinates.
    #[arg(long, value_parser = parse_point, default_value = "0,0", allow_hyphen_values = true)]
    goal: (f64, f64),
    /// Replays JSON-lines session events instead of synthesising runs.
    #[arg(long, conflicts_with_all = ["runs", "time", "cancel_after", "start", "heading", "goal"])]
    events: Option<PathBuf>,
}

fn parse_point(text: &str) -> Result<(f64, f64), String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got `{text}`"))?;
    let coordinate = |part: &str| {
        part.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| format!("`{part}` is not a finite coordinate"))
    };
    Ok((coordinate(x)?, coordinate(y)?))
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(run(args))
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let explore = settings
        .explore
        .validate()
        .context("invalid [explore] settings")?;
    let mut simulator = settings.simulator;
    if let Some(seed) = args.seed {
        simulator.seed = seed;
    }
    if simulator.tiles_per_second != explore.tracker.tiles_per_second {
        warn!(
            body = simulator.tiles_per_second,
            tracker = explore.tracker.tiles_per_second,
            "simulated body and tracker disagree on speed"
        );
    }

    let truth = match &args.maze {
        Some(path) => load_layout(path)?,
        None => generate_maze(simulator.seed, args.braid),
    };
    info!(closed = truth.closed_count(), "ground truth ready");

    let mouse = Arc::new(
        SimulatedMouse::new(truth, simulator).context("invalid [simulator] settings")?,
    );
    let mut session = Session::new(Arc::clone(&mouse), explore);

    match &args.events {
        Some(path) => replay(path, &mouse, &mut session).await,
        None => synthesise(&args, &mouse, &mut session).await,
    }
}

async fn synthesise(
    args: &Args,
    mouse: &SimulatedMouse,
    session: &mut Session<SimulatedMouse>,
) -> Result<()> {
    let cancel_after = args
        .cancel_after
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("--cancel-after must be a non-negative number of seconds")?;

    for run_number in 1..=args.runs {
        let reset = PositionReset {
            run_number,
            runs_remaining: args.runs - run_number,
            position: args.start,
            rotation: args.heading,
            target_position: args.goal,
        };
        mouse.place(reset.start(), reset.rotation);
        let _ = session.handle(Event::PositionReset { data: reset }).await?;
        let _ = session
            .handle(Event::Start {
                data: StartData {
                    time_remaining: args.time,
                },
            })
            .await?;

        let outcome = match cancel_after {
            Some(delay) => {
                tokio::time::sleep(delay).await;
                session.handle(Event::End { complete: false }).await?
            }
            None => session.wait().await?,
        };
        report(run_number, outcome, mouse, session);
    }
    Ok(())
}

async fn replay(
    path: &Path,
    mouse: &SimulatedMouse,
    session: &mut Session<SimulatedMouse>,
) -> Result<()> {
    let script = fs::read_to_string(path)
        .with_context(|| format!("failed to read events at {}", path.display()))?;

    let mut announced = 0;
    let mut active = 0;
    for (index, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event = match Event::decode(line) {
            Ok(event) => event,
            Err(EventError::UnknownKind(kind)) => {
                warn!(line = index + 1, %kind, "skipping unknown event");
                continue;
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("{}:{}", path.display(), index + 1));
            }
        };

        if let Event::PositionReset { data } = &event {
            mouse.place(data.start(), data.rotation);
            announced = data.run_number;
        }
        let starts = matches!(event, Event::Start { .. });
        if let Some(outcome) = session.handle(event).await? {
            report(active, Some(outcome), mouse, session);
        }
        if starts {
            active = announced;
        }
    }

    if let Some(outcome) = session.wait().await? {
        report(active, Some(outcome), mouse, session);
    }
    Ok(())
}

fn load_layout(path: &Path) -> Result<WallGrid> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read maze layout at {}", path.display()))?;
    let walls = WallGrid::parse_layout(&text)
        .with_context(|| format!("failed to parse maze layout at {}", path.display()))?;
    if walls.closed_count() == 0 {
        bail!("maze layout at {} has no walls", path.display());
    }
    Ok(walls)
}

fn report(
    run_number: u32,
    outcome: Option<RunOutcome>,
    mouse: &SimulatedMouse,
    session: &Session<SimulatedMouse>,
) {
    match outcome {
        Some(RunOutcome::Finished {
            status,
            tiles_travelled,
        }) => println!(
            "run {run_number}: {} after {tiles_travelled} tiles",
            describe(&status)
        ),
        Some(RunOutcome::Failed(error)) => println!("run {run_number}: failed: {error}"),
        None => println!("run {run_number}: no run was active"),
    }

    if let Some(maze) = session.maze() {
        println!("{} walls known", maze.walls().closed_count());
        println!("{}", maze.render(Some(to_list_grid(mouse.position()))));
    }
}

fn describe(status: &RunStatus) -> String {
    match status {
        RunStatus::GoalReached => "goal reached".to_owned(),
        RunStatus::BudgetExhausted => "time budget spent".to_owned(),
        RunStatus::Cancelled => "cancelled".to_owned(),
        RunStatus::Stranded { tile } => format!("stranded at {tile}"),
    }
}
