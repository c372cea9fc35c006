//! Headless scenario runner.
//!
//! ```text
//! planner <scenario.json> [--ticks N]
//! ```
//!
//! Loads the scenario, runs `N` planning ticks (default 1) and prints one JSON
//! line per vehicle to stdout. Logs go to stderr.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use bevy::log::LogPlugin;
use bevy::prelude::*;

use planning::config::TICK_HZ;
use planning::scenario::{collect_reports, Scenario};
use planning::PlanningPlugin;

struct Args {
    scenario: PathBuf,
    ticks: u32,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut scenario = None;
    let mut ticks = 1;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ticks" => {
                let value = args.next().ok_or("--ticks needs a value")?;
                ticks = value
                    .parse()
                    .map_err(|e| format!("invalid --ticks value {value:?}: {e}"))?;
            }
            other if other.starts_with("--") => return Err(format!("unknown flag {other}")),
            other => {
                if scenario.replace(PathBuf::from(other)).is_some() {
                    return Err("only one scenario file may be given".to_string());
                }
            }
        }
    }

    Ok(Args {
        scenario: scenario.ok_or("usage: planner <scenario.json> [--ticks N]")?,
        ticks,
    })
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = Scenario::load(&args.scenario)?;

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
        .add_plugins(PlanningPlugin);

    // Initial update so plugin resources exist before the scenario overrides them.
    app.update();
    scenario.spawn(app.world_mut())?;

    // Ticks are driven directly instead of by wall-clock time so the output
    // only depends on the scenario and the tick count.
    for _ in 0..args.ticks {
        app.world_mut().run_schedule(FixedUpdate);
    }
    info!("ran {} planning ticks", args.ticks);

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    for report in collect_reports(app.world_mut()) {
        writeln!(stdout, "{}", serde_json::to_string(&report)?)?;
    }
    stdout.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("planner: {e}");
            ExitCode::FAILURE
        }
    }
}
