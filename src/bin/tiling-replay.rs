use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, bail};
use clap::Parser;
use serde::Deserialize;
use tiling_core::common::config::{Config, config_file};
use tiling_core::common::log;
use tiling_core::layout_engine::{LayoutCommand, LayoutEngine, LayoutEvent};
use tracing::{info, warn};

/// Replays a script of layout events and commands and prints the resulting
/// workspace trees.
#[derive(Parser)]
struct Cli {
    /// JSON-lines script to replay. Reads stdin when omitted.
    script: Option<PathBuf>,

    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Check tree invariants after every step and stop at the first violation.
    #[arg(long)]
    check: bool,

    /// Print the trees after every step instead of only at the end.
    #[arg(long)]
    trace: bool,

    /// Keep going when a step is rejected by the engine.
    #[arg(long)]
    keep_going: bool,
}

/// One line of a script, e.g. `{"command":{"move_focus":"left"}}`.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
enum Step {
    Event(LayoutEvent),
    Command(LayoutCommand),
}

fn main() {
    let opt = Cli::parse();
    log::init_logging();
    if let Err(e) = run(&opt) {
        eprintln!("{e:#}");
        process::exit(1);
    }
}

fn load_config(opt: &Cli) -> anyhow::Result<Config> {
    let path = opt.config.clone().unwrap_or_else(config_file);
    let config = if path.exists() {
        Config::read(&path).with_context(|| format!("reading {}", path.display()))?
    } else {
        info!(path = %path.display(), "no config file, using defaults");
        Config::bundled()?
    };
    let issues = config.validate();
    if !issues.is_empty() {
        bail!("invalid configuration:\n  {}", issues.join("\n  "));
    }
    Ok(config)
}

fn run(opt: &Cli) -> anyhow::Result<()> {
    let config = load_config(opt)?;
    let mut engine = LayoutEngine::new(config);

    let input: Box<dyn BufRead> = match &opt.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    for (index, line) in input.lines().enumerate() {
        let lineno = index + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step: Step =
            serde_json::from_str(line).with_context(|| format!("line {lineno}: bad step"))?;
        let result = match step {
            Step::Event(event) => engine.handle_event(event),
            Step::Command(command) => engine.handle_command(command),
        };
        match result {
            Ok(response) => {
                info!(lineno, changed = response.changed.len(), focus = ?response.focus_window, "applied");
            }
            Err(e) if opt.keep_going => warn!(lineno, "step rejected: {e}"),
            Err(e) => bail!("line {lineno}: {e}"),
        }

        if opt.check {
            let issues = engine.consistency_issues();
            if !issues.is_empty() {
                bail!("line {lineno}: broken invariants:\n  {}", issues.join("\n  "));
            }
        }
        if opt.trace {
            println!("after line {lineno}:");
            print_trees(&engine)?;
        }
    }

    if !opt.trace {
        print_trees(&engine)?;
    }
    Ok(())
}

fn print_trees(engine: &LayoutEngine) -> anyhow::Result<()> {
    for id in engine.workspaces().ids() {
        let marker = if id == engine.focused_workspace() { " (focused)" } else { "" };
        println!("workspace {id}{marker}");
        print!("{}", engine.draw_tree(id)?);
    }
    Ok(())
}
