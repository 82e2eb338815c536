//! Shared driver for the maze demos.
//!
//! A [`Session`] owns one [`RouteFinder`] (and through it one grid) and
//! advances it according to a [`RunConfig`]. The `maze-solve` binary is a
//! thin wrapper that builds the config from the command line.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use maze_core::Grid;
use maze_route::{RouteError, RouteFinder};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Command-line arguments of `maze-solve`.
#[derive(Debug, Parser)]
#[command(
    name = "maze-solve",
    version,
    about = "Step a depth-first search through a text maze"
)]
pub struct CliArgs {
    /// Maze text file ('.', '#', 'e', 'x').
    #[arg(required_unless_present = "resume", conflicts_with = "resume")]
    pub maze: Option<PathBuf>,

    /// Resume a search saved with --save instead of starting a new one.
    #[arg(long, value_name = "FILE")]
    pub resume: Option<PathBuf>,

    /// Stop after this many steps (default: run until the search ends).
    #[arg(short = 'n', long, value_name = "N")]
    pub steps: Option<usize>,

    /// Save the search state here when done.
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,

    /// Print the maze after every step.
    #[arg(long)]
    pub trace: bool,
}

/// Where the search comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Start a fresh search of a maze text file.
    Maze(PathBuf),
    /// Continue a saved search.
    Resume(PathBuf),
}

/// Configuration for a [`Session`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub source: Source,
    pub steps: Option<usize>,
    pub save: Option<PathBuf>,
    pub trace: bool,
}

impl RunConfig {
    /// Build a config from parsed arguments.
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let source = match (args.maze, args.resume) {
            (_, Some(saved)) => Source::Resume(saved),
            (Some(maze), None) => Source::Maze(maze),
            (None, None) => bail!("either a maze file or --resume is required"),
        };
        Ok(Self {
            source,
            steps: args.steps,
            save: args.save,
            trace: args.trace,
        })
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The exit was reached.
    Solved,
    /// The search proved there is no route.
    NoRoute,
    /// The step limit was hit first.
    Paused,
}

impl Outcome {
    /// Process exit code for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Solved | Outcome::Paused => 0,
            Outcome::NoRoute => 2,
        }
    }
}

/// Owns the route finder being driven.
#[derive(Debug)]
pub struct Session {
    finder: RouteFinder,
}

impl Session {
    /// Wrap an existing finder.
    pub fn new(finder: RouteFinder) -> Self {
        Self { finder }
    }

    /// Open a fresh or saved search.
    pub fn open(source: &Source) -> Result<Self> {
        let finder = match source {
            Source::Maze(path) => {
                let grid = Grid::from_path(path)
                    .with_context(|| format!("failed to load maze from {}", path.display()))?;
                RouteFinder::new(grid)
            }
            Source::Resume(path) => RouteFinder::load(path)
                .with_context(|| format!("failed to resume search from {}", path.display()))?,
        };
        log::info!("opened {} search ({})", finder.phase(), describe(source));
        Ok(Self { finder })
    }

    /// The finder being driven.
    pub fn finder(&self) -> &RouteFinder {
        &self.finder
    }

    /// Step until the search ends or `limit` steps have been taken. With
    /// `trace`, the maze is written to `out` after every step.
    pub fn advance<W: Write>(
        &mut self,
        limit: Option<usize>,
        trace: bool,
        out: &mut W,
    ) -> Result<Outcome> {
        let mut taken = 0;
        let outcome = loop {
            if self.finder.is_solved() {
                break Outcome::Solved;
            }
            if limit.is_some_and(|n| taken >= n) {
                break Outcome::Paused;
            }
            taken += 1;
            let result = self.finder.step();
            if trace {
                writeln!(out, "step {taken}:\n{}\n", self.finder)?;
            }
            match result {
                Ok(true) => break Outcome::Solved,
                Ok(false) => {}
                Err(RouteError::NoRouteFound) => break Outcome::NoRoute,
            }
        };
        log::debug!("{taken} steps taken, outcome {outcome:?}");
        Ok(outcome)
    }

    /// Write the final maze and a one-line summary to `out`.
    pub fn report<W: Write>(&self, outcome: Outcome, out: &mut W) -> Result<()> {
        writeln!(out, "{}\n", self.finder)?;
        match outcome {
            Outcome::Solved => {
                let route: Vec<String> = self.finder.route().iter().map(|p| p.to_string()).collect();
                writeln!(out, "solved in {} cells: {}", route.len(), route.join(" "))?;
            }
            Outcome::NoRoute => writeln!(
                out,
                "no route: {} cells explored, all dead ends",
                self.finder.dead_ends().len()
            )?,
            Outcome::Paused => writeln!(
                out,
                "paused: route has {} cells, {} dead ends",
                self.finder.route().len(),
                self.finder.dead_ends().len()
            )?,
        }
        Ok(())
    }
}

fn describe(source: &Source) -> String {
    match source {
        Source::Maze(p) => format!("maze {}", p.display()),
        Source::Resume(p) => format!("saved state {}", p.display()),
    }
}

/// Run a full session as configured and return its outcome.
pub fn run<W: Write>(config: &RunConfig, out: &mut W) -> Result<Outcome> {
    let mut session = Session::open(&config.source)?;
    let outcome = session.advance(config.steps, config.trace, out)?;
    session.report(outcome, out)?;
    if let Some(path) = &config.save {
        session
            .finder()
            .save(path)
            .with_context(|| format!("failed to save search to {}", path.display()))?;
        writeln!(out, "saved to {}", path.display())?;
    }
    Ok(outcome)
}
