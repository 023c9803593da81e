//! Maze planning demo for the gmcts search engine.
//!
//! Builds a maze root, runs the search, and prints the recommended move and
//! the path the search currently judges best. Also evaluates how often the
//! recommendation lies on a shortest path across many seeds.

mod report;

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use gmcts::{
    games::Maze, DefaultPolicy, ImmediateReward, Mcts, MctsConfig, MonteCarloBackup,
    RandomRollout, State, Tree, Ucb1,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use report::{EvaluationResult, PlanReport};
use std::time::Instant;
use tracing::{debug, info};

/// Monte Carlo Tree Search maze planner.
#[derive(Parser)]
#[command(name = "gmcts-demo")]
#[command(about = "Plan in a grid maze with Monte Carlo Tree Search")]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search once and print the recommendation and best trace.
    Plan {
        #[command(flatten)]
        search: SearchArgs,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Search from many seeds and count optimal recommendations.
    Evaluate {
        #[command(flatten)]
        search: SearchArgs,

        /// Number of independent searches.
        #[arg(short, long, default_value = "100")]
        runs: usize,

        /// Seed of the first run; run i uses seed + i.
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

/// Maze and search parameters shared by all commands.
#[derive(Args, Clone, Debug)]
struct SearchArgs {
    /// Side length of the square maze.
    #[arg(long, default_value = "3")]
    size: u32,

    /// Number of search iterations.
    #[arg(short, long, default_value = "1500")]
    iterations: usize,

    /// UCB1 exploration constant.
    #[arg(short = 'c', long, default_value = "1.41")]
    exploration: f64,

    /// Probability in percent that a move slips sideways.
    #[arg(long, default_value = "0")]
    slip: u8,

    /// End the episode when the goal is reached.
    #[arg(long)]
    terminal_goal: bool,

    /// Use random rollouts of this depth instead of the immediate reward.
    #[arg(long)]
    rollout_depth: Option<usize>,

    /// Discount for rollout rewards.
    #[arg(long, default_value = "1.0")]
    discount: f64,

    /// Replay observed outcomes instead of re-performing transitions.
    #[arg(long)]
    replay: bool,
}

type MazeMcts = Mcts<Maze, Ucb1, Box<dyn DefaultPolicy<Maze>>, MonteCarloBackup, ChaCha8Rng>;

impl SearchArgs {
    fn maze(&self) -> Maze {
        let maze = Maze::new(self.size).with_slip(self.slip);
        if self.terminal_goal {
            maze.with_terminal_goal()
        } else {
            maze
        }
    }

    fn config(&self) -> MctsConfig {
        let config = MctsConfig::with_iterations(self.iterations).exploration(self.exploration);
        if self.replay {
            config.replay_outcomes()
        } else {
            config
        }
    }

    fn default_policy(&self) -> Box<dyn DefaultPolicy<Maze>> {
        match self.rollout_depth {
            Some(depth) => Box::new(RandomRollout::new(depth, self.discount)),
            None => Box::new(ImmediateReward),
        }
    }

    fn mcts(&self, seed: u64) -> MazeMcts {
        let config = self.config();
        let tree_policy = Ucb1::new(config.exploration);
        Mcts::new(
            config,
            tree_policy,
            self.default_policy(),
            MonteCarloBackup,
            ChaCha8Rng::seed_from_u64(seed),
        )
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            (1..=Maze::MAX_SIZE).contains(&self.size),
            "maze size must be between 1 and {}, got {}",
            Maze::MAX_SIZE,
            self.size
        );
        ensure!(self.slip <= 100, "slip must be a percentage, got {}", self.slip);
        ensure!(
            self.exploration.is_finite() && self.exploration >= 0.0,
            "exploration constant must be a non-negative number"
        );
        Ok(())
    }
}

/// Run one search and collect what it found.
fn plan(args: &SearchArgs, seed: u64) -> Result<PlanReport> {
    let mut tree = Tree::new(args.maze());
    let root = tree.root();
    let mut mcts = args.mcts(seed);

    let action = mcts
        .run(&mut tree, root)
        .with_context(|| format!("search from {:?} failed", args.maze().position()))?;
    let trace = mcts.best_trace(&tree, root);
    debug!(seed, %action, trace_len = trace.len(), "planned");

    Ok(PlanReport::new(&tree, root, &action, &trace))
}

/// Whether taking `action` from the start moves closer to the goal.
fn is_optimal(maze: &Maze, report: &PlanReport) -> bool {
    let (dx, dy) = report.direction.delta();
    let (x, y) = maze.position();
    maze.at(x + dx, y + dy).distance_to_goal() < maze.distance_to_goal()
}

fn cmd_plan(args: SearchArgs, seed: u64, json: bool) -> Result<()> {
    args.validate()?;
    info!(
        size = args.size,
        iterations = args.iterations,
        seed,
        "planning"
    );

    let start = Instant::now();
    let report = plan(&args, seed)?;
    let elapsed = start.elapsed();

    if json {
        let text = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{text}");
        return Ok(());
    }

    println!("Searched {} iterations in {:.2}s", args.iterations, elapsed.as_secs_f64());
    println!("Tree size: {} state nodes", report.tree_size);
    println!("Recommended action: {}", report.action);
    println!();
    println!("Root actions:");
    for action in &report.actions {
        println!("  {:<6} visits {:>6}  q {:>8.3}", action.action, action.visits, action.q);
    }
    println!();
    println!("Best trace:");
    let maze = args.maze();
    for (step, &(x, y)) in report.trace.iter().enumerate() {
        println!("step {step}: ({x}, {y})");
        println!("{}", maze.at(x, y));
    }

    Ok(())
}

fn cmd_evaluate(args: SearchArgs, runs: usize, seed: u64) -> Result<()> {
    args.validate()?;
    ensure!(runs > 0, "need at least one run");

    let maze = args.maze();
    ensure!(
        !maze.is_terminal() && !maze.at_goal(),
        "the start cell is the goal, nothing to evaluate"
    );

    info!(runs, iterations = args.iterations, "evaluating");
    let start = Instant::now();

    let reports: Vec<PlanReport> = (0..runs)
        .into_par_iter()
        .map(|i| plan(&args, seed.wrapping_add(i as u64)))
        .collect::<Result<_>>()?;

    let optimal = reports.iter().filter(|r| is_optimal(&maze, r)).count();
    let result = EvaluationResult {
        optimal,
        total: runs,
        mean_tree_size: reports.iter().map(|r| r.tree_size as f64).sum::<f64>() / runs as f64,
    };

    println!("Completed {} runs in {:.2}s", runs, start.elapsed().as_secs_f64());
    println!("Optimal first move: {} / {} ({:.1}%)", result.optimal, result.total, result.optimal_rate() * 100.0);
    println!("Mean tree size: {:.1} state nodes", result.mean_tree_size);

    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level: {level}"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Commands::Plan { search, seed, json } => cmd_plan(search, seed, json),
        Commands::Evaluate { search, runs, seed } => cmd_evaluate(search, runs, seed),
    }
}
