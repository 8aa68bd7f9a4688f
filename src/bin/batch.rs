use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use snake2048::engine::{self, Board};
use snake2048::expectimax::{Expectimax, ExpectimaxParallel};

#[derive(Parser, Debug)]
#[command(
    name = "batch",
    version,
    about = "Run batches of full 2048 games and summarize the results"
)]
struct Args {
    /// Number of games to play
    #[arg(short, long, default_value_t = 20)]
    runs: u32,

    /// Master seed; omit for a random one (the seed used is always reported)
    #[arg(long)]
    seed: Option<u64>,

    /// Tile that counts a run as a success
    #[arg(long, default_value_t = 2048)]
    threshold: u32,

    /// Size of the rayon thread pool
    #[arg(long)]
    threads: Option<usize>,

    /// Parallelize the four root searches within each move instead of
    /// playing games concurrently
    #[arg(long)]
    parallel_root: bool,

    /// Suppress per-run lines and the progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Print the summary as a single JSON object on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy)]
struct RunOutcome {
    max_tile: u32,
    moves: u32,
}

#[derive(Debug, Serialize)]
struct Summary {
    runs: u32,
    threshold: u32,
    success_rate: f64,
    average_max_tile: f64,
    best_tile: u32,
    total_moves: u64,
    elapsed_s: f64,
    seed: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    engine::new();
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new().num_threads(n).build_global()?;
    }
    let master_seed = args.seed.unwrap_or_else(rand::random);
    let start = Instant::now();

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.runs as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} runs ({eta})",
            )
            .unwrap()
            .progress_chars("=>-"),
        );
        pb
    };

    let outcomes: Vec<RunOutcome> = if args.parallel_root {
        // Each move already fans out across the pool; keep games sequential.
        (0..args.runs)
            .map(|i| {
                let outcome = play_one_parallel(run_seed(master_seed, i));
                pb.inc(1);
                outcome
            })
            .collect()
    } else {
        (0..args.runs)
            .into_par_iter()
            .map(|i| {
                let outcome = play_one(run_seed(master_seed, i));
                pb.inc(1);
                outcome
            })
            .collect()
    };
    pb.finish_and_clear();

    if !args.quiet {
        for (i, o) in outcomes.iter().enumerate() {
            println!("Run {}: Max Tile = {}, Moves = {}", i + 1, o.max_tile, o.moves);
        }
    }

    let successes = outcomes.iter().filter(|o| o.max_tile >= args.threshold).count();
    let summary = Summary {
        runs: args.runs,
        threshold: args.threshold,
        success_rate: successes as f64 / outcomes.len().max(1) as f64,
        average_max_tile: outcomes.iter().map(|o| o.max_tile as f64).sum::<f64>()
            / outcomes.len().max(1) as f64,
        best_tile: outcomes.iter().map(|o| o.max_tile).max().unwrap_or(0),
        total_moves: outcomes.iter().map(|o| o.moves as u64).sum(),
        elapsed_s: start.elapsed().as_secs_f64(),
        seed: master_seed,
    };

    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!("{}", "-".repeat(30));
        println!("Runs: {}", summary.runs);
        println!(
            "Success Rate (>= {}): {:.1}%",
            summary.threshold,
            summary.success_rate * 100.0
        );
        println!("Average Max Tile: {:.1}", summary.average_max_tile);
        println!("Best Run: {}", summary.best_tile);
        println!("Total Moves: {}", summary.total_moves);
        println!("Seed: {}", summary.seed);
        println!("Time Taken: {:.2}s", summary.elapsed_s);
    }
    Ok(())
}

// Per-run streams stay decorrelated under sequential master seeds.
fn run_seed(master: u64, run: u32) -> u64 {
    master.wrapping_add((run as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

fn play_one(seed: u64) -> RunOutcome {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut policy = Expectimax::from_seed(seed ^ 0xA55A_5AA5_55AA_AA55);
    let mut board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    let mut moves = 0u32;
    while let Some(dir) = policy.best_move(board) {
        board = board.make_move(dir, &mut rng);
        moves += 1;
    }
    RunOutcome { max_tile: board.highest_tile(), moves }
}

fn play_one_parallel(seed: u64) -> RunOutcome {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut policy = ExpectimaxParallel::from_seed(seed ^ 0xA55A_5AA5_55AA_AA55);
    let mut board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    let mut moves = 0u32;
    while let Some(dir) = policy.best_move(board) {
        board = board.make_move(dir, &mut rng);
        moves += 1;
    }
    RunOutcome { max_tile: board.highest_tile(), moves }
}
