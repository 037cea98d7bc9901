//! chess-perft - counts move-tree leaf nodes from a FEN position.
//!
//! Runs perft at increasing depths up to `--depth`, printing node counts and
//! speed. With `--time-limit-ms` or `--node-limit` the run stops early and the
//! last completed depth is reported.

use anyhow::Context;
use chess_core::Fen;
use chess_engine::movegen::{game_status, legal_moves, perft_divide, perft_with_budget};
use chess_engine::{Position, SearchBudget};
use clap::Parser;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chess-perft")]
#[command(about = "Count leaf nodes of the legal move tree")]
struct Args {
    /// Position to start from
    #[arg(long, default_value = Fen::STARTPOS)]
    fen: String,

    /// Deepest depth to count
    #[arg(short, long, default_value = "5")]
    depth: u32,

    /// Print per-move subtotals at the final depth
    #[arg(long)]
    divide: bool,

    /// Stop after this many milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Stop after visiting this many nodes across all depths
    #[arg(long)]
    node_limit: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let mut position =
        Position::from_fen(&args.fen).with_context(|| format!("invalid position: {}", args.fen))?;
    println!("{}", position.to_fen());
    println!(
        "status: {:?}, legal moves: {}",
        game_status(&mut position),
        legal_moves(&mut position).len()
    );

    let mut budget = match args.time_limit_ms {
        Some(ms) => SearchBudget::with_time_limit(Duration::from_millis(ms)),
        None => SearchBudget::unlimited(),
    };
    if let Some(limit) = args.node_limit {
        budget = budget.node_limit(limit);
    }

    let mut completed = None;
    for depth in 1..=args.depth {
        let start = Instant::now();
        match perft_with_budget(&mut position, depth, &budget) {
            Ok(nodes) => {
                let elapsed = start.elapsed();
                let nps = nodes as f64 / elapsed.as_secs_f64().max(1e-9);
                println!("depth {depth:>2}  nodes {nodes:>12}  time {:>8.3}s  nps {nps:>12.0}", elapsed.as_secs_f64());
                completed = Some((depth, nodes));
            }
            Err(cancelled) => {
                tracing::info!(depth, "{cancelled}");
                break;
            }
        }
    }

    match completed {
        Some((depth, nodes)) if depth == args.depth => {
            if args.divide {
                for (mv, count) in perft_divide(&mut position, depth) {
                    println!("{mv}: {count}");
                }
            }
            println!("total {nodes}");
        }
        Some((depth, nodes)) => println!("stopped early; depth {depth} complete with {nodes} nodes"),
        None if args.depth == 0 => println!("total 1"),
        None => println!("stopped before depth 1 completed"),
    }
    Ok(())
}
