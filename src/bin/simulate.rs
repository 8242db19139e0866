//! Balance simulator CLI.
//!
//! Run Monte Carlo simulations of full encounters with a simulated player.
//!
//! Usage:
//!   cargo run --bin simulate -- [OPTIONS]
//!
//! Examples:
//!   cargo run --bin simulate                          # 1000 runs to floor 10
//!   cargo run --bin simulate -- -n 100 -f 5           # 100 runs to floor 5
//!   cargo run --bin simulate -- --reaction 150 300    # Slower player
//!   cargo run --bin simulate -- --seed 42             # Reproducible run

use inkflip::encounter::EncounterConfig;
use inkflip::simulator::{run_simulation, SimConfig};
use inkflip::utils::logging::{init_logging, LogFormat};
use std::env;
use tracing::{error, info};

fn main() {
    let args: Vec<String> = env::args().collect();
    let config = parse_args(&args);
    init_logging(LogFormat::Human, config.verbosity);

    println!("╔═══════════════════════════════════════════════════════════════╗");
    println!("║              INKFLIP BALANCE SIMULATOR                        ║");
    println!("╚═══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Configuration:");
    println!("  Runs:           {}", config.num_runs);
    println!("  Target Floors:  {}", config.max_floors);
    let (min_reaction, max_reaction) = config.reaction_range();
    println!("  Reaction:       {}-{}ms", min_reaction, max_reaction);
    println!("  Parry Window:   {}ms", config.encounter.parry_window_ms);
    println!("  Frame:          {}ms", config.frame_ms);
    if let Some(seed) = config.seed {
        println!("  Seed:           {}", seed);
    }
    println!();
    println!("Running simulation...");
    println!();

    let report = run_simulation(&config);
    info!(
        runs = report.num_runs,
        completed = report.runs_completed,
        parry_rate = report.parry_rate,
        "simulation finished"
    );

    println!("{}", report.to_text());

    if args.iter().any(|a| a == "--json") {
        let filename = format!(
            "sim_report_{}.json",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        );
        match std::fs::write(&filename, report.to_json()) {
            Ok(()) => println!("JSON report saved to: {}", filename),
            Err(e) => {
                error!(error = %e, %filename, "failed to write JSON report");
                std::process::exit(1);
            }
        }
    }
}

fn parse_args(args: &[String]) -> SimConfig {
    let mut config = SimConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-n" | "--runs" => {
                if i + 1 < args.len() {
                    config.num_runs = args[i + 1].parse().unwrap_or(1000);
                    i += 1;
                }
            }
            "-f" | "--floors" => {
                if i + 1 < args.len() {
                    config.max_floors = args[i + 1].parse().unwrap_or(10);
                    i += 1;
                }
            }
            "-s" | "--seed" => {
                if i + 1 < args.len() {
                    config.seed = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--reaction" => {
                if i + 2 < args.len() {
                    if let (Ok(min), Ok(max)) = (args[i + 1].parse(), args[i + 2].parse()) {
                        config.min_reaction_ms = min;
                        config.max_reaction_ms = max;
                    }
                    i += 2;
                }
            }
            "--frame" => {
                if i + 1 < args.len() {
                    config.frame_ms = args[i + 1].parse().unwrap_or(config.frame_ms);
                    i += 1;
                }
            }
            "--balance" => {
                config.encounter = EncounterConfig::load();
            }
            "--write-balance" => {
                match config.encounter.save() {
                    Ok(()) => println!(
                        "Balance written to ~/.inkflip/{}",
                        EncounterConfig::FILE_NAME
                    ),
                    Err(e) => eprintln!("Failed to write balance file: {}", e),
                }
                std::process::exit(0);
            }
            "-v" | "--verbose" => {
                config.verbosity = config.verbosity.saturating_add(1);
            }
            "-q" | "--quiet" => {
                config.verbosity = 0;
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "--perfect" => {
                config = SimConfig::perfect_parry();
            }
            "--sluggish" => {
                config = SimConfig::sluggish();
            }
            "--quick" => {
                config = SimConfig::quick(100);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

fn print_help() {
    println!("Inkflip Balance Simulator");
    println!();
    println!("USAGE:");
    println!("    cargo run --bin simulate -- [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -n, --runs <N>          Number of simulation runs (default: 1000)");
    println!("    -f, --floors <F>        Floors to clear per run (default: 10)");
    println!("    -s, --seed <S>          Random seed for reproducibility");
    println!("    --reaction <MIN> <MAX>  Reaction time range in ms (default: 120 260)");
    println!("    --frame <MS>            Simulated frame length (default: 16)");
    println!("    --balance               Use ~/.inkflip/balance.json pacing");
    println!("    --write-balance         Write the current pacing to ~/.inkflip/balance.json");
    println!("    -v, --verbose           More logging (repeatable)");
    println!("    -q, --quiet             Only warnings");
    println!("    --json                  Save JSON report");
    println!("    --perfect               Always-parry player, slash only");
    println!("    --sluggish              Slow player who mostly misses");
    println!("    --quick                 Quick test (100 runs to floor 5)");
    println!("    -h, --help              Show this help");
    println!();
    println!("ENVIRONMENT:");
    println!("    INKFLIP_LOG             Log filter, overrides -v/-q (e.g. inkflip=debug)");
}
