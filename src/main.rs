//! CIVIL UNREST - CLI Entry Point
//!
//! Civil violence model with corruption and employment contagion.

use civil_unrest::checkpoint::{Checkpoint, CheckpointManager};
use civil_unrest::export::ExportSystem;
use civil_unrest::{benchmark, Condition, Config, Model, MoralState};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "civil-unrest")]
#[command(version)]
#[command(about = "Civil violence model with corruption and employment contagion")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a new simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of steps to simulate (default: until max_iters)
        #[arg(short, long)]
        steps: Option<u64>,

        /// Output directory for results and checkpoints
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Resume simulation from checkpoint
    Resume {
        /// Checkpoint file to resume from
        #[arg(short, long)]
        checkpoint: PathBuf,

        /// Number of additional steps (default: until max_iters)
        #[arg(short, long)]
        steps: Option<u64>,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of steps
        #[arg(short, long, default_value = "200")]
        steps: u64,

        /// Grid side length
        #[arg(long, default_value = "40")]
        side: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Analyze a checkpoint file
    Analyze {
        /// Checkpoint file
        checkpoint: PathBuf,
    },
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            steps,
            output,
            seed,
            quiet,
        } => run_simulation(config, steps, output, seed, quiet),

        Commands::Resume {
            checkpoint,
            steps,
            output,
        } => resume_simulation(checkpoint, steps, output),

        Commands::Benchmark { steps, side, seed } => {
            init_logging("info");
            run_benchmark(steps, side, seed)
        }

        Commands::Init { output } => {
            init_logging("info");
            generate_config(output)
        }

        Commands::Analyze { checkpoint } => {
            init_logging("info");
            analyze_checkpoint(checkpoint)
        }
    }
}

fn run_simulation(
    config_path: PathBuf,
    steps: Option<u64>,
    output: PathBuf,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };
    init_logging(&config.logging.log_level);

    if config_path.exists() {
        log::info!("Loaded config from {:?}", config_path);
    } else {
        log::info!("Config {:?} not found, using defaults", config_path);
    }

    std::fs::create_dir_all(&output)?;

    let mut model = match seed {
        Some(s) => Model::new_with_seed(config.clone(), s)?,
        None => Model::new(config.clone())?,
    };

    println!("Starting simulation");
    println!("  Seed: {}", model.seed());
    println!("  Citizens: {}  Cops: {}", model.citizen_count(), model.cop_count());
    println!("  Grid size: {}x{}", config.grid.width, config.grid.height);
    match steps {
        Some(n) => println!("  Steps: {}", n),
        None => println!("  Steps: until iteration {}", config.run.max_iters + 1),
    }
    println!();

    drive(&mut model, steps, &output, quiet)?;
    write_results(&model, &output)?;

    Ok(())
}

fn resume_simulation(
    checkpoint_path: PathBuf,
    steps: Option<u64>,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    init_logging(&checkpoint.config.logging.log_level);
    log::info!("Loaded checkpoint {:?}", checkpoint_path);

    let mut model = Model::from_checkpoint(checkpoint)?;

    println!("Resumed at step {}", model.iteration);
    println!("Citizens: {}  Cops: {}", model.citizen_count(), model.cop_count());
    if !model.running {
        println!("Model had already stopped; raise run.max_iters to continue");
    }
    println!();

    std::fs::create_dir_all(&output)?;
    drive(&mut model, steps, &output, false)?;
    write_results(&model, &output)?;

    Ok(())
}

/// Step the model, printing stats and writing periodic checkpoints
fn drive(model: &mut Model, steps: Option<u64>, output: &Path, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut checkpoint_mgr = CheckpointManager::new(
        output.to_string_lossy().to_string(),
        model.config.logging.checkpoint_interval,
        10, // Keep last 10 checkpoints
    )?;

    let start = Instant::now();
    let start_iteration = model.iteration;
    let target = steps.map(|n| model.iteration + n);
    let stats_interval = model.config.logging.stats_interval;

    while model.running && target.map_or(true, |t| model.iteration < t) {
        model.step();

        if !quiet && model.iteration % stats_interval == 0 {
            println!("{}", model.stats.summary());
        }

        if checkpoint_mgr.should_save(model.iteration) {
            match checkpoint_mgr.save(&model.create_checkpoint()) {
                Ok(path) => {
                    if !quiet {
                        println!("  Checkpoint saved: {}", path);
                    }
                }
                Err(e) => log::warn!("Checkpoint error: {}", e),
            }
        }
    }

    let elapsed = start.elapsed();
    let executed = model.iteration - start_iteration;

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Steps: {} (iteration {})", executed, model.iteration);
    println!(
        "Speed: {:.1} steps/s",
        executed as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    println!("{}", model.stats.summary());
    log::info!("Run finished at iteration {}", model.iteration);

    Ok(())
}

fn write_results(model: &Model, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let final_path = output.join("checkpoint_final.bin");
    model.create_checkpoint().save(&final_path)?;
    println!("Final checkpoint: {:?}", final_path);

    let stats_path = output.join("stats_history.json");
    model.stats_history.save(&stats_path.to_string_lossy())?;
    ExportSystem::export_history_csv(&model.stats_history, output.join("stats_history.csv"))?;
    println!("Stats history: {:?}", stats_path);

    ExportSystem::export_agents_csv(model.agents(), output.join("agents.csv"))?;
    ExportSystem::export_summary(model, output.join("summary.txt"))?;

    Ok(())
}

fn run_benchmark(steps: u64, side: usize, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== CIVIL UNREST Benchmark ===");
    println!("Steps: {}", steps);
    println!("Grid: {}x{}", side, side);
    println!();

    let result = benchmark(steps, side, seed)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    Config::default().save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn analyze_checkpoint(checkpoint_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Checkpoint Analysis ===");
    println!("File: {:?}", checkpoint_path);
    println!();

    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    let size = checkpoint.size_bytes();
    let model = Model::from_checkpoint(checkpoint)?;

    println!("Iteration: {}", model.iteration);
    println!("Running: {}", model.running);
    println!("Seed: {}", model.seed());
    println!("Grid: {}x{}", model.grid.width(), model.grid.height());
    println!("Citizens: {}  Cops: {}", model.citizen_count(), model.cop_count());
    println!();

    let stats = &model.stats;
    for condition in [Condition::Quiescent, Condition::Active, Condition::Arrested] {
        let count = match condition {
            Condition::Quiescent => stats.quiescent,
            Condition::Active => stats.active,
            Condition::Arrested => stats.arrested,
        };
        println!("{:<12} {}", condition.as_str(), count);
    }
    println!("{:<12} {}", "Jailed", stats.jailed);
    println!("{:<12} {}", "Employed", stats.employed);
    println!();

    for state in [MoralState::Corrupted, MoralState::Honest, MoralState::Susceptible] {
        let count = match state {
            MoralState::Corrupted => stats.corrupted,
            MoralState::Honest => stats.honest,
            MoralState::Susceptible => stats.susceptible,
        };
        let share = if stats.citizens == 0 {
            0.0
        } else {
            100.0 * count as f64 / stats.citizens as f64
        };
        println!("{:<12} {} ({:.1}%)", state.as_str(), count, share);
    }

    println!();
    println!("Checkpoint size: {:.2} KB", size as f64 / 1_000.0);

    Ok(())
}
