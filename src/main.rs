//! Regen Timetable CLI - Optimize a timetable from a JSON run configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;

use regen_timetable::{
    compute::{
        EnergySimulator, Timetable,
        evolution::{RandomWalk, ReportWriter, Solver},
    },
    schema::{
        Direction, RandomWalkConfig, RandomWalkResult, RunConfig, SolverResult, TimetableConfig,
    },
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <run.json> [output_dir]", args[0]);
        eprintln!();
        eprintln!("Optimize a timetable for regenerative braking energy reuse.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  run.json     Path to run configuration file");
        eprintln!("  output_dir   Directory for JSON/CSV reports (optional)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let output_dir = args.get(2).map(PathBuf::from);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let run: RunConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    let writer = output_dir.map(|dir| {
        ReportWriter::new(&dir).unwrap_or_else(|e| {
            eprintln!("Error creating output directory {}: {}", dir.display(), e);
            std::process::exit(1);
        })
    });

    let params = &run.params;
    let mut solver = Solver::new(params.clone(), run.solver.clone()).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    let standard = TimetableConfig::from_params(params);

    println!("Regenerative Braking Timetable Optimization");
    println!("===========================================");
    println!(
        "Stations: {} ({} supply arms)",
        params.stations.len(),
        params.arm_ids().len()
    );
    println!(
        "Runs: {} down / {} up",
        standard.run_count(Direction::Down),
        standard.run_count(Direction::Up)
    );
    println!(
        "Generations: {}, population: {}, workers: {}",
        run.solver.generations,
        run.solver.population_size,
        run.solver.worker_count()
    );
    println!("Reuse rule: {:?}", run.solver.reuse_rule);
    println!();

    let mut simulator = EnergySimulator::new(params, run.solver.reuse_rule);
    let ratio = simulator.reuse_ratio(&Timetable::decode(&standard, params));
    println!("Standard timetable reuse ratio: {:.6}", ratio);

    let report_every = (run.solver.generations / 10).max(1);
    let result = solver.run_with_callback(|progress| {
        if progress.generation > 0 && progress.generation % report_every == 0 {
            println!(
                "  Generation {}/{}: best={:.6}, worst={:.6}, avg={:.6}",
                progress.generation,
                progress.total_generations,
                progress.best_fitness,
                progress.worst_fitness,
                progress.avg_fitness
            );
        }
    });

    println!();
    match (&result.before, &result.after) {
        (Some(before), Some(after)) => {
            println!("Best before optimization: {:.6}", before.fitness);
            println!("Best after optimization:  {:.6}", after.fitness);
            for (arm, ratio) in &after.arm_ratios {
                println!("  Arm {}: {:.6}", arm, ratio);
            }
        }
        _ => println!("Empty population: nothing to optimize."),
    }
    println!(
        "Time: {:.2}s ({} evaluations, {:.1} evals/s)",
        result.stats.elapsed_seconds,
        result.stats.total_evaluations,
        result.stats.evaluations_per_second
    );

    let walk = run.random_walk.clone().map(|walk_config| {
        let mut walk = RandomWalk::new(params.clone(), walk_config).unwrap_or_else(|e| {
            eprintln!("Invalid random walk configuration: {}", e);
            std::process::exit(1);
        });
        let walk_result = walk.run();
        if let Some(best) = &walk_result.best {
            println!("Random walk best:          {:.6}", best.fitness);
        }
        walk_result
    });

    if let Some(writer) = writer {
        let saved = write_reports(&writer, &run, &result, walk.as_ref());
        if let Err(e) = saved {
            eprintln!("Error writing reports: {}", e);
            std::process::exit(1);
        }
        println!("Reports saved to {}", writer.output_dir().display());
    }
}

fn write_reports(
    writer: &ReportWriter,
    run: &RunConfig,
    result: &SolverResult,
    walk: Option<&RandomWalkResult>,
) -> std::io::Result<()> {
    let rule = run.solver.reuse_rule;
    if let Some(before) = &result.before {
        writer.write_solution("before", before, &run.params, rule)?;
    }
    if let Some(after) = &result.after {
        writer.write_solution("after", after, &run.params, rule)?;
    }
    writer.write_history("history.csv", &result.history)?;

    if let Some(walk) = walk {
        writer.write_random_walk("random-walk.csv", walk)?;
        if let Some(best) = &walk.best {
            writer.write_solution("random-walk-best", best, &run.params, rule)?;
        }
    }
    Ok(())
}

fn print_example_config() {
    let config = RunConfig {
        random_walk: Some(RandomWalkConfig::default()),
        ..Default::default()
    };
    match serde_json::to_string_pretty(&config) {
        Ok(json) => {
            println!("Example configuration (run.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing example: {}", e);
            std::process::exit(1);
        }
    }
}
