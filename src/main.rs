use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use school_timetabler::genetic::{GenerationOutcome, TimetableGenerator};
use school_timetabler::parser::{load_config_or_default, load_school_from_dir};
use school_timetabler::reporter::{
    generate_reports, generate_teacher_schedule, print_summary, OutputFormat,
};
use school_timetabler::solution_store::{load_solution, save_if_better, save_solution, SavedSolution};
use school_timetabler::types::{GeneratorConfig, School, TeacherId};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

#[derive(Parser)]
#[command(name = "school-timetabler")]
#[command(about = "Evolutionary school timetable generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in demo school
    Demo {
        /// Only save if score improves or matches previous best
        #[arg(long)]
        monotonic: bool,
    },

    /// Generate a timetable from input data
    Generate {
        /// Directory containing input JSON files (and optional config.toml)
        #[arg(short, long)]
        data: PathBuf,

        /// Output directory for timetable files
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Output format(s): json, markdown, text, or all
        #[arg(short, long, default_value = "all")]
        format: String,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,

        /// Only save if score improves or matches previous best
        #[arg(long)]
        monotonic: bool,

        /// RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Re-score a previously saved solution against input data
    Validate {
        /// Path to a saved best_solution.json
        #[arg(short, long)]
        solution: PathBuf,

        /// Directory containing input data
        #[arg(short, long)]
        data: PathBuf,

        /// Show per-metric details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print a teacher's schedule from a saved solution
    Report {
        /// Path to a saved best_solution.json
        #[arg(short, long)]
        solution: PathBuf,

        /// Directory containing input data
        #[arg(short, long)]
        data: PathBuf,

        /// Teacher ID to report on
        #[arg(long)]
        teacher: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { monotonic } => run_demo(monotonic),
        Commands::Generate {
            data,
            output,
            format,
            quiet,
            monotonic,
            seed,
        } => run_generate(&data, &output, &format, quiet, monotonic, seed),
        Commands::Validate {
            solution,
            data,
            verbose,
        } => run_validate(&solution, &data, verbose),
        Commands::Report {
            solution,
            data,
            teacher,
        } => run_report(&solution, &data, &teacher),
    }
}

fn run_demo(monotonic: bool) -> Result<()> {
    println!("{}", "Running demo school...".bold());
    let school = School::demo();
    let config = GeneratorConfig {
        iterations: 200,
        ..Default::default()
    };

    let output = PathBuf::from("./output/demo");
    let outcome = evolve_with_progress(&school, config, &output, false)?;

    print_summary(&outcome, &school);
    generate_reports(
        &outcome,
        &school,
        &output,
        &OutputFormat::parse_list("all"),
    )?;
    persist_solution(&output.join("best_solution.json"), &outcome, monotonic)?;

    println!("Reports written to {}", output.display());
    Ok(())
}

fn run_generate(
    data: &Path,
    output: &Path,
    format: &str,
    quiet: bool,
    monotonic: bool,
    seed: Option<u64>,
) -> Result<()> {
    let formats = OutputFormat::parse_list(format);
    if formats.is_empty() {
        anyhow::bail!("unknown output format '{format}' (expected json, markdown, text, or all)");
    }

    let school = load_school_from_dir(data)
        .with_context(|| format!("failed to load school data from {}", data.display()))?;
    let mut config = load_config_or_default(&data.join("config.toml"));
    if seed.is_some() {
        config.seed = seed;
    }

    let outcome = evolve_with_progress(&school, config, output, quiet)?;

    if !quiet {
        print_summary(&outcome, &school);
    }
    generate_reports(&outcome, &school, output, &formats)?;
    persist_solution(&output.join("best_solution.json"), &outcome, monotonic)?;

    if !quiet {
        println!("Reports written to {}", output.display());
    }
    Ok(())
}

/// Run the generator with an indicatif bar wired to the progress sink
fn evolve_with_progress(
    school: &School,
    config: GeneratorConfig,
    output: &Path,
    quiet: bool,
) -> Result<GenerationOutcome> {
    let best_known = load_solution(&output.join("best_solution.json"));

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(u64::from(config.iterations));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] gen {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    let mut generator = TimetableGenerator::new(school, config)?;
    if let Some(saved) = best_known {
        generator = generator.with_best_known(saved.genes);
    }

    let cancel = AtomicBool::new(false);
    let outcome = generator.generate(&cancel, |record| {
        progress.set_position(u64::from(record.generation) + 1);
        progress.set_message(format!("best {:.1}", record.best_fitness));
    })?;
    progress.finish_with_message(format!("best {:.1}", outcome.best_fitness));

    Ok(outcome)
}

fn persist_solution(path: &Path, outcome: &GenerationOutcome, monotonic: bool) -> Result<()> {
    let solution = SavedSolution::new(
        outcome.best_individual.genes().to_vec(),
        outcome.best_fitness,
    );
    if monotonic {
        save_if_better(path, &solution)?;
    } else {
        save_solution(path, &solution)?;
    }
    Ok(())
}

fn run_validate(solution_path: &Path, data: &Path, verbose: bool) -> Result<()> {
    use school_timetabler::genetic::{Evaluator, Individual};

    let school = load_school_from_dir(data)?;
    let saved = load_solution(solution_path)
        .with_context(|| format!("no readable solution at {}", solution_path.display()))?;

    let individual = Individual::new(saved.genes);
    let timetable = individual.decode(&school);
    let dropped = individual.assigned_count() - timetable.len();

    let config = load_config_or_default(&data.join("config.toml"));
    let evaluator = Evaluator::new(&school, &config);
    let score = evaluator.evaluate_timetable(&timetable);

    println!("Stored score:   {:.2}", saved.fitness);
    println!("Rescored:       {score:.2}");
    println!("Lessons:        {} ({dropped} genes dropped)", timetable.len());

    if verbose {
        let metrics = evaluator.metrics(&timetable);
        println!();
        println!("Completeness:   {:.1}", metrics.completeness);
        println!("Distribution:   {:.1}", metrics.distribution);
        println!("Teacher load:   {:.1}", metrics.teacher_load);
        println!("Room usage:     {:.1}", metrics.room_usage);
        println!("Constraints:    {:.1}", metrics.constraints);
    }

    if dropped > 0 {
        println!(
            "{}",
            format!("{dropped} genes did not survive decoding").yellow()
        );
    } else {
        println!("{}", "All genes decoded cleanly".green());
    }
    Ok(())
}

fn run_report(solution_path: &Path, data: &Path, teacher: &str) -> Result<()> {
    use school_timetabler::genetic::Individual;

    let school = load_school_from_dir(data)?;
    let saved = load_solution(solution_path)
        .with_context(|| format!("no readable solution at {}", solution_path.display()))?;

    let individual = Individual::new(saved.genes);
    let outcome = rebuild_outcome(&school, individual, saved.fitness);

    let teacher_id = TeacherId(teacher.to_string());
    match generate_teacher_schedule(&outcome, &school, &teacher_id) {
        Some(schedule) => println!("{schedule}"),
        None => anyhow::bail!("unknown teacher '{teacher}'"),
    }
    Ok(())
}

/// Wrap a decoded solution as a minimal outcome for the report writers
fn rebuild_outcome(school: &School, individual: school_timetabler::genetic::Individual, fitness: f64) -> GenerationOutcome {
    use school_timetabler::genetic::GenerationStats;

    GenerationOutcome {
        timetable: individual.decode(school),
        best_individual: individual,
        best_fitness: fitness,
        progress: Vec::new(),
        stats: GenerationStats {
            total_time_secs: 0.0,
            avg_generation_secs: 0.0,
            min_generation_secs: 0.0,
            max_generation_secs: 0.0,
            total_generations: 0,
            best_fitness: fitness,
            avg_fitness: fitness,
            timestamp: chrono::Utc::now(),
        },
        cancelled: false,
        diagnostic: None,
    }
}
