use clap::{Parser, Subcommand, ValueEnum};
use log::{LevelFilter, debug};
use lpbench_solver::{
    Extent, PivotRule, Problem, SolveReport, Solver, SolverConfig, compute_feasible_region,
};
use std::path::{Path, PathBuf};

mod report;

#[derive(Parser)]
#[command(name = "lpbench")]
#[command(about = "Solve linear programs and explain the solution", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file and output the optimal solution
    Solve {
        /// JSON file containing the problem
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        /// Show sensitivity analysis
        #[arg(short, long)]
        analysis: bool,
        #[command(flatten)]
        solver: SolverArgs,
    },
    /// Compute the feasible region of a two-variable problem
    Region {
        /// JSON file containing the problem
        file: PathBuf,
        /// Plot extent along the first variable
        #[arg(long, default_value_t = 10.0)]
        max_x: f64,
        /// Plot extent along the second variable
        #[arg(long, default_value_t = 10.0)]
        max_y: f64,
        /// Also solve, to report the optimal point and objective contours
        #[arg(short, long)]
        solve: bool,
        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
        #[command(flatten)]
        solver: SolverArgs,
    },
    /// Check a problem file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(clap::Args)]
struct SolverArgs {
    /// Tolerance for zero comparisons
    #[arg(long, default_value_t = 1e-9)]
    tolerance: f64,
    /// Pivot limit (default: 50 x tableau rows + columns)
    #[arg(long)]
    max_iterations: Option<usize>,
    /// Use a single-phase Big-M formulation with this penalty
    #[arg(long)]
    big_m: Option<f64>,
    /// Always pivot with Bland's rule
    #[arg(long)]
    bland: bool,
}

impl SolverArgs {
    fn config(&self) -> SolverConfig {
        SolverConfig {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            big_m: self.big_m,
            pivot_rule: if self.bland {
                PivotRule::Bland
            } else {
                PivotRule::Dantzig
            },
            ..SolverConfig::default()
        }
    }
}

fn setup_logger(verbose: u8) -> Result<(), fern::InitError> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} | {:5} | {} | {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn load_problem(file: &Path) -> Result<Problem, String> {
    let source =
        std::fs::read_to_string(file).map_err(|e| format!("Error reading file: {}", e))?;
    parse_problem(&source)
}

fn parse_problem(source: &str) -> Result<Problem, String> {
    serde_json::from_str(source).map_err(|e| format!("Parse error: {}", e))
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logger(cli.verbose) {
        eprintln!("Could not install logger: {}", e);
    }

    match cli.command {
        Commands::Solve {
            file,
            format,
            analysis,
            solver,
        } => {
            let problem = load_problem(&file).unwrap_or_else(|e| {
                eprintln!("{}", e);
                std::process::exit(1);
            });
            debug!(
                "loaded {} variables, {} constraints",
                problem.num_variables(),
                problem.num_constraints()
            );

            let outcome: SolveReport = Solver::with_config(solver.config()).report(&problem);

            match format {
                Format::Json => println!("{}", to_json(&outcome)),
                Format::Pretty => print!("{}", report::render_report(&problem, &outcome, analysis)),
            }
            if !outcome.success {
                std::process::exit(1);
            }
        }
        Commands::Region {
            file,
            max_x,
            max_y,
            solve,
            format,
            solver,
        } => {
            let problem = load_problem(&file).unwrap_or_else(|e| {
                eprintln!("{}", e);
                std::process::exit(1);
            });

            let config = solver.config();
            let solution = if solve {
                match Solver::with_config(config.clone()).solve(&problem) {
                    Ok(s) => Some(s),
                    Err(e) => {
                        eprintln!("Solve failed, plotting region only: {}", e);
                        None
                    }
                }
            } else {
                None
            };

            let region = match compute_feasible_region(
                &problem,
                Extent::new(max_x, max_y),
                solution.as_ref(),
                config.tolerance,
            ) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Region error: {}", e);
                    std::process::exit(1);
                }
            };

            match format {
                Format::Json => println!("{}", to_json(&region)),
                Format::Pretty => print!("{}", report::render_region(&problem, &region)),
            }
        }
        Commands::Check { file } => {
            let problem = load_problem(&file).unwrap_or_else(|e| {
                eprintln!("✗ {} has errors:", file.display());
                eprintln!("  {}", e);
                std::process::exit(1);
            });

            match problem.validate() {
                Ok(()) => {
                    println!("✓ {} is valid", file.display());
                    println!("  {} variables", problem.num_variables());
                    println!("  {} constraints", problem.num_constraints());
                    println!("  {} bounds", problem.bounds.len());
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
