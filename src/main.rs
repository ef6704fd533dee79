use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use srs_academic::import::GradeImport;
use srs_academic::models::{CgpaCalculation, Totals};
use srs_academic::{config, gpa, import, report, schedule};

#[derive(Parser)]
#[command(name = "srs-academic")]
#[command(about = "Weekly schedule and GPA/CGPA tools for registration system exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GradeArgs {
    /// Credits earned before this semester
    #[arg(long, default_value_t = 0.0)]
    previous_credits: f64,
    /// Grade points earned before this semester
    #[arg(long, default_value_t = 0.0)]
    previous_points: f64,
    /// JSON file with grade points and standing bands (falls back to SRS_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the weekly schedule grid from a meetings CSV
    Schedule {
        #[arg(long)]
        csv: PathBuf,
        /// Print the grid as JSON instead of a markdown table
        #[arg(long)]
        json: bool,
    },
    /// Compute GPA, CGPA and standing from a grades CSV
    Cgpa {
        #[arg(long)]
        csv: PathBuf,
        #[command(flatten)]
        grades: GradeArgs,
        #[arg(long)]
        json: bool,
    },
    /// Write a markdown report covering grades and schedule
    Report {
        #[arg(long)]
        meetings: PathBuf,
        #[arg(long)]
        grades: PathBuf,
        #[command(flatten)]
        options: GradeArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn calculate(csv: &Path, args: GradeArgs) -> anyhow::Result<(GradeImport, CgpaCalculation)> {
    let config = config::load_or_default(args.config)?;
    let grades = import::import_grades(csv)?;
    for (course, grade) in &grades.filtered {
        info!(%course, grade = %grade, "not counted toward GPA");
    }

    let previous = Totals::new(args.previous_credits, args.previous_points);
    let result = gpa::calculate(
        &grades.entries,
        previous,
        &config.grade_points,
        &config.standings,
    )
    .context("failed to aggregate grades")?;
    Ok((grades, result))
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Schedule { csv, json } => {
            let meetings = import::import_meetings(&csv)?;
            let build = schedule::build_schedule(&meetings);
            for conflict in build.schedule.conflicts() {
                warn!(
                    day = %conflict.day,
                    slot = %conflict.slot,
                    details = ?conflict.details,
                    "overlapping meetings"
                );
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&build.schedule)?);
            } else {
                print!("{}", report::render_schedule(&build.schedule));
            }
        }
        Commands::Cgpa { csv, grades, json } => {
            let (_, result) = calculate(&csv, grades)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::render_calculation(&result));
            }
        }
        Commands::Report {
            meetings,
            grades,
            options,
            out,
        } => {
            let (imported, result) = calculate(&grades, options)?;
            let raw_meetings = import::import_meetings(&meetings)?;
            let build = schedule::build_schedule(&raw_meetings);
            let report = report::build_report(&result, &imported, &build);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
