//! classrank CLI: rank students and analyze class results from mark sheets.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "classrank", version, about = "Student result ranking and analytics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one result sheet
    Analyze {
        /// Path to a .toml or .json mark sheet
        #[arg(long)]
        sheet: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory to write a JSON report into
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Print student rankings
    Rank {
        /// Path to a .toml or .json mark sheet
        #[arg(long)]
        sheet: PathBuf,

        /// Rank by marks in one subject instead of overall percentage
        #[arg(long)]
        subject: Option<String>,

        /// Show only the first N students
        #[arg(long, conflicts_with_all = ["bottom", "from", "to"])]
        top: Option<usize>,

        /// Show only the last N students, worst first
        #[arg(long, conflicts_with_all = ["from", "to"])]
        bottom: Option<usize>,

        /// First rank to show
        #[arg(long)]
        from: Option<u32>,

        /// Last rank to show
        #[arg(long)]
        to: Option<u32>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare ranks between two results
    Compare {
        /// Earlier result sheet
        #[arg(long)]
        previous: PathBuf,

        /// Later result sheet
        #[arg(long)]
        current: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show the trend across a series of results
    Trends {
        /// Result sheets in chronological order (repeat the flag)
        #[arg(long = "sheet", required = true, num_args = 1..)]
        sheets: Vec<PathBuf>,

        /// Maximum rank variance for a consistent performer
        #[arg(long)]
        variance_threshold: Option<f64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate mark sheet files
    Validate {
        /// Path to a sheet file or directory
        #[arg(long)]
        sheet: PathBuf,
    },

    /// Create starter config and example sheet
    Init,
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("classrank=info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            sheet,
            config,
            output,
            format,
        } => commands::analyze::execute(sheet, config, output, format),
        Commands::Rank {
            sheet,
            subject,
            top,
            bottom,
            from,
            to,
            config,
        } => commands::rank::execute(
            sheet,
            commands::rank::Selection::new(top, bottom, from, to),
            subject,
            config,
        ),
        Commands::Compare {
            previous,
            current,
            format,
        } => commands::compare::execute(previous, current, format),
        Commands::Trends {
            sheets,
            variance_threshold,
            config,
        } => commands::trends::execute(sheets, variance_threshold, config),
        Commands::Validate { sheet } => commands::validate::execute(sheet),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
