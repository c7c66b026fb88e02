//! ronda CLI binary.
//!
//! Loads a CSV file into a shape-tagged frame and runs ronda operations on
//! it, writing results to stdout as CSV.

mod cmd;
mod data;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cmd::{process::Agg, report::Part, rolling::Unit};
use ronda_eval::CorrMethod;
use std::{path::PathBuf, process};

#[derive(Parser)]
#[command(name = "ronda")]
#[command(about = "Shape-aware rolling aggregation and statistics", long_about = None)]
#[command(version)]
struct Cli {
    /// Input CSV file
    input: PathBuf,

    /// Temporal index column
    #[arg(short, long, global = true)]
    time: Option<String>,

    /// Entity index column
    #[arg(short, long, global = true)]
    entity: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show shape, arity and columns
    Describe,

    /// Select by date, entity and value column
    Select {
        /// Date(s) to keep (YYYY-MM-DD)
        #[arg(short, long)]
        date: Vec<String>,

        /// Entity key(s) to keep
        #[arg(short, long)]
        key: Vec<String>,

        /// Value column(s) to keep
        #[arg(short, long)]
        column: Vec<String>,
    },

    /// Resample to calendar buckets (e.g. 1w, 1mo)
    Resample {
        /// Bucket length as a duration string
        every: String,

        /// Reduction applied per bucket
        #[arg(short, long, value_enum, default_value = "last")]
        agg: Agg,

        /// Key buckets by their start instead of their end
        #[arg(long)]
        left: bool,
    },

    /// Bucket returns from open and close prices
    Returns {
        /// Bucket length as a duration string
        every: String,

        /// Opening price column
        #[arg(long, default_value = "open")]
        open: String,

        /// Closing price column
        #[arg(long, default_value = "close")]
        close: String,

        /// Forward returns keyed by bucket start
        #[arg(long)]
        forward: bool,
    },

    /// Differences of cumulative columns
    Diff {
        /// Number of rows to difference over
        #[arg(short, long, default_value = "1")]
        period: usize,

        /// Leave the leading rows of each entity empty instead of cumulative
        #[arg(long)]
        drop_leading: bool,
    },

    /// Roll a unit function over windows of dates
    Rolling {
        /// Number of distinct dates per window
        #[arg(short, long, default_value = "20")]
        window: usize,

        /// Unit function applied to each window
        #[arg(short, long, value_enum, default_value = "mean")]
        unit: Unit,

        /// CSV of entity,label pairs to group by
        #[arg(short, long)]
        grouper: Option<PathBuf>,
    },

    /// Correlation matrix of the numeric columns
    Corr {
        /// Correlation method (spearman or pearson)
        #[arg(short, long, default_value = "spearman")]
        method: CorrMethod,

        /// Print the t-statistic of the time-averaged panel correlation
        #[arg(long)]
        tstat: bool,
    },

    /// Information coefficient of a factor
    Ic {
        /// Factor column
        factor: String,

        /// Forward return column
        forward: String,

        /// Correlation method (spearman or pearson)
        #[arg(short, long, default_value = "spearman")]
        method: CorrMethod,

        /// CSV of entity,label pairs to group by
        #[arg(short, long)]
        grouper: Option<PathBuf>,
    },

    /// Least squares regression on the other numeric columns
    Ols {
        /// Dependent column
        target: String,
    },

    /// Quantile layering of a factor
    Layering {
        /// Factor column
        factor: String,

        /// Forward return column
        forward: String,

        /// Number of buckets
        #[arg(short, long, default_value = "5")]
        quantiles: usize,
    },

    /// Weighted per-date profit of a panel
    Profit {
        /// Weight column
        #[arg(short, long)]
        weight: Option<String>,

        /// Forward return column
        #[arg(short, long)]
        forward: Option<String>,
    },

    /// Evaluate a factor (regression, IC, IC summary, layering)
    Report {
        /// Factor column
        factor: String,

        /// Forward return column
        forward: String,

        /// JSON evaluator configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Correlation method, overriding the configuration
        #[arg(short, long)]
        method: Option<CorrMethod>,

        /// Number of buckets, overriding the configuration
        #[arg(short, long)]
        quantiles: Option<usize>,

        /// Table to print
        #[arg(short, long, value_enum, default_value = "summary")]
        part: Part,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let frame = data::load_frame(&cli.input, cli.time.as_deref(), cli.entity.as_deref())?;
    log::debug!("loaded {} frame with {} rows", frame.tag(), frame.len());

    match cli.command {
        Commands::Describe => cmd::describe::describe(&frame)?,
        Commands::Select { date, key, column } => {
            cmd::select::select(&frame, &date, &key, &column)?;
        }
        Commands::Resample { every, agg, left } => {
            cmd::process::resample(&frame, &every, agg, left)?;
        }
        Commands::Returns {
            every,
            open,
            close,
            forward,
        } => {
            cmd::process::returns(&frame, &every, &open, &close, forward)?;
        }
        Commands::Diff {
            period,
            drop_leading,
        } => {
            cmd::process::diff(&frame, period, !drop_leading)?;
        }
        Commands::Rolling {
            window,
            unit,
            grouper,
        } => {
            cmd::rolling::rolling(&frame, window, unit, grouper.as_deref())?;
        }
        Commands::Corr { method, tstat } => cmd::stats::corr(&frame, method, tstat)?,
        Commands::Ic {
            factor,
            forward,
            method,
            grouper,
        } => {
            cmd::stats::ic(&frame, &factor, &forward, method, grouper.as_deref())?;
        }
        Commands::Ols { target } => cmd::stats::ols(&frame, &target)?,
        Commands::Layering {
            factor,
            forward,
            quantiles,
        } => {
            cmd::stats::layering(&frame, &factor, &forward, quantiles)?;
        }
        Commands::Profit { weight, forward } => {
            cmd::stats::profit(&frame, weight.as_deref(), forward.as_deref())?;
        }
        Commands::Report {
            factor,
            forward,
            config,
            method,
            quantiles,
            part,
        } => {
            cmd::report::report(
                &frame,
                &factor,
                &forward,
                config.as_deref(),
                method,
                quantiles,
                part,
            )?;
        }
    }

    Ok(())
}
