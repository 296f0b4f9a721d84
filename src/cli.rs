//! Command-line interface argument parsing.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Municipal Metrics - summaries of municipal radiance and GDP records
///
/// Loads a record file exported from the data API and prints one
/// chart-ready summary as JSON.
///
/// Examples:
///   municipal-metrics radianza.json boxplot
///   municipal-metrics pib.csv histogram --field pib_mun
///   municipal-metrics radianza.parquet --group Toluca --group Metepec yearly
///   municipal-metrics combinado.json scatter --x pib_mun --y Media_de_radianza
///   municipal-metrics combinado.csv --group Lerma quarterly
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Record file (.json, .csv or .parquet)
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE", env = "MUNICIPAL_METRICS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Restrict to a municipality (repeatable, case-insensitive)
    #[arg(short, long = "group", value_name = "NAME", global = true)]
    pub groups: Vec<String>,

    /// Restrict to one calendar year
    #[arg(short, long, global = true)]
    pub year: Option<i32>,

    /// Start of an inclusive date range (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", requires = "to", global = true)]
    pub from: Option<NaiveDate>,

    /// End of an inclusive date range (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", requires = "from", global = true)]
    pub to: Option<NaiveDate>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Count, mean, std-dev and quartiles of one metric
    Summary {
        /// Metric field (defaults to mean radiance)
        #[arg(short, long)]
        field: Option<String>,
    },

    /// Box plot per municipality over every record (ignores filters)
    Boxplot {
        #[arg(short, long)]
        field: Option<String>,
    },

    /// Equal-width histogram of one metric
    Histogram {
        #[arg(short, long)]
        field: Option<String>,
    },

    /// Mean of one metric per day
    Daily {
        #[arg(short, long)]
        field: Option<String>,
    },

    /// Sum of one metric per year and municipality (defaults to radiance sum)
    Yearly {
        #[arg(short, long)]
        field: Option<String>,
    },

    /// Paired metrics per municipality (defaults to GDP vs mean radiance)
    Scatter {
        #[arg(long)]
        x: Option<String>,
        #[arg(long)]
        y: Option<String>,
    },

    /// Municipalities ranked by the mean of one metric
    Rank {
        #[arg(short, long)]
        field: Option<String>,
        /// Number of municipalities to list
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Record counts, date span and radiance figures per municipality
    Stats,

    /// Radiance and GDP statistics per calendar quarter
    Quarterly {
        /// Radiance field (defaults to radiance sum)
        #[arg(long)]
        radiance: Option<String>,
        /// GDP field (defaults to municipal GDP)
        #[arg(long)]
        gdp: Option<String>,
    },

    /// Column names and their number of distinct values
    Columns,
}
