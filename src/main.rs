mod cli;

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};

use cli::{Args, Command};
use municipal_metrics::data::loader;
use municipal_metrics::{DashboardState, DateRange, EngineConfig, Selection};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let records = loader::load_file(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;

    let mut state = DashboardState::new(config);
    state.set_records(records);
    state.set_selection(Selection {
        groups: args.groups.iter().map(|g| g.trim().to_string()).collect(),
        year: args.year,
        date_range: args.from.zip(args.to).map(|(from, to)| DateRange { from, to }),
    });

    let output = render(&mut state, &args.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Compute the requested view and shape it for the chart layer.
fn render(state: &mut DashboardState, command: &Command) -> Result<Value> {
    let fields = state.config.fields.clone();
    let metric = |f: &Option<String>| f.clone().unwrap_or_else(|| fields.radiance.clone());

    let value = match command {
        Command::Summary { field } => json!(state.series_summary(&metric(field))),
        Command::Boxplot { field } => json!(state.box_summaries(&metric(field))),
        Command::Histogram { field } => json!(state.histogram(&metric(field))),
        Command::Daily { field } => json!(state.daily_series(&metric(field))),
        Command::Yearly { field } => {
            let field = field.clone().unwrap_or_else(|| fields.radiance_sum.clone());
            let legend: BTreeMap<String, String> =
                state.color_map().legend_entries().into_iter().collect();
            let table = state.year_group_sums(&field);
            json!({ "groups": table.groups, "colors": legend, "rows": table.rows })
        }
        Command::Scatter { x, y } => {
            let x = x.clone().unwrap_or_else(|| fields.gdp.clone());
            let y = y.clone().unwrap_or_else(|| fields.radiance.clone());
            let colors = state.color_map();
            let groups: BTreeMap<&String, Value> = state
                .scatter(&x, &y)
                .iter()
                .map(|(group, points)| {
                    (group, json!({ "color": colors.color_for(group), "points": points }))
                })
                .collect();
            json!({ "x": x, "y": y, "groups": groups })
        }
        Command::Rank { field, top } => {
            let top = top.unwrap_or(state.config.ranking.top);
            json!(state.ranking(&metric(field), top))
        }
        Command::Stats => json!(state.group_stats()),
        Command::Quarterly { radiance, gdp } => {
            let radiance = radiance.clone().unwrap_or_else(|| fields.radiance_sum.clone());
            let gdp = gdp.clone().unwrap_or_else(|| fields.gdp.clone());
            json!({ "radiance": radiance, "gdp": gdp, "rows": state.quarterly(&radiance, &gdp) })
        }
        Command::Columns => {
            let columns: BTreeMap<&String, usize> = state
                .records()
                .unique_values
                .iter()
                .map(|(col, values)| (col, values.len()))
                .collect();
            json!({ "records": state.records().len(), "columns": columns })
        }
    };
    Ok(value)
}
