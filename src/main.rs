mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use credit_lens::data::filter::OutcomeFilter;
use credit_lens::data::loader::{Encoding, LoadOptions, DEFAULT_PATH};
use credit_lens::state::DashboardState;
use credit_lens::view::{Section, ViewOptions, INCOME_BINS};
use report::{render_text, Report};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Explore a credit-risk loan dataset: key metrics and chart data under filters.
#[derive(Debug, Parser)]
#[command(name = "credit-lens", version, about)]
struct Cli {
    /// Source file: delimited text, `.json` or `.parquet`.
    #[arg(long, default_value = DEFAULT_PATH)]
    path: PathBuf,

    /// Single-byte field separator.
    #[arg(long, default_value_t = ';')]
    delimiter: char,

    /// `utf-8` or `utf-8-sig` (BOM tolerated).
    #[arg(long, default_value = "utf-8-sig")]
    encoding: Encoding,

    /// `any`, `approved` or `not-approved`.
    #[arg(long, default_value = "any")]
    outcome: OutcomeFilter,

    #[arg(long)]
    age_min: Option<i64>,

    #[arg(long)]
    age_max: Option<i64>,

    #[arg(long)]
    income_min: Option<f64>,

    #[arg(long)]
    income_max: Option<f64>,

    /// overview, numeric, correlation, categorical or advanced.
    #[arg(long, default_value = "overview")]
    section: Section,

    /// Column of the numeric section.
    #[arg(long, default_value = "age")]
    variable: String,

    /// Histogram bins of the numeric section.
    #[arg(long, default_value_t = INCOME_BINS)]
    bins: usize,

    /// Seed of the 3D scatter sample.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got {:?}", cli.delimiter);
    }
    let options = LoadOptions {
        path: cli.path.clone(),
        delimiter: cli.delimiter as u8,
        encoding: cli.encoding,
    };

    let mut state = DashboardState::default();
    if !state.load(&options) {
        eprintln!(
            "{}",
            state.status_message.as_deref().unwrap_or("No data available")
        );
        return Ok(ExitCode::from(2));
    }

    let mut predicates = state.predicates.clone().with_outcome(cli.outcome);
    predicates.age = cli.age_min.unwrap_or(*predicates.age.start())
        ..=cli.age_max.unwrap_or(*predicates.age.end());
    predicates.income = cli.income_min.unwrap_or(*predicates.income.start())
        ..=cli.income_max.unwrap_or(*predicates.income.end());
    state.set_predicates(predicates);
    state.set_section(cli.section);
    state.view_options = ViewOptions {
        variable: cli.variable.clone(),
        bins: cli.bins,
        seed: cli.seed,
    };
    info!("{} rows pass the filters", state.filtered.len());

    let summary = state.summary().context("summarizing loaded data")?;
    let view = state
        .section_view()
        .context("building section view")?
        .with_context(|| format!("building the {} section", cli.section))?;

    let report = Report {
        predicates: &state.predicates,
        section: state.section,
        summary: &summary,
        view: &view,
    };
    match cli.format {
        Format::Text => print!("{}", render_text(&report)),
        Format::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serializing report")?
        ),
    }
    Ok(ExitCode::SUCCESS)
}
