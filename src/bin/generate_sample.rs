use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, LogNormal, Normal};

/// Write a synthetic loan dataset shaped like Bankloan.csv.
#[derive(Debug, Parser)]
struct Args {
    /// Number of loan records.
    #[arg(long, default_value_t = 700)]
    rows: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// `;`-separated output, UTF-8 with BOM.
    #[arg(long, default_value = "Bankloan.csv")]
    output: PathBuf,

    /// Also write the same records as Parquet.
    #[arg(long)]
    parquet: Option<PathBuf>,
}

/// One generated loan record; `None` marks a missing cell.
struct Loan {
    age: i64,
    ed: i64,
    employ: Option<i64>,
    address: i64,
    income: f64,
    debtinc: Option<f64>,
    creddebt: f64,
    othdebt: f64,
    /// Raw outcome text, as the export tooling writes it.
    default: String,
}

const COLUMNS: [&str; 9] = [
    "age", "ed", "employ", "address", "income", "debtinc", "creddebt", "othdebt", "default",
];

/// Education levels weighted toward the low end.
const ED_LEVELS: [i64; 8] = [1, 1, 1, 2, 2, 3, 4, 5];

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn generate_loan(rng: &mut StdRng, income_dist: &LogNormal<f64>, debt_dist: &Normal<f64>) -> Loan {
    let age: i64 = rng.random_range(20..=56);
    let ed = ED_LEVELS[rng.random_range(0..ED_LEVELS.len())];
    let employ = rng.random_range(0..=(age - 18).min(33));
    let address = rng.random_range(0..=(age - 18).min(34));

    let income = round2((income_dist.sample(rng) + employ as f64 * 1.5).clamp(13.0, 446.0));
    let debtinc = round2(debt_dist.sample(rng).clamp(0.1, 41.3));
    let total_debt = income * debtinc / 100.0;
    let credit_share = rng.random_range(0.2..0.5);
    let creddebt = round2(total_debt * credit_share);
    let othdebt = round2(total_debt - creddebt);

    // Logistic risk: debt burden raises it, job and address tenure lower it.
    let score = -1.6 + 0.11 * debtinc - 0.17 * employ as f64 - 0.06 * address as f64
        + 0.45 * creddebt;
    let defaulted = rng.random_bool(1.0 / (1.0 + (-score).exp()));
    let code = if defaulted { '1' } else { '0' };
    let default = match rng.random_range(0..20) {
        0 => format!("'{code}'"),
        1 => format!(":{code}"),
        _ => code.to_string(),
    };

    Loan {
        age,
        ed,
        employ: (!rng.random_bool(0.02)).then_some(employ),
        address,
        income,
        debtinc: (!rng.random_bool(0.03)).then_some(debtinc),
        creddebt,
        othdebt,
        default,
    }
}

fn write_csv(path: &Path, loans: &[Loan]) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    file.write_all("\u{feff}".as_bytes())?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(file);
    writer.write_record(COLUMNS)?;
    for loan in loans {
        writer.write_record([
            loan.age.to_string(),
            loan.ed.to_string(),
            loan.employ.map(|v| v.to_string()).unwrap_or_default(),
            loan.address.to_string(),
            loan.income.to_string(),
            loan.debtinc.map(|v| v.to_string()).unwrap_or_default(),
            loan.creddebt.to_string(),
            loan.othdebt.to_string(),
            loan.default.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, loans: &[Loan]) -> Result<()> {
    let int_field = |name: &str, nullable| Field::new(name, DataType::Int64, nullable);
    let float_field = |name: &str, nullable| Field::new(name, DataType::Float64, nullable);
    let schema = Arc::new(Schema::new(vec![
        int_field("age", false),
        int_field("ed", false),
        int_field("employ", true),
        int_field("address", false),
        float_field("income", false),
        float_field("debtinc", true),
        float_field("creddebt", false),
        float_field("othdebt", false),
        Field::new("default", DataType::Utf8, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(loans.iter().map(|l| l.age))),
        Arc::new(Int64Array::from_iter_values(loans.iter().map(|l| l.ed))),
        Arc::new(Int64Array::from_iter(loans.iter().map(|l| l.employ))),
        Arc::new(Int64Array::from_iter_values(loans.iter().map(|l| l.address))),
        Arc::new(Float64Array::from_iter_values(loans.iter().map(|l| l.income))),
        Arc::new(Float64Array::from_iter(loans.iter().map(|l| l.debtinc))),
        Arc::new(Float64Array::from_iter_values(loans.iter().map(|l| l.creddebt))),
        Arc::new(Float64Array::from_iter_values(loans.iter().map(|l| l.othdebt))),
        Arc::new(StringArray::from_iter_values(loans.iter().map(|l| l.default.as_str()))),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let income_dist = LogNormal::new(3.5, 0.6)?;
    let debt_dist = Normal::new(10.0, 6.5)?;

    let loans: Vec<Loan> = (0..args.rows)
        .map(|_| generate_loan(&mut rng, &income_dist, &debt_dist))
        .collect();

    write_csv(&args.output, &loans)?;
    log::info!("wrote {}", args.output.display());

    if let Some(path) = &args.parquet {
        write_parquet(path, &loans)?;
        log::info!("wrote {}", path.display());
    }

    let defaults = loans
        .iter()
        .filter(|l| l.default.contains('1'))
        .count();
    println!(
        "Wrote {} loan records ({defaults} defaulted) to {}",
        loans.len(),
        args.output.display()
    );
    Ok(())
}
