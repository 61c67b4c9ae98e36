use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use structopt::StructOpt;

use tidy_series::config::DEFAULT_EXPORT_NAME;
use tidy_series::{
    filter_range, load_file, parse_with, select_variable_with, summary, value_domain, write_csv,
    write_csv_file, LoaderOptions, Stats, VariableStrategy,
};

#[derive(Debug, StructOpt)]
#[structopt(name = "tidy-series", about = "Load, summarise and filter a sensor CSV file")]
struct Opt {
    /// CSV file to load
    #[structopt(parse(from_os_str))]
    input: PathBuf,
    /// JSON file with loader options
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// Use this column as the measured variable
    #[structopt(long)]
    column: Option<String>,
    /// Use the first fully numeric column as the measured variable
    #[structopt(long, conflicts_with = "column")]
    numeric_only: bool,
    /// List candidate columns and exit
    #[structopt(long)]
    list_columns: bool,
    /// Keep rows with values strictly above this bound
    #[structopt(long, allow_hyphen_values = true)]
    lower: Option<f64>,
    /// Keep rows with values strictly below this bound
    #[structopt(long, allow_hyphen_values = true)]
    upper: Option<f64>,
    /// Where to write the filtered CSV ("-" for stdout)
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

fn print_stats(out: &mut dyn Write, stats: &Stats) -> std::io::Result<()> {
    let std = stats
        .std
        .map(|s| format!("{s:.2}"))
        .unwrap_or_else(|| "NaN".to_string());
    writeln!(out, "count  {}", stats.count)?;
    writeln!(out, "mean   {:.2}", stats.mean)?;
    writeln!(out, "std    {std}")?;
    writeln!(out, "min    {:.2}", stats.min)?;
    writeln!(out, "25%    {:.2}", stats.p25)?;
    writeln!(out, "50%    {:.2}", stats.p50)?;
    writeln!(out, "75%    {:.2}", stats.p75)?;
    writeln!(out, "max    {:.2}", stats.max)
}

fn main() -> Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let mut options = match &opt.config {
        Some(path) => LoaderOptions::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => LoaderOptions::default(),
    };
    if let Some(column) = &opt.column {
        options.strategy = VariableStrategy::Column(column.clone());
    } else if opt.numeric_only {
        options.strategy = VariableStrategy::FirstNumeric;
    }

    if opt.list_columns {
        let bytes = std::fs::read(&opt.input)
            .with_context(|| format!("reading {}", opt.input.display()))?;
        let raw = parse_with(&bytes, &options).context("Error processing the file")?;
        for name in select_variable_with(&raw, opt.numeric_only, &options)? {
            println!("{name}");
        }
        return Ok(());
    }

    let series = load_file(&opt.input, &options).context("Error processing the file")?;
    if !series.has_variable() {
        bail!("{} contains only a time column, nothing to analyse", opt.input.display());
    }
    log::info!(
        "'{}' loaded as '{}' ({} rows)",
        series.source_column.as_deref().unwrap_or_default(),
        options.canonical_name,
        series.len()
    );

    // Keep stdout clean when the CSV itself goes there.
    let to_stdout = opt.output.as_deref() == Some(Path::new("-"));
    let mut report: Box<dyn Write> = if to_stdout {
        Box::new(std::io::stderr())
    } else {
        Box::new(std::io::stdout())
    };

    print_stats(&mut report, &summary(&series)?)?;
    if let Some(domain) = value_domain(&series)? {
        log::debug!("Value domain {domain:?}");
    }

    let outcome = filter_range(&series, opt.lower, opt.upper)?;
    if let Some(warning) = &outcome.warning {
        eprintln!("warning: {warning}");
    }
    writeln!(report, "{} of {} rows kept", outcome.series.len(), series.len())?;

    match opt.output {
        Some(_) if to_stdout => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_csv(&outcome.series, &options.time_column, &mut lock)?;
            lock.flush()?;
        }
        Some(path) => write_csv_file(&outcome.series, &options.time_column, &path)?,
        None if opt.lower.is_some() || opt.upper.is_some() => {
            write_csv_file(
                &outcome.series,
                &options.time_column,
                &PathBuf::from(DEFAULT_EXPORT_NAME),
            )?;
        }
        None => {}
    }

    Ok(())
}
