//! FILENAME: app/src/main.rs
// PURPOSE: `regstats` command line front end for the pivot session.

use std::path::PathBuf;
use std::process::ExitCode;

use app_lib::{format_table, init_logging, DashboardConfig, HttpHierarchySource, LoadState, ReportSession};
use clap::{Parser, ValueEnum};
use pivot_engine::{MetricType, SortColumn};
use report_export::save_report;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MetricArg {
    MakerVsFuel,
    MakerVsVehicleClass,
}

impl From<MetricArg> for MetricType {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::MakerVsFuel => MetricType::MakerVsFuel,
            MetricArg::MakerVsVehicleClass => MetricType::MakerVsVehicleClass,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Pivot and export vehicle registration statistics.")]
struct Args {
    /// JSON config file. `REGSTATS_*` environment variables override it.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Which breakdown to load.
    #[arg(long, value_enum, default_value = "maker-vs-fuel")]
    metric: MetricArg,

    /// Restrict columns to a year (repeatable). Default: all years.
    #[arg(long = "year")]
    years: Vec<i32>,

    /// Append year-over-year columns for full-year periods.
    #[arg(long)]
    yoy: bool,

    /// Case-insensitive filter on group and sub labels.
    #[arg(long, default_value = "")]
    search: String,

    /// Sort column: `group`, `sub`, or a period token such as `FULL24`.
    #[arg(long)]
    sort: Option<String>,

    /// Sort descending (requires `--sort`).
    #[arg(long, requires = "sort")]
    desc: bool,

    /// 1-based page to print; clamped to the available pages.
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Print the render model as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Also write the filtered report workbook to the output directory.
    #[arg(long)]
    export: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), String> {
    let config = DashboardConfig::load(args.config.as_deref()).map_err(|e| e.to_string())?;
    if let Err(e) = init_logging(&config.log_level, config.log_file.as_deref()) {
        eprintln!("[LOG_INIT] {}", e);
    }

    let source = HttpHierarchySource::with_timeout(&config.api_base_url, config.request_timeout())
        .map_err(|e| e.to_string())?;
    let mut session = ReportSession::new(source, &config);
    let metric = MetricType::from(args.metric);
    session.set_metric(metric);

    if let LoadState::Failed { message } = session.load(false).await {
        return Err(format!("could not load {}: {}", metric, message));
    }

    session.set_selected_years(args.years.iter().copied().collect());
    session.set_include_yoy(args.yoy);
    session.set_search(args.search);
    if let Some(sort) = &args.sort {
        let column: SortColumn = sort.parse()?;
        session.select_sort_column(column.clone());
        if args.desc {
            session.select_sort_column(column);
        }
    }
    session.set_page(args.page);

    let model = session
        .render()
        .ok_or_else(|| format!("{} is not loaded", metric))?;

    if args.json {
        let json = serde_json::to_string_pretty(&model).map_err(|e| e.to_string())?;
        println!("{}", json);
    } else {
        let (group_header, sub_header) = metric.label_headers();
        print!("{}", format_table(&model, group_header, sub_header));
    }

    if args.export {
        let today = chrono::Local::now().date_naive();
        let report = session.export(today).map_err(|e| e.to_string())?;
        let path = save_report(&report, &config.output_dir).map_err(|e| e.to_string())?;
        eprintln!("wrote {} ({} sheets)", path.display(), report.sheet_names.len());
    }

    Ok(())
}
