use std::path::PathBuf;

use clap::{Parser, Subcommand};
use threepl_audit::audit;
use threepl_audit::io::excel_read;
use threepl_audit::model::ParsedSource;
use threepl_audit::store::{self, ReportStore};
use threepl_audit::{AuditError, Result, fmt};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| AuditError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => execute_run(args),
        Command::Inspect { input } => execute_inspect(input),
        Command::List { store_dir, owner } => execute_list(store_dir, owner),
        Command::Show { store_dir, id } => execute_show(store_dir, id),
        Command::Delete { store_dir, id } => execute_delete(store_dir, id),
    }
}

fn execute_run(args: RunArgs) -> Result<()> {
    let batch = audit::ingest_files(&args.inputs)?;
    for warning in &batch.warnings {
        eprintln!("warning: {warning}");
    }
    if batch.warehouse.is_empty() && batch.parcel.is_empty() {
        eprintln!("nothing to reconcile: no warehouse or parcel workbooks recognized");
        return Ok(());
    }

    let result = audit::reconcile_batch(&batch);
    print_result_summary(&result);

    if let Some(output) = &args.output {
        audit::export_json(output, &result)?;
        println!("JSON written to {}", output.display());
    }
    if let Some(output) = &args.xlsx {
        audit::export_xlsx(output, &result)?;
        println!("report written to {}", output.display());
    }
    if args.save {
        let files = batch.file_names();
        let name = args
            .name
            .unwrap_or_else(|| store::default_report_name(&files));
        let store = ReportStore::open(&args.store_dir)?;
        let saved = store.create(&name, &args.owner, files, result)?;
        println!("saved as {} ({})", saved.name, saved.id);
    }
    Ok(())
}

fn execute_inspect(input: PathBuf) -> Result<()> {
    if !input.exists() {
        return Err(AuditError::MissingInput(input));
    }
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    match excel_read::detect_path(&input, &file_name)? {
        ParsedSource::Warehouse(source) => {
            println!("{file_name}: warehouse workbook");
            println!("  rate card lines: {}", source.rate_card.len());
            println!("  outbound orders: {}", source.outbound.len());
            println!("  inbound lines:   {}", source.inbound.len());
            if let Some(totals) = &source.inbound_totals {
                println!(
                    "  inbound totals:  {} pallets, {} cases, {} each",
                    fmt::count(totals.pallets),
                    fmt::count(totals.cases),
                    fmt::count(totals.each)
                );
            }
            println!("  vas labor lines: {}", source.vas_labor.len());
            println!("  material lines:  {}", source.materials.len());
            println!(
                "  returns:         {} lines, {} units",
                source.returns.len(),
                fmt::count(source.return_units)
            );
            for warning in &source.warnings {
                println!("  warning: {warning}");
            }
        }
        ParsedSource::Parcel(source) => {
            println!("{file_name}: parcel workbook");
            println!("  transactions:   {}", source.transactions.len());
            println!("  backup records: {}", source.backup.len());
            for warning in &source.warnings {
                println!("  warning: {warning}");
            }
        }
        ParsedSource::Unknown { file_name } => {
            println!("{file_name}: unknown workbook type");
        }
    }
    Ok(())
}

fn execute_list(store_dir: PathBuf, owner: Option<String>) -> Result<()> {
    let store = ReportStore::open(store_dir)?;
    let reports = store.list(owner.as_deref())?;
    if reports.is_empty() {
        println!("no saved reports");
        return Ok(());
    }
    for report in reports {
        println!(
            "{}  {}  {}  net impact {}",
            report.id,
            report.created_at.format("%Y-%m-%d"),
            report.name,
            fmt::money(report.result.net_impact)
        );
    }
    Ok(())
}

fn execute_show(store_dir: PathBuf, id: String) -> Result<()> {
    let store = ReportStore::open(store_dir)?;
    let report = store.read(&id)?;
    println!(
        "{} — {} ({})",
        report.name,
        report.created_at.format("%B %-d, %Y"),
        report.files_uploaded.join(", ")
    );
    print_result_summary(&report.result);
    Ok(())
}

fn execute_delete(store_dir: PathBuf, id: String) -> Result<()> {
    let store = ReportStore::open(store_dir)?;
    store.delete(&id)?;
    println!("deleted {id}");
    Ok(())
}

fn print_result_summary(result: &threepl_audit::model::ReconciliationResult) {
    println!(
        "{} orders · {} shipments · warehouse {} · parcel {}",
        result.total_orders,
        result.total_shipments,
        fmt::money(result.total_warehouse_billed),
        fmt::money(result.total_parcel_billed)
    );
    println!(
        "{} findings · overcharges {} · credits {} · net impact {}",
        result.findings.len(),
        fmt::money(result.total_overcharges),
        fmt::money(result.total_credits),
        fmt::money(result.net_impact)
    );
    println!(
        "shipping cost/order {} · all-in cost/order {}",
        fmt::money(result.shipping_cost_per_order),
        fmt::money(result.all_in_cost_per_order)
    );
    for (category, summary) in &result.category_summary {
        let info = category.info();
        println!(
            "  {} {}: {} finding(s), overcharges {}, credits {}",
            info.icon,
            info.name,
            summary.count,
            fmt::money(summary.overcharges),
            fmt::money(summary.credits)
        );
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Audit 3PL warehouse and parcel invoices against the contracted rate card."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile a batch of invoice workbooks and report the findings.
    Run(RunArgs),
    /// Classify one workbook and show what was extracted from it.
    Inspect {
        /// Workbook to inspect.
        input: PathBuf,
    },
    /// List saved reports, newest first.
    List {
        /// Directory holding saved reports.
        #[arg(long, default_value = "reports")]
        store_dir: PathBuf,
        /// Only show reports saved by this owner.
        #[arg(long)]
        owner: Option<String>,
    },
    /// Show one saved report.
    Show {
        /// Directory holding saved reports.
        #[arg(long, default_value = "reports")]
        store_dir: PathBuf,
        /// Report identifier.
        id: String,
    },
    /// Delete one saved report.
    Delete {
        /// Directory holding saved reports.
        #[arg(long, default_value = "reports")]
        store_dir: PathBuf,
        /// Report identifier.
        id: String,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Invoice workbooks to reconcile; types are detected per file.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write the result as JSON.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the result as an Excel report.
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Persist the result to the report store.
    #[arg(long)]
    save: bool,

    /// Name for the saved report; defaults to the uploaded file names.
    #[arg(long)]
    name: Option<String>,

    /// Owner recorded on the saved report.
    #[arg(long, default_value = "local")]
    owner: String,

    /// Directory holding saved reports.
    #[arg(long, default_value = "reports")]
    store_dir: PathBuf,
}
