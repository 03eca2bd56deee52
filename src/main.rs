use clap::{Parser, Subcommand};
use mcdagua_dash::cli;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mcdagua")]
#[command(about = "Extract chart series and datasets from the dashboard workbooks")]
#[command(long_about = "McDagua - spreadsheet table extraction

Reads the general, VISA and HACCP workbooks, locates each configured
sub-table by fixed coordinates or by a marker cell, and normalizes it
into a column-named table or a chart series.

COMMANDS:
  extract - Print every configured sub-table as JSON
  inspect - Show sheet names or the top-left grid region of a sheet
  export  - Write a workbook's (filtered) dataset to .xlsx

EXAMPLES:
  mcdagua extract --pretty                     # All workbooks, built-in layout
  mcdagua extract -c dashboard.yaml -w haccp   # One workbook, custom layout
  mcdagua inspect data/Planilhamcd.xlsx --sheet grafico-pendencia
  mcdagua export visa visa.xlsx --filter regional=SP")]
#[command(version)]
struct Cli {
    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Extract every configured sub-table and print it as JSON.

Missing workbooks, sheets or anchors never fail the command: the affected
sub-tables come out empty and a warning is logged (see --verbose).

OUTPUT:
  With --workbook: { \"<sub-table>\": <table or chart> }
  Without:         { \"<workbook>\": { \"<sub-table>\": ... } }")]
    /// Print extracted sub-tables as JSON
    Extract {
        /// Dashboard YAML (built-in layout when omitted)
        #[arg(short, long, env = "MCDAGUA_CONFIG")]
        config: Option<PathBuf>,

        /// Only this workbook (geral, visa, haccp, ...)
        #[arg(short, long)]
        workbook: Option<String>,

        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },

    #[command(long_about = "Inspect a workbook while authoring anchors.

Without --sheet, lists the sheet names. With --sheet, prints the top-left
region of the sheet with absolute row numbers and column letters, the same
coordinates used by fixed anchors (row 0 / column 0 is A1).")]
    /// Show sheet names or a sheet's top-left region
    Inspect {
        /// Path to .xlsx file
        file: PathBuf,

        /// Sheet to print
        #[arg(short, long)]
        sheet: Option<String>,

        /// Rows to print
        #[arg(short, long, default_value = "30")]
        rows: usize,

        /// Columns to print
        #[arg(long, default_value = "12")]
        cols: usize,
    },

    /// Write a workbook's dataset to .xlsx
    Export {
        /// Workbook kind (geral, visa, haccp, ...)
        kind: String,

        /// Output .xlsx path
        output: PathBuf,

        /// Dashboard YAML (built-in layout when omitted)
        #[arg(short, long, env = "MCDAGUA_CONFIG")]
        config: Option<PathBuf>,

        /// Record filter as key=value (repeatable; value may hold a|b alternatives)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract {
            config,
            workbook,
            pretty,
        } => cli::extract(config, workbook, pretty),

        Commands::Inspect {
            file,
            sheet,
            rows,
            cols,
        } => cli::inspect(file, sheet, rows, cols),

        Commands::Export {
            kind,
            output,
            config,
            filters,
        } => cli::export(config, kind, output, filters),
    }?;
    Ok(())
}
