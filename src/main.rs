// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use office_records::{load_samples_csv, Config, CsvExporter, SqliteStore, SurveySection};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "office-records", version, about = "Survey progress tracking and mail log")]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "OFFICE_RECORDS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the database path from the config
    #[arg(long, env = "OFFICE_RECORDS_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import registry samples for a survey from a CSV allocation file
    ImportSamples {
        survey: String,
        csv: PathBuf,
    },
    /// Export the reconciled progress table of a survey to CSV
    Export {
        survey: Option<String>,
        /// Only export rows matching this search text
        #[arg(short, long, default_value = "")]
        query: String,
        /// Output directory (defaults to export_dir from the config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Interactive terminal UI (default)
    Ui {
        survey: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())
        .context("Failed to load config file")?;
    if let Some(db) = args.database {
        config.database_path = db;
    }

    match args.command.unwrap_or(Command::Ui { survey: None }) {
        Command::ImportSamples { survey, csv } => {
            init_logging(false)?;
            run_import(&config, &survey, csv)
        }
        Command::Export { survey, query, out } => {
            init_logging(false)?;
            let survey = survey.unwrap_or_else(|| config.default_survey.clone());
            run_export(&config, &survey, &query, out)
        }
        Command::Ui { survey } => {
            init_logging(true)?;
            let survey = survey.unwrap_or_else(|| config.default_survey.clone());
            run_ui_mode(&config, &survey)
        }
    }
}

/// The terminal UI owns the screen, so its logs go to a file instead of stderr.
fn init_logging(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if to_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("office-records.log")
            .context("Failed to open log file")?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn open_store(config: &Config) -> Result<Arc<SqliteStore>> {
    let store = SqliteStore::open(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    Ok(Arc::new(store))
}

fn run_import(config: &Config, survey: &str, csv: PathBuf) -> Result<()> {
    println!("🗄️  Registry import - CSV → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading CSV...");
    let samples = load_samples_csv(&csv, survey)?;
    println!("✓ Loaded {} samples for {}", samples.len(), survey);

    println!("\n🔧 Opening database...");
    let store = open_store(config)?;
    println!("✓ Database ready at {}", config.database_path.display());

    println!("\n💾 Inserting samples...");
    let rt = Runtime::new()?;
    let summary = rt.block_on(store.import_samples(samples))?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ New samples: {}", summary.inserted);
    println!("✓ Already registered: {}", summary.duplicates);

    Ok(())
}

fn run_export(config: &Config, survey: &str, query: &str, out: Option<PathBuf>) -> Result<()> {
    let store = open_store(config)?;
    let exporter = CsvExporter::new(out.unwrap_or_else(|| config.export_dir.clone()));
    let mut section = SurveySection::new(store, survey).with_region(config.region());

    let rt = Runtime::new()?;
    if !rt.block_on(section.set_query(query)) {
        bail!("Failed to load survey rows for {}", survey);
    }
    println!("📊 {}", section.report().summary());

    match section.export(&exporter) {
        Some(path) => {
            println!("✅ Exported {} rows to {}", section.rows().len(), path.display());
            Ok(())
        }
        None => bail!("Export failed"),
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config, survey: &str) -> Result<()> {
    println!("🖥️  Loading office records UI...\n");

    let store = open_store(config)?;
    let exporter = CsvExporter::new(&config.export_dir);
    let section = SurveySection::new(store.clone(), survey).with_region(config.region());

    let rt = Runtime::new()?;
    let mut app = ui::App::new(rt, store, section, exporter);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config, _survey: &str) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin office-server --features server");
    std::process::exit(1);
}
