//! tdlr-scraper CLI - scrape TDLR TABS projects into SQLite and search them

use anyhow::Context;
use clap::{ArgGroup, CommandFactory, Parser};
use std::path::PathBuf;
use tdlr_scraper::config::{self, ScraperConfig};
use tdlr_scraper::storage::{ProjectStore, SearchField, SearchQuery};
use tdlr_scraper::ui::{self, Icons};
use tdlr_scraper::{Fetcher, HttpSearchApi};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tdlr-scraper")]
#[command(version)]
#[command(about = "TDLR project scraper and searcher")]
#[command(long_about = r#"
Scrapes project filings from the Texas Department of Licensing and Regulation
TABS search into a local SQLite database, then searches them by project number,
project name, or facility name.

Example usage:
  tdlr-scraper --scrape --max-records 300
  tdlr-scraper --search "Austin"
  tdlr-scraper --stats
"#)]
#[command(group(ArgGroup::new("mode").args(["scrape", "search", "stats"]).multiple(false)))]
struct Cli {
    /// Scrape project data from the TDLR website
    #[arg(long)]
    scrape: bool,

    /// Search for projects in the database
    #[arg(long, value_name = "TERM")]
    search: Option<String>,

    /// Show row count and a few sample projects
    #[arg(long)]
    stats: bool,

    /// Path to SQLite database [default: tdlr_projects.db]
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Number of records to fetch per request, at most 15 [default: 15]
    #[arg(long)]
    batch_size: Option<usize>,

    /// Delay in seconds between requests [default: 1.0]
    #[arg(long)]
    delay: Option<f64>,

    /// Maximum number of records to fetch, 0 for all [default: all]
    #[arg(long)]
    max_records: Option<usize>,

    /// Drop and recreate the projects table before scraping
    #[arg(long, requires = "scrape")]
    reset: bool,

    /// Restrict the search to a field (project-number, project-name, facility-name)
    #[arg(long = "field", value_name = "FIELD", requires = "search")]
    fields: Vec<SearchField>,

    /// Config file [default: tdlr.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut settings = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    apply_overrides(&mut settings, &cli);
    let database = settings.database();

    if cli.scrape {
        run_scrape(&settings, database, cli.reset)?;
    } else if let Some(term) = &cli.search {
        run_search(database, term, &cli.fields);
    } else if cli.stats {
        run_stats(database)?;
    } else {
        Cli::command().print_help()?;
        println!();
    }

    Ok(())
}

/// CLI flags win over the config file
fn apply_overrides(settings: &mut ScraperConfig, cli: &Cli) {
    if let Some(path) = &cli.db_path {
        settings.database = Some(path.clone());
    }
    if let Some(batch_size) = cli.batch_size {
        settings.batch_size = Some(batch_size);
    }
    if let Some(delay) = cli.delay {
        settings.delay = Some(delay);
    }
    if let Some(max_records) = cli.max_records {
        settings.max_records = Some(max_records);
    }
}

fn run_scrape(settings: &ScraperConfig, database: PathBuf, reset: bool) -> anyhow::Result<()> {
    ui::banner("Starting TDLR project scraping...");
    ui::setting(Icons::DATABASE, "Database", &database.display().to_string());

    let client_config = settings.client_config();
    ui::setting(Icons::GLOBE, "Endpoint", &client_config.endpoint);
    let options = settings.fetch_options()?;

    config::ensure_db_dir(&database)?;
    let store = ProjectStore::new(database);
    if reset {
        store.reset_schema().context("Failed to reset database")?;
        ui::caution("Existing projects table dropped");
    }

    let api = HttpSearchApi::new(&client_config).context("Failed to build HTTP client")?;
    let (progress, tx) = ui::ScrapeProgress::new();
    let fetcher = Fetcher::new(api, store)
        .context("Failed to initialize database")?
        .with_progress(tx);

    // Setup signal handler for graceful shutdown
    let shutdown_flag = fetcher.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nScraping interrupted by user.");
        shutdown_flag.store(true, std::sync::atomic::Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let summary = fetcher.run(&options);
    drop(fetcher);
    progress.finish();
    tracing::debug!("{}", summary);

    ui::scrape_summary(&summary);
    Ok(())
}

fn run_search(database: PathBuf, term: &str, fields: &[SearchField]) {
    let store = match ProjectStore::open_existing(database) {
        Ok(store) => store,
        Err(e) => {
            ui::failed(&e.to_string());
            std::process::exit(1);
        }
    };
    println!("{}", ui::search_heading(term));

    let query = SearchQuery::new(term).fields(fields);
    let results = store.search(&query);

    if results.is_empty() {
        println!("No projects found matching your search criteria.");
        println!(
            "{}",
            ui::quiet("Note: You may need to run the scraper first to populate the database.")
        );
        return;
    }

    println!();
    println!("Found {} projects:", results.len());
    println!("{}", ui::results_table(&results.rows));
}

fn run_stats(database: PathBuf) -> anyhow::Result<()> {
    let store = match ProjectStore::open_existing(database) {
        Ok(store) => store,
        Err(e) => {
            ui::failed(&e.to_string());
            std::process::exit(1);
        }
    };

    let stats = store.stats()?;
    println!("{}", ui::stats_heading(store.path()));
    println!("{}", "-".repeat(36));
    println!("{}", stats);

    let sample = store.sample(5)?;
    if !sample.is_empty() {
        ui::section("Sample projects");
        println!("{}", ui::results_table(&sample));
    }
    Ok(())
}
