//! Exam Crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use exam_crawler::{
    error::{AppError, Result},
    models::Config,
    pipeline,
    services::{ActionListExtractor, TaxonomyNormalizer},
};

/// Exam Crawler - archived exam paper downloader
#[derive(Parser, Debug)]
#[command(
    name = "exam-crawler",
    version,
    about = "Downloads archived exam papers and solutions"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "storage/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the catalogue and download every problem and solution
    Run {
        /// First year of the search range
        #[arg(long)]
        begin_year: Option<u16>,

        /// Last year of the search range
        #[arg(long)]
        end_year: Option<u16>,

        /// Grade key (see [[grades]])
        #[arg(long)]
        grade: Option<String>,

        /// Category key (see [[categories]])
        #[arg(long)]
        category: Option<String>,

        /// Output root directory
        #[arg(short, long)]
        out: Option<String>,

        /// Raw Cookie header value for an authenticated session
        #[arg(long, conflicts_with = "cookie_file")]
        cookie: Option<String>,

        /// File containing the raw Cookie header value
        #[arg(long)]
        cookie_file: Option<PathBuf>,

        /// Dump raw pages and log response metadata
        #[arg(long)]
        debug: bool,

        /// Leave files that already exist untouched
        #[arg(long)]
        skip_existing: bool,

        /// Maximum number of catalogue pages to request
        #[arg(long)]
        max_pages: Option<u32>,
    },

    /// Rename downloaded files to the configured file template
    Rename {
        /// Directory holding the files
        dir: PathBuf,

        /// Only log the planned renames
        #[arg(long)]
        dry_run: bool,
    },

    /// Show how a title is classified
    Normalize {
        /// Catalogue title
        title: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run {
            begin_year,
            end_year,
            grade,
            category,
            out,
            cookie,
            cookie_file,
            debug,
            skip_existing,
            max_pages,
        } => {
            if let Some(year) = begin_year {
                config.catalog.begin_year = year;
            }
            if let Some(year) = end_year {
                config.catalog.end_year = year;
            }
            if let Some(grade) = grade {
                config.catalog.grade = grade;
            }
            if let Some(category) = category {
                config.catalog.category = category;
            }
            if let Some(out) = out {
                config.output.root = out;
            }
            if let Some(pages) = max_pages {
                config.catalog.max_pages = pages;
            }
            config.output.debug |= debug;
            config.output.skip_existing |= skip_existing;

            let cookie = match cookie_file {
                Some(path) => Some(std::fs::read_to_string(&path)?.trim().to_string()),
                None => cookie,
            };

            let summary = pipeline::run_crawler(&config, cookie.as_deref()).await?;
            if summary.failed > 0 {
                log::warn!(
                    "{} downloads failed; rerun with --skip-existing to retry them",
                    summary.failed
                );
            }
        }

        Command::Rename { dir, dry_run } => {
            pipeline::run_rename(&config, &dir, dry_run).await?;
        }

        Command::Normalize { title, json } => {
            let taxonomy = TaxonomyNormalizer::from_config(&config)?.normalize(&title);
            if json {
                println!("{}", serde_json::to_string_pretty(&taxonomy)?);
            } else {
                println!("year:     {}", taxonomy.year);
                println!("month:    {}", taxonomy.month);
                println!("subject:  {}", taxonomy.subject());
                println!("category: {}", taxonomy.category);
                println!("grade:    {}", taxonomy.grade);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            ActionListExtractor::new(&config.extractor).map_err(|e| {
                log::error!("Extractor selectors are invalid: {}", e);
                AppError::validation(e.to_string())
            })?;

            log::info!(
                "✓ Config OK ({} grades, {} categories, {} subjects)",
                config.grades.len(),
                config.categories.len(),
                config.subjects.len()
            );
        }
    }

    Ok(())
}
