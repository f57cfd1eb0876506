// src/main.rs
use std::path::{Path, PathBuf};

use clap::{ArgGroup, Parser};

use bulletin_extractor::bulletin::{client, BulletinDate};
use bulletin_extractor::extractors::config::DEFAULT_LINE_TOLERANCE;
use bulletin_extractor::extractors::lines::split_pages;
use bulletin_extractor::extractors::pipeline::reconstruct_pages;
use bulletin_extractor::extractors::{extract_tables_from_text, ExtractConfig, ParseMode, PositionedToken, RowParser};
use bulletin_extractor::pdf;
use bulletin_extractor::storage::{RunSource, StorageManager};
use bulletin_extractor::utils::{self, error::ExtractError, AppError};

/// Command Line Interface for the daily bulletin closing-price extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["date", "input"])))]
struct Args {
    /// Bulletin date (YYYY-MM-DD); the PDF is downloaded from the exchange archive
    #[arg(short, long)]
    date: Option<String>,

    /// Local input instead of a download: .pdf, .json token pages, or page text
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for extracted tables
    #[arg(short, long, env = "BULLETIN_OUTPUT_DIR", default_value = "./output")]
    output_dir: PathBuf,

    /// Require a price on every row and more than 3 rows per page
    #[arg(long)]
    strict: bool,

    /// Override the minimum number of rows a page needs to be kept
    #[arg(long, env = "BULLETIN_MIN_ROWS")]
    min_rows: Option<usize>,

    /// Vertical distance within which text fragments share a line (0 = exact)
    #[arg(long, env = "BULLETIN_LINE_TOLERANCE", default_value_t = DEFAULT_LINE_TOLERANCE)]
    line_tolerance: f32,

    /// Debug mode - verbose logs and annotated page dumps
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn extract_config(&self) -> ExtractConfig {
        ExtractConfig {
            line_tolerance: self.line_tolerance,
            parse_mode: if self.strict { ParseMode::Strict } else { ParseMode::Lenient },
            min_rows: self.min_rows,
        }
    }
}

enum PageInput {
    Tokens(Vec<Vec<PositionedToken>>),
    Text(Vec<String>),
}

fn read_input(path: &Path) -> Result<PageInput, AppError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => {
            let bytes = std::fs::read(path)?;
            Ok(PageInput::Tokens(pdf::load_page_tokens(&bytes)?))
        }
        "json" => {
            let raw = std::fs::read_to_string(path)?;
            let pages = serde_json::from_str(&raw).map_err(|e| ExtractError::TokenInput(e.to_string()))?;
            Ok(PageInput::Tokens(pages))
        }
        _ => {
            let raw = std::fs::read_to_string(path)?;
            Ok(PageInput::Text(split_pages(&raw)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.debug);
    tracing::info!("Starting processing for args: {:?}", args);

    let config = args.extract_config();
    config.validate()?;
    tracing::debug!("Extraction config: {:?}", config);

    // 3. Initialize storage
    let storage = StorageManager::new(&args.output_dir)?;

    // 4. Obtain page input, downloading the bulletin when a date is given
    let (source, input) = match (&args.date, &args.input) {
        (Some(date), _) => {
            let date = BulletinDate::parse(date)?;
            tracing::info!("Fetching bulletin {} for {}", date.file_name(), date.process_label());
            let bytes = client::fetch_bulletin(&date).await?;
            (RunSource::from_date(date), PageInput::Tokens(pdf::load_page_tokens(&bytes)?))
        }
        (None, Some(path)) => (RunSource::from_input(path), read_input(path)?),
        (None, None) => return Err(AppError::Config("either --date or --input is required".to_string())),
    };

    // 5. Rebuild page text
    let pages = match input {
        PageInput::Tokens(tokens) => reconstruct_pages(&tokens, config.line_tolerance),
        PageInput::Text(text) => text,
    };
    tracing::info!("Processing {} pages from {}", pages.len(), source.source_file);

    if args.debug {
        let dump = utils::page_debug::annotate_pages(&pages, &RowParser::new(config.parse_mode));
        match storage.save_debug_text(&format!("{}_pages.txt", source.stem), &dump) {
            Ok(path) => tracing::info!("Saved annotated pages to: {}", path.display()),
            Err(e) => tracing::warn!("Failed to save annotated pages: {}", e),
        }
    }

    // 6. Extract tables
    let tables = match extract_tables_from_text(&pages, &config) {
        Ok(tables) => tables,
        Err(e) => {
            tracing::error!("Extraction failed for {}: {}", source.source_file, e);
            return Err(e.into());
        }
    };

    // 7. Save tables and metadata
    let tables_path = storage.save_tables(&source, &tables)?;
    storage.save_metadata(&source, &tables)?;

    tracing::info!(
        "Processing finished. {} equities tables, {} CFI tables, written to {}",
        tables.equities.len(),
        tables.cfi.len(),
        tables_path.display()
    );

    Ok(())
}
