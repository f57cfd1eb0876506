// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::bulletin::BulletinDate;
use crate::extractors::{SectionKind, SectionTables};
use crate::utils::error::StorageError;

const REPORT_TITLE: &str = "VALORES BURSATILES";

/// Where a run's tables came from; drives file names and metadata.
#[derive(Debug, Clone)]
pub struct RunSource {
    /// File stem for outputs, e.g. `Boletin_05_03_2024`.
    pub stem: String,
    pub date: Option<BulletinDate>,
    /// Bulletin file name or input path as given.
    pub source_file: String,
}

impl RunSource {
    pub fn from_date(date: BulletinDate) -> Self {
        Self {
            stem: date.output_stem(),
            date: Some(date),
            source_file: date.file_name(),
        }
    }

    pub fn from_input(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bulletin".to_string());
        Self {
            stem,
            date: None,
            source_file: path.display().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TableMetadata<'a> {
    title: &'static str,
    process_date: Option<String>,
    month: Option<u32>,
    year: Option<i32>,
    source_file: &'a str,
    equities_tables: usize,
    cfi_tables: usize,
    sheets: Vec<&'static str>,
    total_rows: usize,
    extraction_timestamp: String,
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// Saves both section lists as `<stem>.json`.
    pub fn save_tables(&self, source: &RunSource, tables: &SectionTables) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("{}.json", source.stem));
        let json = serde_json::to_string_pretty(tables)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Saved tables to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves run metadata as `<stem>_meta.json`.
    pub fn save_metadata(&self, source: &RunSource, tables: &SectionTables) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("{}_meta.json", source.stem));

        let sheets = [SectionKind::Equities, SectionKind::Cfi]
            .into_iter()
            .filter(|s| !tables.tables(*s).is_empty())
            .map(SectionKind::label)
            .collect();
        let metadata = TableMetadata {
            title: REPORT_TITLE,
            process_date: source.date.map(|d| d.process_label()),
            month: source.date.map(|d| d.month()),
            year: source.date.map(|d| d.year()),
            source_file: &source.source_file,
            equities_tables: tables.equities.len(),
            cfi_tables: tables.cfi.len(),
            sheets,
            total_rows: tables.row_count(),
            extraction_timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }

    /// Writes a text artifact under `<base>/debug/`.
    pub fn save_debug_text(&self, file_name: &str, content: &str) -> Result<PathBuf, StorageError> {
        let debug_dir = self.base_dir.join("debug");
        fs::create_dir_all(&debug_dir).map_err(StorageError::IoError)?;
        let file_path = debug_dir.join(file_name);
        fs::write(&file_path, content).map_err(StorageError::IoError)?;
        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{NormalizedRow, PriceStatus, SectionTable};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bulletin_extractor_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample_tables() -> SectionTables {
        let mut tables = SectionTables::default();
        tables.push(SectionTable {
            section: SectionKind::Equities,
            page_index: 4,
            rows: vec![NormalizedRow {
                symbol: "AGUAS-A".to_string(),
                price: 1101.4,
                status: PriceStatus::Quoted,
            }],
        });
        tables
    }

    #[test]
    fn test_save_tables_and_metadata() {
        let dir = scratch_dir("save");
        let storage = StorageManager::new(&dir).unwrap();
        let source = RunSource::from_date(BulletinDate::parse("2024-03-05").unwrap());
        let tables = sample_tables();

        let tables_path = storage.save_tables(&source, &tables).unwrap();
        assert!(tables_path.ends_with("Boletin_05_03_2024.json"));
        let saved: SectionTables = serde_json::from_str(&fs::read_to_string(&tables_path).unwrap()).unwrap();
        assert_eq!(saved, tables);

        let meta_path = storage.save_metadata(&source, &tables).unwrap();
        let meta: serde_json::Value = serde_json::from_str(&fs::read_to_string(&meta_path).unwrap()).unwrap();
        assert_eq!(meta["title"], "VALORES BURSATILES");
        assert_eq!(meta["process_date"], "05/03/2024");
        assert_eq!(meta["source_file"], "ibd050324.pdf");
        assert_eq!(meta["sheets"], serde_json::json!(["Acciones"]));
        assert_eq!(meta["total_rows"], 1);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_input_source_uses_file_stem() {
        let source = RunSource::from_input(Path::new("/tmp/pages/ibd050324.pdf"));
        assert_eq!(source.stem, "ibd050324");
        assert!(source.date.is_none());
    }
}
