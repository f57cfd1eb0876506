// src/bulletin/models.rs
use chrono::{Datelike, NaiveDate};

use crate::utils::error::BulletinError;

const ARCHIVE_BASE_URL: &str =
    "https://cibe.bolsadesantiago.com/Documentos/EstadisticasyPublicaciones/Boletines%20Burstiles";

/// Page listing every published bulletin; used when the direct URL fails.
pub const LISTING_URL: &str = "https://www.bolsadesantiago.com/estadisticas_boletinbursatil";

/// The trading day a bulletin was published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulletinDate(NaiveDate);

impl BulletinDate {
    /// Parses the `YYYY-MM-DD` form used on the command line.
    pub fn parse(s: &str) -> Result<Self, BulletinError> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| BulletinError::InvalidDate(s.to_string()))
    }

    /// Archive file name, e.g. `ibd150324.pdf` for 2024-03-15.
    pub fn file_name(&self) -> String {
        format!("ibd{}.pdf", self.0.format("%d%m%y"))
    }

    /// Direct archive URL of the bulletin PDF.
    pub fn direct_url(&self) -> String {
        format!("{}/{}", ARCHIVE_BASE_URL, self.file_name())
    }

    /// How the listing page labels this date (`DD-MM-YYYY`).
    pub fn listing_label(&self) -> String {
        self.0.format("%d-%m-%Y").to_string()
    }

    /// Human process date (`DD/MM/YYYY`).
    pub fn process_label(&self) -> String {
        self.0.format("%d/%m/%Y").to_string()
    }

    /// Stem for output files, e.g. `Boletin_15_03_2024`.
    pub fn output_stem(&self) -> String {
        self.0.format("Boletin_%d_%m_%Y").to_string()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_and_url() {
        let date = BulletinDate::parse("2024-03-05").unwrap();
        assert_eq!(date.file_name(), "ibd050324.pdf");
        assert_eq!(
            date.direct_url(),
            "https://cibe.bolsadesantiago.com/Documentos/EstadisticasyPublicaciones/Boletines%20Burstiles/ibd050324.pdf"
        );
    }

    #[test]
    fn test_labels() {
        let date = BulletinDate::parse("2024-03-05").unwrap();
        assert_eq!(date.listing_label(), "05-03-2024");
        assert_eq!(date.process_label(), "05/03/2024");
        assert_eq!(date.output_stem(), "Boletin_05_03_2024");
        assert_eq!((date.month(), date.year()), (3, 2024));
    }

    #[test]
    fn test_invalid_dates_rejected() {
        for bad in ["2024-13-01", "05-03-2024", "ayer", ""] {
            assert!(matches!(BulletinDate::parse(bad), Err(BulletinError::InvalidDate(_))), "{}", bad);
        }
    }
}
