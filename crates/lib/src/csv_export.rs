//! # Adobe Stock CSV Export
//!
//! Writes metadata records in the layout accepted by Adobe Stock's CSV upload:
//! `Filename,Title,Keywords,Category,Releases`.

use crate::types::MetadataRecord;
use serde::Serialize;
use std::io::Write;

pub const CSV_HEADER: [&str; 5] = ["Filename", "Title", "Keywords", "Category", "Releases"];

/// One CSV line: a file and the metadata generated for it.
#[derive(Debug, Clone)]
pub struct CsvRow {
    pub filename: String,
    pub record: MetadataRecord,
    /// Comma-separated model release names, usually empty.
    pub releases: String,
}

impl CsvRow {
    pub fn new(filename: impl Into<String>, record: MetadataRecord) -> Self {
        Self {
            filename: filename.into(),
            record,
            releases: String::new(),
        }
    }
}

#[derive(Serialize)]
struct CsvLine<'a> {
    #[serde(rename = "Filename")]
    filename: &'a str,
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Keywords")]
    keywords: String,
    #[serde(rename = "Category")]
    category: u8,
    #[serde(rename = "Releases")]
    releases: &'a str,
}

/// Writes the header and one line per row; keywords are joined with `", "`.
pub fn write_csv<W: Write>(writer: W, rows: &[CsvRow]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        csv_writer.write_record(CSV_HEADER)?;
    }
    for row in rows {
        csv_writer.serialize(CsvLine {
            filename: &row.filename,
            title: &row.record.title,
            keywords: row.record.keywords.join(", "),
            category: row.record.category.code(),
            releases: &row.releases,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    #[test]
    fn test_write_csv_layout() {
        let rows = vec![CsvRow::new(
            "fox.jpg",
            MetadataRecord {
                title: "Red fox in snow".to_string(),
                keywords: vec!["fox".to_string(), "snow".to_string(), "winter".to_string()],
                category: Category::Animals,
            },
        )];
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &rows).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "Filename,Title,Keywords,Category,Releases\nfox.jpg,Red fox in snow,\"fox, snow, winter\",1,\n"
        );
    }

    #[test]
    fn test_write_csv_header_only_when_empty() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "Filename,Title,Keywords,Category,Releases\n"
        );
    }
}
