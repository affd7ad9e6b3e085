//! Input CSV reading: company name in column 1, revenue in column 2.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;

/// One input company. Revenue is passed through verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRow {
    pub company_name: String,
    pub revenue: String,
}

pub fn read_companies(path: &Path, delimiter: u8) -> Result<Vec<InputRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Input file not found: {}", path.display()))?;
    read_from(file, delimiter)
}

/// Reads rows, treating the first row as a header unless its second column
/// is numeric. Rows with fewer than two columns or an empty name are skipped.
fn read_from<R: Read>(reader: R, delimiter: u8) -> Result<Vec<InputRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut records = rdr.records();
    let first = match records.next() {
        Some(record) => record?,
        None => bail!("CSV file appears to be empty"),
    };
    if first.len() < 2 {
        bail!("CSV file must have at least 2 columns (company name and revenue)");
    }

    let has_header = !looks_numeric(&first[1]);
    tracing::info!(
        "Detected {}; using column 1 as company name, column 2 as revenue",
        if has_header { "header row" } else { "no header row" }
    );

    let mut rows = Vec::new();
    if !has_header {
        push_row(&mut rows, &first, 1);
    }
    for (offset, record) in records.enumerate() {
        let record = record?;
        push_row(&mut rows, &record, offset + 2);
    }

    tracing::info!("Loaded {} companies", rows.len());
    Ok(rows)
}

fn push_row(rows: &mut Vec<InputRow>, record: &csv::StringRecord, line: usize) {
    if record.len() < 2 {
        tracing::warn!("Row {} has fewer than 2 columns, skipping", line);
        return;
    }
    let company_name = record[0].trim_start_matches('\u{feff}').trim();
    if company_name.is_empty() {
        tracing::warn!("Empty company name in row {}, skipping", line);
        return;
    }
    rows.push(InputRow {
        company_name: company_name.to_string(),
        revenue: record[1].trim().to_string(),
    });
}

/// `"1,234.50"`, `"-12"` and `"750000000000"` are numeric; `"revenue"` and
/// `""` are not.
pub(crate) fn looks_numeric(value: &str) -> bool {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, ',' | '"' | '.' | '-') && !c.is_whitespace())
        .collect();
    !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Result<Vec<InputRow>> {
        read_from(text.as_bytes(), b',')
    }

    #[test]
    fn test_header_detected() {
        let rows = read("company_name,revenue\nEquinor ASA,750000000000\nH&M,2300000000\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].company_name, "Equinor ASA");
        assert_eq!(rows[0].revenue, "750000000000");
    }

    #[test]
    fn test_no_header_keeps_first_row() {
        let rows = read("Equinor ASA,750000000000\nRema 1000,95000000000\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].company_name, "Equinor ASA");
    }

    #[test]
    fn test_skips_short_and_empty_rows() {
        let rows = read("name,revenue\nOnly One Column\n  ,100\nApotek 1,8900000000,extra\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].company_name, "Apotek 1");
    }

    #[test]
    fn test_semicolon_delimiter() {
        let rows = read_from("Elkjøp;15600000000\n".as_bytes(), b';').unwrap();
        assert_eq!(rows[0].company_name, "Elkjøp");
    }

    #[test]
    fn test_empty_file_rejected() {
        assert!(read("").is_err());
    }

    #[test]
    fn test_single_column_file_rejected() {
        assert!(read("Equinor ASA\nRema 1000\n").is_err());
    }

    #[test]
    fn test_looks_numeric() {
        assert!(looks_numeric("750000000000"));
        assert!(looks_numeric("1,234.50"));
        assert!(looks_numeric("-12"));
        assert!(!looks_numeric("revenue"));
        assert!(!looks_numeric(""));
    }
}
