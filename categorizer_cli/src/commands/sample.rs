//! The `sample` subcommand: write a small input file to try the tool on.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

#[derive(Args)]
pub struct SampleArgs {
    /// Output CSV file path
    #[arg(long, short = 'o', default_value = "input/sample_companies.csv")]
    pub output: PathBuf,
}

#[derive(Serialize)]
struct SampleRow {
    company_name: &'static str,
    revenue: &'static str,
}

const SAMPLE: &[(&str, &str)] = &[
    ("Equinor ASA", "750000000000"),
    ("DNB Bank", "45000000000"),
    ("Telenor Norge AS", "12500000000"),
    ("Rema 1000", "95000000000"),
    ("IKEA", "4500000000"),
    ("H&M", "2300000000"),
    ("Apotek 1", "8900000000"),
    ("Elkjøp", "15600000000"),
    ("Oslo Kommune", "85000000000"),
    ("Lego", "1200000000"),
];

fn write_sample<W: std::io::Write>(writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for &(company_name, revenue) in SAMPLE {
        wtr.serialize(SampleRow {
            company_name,
            revenue,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run(args: &SampleArgs) -> Result<()> {
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = std::fs::File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    write_sample(file)?;
    eprintln!("Sample CSV written: {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_has_header_and_ten_rows() {
        let mut buf = Vec::new();
        write_sample(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "company_name,revenue");
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[1], "Equinor ASA,750000000000");
    }

    #[test]
    fn test_sample_written_to_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("sample.csv");
        run(&SampleArgs {
            output: output.clone(),
        })
        .unwrap();
        let rows = crate::input::read_companies(&output, b',').unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[5].company_name, "H&M");
    }
}
