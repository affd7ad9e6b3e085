//! The `categories` subcommand: print the loaded category table.

use std::path::PathBuf;

use anyhow::Result;
use categorizer_lib::CategoryMap;
use clap::Args;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Args)]
pub struct CategoriesArgs {
    /// Category table YAML replacing the built-in one
    #[arg(long)]
    pub categories: Option<PathBuf>,
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Category")]
    name: String,
    #[tabled(rename = "Default Subsegment")]
    default_subsegment: String,
    #[tabled(rename = "Subsegments")]
    subsegments: String,
    #[tabled(rename = "Keywords")]
    keywords: usize,
}

fn build_rows(map: &CategoryMap) -> Vec<CategoryRow> {
    map.categories()
        .iter()
        .map(|c| CategoryRow {
            id: c.id,
            name: c.name.clone(),
            default_subsegment: c.default_subsegment.clone(),
            subsegments: c
                .subsegments
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            keywords: c.keywords.len(),
        })
        .collect()
}

pub fn run(args: &CategoriesArgs) -> Result<()> {
    let map = match &args.categories {
        Some(path) => CategoryMap::from_path(path)?,
        None => CategoryMap::load_default()?,
    };
    let mut table = Table::new(build_rows(&map));
    table.with(Style::rounded());
    println!("{}", table);
    Ok(())
}
