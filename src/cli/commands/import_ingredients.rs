//! Import ingredients command handler

use anyhow::{Context, bail};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::cli::ImportFormat;
use crate::config::Config;
use crate::db::Store;

#[derive(Debug, Deserialize)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

/// Parses `name,measurement_unit` CSV rows (no header) or a JSON array of
/// `{"name", "measurement_unit"}` objects. Blank names are skipped.
pub fn parse_ingredients(content: &str, format: ImportFormat) -> anyhow::Result<Vec<(String, String)>> {
    let records: Vec<IngredientRecord> = match format {
        ImportFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .trim(csv::Trim::All)
                .from_reader(content.as_bytes());

            reader
                .deserialize()
                .enumerate()
                .map(|(i, row)| row.with_context(|| format!("Invalid CSV row {}", i + 1)))
                .collect::<anyhow::Result<_>>()?
        }
        ImportFormat::Json => {
            serde_json::from_str(content).context("Invalid ingredients JSON")?
        }
    };

    Ok(records
        .into_iter()
        .map(|r| (r.name.trim().to_string(), r.measurement_unit.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect())
}

fn detect_format(path: &Path) -> ImportFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => ImportFormat::Json,
        _ => ImportFormat::Csv,
    }
}

pub async fn cmd_import_ingredients(
    config: &Config,
    path: &Path,
    format: Option<ImportFormat>,
) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("File {} does not exist", path.display());
    }

    let format = format.unwrap_or_else(|| detect_format(path));
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let rows = parse_ingredients(&content, format)?;
    let total = rows.len();

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    let inserted = store.import_ingredients(rows).await?;

    info!(total, inserted, path = %path.display(), "Ingredients imported");
    println!(
        "✓ Imported {inserted} new ingredients out of {total} rows from {}",
        path.display()
    );

    Ok(())
}
