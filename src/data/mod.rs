
use std::path::Path;

use tracing::{debug, info, warn};

use crate::{RagError, Result};

/// One complaint row from the input CSV. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintRecord {
    pub complaint_id: String,
    pub narrative: String,
    pub product: Option<String>,
    pub market: Option<String>,
    pub date: Option<String>,
    pub channel: Option<String>,
    pub severity: Option<String>,
}

const ID_COLUMN: &str = "Complaint ID";
const PRODUCT_COLUMN: &str = "Product";
const MARKET_COLUMN: &str = "Market";
const DATE_COLUMN: &str = "Date";
const CHANNEL_COLUMN: &str = "Channel";
const SEVERITY_COLUMN: &str = "Severity";

/// Load complaint records from a CSV file.
///
/// The narrative column is required; all other columns are optional. Rows
/// with an empty narrative are skipped. Rows without an id column fall back
/// to their row number.
#[inline]
pub fn load_complaints(path: &Path, narrative_column: &str) -> Result<Vec<ComplaintRecord>> {
    info!("Loading complaints from {}", path.display());

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| {
            RagError::DataLoading(format!("Failed to open {}: {}", path.display(), e))
        })?;

    let headers = reader
        .headers()
        .map_err(|e| RagError::DataLoading(format!("Failed to read CSV headers: {}", e)))?
        .clone();

    let find = |name: &str| headers.iter().position(|h| h == name);

    let narrative_idx = find(narrative_column).ok_or_else(|| {
        RagError::DataLoading(format!(
            "Required column '{}' not found in {}",
            narrative_column,
            path.display()
        ))
    })?;

    let id_idx = find(ID_COLUMN);
    let product_idx = find(PRODUCT_COLUMN);
    let market_idx = find(MARKET_COLUMN);
    let date_idx = find(DATE_COLUMN);
    let channel_idx = find(CHANNEL_COLUMN);
    let severity_idx = find(SEVERITY_COLUMN);

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (row_number, row) in reader.records().enumerate() {
        let row = row.map_err(|e| {
            RagError::DataLoading(format!("Malformed CSV row {}: {}", row_number + 1, e))
        })?;

        let narrative = clean_text(row.get(narrative_idx).unwrap_or_default());
        if narrative.is_empty() {
            skipped += 1;
            continue;
        }

        let field = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let complaint_id =
            field(id_idx).unwrap_or_else(|| row_number.to_string());

        records.push(ComplaintRecord {
            complaint_id,
            narrative,
            product: field(product_idx),
            market: field(market_idx),
            date: field(date_idx),
            channel: field(channel_idx),
            severity: field(severity_idx),
        });
    }

    if skipped > 0 {
        warn!("Skipped {} rows with an empty narrative", skipped);
    }

    if records.is_empty() {
        return Err(RagError::DataLoading(format!(
            "No usable complaint rows found in {}",
            path.display()
        )));
    }

    debug!("Loaded {} complaint records", records.len());
    Ok(records)
}

/// Basic narrative cleaning: trim and collapse newlines into spaces.
#[inline]
pub fn clean_text(text: &str) -> String {
    text.trim().replace(['\n', '\r'], " ")
}
