use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::investment::Investment;

/// Version written into the export envelope.
pub const EXPORT_VERSION: &str = "1.0";

/// CSV header row, in the column order of [`export_csv`].
pub const CSV_HEADERS: [&str; 7] = [
    "Tarih",
    "Kategori",
    "Fon Adı",
    "Tutar (TRY)",
    "Birim Fiyat",
    "Para Birimi",
    "Notlar",
];

/// JSON backup file layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub investments: Vec<Investment>,
}

/// Serialize records into a pretty-printed JSON backup.
pub fn export_json(investments: &[Investment], exported_at: DateTime<Utc>) -> Result<String, CoreError> {
    let envelope = ExportEnvelope {
        version: EXPORT_VERSION.to_string(),
        export_date: exported_at,
        investments: investments.to_vec(),
    };
    serde_json::to_string_pretty(&envelope)
        .map_err(|e| CoreError::Serialization(format!("Failed to export investments: {e}")))
}

/// Parse a JSON backup.
///
/// Accepts the current envelope or a bare array of records (the format used
/// before the envelope existed). Records are returned exactly as stored;
/// migration is left to the caller.
pub fn import_json(json: &str) -> Result<Vec<Investment>, CoreError> {
    let data: Value = serde_json::from_str(json)
        .map_err(|e| CoreError::InvalidImport(format!("Not a valid JSON file: {e}")))?;

    let records = match data {
        Value::Array(_) => data,
        Value::Object(mut envelope) => match envelope.remove("investments") {
            Some(records @ Value::Array(_)) => records,
            _ => {
                return Err(CoreError::InvalidImport(
                    "Expected an \"investments\" array".into(),
                ))
            }
        },
        _ => {
            return Err(CoreError::InvalidImport(
                "Expected an export envelope or an array of investments".into(),
            ))
        }
    };

    serde_json::from_value(records)
        .map_err(|e| CoreError::InvalidImport(format!("Malformed investment record: {e}")))
}

/// Flatten records into CSV for spreadsheets.
///
/// The header row is plain; every data cell is quoted. A missing currency
/// is written as `TRY`, missing price and notes as empty cells.
pub fn export_csv(investments: &[Investment]) -> Result<String, CoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for inv in investments {
        writer.write_record([
            inv.date.format("%Y-%m-%d").to_string(),
            inv.investment_type.as_str().to_string(),
            inv.fund_name.clone(),
            inv.amount.to_string(),
            inv.price.map(|p| p.to_string()).unwrap_or_default(),
            inv.currency_or_default().to_string(),
            inv.notes.clone().unwrap_or_default(),
        ])?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| CoreError::Csv(format!("Failed to flush CSV: {e}")))?;
    let body = String::from_utf8(body)
        .map_err(|e| CoreError::Csv(format!("CSV output is not UTF-8: {e}")))?;

    let mut csv = CSV_HEADERS.join(",");
    if !body.is_empty() {
        csv.push('\n');
        csv.push_str(body.trim_end_matches('\n'));
    }
    Ok(csv)
}
