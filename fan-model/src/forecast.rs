use crate::error::ModelError;
use crate::severity::AlertLevel;
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Columns of a forecast CSV after positional normalization.
pub const CSV_ROW_LENGTH: usize = 7;

/// A timestamped scalar reading from the forecast model.
///
/// `thresholds` is the ascending 4-tuple of severity bounds
/// (GREEN, YELLOW, ORANGE, RED) in effect for this reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub date: NaiveDateTime,
    pub mean: f64,
    pub corrected: f64,
    pub thresholds: [f64; 4],
}

impl ForecastEntry {
    /// Severity tier of the bias-corrected reading.
    pub fn alert_level(&self) -> AlertLevel {
        AlertLevel::classify(self.corrected, &self.thresholds)
    }

    /// Parse one forecast source's CSV text into an ordered series.
    ///
    /// Whatever the source's header says, columns are interpreted
    /// positionally as `date, mean, corrected, th1, th2, th3, th4`.
    /// Blank numeric cells are zeroed before parsing (a blank is "no
    /// discharge", not "no data"). The caller maps the source to its
    /// location identifier.
    pub fn parse_csv(text: &str) -> Result<Vec<ForecastEntry>, ModelError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut entries = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let row = idx + 1;
            let record = result.map_err(|e| ModelError::Record {
                row,
                reason: e.to_string(),
            })?;
            if record.len() < CSV_ROW_LENGTH {
                return Err(ModelError::Record {
                    row,
                    reason: format!(
                        "expected {CSV_ROW_LENGTH} columns, found {}",
                        record.len()
                    ),
                });
            }

            let date = parse_timestamp(record.get(0).unwrap_or_default())
                .ok_or_else(|| ModelError::Record {
                    row,
                    reason: format!("invalid timestamp {:?}", record.get(0).unwrap_or_default()),
                })?;
            let numeric = |col: usize| {
                parse_numeric(record.get(col).unwrap_or_default()).ok_or_else(|| {
                    ModelError::Record {
                        row,
                        reason: format!(
                            "invalid numeric value {:?}",
                            record.get(col).unwrap_or_default()
                        ),
                    }
                })
            };

            entries.push(ForecastEntry {
                date,
                mean: numeric(1)?,
                corrected: numeric(2)?,
                thresholds: [numeric(3)?, numeric(4)?, numeric(5)?, numeric(6)?],
            });
        }
        Ok(entries)
    }
}

/// Parse an ISO-8601 timestamp, accepting a date-only form at midnight.
fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::from_str(cell) {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(cell, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::from_str(cell)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a numeric cell, treating blank as zero.
fn parse_numeric(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return Some(0.0);
    }
    cell.parse::<f64>().ok()
}
