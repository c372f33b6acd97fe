use crate::error::EngineError;
use csv::{ReaderBuilder, StringRecord};
use shared::{Bar, DataIntegrityError};
use std::io::Read;
use std::path::Path;

// Field-level parsing for daily bar exports (ISO dates, '.' as decimal point)
pub mod field_format {
    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use std::str::FromStr;

    pub fn parse_decimal(s: &str) -> Result<f64> {
        let trimmed = s.trim();
        let value = f64::from_str(trimmed).map_err(|e| anyhow!("Failed to parse decimal '{}': {}", s, e))?;
        if !value.is_finite() {
            return Err(anyhow!("Non-finite decimal '{}'", s));
        }
        Ok(value)
    }

    // Volume sometimes comes as "1234567.0"; sign is checked by the caller.
    pub fn parse_volume(s: &str) -> Result<f64> {
        parse_decimal(s).map(f64::round)
    }

    // Accepts "2024-01-31" and timestamped variants such as "2024-01-31 00:00:00".
    pub fn parse_date(s: &str) -> Result<NaiveDate> {
        let trimmed = s.trim();
        let date_part = trimmed.get(..10).unwrap_or(trimmed);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .map_err(|e| anyhow!("Failed to parse date '{}': {}", s, e))
    }

}

pub struct DailyCsvParser;

impl DailyCsvParser {
    // CSV Header: Date,Open,High,Low,Close,Volume (extra columns such as "Adj Close" are ignored)
    // Example Row: 2024-01-02,187.15,188.44,183.89,185.64,82488700
    pub fn load_bars_from_csv(file_path: &Path) -> Result<Vec<Bar>, EngineError> {
        let file = std::fs::File::open(file_path)?;
        Self::parse_bars(std::io::BufReader::new(file))
    }

    pub fn parse_bars<R: Read>(reader: R) -> Result<Vec<Bar>, EngineError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let mut bars = Vec::new();

        for (idx, result) in rdr.records().enumerate() {
            let record = result?;
            let line = idx + 2;

            let date_str = Self::required_field(&record, &headers, "Date", line)?;
            let date = field_format::parse_date(date_str)
                .map_err(|e| EngineError::CsvDataFormatError(format!("Error parsing 'Date' at line {}: {}", line, e)))?;

            let mut prices = [0.0; 4];
            for (slot, name) in prices.iter_mut().zip(["Open", "High", "Low", "Close"]) {
                let raw = Self::required_field(&record, &headers, name, line)?;
                *slot = field_format::parse_decimal(raw).map_err(|e| {
                    EngineError::CsvDataFormatError(format!("Error parsing '{}' at line {}: {}", name, line, e))
                })?;
            }
            let [open, high, low, close] = prices;

            let volume_str = Self::required_field(&record, &headers, "Volume", line)?;
            let volume = field_format::parse_volume(volume_str).map_err(|e| {
                EngineError::CsvDataFormatError(format!("Error parsing 'Volume' at line {}: {}", line, e))
            })?;
            if volume < 0.0 {
                return Err(DataIntegrityError::NegativeVolume { index: idx, value: volume }.into());
            }

            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume: volume as u64,
            });
        }
        Ok(bars)
    }

    // Looks a field up by header name, ignoring case.
    fn required_field<'a>(
        record: &'a StringRecord,
        headers: &StringRecord,
        name: &str,
        line: usize,
    ) -> Result<&'a str, EngineError> {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
            .and_then(|pos| record.get(pos))
            .ok_or_else(|| {
                EngineError::CsvDataFormatError(format!("Missing '{}' field in CSV record at line {}", name, line))
            })
    }
}
