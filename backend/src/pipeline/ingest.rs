//! Turns an uploaded delimited text file into a [`TabularDataset`].
//!
//! The first non-blank line holds the column titles. The delimiter is guessed
//! from that line (`,` `;` tab or `|`, comma on ties). Empty lines anywhere are
//! skipped, short rows are padded with empty cells and surplus cells are
//! dropped, so every row ends up with exactly the header columns. Cell text is
//! kept as uploaded; a line holding only whitespace or delimiters is data.

use crate::error::IngestError;
use common::model::datasource::{Row, TabularDataset};
use log::debug;
use serde_json::Value;
use std::collections::HashSet;

const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Delimiter occurring most often in the header line.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let mut best = ',';
    let mut best_count = header_line.matches(best).count();
    for candidate in &CANDIDATE_DELIMITERS[1..] {
        let count = header_line.matches(*candidate).count();
        if count > best_count {
            best = *candidate;
            best_count = count;
        }
    }
    best as u8
}

pub fn parse_delimited(bytes: &[u8]) -> Result<TabularDataset, IngestError> {
    let text = std::str::from_utf8(bytes).map_err(|_| IngestError::InvalidEncoding)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let text = text.trim_start_matches(['\r', '\n']);

    let header_line = text.lines().next().filter(|l| !l.trim().is_empty());
    let header_line = header_line.ok_or(IngestError::Empty)?;
    let delimiter = detect_delimiter(header_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut seen = HashSet::new();
    for (idx, header) in headers.iter().enumerate() {
        if header.trim().is_empty() {
            return Err(IngestError::EmptyHeader(idx + 1));
        }
        if !seen.insert(header.as_str()) {
            return Err(IngestError::DuplicateHeader(header.clone()));
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        let cells: Vec<String> = record.iter().map(str::to_string).collect();

        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let value = cells.get(idx).cloned().unwrap_or_default();
                (header.clone(), Value::String(value))
            })
            .collect();
        rows.push(row);
    }

    debug!(
        "Parsed delimited upload: {} columns, {} rows, delimiter {:?}",
        headers.len(),
        rows.len(),
        delimiter as char
    );

    Ok(TabularDataset::new(headers, rows))
}
