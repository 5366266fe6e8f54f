// Primitives for reading CSV files of results.

use std::io::Read;

use log::debug;
use serde_json::Value as JSValue;
use snafu::prelude::*;

use circo_results::Row;

use crate::carte::io_common::simplify_file_name;
use crate::carte::*;

const BOM: char = '\u{feff}';

/// The French exports use `;`. Falls back to `,` when the header has more of those.
fn sniff_delimiter(contents: &str) -> u8 {
    let header = contents.lines().next().unwrap_or("");
    let semis = header.matches(';').count();
    let commas = header.matches(',').count();
    if commas > semis {
        b','
    } else {
        b';'
    }
}

/// Reads rows from CSV text with a header row. Empty cells are left out of the rows.
pub fn rows_from_reader<R: Read>(rdr: R, delimiter: u8) -> CarteResult<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(rdr);
    let headers: Vec<String> = reader
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|h| h.trim().trim_start_matches(BOM).to_string())
        .collect();
    debug!("rows_from_reader: headers: {:?}", headers);

    let mut res: Vec<Row> = Vec::new();
    for (idx, line_r) in reader.records().enumerate() {
        // The header is on line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let row: Row = headers
            .iter()
            .zip(line.iter())
            .filter(|(_, cell)| !cell.trim().is_empty())
            .map(|(h, cell)| (h.clone(), JSValue::String(cell.to_string())))
            .collect();
        if !row.is_empty() {
            res.push(row);
        }
    }
    Ok(res)
}

pub fn rows_from_str(contents: &str, delimiter: Option<u8>) -> CarteResult<Vec<Row>> {
    let contents = contents.trim_start_matches(BOM);
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(contents));
    rows_from_reader(contents.as_bytes(), delimiter)
}

pub async fn read_csv_rows(path: &str, delimiter: Option<u8>) -> CarteResult<Vec<Row>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .context(OpeningFileSnafu { path })?;
    let rows = rows_from_str(&contents, delimiter)?;
    debug!(
        "read_csv_rows: {}: {} rows",
        simplify_file_name(path),
        rows.len()
    );
    Ok(rows)
}
