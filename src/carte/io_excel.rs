use std::io::Cursor;

use calamine::{DataType, Range, Reader, Xlsx};
use log::debug;
use serde_json::{Number, Value as JSValue};
use snafu::prelude::*;

use circo_results::Row;

use crate::carte::io_common::simplify_file_name;
use crate::carte::*;

fn cell_value(cell: &DataType) -> Option<JSValue> {
    match cell {
        DataType::Int(i) => Some(JSValue::from(*i)),
        DataType::Float(f) => Number::from_f64(*f).map(JSValue::Number),
        DataType::String(s) if !s.trim().is_empty() => Some(JSValue::String(s.clone())),
        DataType::Bool(b) => Some(JSValue::Bool(*b)),
        // Dates are kept as their serial value.
        DataType::DateTime(f) => Number::from_f64(*f).map(JSValue::Number),
        _ => None,
    }
}

fn cell_header(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.trim().to_string(),
        DataType::Empty => "".to_string(),
        x => x.to_string(),
    }
}

/// The first row is the header. Empty cells are left out of the rows.
pub fn rows_from_range(wrange: &Range<DataType>) -> CarteResult<Vec<Row>> {
    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptyExcelSnafu {})?
        .iter()
        .map(cell_header)
        .collect();
    debug!("rows_from_range: header: {:?}", header);

    let mut res: Vec<Row> = Vec::new();
    for row in iter {
        let r: Row = header
            .iter()
            .zip(row.iter())
            .filter(|(h, _)| !h.is_empty())
            .filter_map(|(h, cell)| cell_value(cell).map(|v| (h.clone(), v)))
            .collect();
        if !r.is_empty() {
            res.push(r);
        }
    }
    Ok(res)
}

pub async fn read_excel_rows(path: &str, worksheet: Option<&str>) -> CarteResult<Vec<Row>> {
    let bytes = tokio::fs::read(path)
        .await
        .context(OpeningFileSnafu { path })?;
    let mut workbook: Xlsx<Cursor<Vec<u8>>> =
        Xlsx::new(Cursor::new(bytes)).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?,
    };
    let rows = rows_from_range(&wrange)?;
    debug!(
        "read_excel_rows: {}: {} rows",
        simplify_file_name(path),
        rows.len()
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rows_from_cells() {
        let mut range: Range<DataType> = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), DataType::String("CodeCirconscription".to_string()));
        range.set_value((0, 1), DataType::String("Nuance".to_string()));
        range.set_value((0, 2), DataType::String("Voix".to_string()));
        range.set_value((1, 0), DataType::String("7512".to_string()));
        range.set_value((1, 1), DataType::String("ENS".to_string()));
        range.set_value((1, 2), DataType::Float(1234.0));
        range.set_value((2, 0), DataType::String("7512".to_string()));
        range.set_value((2, 2), DataType::Int(99));

        let rows = rows_from_range(&range).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Voix"], json!(1234.0));
        assert!(!rows[1].contains_key("Nuance"));
        assert_eq!(rows[1]["Voix"], json!(99));
    }

    #[tokio::test]
    async fn missing_workbook() {
        let res = read_excel_rows("does/not/exist.xlsx", None).await;
        assert!(matches!(res, Err(CarteError::OpeningFile { .. })));
    }

    #[test]
    fn empty_range() {
        let range: Range<DataType> = Range::empty();
        assert!(matches!(
            rows_from_range(&range),
            Err(CarteError::EmptyExcel {})
        ));
    }
}
