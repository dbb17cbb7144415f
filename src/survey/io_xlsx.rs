// Reads catalogs stored in an Excel worksheet.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::survey::{
    io_common::{find_columns, ParsedItem},
    *,
};

pub fn read_excel_catalog(path: &str, worksheet_name: Option<&str>) -> SurveyResult<Vec<ParsedItem>> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header_cells = iter.next().context(EmptyExcelSnafu { path })?;
    let mut header: Vec<String> = Vec::new();
    for cell in header_cells.iter() {
        header.push(read_cell(cell, 1)?.unwrap_or_default());
    }
    let columns = find_columns(&header, path)?;

    let mut res: Vec<ParsedItem> = Vec::new();
    for (idx, row) in iter.enumerate() {
        let lineno = idx + 2;
        debug!("read_excel_catalog: lineno: {:?} row: {:?}", lineno, row);
        let mut cells: Vec<Option<String>> = Vec::new();
        for cell in row.iter() {
            cells.push(read_cell(cell, lineno)?);
        }
        if cells.iter().all(|c| c.is_none()) {
            continue;
        }
        res.push(columns.parse_row(lineno, &cells));
    }
    Ok(res)
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> SurveyResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_catalog: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    let wrange = if let Some(name) = worksheet_name {
        workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name })?
            .context(OpeningExcelSnafu { path })?
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?
    };
    Ok(wrange)
}

/// The text content of a cell. Numbers are written without a fractional part when
/// they have none (years are often stored as numbers).
fn read_cell(cell: &DataType, lineno: usize) -> SurveyResult<Option<String>> {
    match cell {
        DataType::Empty => Ok(None),
        DataType::String(s) if s.trim().is_empty() => Ok(None),
        DataType::String(s) => Ok(Some(s.to_string())),
        DataType::Int(i) => Ok(Some(i.to_string())),
        DataType::Float(f) if f.fract() == 0.0 => Ok(Some(format!("{}", *f as i64))),
        DataType::Float(f) => Ok(Some(f.to_string())),
        DataType::Bool(b) => Ok(Some(b.to_string())),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_to_text() {
        assert_eq!(read_cell(&DataType::Empty, 1).unwrap(), None);
        assert_eq!(read_cell(&DataType::String("  ".to_string()), 1).unwrap(), None);
        assert_eq!(
            read_cell(&DataType::String(" Stoicism ".to_string()), 1).unwrap(),
            Some(" Stoicism ".to_string())
        );
        assert_eq!(
            read_cell(&DataType::Float(1677.0), 1).unwrap(),
            Some("1677".to_string())
        );
        assert_eq!(
            read_cell(&DataType::Float(2.5), 1).unwrap(),
            Some("2.5".to_string())
        );
        assert_eq!(read_cell(&DataType::Int(-350), 1).unwrap(), Some("-350".to_string()));
        assert!(matches!(
            read_cell(&DataType::DateTime(44000.0), 7),
            Err(SurveyError::ExcelWrongCellType { lineno: 7, .. })
        ));
    }

    #[test]
    fn reads_fixture() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/philosophy_works.xlsx");
        let parsed = read_excel_catalog(path, None).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0].title.as_deref(), Some("Meditations"));
        assert_eq!(parsed[1].period.as_deref(), Some("1677"));
        assert_eq!(parsed[3].category, None);

        let named = read_excel_catalog(path, Some("Works")).unwrap();
        assert_eq!(named, parsed);
        assert!(matches!(
            read_excel_catalog(path, Some("Nope")),
            Err(SurveyError::MissingWorksheet { .. })
        ));
    }
}
