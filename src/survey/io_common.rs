// Shared pieces of the catalog readers.

use std::path::Path;

use work_survey::builder::Builder;

use crate::survey::*;

/// A catalog entry, as parsed by the readers.
/// This is before checking the mandatory fields.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ParsedItem {
    /// The line (or row) number in the source, starting at 1.
    pub lineno: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub period: Option<String>,
}

/// Where the fields are located in a tabular catalog.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CatalogColumns {
    pub title: usize,
    pub author: usize,
    pub category: Option<usize>,
    pub period: Option<usize>,
}

impl CatalogColumns {
    /// Reads one row of a tabular catalog. Blank cells are treated as missing.
    ///
    /// The category is kept as written, surrounding spaces included, so that
    /// it is counted under the same label as in the other catalog formats.
    pub fn parse_row(&self, lineno: usize, row: &[Option<String>]) -> ParsedItem {
        let raw = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| row.get(i).cloned().flatten())
                .filter(|s| !s.trim().is_empty())
        };
        let trimmed = |idx: Option<usize>| raw(idx).map(|s| s.trim().to_string());
        ParsedItem {
            lineno,
            title: trimmed(Some(self.title)),
            author: trimmed(Some(self.author)),
            category: raw(self.category),
            period: trimmed(self.period),
        }
    }
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Finds the columns of the catalog from the header row.
///
/// The names are compared without case and surrounding spaces. `school` and
/// `category` both name the category column, `years` and `period` the period.
pub fn find_columns(header: &[String], path: &str) -> SurveyResult<CatalogColumns> {
    let position = |names: &[&str]| -> Option<usize> {
        header
            .iter()
            .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
    };
    let title = position(&["title"]).context(MissingColumnSnafu {
        column: "title",
        path,
    })?;
    let author = position(&["author"]).context(MissingColumnSnafu {
        column: "author",
        path,
    })?;
    let columns = CatalogColumns {
        title,
        author,
        category: position(&["school", "category"]),
        period: position(&["years", "period"]),
    };
    debug!("find_columns: {:?} -> {:?}", header, columns);
    if columns.category.is_none() {
        warn!(
            "find_columns: {}: no category column, all the works will be counted as {}",
            path, UNKNOWN_CATEGORY
        );
    }
    Ok(columns)
}

/// Turns the parsed entries into catalog items, numbered in reading order.
///
/// Every entry needs a title and an author.
pub fn validate_items(parsed: &[ParsedItem]) -> SurveyResult<Vec<Item>> {
    let mut builder = Builder::new(&SurveyRules::DEFAULT_RULES).context(InvalidSurveySnafu {})?;
    for pi in parsed.iter() {
        let title = pi.title.as_deref().context(MissingFieldSnafu {
            field: "title",
            lineno: pi.lineno,
        })?;
        let author = pi.author.as_deref().context(MissingFieldSnafu {
            field: "author",
            lineno: pi.lineno,
        })?;
        builder.add_item(title, author, pi.category.as_deref(), pi.period.as_deref());
    }
    info!("Read {} works", builder.len());
    Ok(builder.items())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn columns_in_any_order() {
        let cols = find_columns(&header(&["Years", " Author", "TITLE", "School"]), "x.csv").unwrap();
        assert_eq!(
            cols,
            CatalogColumns {
                title: 2,
                author: 1,
                category: Some(3),
                period: Some(0)
            }
        );
        let cols = find_columns(&header(&["title", "author", "category"]), "x.csv").unwrap();
        assert_eq!(cols.category, Some(2));
        assert_eq!(cols.period, None);
    }

    #[test]
    fn missing_title_column() {
        let res = find_columns(&header(&["author", "school"]), "x.csv");
        assert!(matches!(res, Err(SurveyError::MissingColumn { .. })));
    }

    #[test]
    fn rows_with_short_or_empty_cells() {
        let cols = find_columns(&header(&["title", "author", "school", "years"]), "x").unwrap();
        let row = vec![Some("Ethics".to_string()), Some("Spinoza".to_string()), Some("".to_string())];
        let pi = cols.parse_row(4, &row);
        assert_eq!(
            pi,
            ParsedItem {
                lineno: 4,
                title: Some("Ethics".to_string()),
                author: Some("Spinoza".to_string()),
                category: None,
                period: None,
            }
        );
    }

    #[test]
    fn category_is_kept_as_written() {
        let cols = find_columns(&header(&["title", "author", "school"]), "x").unwrap();
        let row = vec![
            Some(" Ethics ".to_string()),
            Some("Spinoza".to_string()),
            Some("Rationalism ".to_string()),
        ];
        let pi = cols.parse_row(2, &row);
        assert_eq!(pi.title.as_deref(), Some("Ethics"));
        assert_eq!(pi.category.as_deref(), Some("Rationalism "));

        let blank = vec![Some("Ethics".to_string()), Some("Spinoza".to_string()), Some("  ".to_string())];
        assert_eq!(cols.parse_row(3, &blank).category, None);
    }

    #[test]
    fn items_need_title_and_author() {
        let good = ParsedItem {
            lineno: 2,
            title: Some("Ethics".to_string()),
            author: Some("Spinoza".to_string()),
            category: Some("Rationalism".to_string()),
            period: None,
        };
        let bad = ParsedItem {
            lineno: 3,
            author: None,
            ..good.clone()
        };
        let items = validate_items(&[good.clone(), good.clone()]).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].index, 1);
        assert_eq!(items[0].category_label(), "Rationalism");

        match validate_items(&[good, bad]) {
            Err(SurveyError::MissingField { field, lineno }) => {
                assert_eq!(field, "author");
                assert_eq!(lineno, 3);
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/a/b/works.json"), "works.json");
        assert_eq!(simplify_file_name("works.csv"), "works.csv");
    }
}
