// Reads catalogs stored as a JSON array of objects.

use serde::Deserialize;
use serde_json::Value as JSValue;

use crate::survey::{io_common::ParsedItem, *};

#[derive(Debug, Clone, Deserialize)]
struct JsonWork {
    title: Option<String>,
    author: Option<String>,
    #[serde(alias = "category")]
    school: Option<JSValue>,
    #[serde(alias = "period")]
    years: Option<JSValue>,
}

pub fn read_json_catalog(path: &str) -> SurveyResult<Vec<ParsedItem>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    parse_json_catalog(&contents, path)
}

pub fn parse_json_catalog(contents: &str, path: &str) -> SurveyResult<Vec<ParsedItem>> {
    let works: Vec<JsonWork> = serde_json::from_str(contents).context(ParsingJsonSnafu { path })?;
    debug!("parse_json_catalog: {} entries in {:?}", works.len(), path);
    let mut res: Vec<ParsedItem> = Vec::new();
    for (idx, w) in works.into_iter().enumerate() {
        let period = match w.years {
            None | Some(JSValue::Null) => None,
            Some(JSValue::String(s)) => Some(s),
            Some(JSValue::Number(n)) => Some(n.to_string()),
            Some(x) => {
                whatever!("Entry {} of {}: cannot read the years {:?}", idx + 1, path, x)
            }
        };
        // Anything but a string is counted with the works without a category.
        let category = match w.school {
            None | Some(JSValue::Null) => None,
            Some(JSValue::String(s)) => Some(s),
            Some(x) => {
                warn!(
                    "Entry {} of {}: the school {} is not a string, counting it as {}",
                    idx + 1,
                    path,
                    x,
                    UNKNOWN_CATEGORY
                );
                None
            }
        };
        res.push(ParsedItem {
            lineno: idx + 1,
            title: w.title,
            author: w.author,
            category,
            period,
        });
    }
    Ok(res)
}
