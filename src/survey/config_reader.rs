use crate::survey::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

pub const DEFAULT_CHART_TITLE: &str = "Number of Works Rated Positively by School of Philosophy";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "surveyName")]
    pub survey_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "chartTitle")]
    pub chart_title: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSourceSettings {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RulesSettings {
    #[serde(rename = "batchSize")]
    _batch_size: Option<JSValue>,
}

impl RulesSettings {
    pub fn batch_size(&self) -> SurveyResult<Option<usize>> {
        match &self._batch_size {
            None => Ok(None),
            x => read_js_int(x).map(Some),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "catalogSource")]
    pub catalog_source: CatalogSourceSettings,
    pub rules: Option<RulesSettings>,
}

pub fn read_config(path: &str) -> SurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> SurveyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

// Numbers are accepted both as JSON numbers and as strings.
fn read_js_int(x: &Option<JSValue>) -> SurveyResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {
                content: n.to_string(),
            }),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(ParsingJsonNumberSnafu { content: s.clone() }),
        other => None.context(ParsingJsonNumberSnafu {
            content: format!("{:?}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_as_number_or_string() {
        let js = r#"{
            "outputSettings": {"surveyName": "test"},
            "catalogSource": {"filePath": "works.json"},
            "rules": {"batchSize": "3"}
        }"#;
        let config: SurveyConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.rules.unwrap().batch_size().unwrap(), Some(3));
        assert_eq!(config.catalog_source.provider, None);

        let js = r#"{
            "outputSettings": {"surveyName": "test", "chartTitle": "Likes"},
            "catalogSource": {"provider": "csv", "filePath": "works.csv"},
            "rules": {"batchSize": 4}
        }"#;
        let config: SurveyConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.rules.unwrap().batch_size().unwrap(), Some(4));
        assert_eq!(config.output_settings.chart_title.as_deref(), Some("Likes"));
    }

    #[test]
    fn bad_batch_size() {
        let rules: RulesSettings = serde_json::from_str(r#"{"batchSize": "five"}"#).unwrap();
        assert!(rules.batch_size().is_err());
        let rules: RulesSettings = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(rules.batch_size().unwrap(), None);
    }
}
