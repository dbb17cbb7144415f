use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use work_survey::*;

use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::survey::chart::TextChart;
use crate::survey::config_reader::*;
use crate::survey::io_common::simplify_file_name;

pub mod chart;
pub mod config_reader;
pub mod console;
mod io_common;
mod io_csv;
mod io_json;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Could not read a number out of {content}"))]
    ParsingJsonNumber { content: String },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file {path} has no data"))]
    EmptyExcel { path: String },
    #[snafu(display("No worksheet named {name}"))]
    MissingWorksheet { name: String },
    #[snafu(display("Could not understand the cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("The catalog {path} has no '{column}' column"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("The work on line {lineno} has no {field}"))]
    MissingField { field: String, lineno: usize },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error writing the summary to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error talking to the console"))]
    Console { source: std::io::Error },
    #[snafu(display("{source}"))]
    InvalidSurvey { source: SurveyErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// A catalog stored in a file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CatalogFile {
    pub provider: String,
    pub path: String,
    pub excel_worksheet_name: Option<String>,
}

impl CatalogSource for CatalogFile {
    type Error = SurveyError;

    fn load_catalog(&self) -> SurveyResult<Vec<Item>> {
        info!("Attempting to read catalog {:?}", self.path);
        let parsed = match self.provider.as_str() {
            "json" => io_json::read_json_catalog(&self.path)?,
            "csv" => io_csv::read_csv_catalog(&self.path)?,
            "xlsx" => io_xlsx::read_excel_catalog(&self.path, self.excel_worksheet_name.as_deref())?,
            x => whatever!("Provider not implemented {:?}", x),
        };
        io_common::validate_items(&parsed)
    }
}

/// Everything needed to run a survey, once the configuration file and the
/// command line are merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RunSettings {
    pub survey_name: String,
    pub catalog: CatalogFile,
    pub rules: SurveyRules,
    pub chart_title: String,
    pub out: Option<String>,
}

fn resolve_settings(args: &Args) -> SurveyResult<RunSettings> {
    let config = match &args.config {
        Some(p) => Some((read_config(p)?, p.clone())),
        None => None,
    };

    let (survey_name, catalog_path, provider, worksheet, batch_size, chart_title, out) =
        if let Some((config, config_path)) = config {
            let root_p = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?;
            let catalog_path: PathBuf = root_p.join(&config.catalog_source.file_path);
            let out: Option<String> = config.output_settings.output_directory.clone().map(|d| {
                root_p
                    .join(d)
                    .join("survey_summary.json")
                    .display()
                    .to_string()
            });
            let batch_size = match &config.rules {
                Some(r) => r.batch_size()?,
                None => None,
            };
            (
                config.output_settings.survey_name.clone(),
                Some(catalog_path.display().to_string()),
                config.catalog_source.provider.clone(),
                config.catalog_source.excel_worksheet_name.clone(),
                batch_size,
                config.output_settings.chart_title.clone(),
                out,
            )
        } else {
            ("survey".to_string(), None, None, None, None, None, None)
        };

    let path = match args.input.clone().or(catalog_path) {
        Some(p) => p,
        None => whatever!("No catalog given: use --input or --config"),
    };
    let catalog = CatalogFile {
        provider: args
            .input_type
            .clone()
            .or(provider)
            .unwrap_or_else(|| "json".to_string()),
        path,
        excel_worksheet_name: args.excel_worksheet_name.clone().or(worksheet),
    };
    let rules = SurveyRules {
        batch_size: args
            .batch_size
            .or(batch_size)
            .unwrap_or(SurveyRules::DEFAULT_RULES.batch_size),
    };
    Ok(RunSettings {
        survey_name,
        catalog,
        rules,
        chart_title: chart_title.unwrap_or_else(|| DEFAULT_CHART_TITLE.to_string()),
        out: args.out.clone().or(out),
    })
}

fn build_summary_js(settings: &RunSettings, survey: &Survey) -> JSValue {
    let results = survey.results();
    let tallies: Vec<JSValue> = results
        .tallies
        .iter()
        .map(|(name, t)| {
            json!({
                "category": name,
                "upvotes": t.upvotes,
                "downvotes": t.downvotes,
                "total": t.total
            })
        })
        .collect();
    let rows: Vec<JSValue> = results
        .chart_rows()
        .iter()
        .map(|(name, count)| json!([name, count]))
        .collect();
    json!({
        "config": {
            "survey": settings.survey_name,
            "catalog": simplify_file_name(&settings.catalog.path),
            "catalogDigest": survey.fingerprint(),
            "batchSize": settings.rules.batch_size,
            "works": survey.items().len()
        },
        "results": tallies,
        "chart": {
            "title": settings.chart_title,
            "rows": rows
        }
    })
}

fn write_summary(out: &str, pretty_js: &str) -> SurveyResult<()> {
    if out == "stdout" {
        println!("{}", pretty_js);
        return Ok(());
    }
    if let Some(parent) = Path::new(out).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingOutputSnafu { path: out })?;
        }
    }
    fs::write(out, pretty_js).context(WritingOutputSnafu { path: out })?;
    info!("Summary written to {}", out);
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js: &str) -> SurveyResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("reference summary: {:?}", summary_ref);
    let pretty_js_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {
        path: reference_path,
    })?;
    if pretty_js_ref != pretty_js {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_ref.as_str(), pretty_js, "\n");
        whatever!("Difference detected between computed summary and reference summary")
    }
    Ok(())
}

/// Writes the summary of a finished survey and compares it with the reference, if any.
pub fn conclude(
    settings: &RunSettings,
    survey: &Survey,
    reference: Option<&str>,
) -> SurveyResult<Option<JSValue>> {
    if survey.phase() != Phase::Finished {
        info!("The survey was left before the end, no summary");
        if reference.is_some() {
            whatever!("The survey is not finished, cannot compare with the reference summary")
        }
        return Ok(None);
    }
    let result_js = build_summary_js(settings, survey);
    let pretty_js = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {
        path: "summary",
    })?;
    if let Some(out) = &settings.out {
        write_summary(out, &pretty_js)?;
    }
    if let Some(reference_path) = reference {
        check_reference(reference_path, &pretty_js)?;
    }
    Ok(Some(result_js))
}

pub fn run_survey(args: &Args) -> SurveyResult<()> {
    let settings = resolve_settings(args)?;
    info!("settings: {:?}", settings);

    let mut survey = match Session::new().load(&settings.catalog, &settings.rules) {
        Session::Active(s) => s,
        Session::Failed(msg) => whatever!("Error loading data: {}", msg),
        Session::Loading => whatever!("The catalog was not loaded"),
    };

    let chart = TextChart::default();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match &args.commands {
        Some(p) => {
            let f = fs::File::open(p).context(OpeningFileSnafu { path: p.clone() })?;
            console::run_console(
                &mut survey,
                BufReader::new(f),
                &mut out,
                &chart,
                &settings.chart_title,
            )?;
        }
        None => {
            let stdin = io::stdin();
            console::run_console(
                &mut survey,
                stdin.lock(),
                &mut out,
                &chart,
                &settings.chart_title,
            )?;
        }
    }
    drop(out);

    conclude(&settings, &survey, args.reference.as_deref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn data_path(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn args() -> Args {
        Args {
            config: None,
            reference: None,
            out: None,
            input: None,
            input_type: None,
            batch_size: None,
            commands: None,
            excel_worksheet_name: None,
            verbose: false,
        }
    }

    fn load(settings: &RunSettings) -> Survey {
        match Session::new().load(&settings.catalog, &settings.rules) {
            Session::Active(s) => s,
            x => panic!("catalog not loaded: {:?}", x),
        }
    }

    fn play(survey: &mut Survey, settings: &RunSettings, script_name: &str) {
        let script = fs::read_to_string(data_path(script_name)).unwrap();
        let mut sink: Vec<u8> = Vec::new();
        console::run_console(
            survey,
            Cursor::new(script),
            &mut sink,
            &TextChart::default(),
            &settings.chart_title,
        )
        .unwrap();
    }

    #[test]
    fn settings_from_config() {
        let a = Args {
            config: Some(data_path("survey_config.json")),
            ..args()
        };
        let settings = resolve_settings(&a).unwrap();
        assert_eq!(settings.survey_name, "Philosophy works");
        assert_eq!(settings.catalog.provider, "json");
        assert_eq!(settings.catalog.path, data_path("philosophy_works.json"));
        assert_eq!(settings.rules.batch_size, 5);
        assert_eq!(settings.chart_title, DEFAULT_CHART_TITLE);
        assert_eq!(settings.out, None);
    }

    #[test]
    fn command_line_overrides_config() {
        let a = Args {
            config: Some(data_path("survey_config.json")),
            input: Some(data_path("philosophy_works.csv")),
            input_type: Some("csv".to_string()),
            batch_size: Some(4),
            out: Some("stdout".to_string()),
            ..args()
        };
        let settings = resolve_settings(&a).unwrap();
        assert_eq!(settings.catalog.provider, "csv");
        assert_eq!(settings.catalog.path, data_path("philosophy_works.csv"));
        assert_eq!(settings.rules.batch_size, 4);
        assert_eq!(settings.out.as_deref(), Some("stdout"));
    }

    #[test]
    fn no_catalog() {
        assert!(resolve_settings(&args()).is_err());
    }

    #[test]
    fn load_failure_is_terminal() {
        let a = Args {
            input: Some(data_path("does_not_exist.json")),
            ..args()
        };
        let settings = resolve_settings(&a).unwrap();
        let session = Session::new().load(&settings.catalog, &settings.rules);
        assert_eq!(session.phase(), Phase::Error);

        let a = Args {
            input: Some(data_path("philosophy_works.json")),
            input_type: Some("yaml".to_string()),
            ..args()
        };
        let settings = resolve_settings(&a).unwrap();
        let session = Session::new().load(&settings.catalog, &settings.rules);
        assert_eq!(session.phase(), Phase::Error);
    }

    #[test]
    fn json_and_csv_catalogs_match() {
        let a = Args {
            input: Some(data_path("philosophy_works.json")),
            ..args()
        };
        let from_json = load(&resolve_settings(&a).unwrap());
        let a = Args {
            input: Some(data_path("philosophy_works.csv")),
            input_type: Some("csv".to_string()),
            ..args()
        };
        let from_csv = load(&resolve_settings(&a).unwrap());
        assert_eq!(from_json.items(), from_csv.items());
        assert_eq!(from_json.fingerprint(), from_csv.fingerprint());
    }

    #[test]
    fn full_run_matches_reference() {
        let a = Args {
            config: Some(data_path("survey_config.json")),
            ..args()
        };
        let settings = resolve_settings(&a).unwrap();
        let mut survey = load(&settings);
        play(&mut survey, &settings, "survey_commands.txt");
        assert_eq!(survey.phase(), Phase::Finished);

        let js = conclude(
            &settings,
            &survey,
            Some(data_path("survey_expected_summary.json").as_str()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(js["results"][0]["category"], "Stoicism");
        assert_eq!(js["config"]["works"], 12);
    }

    #[test]
    fn unfinished_run_has_no_summary() {
        let a = Args {
            input: Some(data_path("philosophy_works.json")),
            ..args()
        };
        let settings = resolve_settings(&a).unwrap();
        let survey = load(&settings);
        assert_eq!(conclude(&settings, &survey, None).unwrap(), None);
        assert!(conclude(
            &settings,
            &survey,
            Some(data_path("survey_expected_summary.json").as_str())
        )
        .is_err());
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let a = Args {
            config: Some(data_path("survey_config.json")),
            ..args()
        };
        let settings = resolve_settings(&a).unwrap();
        let mut survey = load(&settings);
        play(&mut survey, &settings, "survey_commands.txt");
        // Same votes, different batch size: the summary differs.
        let other = RunSettings {
            rules: SurveyRules { batch_size: 3 },
            ..settings
        };
        assert!(conclude(
            &other,
            &survey,
            Some(data_path("survey_expected_summary.json").as_str())
        )
        .is_err());
    }
}
