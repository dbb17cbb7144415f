use clap::Parser;

/// This is a survey program: rate a catalog of works, batch after batch, and see which
/// categories you liked.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the survey configuration in JSON format.
    /// For more information about the file format, read the documentation of the manual module.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the summary of a survey in JSON format. If provided,
    /// worksurvey will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the survey will be written in JSON
    /// format to the given location. Setting this option overrides the output directory that may be
    /// specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) The catalog of works to rate. Setting this option overrides what may be specified
    /// with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default json) The type of the catalog: json, csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default 5) The number of works shown in each batch.
    #[clap(short, long, value_parser)]
    pub batch_size: Option<usize>,

    /// (file path, optional) Reads the commands from this file instead of the standard input.
    #[clap(long, value_parser)]
    pub commands: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
