use clap::Parser;

/// This program resolves survey report documents into views ready for rendering.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The report document, in JSON.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (navigation key, optional) The section, subsection or dynamic entry to resolve, for example
    /// 'executive', 'executive-summary' or 'responses-42'. Defaults to the first section of the document.
    #[clap(short, long, value_parser)]
    pub section: Option<String>,

    /// (file path, optional) The render settings (maximum nesting depth, style variants) in JSON format.
    /// For more information about the file format, read the manual of the report_schema crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, 'stdout' or empty) Where the resolved view is written. Defaults to the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected output. If provided, reportview will
    /// check that the produced output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, prints the navigation tree of the document instead of a view.
    #[clap(long, takes_value = false)]
    pub nav: bool,

    /// If passed as an argument, prints a text outline of the view instead of JSON.
    #[clap(long, takes_value = false)]
    pub outline: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
