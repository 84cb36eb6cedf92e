use log::{debug, info, warn};

use report_schema::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::report::config_reader::*;

pub mod config_reader;
pub mod outline;

#[derive(Debug, Snafu)]
pub enum ReportError {
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
    #[snafu(display("Error serializing the output"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the output and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

fn write_output(out: Option<&str>, content: &str) -> ReportResult<()> {
    match out {
        None | Some("") | Some("stdout") => {
            println!("{}", content);
            Ok(())
        }
        Some(path) => {
            info!("Writing output to {:?}", path);
            fs::write(path, content).context(WritingFileSnafu { path })
        }
    }
}

fn pretty(js: &JSValue) -> ReportResult<String> {
    serde_json::to_string_pretty(js).context(SerializingJsonSnafu {})
}

/// JSON references are compared as values, so that neither their layout nor
/// the order of their keys matters. Anything else is compared as text.
fn check_reference(reference_path: &str, produced: &str) -> ReportResult<()> {
    let reference = read_reference(reference_path)?;
    let parsed = (
        serde_json::from_str::<JSValue>(&reference),
        serde_json::from_str::<JSValue>(produced),
    );
    let differences = match parsed {
        (Ok(expected_js), Ok(produced_js)) if expected_js != produced_js => {
            Some((pretty(&expected_js)?, pretty(&produced_js)?))
        }
        (Ok(_), Ok(_)) => None,
        _ if reference.trim_end() != produced.trim_end() => {
            Some((reference.trim_end().to_string(), produced.trim_end().to_string()))
        }
        _ => None,
    };
    if let Some((expected, actual)) = differences {
        warn!("Found differences with the reference {:?}", reference_path);
        print_diff(expected.as_str(), actual.as_str(), "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    info!("Output matches the reference {:?}", reference_path);
    Ok(())
}

fn render_output(args: &Args, document: &Document, settings: &RenderSettings) -> ReportResult<String> {
    if args.nav {
        let nav = navigation(document);
        return serde_json::to_string_pretty(&nav).context(SerializingJsonSnafu {});
    }

    let key = match args.section.clone().or_else(|| default_key(document)) {
        Some(k) => k,
        None => whatever!("No section to show in {}", args.input),
    };
    let outcome = resolve_view(document, &key, settings);
    match &outcome {
        ViewOutcome::Rendered(view) => info!(
            "Resolved {:?} to {:?} ({} components)",
            key,
            view.resolved_key,
            view.components.len()
        ),
        ViewOutcome::NotFound(nf) => warn!("{}", nf),
    }

    if args.outline {
        Ok(outline::outline(&outcome))
    } else {
        serde_json::to_string_pretty(&outcome).context(SerializingJsonSnafu {})
    }
}

pub fn run(args: &Args) -> ReportResult<()> {
    let settings = match &args.config {
        Some(path) => read_settings(path)?,
        None => RenderSettings::default(),
    };
    debug!("settings: {:?}", settings);

    let document = read_document(&args.input)?;
    if document.sections.is_empty() {
        whatever!("No sections found in {}", args.input)
    }
    info!(
        "Read {} sections from {:?} (metadata: {:?})",
        document.sections.len(),
        args.input,
        document.metadata
    );

    let produced = render_output(args, &document, &settings)?;
    write_output(args.out.as_deref(), &produced)?;

    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &produced)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_path() -> String {
        format!("{}/testdata/report.json", env!("CARGO_MANIFEST_DIR"))
    }

    fn temp_path(name: &str) -> String {
        let p: PathBuf = [
            std::env::temp_dir(),
            PathBuf::from(format!("reportview-{}-{}", std::process::id(), name)),
        ]
        .iter()
        .collect();
        p.display().to_string()
    }

    fn args(section: Option<&str>) -> Args {
        Args {
            input: sample_path(),
            section: section.map(|s| s.to_string()),
            config: None,
            out: None,
            reference: None,
            nav: false,
            outline: false,
            verbose: false,
        }
    }

    #[test]
    fn default_view_of_sample() {
        let document = read_document(&sample_path()).unwrap();
        let produced = render_output(&args(None), &document, &RenderSettings::default()).unwrap();
        let js: JSValue = serde_json::from_str(&produced).unwrap();
        assert_eq!(js["status"], "rendered");
        assert_eq!(js["sectionId"], "executive");
        assert_eq!(js["resolvedKey"], "executive-summary");
    }

    #[test]
    fn every_navigation_entry_resolves() {
        let document = read_document(&sample_path()).unwrap();
        let settings = RenderSettings::default();
        for section in navigation(&document) {
            for entry in std::iter::once(&section.id).chain(section.children.iter().map(|c| &c.id)) {
                let outcome = resolve_view(&document, entry, &settings);
                assert!(
                    matches!(outcome, ViewOutcome::Rendered(_)),
                    "{} did not resolve: {:?}",
                    entry,
                    outcome
                );
            }
        }
    }

    #[test]
    fn run_with_reference() {
        let out = temp_path("attributes.json");
        let mut a = args(Some("attributes-customerType"));
        a.out = Some(out.clone());
        run(&a).unwrap();

        // The output of a run is its own reference.
        let mut again = args(Some("attributes-customerType"));
        again.out = Some(temp_path("attributes-again.json"));
        again.reference = Some(out.clone());
        run(&again).unwrap();

        // A different view does not match.
        let mut other = args(Some("responses-1"));
        other.out = Some(temp_path("responses.json"));
        other.reference = Some(out);
        assert!(matches!(
            run(&other),
            Err(ReportError::ReferenceMismatch { .. })
        ));
    }

    #[test]
    fn hand_written_reference() {
        let reference = format!(
            "{}/testdata/contact-reference.json",
            env!("CARGO_MANIFEST_DIR")
        );
        let mut a = args(Some("contact"));
        a.out = Some(temp_path("contact.json"));
        a.reference = Some(reference.clone());
        run(&a).unwrap();

        let mut other = args(Some("background"));
        other.out = Some(temp_path("background.json"));
        other.reference = Some(reference);
        assert!(matches!(
            run(&other),
            Err(ReportError::ReferenceMismatch { .. })
        ));
    }

    #[test]
    fn text_references() {
        let reference = temp_path("outline.txt");
        fs::write(&reference, "section: contact\n").unwrap();
        assert!(check_reference(&reference, "section: contact").is_ok());
        assert!(matches!(
            check_reference(&reference, "section: background"),
            Err(ReportError::ReferenceMismatch { .. })
        ));
    }

    #[test]
    fn missing_input() {
        let mut a = args(None);
        a.input = temp_path("does-not-exist.json");
        assert!(matches!(run(&a), Err(ReportError::OpeningFile { .. })));
    }

    #[test]
    fn document_without_sections() {
        let input = temp_path("empty.json");
        fs::write(&input, r#"{"metadata": {"version": "1"}}"#).unwrap();
        let mut a = args(None);
        a.input = input;
        assert!(matches!(run(&a), Err(ReportError::Whatever { .. })));
    }
}
