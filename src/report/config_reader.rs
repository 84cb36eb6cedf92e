use crate::report::*;

pub fn read_json(path: &str) -> ReportResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    debug!("read_json: {} bytes from {:?}", contents.len(), path);
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

/// The report document. Only the JSON syntax can fail here, the content is
/// read leniently.
pub fn read_document(path: &str) -> ReportResult<Document> {
    let js = read_json(path)?;
    Ok(Document::from_value(js))
}

/// Render settings. Missing keys take their default value.
pub fn read_settings(path: &str) -> ReportResult<RenderSettings> {
    let js = read_json(path)?;
    let settings: RenderSettings =
        serde_json::from_value(js).context(ParsingJsonSnafu { path })?;
    info!(
        "read_settings: max depth {} from {:?}",
        settings.max_depth, path
    );
    Ok(settings)
}

pub fn read_reference(path: &str) -> ReportResult<String> {
    fs::read_to_string(path).context(OpeningFileSnafu { path })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> String {
        let path = std::env::temp_dir()
            .join(format!("reportview-config-{}-{}", std::process::id(), name))
            .display()
            .to_string();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn settings_file() {
        let path = write_temp(
            "settings.json",
            r#"{"maxDepth": 4, "styleVariants": {"titleStyleVariant": {"default": "h2"}}}"#,
        );
        let settings = read_settings(&path).unwrap();
        assert_eq!(settings.max_depth, 4);
        assert_eq!(
            settings
                .style_variants
                .class_for(TITLE_STYLE_VARIANT, Some("anything")),
            "h2"
        );
    }

    #[test]
    fn bad_settings_file() {
        let path = write_temp("bad-settings.json", r#"{"maxDepth": "deep"}"#);
        assert!(matches!(
            read_settings(&path),
            Err(ReportError::ParsingJson { .. })
        ));
        let path = write_temp("broken.json", "{ not json");
        assert!(matches!(
            read_document(&path),
            Err(ReportError::ParsingJson { .. })
        ));
    }
}
