// A plain-text rendering of a view, one line per component.

use report_schema::*;
use serde_json::Value as JSValue;

fn count(data: &Option<JSValue>) -> usize {
    match data {
        Some(JSValue::Array(items)) => items.len(),
        Some(JSValue::Object(map)) => map.len(),
        Some(JSValue::Null) | None => 0,
        Some(_) => 1,
    }
}

fn label(c: &ResolvedComponent) -> String {
    c.title.clone().unwrap_or_default()
}

fn routines() -> RenderRegistry<String> {
    RenderRegistry::new()
        .register("card", |c| match &c.text {
            Some(t) => format!("[card] {}: {}", label(c), t.replace('\n', " / ")),
            None => format!("[card] {}", label(c)),
        })
        .register("text", |c| c.text.clone().unwrap_or_default().replace('\n', " / "))
        .register("table", |c| format!("[table] {} ({} rows)", label(c), count(&c.data)))
        .register("chart", |c| format!("[chart] {} ({} points)", label(c), count(&c.data)))
        .with_fallback(|c| format!("[{}] {}", c.component_type, label(c)))
}

fn outline_components(
    registry: &RenderRegistry<String>,
    components: &[ResolvedComponent],
    depth: usize,
    lines: &mut Vec<String>,
) {
    for c in components {
        if let Some(line) = registry.dispatch(c) {
            let marker = if c.truncated { " ..." } else { "" };
            lines.push(format!("{}{}{}", "  ".repeat(depth), line.trim_end(), marker));
        }
        outline_components(registry, &c.components, depth + 1, lines);
    }
}

pub fn outline(outcome: &ViewOutcome) -> String {
    match outcome {
        ViewOutcome::Rendered(view) => {
            let registry = routines();
            let mut lines = vec![format!(
                "# {} ({})",
                view.title.clone().unwrap_or_else(|| view.section_id.clone()),
                view.resolved_key
            )];
            outline_components(&registry, &view.components, 0, &mut lines);
            lines.join("\n")
        }
        ViewOutcome::NotFound(nf) => format!("Not found: {}", nf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outline_of_view() {
        let doc = Document::from_value(json!({
            "sections": [{"id": "s", "name": "Section", "data": {"rows": [1, 2, 3]}, "components": [
                {"type": "card", "index": 1, "title": "Card", "text": "a\\nb", "components": [
                    {"type": "table", "title": "T", "dataPath": "sectionData.rows"}
                ]},
                {"type": "gauge", "index": 2, "title": "G"}
            ]}]
        }));
        let text = outline(&resolve_view(&doc, "s", &RenderSettings::default()));
        assert_eq!(
            text,
            "# Section (s)\n[card] Card: a / b\n  [table] T (3 rows)\n[gauge] G"
        );
    }

    #[test]
    fn outline_of_missing_view() {
        let doc = Document::from_value(json!({"sections": [{"id": "s"}]}));
        assert_eq!(
            outline(&resolve_view(&doc, "x", &RenderSettings::default())),
            "Not found: No section found for \"x\""
        );
    }
}
