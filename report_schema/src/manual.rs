/*!

This is the long-form manual for `report_schema` and `reportview`.

## Document format

A report document is a single JSON object:

```text
{
  "metadata": {"version": "4.0", "language": "en", "surveyId": "cs-2024"},
  "uiTexts": {...},
  "surveyInfo": {...},
  "sections": [...]
}
```

`metadata` and `sections` are expected. `uiTexts` holds the localized strings
(any nesting), `surveyInfo` the report-level figures used by headers.

Nothing in the document is mandatory for the library: a section without an id
is skipped, a component without a `type` is skipped, and any lookup into
something that is not there simply comes back empty.

### Sections

```text
{"id": "executive", "index": 1, "name": "...", "icon": "...",
 "subsections": [...], "components": [...], "data": {...}}
```

A section either has `subsections` or, when it is not divided, its own flat
`components`. Sections are displayed by `index`; a missing index sorts after
every indexed section and ties keep the order of the file.

Two kinds of sections produce their children from data:
- the responses section (id `responses` or `questions`, or any section with a
  `questions` array): one child `responses-<questionId>` per question.
- the attributes section (id `attributes`, or a section with
  `"dynamicSubsections": true` and attribute records): one child
  `attributes-<attributeId>` per attribute record that has an `icon`.

Questions and attribute records are read from the section itself or from its
`data` object. The children of these sections render the section's
`components` as a template. Inside them, `question.*` reads the current
question and `sectionData.*` the current record.

### Subsections

```text
{"id": "executive-summary", "index": 1, "name": "...", "icon": "...",
 "components": [...], "data": {...}}
```

Subsection ids are the navigation keys. They are looked up across the whole
document, so they have to be unique across all sections.

### Components

```text
{"type": "card", "index": 1, "dataPath": "sectionData.nps", "config": {...},
 "title": "{{uiTexts.labels.nps}}", "text": "Score {{sectionData.nps}}\n...",
 "cardStyleVariant": "highlight", "cardContentVariant": "compact",
 "titleStyleVariant": "section", "components": [...]}
```

`type` selects the render routine. `dataPath` is resolved into `data`,
`title` and `text` are templates. Children are rendered by `index`.

### Older layouts

Two older layouts are still read, and behave exactly like `subsections`:
- `section.data.renderSchema.subsections` / `.components`
- a top-level key named after the section: `document.<id>.renderSchema`

The layouts are tried in that order, after the current one. In the newest
revision of the older layout, subsections no longer carry an `index`, and
their order is the order of the array.

## Paths

`dataPath` values and template placeholders are dotted paths:
`results.rows.0.label`, `results.rows[0].label`.

- `sectionData.<path>` reads the data of the current subsection (or of its
  section when the subsection has none).
- `question.<path>` reads the current question.
- any other path is read from the document root.

A missing path is not an error: the component simply has no `data`. A value
that is present but `null` is passed on as `null`.

## Templates

`{{path}}` placeholders are replaced by the value found at `path`.
`{{uiTexts.<path>}}` looks up a localized text; a missing text shows its own
path (`uiTexts.labels.nps`) so that the gap is visible.

A placeholder that cannot be resolved is left as it is, except when the whole
string is that one placeholder, in which case the result is empty.

## Navigation keys

A key is one of:
- a section id: the section opens on its first child, or on its own
  components when it has no children;
- a subsection id;
- `responses-<questionId>` or `attributes-<attributeId>`.

A key that leads nowhere produces a "not found" outcome carrying the key and,
when the owning section was identified, its id.

## Configuration

`reportview` accepts a settings file in JSON:

```text
{
  "maxDepth": 32,
  "styleVariants": {
    "cardStyleVariant": {"default": "card", "highlight": "card card-highlight"},
    "cardContentVariant": {"default": "card-content"},
    "titleStyleVariant": {"default": "title"}
  }
}
```

Every key is optional. Component trees nested deeper than `maxDepth` are cut
and the cut node is flagged `truncated`. An unknown variant uses the bucket's
`default` entry.

 */
