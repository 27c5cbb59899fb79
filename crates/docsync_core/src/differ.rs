use std::fmt::Write as _;

use similar::{ChangeTag, TextDiff};

use crate::model::Document;

/// The comparable fields of a document at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Opaque owning-category key. Only compared when both sides carry one.
    pub category: Option<String>,
    pub title: String,
    pub excerpt: String,
    pub hidden: bool,
    pub body: String,
}

impl Snapshot {
    pub fn from_document(document: &Document) -> Self {
        Self {
            category: None,
            title: document.title.clone(),
            excerpt: document.excerpt.clone(),
            hidden: document.hidden,
            body: document.body.clone(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange<T> {
    pub old: T,
    pub new: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Equal,
    Delete,
    Insert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSpan {
    pub kind: SpanKind,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    pub category: Option<FieldChange<String>>,
    pub title: Option<FieldChange<String>>,
    pub excerpt: Option<FieldChange<String>>,
    pub hidden: Option<FieldChange<bool>>,
    /// Inline rendering of the body change; `None` when bodies are equal.
    pub body: Option<Vec<DiffSpan>>,
}

impl DiffReport {
    pub fn has_difference(&self) -> bool {
        self.category.is_some()
            || self.title.is_some()
            || self.excerpt.is_some()
            || self.hidden.is_some()
            || self.body.is_some()
    }

    pub fn body_changed(&self) -> bool {
        self.body.is_some()
    }

    /// Human-readable report, one field per line, with the body rendered as
    /// `[-deleted-]{+inserted+}` spans.
    pub fn render(&self, slug: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Checking '{slug}' for difference...");
        if let Some(change) = &self.category {
            let _ = writeln!(out, "Category: {} => {}", change.old, change.new);
        }
        if let Some(change) = &self.title {
            let _ = writeln!(out, "Title: {} => {}", change.old, change.new);
        }
        if let Some(change) = &self.excerpt {
            let _ = writeln!(out, "Excerpt: {} => {}", change.old, change.new);
        }
        if let Some(change) = &self.hidden {
            let _ = writeln!(out, "Hidden: {} => {}", change.old, change.new);
        }
        if let Some(spans) = &self.body {
            out.push_str("Body:\n");
            out.push_str(&render_spans(spans));
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}

/// Compares `old` against `new` field by field with exact equality.
pub fn diff(old: &Snapshot, new: &Snapshot) -> DiffReport {
    let category = match (&old.category, &new.category) {
        (Some(old), Some(new)) => changed(old, new),
        _ => None,
    };
    DiffReport {
        category,
        title: changed(&old.title, &new.title),
        excerpt: changed(&old.excerpt, &new.excerpt),
        hidden: (old.hidden != new.hidden).then_some(FieldChange {
            old: old.hidden,
            new: new.hidden,
        }),
        body: (old.body != new.body).then(|| inline_spans(&old.body, &new.body)),
    }
}

fn changed(old: &str, new: &str) -> Option<FieldChange<String>> {
    (old != new).then(|| FieldChange {
        old: old.to_string(),
        new: new.to_string(),
    })
}

fn inline_spans(old: &str, new: &str) -> Vec<DiffSpan> {
    let text_diff = TextDiff::from_words(old, new);
    let mut spans: Vec<DiffSpan> = Vec::new();
    for change in text_diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => SpanKind::Equal,
            ChangeTag::Delete => SpanKind::Delete,
            ChangeTag::Insert => SpanKind::Insert,
        };
        match spans.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(change.value()),
            _ => spans.push(DiffSpan {
                kind,
                text: change.value().to_string(),
            }),
        }
    }
    spans
}

fn render_spans(spans: &[DiffSpan]) -> String {
    let mut out = String::new();
    for span in spans {
        match span.kind {
            SpanKind::Equal => out.push_str(&span.text),
            SpanKind::Delete => {
                let _ = write!(out, "[-{}-]", span.text);
            }
            SpanKind::Insert => {
                let _ = write!(out, "{{+{}+}}", span.text);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{DiffSpan, Snapshot, SpanKind, diff};

    fn snapshot(body: &str) -> Snapshot {
        Snapshot {
            category: None,
            title: "Quick Start".to_string(),
            excerpt: "Get going".to_string(),
            hidden: false,
            body: body.to_string(),
        }
    }

    #[test]
    fn identical_snapshots_have_no_difference() {
        let report = diff(&snapshot("# Hi"), &snapshot("# Hi"));
        assert!(!report.has_difference());
        assert_eq!(report.render("quick-start"), "Checking 'quick-start' for difference...\n");
    }

    #[test]
    fn trailing_newline_counts_as_a_change() {
        let report = diff(&snapshot("# Hi"), &snapshot("# Hi\n"));
        assert!(report.has_difference());
        assert!(report.body_changed());
        assert!(report.title.is_none());
    }

    #[test]
    fn metadata_fields_are_reported_with_old_and_new_values() {
        let old = snapshot("# Hi");
        let mut new = snapshot("# Hi");
        new.title = "Quicker Start".to_string();
        new.hidden = true;

        let report = diff(&old, &new);
        let title = report.title.as_ref().expect("title change");
        assert_eq!(title.old, "Quick Start");
        assert_eq!(title.new, "Quicker Start");
        let hidden = report.hidden.as_ref().expect("hidden change");
        assert!(!hidden.old);
        assert!(hidden.new);
        assert!(report.excerpt.is_none());
        assert!(!report.body_changed());

        let rendered = report.render("quick-start");
        assert!(rendered.contains("Title: Quick Start => Quicker Start"));
        assert!(rendered.contains("Hidden: false => true"));
    }

    #[test]
    fn category_is_only_compared_when_both_sides_have_one() {
        let old = snapshot("# Hi").with_category("guides");
        let new = snapshot("# Hi");
        assert!(!diff(&old, &new).has_difference());

        let moved = snapshot("# Hi").with_category("reference");
        let report = diff(&old, &moved);
        let category = report.category.expect("category change");
        assert_eq!(category.old, "guides");
        assert_eq!(category.new, "reference");
    }

    #[test]
    fn body_spans_mark_inserted_and_deleted_words() {
        let report = diff(&snapshot("# Hi"), &snapshot("# Hi there"));
        let spans = report.body.as_ref().expect("body spans");
        assert!(spans.iter().any(|span| span.kind == SpanKind::Insert));
        assert!(spans.contains(&DiffSpan {
            kind: SpanKind::Equal,
            text: "# Hi".to_string(),
        }));
        assert!(report.render("quick-start").contains("{+"));

        let report = diff(&snapshot("one two"), &snapshot("one"));
        assert!(report.render("x").contains("[-"));
    }
}
