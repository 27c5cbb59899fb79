use anyhow::Result;
use tracing::info;

use crate::differ::{Snapshot, diff};
use crate::engine::Syncer;
use crate::model::Document;
use crate::prompt::Prompt;
use crate::remote::RemoteApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The slug has no manifest entry; nothing was sent.
    NotFoundLocally,
    Unchanged,
    Declined,
    Pushed { url: String },
}

impl PushOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFoundLocally => "not found locally",
            Self::Unchanged => "unchanged",
            Self::Declined => "declined",
            Self::Pushed { .. } => "pushed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PushReport {
    pub slug: String,
    pub outcome: PushOutcome,
    pub request_count: usize,
}

impl<A: RemoteApi, P: Prompt> Syncer<'_, A, P> {
    /// Pushes the local copy of `slug` back to the remote project.
    ///
    /// The candidate is assembled from the manifest entry (title, excerpt,
    /// hidden, category id) and the local body file, then compared against
    /// the live remote document. The manifest is never written.
    pub fn push_document(&mut self, slug: &str) -> Result<PushReport> {
        let manifest = self.open_manifest()?;
        let Some(location) = manifest.lookup_document(slug) else {
            self.prompt.show(&format!(
                "Doc '{slug}' not found in '{}', please create the doc on the dashboard and do a 'pull'.",
                self.store.manifest_path().display()
            ))?;
            return Ok(self.push_report(slug, PushOutcome::NotFoundLocally));
        };
        let category_slug = location.category_slug.to_string();
        let category_id = location.category.id.clone();
        let entry = location.doc.clone();

        let local = self.store.read_document(&category_slug, slug)?;
        let remote = self.api.document(slug)?;

        let candidate = Document {
            slug: slug.to_string(),
            category: category_id.clone(),
            title: entry.title,
            excerpt: entry.excerpt,
            body: local.body,
            hidden: entry.hidden,
        };
        // Category is not compared on push.
        let report = diff(
            &Snapshot::from_document(&remote),
            &Snapshot::from_document(&candidate),
        );
        if !report.has_difference() {
            info!(slug, "doc unchanged");
            self.prompt.show(&format!("Doc '{slug}' is unchanged"))?;
            return Ok(self.push_report(slug, PushOutcome::Unchanged));
        }

        let question = format!("Are you sure to push doc '{slug}' to remote?");
        if !self.confirm_change(slug, &report, &question)? {
            info!(slug, "push declined");
            self.prompt.show(&format!("Doc '{slug}' is not pushed"))?;
            return Ok(self.push_report(slug, PushOutcome::Declined));
        }

        self.api.update_document(&category_id, &candidate)?;
        let url = format!("{}/docs/{slug}", manifest.base_url.trim_end_matches('/'));
        info!(slug, url = %url, "doc pushed");
        self.prompt
            .show(&format!("Doc '{slug}' is pushed to: {url}"))?;
        Ok(self.push_report(slug, PushOutcome::Pushed { url }))
    }

    fn push_report(&self, slug: &str, outcome: PushOutcome) -> PushReport {
        PushReport {
            slug: slug.to_string(),
            outcome,
            request_count: self.api.request_count(),
        }
    }
}
