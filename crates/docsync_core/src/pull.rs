use anyhow::Result;
use tracing::{info, warn};

use crate::differ::{Snapshot, diff};
use crate::engine::Syncer;
use crate::error::{SyncError, sync_error};
use crate::manifest::{DocEntry, Manifest};
use crate::model::{Category, Document};
use crate::prompt::Prompt;
use crate::remote::RemoteApi;
use crate::store::LocalDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullAction {
    /// No local copy existed; files and manifest entry were written.
    Created,
    /// Local copy differed and the overwrite was confirmed.
    Updated,
    /// Local copy already matches the remote document.
    Aligned,
    /// Local copy differs and the overwrite was declined.
    Declined,
}

impl PullAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Aligned => "aligned",
            Self::Declined => "declined",
        }
    }

    pub fn wrote(self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullDocumentResult {
    pub slug: String,
    pub category_slug: String,
    pub action: PullAction,
}

#[derive(Debug, Clone, Default)]
pub struct PullReport {
    pub documents: Vec<PullDocumentResult>,
    pub manifest_written: bool,
    pub request_count: usize,
}

impl PullReport {
    pub fn written(&self) -> usize {
        self.documents
            .iter()
            .filter(|item| item.action.wrote())
            .count()
    }

    pub fn count(&self, action: PullAction) -> usize {
        self.documents
            .iter()
            .filter(|item| item.action == action)
            .count()
    }

    pub fn action_for(&self, slug: &str) -> Option<PullAction> {
        self.documents
            .iter()
            .find(|item| item.slug == slug)
            .map(|item| item.action)
    }
}

impl<A: RemoteApi, P: Prompt> Syncer<'_, A, P> {
    /// Pulls one document by slug, resolving its owning category remotely.
    pub fn pull_document(&mut self, slug: &str) -> Result<PullReport> {
        let mut manifest = self.open_manifest()?;
        let document = self.api.document(slug)?;
        let category = self.resolve_owner(&document)?;
        let result = self.pull_one(&mut manifest, &category, document)?;
        self.finish_pull(&mut manifest, vec![result])
    }

    /// Pulls every document listed under `category_slug`.
    pub fn pull_category(&mut self, category_slug: &str) -> Result<PullReport> {
        let mut manifest = self.open_manifest()?;
        let category = self.api.category(category_slug)?;
        let mut results = Vec::new();
        self.pull_category_into(&mut manifest, &category, &mut results)?;
        self.finish_pull(&mut manifest, results)
    }

    /// Pulls every document of every category in the project.
    pub fn pull_project(&mut self) -> Result<PullReport> {
        let mut manifest = self.open_manifest()?;
        let categories = self.api.categories()?;
        let mut results = Vec::new();
        for category in &categories {
            self.pull_category_into(&mut manifest, category, &mut results)?;
        }
        self.finish_pull(&mut manifest, results)
    }

    /// Finds the category whose document listing contains `slug` by walking
    /// every category. Fails with `SyncError::CategoryNotFound`.
    pub fn locate_category(&mut self, slug: &str) -> Result<Category> {
        for category in self.api.categories()? {
            let documents = self.api.documents(&category.slug)?;
            if documents.iter().any(|document| document.slug == slug) {
                return Ok(category);
            }
        }
        Err(SyncError::CategoryNotFound {
            slug: slug.to_string(),
        }
        .into())
    }

    fn resolve_owner(&mut self, document: &Document) -> Result<Category> {
        if !document.category.is_empty() {
            match self.api.category_by_id(&document.category) {
                Ok(category) => return Ok(category),
                Err(error) if matches!(sync_error(&error), Some(SyncError::NotFound { .. })) => {
                    warn!(
                        slug = %document.slug,
                        category_id = %document.category,
                        "category id unknown, scanning category listings"
                    );
                }
                Err(error) => return Err(error),
            }
        }
        self.locate_category(&document.slug)
    }

    fn pull_category_into(
        &mut self,
        manifest: &mut Manifest,
        category: &Category,
        results: &mut Vec<PullDocumentResult>,
    ) -> Result<()> {
        for summary in self.api.documents(&category.slug)? {
            let document = self.api.document(&summary.slug)?;
            results.push(self.pull_one(manifest, category, document)?);
        }
        Ok(())
    }

    fn pull_one(
        &mut self,
        manifest: &mut Manifest,
        category: &Category,
        document: Document,
    ) -> Result<PullDocumentResult> {
        let slug = document.slug.clone();
        let outcome = |action| PullDocumentResult {
            slug: slug.clone(),
            category_slug: category.slug.clone(),
            action,
        };

        let existing = manifest
            .lookup_document(&slug)
            .map(|location| (location.category_slug.to_string(), location.doc.clone()));

        let mut action = PullAction::Created;
        if let Some((local_category, entry)) = existing {
            match self.store.read_document(&local_category, &slug) {
                Ok(local) => {
                    let old = Snapshot {
                        category: Some(local_category.clone()),
                        title: entry.title,
                        excerpt: entry.excerpt,
                        hidden: entry.hidden,
                        body: local.body,
                    };
                    let new = Snapshot::from_document(&document).with_category(&category.slug);
                    let report = diff(&old, &new);
                    if !report.has_difference() {
                        info!(slug = %slug, "doc already aligned");
                        self.prompt
                            .show(&format!("Doc '{slug}' is aligned with the remote one"))?;
                        return Ok(outcome(PullAction::Aligned));
                    }

                    let question =
                        format!("Are you sure to pull '{slug}' and overwrite local changes?");
                    if !self.confirm_change(&slug, &report, &question)? {
                        info!(slug = %slug, "pull declined");
                        self.prompt.show(&format!("Doc '{slug}' is not pulled"))?;
                        return Ok(outcome(PullAction::Declined));
                    }
                    if local_category != category.slug {
                        warn!(
                            slug = %slug,
                            from = %local_category,
                            to = %category.slug,
                            "doc moved category; files under the old category are left in place"
                        );
                    }
                    action = PullAction::Updated;
                }
                Err(error) if matches!(sync_error(&error), Some(SyncError::NotFound { .. })) => {
                    warn!(
                        slug = %slug,
                        category = %local_category,
                        "manifest entry has no local files; rewriting"
                    );
                }
                Err(error) => return Err(error),
            }
        }

        let local = LocalDocument {
            category: category.slug.clone(),
            title: document.title.clone(),
            excerpt: document.excerpt.clone(),
            hidden: document.hidden,
            body: document.body,
        };
        self.store.write_document(&category.slug, &slug, &local)?;
        manifest.record_document(
            &category.slug,
            &category.id,
            &slug,
            DocEntry {
                title: local.title,
                excerpt: local.excerpt,
                hidden: local.hidden,
            },
        );

        let path = self.store.body_path(&category.slug, &slug)?;
        info!(slug = %slug, action = action.as_str(), "doc written");
        self.prompt
            .show(&format!("Writing doc: {}", path.display()))?;
        Ok(outcome(action))
    }

    fn finish_pull(
        &mut self,
        manifest: &mut Manifest,
        documents: Vec<PullDocumentResult>,
    ) -> Result<PullReport> {
        let manifest_path = self.store.manifest_path();
        let manifest_written = manifest.flush(&manifest_path)?;
        if manifest_written {
            self.prompt
                .show(&format!("Writing metadata: {}", manifest_path.display()))?;
        }
        Ok(PullReport {
            documents,
            manifest_written,
            request_count: self.api.request_count(),
        })
    }
}
