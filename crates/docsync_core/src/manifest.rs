use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SyncError;
use crate::model::Project;

/// Ledger of what has been pulled: category slug -> category entry -> doc slug
/// -> last synchronized metadata.
///
/// The manifest is loaded once per command, mutated in memory and written back
/// at most once through [`Manifest::flush`].
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Manifest {
    pub subdomain: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryEntry>,
    #[serde(skip)]
    dirty: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CategoryEntry {
    pub id: String,
    #[serde(default)]
    pub docs: BTreeMap<String, DocEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DocEntry {
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub hidden: bool,
}

/// Result of a manifest lookup by document slug.
#[derive(Debug, Clone, Copy)]
pub struct DocLocation<'a> {
    pub category_slug: &'a str,
    pub category: &'a CategoryEntry,
    pub doc: &'a DocEntry,
}

impl Manifest {
    pub fn new(project: &Project) -> Self {
        Self {
            subdomain: project.subdomain.clone(),
            base_url: project.base_url.clone(),
            categories: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Loads the manifest at `path`, or starts a fresh one stamped with the
    /// project's subdomain when the file does not exist.
    pub fn load(path: &Path, project: &Project) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "creating new manifest");
                return Ok(Self::new(project));
            }
            Err(error) => return Err(SyncError::local_io(path, error).into()),
        };

        let mut manifest: Manifest = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if manifest.subdomain != project.subdomain {
            return Err(SyncError::ManifestMismatch {
                manifest: manifest.subdomain,
                project: project.subdomain.clone(),
            }
            .into());
        }
        manifest.validate_unique_slugs()?;
        manifest.base_url = project.base_url.clone();
        manifest.dirty = false;
        Ok(manifest)
    }

    fn validate_unique_slugs(&self) -> Result<()> {
        let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
        for (category_slug, category) in &self.categories {
            for slug in category.docs.keys() {
                if let Some(first) = owners.insert(slug, category_slug) {
                    return Err(SyncError::DuplicateSlug {
                        slug: slug.clone(),
                        first: first.to_string(),
                        second: category_slug.clone(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    pub fn lookup_document(&self, slug: &str) -> Option<DocLocation<'_>> {
        self.categories
            .iter()
            .find_map(|(category_slug, category)| {
                category.docs.get(slug).map(|doc| DocLocation {
                    category_slug,
                    category,
                    doc,
                })
            })
    }

    /// Inserts or overwrites the entry for `slug`. An entry for the same slug
    /// under another category is dropped so slugs stay unique.
    pub fn record_document(
        &mut self,
        category_slug: &str,
        category_id: &str,
        slug: &str,
        entry: DocEntry,
    ) {
        for (other_slug, other) in self.categories.iter_mut() {
            if other_slug != category_slug && other.docs.remove(slug).is_some() {
                debug!(slug, from = %other_slug, to = category_slug, "moving manifest entry");
            }
        }

        let category = self
            .categories
            .entry(category_slug.to_string())
            .or_insert_with(|| CategoryEntry {
                id: category_id.to_string(),
                docs: BTreeMap::new(),
            });
        category.id = category_id.to_string();
        category.docs.insert(slug.to_string(), entry);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn document_count(&self) -> usize {
        self.categories
            .values()
            .map(|category| category.docs.len())
            .sum()
    }

    /// Serializes the whole manifest to `path`, replacing any existing file.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let rendered = serde_yaml::to_string(self).context("failed to serialize manifest")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SyncError::local_io(parent, source))?;
        }
        info!(path = %path.display(), "writing manifest");
        fs::write(path, rendered).map_err(|source| SyncError::local_io(path, source))?;
        Ok(())
    }

    /// Persists only when something was recorded since load. Returns `true`
    /// when a write occurred.
    pub fn flush(&mut self, path: &Path) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        self.persist(path)?;
        self.dirty = false;
        Ok(true)
    }
}
