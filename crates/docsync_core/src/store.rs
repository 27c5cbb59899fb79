use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SyncError;

pub const BODY_EXTENSION: &str = "md";
pub const META_EXTENSION: &str = "yaml";
pub const MANIFEST_STEM: &str = "metadata";

/// A document as materialized under the doc root: the body file plus the
/// sidecar holding the remaining fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LocalDocument {
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(skip)]
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(format!("{MANIFEST_STEM}.{META_EXTENSION}"))
    }

    pub fn category_dir(&self, category_slug: &str) -> Result<PathBuf> {
        validate_segment(category_slug)?;
        Ok(self.root.join(category_slug))
    }

    pub fn body_path(&self, category_slug: &str, slug: &str) -> Result<PathBuf> {
        validate_segment(slug)?;
        Ok(self
            .category_dir(category_slug)?
            .join(format!("{slug}.{BODY_EXTENSION}")))
    }

    pub fn meta_path(&self, category_slug: &str, slug: &str) -> Result<PathBuf> {
        validate_segment(slug)?;
        Ok(self
            .category_dir(category_slug)?
            .join(format!("{slug}.{META_EXTENSION}")))
    }

    /// Reads body and sidecar. Fails with `SyncError::NotFound` when either
    /// file is missing.
    pub fn read_document(&self, category_slug: &str, slug: &str) -> Result<LocalDocument> {
        let body_path = self.body_path(category_slug, slug)?;
        let meta_path = self.meta_path(category_slug, slug)?;

        let body = read_optional(&body_path)?;
        let meta = read_optional(&meta_path)?;
        let (Some(body), Some(meta)) = (body, meta) else {
            return Err(SyncError::not_found(
                "local doc",
                format!("{category_slug}/{slug}"),
            )
            .into());
        };

        let mut document: LocalDocument = serde_yaml::from_str(&meta)
            .with_context(|| format!("failed to parse {}", meta_path.display()))?;
        document.body = body;
        Ok(document)
    }

    /// Writes the sidecar, then the body. The caller must only record the
    /// document in the manifest when this returns `Ok`.
    pub fn write_document(
        &self,
        category_slug: &str,
        slug: &str,
        document: &LocalDocument,
    ) -> Result<()> {
        let dir = self.category_dir(category_slug)?;
        let body_path = self.body_path(category_slug, slug)?;
        let meta_path = self.meta_path(category_slug, slug)?;

        fs::create_dir_all(&dir).map_err(|source| SyncError::local_io(&dir, source))?;

        let meta = serde_yaml::to_string(document)
            .with_context(|| format!("failed to serialize metadata for {slug}"))?;
        debug!(path = %meta_path.display(), "writing doc metadata");
        fs::write(&meta_path, meta).map_err(|source| SyncError::local_io(&meta_path, source))?;

        debug!(path = %body_path.display(), "writing doc body");
        fs::write(&body_path, &document.body)
            .map_err(|source| SyncError::local_io(&body_path, source))?;
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(SyncError::local_io(path, error).into()),
    }
}

/// Rejects values that would escape the doc root when joined as a path
/// component.
pub fn validate_segment(value: &str) -> Result<()> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.contains('\0');
    if invalid {
        return Err(SyncError::InvalidSegment {
            value: value.to_string(),
        }
        .into());
    }
    Ok(())
}
