use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures the sync engine distinguishes. They travel inside `anyhow::Error`
/// and can be recovered with `downcast_ref::<SyncError>()`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("request to the documentation service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("documentation service error [{code}] (HTTP {status}): {message}")]
    Remote {
        status: u16,
        code: String,
        message: String,
    },

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("unable to find the category of doc: '{slug}'")]
    CategoryNotFound { slug: String },

    #[error("the API key is from another project '{project}' not '{manifest}'")]
    ManifestMismatch { manifest: String, project: String },

    #[error("doc '{slug}' is recorded under both '{first}' and '{second}' in the manifest")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },

    #[error("local I/O failed for {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("refusing to use '{value}' as a path segment")]
    InvalidSegment { value: String },
}

impl SyncError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn local_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }
}

/// Returns the typed sync failure carried by `error`, if any.
pub fn sync_error(error: &anyhow::Error) -> Option<&SyncError> {
    error.downcast_ref::<SyncError>()
}
