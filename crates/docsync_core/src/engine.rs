use anyhow::Result;

use crate::differ::DiffReport;
use crate::manifest::Manifest;
use crate::prompt::Prompt;
use crate::remote::RemoteApi;
use crate::store::LocalStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Answer "yes" to every confirmation without asking.
    pub assume_yes: bool,
}

/// One command's worth of sync work. Collaborators are borrowed for the
/// lifetime of the command; nothing is global.
pub struct Syncer<'a, A: RemoteApi, P: Prompt> {
    pub(crate) api: &'a mut A,
    pub(crate) prompt: &'a mut P,
    pub(crate) store: &'a LocalStore,
    pub(crate) options: SyncOptions,
}

impl<'a, A: RemoteApi, P: Prompt> Syncer<'a, A, P> {
    pub fn new(
        api: &'a mut A,
        prompt: &'a mut P,
        store: &'a LocalStore,
        options: SyncOptions,
    ) -> Self {
        Self {
            api,
            prompt,
            store,
            options,
        }
    }

    /// Fetches the remote project and loads the manifest belonging to it.
    /// Fails with `SyncError::ManifestMismatch` before any document is touched
    /// when the doc root belongs to another project.
    pub fn open_manifest(&mut self) -> Result<Manifest> {
        let project = self.api.project()?;
        Manifest::load(&self.store.manifest_path(), &project)
    }

    /// Shows the diff and asks `question` unless confirmations are pre-answered.
    pub(crate) fn confirm_change(
        &mut self,
        slug: &str,
        report: &DiffReport,
        question: &str,
    ) -> Result<bool> {
        self.prompt.show(report.render(slug).trim_end())?;
        if self.options.assume_yes {
            return Ok(true);
        }
        self.prompt.confirm(question)
    }

    pub fn request_count(&self) -> usize {
        self.api.request_count()
    }
}
