use std::collections::{BTreeMap, BTreeSet, VecDeque};

use anyhow::{Result, bail};

use crate::error::SyncError;
use crate::model::{Category, Document, DocumentSummary, Project};
use crate::prompt::Prompt;
use crate::remote::RemoteApi;

#[derive(Default)]
pub struct MockApi {
    pub project: Project,
    pub categories: Vec<Category>,
    pub docs: BTreeMap<String, Document>,
    pub updates: Vec<(String, Document)>,
    pub calls: Vec<String>,
    pub failing_docs: BTreeSet<String>,
    pub failing_updates: BTreeSet<String>,
    request_count: usize,
}

impl MockApi {
    pub fn new(subdomain: &str) -> Self {
        Self {
            project: Project {
                name: "Docs".to_string(),
                subdomain: subdomain.to_string(),
                base_url: format!("https://{subdomain}.example.com"),
            },
            ..Self::default()
        }
    }

    pub fn with_category(mut self, id: &str, slug: &str) -> Self {
        self.categories.push(Category {
            id: id.to_string(),
            slug: slug.to_string(),
            title: slug.to_string(),
        });
        self
    }

    pub fn with_doc(mut self, category_id: &str, slug: &str, title: &str, body: &str) -> Self {
        self.docs.insert(
            slug.to_string(),
            Document {
                slug: slug.to_string(),
                category: category_id.to_string(),
                title: title.to_string(),
                excerpt: String::new(),
                body: body.to_string(),
                hidden: false,
            },
        );
        self
    }

    pub fn doc_mut(&mut self, slug: &str) -> &mut Document {
        self.docs
            .get_mut(slug)
            .unwrap_or_else(|| panic!("mock has no doc {slug}"))
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls.iter().any(|item| item == call)
    }

    fn record(&mut self, call: String) {
        self.request_count += 1;
        self.calls.push(call);
    }
}

impl RemoteApi for MockApi {
    fn project(&mut self) -> Result<Project> {
        self.record("project".to_string());
        Ok(self.project.clone())
    }

    fn categories(&mut self) -> Result<Vec<Category>> {
        self.record("categories".to_string());
        Ok(self.categories.clone())
    }

    fn category(&mut self, slug: &str) -> Result<Category> {
        self.record(format!("category:{slug}"));
        self.categories
            .iter()
            .find(|category| category.slug == slug)
            .cloned()
            .ok_or_else(|| SyncError::not_found("category", slug).into())
    }

    fn category_by_id(&mut self, id: &str) -> Result<Category> {
        self.record(format!("category_by_id:{id}"));
        self.categories
            .iter()
            .find(|category| category.id == id)
            .cloned()
            .ok_or_else(|| SyncError::not_found("category", id).into())
    }

    fn documents(&mut self, category_slug: &str) -> Result<Vec<DocumentSummary>> {
        self.record(format!("documents:{category_slug}"));
        let Some(category) = self
            .categories
            .iter()
            .find(|category| category.slug == category_slug)
        else {
            return Err(SyncError::not_found("category", category_slug).into());
        };
        Ok(self
            .docs
            .values()
            .filter(|doc| doc.category == category.id)
            .map(|doc| DocumentSummary {
                slug: doc.slug.clone(),
                title: doc.title.clone(),
                hidden: doc.hidden,
            })
            .collect())
    }

    fn document(&mut self, slug: &str) -> Result<Document> {
        self.record(format!("document:{slug}"));
        if self.failing_docs.contains(slug) {
            bail!("connection reset while fetching {slug}");
        }
        self.docs
            .get(slug)
            .cloned()
            .ok_or_else(|| SyncError::not_found("doc", slug).into())
    }

    fn update_document(&mut self, category_id: &str, document: &Document) -> Result<()> {
        self.record(format!("update:{}", document.slug));
        if self.failing_updates.contains(&document.slug) {
            return Err(SyncError::Remote {
                status: 400,
                code: "DOC_INVALID".to_string(),
                message: "The doc is invalid.".to_string(),
            }
            .into());
        }
        let mut stored = document.clone();
        stored.category = category_id.to_string();
        self.docs.insert(stored.slug.clone(), stored);
        self.updates
            .push((category_id.to_string(), document.clone()));
        Ok(())
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

#[derive(Default)]
pub struct ScriptedPrompt {
    pub answers: VecDeque<bool>,
    pub selections: VecDeque<Option<usize>>,
    pub questions: Vec<String>,
    pub messages: Vec<String>,
    pub offered: Vec<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn selecting(selections: &[Option<usize>]) -> Self {
        Self {
            selections: selections.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn said(&self, fragment: &str) -> bool {
        self.messages.iter().any(|message| message.contains(fragment))
    }
}

impl Prompt for ScriptedPrompt {
    fn show(&mut self, message: &str) -> Result<()> {
        self.messages.push(message.to_string());
        Ok(())
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.questions.push(question.to_string());
        match self.answers.pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("unexpected question: {question}"),
        }
    }

    fn select(&mut self, _heading: &str, items: &[String]) -> Result<Option<usize>> {
        self.offered.push(items.to_vec());
        match self.selections.pop_front() {
            Some(selection) => Ok(selection),
            None => bail!("unexpected selection among {items:?}"),
        }
    }
}
