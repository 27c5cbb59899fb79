use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{Method, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::RemoteSettings;
use crate::error::{SyncError, sync_error};
use crate::model::{Category, Document, DocumentSummary, Project};

const CATEGORY_PAGE_SIZE: usize = 100;

/// Everything the sync engine needs from the documentation service.
pub trait RemoteApi {
    fn project(&mut self) -> Result<Project>;
    fn categories(&mut self) -> Result<Vec<Category>>;
    fn category(&mut self, slug: &str) -> Result<Category>;
    /// Resolves a category id through the cached listing. Fails with
    /// `SyncError::NotFound` when no category carries `id`.
    fn category_by_id(&mut self, id: &str) -> Result<Category>;
    fn documents(&mut self, category_slug: &str) -> Result<Vec<DocumentSummary>>;
    fn document(&mut self, slug: &str) -> Result<Document>;
    fn update_document(&mut self, category_id: &str, document: &Document) -> Result<()>;
    fn request_count(&self) -> usize;
}

pub struct ReadmeClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    echo_json: bool,
    category_cache: Option<CategoryCache>,
    request_count: usize,
}

impl ReadmeClient {
    pub fn new(settings: &RemoteSettings) -> Result<Self> {
        let mut endpoint = Url::parse(&settings.endpoint)
            .with_context(|| format!("invalid API endpoint: {}", settings.endpoint))?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .user_agent(settings.user_agent.clone())
            .build()
            .context("failed to build documentation API HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone(),
            echo_json: false,
            category_cache: None,
            request_count: 0,
        })
    }

    /// Pretty-print every request and response payload to stdout.
    pub fn with_json_echo(mut self, enabled: bool) -> Self {
        self.echo_json = enabled;
        self
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        build_url(&self.endpoint, segments)
    }

    fn get<T: DeserializeOwned>(&mut self, segments: &[&str], query: &[(&str, String)]) -> Result<T> {
        let url = self.url(segments)?;
        let request = self.client.request(Method::GET, url.clone()).query(query);
        let payload = self.send(Method::GET, &url, request, None)?;
        serde_json::from_value(payload)
            .with_context(|| format!("failed to decode response from {url}"))
    }

    fn send(
        &mut self,
        method: Method,
        url: &Url,
        request: RequestBuilder,
        body: Option<&Value>,
    ) -> Result<Value> {
        let mut request = request
            .basic_auth(&self.api_key, Some(""))
            .header("Accept", "application/json");
        if let Some(body) = body {
            self.echo(body)?;
            request = request.json(body);
        }

        debug!(%method, %url, "making request");
        self.request_count += 1;
        let response = request.send().map_err(SyncError::from)?;
        let status = response.status();
        let text = response.text().map_err(SyncError::from)?;
        let payload: Option<Value> = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };
        if let Some(payload) = &payload {
            self.echo(payload)?;
        }

        if !status.is_success() {
            return Err(decode_error(status.as_u16(), payload.as_ref()).into());
        }
        Ok(payload.unwrap_or(Value::Null))
    }

    fn echo(&self, payload: &Value) -> Result<()> {
        if self.echo_json {
            let rendered =
                serde_json::to_string_pretty(payload).context("failed to render JSON payload")?;
            println!("{rendered}");
        }
        Ok(())
    }

    fn fetch_category_listing(&mut self) -> Result<Vec<Category>> {
        let mut all = Vec::new();
        let mut page = 1usize;
        loop {
            let batch: Vec<Category> = self.get(
                &["categories"],
                &[
                    ("perPage", CATEGORY_PAGE_SIZE.to_string()),
                    ("page", page.to_string()),
                ],
            )?;
            let received = batch.len();
            all.extend(batch);
            if received < CATEGORY_PAGE_SIZE {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    /// Fetches the category listing once per client and serves it from memory
    /// afterwards.
    fn cached_categories(&mut self) -> Result<&CategoryCache> {
        let cache = match self.category_cache.take() {
            Some(cache) => cache,
            None => CategoryCache::from_listing(self.fetch_category_listing()?),
        };
        Ok(self.category_cache.insert(cache))
    }
}

impl RemoteApi for ReadmeClient {
    fn project(&mut self) -> Result<Project> {
        self.get(&[], &[])
    }

    fn categories(&mut self) -> Result<Vec<Category>> {
        Ok(self.cached_categories()?.listing.clone())
    }

    fn category(&mut self, slug: &str) -> Result<Category> {
        let result = self.get(&["categories", slug], &[]);
        missing_as_not_found(result, "category", slug)
    }

    fn category_by_id(&mut self, id: &str) -> Result<Category> {
        self.cached_categories()?
            .by_id(id)
            .cloned()
            .ok_or_else(|| SyncError::not_found("category", id).into())
    }

    fn documents(&mut self, category_slug: &str) -> Result<Vec<DocumentSummary>> {
        self.get(&["categories", category_slug, "docs"], &[])
    }

    fn document(&mut self, slug: &str) -> Result<Document> {
        let result = self.get(&["docs", slug], &[]);
        missing_as_not_found(result, "doc", slug)
    }

    fn update_document(&mut self, category_id: &str, document: &Document) -> Result<()> {
        let url = self.url(&["docs", &document.slug])?;
        let body = update_payload(category_id, document);
        let request = self.client.request(Method::PUT, url.clone());
        self.send(Method::PUT, &url, request, Some(&body))?;
        Ok(())
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

/// Category listing in service order plus an id index into it.
#[derive(Debug, Default)]
struct CategoryCache {
    listing: Vec<Category>,
    index: BTreeMap<String, usize>,
}

impl CategoryCache {
    fn from_listing(listing: Vec<Category>) -> Self {
        let index = listing
            .iter()
            .enumerate()
            .map(|(position, category)| (category.id.clone(), position))
            .collect();
        Self { listing, index }
    }

    fn by_id(&self, id: &str) -> Option<&Category> {
        self.index
            .get(id)
            .and_then(|position| self.listing.get(*position))
    }
}

fn build_url(endpoint: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = endpoint.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API endpoint cannot be a base: {endpoint}"))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

fn update_payload(category_id: &str, document: &Document) -> Value {
    serde_json::json!({
        "title": document.title,
        "excerpt": document.excerpt,
        "body": document.body,
        "category": category_id,
        "hidden": document.hidden,
    })
}

fn missing_as_not_found<T>(result: Result<T>, kind: &'static str, key: &str) -> Result<T> {
    result.map_err(|error| match sync_error(&error) {
        Some(SyncError::Remote { status: 404, .. }) => SyncError::not_found(kind, key).into(),
        _ => error,
    })
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn decode_error(status: u16, payload: Option<&Value>) -> SyncError {
    let parsed = payload
        .and_then(|value| serde_json::from_value::<ErrorPayload>(value.clone()).ok());
    let code = parsed
        .as_ref()
        .and_then(|item| item.error.clone())
        .unwrap_or_else(|| "unknown_error".to_string());
    let message = parsed
        .and_then(|item| item.message)
        .unwrap_or_else(|| format!("HTTP {status}"));
    SyncError::Remote {
        status,
        code,
        message,
    }
}
