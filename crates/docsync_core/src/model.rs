use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub subdomain: String,
    #[serde(rename = "baseUrl", default)]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Category {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: String,
}

/// Entry of a category listing. The listing carries no body.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub hidden: bool,
}

/// Remote snapshot of a document. `category` is the remote category id.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Document {
    pub slug: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub excerpt: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default)]
    pub hidden: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

const LOCAL_EXTENSIONS: [&str; 4] = ["md", "markdown", "yaml", "yml"];

/// Turns a command-line document reference into a slug.
///
/// Accepts a bare slug, a viewer URL (`https://host/docs/quick-start`) or a
/// local file name (`guides/quick-start.md`).
pub fn slug_from_argument(argument: &str) -> String {
    let trimmed = argument.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed);
    let without_query = last.split(['?', '#']).next().unwrap_or(last);
    match without_query.rsplit_once('.') {
        Some((stem, extension))
            if !stem.is_empty() && LOCAL_EXTENSIONS.contains(&extension) =>
        {
            stem.to_string()
        }
        _ => without_query.to_string(),
    }
}
