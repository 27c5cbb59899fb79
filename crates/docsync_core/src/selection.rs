use anyhow::Result;

use crate::prompt::Prompt;
use crate::remote::RemoteApi;

pub const ALL_ENTRY: &str = "(all)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    One(String),
    Cancelled,
}

/// Lets the user pick a category slug from the remote listing.
pub fn choose_category<A, P>(api: &mut A, prompt: &mut P, allow_all: bool) -> Result<Selection>
where
    A: RemoteApi,
    P: Prompt,
{
    let slugs = api
        .categories()?
        .into_iter()
        .map(|category| category.slug)
        .collect::<Vec<_>>();
    choose(prompt, "Select category:", slugs, allow_all)
}

/// Lets the user pick a document slug from one category's listing.
pub fn choose_document<A, P>(
    api: &mut A,
    prompt: &mut P,
    category_slug: &str,
    allow_all: bool,
) -> Result<Selection>
where
    A: RemoteApi,
    P: Prompt,
{
    let slugs = api
        .documents(category_slug)?
        .into_iter()
        .map(|document| document.slug)
        .collect::<Vec<_>>();
    choose(
        prompt,
        &format!("Select doc in '{category_slug}':"),
        slugs,
        allow_all,
    )
}

fn choose<P: Prompt>(
    prompt: &mut P,
    heading: &str,
    slugs: Vec<String>,
    allow_all: bool,
) -> Result<Selection> {
    if slugs.is_empty() {
        prompt.show("Nothing to choose from")?;
        return Ok(Selection::Cancelled);
    }

    let mut items = Vec::with_capacity(slugs.len() + 1);
    if allow_all {
        items.push(ALL_ENTRY.to_string());
    }
    items.extend(slugs);

    let Some(index) = prompt.select(heading, &items)? else {
        return Ok(Selection::Cancelled);
    };
    if allow_all && index == 0 {
        return Ok(Selection::All);
    }
    Ok(items
        .into_iter()
        .nth(index)
        .map_or(Selection::Cancelled, Selection::One))
}
