use serde::{Deserialize, Serialize};

use super::validation::PageRequest;

/// Paginated list body.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// `path` and `query` are those of the incoming request; links keep the
    /// query and only swap its `page` value.
    #[must_use]
    pub fn new(
        results: Vec<T>,
        count: u64,
        request: PageRequest,
        public_url: &str,
        path: &str,
        query: Option<&str>,
    ) -> Self {
        let link = |page: Option<u64>| page_link(public_url, path, query, page);

        let next = request
            .has_next(count)
            .then(|| link(Some(request.page + 1)))
            .flatten();

        let previous = match request.page {
            1 => None,
            2 => link(None),
            page => link(Some(page - 1)),
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// `None` drops the `page` parameter, which addresses the first page.
fn page_link(public_url: &str, path: &str, query: Option<&str>, page: Option<u64>) -> Option<String> {
    let mut url = url::Url::parse(public_url).ok()?.join(path).ok()?;

    let kept: Vec<(String, String)> = url::form_urlencoded::parse(query.unwrap_or("").as_bytes())
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.set_query(None);
    if !kept.is_empty() || page.is_some() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
        if let Some(page) = page {
            pairs.append_pair("page", &page.to_string());
        }
    }

    Some(url.into())
}

#[derive(Debug, Serialize)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct IngredientSearch {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimitParams {
    pub recipes_limit: Option<String>,
}
