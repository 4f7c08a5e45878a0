//! Article operations: listing, reading, writing, and the paginated export.

use http::Method;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{AdminClient, ClientResult};
use crate::outcome::presenter::HandleOptions;
use crate::transport::ApiRequest;

/// Page size used by [`AdminClient::export_all_articles`] when the caller
/// passes zero.
pub const DEFAULT_EXPORT_PAGE_SIZE: u32 = 5;

/// Every article collected from the export endpoint, plus the counters the
/// server reported for the full set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleExport {
    pub data: Vec<Value>,
    pub page: u64,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl AdminClient {
    /// Fetches the full article list, drafts included.
    pub async fn list_articles(&self) -> ClientResult<Value> {
        let request = ApiRequest::new(Method::GET, self.endpoint("/api/list")?)
            .with_query([("posts", "all")]);
        let response = self.public_request(request, &self.default_options()).await?;
        Ok(response.json()?)
    }

    /// Fetches a single article by slug.
    pub async fn get_article(&self, slug: &str) -> ClientResult<Value> {
        let request = ApiRequest::new(Method::GET, self.endpoint("/api/article")?)
            .with_query([("slug", slug)]);
        let response = self.public_request(request, &self.default_options()).await?;
        Ok(response.json()?)
    }

    /// Creates an article. The payload is forwarded as-is.
    pub async fn add_article(&self, article: Value) -> ClientResult<Value> {
        let request = ApiRequest::new(Method::POST, self.endpoint("/api/add")?)
            .with_json(article);
        let response = self.authed_request(request, &self.default_options()).await?;
        Ok(response.json()?)
    }

    /// Updates an article. Only recognised, non-empty fields reach the wire;
    /// a present slug is mandatory.
    pub async fn edit_article(&self, article: &Value) -> ClientResult<Value> {
        let options = self.default_options();
        let Some(slug) = article
            .get("slug")
            .and_then(Value::as_str)
            .filter(|slug| !slug.is_empty())
        else {
            return Err(self
                .precondition_failed("Missing slug, cannot update the article", &options)
                .await);
        };

        let request = ApiRequest::new(Method::PUT, self.endpoint("/api/edit")?)
            .with_json(edit_payload(slug, article));
        let response = self.authed_request(request, &options).await?;
        Ok(response.json()?)
    }

    /// Deletes an article by slug.
    pub async fn delete_article(&self, slug: &str) -> ClientResult<()> {
        let request = ApiRequest::new(Method::DELETE, self.endpoint("/api/delete")?)
            .with_json(serde_json::json!({ "slug": slug }));
        self.authed_request(request, &self.default_options()).await?;
        Ok(())
    }

    /// Walks every page of the export endpoint and accumulates the articles.
    /// An empty page before the reported last one ends the walk early.
    pub async fn export_all_articles(&self, page_size: u32) -> ClientResult<ArticleExport> {
        let page_size = if page_size == 0 {
            DEFAULT_EXPORT_PAGE_SIZE
        } else {
            page_size
        };
        let options = self.default_options();

        let first = self.export_page(1, page_size, &options).await?;
        let Some(mut articles) = first.get("data").and_then(Value::as_array).cloned() else {
            return Ok(ArticleExport {
                data: Vec::new(),
                page: 1,
                page_size,
                total: 0,
                total_pages: 0,
            });
        };

        let total = first
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(articles.len() as u64);
        let total_pages = first
            .get("totalPages")
            .and_then(Value::as_u64)
            .unwrap_or_else(|| total.div_ceil(u64::from(page_size)));

        for page in 2..=total_pages {
            let body = self.export_page(page, page_size, &options).await?;
            match body.get("data").and_then(Value::as_array) {
                Some(chunk) if !chunk.is_empty() => articles.extend(chunk.iter().cloned()),
                _ => break,
            }
        }

        info!(
            "exported {} articles across {total_pages} pages",
            articles.len()
        );
        Ok(ArticleExport {
            data: articles,
            page: 1,
            page_size,
            total,
            total_pages,
        })
    }

    async fn export_page(
        &self,
        page: u64,
        page_size: u32,
        options: &HandleOptions,
    ) -> ClientResult<Value> {
        debug!("loading export page {page}");
        let request = ApiRequest::new(Method::GET, self.endpoint("/api/article/all")?).with_query([
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ]);
        let response = self.authed_read(request, options).await?;
        Ok(response.json()?)
    }
}

/// Builds the update payload: the slug, the text fields that are present and
/// non-empty, tags when the list is non-empty, and `published` whenever it is
/// an actual boolean.
fn edit_payload(slug: &str, article: &Value) -> Value {
    let mut payload = serde_json::Map::new();
    payload.insert("slug".into(), Value::String(slug.to_string()));

    for field in ["title", "content", "date", "description"] {
        if let Some(text) = article.get(field).and_then(Value::as_str)
            && !text.is_empty()
        {
            payload.insert(field.into(), Value::String(text.to_string()));
        }
    }
    if let Some(tags) = article.get("tags").and_then(Value::as_array)
        && !tags.is_empty()
    {
        payload.insert("tags".into(), Value::Array(tags.clone()));
    }
    if let Some(published) = article.get("published").and_then(Value::as_bool) {
        payload.insert("published".into(), Value::Bool(published));
    }

    Value::Object(payload)
}
