//! Talk (short-form post) operations.
//!
//! The server stores talk links as `{ "text": ..., "url": ... }` objects.
//! Callers are allowed to hand in a bare string, a single object, or a mixed
//! list; everything is normalised before it leaves the client.

use http::Method;
use serde_json::Value;

use crate::client::{AdminClient, ClientResult};
use crate::transport::ApiRequest;

impl AdminClient {
    /// Fetches talks. `params` is passed through as the query string, so
    /// pagination and filters stay server-defined.
    pub async fn get_talks(&self, params: &[(&str, &str)]) -> ClientResult<Value> {
        let request = ApiRequest::new(Method::GET, self.endpoint("/api/talks/get")?)
            .with_query(params.iter().copied());
        let response = self.public_request(request, &self.default_options()).await?;
        Ok(response.json()?)
    }

    /// Creates a talk. Links are normalised (missing becomes an empty list)
    /// and a blank `created_at` is dropped so the server stamps its own.
    pub async fn add_talk(&self, talk: Value) -> ClientResult<Value> {
        let options = self.default_options();
        let Value::Object(mut talk) = talk else {
            return Err(self
                .precondition_failed("Talk payload must be a JSON object", &options)
                .await);
        };

        let links = normalized_links(talk.get("links")).unwrap_or_default();
        talk.insert("links".into(), Value::Array(links));
        if talk.get("created_at").is_some_and(is_blank) {
            talk.remove("created_at");
        }

        let request = ApiRequest::new(Method::POST, self.endpoint("/api/talks/add")?)
            .with_json(Value::Object(talk));
        let response = self.authed_request(request, &options).await?;
        Ok(response.json()?)
    }

    /// Updates a talk. A present id is mandatory; links are normalised only
    /// when the caller supplied them, so an omitted field stays untouched
    /// server-side.
    pub async fn edit_talk(&self, talk: Value) -> ClientResult<Value> {
        let options = self.default_options();
        let Value::Object(mut talk) = talk else {
            return Err(self
                .precondition_failed("Talk payload must be a JSON object", &options)
                .await);
        };
        if !talk.get("id").is_some_and(present_id) {
            return Err(self
                .precondition_failed("Missing id, cannot update the talk", &options)
                .await);
        }

        if let Some(links) = normalized_links(talk.get("links")) {
            talk.insert("links".into(), Value::Array(links));
        }

        let request = ApiRequest::new(Method::PUT, self.endpoint("/api/talks/edit")?)
            .with_json(Value::Object(talk));
        let response = self.authed_request(request, &options).await?;
        Ok(response.json()?)
    }

    /// Deletes a talk by id.
    pub async fn delete_talk(&self, id: i64) -> ClientResult<()> {
        let request = ApiRequest::new(Method::DELETE, self.endpoint("/api/talks/delete")?)
            .with_json(serde_json::json!({ "id": id }));
        self.authed_request(request, &self.default_options()).await?;
        Ok(())
    }
}

/// Normalises a links field. `None` means the caller did not supply links at
/// all (absent or null); otherwise a single value is wrapped into a list and
/// bare strings become `{ "text": s, "url": s }` entries.
fn normalized_links(links: Option<&Value>) -> Option<Vec<Value>> {
    let links = links?;
    if links.is_null() {
        return None;
    }

    let items = match links {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    };
    Some(
        items
            .into_iter()
            .map(|link| match link {
                Value::String(text) => serde_json::json!({ "text": text, "url": text }),
                other => other,
            })
            .collect(),
    )
}

fn present_id(value: &Value) -> bool {
    match value {
        Value::Number(number) => number.as_f64().is_some_and(|id| id != 0.0),
        Value::String(id) => !id.is_empty(),
        _ => false,
    }
}

fn is_blank(value: &Value) -> bool {
    value.is_null() || value.as_str().is_some_and(str::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn links_absent_or_null_are_not_normalized() {
        assert_eq!(normalized_links(None), None);
        assert_eq!(normalized_links(Some(&Value::Null)), None);
    }

    #[test]
    fn bare_string_becomes_text_url_pair() {
        let links = normalized_links(Some(&json!("https://example.com"))).unwrap();
        assert_eq!(
            links,
            vec![json!({ "text": "https://example.com", "url": "https://example.com" })]
        );
    }

    #[test]
    fn single_object_is_wrapped_into_a_list() {
        let link = json!({ "text": "Docs", "url": "https://example.com/docs" });
        let links = normalized_links(Some(&link)).unwrap();
        assert_eq!(links, vec![link]);
    }

    #[test]
    fn mixed_list_normalizes_only_the_strings() {
        let input = json!(["https://a.example", { "text": "B", "url": "https://b.example" }]);
        let links = normalized_links(Some(&input)).unwrap();
        assert_eq!(
            links,
            vec![
                json!({ "text": "https://a.example", "url": "https://a.example" }),
                json!({ "text": "B", "url": "https://b.example" }),
            ]
        );
    }

    #[test]
    fn empty_list_stays_empty() {
        let links = normalized_links(Some(&json!([]))).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn id_presence_follows_value_shape() {
        assert!(present_id(&json!(7)));
        assert!(present_id(&json!("abc")));
        assert!(!present_id(&json!(0)));
        assert!(!present_id(&json!("")));
        assert!(!present_id(&Value::Null));
        assert!(!present_id(&json!({ "id": 1 })));
    }

    #[test]
    fn blank_created_at_shapes() {
        assert!(is_blank(&Value::Null));
        assert!(is_blank(&json!("")));
        assert!(!is_blank(&json!("2024-05-01T00:00:00Z")));
        assert!(!is_blank(&json!(0)));
    }
}
