//! HTTP client for the Notion REST API.
//!
//! Covers the endpoints the MCP server forwards to: search, page
//! retrieve/create/update, block children list/append, and database query.
//! Payloads travel as [`serde_json::Value`]; Notion's object shapes are
//! open-ended and the server passes them through rather than modeling them.

use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

pub mod block;

/// Base URL of the hosted Notion API.
pub const NOTION_API_BASE: &str = "https://api.notion.com";
/// Versioned-API header value sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from Notion API calls.
#[derive(Error, Debug)]
pub enum NotionError {
    /// The request could not be sent or the response body could not be read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The API answered with a non-success status.
    #[error("notion api error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Parent under which a new page is created.
#[derive(Debug, Clone)]
pub enum Parent {
    /// An existing page; the new page becomes a child page.
    Page(String),
    /// A database; the new page becomes a row of it.
    Database(String),
}

impl Parent {
    fn to_value(&self) -> Value {
        match self {
            Parent::Page(id) => json!({ "page_id": id }),
            Parent::Database(id) => json!({ "database_id": id }),
        }
    }
}

/// A Notion list response, reduced to the entries it carries.
#[derive(Debug, Deserialize)]
pub struct ObjectList {
    #[serde(default)]
    pub results: Vec<Value>,
}

/// Client for the Notion REST API.
#[derive(Clone)]
pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl NotionClient {
    /// Create a client for the hosted API using an integration token.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, NOTION_API_BASE)
    }

    /// Create a client against a non-default base URL.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build http client");
        Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Search pages and databases by title.
    pub async fn search(
        &self,
        query: &str,
        filter_type: Option<&str>,
    ) -> Result<ObjectList, NotionError> {
        self.request(Method::POST, "/v1/search", Some(search_body(query, filter_type)))
            .await
    }

    /// Retrieve a page object.
    pub async fn retrieve_page(&self, page_id: &str) -> Result<Value, NotionError> {
        self.request(Method::GET, &format!("/v1/pages/{page_id}"), None)
            .await
    }

    /// Create a page (or database row) under the given parent.
    pub async fn create_page(
        &self,
        parent: Parent,
        properties: Value,
    ) -> Result<Value, NotionError> {
        let body = json!({ "parent": parent.to_value(), "properties": properties });
        self.request(Method::POST, "/v1/pages", Some(body)).await
    }

    /// Update the properties of an existing page.
    pub async fn update_page(
        &self,
        page_id: &str,
        properties: Value,
    ) -> Result<Value, NotionError> {
        let body = json!({ "properties": properties });
        self.request(Method::PATCH, &format!("/v1/pages/{page_id}"), Some(body))
            .await
    }

    /// List the direct child blocks of a page or block.
    pub async fn list_block_children(&self, block_id: &str) -> Result<ObjectList, NotionError> {
        self.request(Method::GET, &format!("/v1/blocks/{block_id}/children"), None)
            .await
    }

    /// Append child blocks to a page or block.
    pub async fn append_block_children(
        &self,
        block_id: &str,
        children: Vec<Value>,
    ) -> Result<Value, NotionError> {
        let body = json!({ "children": children });
        self.request(
            Method::PATCH,
            &format!("/v1/blocks/{block_id}/children"),
            Some(body),
        )
        .await
    }

    /// Query a database, passing filter and sorts through untouched.
    pub async fn query_database(
        &self,
        database_id: &str,
        filter: Option<Value>,
        sorts: Option<Vec<Value>>,
    ) -> Result<ObjectList, NotionError> {
        self.request(
            Method::POST,
            &format!("/v1/databases/{database_id}/query"),
            Some(query_body(filter, sorts)),
        )
        .await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, NotionError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = api_error_message(&response.text().await.unwrap_or_default());
            return Err(NotionError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

fn search_body(query: &str, filter_type: Option<&str>) -> Value {
    let mut body = json!({ "query": query });
    if let Some(object) = filter_type {
        body["filter"] = json!({ "value": object, "property": "object" });
    }
    body
}

fn query_body(filter: Option<Value>, sorts: Option<Vec<Value>>) -> Value {
    let mut body = json!({});
    if let Some(filter) = filter {
        body["filter"] = filter;
    }
    if let Some(sorts) = sorts {
        body["sorts"] = Value::Array(sorts);
    }
    body
}

/// Pull the human-readable message out of a Notion error body, falling back
/// to the raw body when it is not the usual `{"message": ...}` JSON shape.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
