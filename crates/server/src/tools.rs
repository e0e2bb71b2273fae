//! Tool implementations for the Notion MCP server.

use crate::NotionMcpServer;
use crate::config::Config;
use crate::scripts::{ScriptEntry, ScriptStore};
use notion_api::{NotionClient, Parent, block};
use rmcp::{
    handler::server::wrapper::Parameters,
    schemars::{self, JsonSchema},
    tool, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Parameters for searching pages and databases.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchNotionParams {
    /// Text to match against page and database titles.
    pub query: String,
    /// Restrict results to one object type: "page" or "database".
    pub filter_type: Option<String>,
}

/// Parameters for retrieving page metadata.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPageParams {
    /// ID of the page to retrieve.
    pub page_id: String,
}

/// Parameters for reading page content.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetPageContentParams {
    /// ID of the page whose blocks to read.
    pub page_id: String,
}

/// Parameters for creating a page.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreatePageParams {
    /// ID of the parent page the new page is created under.
    pub parent_id: String,
    /// Title of the new page.
    pub title: String,
    /// Markdown body for the new page (one block per line).
    pub content: Option<String>,
}

/// Parameters for updating a page.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdatePageParams {
    /// ID of the page to update.
    pub page_id: String,
    /// New title for the page.
    pub title: Option<String>,
    /// Markdown content appended to the page (one block per line).
    pub content: Option<String>,
}

/// Parameters for querying a database.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryDatabaseParams {
    /// ID of the database to query.
    pub database_id: String,
    /// Notion filter object, passed through untouched.
    pub filter: Option<Value>,
    /// Notion sorts array, passed through untouched.
    pub sorts: Option<Vec<Value>>,
}

/// Parameters for inserting a database row.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDatabaseEntryParams {
    /// ID of the database to insert into.
    pub database_id: String,
    /// Notion property object for the new row, passed through untouched.
    pub properties: Value,
}

/// Parameters for generating a script file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateYoutubeScriptParams {
    /// Topic keyword the script is about.
    pub keyword: String,
    /// The script text to embed in the file.
    pub script_content: String,
}

/// Parameters for reading a script file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetYoutubeScriptParams {
    /// Name of the script file to read.
    pub filename: String,
}

/// Parameters for deleting a script file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteYoutubeScriptParams {
    /// Name of the script file to delete.
    pub filename: String,
}

/// Summary of a page or database returned by `search_notion`.
#[derive(Debug, Serialize)]
struct ObjectSummary {
    id: String,
    #[serde(rename = "type")]
    object_type: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchResults {
    count: usize,
    results: Vec<ObjectSummary>,
}

/// Full metadata for a single page.
#[derive(Debug, Serialize)]
struct PageInfo {
    id: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_edited_time: Option<String>,
    properties: Value,
}

/// One row returned by `query_database`.
#[derive(Debug, Serialize)]
struct DatabaseRow {
    id: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    properties: Value,
}

#[derive(Debug, Serialize)]
struct QueryResults {
    count: usize,
    results: Vec<DatabaseRow>,
}

#[derive(Debug, Serialize)]
struct ScriptList {
    count: usize,
    scripts: Vec<ScriptEntry>,
}

#[tool_router]
impl NotionMcpServer {
    /// Create a server from the startup configuration and script directory.
    pub fn new(config: &Config, scripts_dir: PathBuf) -> Self {
        Self {
            notion: NotionClient::new(&config.notion_token),
            scripts: ScriptStore::new(scripts_dir),
            tool_router: Self::tool_router(),
        }
    }

    /// Search Notion for pages and databases matching a query.
    #[tool(description = "Search Notion pages and databases by title")]
    async fn search_notion(
        &self,
        Parameters(params): Parameters<SearchNotionParams>,
    ) -> Result<String, String> {
        let list = self
            .notion
            .search(&params.query, params.filter_type.as_deref())
            .await
            .map_err(|e| e.to_string())?;
        let results: Vec<ObjectSummary> = list
            .results
            .iter()
            .filter(|object| {
                matches!(
                    object.get("object").and_then(Value::as_str),
                    Some("page") | Some("database")
                )
            })
            .map(object_summary)
            .collect();
        let summary = SearchResults {
            count: results.len(),
            results,
        };
        serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())
    }

    /// Retrieve id, title, url, timestamps, and properties of a page.
    #[tool(description = "Get metadata about a Notion page (title, url, timestamps, properties)")]
    async fn get_page(
        &self,
        Parameters(params): Parameters<GetPageParams>,
    ) -> Result<String, String> {
        let page = self
            .notion
            .retrieve_page(&params.page_id)
            .await
            .map_err(|e| e.to_string())?;
        let info = PageInfo {
            id: field_str(&page, "id"),
            title: block::extract_title(&page),
            url: opt_field_str(&page, "url"),
            created_time: opt_field_str(&page, "created_time"),
            last_edited_time: opt_field_str(&page, "last_edited_time"),
            properties: cloned_properties(&page),
        };
        serde_json::to_string_pretty(&info).map_err(|e| e.to_string())
    }

    /// Read a page's block content rendered as Markdown.
    #[tool(description = "Get the content of a Notion page rendered as Markdown")]
    async fn get_page_content(
        &self,
        Parameters(params): Parameters<GetPageContentParams>,
    ) -> Result<String, String> {
        let page = self
            .notion
            .retrieve_page(&params.page_id)
            .await
            .map_err(|e| e.to_string())?;
        let title = block::extract_title(&page);
        let children = self
            .notion
            .list_block_children(&params.page_id)
            .await
            .map_err(|e| e.to_string())?;
        let content = block::blocks_to_markdown(&self.notion, children.results)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!("# {title}\n\n{content}"))
    }

    /// Create a page under a parent page, optionally with Markdown content.
    #[tool(description = "Create a new Notion page under a parent page")]
    async fn create_page(
        &self,
        Parameters(params): Parameters<CreatePageParams>,
    ) -> Result<String, String> {
        let page = self
            .notion
            .create_page(
                Parent::Page(params.parent_id),
                block::title_property(&params.title),
            )
            .await
            .map_err(|e| e.to_string())?;
        if let Some(content) = params.content.as_deref().filter(|content| !content.is_empty()) {
            let blocks = block::markdown_to_blocks(content);
            if !blocks.is_empty() {
                let page_id = field_str(&page, "id");
                self.notion
                    .append_block_children(&page_id, blocks)
                    .await
                    .map_err(|e| e.to_string())?;
            }
        }
        Ok(format!(
            "Created page {}\nURL: {}",
            field_str(&page, "id"),
            field_str(&page, "url")
        ))
    }

    /// Update a page's title and/or append Markdown content.
    #[tool(description = "Update a Notion page's title and/or append content")]
    async fn update_page(
        &self,
        Parameters(params): Parameters<UpdatePageParams>,
    ) -> Result<String, String> {
        if let Some(title) = params.title.as_deref().filter(|title| !title.is_empty()) {
            self.notion
                .update_page(&params.page_id, block::title_property(title))
                .await
                .map_err(|e| e.to_string())?;
        }
        if let Some(content) = params.content.as_deref().filter(|content| !content.is_empty()) {
            let blocks = block::markdown_to_blocks(content);
            if !blocks.is_empty() {
                self.notion
                    .append_block_children(&params.page_id, blocks)
                    .await
                    .map_err(|e| e.to_string())?;
            }
        }
        Ok(format!("Updated page {}", params.page_id))
    }

    /// Query a database with optional filter and sorts.
    #[tool(description = "Query a Notion database, optionally with a filter and sorts")]
    async fn query_database(
        &self,
        Parameters(params): Parameters<QueryDatabaseParams>,
    ) -> Result<String, String> {
        let list = self
            .notion
            .query_database(&params.database_id, params.filter, params.sorts)
            .await
            .map_err(|e| e.to_string())?;
        let results: Vec<DatabaseRow> = list.results.iter().map(database_row).collect();
        let summary = QueryResults {
            count: results.len(),
            results,
        };
        serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())
    }

    /// Insert a row into a database with caller-supplied properties.
    #[tool(description = "Create a new entry in a Notion database")]
    async fn create_database_entry(
        &self,
        Parameters(params): Parameters<CreateDatabaseEntryParams>,
    ) -> Result<String, String> {
        let page = self
            .notion
            .create_page(Parent::Database(params.database_id), params.properties)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!(
            "Created database entry {}\nURL: {}",
            field_str(&page, "id"),
            field_str(&page, "url")
        ))
    }

    /// Write a new script file for a keyword.
    #[tool(description = "Create a YouTube Shorts script file from a keyword and script content")]
    async fn create_youtube_script(
        &self,
        Parameters(params): Parameters<CreateYoutubeScriptParams>,
    ) -> Result<String, String> {
        let created = self
            .scripts
            .create(&params.keyword, &params.script_content)
            .await
            .map_err(|e| e.to_string())?;
        serde_json::to_string_pretty(&created).map_err(|e| e.to_string())
    }

    /// List generated script files.
    #[tool(description = "List generated YouTube Shorts script files, newest first")]
    async fn list_youtube_scripts(&self) -> Result<String, String> {
        let scripts = self.scripts.list().await.map_err(|e| e.to_string())?;
        let listing = ScriptList {
            count: scripts.len(),
            scripts,
        };
        serde_json::to_string_pretty(&listing).map_err(|e| e.to_string())
    }

    /// Read one script file's contents.
    #[tool(description = "Read the contents of a generated script file")]
    async fn get_youtube_script(
        &self,
        Parameters(params): Parameters<GetYoutubeScriptParams>,
    ) -> Result<String, String> {
        self.scripts
            .read(&params.filename)
            .await
            .map_err(|e| e.to_string())
    }

    /// Delete one script file.
    #[tool(description = "Delete a generated script file")]
    async fn delete_youtube_script(
        &self,
        Parameters(params): Parameters<DeleteYoutubeScriptParams>,
    ) -> Result<String, String> {
        self.scripts
            .delete(&params.filename)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!("Deleted {}", params.filename))
    }
}

fn object_summary(object: &Value) -> ObjectSummary {
    ObjectSummary {
        id: field_str(object, "id"),
        object_type: field_str(object, "object"),
        title: block::extract_title(object),
        url: opt_field_str(object, "url"),
    }
}

fn database_row(page: &Value) -> DatabaseRow {
    DatabaseRow {
        id: field_str(page, "id"),
        title: block::extract_title(page),
        url: opt_field_str(page, "url"),
        properties: cloned_properties(page),
    }
}

fn field_str(object: &Value, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_field_str(object: &Value, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

fn cloned_properties(object: &Value) -> Value {
    object
        .get("properties")
        .cloned()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()))
}

#[cfg(test)]
mod tests {
    use crate::NotionMcpServer;
    use crate::config::Config;
    use crate::scripts::ScriptStore;
    use crate::tools::{
        CreatePageParams, CreateYoutubeScriptParams, DeleteYoutubeScriptParams, GetPageParams,
        GetYoutubeScriptParams, SearchNotionParams, UpdatePageParams, object_summary,
    };
    use notion_api::NotionClient;
    use rmcp::handler::server::wrapper::Parameters;
    use serde_json::json;

    const TOOL_NAMES: [&str; 11] = [
        "search_notion",
        "get_page",
        "get_page_content",
        "create_page",
        "update_page",
        "query_database",
        "create_database_entry",
        "create_youtube_script",
        "list_youtube_scripts",
        "get_youtube_script",
        "delete_youtube_script",
    ];

    fn test_server(dir_name: &str) -> NotionMcpServer {
        let config = Config {
            notion_token: "test-token".into(),
            log_level: "info".into(),
        };
        let dir = std::env::temp_dir().join(dir_name);
        std::fs::remove_dir_all(&dir).ok();
        NotionMcpServer::new(&config, dir)
    }

    // The client points at a closed port, so any outbound call errors.
    fn offline_server(dir_name: &str) -> NotionMcpServer {
        let dir = std::env::temp_dir().join(dir_name);
        std::fs::remove_dir_all(&dir).ok();
        NotionMcpServer {
            notion: NotionClient::with_base_url("test-token", "http://127.0.0.1:1"),
            scripts: ScriptStore::new(dir),
            tool_router: NotionMcpServer::tool_router(),
        }
    }

    #[test]
    fn router_registers_exactly_the_eleven_tools() {
        let router = NotionMcpServer::tool_router();
        let mut names: Vec<String> = router
            .list_all()
            .iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        let mut expected: Vec<String> = TOOL_NAMES.iter().map(|name| name.to_string()).collect();
        expected.sort();
        assert_eq!(names, expected);
    }

    #[test]
    fn unknown_tool_has_no_route() {
        let router = NotionMcpServer::tool_router();
        assert!(!router.map.contains_key("create_meeting_notes"));
        assert!(router.map.contains_key("search_notion"));
    }

    #[test]
    fn missing_required_argument_names_the_field() {
        let err = serde_json::from_value::<CreatePageParams>(json!({ "title": "x" }))
            .expect_err("parent_id is required");
        assert!(err.to_string().contains("missing field `parent_id`"));

        let err = serde_json::from_value::<GetPageParams>(json!({}))
            .expect_err("page_id is required");
        assert!(err.to_string().contains("missing field `page_id`"));

        let err = serde_json::from_value::<CreateYoutubeScriptParams>(json!({ "keyword": "AI" }))
            .expect_err("script_content is required");
        assert!(err.to_string().contains("missing field `script_content`"));
    }

    #[test]
    fn optional_arguments_may_be_omitted() {
        let params: SearchNotionParams =
            serde_json::from_value(json!({ "query": "notes" })).expect("should deserialize");
        assert!(params.filter_type.is_none());

        let params: UpdatePageParams =
            serde_json::from_value(json!({ "page_id": "p" })).expect("should deserialize");
        assert!(params.title.is_none());
        assert!(params.content.is_none());
    }

    #[tokio::test]
    async fn update_page_without_changes_is_a_no_op() {
        let server = offline_server("notion_mcp_test_tools_noop");
        let result = server
            .update_page(Parameters(UpdatePageParams {
                page_id: "page-123".into(),
                title: None,
                content: None,
            }))
            .await;
        assert_eq!(
            result.expect("no-op should succeed"),
            "Updated page page-123"
        );

        // Empty strings count as nothing to change.
        let result = server
            .update_page(Parameters(UpdatePageParams {
                page_id: "page-123".into(),
                title: Some(String::new()),
                content: Some(String::new()),
            }))
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn object_summary_extracts_title_and_type() {
        let page = json!({
            "object": "page",
            "id": "abc",
            "url": "https://notion.so/abc",
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": "Roadmap" }] }
            }
        });
        let summary = object_summary(&page);
        assert_eq!(summary.id, "abc");
        assert_eq!(summary.object_type, "page");
        assert_eq!(summary.title, "Roadmap");
        assert_eq!(summary.url.as_deref(), Some("https://notion.so/abc"));
    }

    #[tokio::test]
    async fn script_tools_roundtrip() {
        let server = test_server("notion_mcp_test_tools_roundtrip");

        let created = server
            .create_youtube_script(Parameters(CreateYoutubeScriptParams {
                keyword: "AI 기술".into(),
                script_content: "hello".into(),
            }))
            .await
            .expect("create should succeed");
        assert!(created.contains("\"content_length\": 5"));

        let created: serde_json::Value =
            serde_json::from_str(&created).expect("create result is json");
        let filename = created["filename"].as_str().expect("filename").to_string();
        assert!(filename.contains("AI_기술"));

        let listing = server
            .list_youtube_scripts()
            .await
            .expect("list should succeed");
        assert!(listing.contains(&filename));
        assert!(listing.contains("\"count\": 1"));

        let content = server
            .get_youtube_script(Parameters(GetYoutubeScriptParams {
                filename: filename.clone(),
            }))
            .await
            .expect("read should succeed");
        assert!(content.contains("## Script Content\n\nhello\n"));

        let deleted = server
            .delete_youtube_script(Parameters(DeleteYoutubeScriptParams {
                filename: filename.clone(),
            }))
            .await
            .expect("delete should succeed");
        assert!(deleted.contains(&filename));

        let second = server
            .delete_youtube_script(Parameters(DeleteYoutubeScriptParams { filename }))
            .await;
        assert!(second.is_err());
        assert!(second.unwrap_err().contains("not found"));

        std::fs::remove_dir_all(std::env::temp_dir().join("notion_mcp_test_tools_roundtrip")).ok();
    }

    #[tokio::test]
    async fn reading_missing_script_is_an_error_not_a_panic() {
        let server = test_server("notion_mcp_test_tools_missing");
        let result = server
            .get_youtube_script(Parameters(GetYoutubeScriptParams {
                filename: "youtube_shorts_absent_20200101_000000.md".into(),
            }))
            .await;
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("not found"));
    }
}
