//! MCP server bridging the Notion API and a local script workspace.
//!
//! Exposes eleven tools: seven forwarding to Notion (search, page
//! retrieval/creation/update, database query/insert) and four managing
//! generated YouTube Shorts script files in a single local directory.

use crate::scripts::ScriptStore;
use notion_api::NotionClient;
use rmcp::{
    ServerHandler,
    handler::server::router::tool::ToolRouter,
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool_handler,
};
pub mod config;
pub mod scripts;
pub mod tools;

/// MCP server exposing Notion document tools and local script file tools.
#[derive(Clone)]
pub struct NotionMcpServer {
    pub(crate) notion: NotionClient,
    pub(crate) scripts: ScriptStore,
    pub(crate) tool_router: ToolRouter<Self>,
}

#[tool_handler]
impl ServerHandler for NotionMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "notion-mcp".into(),
                title: Some("Notion MCP Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Notion server providing page, database, and YouTube Shorts script tools.".into(),
            ),
        }
    }
}
