//! Conversions between Notion block objects and plain Markdown.
//!
//! Notion stores page content as typed block objects carrying rich-text runs.
//! The server only needs a flat Markdown view of them: one line per block on
//! the way out, one block per line on the way in.

use crate::{NotionClient, NotionError};
use serde_json::{Value, json};
use std::future::Future;

/// Wrap a plain title string into the API's structured title property.
pub fn title_property(title: &str) -> Value {
    json!({ "title": { "title": [{ "text": { "content": title } }] } })
}

/// Extract the title of a page or database object.
///
/// Pages carry their title as the property whose type is `title`; databases
/// carry a top-level `title` rich-text array. Falls back to `"Untitled"`.
pub fn extract_title(object: &Value) -> String {
    if let Some(properties) = object.get("properties").and_then(Value::as_object) {
        for property in properties.values() {
            if property.get("type").and_then(Value::as_str) == Some("title") {
                if let Some(runs) = property.get("title").and_then(Value::as_array) {
                    if !runs.is_empty() {
                        return plain_text(runs);
                    }
                }
            }
        }
    }
    if let Some(runs) = object.get("title").and_then(Value::as_array) {
        if !runs.is_empty() {
            return plain_text(runs);
        }
    }
    "Untitled".to_string()
}

/// Concatenate the `plain_text` of each rich-text run.
pub fn plain_text(rich_text: &[Value]) -> String {
    rich_text
        .iter()
        .filter_map(|run| run.get("plain_text").and_then(Value::as_str))
        .collect()
}

/// Convert Markdown-ish text into Notion blocks, one block per non-empty line.
///
/// `# `, `## `, and `### ` prefixes become headings, `- ` becomes a bulleted
/// list item, and every other line becomes a paragraph.
pub fn markdown_to_blocks(text: &str) -> Vec<Value> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let block = if let Some(rest) = line.strip_prefix("# ") {
                text_block("heading_1", rest)
            } else if let Some(rest) = line.strip_prefix("## ") {
                text_block("heading_2", rest)
            } else if let Some(rest) = line.strip_prefix("### ") {
                text_block("heading_3", rest)
            } else if let Some(rest) = line.strip_prefix("- ") {
                text_block("bulleted_list_item", rest)
            } else {
                text_block("paragraph", line)
            };
            Some(block)
        })
        .collect()
}

/// Build a block of the given type holding a single rich-text run.
fn text_block(block_type: &str, content: &str) -> Value {
    let mut block = serde_json::Map::new();
    block.insert("object".into(), Value::String("block".into()));
    block.insert("type".into(), Value::String(block_type.into()));
    block.insert(
        block_type.into(),
        json!({ "rich_text": [{ "type": "text", "text": { "content": content } }] }),
    );
    Value::Object(block)
}

/// Render blocks to Markdown, fetching children of nested blocks.
pub fn blocks_to_markdown<'a>(
    client: &'a NotionClient,
    blocks: Vec<Value>,
) -> std::pin::Pin<Box<dyn Future<Output = Result<String, NotionError>> + Send + 'a>> {
    Box::pin(async move {
        let mut parts = Vec::new();
        for block in &blocks {
            if let Some(text) = render_block(block) {
                parts.push(text);
            }
            if block.get("has_children").and_then(Value::as_bool) == Some(true) {
                if let Some(id) = block.get("id").and_then(Value::as_str) {
                    let children = client.list_block_children(id).await?;
                    let child_text = blocks_to_markdown(client, children.results).await?;
                    if !child_text.is_empty() {
                        parts.push(child_text);
                    }
                }
            }
        }
        Ok(parts.join("\n\n"))
    })
}

/// Render one block to a Markdown line. Unknown block types render as nothing.
fn render_block(block: &Value) -> Option<String> {
    let block_type = block.get("type").and_then(Value::as_str)?;
    let payload = block.get(block_type)?;
    let text = payload
        .get("rich_text")
        .and_then(Value::as_array)
        .map(|runs| plain_text(runs))
        .unwrap_or_default();

    let rendered = match block_type {
        "paragraph" => text,
        "heading_1" => format!("# {text}"),
        "heading_2" => format!("## {text}"),
        "heading_3" => format!("### {text}"),
        "bulleted_list_item" => format!("- {text}"),
        "numbered_list_item" => format!("1. {text}"),
        "to_do" => {
            let checked = payload.get("checked").and_then(Value::as_bool).unwrap_or(false);
            let marker = if checked { "[x]" } else { "[ ]" };
            format!("{marker} {text}")
        }
        "code" => {
            let language = payload.get("language").and_then(Value::as_str).unwrap_or("");
            format!("```{language}\n{text}\n```")
        }
        _ => return None,
    };
    Some(rendered)
}

#[cfg(test)]
mod tests {
    use super::{extract_title, markdown_to_blocks, plain_text, title_property};
    use crate::{NOTION_VERSION, NotionClient};
    use serde_json::{Value, json};

    fn text_run(text: &str) -> Value {
        json!({ "type": "text", "plain_text": text })
    }

    #[test]
    fn extracts_page_title_from_properties() {
        let page = json!({
            "object": "page",
            "properties": {
                "Name": { "type": "title", "title": [text_run("Weekly "), text_run("Plan")] },
                "Status": { "type": "select" }
            }
        });
        assert_eq!(extract_title(&page), "Weekly Plan");
    }

    #[test]
    fn extracts_database_title() {
        let database = json!({ "object": "database", "title": [text_run("Tasks")] });
        assert_eq!(extract_title(&database), "Tasks");
    }

    #[test]
    fn falls_back_to_untitled() {
        assert_eq!(extract_title(&json!({ "object": "page" })), "Untitled");
        assert_eq!(
            extract_title(&json!({ "properties": { "Name": { "type": "title", "title": [] } } })),
            "Untitled"
        );
    }

    #[test]
    fn plain_text_joins_runs() {
        let runs = vec![text_run("a"), text_run("b"), json!({ "type": "mention" })];
        assert_eq!(plain_text(&runs), "ab");
    }

    #[test]
    fn title_property_shape() {
        assert_eq!(
            title_property("Hello"),
            json!({ "title": { "title": [{ "text": { "content": "Hello" } }] } })
        );
    }

    #[test]
    fn markdown_lines_become_blocks() {
        let blocks = markdown_to_blocks("# Title\n\nSome text\n- item\n### Sub");
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0]["type"], "heading_1");
        assert_eq!(
            blocks[0]["heading_1"]["rich_text"][0]["text"]["content"],
            "Title"
        );
        assert_eq!(blocks[1]["type"], "paragraph");
        assert_eq!(blocks[2]["type"], "bulleted_list_item");
        assert_eq!(blocks[3]["type"], "heading_3");
    }

    #[tokio::test]
    async fn renders_flat_blocks() {
        // No block has children, so the client is never called.
        let client = NotionClient::with_base_url("test-token", "http://localhost:9");
        let blocks = vec![
            json!({ "type": "heading_1", "heading_1": { "rich_text": [text_run("Title")] } }),
            json!({ "type": "paragraph", "paragraph": { "rich_text": [text_run("Body")] } }),
            json!({ "type": "to_do", "to_do": { "rich_text": [text_run("Ship it")], "checked": true } }),
            json!({ "type": "code", "code": { "rich_text": [text_run("let x = 1;")], "language": "rust" } }),
            json!({ "type": "unsupported_widget" }),
        ];
        let text = super::blocks_to_markdown(&client, blocks)
            .await
            .expect("should render");
        assert_eq!(
            text,
            "# Title\n\nBody\n\n[x] Ship it\n\n```rust\nlet x = 1;\n```"
        );
    }

    #[tokio::test]
    async fn fetches_and_appends_child_blocks() {
        let mut server = mockito::Server::new_async().await;
        let first_children = server
            .mock("GET", "/v1/blocks/parent-1/children")
            .match_header("Notion-Version", NOTION_VERSION)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "object": "list",
                    "results": [
                        { "type": "paragraph", "paragraph": { "rich_text": [text_run("Child line")] } },
                        { "type": "unsupported_widget" }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;
        // parent-2's children render to nothing, so nothing is appended for it.
        let second_children = server
            .mock("GET", "/v1/blocks/parent-2/children")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({ "object": "list", "results": [{ "type": "unsupported_widget" }] })
                    .to_string(),
            )
            .create_async()
            .await;

        let client = NotionClient::with_base_url("test-token", server.url());
        let blocks = vec![
            json!({
                "id": "parent-1",
                "type": "bulleted_list_item",
                "bulleted_list_item": { "rich_text": [text_run("Parent item")] },
                "has_children": true
            }),
            json!({
                "id": "parent-2",
                "type": "paragraph",
                "paragraph": { "rich_text": [text_run("Tail")] },
                "has_children": true
            }),
        ];
        let text = super::blocks_to_markdown(&client, blocks)
            .await
            .expect("should render");
        assert_eq!(text, "- Parent item\n\nChild line\n\nTail");
        first_children.assert_async().await;
        second_children.assert_async().await;
    }
}
