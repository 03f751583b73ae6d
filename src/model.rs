// ABOUTME: Serde data models for Notion block responses
// ABOUTME: Tolerant parsing with generic access to per-type rich text

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

/// A Notion block. The type-specific object (`toggle`, `paragraph`,
/// `child_page`, ...) stays in `payload` under the key named by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Block {
    pub fn is_toggle(&self) -> bool {
        self.kind == "toggle"
    }

    pub fn is_child_page(&self) -> bool {
        self.kind == "child_page"
    }

    fn body(&self) -> Option<&Value> {
        self.payload.get(&self.kind)
    }

    /// Rich text of the block's own type object, `None` when absent or empty.
    pub fn rich_text(&self) -> Option<Vec<RichText>> {
        let parts = self.body()?.get("rich_text")?;
        let parts: Vec<RichText> = serde_json::from_value(parts.clone()).ok()?;
        if parts.is_empty() {
            None
        } else {
            Some(parts)
        }
    }

    pub fn plain_text(&self) -> String {
        self.rich_text()
            .map(|parts| {
                parts
                    .iter()
                    .map(|t| t.plain_text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }

    pub fn child_page_title(&self) -> Option<&str> {
        if !self.is_child_page() {
            return None;
        }
        self.body()?.get("title")?.as_str()
    }
}

/// One page of `GET /blocks/{id}/children`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockList {
    #[serde(default)]
    pub results: Vec<Block>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}
