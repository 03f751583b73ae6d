// ABOUTME: Blocking HTTP client for the Notion blocks API
// ABOUTME: Handles throttling, auth headers, cursor pagination and fail-fast errors

use crate::model::{Block, BlockList};
use crate::{Error, Result};
use rand::Rng;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_NOTION_BASE: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

/// Upper bound on pages followed per `fetch_blocks` call.
pub const MAX_PAGES: usize = 10;

fn truncate_str(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((boundary, _)) => format!("{}...", &s[..boundary]),
        None => s.to_string(),
    }
}

pub struct NotionClient {
    client: Client,
    base_url: String,
    token: String,
    throttle_min: u64,
    throttle_max: u64,
}

impl NotionClient {
    pub fn new(token: String, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(NotionClient {
            client,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_NOTION_BASE.into())
                .trim_end_matches('/')
                .to_string(),
            token,
            throttle_min: 100,
            throttle_max: 300,
        })
    }

    pub fn with_throttle(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.throttle_min = min_ms;
        self.throttle_max = max_ms;
        self
    }

    pub fn disable_throttle(mut self) -> Self {
        self.throttle_min = 0;
        self.throttle_max = 0;
        self
    }

    fn throttle(&self) {
        if self.throttle_max > 0 {
            let sleep_ms = rand::thread_rng().gen_range(self.throttle_min..=self.throttle_max);
            std::thread::sleep(Duration::from_millis(sleep_ms));
        }
    }

    fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", NOTION_VERSION)
            .header("Accept", "application/json")
            .header("User-Agent", "classnotes/0.1 (Rust)")
            .send()?;

        self.throttle();

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            let preview = truncate_str(&message, 100);
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message: preview,
            });
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| {
            debug!(
                endpoint,
                body = %truncate_str(&body, 500),
                "failed to parse Notion response"
            );
            Error::Parse(e)
        })
    }

    /// All child blocks of a page or block, following `next_cursor` for at
    /// most [`MAX_PAGES`] pages.
    pub fn fetch_blocks(&self, block_id: &str) -> Result<Vec<Block>> {
        let endpoint = format!("/blocks/{}/children", block_id);
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page: BlockList = match cursor.as_deref() {
                Some(next) => self.get(&endpoint, &[("start_cursor", next)])?,
                None => self.get(&endpoint, &[])?,
            };
            blocks.extend(page.results);

            cursor = page.next_cursor.filter(|c| !c.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        debug!(block_id, count = blocks.len(), "fetched blocks");
        Ok(blocks)
    }
}
