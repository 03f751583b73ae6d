// ABOUTME: Credential and id discovery with precedence chain
// ABOUTME: CLI flag → environment (.env honored) → macOS keychain for OpenAI

use crate::summary::get_api_key_from_keychain;
use crate::{Error, Result};
use std::env;
use std::path::PathBuf;

pub const NOTION_TOKEN_VAR: &str = "NOTION_API_KEY";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const STUDENT_LIST_PAGE_VAR: &str = "STUDENT_LIST_PAGE_ID";

/// Loads `.env` from the working directory or its parents. Returns the file
/// used, or `None` when there is none. Runs before logging is set up, so the
/// caller reports the outcome.
pub fn load_dotenv() -> dotenvy::Result<Option<PathBuf>> {
    dotenv_outcome(dotenvy::dotenv())
}

fn dotenv_outcome(result: dotenvy::Result<PathBuf>) -> dotenvy::Result<Option<PathBuf>> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

fn flag_or_env(flag: Option<String>, var: &str) -> Option<String> {
    flag.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            env::var(var)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
}

pub fn resolve_notion_token(cli_token: Option<String>) -> Result<String> {
    flag_or_env(cli_token, NOTION_TOKEN_VAR).ok_or_else(|| {
        Error::Auth(format!(
            "No Notion token found. Provide via --notion-token or {} env var",
            NOTION_TOKEN_VAR
        ))
    })
}

pub fn resolve_openai_key(cli_key: Option<String>) -> Result<String> {
    if let Some(key) = flag_or_env(cli_key, OPENAI_KEY_VAR) {
        return Ok(key);
    }

    get_api_key_from_keychain().map_err(|e| {
        Error::Auth(format!(
            "No OpenAI API key found. Provide via --openai-key, {} env var, or keychain ({})",
            OPENAI_KEY_VAR, e
        ))
    })
}

pub fn resolve_student_list_page(cli_page: Option<String>) -> Result<String> {
    flag_or_env(cli_page, STUDENT_LIST_PAGE_VAR).ok_or_else(|| {
        Error::Config(format!(
            "No student list page id. Provide via --student-list-page or {} env var",
            STUDENT_LIST_PAGE_VAR
        ))
    })
}
