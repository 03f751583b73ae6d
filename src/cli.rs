// ABOUTME: Command-line interface definitions using clap
// ABOUTME: Defines subcommands, global flags, and the interactive month prompt

use crate::compile::MIN_NOTES_LEN;
use crate::notion::DEFAULT_NOTION_BASE;
use crate::summary::DEFAULT_MODEL;
use crate::util::Month;
use crate::Result;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "classnotes")]
#[command(about = "Summarize Notion class notes into a monthly markdown file", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Month to compile (YYYY-MM); prompted for when omitted
    #[arg(long, short = 'm', global = true, value_parser = parse_month)]
    pub month: Option<Month>,

    /// Show what would be summarized without calling OpenAI or writing
    #[arg(long, short = 't', visible_alias = "test", global = true)]
    pub dry_run: bool,

    /// Directory holding summaries_YYYY-MM.md
    #[arg(long, global = true, default_value = ".")]
    pub output_dir: PathBuf,

    /// Notion page whose child pages are the students (overrides env)
    #[arg(long, global = true)]
    pub student_list_page: Option<String>,

    /// Notion integration token (overrides env)
    #[arg(long, global = true)]
    pub notion_token: Option<String>,

    /// OpenAI API key (overrides env/keychain)
    #[arg(long, global = true)]
    pub openai_key: Option<String>,

    /// Notion API base URL
    #[arg(long, global = true, default_value = DEFAULT_NOTION_BASE)]
    pub notion_base: String,

    /// OpenAI API base URL
    #[arg(long, global = true)]
    pub openai_base: Option<String>,

    /// Chat model used for summaries
    #[arg(long, global = true, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Minimum note length (characters) worth summarizing
    #[arg(long, global = true, default_value_t = MIN_NOTES_LEN)]
    pub min_notes_len: usize,

    /// Disable throttling (not recommended)
    #[arg(long, global = true)]
    pub no_throttle: bool,

    /// Throttle range in ms (min:max)
    #[arg(long, global = true, value_parser = parse_throttle_range)]
    pub throttle_ms: Option<(u64, u64)>,

    /// Debug-level logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Log level or filter directive (e.g. "trace", "classnotes=debug,reqwest=info")
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

fn parse_month(s: &str) -> std::result::Result<Month, String> {
    Month::parse(s).map_err(|e| e.to_string())
}

fn parse_throttle_range(s: &str) -> std::result::Result<(u64, u64), String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err("Expected format: min:max".into());
    }

    let min = parts[0].parse().map_err(|_| "Invalid min value")?;
    let max = parts[1].parse().map_err(|_| "Invalid max value")?;

    if min > max {
        return Err("min must be <= max".into());
    }

    Ok((min, max))
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Fetch notes and write summaries for the month (default)
    Compile,

    /// Print the summaries already stored for the month
    List,

    /// Store the OpenAI API key in the macOS keychain
    SetApiKey {
        /// OpenAI API key
        key: String,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Compile)
    }
}

/// Asks for a month on `output`, reading the answer from `input`. An empty
/// answer picks `default`.
pub fn prompt_month<R: BufRead, W: Write>(input: &mut R, output: &mut W, default: Month) -> Result<Month> {
    write!(output, "Enter the month to filter (YYYY-MM) [{}]: ", default)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(default);
    }
    Month::parse(answer)
}
