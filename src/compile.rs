// ABOUTME: Core compile logic: student pages → dated toggles → notes → summaries
// ABOUTME: Decides what to summarize, tracks stats, and rewrites the summary file

use crate::{
    model::Block,
    notion::NotionClient,
    store::{build_summary_header, is_placeholder, placeholder_text, SummaryBook},
    summary::Summarizer,
    util::{contains_date, extract_date_from_text, Month},
    Result,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Notes shorter than this (in characters) get a placeholder instead of a summary.
pub const MIN_NOTES_LEN: usize = 30;

/// Anything that can list the child blocks of a Notion page or block.
pub trait BlockSource {
    fn fetch_blocks(&self, block_id: &str) -> Result<Vec<Block>>;
}

impl BlockSource for NotionClient {
    fn fetch_blocks(&self, block_id: &str) -> Result<Vec<Block>> {
        NotionClient::fetch_blocks(self, block_id)
    }
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub student_list_page_id: String,
    pub month: Month,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub min_notes_len: usize,
}

impl CompileOptions {
    pub fn new(student_list_page_id: impl Into<String>, month: Month) -> Self {
        CompileOptions {
            student_list_page_id: student_list_page_id.into(),
            month,
            output_dir: PathBuf::from("."),
            dry_run: false,
            min_notes_len: MIN_NOTES_LEN,
        }
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(self.month.summary_file_name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub students: usize,
    pub notes_entries: usize,
    pub skipped_existing: usize,
    pub placeholders: usize,
    pub summarized: usize,
    pub titles_updated: usize,
    pub written: Option<PathBuf>,
}

impl CompileStats {
    /// One-line run summary, e.g. `DONE: students=3, entries=5, ...`.
    pub fn report(&self, dry_run: bool) -> String {
        let mode = if dry_run { "DRY RUN" } else { "DONE" };
        let mut line = format!(
            "{}: students={}, entries={}, skipped={}, summarized={}, placeholders={}, titles_updated={}",
            mode,
            self.students,
            self.notes_entries,
            self.skipped_existing,
            self.summarized,
            self.placeholders,
            self.titles_updated
        );
        if let Some(path) = &self.written {
            line.push_str(&format!(", wrote={}", path.display()));
        }
        line
    }
}

/// Notes found under one dated toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNote {
    pub date: String,
    pub class_line: String,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAction {
    KeepExisting,
    DryRunSkip,
    WritePlaceholder,
    Summarize,
}

/// A stored summary is kept unless it is a placeholder and the notes have
/// since become long enough.
pub fn decide(existing: Option<&str>, has_enough_notes: bool, dry_run: bool) -> NoteAction {
    match existing {
        Some(summary) if !is_placeholder(summary) || !has_enough_notes => NoteAction::KeepExisting,
        _ if dry_run => NoteAction::DryRunSkip,
        _ if has_enough_notes => NoteAction::Summarize,
        _ => NoteAction::WritePlaceholder,
    }
}

pub fn student_pages(source: &dyn BlockSource, list_page_id: &str) -> Result<Vec<Block>> {
    let blocks = source.fetch_blocks(list_page_id)?;
    Ok(blocks.into_iter().filter(Block::is_child_page).collect())
}

fn has_dated_title(block: &Block) -> bool {
    block.rich_text().map_or(false, |parts| {
        parts.iter().any(|part| contains_date(&part.plain_text))
    })
}

/// Dated toggles inside `month` on a student's page, with their notes.
pub fn class_notes(
    source: &dyn BlockSource,
    page: &Block,
    student: &str,
    month: Month,
) -> Vec<ClassNote> {
    let blocks = match source.fetch_blocks(&page.id) {
        Ok(blocks) => blocks,
        Err(e) => {
            warn!(student, error = %e, "failed to fetch student page, skipping");
            return Vec::new();
        }
    };

    blocks
        .iter()
        .filter(|b| b.is_toggle() && has_dated_title(b))
        .filter_map(|toggle| notes_from_toggle(source, toggle, student, month))
        .collect()
}

fn notes_from_toggle(
    source: &dyn BlockSource,
    toggle: &Block,
    student: &str,
    month: Month,
) -> Option<ClassNote> {
    let title = toggle.plain_text();
    let date = extract_date_from_text(&title)?;
    if !month.contains(&date) {
        return None;
    }

    let children = match source.fetch_blocks(&toggle.id) {
        Ok(children) => children,
        Err(e) => {
            warn!(student, date = %date.full, error = %e, "failed to fetch class notes");
            return None;
        }
    };
    if children.is_empty() {
        info!(block_id = %toggle.id, student, date = %date.full, "no children found for block");
        return None;
    }

    let notes = children
        .iter()
        .map(Block::plain_text)
        .collect::<Vec<_>>()
        .join("\n");

    Some(ClassNote {
        date: date.full,
        class_line: title.trim().to_string(),
        notes,
    })
}

fn refresh_title(
    book: &mut SummaryBook,
    student: &str,
    date: &str,
    header: &str,
    stats: &mut CompileStats,
) {
    if book.update_title(student, date, header) {
        info!(student, date, title = header, "updated title");
        stats.titles_updated += 1;
    }
}

fn apply_note(
    book: &mut SummaryBook,
    summarizer: &dyn Summarizer,
    student: &str,
    note: &ClassNote,
    options: &CompileOptions,
    stats: &mut CompileStats,
) {
    let header = build_summary_header(&note.date, &note.class_line);
    let has_enough_notes = note.notes.chars().count() >= options.min_notes_len;
    let existing = book
        .existing_summary(student, &note.date, &header)
        .map(str::to_string);

    match decide(existing.as_deref(), has_enough_notes, options.dry_run) {
        NoteAction::KeepExisting => {
            refresh_title(book, student, &note.date, &header, stats);
            stats.skipped_existing += 1;
        }
        NoteAction::DryRunSkip => {
            refresh_title(book, student, &note.date, &header, stats);
            debug!(student, date = %note.date, has_enough_notes, "dry run, not summarizing");
        }
        NoteAction::WritePlaceholder => {
            book.add(student, &note.date, &header, &placeholder_text(&note.notes));
            stats.placeholders += 1;
        }
        NoteAction::Summarize => {
            let summary = summarizer.summarize(&note.notes).unwrap_or_else(|e| {
                warn!(student, date = %note.date, error = %e, "summarization failed, keeping raw notes");
                note.notes.clone()
            });
            book.add(student, &note.date, &header, &summary);
            stats.summarized += 1;
        }
    }
}

pub fn compile_summaries(
    source: &dyn BlockSource,
    summarizer: &dyn Summarizer,
    options: &CompileOptions,
) -> Result<CompileStats> {
    info!(month = %options.month, "fetching student list");
    let students = student_pages(source, &options.student_list_page_id)?;

    let mut stats = CompileStats {
        students: students.len(),
        ..Default::default()
    };
    if students.is_empty() {
        warn!("no student pages found under the student list page");
        return Ok(stats);
    }

    let path = options.summary_path();
    let mut book = SummaryBook::read(&path)?;

    let pb = ProgressBar::new(students.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40}] {pos}/{len} students {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );

    for page in &students {
        let title = page.child_page_title().map(str::trim);
        let Some(student) = title.filter(|name| !name.is_empty()) else {
            warn!(page_id = %page.id, "student page without a title, skipping");
            pb.inc(1);
            continue;
        };
        pb.set_message(student.to_string());

        let notes = class_notes(source, page, student, options.month);
        stats.notes_entries += notes.len();
        for note in &notes {
            apply_note(&mut book, summarizer, student, note, options, &mut stats);
        }

        pb.inc(1);
    }
    pb.finish_and_clear();

    if !options.dry_run {
        book.write(&path, &options.output_dir)?;
        stats.written = Some(path);
    }

    Ok(stats)
}
