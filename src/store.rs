// ABOUTME: Markdown summary file store grouped by student and class date
// ABOUTME: Parses, renders and atomically rewrites the "# Student / ## Date" layout

use crate::util::{extract_date_from_text, names_match};
use crate::Result;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Prefix of the summary stored when a class has too few notes to summarize.
pub const PLACEHOLDER_PREFIX: &str = "NOT ENOUGH NOTES";

pub fn placeholder_text(notes: &str) -> String {
    format!("{} {}", PLACEHOLDER_PREFIX, notes)
}

pub fn is_placeholder(summary: &str) -> bool {
    summary.starts_with(PLACEHOLDER_PREFIX)
}

/// Heading text for a class entry. The class line already carries the date in
/// the usual case; otherwise the date is prepended so the entry stays keyed.
pub fn build_summary_header(date: &str, class_line: &str) -> String {
    let class_line = class_line.trim();
    if class_line.is_empty() {
        date.to_string()
    } else if class_line.contains(date) {
        class_line.to_string()
    } else {
        format!("{} {}", date, class_line)
    }
}

/// Date an entry heading is filed under: its first date, else the whole text.
fn heading_date(heading: &str) -> String {
    extract_date_from_text(heading)
        .map(|d| d.full)
        .unwrap_or_else(|| heading.to_string())
}

/// Body lines that would read back as headings get a leading backslash.
fn escape_body_line(line: &str) -> String {
    if line.trim_start_matches('\\').starts_with('#') {
        format!("\\{}", line)
    } else {
        line.to_string()
    }
}

fn unescape_body_line(line: &str) -> &str {
    match line.strip_prefix('\\') {
        Some(rest) if rest.trim_start_matches('\\').starts_with('#') => rest,
        _ => line,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub date: String,
    pub title: String,
    pub summary: String,
}

/// One `# Student` section. Several classes may share a date; they are told
/// apart by title.
#[derive(Debug, Clone)]
pub struct StudentSection {
    pub name: String,
    entries: Vec<SummaryEntry>,
}

impl PartialEq for StudentSection {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.entries() == other.entries()
    }
}

impl Eq for StudentSection {}

impl StudentSection {
    fn new(name: &str) -> Self {
        StudentSection {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    /// Entries ordered by date, then title.
    pub fn entries(&self) -> Vec<&SummaryEntry> {
        let mut entries: Vec<&SummaryEntry> = self.entries.iter().collect();
        entries.sort_by(|a, b| (&a.date, &a.title).cmp(&(&b.date, &b.title)));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for the class `title` on `date`. A heading holding only the date
    /// (older files) stands in for any class that day without its own entry.
    fn position(&self, date: &str, title: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.date == date && e.title == title)
            .or_else(|| {
                self.entries
                    .iter()
                    .position(|e| e.date == date && e.title == date)
            })
    }

    fn upsert(&mut self, entry: SummaryEntry) {
        match self.position(&entry.date, &entry.title) {
            Some(idx) => self.entries[idx] = entry,
            None => self.entries.push(entry),
        }
    }
}

/// In-memory form of a summary file. Students keep first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryBook {
    students: Vec<StudentSection>,
}

struct OpenEntry<'a> {
    heading: &'a str,
    lines: Vec<&'a str>,
}

impl SummaryBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `path`, treating a missing file as an empty book.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "summary file missing, starting empty");
            return Ok(Self::new());
        }

        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut book = Self::new();
        let mut student: Option<usize> = None;
        let mut entry: Option<OpenEntry> = None;

        for line in text.lines() {
            if let Some(name) = student_heading(line) {
                book.close_entry(student, entry.take());
                student = Some(book.section_index_or_insert(name));
            } else if let Some(heading) = entry_heading(line) {
                book.close_entry(student, entry.take());
                if student.is_some() {
                    entry = Some(OpenEntry {
                        heading,
                        lines: Vec::new(),
                    });
                }
            } else if let Some(open) = entry.as_mut() {
                open.lines.push(unescape_body_line(line));
            }
        }
        book.close_entry(student, entry.take());

        book
    }

    fn close_entry(&mut self, student: Option<usize>, entry: Option<OpenEntry>) {
        let (Some(idx), Some(entry)) = (student, entry) else {
            return;
        };

        let section = &mut self.students[idx];
        let entry = SummaryEntry {
            date: heading_date(entry.heading),
            title: entry.heading.to_string(),
            summary: entry.lines.join("\n").trim().to_string(),
        };
        match section
            .entries
            .iter()
            .position(|e| e.date == entry.date && e.title == entry.title)
        {
            Some(existing) => section.entries[existing] = entry,
            None => section.entries.push(entry),
        }
    }

    fn section_index(&self, student: &str) -> Option<usize> {
        self.students
            .iter()
            .position(|section| names_match(&section.name, student))
    }

    fn section_index_or_insert(&mut self, student: &str) -> usize {
        if let Some(idx) = self.section_index(student) {
            return idx;
        }
        self.students.push(StudentSection::new(student));
        self.students.len() - 1
    }

    pub fn students(&self) -> &[StudentSection] {
        &self.students
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.students.iter().map(StudentSection::len).sum()
    }

    /// Name under which `student` is already stored, matched fuzzily.
    pub fn find_student_key(&self, student: &str) -> Option<&str> {
        self.section_index(student)
            .map(|idx| self.students[idx].name.as_str())
    }

    pub fn get(&self, student: &str, date: &str, title: &str) -> Option<&SummaryEntry> {
        let section = &self.students[self.section_index(student)?];
        section.position(date, title).map(|idx| &section.entries[idx])
    }

    pub fn get_mut(&mut self, student: &str, date: &str, title: &str) -> Option<&mut SummaryEntry> {
        let idx = self.section_index(student)?;
        let section = &mut self.students[idx];
        let pos = section.position(date, title)?;
        Some(&mut section.entries[pos])
    }

    /// Summary text for a class, `None` when missing or empty.
    pub fn existing_summary(&self, student: &str, date: &str, title: &str) -> Option<&str> {
        self.get(student, date, title)
            .map(|entry| entry.summary.as_str())
            .filter(|summary| !summary.is_empty())
    }

    pub fn summary_exists(&self, student: &str, date: &str, title: &str) -> bool {
        self.existing_summary(student, date, title).is_some()
    }

    /// Gives a date-only entry the class title. Returns whether it changed.
    pub fn update_title(&mut self, student: &str, date: &str, title: &str) -> bool {
        match self.get_mut(student, date, title) {
            Some(entry) if entry.title != title => {
                entry.title = title.to_string();
                true
            }
            _ => false,
        }
    }

    /// Inserts or replaces a summary, reusing a fuzzily matching student.
    pub fn add(&mut self, student: &str, date: &str, title: &str, summary: &str) {
        let idx = self.section_index_or_insert(student);
        self.students[idx].upsert(SummaryEntry {
            date: date.to_string(),
            title: title.to_string(),
            summary: summary.trim().to_string(),
        });
        info!(student, date, title, summary, "added summary");
    }

    pub fn render(&self) -> String {
        let mut text = String::new();
        for section in &self.students {
            text.push_str(&format!("# {}\n", section.name));
            for entry in section.entries() {
                let body = entry
                    .summary
                    .lines()
                    .map(escape_body_line)
                    .collect::<Vec<_>>()
                    .join("\n");
                text.push_str(&format!("## {}\n{}\n\n", entry.title, body));
            }
        }
        format!("{}\n", text.trim())
    }

    /// Writes the rendered book through a temp file in `tmp_dir`.
    pub fn write(&self, path: &Path, tmp_dir: &Path) -> Result<()> {
        write_atomic(path, self.render().as_bytes(), tmp_dir)
    }
}

fn student_heading(line: &str) -> Option<&str> {
    line.strip_prefix("# ")
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

fn entry_heading(line: &str) -> Option<&str> {
    line.strip_prefix("## ")
        .map(str::trim)
        .filter(|heading| !heading.is_empty())
}

/// Replaces `path` via a temp file in `tmp_dir`, keeping the mode of the file
/// being replaced.
pub fn write_atomic(path: &Path, content: &[u8], tmp_dir: &Path) -> Result<()> {
    use rand::Rng;

    fs::create_dir_all(tmp_dir)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // Create temp file
    let random: u32 = rand::thread_rng().gen();
    let tmp_path = tmp_dir.join(format!(".{:x}.part", random));
    let previous_perms = fs::metadata(path).ok().map(|meta| meta.permissions());

    let result = fs::write(&tmp_path, content)
        .and_then(|_| match previous_perms {
            Some(perms) => fs::set_permissions(&tmp_path, perms),
            None => Ok(()),
        })
        .and_then(|_| fs::rename(&tmp_path, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(())
}



#[cfg(test)]
mod file_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let book = SummaryBook::read(&temp.path().join("summaries_2025-03.md")).unwrap();
        assert!(book.is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("summaries_2025-03.md");

        let mut book = SummaryBook::new();
        book.add("Ana", "2025-03-02", "2025-03-02 Class", "Greetings, numbers");
        book.write(&path, temp.path()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "# Ana\n## 2025-03-02 Class\nGreetings, numbers\n");
        assert_eq!(SummaryBook::read(&path).unwrap(), book);
    }

    #[test]
    #[cfg(unix)]
    fn test_write_atomic_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let target = temp.path().join("out.md");
        fs::write(&target, "old").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o640)).unwrap();

        write_atomic(&target, b"hello", temp.path()).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "hello");
        let perms = fs::metadata(&target).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o640);
    }

    #[test]
    fn test_write_atomic_failed_rename_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let tmp_dir = temp.path().join("tmp");
        let target = temp.path().join("taken");
        fs::create_dir_all(target.join("inner")).unwrap();

        assert!(write_atomic(&target, b"hello", &tmp_dir).is_err());
        assert_eq!(fs::read_dir(&tmp_dir).unwrap().count(), 0);
        assert!(target.is_dir());
    }
}
