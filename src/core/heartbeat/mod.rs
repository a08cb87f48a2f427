//! Checklist extraction and the non-destructive merge of the skill's task
//! template into the user's `HEARTBEAT.md`.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

pub const HEARTBEAT_FILE: &str = "HEARTBEAT.md";
pub const DEFAULT_SECTION_HEADING: &str = "## ClawFriend Tasks";

/// Written once when the user has no heartbeat file yet.
pub const FILE_HEADER: &str = "# HEARTBEAT.md\n\n\
Periodic tasks for this agent. Edit freely: setup only appends tasks that are missing.\n\n";

/// Bundled copy of the skill template, written by `clawfriend install`.
pub const BUNDLED_TEMPLATE: &str = include_str!("../../../templates/HEARTBEAT.md");

static CHECKBOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[ xX]\]\s*(.*)").expect("checkbox pattern is valid"));

static SECTION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^(#{1,6})[ \t]*ClawFriend[ \t]+(?:Maintenance|Tasks)\b.*$")
        .expect("section heading pattern is valid")
});

static ANY_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s").expect("heading pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub identifier: String,
    pub full_line: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub content: String,
    pub added_count: usize,
    pub created: bool,
}

/// Normalised de-duplication key: the description up to the first `(` or
/// dash, trimmed and lowercased.
pub fn task_identifier(description: &str) -> String {
    description
        .split(['(', '-', '–', '—'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

pub fn extract_tasks(markdown: &str) -> Vec<TaskRecord> {
    markdown
        .lines()
        .filter_map(|line| {
            let caps = CHECKBOX.captures(line)?;
            let description = caps.get(1)?.as_str();
            let identifier = task_identifier(description);
            if identifier.is_empty() {
                return None;
            }
            Some(TaskRecord {
                identifier,
                full_line: line.trim_end().to_string(),
            })
        })
        .collect()
}

/// The part of a template that gets merged: the ClawFriend task section up to
/// the next heading of the same or a higher level, or the whole template when
/// it has no such section.
pub fn template_task_section(template: &str) -> &str {
    let Some(caps) = SECTION_HEADING.captures(template) else {
        return template;
    };
    let (Some(whole), Some(hashes)) = (caps.get(0), caps.get(1)) else {
        return template;
    };
    let level = hashes.as_str().len();
    let start = whole.start();

    let mut offset = whole.end();
    for line in template[whole.end()..].split_inclusive('\n') {
        if let Some(h) = ANY_HEADING.captures(line)
            && h.get(1).is_some_and(|m| m.as_str().len() <= level)
            && offset > whole.end()
        {
            return &template[start..offset];
        }
        offset += line.len();
    }
    &template[start..]
}

pub fn merge_tasks(existing: Option<&str>, template_section: &str) -> MergeOutcome {
    let Some(existing) = existing else {
        let mut content = String::from(FILE_HEADER);
        content.push_str(template_section);
        if !content.ends_with('\n') {
            content.push('\n');
        }
        return MergeOutcome {
            content,
            added_count: extract_tasks(template_section).len(),
            created: true,
        };
    };

    let known: HashSet<String> = extract_tasks(existing)
        .into_iter()
        .map(|t| t.identifier)
        .collect();

    let mut seen = HashSet::new();
    let new_lines: Vec<String> = extract_tasks(template_section)
        .into_iter()
        .filter(|t| !known.contains(&t.identifier) && seen.insert(t.identifier.clone()))
        .map(|t| t.full_line)
        .collect();

    if new_lines.is_empty() {
        return MergeOutcome {
            content: existing.to_string(),
            added_count: 0,
            created: false,
        };
    }

    let block = new_lines.join("\n");
    let content = match SECTION_HEADING.find(existing) {
        Some(heading) => {
            let at = heading.end();
            let mut out = String::with_capacity(existing.len() + block.len() + 2);
            out.push_str(&existing[..at]);
            out.push('\n');
            out.push_str(&block);
            if at < existing.len() {
                out.push_str(&existing[at..]);
            } else {
                out.push('\n');
            }
            out
        }
        None => {
            let mut out = existing.to_string();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
            out.push_str(DEFAULT_SECTION_HEADING);
            out.push('\n');
            out.push_str(&block);
            out.push('\n');
            out
        }
    };

    MergeOutcome {
        content,
        added_count: new_lines.len(),
        created: false,
    }
}
