//! Raw-to-processed transform
//!
//! Turns the crawler's raw JSONL into the normalized dataset: HTML bodies
//! become plain text, and each record gains a `derived_summary` and a small
//! set of heuristic question/answer pairs. All transforms here are pure and
//! stateless; the file pass streams line by line.

use crate::error::Result;
use crate::types::IssueRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{info, warn};

/// One derived question/answer pair
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Qa {
    /// Question
    pub q: String,
    /// Answer, possibly empty
    pub a: String,
}

/// A comment with its body normalized to plain text
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProcessedComment {
    /// Author display name
    pub author: Option<String>,
    /// Plain-text body
    pub body: String,
    /// Creation timestamp
    pub created_at: Option<String>,
}

/// One record of the processed dataset
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProcessedRecord {
    /// Issue key
    pub id: String,
    /// Project key
    pub project: String,
    /// Issue title, empty string when absent
    pub title: String,
    /// Workflow status name
    pub status: Option<String>,
    /// Priority name
    pub priority: Option<String>,
    /// Reporter display name
    pub reporter: Option<String>,
    /// Assignee display name
    pub assignee: Option<String>,
    /// Free-form labels
    pub labels: Vec<String>,
    /// Creation timestamp
    pub created_at: Option<String>,
    /// Last-update timestamp
    pub updated_at: Option<String>,
    /// Plain-text description
    pub description: String,
    /// Comments with plain-text bodies
    pub comments: Vec<ProcessedComment>,
    /// Browse URL
    pub source_url: String,
    /// Short summary derived from the description (or title)
    pub derived_summary: String,
    /// Heuristic question/answer pairs
    pub derived_qas: Vec<Qa>,
}

// Patterns are compile-time constants, so construction cannot fail
#[allow(clippy::expect_used)]
fn block_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)</?(?:p|br|div|li|ul|ol|tr|table|h[1-6]|blockquote|pre)[^>]*>")
            .expect("valid pattern")
    })
}

#[allow(clippy::expect_used)]
fn any_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]+>").expect("valid pattern"))
}

#[allow(clippy::expect_used)]
fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s+\n").expect("valid pattern"))
}

#[allow(clippy::expect_used)]
fn error_mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)error|exception|stack").expect("valid pattern"))
}

#[allow(clippy::expect_used)]
fn error_sentence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)([^.]*error[^.]*)").expect("valid pattern"))
}

/// Convert rendered HTML to plain text
///
/// Block-level tags become newlines, remaining tags are stripped, common
/// entities are decoded, and runs of blank lines collapse to one blank line.
pub fn html_to_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let text = block_tag_re().replace_all(html, "\n");
    let text = any_tag_re().replace_all(&text, "");
    let text = decode_entities(&text);
    let text = blank_run_re().replace_all(&text, "\n\n");
    text.trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Produce a one-line summary of at most `max_len` characters
///
/// Prefers to cut at the last sentence boundary in the window, as long as
/// that keeps more than half of the budget; otherwise hard-truncates with an
/// ellipsis.
pub fn summarize(text: &str, max_len: usize) -> String {
    let flat = text.trim().replace('\n', " ");
    if flat.chars().count() <= max_len {
        return flat;
    }
    let window: String = flat.chars().take(max_len).collect();
    if let Some(idx) = window.rfind('.') {
        if window[..idx].chars().count() > max_len / 2 {
            return window[..=idx].to_string();
        }
    }
    format!("{}...", window.trim_end())
}

/// Derive heuristic question/answer pairs from a plain-text description
pub fn derive_qas(description: &str) -> Vec<Qa> {
    let mut qas = Vec::new();

    let desc = description.trim();
    if !desc.is_empty() {
        let first_sentence = desc.split('.').next().unwrap_or("").trim();
        qas.push(Qa {
            q: "What is the main issue?".to_string(),
            a: first_sentence.to_string(),
        });
    }

    if error_mention_re().is_match(description) {
        let snippet = error_sentence_re()
            .captures(description)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default();
        qas.push(Qa {
            q: "What error or log is reported?".to_string(),
            a: if snippet.is_empty() {
                "See comments or logs.".to_string()
            } else {
                snippet
            },
        });
    }

    qas.push(Qa {
        q: "Who reported this issue?".to_string(),
        a: String::new(),
    });
    qas
}

/// Transform one raw record into its processed form
pub fn transform_record(raw: &IssueRecord) -> ProcessedRecord {
    let description = html_to_text(&raw.description);
    let title = raw.title.clone().unwrap_or_default();

    let comments = raw
        .comments
        .iter()
        .map(|c| ProcessedComment {
            author: c.author.clone(),
            body: html_to_text(c.body_html.as_deref().unwrap_or_default()),
            created_at: c.created_at.clone(),
        })
        .collect();

    let summary_source = if description.is_empty() {
        title.as_str()
    } else {
        description.as_str()
    };

    ProcessedRecord {
        id: raw.key.clone(),
        project: raw.project.clone(),
        derived_summary: summarize(summary_source, 200),
        derived_qas: derive_qas(&description),
        status: raw.status.clone(),
        priority: raw.priority.clone(),
        reporter: raw.reporter.clone(),
        assignee: raw.assignee.clone(),
        labels: raw.labels.clone(),
        created_at: raw.created_at.clone(),
        updated_at: raw.updated_at.clone(),
        source_url: raw.source_url.clone(),
        comments,
        description,
        title,
    }
}

/// Transform `{PROJECT}_raw.jsonl` into `{PROJECT}_processed.jsonl`
///
/// Streams the raw sink line by line; lines that fail to parse or transform
/// are logged and skipped so one bad record cannot stop the pass. Returns
/// the number of records written.
///
/// # Errors
/// Fails when the input file is missing or the output cannot be written.
pub async fn transform_project(project: &str, output_dir: &Path) -> Result<u64> {
    let in_path = output_dir.join(format!("{project}_raw.jsonl"));
    let out_path = output_dir.join(format!("{project}_processed.jsonl"));

    let input = File::open(&in_path).await?;
    let mut writer = BufWriter::new(File::create(&out_path).await?);

    let mut lines = BufReader::new(input).lines();
    let mut count = 0u64;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let raw: IssueRecord = match serde_json::from_str(&line) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(project, error = %e, "skipping unparseable raw line");
                continue;
            }
        };
        let processed = transform_record(&raw);
        let mut out = serde_json::to_vec(&processed)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        count += 1;
    }
    writer.flush().await?;

    info!(
        project,
        records = count,
        output = %out_path.display(),
        "transform complete"
    );
    Ok(count)
}
