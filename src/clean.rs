//! Tabular cleaning pass over a processed JSONL file
//!
//! Normalizes whitespace, drops records without a title, and deduplicates by
//! title (first occurrence wins). Operates on generic JSON objects so it can
//! run over either the raw or the processed dataset.

use crate::error::Result;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{info, warn};

/// Counters from one cleaning pass
#[derive(Clone, Copy, Debug, Default)]
pub struct CleanSummary {
    /// Lines read from the input
    pub read: u64,
    /// Records written to the output
    pub written: u64,
    /// Records dropped for a missing or non-string title
    pub dropped_missing_title: u64,
    /// Records dropped as duplicate titles
    pub dropped_duplicates: u64,
}

#[allow(clippy::expect_used)]
fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid pattern"))
}

/// Clean `input` into `output`
///
/// Unparseable lines are skipped with a warning; everything else is
/// normalized in place and rewritten one JSON object per line.
///
/// # Errors
/// Fails when the input cannot be read or the output cannot be written.
pub async fn clean_file(input: &Path, output: &Path) -> Result<CleanSummary> {
    let mut lines = BufReader::new(File::open(input).await?).lines();
    let mut writer = BufWriter::new(File::create(output).await?);

    let mut summary = CleanSummary::default();
    let mut seen_titles: HashSet<String> = HashSet::new();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        summary.read += 1;

        let mut record: Value = match serde_json::from_str(&line) {
            Ok(Value::Object(map)) => Value::Object(map),
            Ok(_) => {
                warn!("skipping non-object line");
                continue;
            }
            Err(e) => {
                warn!(error = %e, "skipping unparseable line");
                continue;
            }
        };

        let title = record
            .get("title")
            .and_then(Value::as_str)
            .map(str::trim)
            .map(String::from);
        let Some(title) = title else {
            summary.dropped_missing_title += 1;
            continue;
        };
        if !seen_titles.insert(title.clone()) {
            summary.dropped_duplicates += 1;
            continue;
        }

        if let Some(obj) = record.as_object_mut() {
            obj.insert("title".to_string(), Value::String(title));
            if let Some(description) = obj.get("description").and_then(Value::as_str) {
                let collapsed = whitespace_re().replace_all(description, " ");
                obj.insert(
                    "description".to_string(),
                    Value::String(collapsed.trim().to_string()),
                );
            }
        }

        let mut out = serde_json::to_vec(&record)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        summary.written += 1;
    }
    writer.flush().await?;

    info!(
        read = summary.read,
        written = summary.written,
        dropped_missing_title = summary.dropped_missing_title,
        dropped_duplicates = summary.dropped_duplicates,
        output = %output.display(),
        "clean complete"
    );
    Ok(summary)
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn run_clean(lines: &str) -> (CleanSummary, Vec<Value>) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.jsonl");
        let output = dir.path().join("out.jsonl");
        tokio::fs::write(&input, lines).await.unwrap();

        let summary = clean_file(&input, &output).await.unwrap();
        let records = std::fs::read_to_string(&output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (summary, records)
    }

    #[tokio::test]
    async fn duplicate_titles_keep_the_first_record() {
        let (summary, records) = run_clean(concat!(
            "{\"title\": \"Crash on start\", \"id\": \"A-1\"}\n",
            "{\"title\": \"Crash on start\", \"id\": \"A-2\"}\n",
            "{\"title\": \"Other bug\", \"id\": \"A-3\"}\n",
        ))
        .await;

        assert_eq!(summary.written, 2);
        assert_eq!(summary.dropped_duplicates, 1);
        assert_eq!(records[0]["id"], "A-1");
        assert_eq!(records[1]["id"], "A-3");
    }

    #[tokio::test]
    async fn records_without_a_title_are_dropped() {
        let (summary, records) = run_clean(concat!(
            "{\"id\": \"A-1\"}\n",
            "{\"title\": null, \"id\": \"A-2\"}\n",
            "{\"title\": \"Kept\", \"id\": \"A-3\"}\n",
        ))
        .await;

        assert_eq!(summary.dropped_missing_title, 2);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "A-3");
    }

    #[tokio::test]
    async fn whitespace_is_normalized() {
        let (_, records) = run_clean(
            "{\"title\": \"  padded  \", \"description\": \"one\\n\\ttwo   three \"}\n",
        )
        .await;

        assert_eq!(records[0]["title"], "padded");
        assert_eq!(records[0]["description"], "one two three");
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let (summary, records) =
            run_clean("{\"title\": \"Good\"}\n{{{nope\n[1, 2]\n").await;

        assert_eq!(summary.read, 3);
        assert_eq!(summary.written, 1);
        assert_eq!(records.len(), 1);
    }
}
