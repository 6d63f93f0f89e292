//! Wire and record types for jira-harvest
//!
//! The upstream payloads are modeled as a schema where every nested field is
//! optional, so missing intermediate objects (`fields`, `status`, `assignee`,
//! a comment's `author`) decode to `None` instead of failing. Extraction into
//! the persisted [`IssueRecord`] is therefore null-safe by construction: the
//! crawler never rejects an issue for a missing field, it only records the
//! absence.

use serde::{Deserialize, Serialize};

/// Minimal issue identifier returned by the search endpoint
///
/// Only the key is used; it drives the per-issue enrichment fetch.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IssueSummary {
    /// Project-scoped issue key, e.g. `"HADOOP-10001"`
    pub key: String,
}

/// One page of the remote issue listing
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchPage {
    /// Issue summaries in this page; empty means the listing is exhausted
    #[serde(default)]
    pub issues: Vec<IssueSummary>,

    /// Total matching issues; may be absent on the first response
    #[serde(default)]
    pub total: Option<u64>,
}

/// Full issue payload from the detail endpoint
#[derive(Clone, Debug, Default, Deserialize)]
pub struct IssueDetail {
    /// Issue key as reported by the detail endpoint
    #[serde(default)]
    pub key: Option<String>,

    /// Nested field container; absent in degenerate payloads
    #[serde(default)]
    pub fields: Option<IssueFields>,
}

/// The `fields` object of an issue detail payload
#[derive(Clone, Debug, Default, Deserialize)]
pub struct IssueFields {
    /// Issue title
    #[serde(default)]
    pub summary: Option<String>,

    /// Workflow status
    #[serde(default)]
    pub status: Option<Named>,

    /// Priority
    #[serde(default)]
    pub priority: Option<Named>,

    /// The user who created the issue
    #[serde(default)]
    pub creator: Option<User>,

    /// The assigned user, if any
    #[serde(default)]
    pub assignee: Option<User>,

    /// Owning project
    #[serde(default)]
    pub project: Option<ProjectRef>,

    /// Free-form labels
    #[serde(default)]
    pub labels: Vec<String>,

    /// Creation timestamp, passed through as an opaque string
    #[serde(default)]
    pub created: Option<String>,

    /// Last-update timestamp, passed through as an opaque string
    #[serde(default)]
    pub updated: Option<String>,

    /// Issue description (may contain rendered HTML)
    #[serde(default)]
    pub description: Option<String>,

    /// Comment container
    #[serde(default)]
    pub comment: Option<CommentList>,
}

/// An object whose only interesting property is its `name` (status, priority)
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Named {
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

/// A user reference (creator, assignee, comment author)
#[derive(Clone, Debug, Default, Deserialize)]
pub struct User {
    /// Human-readable name
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,
}

/// A project reference inside issue fields
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProjectRef {
    /// Project key, e.g. `"HADOOP"`
    #[serde(default)]
    pub key: Option<String>,
}

/// The `comment` container inside issue fields
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CommentList {
    /// Comments in remote order
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

/// One comment as returned by the detail endpoint
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawComment {
    /// Comment author
    #[serde(default)]
    pub author: Option<User>,

    /// Plain comment body
    #[serde(default)]
    pub body: Option<String>,

    /// HTML-rendered comment body, present when rendering was requested
    #[serde(default, rename = "renderedBody")]
    pub rendered_body: Option<String>,

    /// Creation timestamp
    #[serde(default)]
    pub created: Option<String>,
}

/// One persisted comment inside an [`IssueRecord`]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CommentRecord {
    /// Author display name
    pub author: Option<String>,

    /// Comment body; the HTML-rendered form wins over the plain form when
    /// both are present
    pub body_html: Option<String>,

    /// Creation timestamp
    pub created_at: Option<String>,
}

/// The persisted unit: one issue with its fields and comments
///
/// Constructed once from a successful enrichment fetch, appended exactly once
/// to the sink, and never mutated afterwards. Serialized as a single compact
/// JSON line.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IssueRecord {
    /// Issue key, e.g. `"HADOOP-10001"`
    pub key: String,

    /// Owning project key; falls back to the crawl's project when the
    /// payload omits it
    pub project: String,

    /// Issue title
    pub title: Option<String>,

    /// Workflow status name
    pub status: Option<String>,

    /// Priority name
    pub priority: Option<String>,

    /// Reporter display name (the `creator` field upstream)
    pub reporter: Option<String>,

    /// Assignee display name
    pub assignee: Option<String>,

    /// Free-form labels
    pub labels: Vec<String>,

    /// Creation timestamp as reported upstream
    pub created_at: Option<String>,

    /// Last-update timestamp as reported upstream
    pub updated_at: Option<String>,

    /// Issue description, empty string when absent
    pub description: String,

    /// Comments in remote order
    pub comments: Vec<CommentRecord>,

    /// Browse URL for the issue
    pub source_url: String,
}

impl IssueRecord {
    /// Build a record from a detail payload
    ///
    /// `issue_key` is the key from the search summary, used when the detail
    /// payload omits its own; `project_key` is the crawl's project, used when
    /// `fields.project.key` is absent. Every nested access tolerates missing
    /// intermediate objects.
    pub fn from_detail(
        detail: &IssueDetail,
        issue_key: &str,
        project_key: &str,
        base_url: &str,
    ) -> Self {
        let key = detail.key.clone().unwrap_or_else(|| issue_key.to_string());
        let fields = detail.fields.as_ref();

        let comments = fields
            .and_then(|f| f.comment.as_ref())
            .map(|c| c.comments.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|c| CommentRecord {
                author: c
                    .author
                    .as_ref()
                    .and_then(|a| a.display_name.clone()),
                body_html: c.rendered_body.clone().or_else(|| c.body.clone()),
                created_at: c.created.clone(),
            })
            .collect();

        Self {
            source_url: format!("{}/browse/{}", base_url.trim_end_matches('/'), key),
            project: fields
                .and_then(|f| f.project.as_ref())
                .and_then(|p| p.key.clone())
                .unwrap_or_else(|| project_key.to_string()),
            title: fields.and_then(|f| f.summary.clone()),
            status: fields
                .and_then(|f| f.status.as_ref())
                .and_then(|s| s.name.clone()),
            priority: fields
                .and_then(|f| f.priority.as_ref())
                .and_then(|p| p.name.clone()),
            reporter: fields
                .and_then(|f| f.creator.as_ref())
                .and_then(|u| u.display_name.clone()),
            assignee: fields
                .and_then(|f| f.assignee.as_ref())
                .and_then(|u| u.display_name.clone()),
            labels: fields.map(|f| f.labels.clone()).unwrap_or_default(),
            created_at: fields.and_then(|f| f.created.clone()),
            updated_at: fields.and_then(|f| f.updated.clone()),
            description: fields
                .and_then(|f| f.description.clone())
                .unwrap_or_default(),
            comments,
            key,
        }
    }
}
