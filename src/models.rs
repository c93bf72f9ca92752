//! Data models for the portal snapshots.
//!
//! This module contains the records written to the news and spaces
//! snapshots, plus the small enums derived from upstream labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a news record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Jira,
    Confluence,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Jira => write!(f, "Jira"),
            Source::Confluence => write!(f, "Confluence"),
        }
    }
}

/// CSS tag class shown next to a news record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagClass {
    /// Change requests ("Mudança")
    #[serde(rename = "tag-mudanca")]
    Mudanca,
    /// Incidents
    #[serde(rename = "tag-incidente")]
    Incidente,
    /// Anything else coming from the issue tracker
    #[serde(rename = "tag-servico")]
    Servico,
    /// Pages published on Confluence
    #[serde(rename = "tag-comunicado")]
    Comunicado,
}

impl TagClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagClass::Mudanca => "tag-mudanca",
            TagClass::Incidente => "tag-incidente",
            TagClass::Servico => "tag-servico",
            TagClass::Comunicado => "tag-comunicado",
        }
    }
}

impl fmt::Display for TagClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colored status dot shown next to a news record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusDot {
    /// Green
    #[serde(rename = "dot-success")]
    Success,
    /// Orange
    #[serde(rename = "dot-warning")]
    Warning,
    /// Blue
    #[serde(rename = "dot-info")]
    Info,
}

impl StatusDot {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusDot::Success => "dot-success",
            StatusDot::Warning => "dot-warning",
            StatusDot::Info => "dot-info",
        }
    }
}

impl fmt::Display for StatusDot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the news snapshot.
///
/// Field order is the serialization order the front end was written against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub source: Source,
    /// Issue key for Jira, page id for Confluence.
    pub key: String,
    pub title: String,
    pub type_name: String,
    pub tag_class: TagClass,
    pub status_name: String,
    pub status_dot: StatusDot,
    /// `dd/mm/yyyy[ HH:MM]`, or the raw 10-char prefix when unparseable.
    pub date: String,
    pub url: String,
}

/// One entry of the spaces snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceSummary {
    pub name: String,
    pub key: String,
    pub url: String,
    pub icon: String,
    pub description: String,
    pub latest_title: String,
    pub latest_url: String,
}

/// Outcome of looking up the most recent content of a space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestContent {
    Found { title: String, url: String },
    Empty,
    Failed(String),
}

impl LatestContent {
    /// Title and URL to display, falling back to the given placeholder.
    pub fn display<'a>(&'a self, placeholder: &'a str, space_url: &'a str) -> (&'a str, &'a str) {
        match self {
            LatestContent::Found { title, url } => (title.as_str(), url.as_str()),
            LatestContent::Empty | LatestContent::Failed(_) => (placeholder, space_url),
        }
    }
}

/// Number of records a single source contributed to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}

impl fmt::Display for SourceCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.count)
    }
}
