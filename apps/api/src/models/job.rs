use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One resume-generation target: a job description plus its derived analysis
/// and the pointer to the last successfully persisted artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    #[serde(alias = "company")]
    pub organization: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub key_sentences: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub artifact_url: Option<String>,
    #[serde(default)]
    pub artifact_filename: Option<String>,
}

/// A contributing experience entry. Read-only to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "company")]
    pub organization: String,
    /// Free-form range such as "2021 - Present" or "Mar 2019 – Jun 2021".
    #[serde(default, alias = "time")]
    pub time_range: Option<String>,
    pub content: String,
}

/// A single column of the job record. Each variant is persisted by its own
/// UPDATE; there is no cross-field transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum JobField {
    ArtifactUrl(String),
    ArtifactFilename(String),
    KeySentences(Vec<String>),
    Keywords(Vec<String>),
}

impl JobField {
    pub fn column(&self) -> &'static str {
        match self {
            JobField::ArtifactUrl(_) => "artifact_url",
            JobField::ArtifactFilename(_) => "artifact_filename",
            JobField::KeySentences(_) => "key_sentences",
            JobField::Keywords(_) => "keywords",
        }
    }
}

fn year_pattern() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"\d{4}").expect("year pattern is valid"))
}

/// Ordering key for a record's time range: the last four-digit year it
/// mentions. Open-ended ranges rank as `current_year`; ranges without a
/// year rank as 0.
pub fn end_year(time_range: Option<&str>, current_year: i32) -> i32 {
    let Some(range) = time_range else {
        return 0;
    };
    let lower = range.to_lowercase();
    if lower.contains("present") || lower.contains("current") {
        return current_year;
    }
    year_pattern()
        .find_iter(range)
        .last()
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Sorts records most-recent-first. Stable, so records sharing an end year
/// keep their input order.
pub fn sort_most_recent_first(records: &mut [SourceRecord], current_year: i32) {
    records.sort_by_key(|r| std::cmp::Reverse(end_year(r.time_range.as_deref(), current_year)));
}
