//! Job analysis — distils a job description into key sentences and a
//! keyword set that steer the per-record rewrites.
//!
//! `PipelineDeps` holds an `Arc<dyn JobAnalyzer>`; `LlmJobAnalyzer` is the
//! production backend.

use std::collections::HashSet;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::llm_client::prompts::PLAIN_TEXT_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};
use crate::models::job::Job;
use crate::pipeline::prompts::{key_sentences_prompt, keywords_prompt};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAnalysis {
    pub key_sentences: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("job has no description to analyse")]
    EmptyDescription,

    #[error("no {0} found in model output")]
    EmptyResult(&'static str),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[async_trait]
pub trait JobAnalyzer: Send + Sync {
    async fn analyze(&self, job: &Job) -> Result<JobAnalysis, AnalysisError>;
}

/// Two chained completions: key sentences first, then keyword groups derived
/// from those sentences.
pub struct LlmJobAnalyzer {
    llm: LlmClient,
}

impl LlmJobAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl JobAnalyzer for LlmJobAnalyzer {
    async fn analyze(&self, job: &Job) -> Result<JobAnalysis, AnalysisError> {
        if job.description.trim().is_empty() {
            return Err(AnalysisError::EmptyDescription);
        }

        let raw = self
            .llm
            .call_text(&key_sentences_prompt(&job.title, &job.description), PLAIN_TEXT_SYSTEM)
            .await?;
        let key_sentences = parse_numbered_list(&raw);
        if key_sentences.is_empty() {
            return Err(AnalysisError::EmptyResult("key sentences"));
        }

        let raw = self
            .llm
            .call_text(&keywords_prompt(&job.title, &key_sentences), PLAIN_TEXT_SYSTEM)
            .await?;
        let keywords = parse_numbered_list(&raw);
        if keywords.is_empty() {
            return Err(AnalysisError::EmptyResult("keywords"));
        }

        debug!(
            job_id = %job.id,
            "analysis produced {} key sentences, {} keywords",
            key_sentences.len(),
            keywords.len()
        );

        Ok(JobAnalysis {
            key_sentences,
            keywords,
        })
    }
}

fn numbered_item() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*\d+[.)]\s+(.+?)\s*$").expect("numbered item pattern is valid")
    })
}

/// Collects the items of every numbered list in `text`, in order. Group
/// headings and prose lines are ignored; duplicates (case-insensitive) keep
/// their first occurrence.
pub fn parse_numbered_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .filter_map(|line| numbered_item().captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_matches(|c| c == '*' || c == '"').trim().to_string())
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbered_list_reads_sentences() {
        let text = "Here you go:\n1. Design distributed systems.\n2) Mentor engineers.\n\n3.   Own on-call.";
        assert_eq!(
            parse_numbered_list(text),
            vec!["Design distributed systems.", "Mentor engineers.", "Own on-call."]
        );
    }

    #[test]
    fn test_parse_numbered_list_flattens_keyword_groups() {
        let text = "Group 1: Backend\n1. Rust\n2. Kafka\n3. PostgreSQL\n\nGroup 2: Cloud\n1. AWS\n2. rust\n3. Terraform";
        assert_eq!(
            parse_numbered_list(text),
            vec!["Rust", "Kafka", "PostgreSQL", "AWS", "Terraform"]
        );
    }

    #[test]
    fn test_parse_numbered_list_strips_emphasis_markers() {
        assert_eq!(parse_numbered_list("1. **Go**"), vec!["Go"]);
    }

    #[test]
    fn test_parse_numbered_list_ignores_unnumbered_text() {
        assert!(parse_numbered_list("Rust, Go and SQL").is_empty());
    }
}
