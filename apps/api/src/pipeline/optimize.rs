//! Per-record rewriting. Best effort: a record whose rewrite fails is
//! skipped with a reason, never fatal to the job.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, PLAIN_TEXT_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::batch::RecordSkip;
use crate::models::job::SourceRecord;
use crate::pipeline::prompts::rewrite_prompt;

/// Rewritten text for one source record, plus the keywords it targeted.
/// Lives only for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedContent {
    pub record_id: Uuid,
    pub text: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOptimization {
    Optimized(OptimizedContent),
    Skipped(RecordSkip),
}

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("record has no content to rewrite")]
    EmptySource,

    #[error("rewrite returned no content")]
    EmptyOutput,

    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[async_trait]
pub trait ContentRewriter: Send + Sync {
    async fn rewrite(&self, source_text: &str, keywords: &[String]) -> Result<String, RewriteError>;
}

pub struct LlmRewriter {
    llm: LlmClient,
}

impl LlmRewriter {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ContentRewriter for LlmRewriter {
    async fn rewrite(&self, source_text: &str, keywords: &[String]) -> Result<String, RewriteError> {
        let prompt = rewrite_prompt(GROUNDING_INSTRUCTION, keywords, source_text);
        self.llm
            .call_text(&prompt, PLAIN_TEXT_SYSTEM)
            .await
            .map_err(|e| match e {
                LlmError::EmptyContent => RewriteError::EmptyOutput,
                e => RewriteError::Llm(e),
            })
    }
}

/// Rewrites each record in the given order, one at a time. The result has
/// one entry per record, in the same order.
pub async fn optimize_records(
    rewriter: &dyn ContentRewriter,
    job_id: Uuid,
    records: &[SourceRecord],
    keywords: &[String],
) -> Vec<RecordOptimization> {
    let mut results = Vec::with_capacity(records.len());

    for record in records {
        let outcome = if record.content.trim().is_empty() {
            Err(RewriteError::EmptySource)
        } else {
            rewriter
                .rewrite(&record.content, keywords)
                .await
                .and_then(|text| {
                    if text.trim().is_empty() {
                        Err(RewriteError::EmptyOutput)
                    } else {
                        Ok(text)
                    }
                })
        };

        match outcome {
            Ok(text) => {
                debug!(job_id = %job_id, record_id = %record.id, "record optimised");
                results.push(RecordOptimization::Optimized(OptimizedContent {
                    record_id: record.id,
                    text,
                    keywords: keywords.to_vec(),
                }));
            }
            Err(e) => {
                warn!(job_id = %job_id, record_id = %record.id, "skipping record: {e}");
                results.push(RecordOptimization::Skipped(RecordSkip {
                    record_id: record.id,
                    reason: e.to_string(),
                }));
            }
        }
    }

    results
}

/// Splits optimisation results into the content to assemble and the skips
/// to report, preserving order.
pub fn partition(results: Vec<RecordOptimization>) -> (Vec<OptimizedContent>, Vec<RecordSkip>) {
    let mut optimized = Vec::new();
    let mut skipped = Vec::new();
    for result in results {
        match result {
            RecordOptimization::Optimized(content) => optimized.push(content),
            RecordOptimization::Skipped(skip) => skipped.push(skip),
        }
    }
    (optimized, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRewriter;

    fn record(content: &str) -> SourceRecord {
        SourceRecord {
            id: Uuid::new_v4(),
            title: "Engineer".to_string(),
            organization: "Acme".to_string(),
            time_range: Some("2020 - 2022".to_string()),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_failed_rewrite_is_skipped_not_fatal() {
        let records = vec![record("Built a cache"), record("Ran migrations")];
        let rewriter = FakeRewriter::default().failing_on("Ran migrations");
        let keywords = vec!["Rust".to_string()];

        let results = optimize_records(&rewriter, Uuid::new_v4(), &records, &keywords).await;
        let (optimized, skipped) = partition(results);

        assert_eq!(optimized.len(), 1);
        assert_eq!(optimized[0].record_id, records[0].id);
        assert_eq!(optimized[0].keywords, keywords);
        assert!(optimized[0].text.contains("Built a cache"));
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].record_id, records[1].id);
    }

    #[tokio::test]
    async fn test_blank_record_is_skipped_without_calling_rewriter() {
        let records = vec![record("   ")];
        let rewriter = FakeRewriter::default();

        let results = optimize_records(&rewriter, Uuid::new_v4(), &records, &[]).await;

        assert!(matches!(&results[0], RecordOptimization::Skipped(s) if s.reason.contains("no content")));
        assert_eq!(rewriter.calls(), 0);
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let records = vec![record("first"), record("second"), record("third")];
        let rewriter = FakeRewriter::default();

        let (optimized, _) = partition(optimize_records(&rewriter, Uuid::new_v4(), &records, &[]).await);

        let ids: Vec<Uuid> = optimized.iter().map(|o| o.record_id).collect();
        assert_eq!(ids, records.iter().map(|r| r.id).collect::<Vec<_>>());
    }
}
