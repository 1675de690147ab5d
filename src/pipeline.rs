//! Query Pipeline - orchestrates generation, validation, and execution
//!
//! Per-request flow is strictly sequential: prompt -> completion ->
//! extraction -> policy validation -> limit enforcement -> guarded
//! execution. Every failure aborts the request immediately; nothing retries
//! and no partial results leave the database boundary.

use crate::config::ExecutionPolicy;
use crate::db::{Database, ResultRow};
use crate::error::PipelineResult;
use crate::llm::{CompletionClient, PromptBuilder};
use crate::sql::{extract_statement, BoundedSql, LimitEnforcer, PolicyValidator};

/// Output mode of a question
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AskMode {
    /// Tabular rows returned as JSON
    Text,
    /// Bar chart image with the SQL in a side channel
    Visual,
}

/// One answered question: the SQL that ran and the rows it produced
pub struct PipelineOutcome {
    pub sql: BoundedSql,
    pub rows: Vec<ResultRow>,
}

/// The validation and guarded-execution pipeline.
///
/// Holds the immutable policy plus the two external collaborators (the
/// completion client and the database handle). Shared read-only across
/// requests.
pub struct QueryPipeline {
    policy: ExecutionPolicy,
    prompt_builder: PromptBuilder,
    completion: CompletionClient,
    validator: PolicyValidator,
    enforcer: LimitEnforcer,
    database: Database,
}

impl QueryPipeline {
    pub fn new(
        policy: ExecutionPolicy,
        completion: CompletionClient,
        database: Database,
    ) -> PipelineResult<Self> {
        let validator = PolicyValidator::new(&policy)?;
        Ok(Self {
            policy,
            prompt_builder: PromptBuilder::new(),
            completion,
            validator,
            enforcer: LimitEnforcer::new(),
            database,
        })
    }

    pub fn ceiling(&self, mode: AskMode) -> usize {
        match mode {
            AskMode::Text => self.policy.max_rows_text,
            AskMode::Visual => self.policy.max_rows_visual,
        }
    }

    /// Answer a question end to end.
    pub async fn ask(&self, question: &str, mode: AskMode) -> PipelineResult<PipelineOutcome> {
        let ceiling = self.ceiling(mode);

        let prompt = self.prompt_builder.build(question, mode);
        let completion = self.completion.complete(&prompt).await?;
        tracing::debug!(chars = completion.len(), "received completion");

        let candidate = extract_statement(&completion)?;
        let validated = self.validator.validate(&candidate)?;
        let bounded = self.enforcer.bound(validated, ceiling);
        tracing::info!(sql = %bounded, ?mode, "executing generated query");

        let rows = self.database.execute(&bounded, ceiling).await?;
        tracing::info!(rows = rows.len(), "query complete");

        Ok(PipelineOutcome { sql: bounded, rows })
    }
}
