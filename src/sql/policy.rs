//! Policy Validator - fail-fast checks that gate candidate SQL before execution
//!
//! Two-stage design: cheap textual checks reject the common-case attack
//! early, then a full dialect-aware parse acts as the authoritative backstop
//! for anything the regexes cannot reason about (unusual whitespace, encoded
//! tokens, trailing prose). The stages run in a fixed order and the first
//! failure wins.

use crate::config::ExecutionPolicy;
use crate::error::{PipelineError, PipelineResult, PolicyViolationKind};
use crate::sql::{CandidateSql, ValidatedSql};
use regex::Regex;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

/// Validates candidate SQL against the process-wide execution policy.
///
/// Construct once at startup; all regexes are compiled up front from the
/// policy's keyword and schema sets.
pub struct PolicyValidator {
    forbidden_keywords: Regex,
    forbidden_schemas: Regex,
    read_statement: Regex,
    allowed_table: Regex,
}

fn word_alternation(words: &[String]) -> String {
    words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|")
}

impl PolicyValidator {
    pub fn new(policy: &ExecutionPolicy) -> PipelineResult<Self> {
        let forbidden_keywords = Regex::new(&format!(
            r"(?i)\b(?:{})\b",
            word_alternation(&policy.forbidden_keywords)
        ))
        .map_err(|e| PipelineError::Config(format!("keyword pattern: {}", e)))?;

        let forbidden_schemas = Regex::new(&format!(
            r"(?i)\b(?:{})\b",
            word_alternation(&policy.forbidden_schemas)
        ))
        .map_err(|e| PipelineError::Config(format!("schema pattern: {}", e)))?;

        let read_statement = Regex::new(r"(?i)^(?:SELECT|WITH)\b")
            .map_err(|e| PipelineError::Config(format!("read pattern: {}", e)))?;

        // FROM/JOIN followed by the fully qualified allowed table
        let allowed_table = Regex::new(&format!(
            r"(?i)\b(?:FROM|JOIN)\s+{}\b",
            regex::escape(&policy.allowed_table)
        ))
        .map_err(|e| PipelineError::Config(format!("table pattern: {}", e)))?;

        Ok(Self {
            forbidden_keywords,
            forbidden_schemas,
            read_statement,
            allowed_table,
        })
    }

    /// Run every stage in order; the surviving text is the only
    /// representation allowed to reach the limit enforcer and executor.
    pub fn validate(&self, candidate: &CandidateSql) -> PipelineResult<ValidatedSql> {
        let sql = candidate.as_str().trim();
        let sql = sql.strip_suffix(';').unwrap_or(sql).trim_end();

        // 1. Statement smuggling: any terminator left means a second statement
        if sql.contains(';') {
            return Err(PipelineError::violation(
                PolicyViolationKind::MultipleStatements,
            ));
        }

        // 2. Comments can hide a second statement or split a keyword
        if sql.contains("--") || sql.contains("/*") || sql.contains("*/") {
            return Err(PipelineError::violation(
                PolicyViolationKind::CommentsPresent,
            ));
        }

        // 3. Whole-word match only, so a column named "updated" never trips
        if let Some(m) = self.forbidden_keywords.find(sql) {
            return Err(PipelineError::violation(
                PolicyViolationKind::ForbiddenKeyword(m.as_str().to_lowercase()),
            ));
        }

        // 4. Catalog schemas enable introspection
        if let Some(m) = self.forbidden_schemas.find(sql) {
            return Err(PipelineError::violation(
                PolicyViolationKind::ForbiddenSchema(m.as_str().to_lowercase()),
            ));
        }

        // 5. Read-only statements only
        if !self.read_statement.is_match(sql) {
            return Err(PipelineError::violation(
                PolicyViolationKind::NotReadStatement,
            ));
        }

        // 6. Single-table scope
        if !self.allowed_table.is_match(sql) {
            return Err(PipelineError::violation(PolicyViolationKind::WrongTable));
        }

        // 7. Authoritative structural parse; also re-confirms there is
        // exactly one statement in case the textual checks were evaded
        let statements = Parser::parse_sql(&PostgreSqlDialect {}, sql).map_err(|e| {
            PipelineError::violation(PolicyViolationKind::SyntaxInvalid(e.to_string()))
        })?;
        if statements.len() != 1 {
            return Err(PipelineError::violation(
                PolicyViolationKind::MultipleStatements,
            ));
        }

        Ok(ValidatedSql(sql.to_string()))
    }
}
