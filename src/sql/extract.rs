//! SQL Extractor - recovers a candidate statement from free-text completion

use crate::error::{PipelineError, PipelineResult};
use crate::sql::CandidateSql;
use once_cell::sync::Lazy;
use regex::Regex;

/// Fenced code block, optionally tagged with the dialect name
static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(?:sql)?\s*(.*?)\s*```").expect("fence regex"));

/// First SELECT or WITH token through to the end of the text
static STATEMENT_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\b(?:SELECT|WITH)\b.*").expect("statement regex"));

/// Locate the candidate SQL statement inside a raw completion.
///
/// If the completion contains a fenced block the interior is used; otherwise
/// the whole text. The candidate runs from the first case-insensitive
/// SELECT/WITH token to the end of the text. Leading prose is discarded;
/// trailing prose, if the model appended any, stays in the candidate and is
/// rejected later by the parse stage rather than stripped here. A single
/// trailing statement terminator is removed.
pub fn extract_statement(raw: &str) -> PipelineResult<CandidateSql> {
    let text = raw.trim();

    let body = match FENCE.captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(text),
        None => text,
    };

    let stmt = STATEMENT_START
        .find(body)
        .ok_or(PipelineError::NoStatementFound)?
        .as_str();

    // Exactly one trailing terminator is stripped; interior terminators are
    // the validator's concern, not this stage's.
    let stmt = stmt.trim();
    let stmt = stmt.strip_suffix(';').unwrap_or(stmt).trim_end();
    if stmt.is_empty() {
        return Err(PipelineError::NoStatementFound);
    }

    Ok(CandidateSql(stmt.to_string()))
}
