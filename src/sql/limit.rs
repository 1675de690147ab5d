//! Limit Enforcer - guarantees a row ceiling on every validated statement

use crate::sql::{BoundedSql, ValidatedSql};
use once_cell::sync::Lazy;
use regex::Regex;

static LIMIT_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bLIMIT\s+(\d+)\b").expect("limit regex"));

/// Rewrites or appends a LIMIT clause so the statement never requests more
/// than the per-mode ceiling.
///
/// Only the first textual occurrence of a limit pattern is considered
/// authoritative. A limit buried in a subquery ahead of the outer clause is
/// not distinguished from the outer limit; this is a known limitation of the
/// textual rewrite, and the executor's fetch-side cap backstops it.
pub struct LimitEnforcer;

impl LimitEnforcer {
    pub fn new() -> Self {
        Self
    }

    /// Bound `sql` to at most `ceiling` rows. Idempotent: applying the same
    /// ceiling twice yields the same statement.
    pub fn bound(&self, sql: ValidatedSql, ceiling: usize) -> BoundedSql {
        let text = sql.0;

        if let Some(caps) = LIMIT_CLAUSE.captures(&text) {
            let whole = caps.get(0).expect("match");
            // A value too large for usize is certainly above the ceiling
            let requested = caps[1].parse::<usize>().unwrap_or(usize::MAX);
            if requested > ceiling {
                let mut rewritten = String::with_capacity(text.len());
                rewritten.push_str(&text[..whole.start()]);
                rewritten.push_str(&format!("LIMIT {}", ceiling));
                rewritten.push_str(&text[whole.end()..]);
                return BoundedSql(rewritten);
            }
            return BoundedSql(text);
        }

        BoundedSql(format!("{}\nLIMIT {}", text, ceiling))
    }
}

impl Default for LimitEnforcer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validated(sql: &str) -> ValidatedSql {
        ValidatedSql(sql.to_string())
    }

    #[test]
    fn test_append_when_absent() {
        let bounded = LimitEnforcer::new().bound(validated("SELECT name FROM public.rawg_games"), 50);
        assert_eq!(
            bounded.as_str(),
            "SELECT name FROM public.rawg_games\nLIMIT 50"
        );
    }

    #[test]
    fn test_rewrite_when_above_ceiling() {
        let bounded = LimitEnforcer::new().bound(
            validated("SELECT name FROM public.rawg_games LIMIT 500"),
            200,
        );
        assert_eq!(
            bounded.as_str(),
            "SELECT name FROM public.rawg_games LIMIT 200"
        );
    }

    #[test]
    fn test_keep_when_at_or_below_ceiling() {
        let enforcer = LimitEnforcer::new();
        let kept = enforcer.bound(validated("SELECT name FROM public.rawg_games LIMIT 10"), 50);
        assert_eq!(kept.as_str(), "SELECT name FROM public.rawg_games LIMIT 10");

        let exact = enforcer.bound(validated("SELECT name FROM public.rawg_games LIMIT 50"), 50);
        assert_eq!(exact.as_str(), "SELECT name FROM public.rawg_games LIMIT 50");
    }

    #[test]
    fn test_case_insensitive_match() {
        let bounded = LimitEnforcer::new().bound(
            validated("SELECT name FROM public.rawg_games limit 9999"),
            50,
        );
        assert_eq!(
            bounded.as_str(),
            "SELECT name FROM public.rawg_games LIMIT 50"
        );
    }

    #[test]
    fn test_idempotent() {
        let enforcer = LimitEnforcer::new();
        let once = enforcer.bound(validated("SELECT name FROM public.rawg_games LIMIT 500"), 200);
        let twice = enforcer.bound(ValidatedSql(once.as_str().to_string()), 200);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_huge_literal_rewritten() {
        let bounded = LimitEnforcer::new().bound(
            validated("SELECT name FROM public.rawg_games LIMIT 99999999999999999999999"),
            50,
        );
        assert_eq!(
            bounded.as_str(),
            "SELECT name FROM public.rawg_games LIMIT 50"
        );
    }

    #[test]
    fn test_first_occurrence_is_authoritative() {
        // Documented limitation: a subquery limit ahead of the outer clause
        // is the one rewritten. The fetch-side cap still bounds the result.
        let bounded = LimitEnforcer::new().bound(
            validated(
                "SELECT * FROM (SELECT name FROM public.rawg_games LIMIT 1000) t LIMIT 900",
            ),
            200,
        );
        assert_eq!(
            bounded.as_str(),
            "SELECT * FROM (SELECT name FROM public.rawg_games LIMIT 200) t LIMIT 900"
        );
    }
}
