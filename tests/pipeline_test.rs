/// Integration tests for the guarded SQL pipeline
/// Exercises the pure stages end to end: extraction -> validation -> limit
/// enforcement, plus the visual-mode shaping path, without a live model or
/// database.
use rawg_insight::chart;
use rawg_insight::config::ExecutionPolicy;
use rawg_insight::db::{ResultRow, SqlValue};
use rawg_insight::error::{PipelineError, PolicyViolationKind};
use rawg_insight::llm::PromptBuilder;
use rawg_insight::pipeline::AskMode;
use rawg_insight::sql::{extract_statement, LimitEnforcer, PolicyValidator};

fn validator() -> PolicyValidator {
    PolicyValidator::new(&ExecutionPolicy::default()).unwrap()
}

#[test]
fn test_fenced_completion_end_to_end() {
    // The canonical happy path: a fenced completion with a trailing
    // terminator is extracted, validated, and bounded to the text ceiling.
    let completion = "```sql\nSELECT COUNT(*) FROM public.rawg_games \
                      WHERE date_part('year', released) = 2020;\n```";

    let candidate = extract_statement(completion).unwrap();
    assert!(!candidate.as_str().contains("```"));
    assert!(!candidate.as_str().ends_with(';'));

    let validated = validator().validate(&candidate).unwrap();
    let bounded = LimitEnforcer::new().bound(validated, 50);

    assert!(bounded.as_str().ends_with("LIMIT 50"));
    assert!(bounded.as_str().starts_with("SELECT COUNT(*)"));
}

#[test]
fn test_prose_wrapped_completion() {
    let completion = "Sure! Here is a query that answers your question:\n\n\
                      SELECT name, rating FROM public.rawg_games ORDER BY rating DESC LIMIT 10;";

    let candidate = extract_statement(completion).unwrap();
    let validated = validator().validate(&candidate).unwrap();
    let bounded = LimitEnforcer::new().bound(validated, 50);

    // Existing limit below the ceiling is preserved
    assert!(bounded.as_str().ends_with("LIMIT 10"));
}

#[test]
fn test_requested_limit_above_visual_ceiling() {
    let completion = "SELECT name AS label, added AS value FROM public.rawg_games \
                      ORDER BY added DESC LIMIT 500";

    let candidate = extract_statement(completion).unwrap();
    let validated = validator().validate(&candidate).unwrap();
    let bounded = LimitEnforcer::new().bound(validated, 200);

    assert!(bounded.as_str().ends_with("LIMIT 200"));
}

#[test]
fn test_injection_attempts_rejected() {
    let v = validator();
    let cases: &[(&str, PolicyViolationKind)] = &[
        (
            "SELECT 1 FROM public.rawg_games; DROP TABLE public.rawg_games",
            PolicyViolationKind::MultipleStatements,
        ),
        (
            "SELECT name FROM public.rawg_games -- hidden DELETE",
            PolicyViolationKind::CommentsPresent,
        ),
        (
            "SELECT * FROM public.rawg_games WHERE id IN (SELECT 1) UNION \
             SELECT * FROM pg_catalog.pg_user",
            PolicyViolationKind::ForbiddenSchema("pg_catalog".to_string()),
        ),
        (
            "SELECT tablename FROM information_schema.tables JOIN public.rawg_games ON true",
            PolicyViolationKind::ForbiddenSchema("information_schema".to_string()),
        ),
    ];

    for (sql, expected) in cases {
        let candidate = extract_statement(sql).unwrap();
        match v.validate(&candidate) {
            Err(PipelineError::PolicyViolation(kind)) => assert_eq!(&kind, expected, "{}", sql),
            other => panic!("expected rejection for {:?}, got {:?}", sql, other.is_ok()),
        }
    }
}

#[test]
fn test_identifier_containing_keyword_survives_whole_pipeline() {
    // The table has a column literally named "updated"; it must pass
    let completion = "SELECT name, updated FROM public.rawg_games \
                      WHERE updated > '2024-01-01'";

    let candidate = extract_statement(completion).unwrap();
    let validated = validator().validate(&candidate).unwrap();
    let bounded = LimitEnforcer::new().bound(validated, 50);
    assert!(bounded.as_str().contains("updated"));
}

#[test]
fn test_visual_shaping_after_execution() {
    // Simulated result set: three columns, none named label/value
    let rows: Vec<ResultRow> = (2018..2023)
        .map(|year| {
            ResultRow::new(vec![
                ("release_year".to_string(), SqlValue::Float(year as f64)),
                ("games".to_string(), SqlValue::Int((year - 2000) * 10)),
                ("avg_rating".to_string(), SqlValue::Float(4.0)),
            ])
        })
        .collect();

    let series = chart::shape_series(&rows).unwrap();
    assert_eq!(series.len(), 5);
    // Positional rename: first column becomes the label, second the value
    assert_eq!(series[0].label, "2022");
    assert_eq!(series[0].value, 220.0);

    let png = chart::render_bar_chart(&series, "Games per year").unwrap();
    assert!(png.len() > 8);

    let header = chart::sanitize_header_value(
        "SELECT release_year,\n  COUNT(*)\nFROM public.rawg_games\nGROUP BY 1",
    );
    assert!(!header.contains('\n'));
}

#[test]
fn test_empty_visual_result_is_not_found() {
    assert!(matches!(
        chart::shape_series(&[]),
        Err(PipelineError::EmptyResult)
    ));
}

#[test]
fn test_prompt_modes_share_schema() {
    let builder = PromptBuilder::new();
    let text = builder.build("top games", AskMode::Text);
    let visual = builder.build("top games", AskMode::Visual);
    assert!(text.contains("public.rawg_games"));
    assert!(visual.contains("public.rawg_games"));
    assert!(visual.len() > text.len());
}
