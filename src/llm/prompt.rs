//! Prompt Builder - deterministic instruction + schema prompt

use crate::pipeline::AskMode;

/// Schema description embedded in every prompt. The column list mirrors the
/// externally owned table and is treated as ground truth.
const SCHEMA_HINT: &str = "\
Database: PostgreSQL
Schema:
- public.rawg_games(
  id, name, slug, released, updated,
  rating, ratings_count, metacritic, rating_top, added,
  reviews_text_count, suggestions_count,
  reddit_count, twitch_count, youtube_count
)
Rules:
- Output ONLY ONE SQL query
- READ ONLY: SELECT or WITH
- Always include FROM public.rawg_games
- If user says reviews use reviews_text_count
";

/// Renders the instruction+schema prompt for a question and output mode.
///
/// Pure function of its inputs: the same question and mode always produce
/// the same prompt. Any question text is legal input; interpreting it is the
/// model's problem, not this component's.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, question: &str, mode: AskMode) -> String {
        let mut instruction = String::from(
            "Return ONLY ONE PostgreSQL SQL query.\n\
             READ ONLY: SELECT or WITH.\n\
             Always include FROM public.rawg_games.\n\
             No explanations.\n",
        );
        if mode == AskMode::Visual {
            instruction.push_str("Return EXACTLY two columns: label and value.\n");
        }

        format!("{}\n{}\nQuestion: {}\nSQL:", SCHEMA_HINT, instruction, question)
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let builder = PromptBuilder::new();
        let a = builder.build("top rated games", AskMode::Text);
        let b = builder.build("top rated games", AskMode::Text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_embeds_schema_and_rules() {
        let prompt = PromptBuilder::new().build("how many games?", AskMode::Text);
        assert!(prompt.contains("PostgreSQL"));
        assert!(prompt.contains("public.rawg_games"));
        assert!(prompt.contains("READ ONLY"));
        assert!(prompt.ends_with("SQL:"));
        assert!(prompt.contains("Question: how many games?"));
    }

    #[test]
    fn test_visual_addendum_only_in_visual_mode() {
        let builder = PromptBuilder::new();
        let text = builder.build("q", AskMode::Text);
        let visual = builder.build("q", AskMode::Visual);
        assert!(!text.contains("label and value"));
        assert!(visual.contains("EXACTLY two columns: label and value"));
    }
}
