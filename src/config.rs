//! Configuration - environment-driven, loaded once at startup
//!
//! Every value here is read exactly once when the process starts and never
//! mutated afterwards. Handlers see the policy through a shared reference.

use crate::error::{PipelineError, PipelineResult};
use std::env;
use std::time::Duration;

/// Keywords that mutate data or schema; matched as whole words, case-insensitive
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "drop", "alter", "truncate", "create", "grant", "revoke", "copy",
];

/// System catalog schemas; referencing them enables introspection attacks
pub const FORBIDDEN_SCHEMAS: &[&str] = &["pg_catalog", "information_schema"];

/// Connection parameters for the PostgreSQL database holding the dataset
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

/// Completion-service endpoint and sampling parameters
#[derive(Clone, Debug)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub api_token: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
}

/// Process-wide, read-only execution policy for generated queries
#[derive(Clone, Debug)]
pub struct ExecutionPolicy {
    pub forbidden_keywords: Vec<String>,
    pub forbidden_schemas: Vec<String>,
    /// Fully qualified name of the single table queries may touch
    pub allowed_table: String,
    /// Row ceiling for text-mode responses
    pub max_rows_text: usize,
    /// Row ceiling for visual-mode responses
    pub max_rows_visual: usize,
    /// Server-side per-statement time budget
    pub statement_timeout_ms: u64,
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_host: String,
    pub bind_port: u16,
    pub database: DatabaseConfig,
    pub completion: CompletionConfig,
    pub policy: ExecutionPolicy,
}

fn required(name: &str) -> PipelineResult<String> {
    env::var(name).map_err(|_| PipelineError::Config(format!("missing env var: {}", name)))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> PipelineResult<T> {
    optional(name, default)
        .parse()
        .map_err(|_| PipelineError::Config(format!("invalid value for {}", name)))
}

impl AppConfig {
    /// Load the full configuration from the environment.
    ///
    /// Missing database or completion credentials are a startup error; row
    /// ceilings and the statement timeout fall back to the documented defaults.
    pub fn from_env() -> PipelineResult<Self> {
        let database = DatabaseConfig {
            host: required("DB_HOST")?,
            port: parse_var("DB_PORT", "5432")?,
            dbname: required("DB_NAME")?,
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
        };

        let completion = CompletionConfig {
            endpoint: optional(
                "LLM_ENDPOINT",
                "https://router.huggingface.co/v1/chat/completions",
            ),
            api_token: required("LLM_TOKEN")?,
            model: optional("LLM_MODEL", "Qwen/Qwen2.5-Coder-7B-Instruct"),
            max_tokens: 220,
            temperature: 0.0,
            request_timeout: Duration::from_secs(90),
        };

        let policy = ExecutionPolicy {
            forbidden_keywords: FORBIDDEN_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            forbidden_schemas: FORBIDDEN_SCHEMAS.iter().map(|s| s.to_string()).collect(),
            allowed_table: optional("ALLOWED_TABLE", "public.rawg_games"),
            max_rows_text: parse_var("MAX_ROWS_TEXT", "50")?,
            max_rows_visual: parse_var("MAX_ROWS_VISUAL", "200")?,
            statement_timeout_ms: parse_var("STATEMENT_TIMEOUT_MS", "7000")?,
        };

        Ok(Self {
            bind_host: optional("BIND_HOST", "0.0.0.0"),
            bind_port: parse_var("BIND_PORT", "8080")?,
            database,
            completion,
            policy,
        })
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            forbidden_keywords: FORBIDDEN_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            forbidden_schemas: FORBIDDEN_SCHEMAS.iter().map(|s| s.to_string()).collect(),
            allowed_table: "public.rawg_games".to_string(),
            max_rows_text: 50,
            max_rows_visual: 200,
            statement_timeout_ms: 7000,
        }
    }
}
