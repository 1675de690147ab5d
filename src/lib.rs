//! # rawg-insight
//!
//! Natural-language query service for the RAWG games dataset. A language
//! model turns a question into SQL; this crate guarantees the generated
//! text can only ever execute as a bounded, read-only, single-table query
//! against `public.rawg_games`.
//!
//! The core is the guarded pipeline in [`pipeline`]:
//! prompt -> completion -> extraction -> policy validation -> limit
//! enforcement -> guarded execution -> (visual mode) chart rendering.
//!
//! Safety, not correctness, is what the pipeline enforces: a semantically
//! wrong but policy-clean query will run; an unsafe one never reaches the
//! database.

pub mod chart;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod sql;
pub mod web;

// Public API - main types users need
pub use config::{AppConfig, ExecutionPolicy};
pub use error::{PipelineError, PipelineResult, PolicyViolationKind};
pub use pipeline::{AskMode, QueryPipeline};
pub use sql::{BoundedSql, CandidateSql, ValidatedSql};
