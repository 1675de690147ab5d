/// Unified error type for the query pipeline
/// Provides structured error handling with categories for different failure modes
use thiserror::Error;

/// Reason a candidate statement was rejected before execution.
///
/// The variants mirror the validator stages; checks run in order and the
/// first failing stage wins, so a statement with several problems reports
/// only the cheapest one found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolationKind {
    /// A statement terminator remained after trimming a single trailing one
    MultipleStatements,

    /// Single-line or block comment markers found anywhere in the text
    CommentsPresent,

    /// A data- or schema-mutating keyword appeared as a whole word
    ForbiddenKeyword(String),

    /// A system catalog schema was referenced
    ForbiddenSchema(String),

    /// The statement does not begin with SELECT or WITH
    NotReadStatement,

    /// No FROM/JOIN clause references the allowed table
    WrongTable,

    /// The dialect-aware parse rejected the statement
    SyntaxInvalid(String),
}

impl std::fmt::Display for PolicyViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleStatements => write!(f, "multiple statements"),
            Self::CommentsPresent => write!(f, "comments not allowed"),
            Self::ForbiddenKeyword(word) => write!(f, "forbidden keyword: {}", word),
            Self::ForbiddenSchema(name) => write!(f, "system schema not allowed: {}", name),
            Self::NotReadStatement => write!(f, "only SELECT or WITH allowed"),
            Self::WrongTable => write!(f, "query must reference the allowed table"),
            Self::SyntaxInvalid(msg) => write!(f, "syntax error: {}", msg),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Completion service unreachable or returned an error status
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// Extraction could not locate a SELECT/WITH statement in the completion
    #[error("no SQL statement found in completion")]
    NoStatementFound,

    /// A validator stage rejected the candidate statement
    #[error("policy violation: {0}")]
    PolicyViolation(PolicyViolationKind),

    /// Timeout, connection loss, or database-reported error during execution.
    /// The message is a short cause; raw driver detail stays in the log.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Visual mode produced zero rows
    #[error("query returned no rows")]
    EmptyResult,

    /// Chart rendering failed after a successful query
    #[error("chart rendering failed: {0}")]
    ChartRender(String),

    /// Startup-only misconfiguration
    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn violation(kind: PolicyViolationKind) -> Self {
        Self::PolicyViolation(kind)
    }

    /// Whether the failure is attributable to the request rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NoStatementFound
                | Self::PolicyViolation(_)
                | Self::ExecutionFailed(_)
                | Self::EmptyResult
        )
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
