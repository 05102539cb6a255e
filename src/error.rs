//! Error types for call graph construction.

use crate::types::{ClassType, MethodSignature};

/// Errors raised while resolving dispatch or building a call graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallGraphError {
    #[error(
        "expected exactly one `public static void main(java.lang.String[])` entry point, found {}",
        candidates.len()
    )]
    EntryPointNotFound { candidates: Vec<MethodSignature> },

    #[error("could not resolve class {class}, but found it in the type hierarchy")]
    ClassResolution { class: ClassType },

    #[error("could not find a concrete implementation of {method}")]
    DispatchResolution { method: MethodSignature },

    #[error("class {class} is defined more than once")]
    DuplicateClass { class: ClassType },

    #[error("class {class} is its own superclass")]
    CyclicInheritance { class: ClassType },
}

impl CallGraphError {
    /// Whether a lenient run may drop the offending call site and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CallGraphError::DispatchResolution { .. })
    }
}

pub type CallGraphResult<T> = Result<T, CallGraphError>;

/// Errors raised while parsing textual types and method signatures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid type name `{0}`")]
    InvalidType(String),

    #[error("malformed method signature `{0}`")]
    MalformedSignature(String),
}
