use std::path::Path;

/// Error taxonomy for tool invocations. Every failure a caller can observe
/// carries exactly one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Requested name is not in the registry.
    UnknownTool,
    /// Schema validation rejected the payload before the handler ran.
    InvalidArguments,
    /// A referenced input file or directory does not exist.
    NotFound,
    /// The adapter operation itself failed.
    HandlerError,
    /// The requested format pair or operation is not implemented.
    Unsupported,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::UnknownTool => "unknown_tool",
            FailureKind::InvalidArguments => "invalid_arguments",
            FailureKind::NotFound => "not_found",
            FailureKind::HandlerError => "handler_error",
            FailureKind::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {message}", kind.as_str())]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(FailureKind::UnknownTool, format!("unknown tool: {name}"))
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidArguments, message)
    }

    pub fn not_found(path: &Path) -> Self {
        Self::new(
            FailureKind::NotFound,
            format!("no such file or directory: {}", path.display()),
        )
    }

    pub fn handler_error(message: impl Into<String>) -> Self {
        Self::new(FailureKind::HandlerError, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unsupported, message)
    }
}
