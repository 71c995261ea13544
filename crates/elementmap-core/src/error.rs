use std::fmt;

use crate::model::ElementKind;

/// Machine-readable error codes for callers that branch on failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    StoreNotInitialized,
    ConfigParseError,
    SchemaMismatch,
    StorageFailure,
    HandlerFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::StoreNotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::SchemaMismatch => "E3002",
            Self::StorageFailure => "E3003",
            Self::HandlerFailed => "E4001",
        }
    }

    /// Short human-facing summary for logs.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::StoreNotInitialized => "Content store not initialized",
            Self::ConfigParseError => "Settings file parse error",
            Self::SchemaMismatch => "Content store schema version mismatch",
            Self::StorageFailure => "Content store query failed",
            Self::HandlerFailed => "Map data handler failed",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::StoreNotInitialized => {
                Some("Open the store with `open_store` once to create the schema.")
            }
            Self::ConfigParseError => Some("Fix syntax in the settings TOML file and retry."),
            Self::SchemaMismatch => {
                Some("Open the store read-write once so pending migrations are applied.")
            }
            Self::StorageFailure => None,
            Self::HandlerFailed => Some("Check the handler registered for this element type."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure of a map resolution.
///
/// Storage failures abort the whole resolution: there is no partial map.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// A query against the content store failed.
    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),

    /// A registered map data handler returned an error.
    #[error("map data handler for '{kind}' failed: {source:#}")]
    Handler {
        kind: ElementKind,
        #[source]
        source: anyhow::Error,
    },

    /// Settings could not be loaded.
    #[error("settings error: {0:#}")]
    Config(#[source] anyhow::Error),
}

impl MapError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Storage(_) => ErrorCode::StorageFailure,
            Self::Handler { .. } => ErrorCode::HandlerFailed,
            Self::Config(_) => ErrorCode::ConfigParseError,
        }
    }
}
