//! Error types for the extraction pipeline
//!
//! `LsnError` covers everything that aborts a query. Parse degradation is not
//! an error: the parser returns an empty result instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LsnError {
    #[error("Session initialization failed: {reason}")]
    Session { reason: String },

    #[error("No redirect URL found in query response for table {table_id}")]
    NoRedirect { table_id: String },

    #[error("HTTP request failed: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    #[error("HTTP request failed with status {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Invalid URL: {source}")]
    InvalidUrl {
        #[from]
        source: url::ParseError,
    },

    #[error("Invalid client configuration: {message}")]
    Configuration { message: String },

    #[error("Query cancelled while waiting for result page")]
    Cancelled,
}

/// Coarse classification used for logging and caller retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Session,
    ProtocolDrift,
    Transport,
    Configuration,
    Cancelled,
}

impl LsnError {
    pub fn session(reason: impl Into<String>) -> Self {
        Self::Session {
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn no_redirect(table_id: &str) -> Self {
        Self::NoRedirect {
            table_id: table_id.to_string(),
        }
    }

    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Session { .. } => ErrorCategory::Session,
            Self::NoRedirect { .. } => ErrorCategory::ProtocolDrift,
            Self::Transport { .. } | Self::HttpStatus { .. } | Self::InvalidUrl { .. } => {
                ErrorCategory::Transport
            }
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// Whether retrying the whole query may succeed.
    ///
    /// A missing redirect usually means the service rejected the query
    /// parameters, so repeating it unchanged does not help.
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Session { .. } | Self::Transport { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            Self::NoRedirect { .. }
            | Self::InvalidUrl { .. }
            | Self::Configuration { .. }
            | Self::Cancelled => false,
        }
    }
}

/// Numeric text that does not follow the German number convention
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid amount '{input}'")]
pub struct NumberFormatError {
    pub input: String,
}

/// Parser construction errors (selectors and patterns are compiled once)
#[derive(Error, Debug, Clone)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid pattern: {pattern} - {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

pub type LsnResult<T> = Result<T, LsnError>;
pub type ParsingResult<T> = Result<T, ParsingError>;
