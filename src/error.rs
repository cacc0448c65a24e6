//! Error handling for rdap-forge

use thiserror::Error;

/// Coarse classification of every [`RdapError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed URL template, malformed JSON, decode mismatch, bad input.
    Local,
    /// A server answered 404 for the requested object.
    NotFound,
    /// A server answered with a well-formed RDAP error payload.
    Protocol,
    /// Network failure or a response of the wrong shape.
    Transport,
    /// No bootstrap entry matched, or the registry version is unsupported.
    Resolution,
}

/// Main error type for rdap-forge
#[derive(Error, Debug, Clone)]
pub enum RdapError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    #[error("invalid identifier '{input}': {message}")]
    InvalidIdentifier { input: String, message: String },

    #[error("{message}")]
    Decode { message: String },

    #[error("malformed error payload: {message}")]
    MalformedErrorPayload { message: String },

    #[error("object not found")]
    NotFound { url: Option<String> },

    #[error("{}", protocol_message(.code, .title, .description))]
    Protocol {
        code: u32,
        title: Option<String>,
        description: Vec<String>,
    },

    #[error("unexpected response: {status}")]
    UnexpectedResponse { status: String },

    #[error("unexpected status code {status}")]
    UnexpectedStatus { status: String },

    #[error("{message}")]
    Transport { message: String, url: Option<String> },

    #[error("no matches for {identifier}")]
    NoMatches { identifier: String },

    #[error("incompatible bootstrap specification version: {found} (expecting {expected})")]
    IncompatibleVersion { found: String, expected: String },

    #[error("no bootstrap registry for {query} queries, an RDAP server must be given")]
    NoBootstrap { query: String },
}

fn protocol_message(code: &u32, title: &Option<String>, description: &[String]) -> String {
    let mut message = format!("RDAP error {}", code);
    if let Some(title) = title {
        message.push_str(": ");
        message.push_str(title);
    }
    if !description.is_empty() {
        message.push_str(if title.is_some() { " (" } else { ": " });
        message.push_str(&description.join(" "));
        if title.is_some() {
            message.push(')');
        }
    }
    message
}

impl RdapError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an invalid header error
    pub fn invalid_header(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>, url: Option<String>) -> Self {
        Self::Transport {
            message: message.into(),
            url,
        }
    }

    /// Create a "no matches" resolution error
    pub fn no_matches(identifier: impl std::fmt::Display) -> Self {
        Self::NoMatches {
            identifier: identifier.to_string(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. }
            | Self::InvalidUrl { .. }
            | Self::InvalidHeader { .. }
            | Self::InvalidIdentifier { .. }
            | Self::Decode { .. }
            | Self::MalformedErrorPayload { .. } => ErrorKind::Local,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::UnexpectedResponse { .. }
            | Self::UnexpectedStatus { .. }
            | Self::Transport { .. } => ErrorKind::Transport,
            Self::NoMatches { .. } | Self::IncompatibleVersion { .. } | Self::NoBootstrap { .. } => {
                ErrorKind::Resolution
            }
        }
    }

    /// Whether this error should end the candidate loop instead of advancing it
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Get user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Local => {
                format!("❌ {}\n💡 Check the query and the configured URLs", self)
            }
            ErrorKind::NotFound => {
                "❌ Object not found\n💡 The authoritative server has no record of it".to_string()
            }
            ErrorKind::Protocol => format!("❌ Server refused the query: {}", self),
            ErrorKind::Transport => {
                format!("❌ {}\n💡 Check your internet connection or try --server", self)
            }
            ErrorKind::Resolution => {
                format!("❌ {}\n💡 Use --server to query a known RDAP server directly", self)
            }
        }
    }
}

/// Convert from common error types
impl From<reqwest::Error> for RdapError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string());
        Self::transport(err.to_string(), url)
    }
}

impl From<serde_json::Error> for RdapError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RdapError>;

#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::error::RdapError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::RdapError::config(format!($fmt, $($arg)*))
    };
}
