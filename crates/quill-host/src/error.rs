//! Errors raised while serving boundary calls.

use std::path::PathBuf;
use thiserror::Error;

use crate::value::Kind;

/// Errors raised by the reference host while serving a boundary call.
#[derive(Debug, Error)]
pub enum HostError {
    /// The handle is unknown, already released, or names another kind of resource.
    #[error("invalid handle: {0}")]
    InvalidHandle(u32),

    /// A kind-specific operation was applied to a value of another kind.
    #[error("expected {expected} value, found {found}")]
    WrongKind {
        /// The kind the operation requires.
        expected: Kind,
        /// The kind the value actually has.
        found: Kind,
    },

    /// An array index outside `0..len`.
    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: i64,
        /// The array length at the time of the call.
        len: usize,
    },

    /// Inserting the value would make a container reachable from itself.
    #[error("inserting value would create a reference cycle")]
    Cycle,

    /// The CSS selector could not be parsed.
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector {
        /// The selector text as supplied by the guest.
        selector: String,
        /// What went wrong.
        reason: String,
    },

    /// The text could not be parsed as a URL.
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// A String value did not match the requested date format.
    #[error("could not parse {text:?} as a date with format {format:?}")]
    DateParse {
        /// The text that was parsed.
        text: String,
        /// The format it was parsed with.
        format: String,
    },

    /// An unknown request method code.
    #[error("unsupported http method code: {0}")]
    UnsupportedMethod(i32),

    /// The request has already been sent.
    #[error("request {0} has already been sent")]
    AlreadySent(u32),

    /// The response was read before the request was sent.
    #[error("request {0} has not been sent")]
    NotSent(u32),

    /// The transport failed to produce a response.
    #[error("http transport failed: {0}")]
    Transport(String),

    /// Bytes that had to be UTF-8 were not.
    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(&'static str),

    /// Host configuration could not be read or parsed.
    #[error("failed to load config at {path}: {message}")]
    Config {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying error message.
        message: String,
    },
}

/// A specialized Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
