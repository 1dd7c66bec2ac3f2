//! Error types for LD log decoding.
//!
//! This module provides error handling for the paddock decoder. All errors
//! implement the `std::error::Error` trait and carry structured context for
//! diagnostics.
//!
//! ## Error Scopes
//!
//! Failures are fatal at the scope of the unit affected, never silently
//! swallowed:
//!
//! - **Document scope**: a missing or truncated file header, or a header
//!   timestamp that parses under neither accepted format, fails the whole
//!   document.
//! - **Channel scope**: a truncated metadata record or an unsupported sample
//!   encoding fails only that channel; the rest of the document is still
//!   usable.
//! - **Lookup scope**: name lookups on absent or duplicated channel names
//!   fail the lookup, not the document.
//!
//! String-decode failures are not represented here at all: garbage bytes in
//! fixed-width string fields degrade to an empty string with a diagnostic.
//!
//! ```rust
//! use paddock::LdError;
//!
//! let error = LdError::HeaderTimestamp {
//!     date: "99/99/9999".to_string(),
//!     time: "25:61".to_string(),
//! };
//! assert!(error.is_fatal_for_document());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for decode operations.
pub type Result<T, E = LdError> = std::result::Result<T, E>;

/// Main error type for LD decoding operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LdError {
    #[error("LD file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "truncated read in {context}: need {expected} bytes at offset {offset:#x}, {available} available"
    )]
    TruncatedRead { context: String, offset: u64, expected: usize, available: usize },

    #[error("channel '{channel}' has unsupported sample encoding ({category:#04x}, {subtype})")]
    UnknownChannelType { channel: String, category: u16, subtype: u16 },

    #[error("header timestamp '{date} {time}' matches neither accepted format")]
    HeaderTimestamp { date: String, time: String },

    #[error(
        "channel chain revisits offset {offset:#x} after {gathered} records; traversal stopped"
    )]
    CorruptChannelChain { offset: u32, gathered: usize },

    #[error("channel lookup '{query}' matched {matches} channels, expected exactly one")]
    ChannelLookup { query: String, matches: usize },

    #[error("no channel produced usable samples")]
    EmptyDocument,

    #[error("parse error in {context}: {details}")]
    Parse { context: String, details: String },
}

impl LdError {
    /// Returns whether this error fails the whole document rather than a
    /// single channel or lookup.
    ///
    /// A missing file and an unparseable header timestamp abort the parse;
    /// everything else is recoverable at document scope (the affected channel
    /// is skipped, or the chain is retained up to the fault).
    pub fn is_fatal_for_document(&self) -> bool {
        match self {
            LdError::File { .. } => true,
            LdError::HeaderTimestamp { .. } => true,
            LdError::TruncatedRead { .. } => false,
            LdError::UnknownChannelType { .. } => false,
            LdError::CorruptChannelChain { .. } => false,
            LdError::ChannelLookup { .. } => false,
            LdError::EmptyDocument => false,
            LdError::Parse { .. } => false,
        }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        LdError::File { path, source }
    }

    /// Helper constructor for truncated reads.
    pub fn truncated_read(
        context: impl Into<String>,
        offset: u64,
        expected: usize,
        available: usize,
    ) -> Self {
        LdError::TruncatedRead { context: context.into(), offset, expected, available }
    }

    /// Helper constructor for unsupported channel encodings.
    pub fn unknown_channel_type(channel: impl Into<String>, category: u16, subtype: u16) -> Self {
        LdError::UnknownChannelType { channel: channel.into(), category, subtype }
    }

    /// Helper constructor for failed name lookups.
    pub fn channel_lookup(query: impl Into<String>, matches: usize) -> Self {
        LdError::ChannelLookup { query: query.into(), matches }
    }
}

impl From<std::io::Error> for LdError {
    fn from(err: std::io::Error) -> Self {
        LdError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}
