// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Errors returned by connector operations.

use std::fmt;

/// Errors returned by ddslink operations.
///
/// Wait operations report expiry as [`Error::Timeout`]; that outcome is
/// expected during normal operation and callers should branch on it with
/// [`Error::is_timeout`] rather than treat it as a failure.
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration could not be loaded or is malformed (XML parse error,
    /// dangling reference, unknown participant selector).
    Config(String),

    // ========================================================================
    // Entity Errors
    // ========================================================================
    /// No entity with this name exists in the connector's configuration.
    EntityNotFound(String),
    /// The name exists but designates the other entity kind (reader vs writer),
    /// or a member was accessed with an incompatible scalar accessor.
    TypeMismatch(String),

    // ========================================================================
    // Data Errors
    // ========================================================================
    /// A member path does not resolve against the entity's declared type.
    MemberNotFound(String),
    /// A JSON document is malformed or structurally incompatible with the
    /// declared type (unknown field, wrong value kind).
    SchemaMismatch(String),
    /// Sample index outside `[origin, origin + len - 1]`.
    IndexOutOfRange { index: usize, len: usize },

    // ========================================================================
    // Wait / Lifecycle
    // ========================================================================
    /// A wait operation reached its deadline. Normal outcome, not a failure.
    Timeout,
    /// The owning connector was closed before or during the operation.
    ConnectorClosed,

    // ========================================================================
    // Other
    // ========================================================================
    /// Opaque failure surfaced from the underlying DDS core.
    CoreFailure(String),
}

impl Error {
    /// True when this is the wait-deadline outcome rather than a failure.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::EntityNotFound(name) => write!(f, "Entity not found: {}", name),
            Error::TypeMismatch(msg) => write!(f, "Type mismatch: {}", msg),
            Error::MemberNotFound(path) => write!(f, "Member not found: {}", path),
            Error::SchemaMismatch(msg) => write!(f, "Schema mismatch: {}", msg),
            Error::IndexOutOfRange { index, len } => {
                write!(f, "Sample index out of range: {} (length {})", index, len)
            }
            Error::Timeout => write!(f, "Timeout"),
            Error::ConnectorClosed => write!(f, "Connector closed"),
            Error::CoreFailure(msg) => write!(f, "DDS core failure: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Convenient alias for API results using the public [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_distinguishable() {
        assert!(Error::Timeout.is_timeout());
        assert!(!Error::ConnectorClosed.is_timeout());
        assert!(!Error::EntityNotFound("x".into()).is_timeout());
    }

    #[test]
    fn test_display_messages() {
        let e = Error::IndexOutOfRange { index: 5, len: 2 };
        assert_eq!(e.to_string(), "Sample index out of range: 5 (length 2)");

        let e = Error::EntityNotFound("MyPublisher::MyWriter".into());
        assert!(e.to_string().contains("MyPublisher::MyWriter"));
    }
}
