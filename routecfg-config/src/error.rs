//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

// Configuration-tree errors: malformed configuration text, a value or
// operator the schema rejects, or a structural operation that found the
// tree in a state it didn't expect.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    // Configuration text malformed; carries file name and line when
    // available.
    Parse(Option<String>, Option<u32>, String),
    Io(String),
    // A path does not resolve against the template tree.
    UnknownPath(String),
    // A value failed to parse or failed an allowed-value/range check.
    Value(routecfg_value::Error),
    // A mandatory reference is missing, or a unique-in constraint is
    // violated.
    Reference(String),
    // A deletion's path does not match the current configuration tree
    // (§4.3: "a hard error").
    DeletionMismatch(String),
    // A tag scope contains two value-children with the same value (§8
    // invariant 2 violated by a caller bypassing normal merge).
    DuplicateNodeId(String),
}

// ===== impl Error =====

impl Error {
    pub fn parse(file: Option<&str>, line: Option<u32>, message: impl Into<String>) -> Self {
        Error::Parse(file.map(str::to_string), line, message.into())
    }

    pub fn log(&self) {
        warn!(error = %self, "configuration tree error");
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(file, line, message) => match (file, line) {
                (Some(file), Some(line)) => write!(f, "{file}:{line}: {message}"),
                (Some(file), None) => write!(f, "{file}: {message}"),
                _ => write!(f, "{message}"),
            },
            Error::Io(message) => write!(f, "I/O error: {message}"),
            Error::UnknownPath(path) => write!(f, "'{path}' is not a legal configuration path"),
            Error::Value(error) => write!(f, "{error}"),
            Error::Reference(message) => write!(f, "{message}"),
            Error::DeletionMismatch(path) => {
                write!(f, "deletion of '{path}' does not match the configuration tree")
            }
            Error::DuplicateNodeId(path) => {
                write!(f, "duplicate node id under '{path}'")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error.to_string())
    }
}

impl From<routecfg_value::Error> for Error {
    fn from(error: routecfg_value::Error) -> Self {
        Error::Value(error)
    }
}
