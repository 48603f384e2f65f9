//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

// Template tree errors: schema malformed, or expansion/validation found
// an ill-formed schema.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    // Schema text malformed; carries file name and line when available.
    Parse(Option<String>, Option<u32>, String),
    Io(String),
    // A `$(...)` reference does not resolve within the template tree.
    Reference(String),
    // A `%set`/`%mandatory`/`%unique-in` combination is ill-formed.
    Validation(String),
    Action(routecfg_action::Error),
}

// ===== impl Error =====

impl Error {
    pub fn parse(file: Option<&str>, line: Option<u32>, message: impl Into<String>) -> Self {
        Error::Parse(file.map(str::to_string), line, message.into())
    }

    pub fn log(&self) {
        warn!(error = %self, "template error");
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(file, line, message) => match (file, line) {
                (Some(file), Some(line)) => {
                    write!(f, "{file}:{line}: {message}")
                }
                (Some(file), None) => write!(f, "{file}: {message}"),
                _ => write!(f, "{message}"),
            },
            Error::Io(message) => write!(f, "I/O error: {message}"),
            Error::Reference(reference) => {
                write!(f, "unresolved variable reference: {reference}")
            }
            Error::Validation(message) => write!(f, "{message}"),
            Error::Action(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io(error.to_string())
    }
}

impl From<routecfg_action::Error> for Error {
    fn from(error: routecfg_action::Error) -> Self {
        Error::Action(error)
    }
}
