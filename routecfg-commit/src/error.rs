//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

// Commit-engine errors. Most are thin wrappers over an inner crate's own
// error, surfaced at the path that triggered them; `Action` is the one
// variant unique to this crate, since dispatch failure is only ever
// observed here.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    Config(routecfg_config::Error),
    Template(routecfg_template::Error),
    Modules(routecfg_modules::Error),
    // A `$(...)` or backtick reference inside an action body did not
    // resolve against the live tree at expansion time.
    Reference(String),
    // The dispatcher reported failure for the action declared at `path`.
    Action { path: String, command: String, source: routecfg_action::Error },
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        warn!(error = %self, "commit error");
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(error) => write!(f, "{error}"),
            Error::Template(error) => write!(f, "{error}"),
            Error::Modules(error) => write!(f, "{error}"),
            Error::Reference(message) => write!(f, "{message}"),
            Error::Action { path, command, source } => {
                write!(f, "'{command}' on '{path}' failed: {source}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<routecfg_config::Error> for Error {
    fn from(error: routecfg_config::Error) -> Self {
        Error::Config(error)
    }
}

impl From<routecfg_template::Error> for Error {
    fn from(error: routecfg_template::Error) -> Self {
        Error::Template(error)
    }
}

impl From<routecfg_modules::Error> for Error {
    fn from(error: routecfg_modules::Error) -> Self {
        Error::Modules(error)
    }
}
