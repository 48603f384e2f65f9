//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

// Session-facade errors. `Commit` subsumes every error kind the commit
// engine and its own dependencies can raise (parse, type, reference,
// dependency-cycle, action); `State` is the one kind unique to this
// crate, since only the facade knows whether a commit is in progress.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    Config(routecfg_config::Error),
    Commit(routecfg_commit::Error),
    // An operation was attempted while the session's state did not
    // permit it, e.g. a new change submitted while a commit is in
    // progress (§5).
    State(String),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        warn!(error = %self, "session error");
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Config(error) => write!(f, "{error}"),
            Error::Commit(error) => write!(f, "{error}"),
            Error::State(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<routecfg_config::Error> for Error {
    fn from(error: routecfg_config::Error) -> Self {
        Error::Config(error)
    }
}

impl From<routecfg_commit::Error> for Error {
    fn from(error: routecfg_commit::Error) -> Self {
        Error::Commit(error)
    }
}
