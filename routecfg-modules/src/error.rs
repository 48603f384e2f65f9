//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    // The touched module set cannot be topologically ordered: a
    // `depends` cycle exists among the named modules.
    Cycle(Vec<String>),
    // A `ModuleManager` collaborator failed to bring a module's daemon
    // process up or down.
    Lifecycle { module: String, reason: String },
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        warn!(error = %self, "module dependency resolution error");
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Cycle(stuck) => {
                write!(f, "module dependency cycle among: {}", stuck.join(", "))
            }
            Error::Lifecycle { module, reason } => {
                write!(f, "module '{module}' lifecycle failure: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}
