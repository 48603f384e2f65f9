//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

// Action parsing and dispatch errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    // The action body could not be parsed as either flavor.
    Parse(String),
    // A remote call target or return spec was malformed.
    MalformedRemoteCall(String),
    // A subprocess action declared the same capture slot twice.
    DuplicateCapture(&'static str),
    // The dispatcher reported failure; carries its message and, when
    // available, captured diagnostic output.
    Dispatch(String),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        warn!(error = %self, "action error");
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Parse(body) => write!(f, "failed to parse action body: {body}"),
            Error::MalformedRemoteCall(reason) => {
                write!(f, "malformed remote call action: {reason}")
            }
            Error::DuplicateCapture(slot) => {
                write!(f, "capture slot '{slot}' specified more than once")
            }
            Error::Dispatch(reason) => write!(f, "action dispatch failed: {reason}"),
        }
    }
}

impl std::error::Error for Error {}
