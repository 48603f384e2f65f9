//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span, trace, trace_span};

#[derive(Debug)]
pub enum Debug<'a> {
    LoadingFile(&'a str),
    Expanding(&'a str),
    Validating(&'a str),
    VarRefResolved(&'a str, &'a str),
}

// ===== impl Debug =====

impl<'a> Debug<'a> {
    pub fn log(&self) {
        match self {
            Debug::LoadingFile(path) => {
                debug_span!("template").in_scope(|| debug!(%path, "{}", self));
            }
            Debug::Expanding(path) => {
                debug_span!("template").in_scope(|| debug!(%path, "{}", self));
            }
            Debug::Validating(path) => {
                debug_span!("template").in_scope(|| debug!(%path, "{}", self));
            }
            Debug::VarRefResolved(reference, path) => {
                trace_span!("template")
                    .in_scope(|| trace!(%reference, %path, "{}", self));
            }
        }
    }
}

impl<'a> std::fmt::Display for Debug<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::LoadingFile(..) => write!(f, "loading template file"),
            Debug::Expanding(..) => write!(f, "expanding template subtree"),
            Debug::Validating(..) => write!(f, "validating template subtree"),
            Debug::VarRefResolved(..) => write!(f, "resolved variable reference"),
        }
    }
}
