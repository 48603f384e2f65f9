//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span, trace, trace_span};

#[derive(Debug)]
pub enum Debug<'a> {
    MergeDelta(&'a str),
    MergeDeletion(&'a str),
    NodeIdAllocated(&'a str, &'a str),
    VarRefResolved(&'a str, &'a str),
}

// ===== impl Debug =====

impl<'a> Debug<'a> {
    pub fn log(&self) {
        match self {
            Debug::MergeDelta(path) => {
                debug_span!("config").in_scope(|| debug!(%path, "{}", self));
            }
            Debug::MergeDeletion(path) => {
                debug_span!("config").in_scope(|| debug!(%path, "{}", self));
            }
            Debug::NodeIdAllocated(path, id) => {
                trace_span!("config").in_scope(|| trace!(%path, %id, "{}", self));
            }
            Debug::VarRefResolved(reference, path) => {
                trace_span!("config")
                    .in_scope(|| trace!(%reference, %path, "{}", self));
            }
        }
    }
}

impl<'a> std::fmt::Display for Debug<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::MergeDelta(..) => write!(f, "merged delta subtree"),
            Debug::MergeDeletion(..) => write!(f, "merged deletion subtree"),
            Debug::NodeIdAllocated(..) => write!(f, "allocated node id"),
            Debug::VarRefResolved(..) => write!(f, "resolved variable reference"),
        }
    }
}
