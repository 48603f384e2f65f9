//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span};

#[derive(Debug)]
pub enum Debug<'a> {
    Resolved(&'a [String]),
    UnknownModule(&'a str),
}

// ===== impl Debug =====

impl<'a> Debug<'a> {
    pub fn log(&self) {
        match self {
            Debug::Resolved(order) => {
                debug_span!("modules").in_scope(|| debug!(?order, "{}", self));
            }
            Debug::UnknownModule(name) => {
                debug_span!("modules").in_scope(|| debug!(%name, "{}", self));
            }
        }
    }
}

impl<'a> std::fmt::Display for Debug<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::Resolved(..) => write!(f, "resolved module start order"),
            Debug::UnknownModule(..) => write!(f, "module has no declared dependencies"),
        }
    }
}
