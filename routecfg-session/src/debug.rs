//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span};

#[derive(Debug)]
pub enum Debug<'a> {
    ApplyChange(u32),
    ApplyChangeRejected(u32, &'a str),
    ApplyChangeCommitted(u32, usize, usize),
    DeleteEntireConfiguration(u32),
}

// ===== impl Debug =====

impl<'a> Debug<'a> {
    pub fn log(&self) {
        match self {
            Debug::ApplyChange(user) => {
                debug_span!("session").in_scope(|| debug!(%user, "{}", self));
            }
            Debug::ApplyChangeRejected(user, reason) => {
                debug_span!("session").in_scope(|| debug!(%user, %reason, "{}", self));
            }
            Debug::ApplyChangeCommitted(user, delta_nodes, deletion_nodes) => {
                debug_span!("session")
                    .in_scope(|| debug!(%user, %delta_nodes, %deletion_nodes, "{}", self));
            }
            Debug::DeleteEntireConfiguration(user) => {
                debug_span!("session").in_scope(|| debug!(%user, "{}", self));
            }
        }
    }
}

impl<'a> std::fmt::Display for Debug<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::ApplyChange(..) => write!(f, "applying submitted change"),
            Debug::ApplyChangeRejected(..) => write!(f, "rejected submitted change"),
            Debug::ApplyChangeCommitted(..) => write!(f, "committed submitted change"),
            Debug::DeleteEntireConfiguration(..) => write!(f, "deleting entire configuration"),
        }
    }
}
