//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span, trace, trace_span};

use crate::phase::CommitPhase;
use routecfg_action::DispatchMode;

#[derive(Debug)]
pub enum Debug<'a> {
    TouchedModules(&'a [String]),
    ModuleOrder(&'a [String]),
    ModuleTransaction(&'a str, CommitPhase, DispatchMode),
    Dispatching(&'a str, &'a str, DispatchMode),
    NeedsActivate(&'a str),
    SubtreeSkipped(&'a str),
    DeleteShortCircuit(&'a str),
}

// ===== impl Debug =====

impl<'a> Debug<'a> {
    pub fn log(&self) {
        match self {
            Debug::TouchedModules(modules) => {
                debug_span!("commit").in_scope(|| debug!(?modules, "{}", self));
            }
            Debug::ModuleOrder(order) => {
                debug_span!("commit").in_scope(|| debug!(?order, "{}", self));
            }
            Debug::ModuleTransaction(module, phase, mode) => {
                debug_span!("commit").in_scope(|| debug!(%module, ?phase, ?mode, "{}", self));
            }
            Debug::Dispatching(path, command, mode) => {
                trace_span!("commit").in_scope(|| trace!(%path, %command, ?mode, "{}", self));
            }
            Debug::NeedsActivate(path) => {
                trace_span!("commit").in_scope(|| trace!(%path, "{}", self));
            }
            Debug::SubtreeSkipped(path) => {
                trace_span!("commit").in_scope(|| trace!(%path, "{}", self));
            }
            Debug::DeleteShortCircuit(path) => {
                debug_span!("commit").in_scope(|| debug!(%path, "{}", self));
            }
        }
    }
}

impl<'a> std::fmt::Display for Debug<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::TouchedModules(..) => write!(f, "collected touched modules"),
            Debug::ModuleOrder(..) => write!(f, "resolved module commit order"),
            Debug::ModuleTransaction(..) => write!(f, "module transaction bracket"),
            Debug::Dispatching(..) => write!(f, "dispatching node action"),
            Debug::NeedsActivate(..) => write!(f, "activation request bubbled to ancestor"),
            Debug::SubtreeSkipped(..) => write!(f, "subtree has no changes, skipping"),
            Debug::DeleteShortCircuit(..) => write!(f, "delete short-circuited child traversal"),
        }
    }
}
