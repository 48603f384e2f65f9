//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span, trace, trace_span};

use crate::dispatch::DispatchMode;

#[derive(Debug)]
pub enum Debug<'a> {
    Dispatch(DispatchMode, &'a str),
    Captured(&'a str, usize),
}

// ===== impl Debug =====

impl<'a> Debug<'a> {
    pub fn log(&self) {
        match self {
            Debug::Dispatch(mode, summary) => {
                debug_span!("action").in_scope(|| {
                    debug!(?mode, %summary, "{}", self);
                });
            }
            Debug::Captured(var, len) => {
                trace_span!("action").in_scope(|| {
                    trace!(%var, %len, "{}", self);
                });
            }
        }
    }
}

impl<'a> std::fmt::Display for Debug<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::Dispatch(..) => write!(f, "dispatching action"),
            Debug::Captured(..) => write!(f, "captured return variable"),
        }
    }
}
