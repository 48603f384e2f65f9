//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! The commit engine (§C6): drives a pending configuration tree through
//! the two-pass commit protocol described in §4.6 -- module transaction
//! brackets, then node life-cycle dispatch in template-declared commit
//! order, with `$(...)` and backtick substitution against the live tree
//! immediately before each action is handed to a dispatcher.

mod debug;

pub mod engine;
pub mod error;
pub mod expand;
pub mod phase;

pub use crate::engine::{commit, commit_apply_only, CommitOutcome};
pub use crate::error::Error;
pub use crate::phase::CommitPhase;
