//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! The session/apply facade (§C8): the entry point external callers
//! submit textual deltas and deletions through, provisionally merge
//! against the live configuration tree, drive the commit engine, and
//! compute the structural delta/deletion to broadcast afterward.

mod debug;

pub mod error;
pub mod session;

pub use crate::error::Error;
pub use crate::session::{ApplyOutcome, Session};
