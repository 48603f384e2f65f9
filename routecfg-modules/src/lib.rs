//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! Module dependency resolver (§C7): orders the modules implicated by a
//! pending change by their declared `depends` lists, pulling in
//! transitive dependencies and detecting cycles.
//!
//! `depends` metadata is supplied directly as a [`ModuleRegistry`]
//! rather than parsed out of `%modinfo` bodies -- the template crate's
//! `%modinfo` support covers the transaction-bracket actions
//! (`start_commit`/`end_commit`) as a single dispatchable action and
//! does not model the XORP `provides`/`depends`/`path` sub-command
//! block (see DESIGN.md).

mod debug;
pub mod error;
pub mod manager;
pub mod registry;
pub mod resolver;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::Error;
pub use manager::{ModuleManager, ModuleStatus};
pub use registry::{ModuleInfo, ModuleRegistry};
pub use resolver::{resolve, shutdown_order};
