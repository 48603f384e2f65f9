//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use std::future::Future;

// The per-daemon lifecycle supervisor's observable state for one
// module (§1: "seen as an abstract module manager supporting
// `ensure_running`, `stop`, and status polling" -- this crate only
// models the interface, never the supervisor itself).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModuleStatus {
    Stopped,
    Starting,
    Running,
    Failed,
}

// The abstract external collaborator that starts, stops, and reports
// on the daemon process backing a module. The commit engine and
// resolver never call this directly -- `%modinfo`/`%create`/`%delete`
// actions already express per-commit side effects through the
// `Dispatcher` trait -- but the daemon binary consults it when
// bringing up or tearing down modules implicated by `resolve`/
// `shutdown_order`.
pub trait ModuleManager {
    fn ensure_running(&mut self, module: &str) -> impl Future<Output = Result<(), crate::Error>> + Send;

    fn stop(&mut self, module: &str) -> impl Future<Output = Result<(), crate::Error>> + Send;

    fn status(&self, module: &str) -> ModuleStatus;
}
