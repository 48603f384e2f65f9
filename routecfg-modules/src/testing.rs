//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! Test-only `ModuleManager` implementation, feature-gated the same
//! way `routecfg_action::testing::FakeDispatcher` is.

use std::collections::HashMap;

use crate::error::Error;
use crate::manager::{ModuleManager, ModuleStatus};

#[derive(Default)]
pub struct FakeModuleManager {
    pub status: HashMap<String, ModuleStatus>,
    pub fail_on_start: Vec<String>,
}

impl FakeModuleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_starting(&mut self, module: impl Into<String>) {
        self.fail_on_start.push(module.into());
    }
}

impl ModuleManager for FakeModuleManager {
    async fn ensure_running(&mut self, module: &str) -> Result<(), Error> {
        if self.fail_on_start.iter().any(|m| m == module) {
            self.status.insert(module.to_string(), ModuleStatus::Failed);
            return Err(Error::Lifecycle {
                module: module.to_string(),
                reason: "scripted start failure".to_string(),
            });
        }
        self.status.insert(module.to_string(), ModuleStatus::Running);
        Ok(())
    }

    async fn stop(&mut self, module: &str) -> Result<(), Error> {
        self.status.insert(module.to_string(), ModuleStatus::Stopped);
        Ok(())
    }

    fn status(&self, module: &str) -> ModuleStatus {
        self.status.get(module).copied().unwrap_or(ModuleStatus::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_running_marks_module_running() {
        let mut mgr = FakeModuleManager::new();
        mgr.ensure_running("fea").await.unwrap();
        assert_eq!(mgr.status("fea"), ModuleStatus::Running);
    }

    #[tokio::test]
    async fn scripted_failure_marks_module_failed() {
        let mut mgr = FakeModuleManager::new();
        mgr.fail_starting("bgp");
        let err = mgr.ensure_running("bgp").await.unwrap_err();
        assert!(matches!(err, Error::Lifecycle { .. }));
        assert_eq!(mgr.status("bgp"), ModuleStatus::Failed);
    }

    #[tokio::test]
    async fn stop_marks_module_stopped() {
        let mut mgr = FakeModuleManager::new();
        mgr.ensure_running("rib").await.unwrap();
        mgr.stop("rib").await.unwrap();
        assert_eq!(mgr.status("rib"), ModuleStatus::Stopped);
    }
}
