//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! Test-only `Dispatcher` implementation. Gated behind the `testing`
//! feature so it never ships in the daemon binary, mirroring the way
//! the teacher gates its southbound stubs.

use crate::action::{RemoteCall, SubprocessCall};
use crate::atom::ReturnAtom;
use crate::debug::Debug;
use crate::dispatch::{ActionOutcome, DispatchMode, Dispatcher};
use crate::error::Error;

// Records every call it receives and returns a scripted outcome (or
// failure) per target/command, so commit-engine tests can assert on
// dispatch order and count without touching real RPC or process
// machinery.
#[derive(Default)]
pub struct FakeDispatcher {
    pub calls: Vec<String>,
    pub fail_targets: Vec<String>,
    pub outcomes: std::collections::HashMap<String, ActionOutcome>,
}

impl FakeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&mut self, target: impl Into<String>) {
        self.fail_targets.push(target.into());
    }

    pub fn script_outcome(&mut self, key: impl Into<String>, outcome: ActionOutcome) {
        self.outcomes.insert(key.into(), outcome);
    }
}

impl Dispatcher for FakeDispatcher {
    async fn dispatch_remote(
        &mut self,
        mode: DispatchMode,
        call: &RemoteCall,
    ) -> Result<ActionOutcome, Error> {
        let key = format!("{}/{}", call.target, call.method);
        Debug::Dispatch(mode, &key).log();
        self.calls.push(key.clone());

        if self.fail_targets.contains(&key) {
            return Err(Error::Dispatch(format!("scripted failure for {key}")));
        }

        Ok(self.outcomes.get(&key).cloned().unwrap_or_default())
    }

    async fn dispatch_subprocess(
        &mut self,
        mode: DispatchMode,
        call: &SubprocessCall,
    ) -> Result<ActionOutcome, Error> {
        Debug::Dispatch(mode, &call.command_line).log();
        self.calls.push(call.command_line.clone());

        if self.fail_targets.contains(&call.command_line) {
            return Err(Error::Dispatch(format!(
                "scripted failure for {}",
                call.command_line
            )));
        }

        Ok(self
            .outcomes
            .get(&call.command_line)
            .cloned()
            .unwrap_or_default())
    }
}

pub fn text_outcome(var: &str, text: &str) -> ActionOutcome {
    ActionOutcome {
        captured: vec![(var.to_string(), ReturnAtom::Text(text.to_string()))],
    }
}
