//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! The daemon's concrete `Dispatcher` (§5, §10): a `program` action is
//! genuinely useful to implement with nothing more than `tokio::process`,
//! so this is the one external collaborator the workspace ships a real
//! implementation of. An `xrl` remote call is, per scope, the RPC
//! transport the core deliberately treats as an abstract collaborator --
//! this dispatcher has nowhere to send one, so it logs and fails a live
//! dispatch rather than pretending to speak a wire protocol that does
//! not exist here.

use routecfg_action::action::{RemoteCall, SubprocessCall};
use routecfg_action::{ActionOutcome, DispatchMode, Dispatcher, Error, ReturnAtom};
use tracing::{info, warn};

#[derive(Default)]
pub struct ProcessDispatcher;

impl ProcessDispatcher {
    pub fn new() -> Self {
        ProcessDispatcher
    }
}

impl Dispatcher for ProcessDispatcher {
    async fn dispatch_remote(
        &mut self,
        mode: DispatchMode,
        call: &RemoteCall,
    ) -> Result<ActionOutcome, Error> {
        if mode == DispatchMode::DryRun {
            return Ok(ActionOutcome::default());
        }
        warn!(
            target = %call.target,
            method = %call.method,
            "no remote call transport configured; remote actions are a Non-goal of this core"
        );
        Err(Error::Dispatch(format!(
            "remote dispatch to {}/{} unsupported by this daemon build",
            call.target, call.method
        )))
    }

    async fn dispatch_subprocess(
        &mut self,
        mode: DispatchMode,
        call: &SubprocessCall,
    ) -> Result<ActionOutcome, Error> {
        if mode == DispatchMode::DryRun {
            return Ok(ActionOutcome::default());
        }

        let mut argv = call.command_line.split_whitespace();
        let program = argv
            .next()
            .ok_or_else(|| Error::Dispatch("empty subprocess command line".to_string()))?;

        info!(command = %call.command_line, "spawning subprocess action");
        let output = tokio::process::Command::new(program)
            .args(argv)
            .output()
            .await
            .map_err(|err| Error::Dispatch(format!("{program}: {err}")))?;

        if !output.status.success() {
            return Err(Error::Dispatch(format!(
                "{program} exited with {}",
                output.status
            )));
        }

        let mut captured = Vec::new();
        if let Some(var) = &call.stdout_var {
            let text = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
            captured.push((var.clone(), ReturnAtom::Text(text)));
        }
        if let Some(var) = &call.stderr_var {
            let text = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
            captured.push((var.clone(), ReturnAtom::Text(text)));
        }
        Ok(ActionOutcome { captured })
    }
}
