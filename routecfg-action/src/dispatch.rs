//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use std::future::Future;

use crate::action::{Action, RemoteCall, SubprocessCall};
use crate::atom::ReturnAtom;

// Whether a dispatch should actually run the action or merely validate
// it. Pass 1 of the commit engine runs every dispatcher call in
// `DryRun`, which must succeed or fail exactly as the live call would,
// without any external side effect.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DispatchMode {
    DryRun,
    Live,
}

// The result of a successfully dispatched action: atoms returned by a
// remote call's return spec, or output captured from a subprocess,
// keyed by the variable name the action declared for each.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionOutcome {
    pub captured: Vec<(String, ReturnAtom)>,
}

// The abstract external collaborator that actually performs RPCs and
// spawns subprocesses. The commit engine is generic over this trait so
// that tests can substitute `testing::FakeDispatcher` without touching
// the network or a process table.
pub trait Dispatcher {
    fn dispatch_remote(
        &mut self,
        mode: DispatchMode,
        call: &RemoteCall,
    ) -> impl Future<Output = Result<ActionOutcome, crate::Error>> + Send;

    fn dispatch_subprocess(
        &mut self,
        mode: DispatchMode,
        call: &SubprocessCall,
    ) -> impl Future<Output = Result<ActionOutcome, crate::Error>> + Send;

    fn dispatch(
        &mut self,
        mode: DispatchMode,
        action: &Action,
    ) -> impl Future<Output = Result<ActionOutcome, crate::Error>> + Send {
        async move {
            match action {
                Action::Remote(call) => self.dispatch_remote(mode, call).await,
                Action::Subprocess(call) => self.dispatch_subprocess(mode, call).await,
            }
        }
    }
}
