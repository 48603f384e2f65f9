//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

// The three-phase bracket a `%modinfo` transaction runs through around a
// module's share of a pass (§11 supplemented feature, naming reused
// verbatim from the teacher's northbound commit machinery since it is
// the same concept): `Prepare` brackets Pass 1's dry-run validation,
// `Apply` brackets Pass 2's live execution, and `Abort` notifies a
// module that had already entered `Prepare` when a later module's
// `Prepare` failed and the whole commit must be given up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommitPhase {
    Prepare,
    Abort,
    Apply,
}

impl std::fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommitPhase::Prepare => "prepare",
            CommitPhase::Abort => "abort",
            CommitPhase::Apply => "apply",
        };
        write!(f, "{s}")
    }
}
