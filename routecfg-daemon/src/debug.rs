//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug_span, info};

#[derive(Debug)]
pub enum Debug<'a> {
    LoadedTemplate(&'a str, usize),
    AppliedInitialConfig(&'a str),
    ShuttingDown,
}

// ===== impl Debug =====

impl<'a> Debug<'a> {
    pub fn log(&self) {
        match self {
            Debug::LoadedTemplate(dir, modules) => {
                debug_span!("daemon").in_scope(|| info!(%dir, %modules, "{}", self));
            }
            Debug::AppliedInitialConfig(file) => {
                debug_span!("daemon").in_scope(|| info!(%file, "{}", self));
            }
            Debug::ShuttingDown => {
                debug_span!("daemon").in_scope(|| info!("{}", self));
            }
        }
    }
}

impl<'a> std::fmt::Display for Debug<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::LoadedTemplate(..) => write!(f, "loaded template tree"),
            Debug::AppliedInitialConfig(..) => write!(f, "applied initial configuration file"),
            Debug::ShuttingDown => write!(f, "shutting down"),
        }
    }
}
