//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

mod config;
mod debug;
mod dispatch;

use std::sync::Arc;

use clap::{App, Arg};
use config::Config;
use debug::Debug;
use dispatch::ProcessDispatcher;
use routecfg_modules::{ModuleInfo, ModuleRegistry};
use routecfg_session::Session;
use routecfg_template::TemplateTree;
use tracing::{error, info};
use tracing_subscriber::prelude::*;

fn init_tracing(config: &config::Logging) {
    let file = config.file.enabled.then(|| {
        let file_appender = tracing_appender::rolling::never(&config.file.dir, &config.file.name);
        tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(false)
            .with_ansi(false)
    });

    let stdout = config
        .stdout
        .enabled
        .then(|| tracing_subscriber::fmt::layer().with_target(false));

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("routecfg=debug".parse().unwrap())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file)
        .with(stdout)
        .init();
}

fn module_registry(config: &Config) -> ModuleRegistry {
    config
        .modules
        .iter()
        .map(|m| {
            let mut info = ModuleInfo::new(m.name.clone());
            info.depends = m.depends.clone();
            info
        })
        .collect()
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = App::new("Router configuration manager")
        .version(clap::crate_version!())
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .get_matches();

    // Read the daemon's own operating parameters (§10.3 -- distinct
    // from the router configuration tree this process goes on to load
    // and manage).
    let config_file = matches.value_of("config");
    let config = Config::load(config_file);

    init_tracing(&config.logging);
    info!("starting up");

    let registry = Arc::new(module_registry(&config));

    let template = match TemplateTree::load(&config.schema_dir) {
        Ok(template) => Arc::new(template),
        Err(err) => {
            error!(error = %err, dir = %config.schema_dir, "failed to load template tree");
            std::process::exit(1);
        }
    };
    Debug::LoadedTemplate(&config.schema_dir, config.modules.len()).log();

    let dispatcher = ProcessDispatcher::new();
    let mut session = Session::new(template, registry, dispatcher);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create async runtime")
        .block_on(async {
            if let Some(path) = &config.initial_config_file {
                match std::fs::read_to_string(path) {
                    Ok(text) => match session.apply_change(0, &text, "").await {
                        Ok(_) => Debug::AppliedInitialConfig(path).log(),
                        Err(err) => {
                            error!(error = %err, file = %path, "initial configuration was rejected");
                            std::process::exit(1);
                        }
                    },
                    Err(err) => {
                        error!(error = %err, file = %path, "failed to read initial configuration file");
                        std::process::exit(1);
                    }
                }
            }

            // The remote client/session protocol and CLI that would feed
            // further changes to `session.apply_change` are out of scope
            // for this core (§1); absent them, the daemon simply holds
            // the committed configuration and waits to be told to stop.
            let _ = tokio::signal::ctrl_c().await;
            Debug::ShuttingDown.log();
        });
}
