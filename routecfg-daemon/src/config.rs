//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! Operating parameters for the `routecfgd` binary itself (§10.3) --
//! not to be confused with the router's own declarative configuration
//! (the C3 tree), which this crate loads and manages at runtime.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    // Directory of `.tp` schema files the template tree is loaded from.
    pub schema_dir: String,
    // Optional configuration-text file (§6) applied at startup.
    pub initial_config_file: Option<String>,
    pub modules: Vec<ModuleConfig>,
    pub logging: Logging,
}

// One entry of the module dependency registry (§C7), normally derived
// from the schema's own `%modinfo` bodies but supplied here directly
// since this core does not parse `provides`/`depends` sub-blocks out
// of the template text (see DESIGN.md).
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    pub name: String,
    #[serde(default)]
    pub depends: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub file: LoggingFile,
    pub stdout: LoggingStdout,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingFile {
    pub enabled: bool,
    pub dir: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingStdout {
    pub enabled: bool,
}

// ===== impl Config =====

impl Config {
    const DFLT_FILEPATH: &'static str = "/etc/routecfgd.toml";

    pub(crate) fn load(config_file: Option<&str>) -> Config {
        let config_file = config_file.unwrap_or(Config::DFLT_FILEPATH);

        match std::fs::read_to_string(config_file) {
            Ok(config_str) => toml::from_str(&config_str)
                .expect("failed to parse configuration file"),
            Err(err) => {
                eprintln!("failed to load configuration file: {err}");
                eprintln!("falling back to default configuration...");
                Config::default()
            }
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            schema_dir: "/etc/routecfgd/templates".to_owned(),
            initial_config_file: None,
            modules: Vec::new(),
            logging: Default::default(),
        }
    }
}

impl Default for LoggingFile {
    fn default() -> LoggingFile {
        LoggingFile {
            enabled: true,
            dir: "/var/log".to_owned(),
            name: "routecfgd.log".to_owned(),
        }
    }
}

impl Default for LoggingStdout {
    fn default() -> LoggingStdout {
        LoggingStdout { enabled: false }
    }
}
