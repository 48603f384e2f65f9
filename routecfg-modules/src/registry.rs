//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::HashMap;

// A module's declared dependency metadata, the Rust-side equivalent of
// an XORP `%modinfo provides`/`depends` block.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ModuleInfo {
    pub name: String,
    pub depends: Vec<String>,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>) -> Self {
        ModuleInfo { name: name.into(), depends: Vec::new() }
    }

    pub fn depends_on(mut self, module: impl Into<String>) -> Self {
        self.depends.push(module.into());
        self
    }
}

// The known set of modules and their dependency edges, typically built
// once at daemon startup from the schema's module declarations.
#[derive(Clone, Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, ModuleInfo>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        ModuleRegistry::default()
    }

    pub fn register(&mut self, info: ModuleInfo) {
        self.modules.insert(info.name.clone(), info);
    }

    pub fn get(&self, name: &str) -> Option<&ModuleInfo> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }
}

impl FromIterator<ModuleInfo> for ModuleRegistry {
    fn from_iter<I: IntoIterator<Item = ModuleInfo>>(iter: I) -> Self {
        let mut registry = ModuleRegistry::new();
        for info in iter {
            registry.register(info);
        }
        registry
    }
}
