//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::HashSet;

use crate::debug::Debug;
use crate::error::Error;
use crate::registry::ModuleRegistry;

// Expands `touched` with every transitive dependency, then emits
// modules in start order (§4.7).
pub fn resolve(touched: &[String], registry: &ModuleRegistry) -> Result<Vec<String>, Error> {
    let mut closure: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut frontier: Vec<String> = touched.to_vec();

    while let Some(name) = frontier.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        closure.push(name.clone());
        if let Some(info) = registry.get(&name) {
            for dep in &info.depends {
                if !seen.contains(dep) {
                    frontier.push(dep.clone());
                }
            }
        } else {
            Debug::UnknownModule(&name).log();
        }
    }

    let order = topo_order(&closure, registry)?;
    Debug::Resolved(&order).log();
    Ok(order)
}

// Orders exactly `names` (no transitive expansion): repeatedly takes
// any not-yet-emitted module whose dependencies, restricted to `names`
// itself, are all already emitted. Modules the registry knows nothing
// about carry no dependencies and are appended at the end, in the
// order they appear in `names` (§4.7).
fn topo_order(names: &[String], registry: &ModuleRegistry) -> Result<Vec<String>, Error> {
    let names_set: HashSet<&String> = names.iter().collect();
    let (known, unknown): (Vec<String>, Vec<String>) =
        names.iter().cloned().partition(|name| registry.contains(name));

    let mut emitted: Vec<String> = Vec::new();
    let mut emitted_set: HashSet<String> = HashSet::new();
    let mut remaining = known;

    while !remaining.is_empty() {
        let before = remaining.len();
        let mut next_remaining = Vec::new();

        for name in &remaining {
            let info = registry.get(name).expect("partitioned as known above");
            let ready = info
                .depends
                .iter()
                .all(|dep| emitted_set.contains(dep) || !names_set.contains(dep));
            if ready {
                emitted.push(name.clone());
                emitted_set.insert(name.clone());
            } else {
                next_remaining.push(name.clone());
            }
        }

        if next_remaining.len() == before {
            return Err(Error::Cycle(next_remaining));
        }
        remaining = next_remaining;
    }

    emitted.extend(unknown);
    Ok(emitted)
}

// The set difference `all_modules ∖ active_modules`, ordered the same
// way a start would have ordered them, so a module's dependents are
// stopped before it is (§4.7). Unlike `resolve`, this does not pull in
// transitive dependencies of the modules being stopped -- a still-active
// module that happens to be a dependency must not be shut down.
pub fn shutdown_order(
    all_modules: &[String],
    active_modules: &[String],
    registry: &ModuleRegistry,
) -> Result<Vec<String>, Error> {
    let active: HashSet<&String> = active_modules.iter().collect();
    let to_stop: Vec<String> = all_modules
        .iter()
        .filter(|name| !active.contains(name))
        .cloned()
        .collect();
    let mut order = topo_order(&to_stop, registry)?;
    order.reverse();
    Ok(order)
}
