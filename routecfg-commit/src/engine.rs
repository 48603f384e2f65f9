//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! The two-pass commit driver (§4.6): module transaction brackets,
//! node life-cycle dispatch in template-declared commit order, and
//! the activation-bubbling and delete-short-circuit rules that decide
//! which action fires on which node.

use futures::future::BoxFuture;

use routecfg_action::{Action, ActionOutcome, DispatchMode, Dispatcher};
use routecfg_config::{ConfigNode, ConfigTree, NodeState};
use routecfg_modules::ModuleRegistry;
use routecfg_template::{OrderPolicy, TemplateNode, TemplateTree};

use crate::debug::Debug;
use crate::error::Error;
use crate::expand::expand_action;
use crate::phase::CommitPhase;

// What a commit actually did, beyond the mutated tree: primarily used
// by tests and logging to assert on which modules a change touched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommitOutcome {
    pub modules_touched: Vec<String>,
}

// Runs the pending changes already merged into `config` through both
// passes and, on success, finalizes them. Validates the whole tree
// (allowed values/ranges/operators, mandatory references, unique-in)
// before any module bracket opens or any action is dispatched, so a
// schema violation always fails before Pass 1 proper begins. Leaves
// `config` untouched on failure up through Pass 1; leaves it partially
// committed on a Pass-2 failure, per §7's propagation policy -- the
// caller decides whether to retry or call `discard_changes`.
pub async fn commit<D: Dispatcher + Send>(
    config: &mut ConfigTree,
    template: &TemplateTree,
    registry: &ModuleRegistry,
    dispatcher: &mut D,
) -> Result<CommitOutcome, Error> {
    config.check_config_tree(template)?;

    let touched = collect_touched_modules(config.root(), template);
    Debug::TouchedModules(&touched).log();
    let order = routecfg_modules::resolve(&touched, registry)?;
    Debug::ModuleOrder(&order).log();

    run_pass(config, template, &order, dispatcher, CommitPhase::Prepare, DispatchMode::DryRun).await?;
    run_pass(config, template, &order, dispatcher, CommitPhase::Apply, DispatchMode::Live).await?;

    config.finalize_commit();
    Ok(CommitOutcome { modules_touched: order })
}

// Runs only the apply pass, skipping Pass 1's dry-run validation and
// therefore its abort bracket. Used for whole-configuration deletion
// (§4.8 `delete_entire_configuration`), where there is nothing left to
// validate against -- every node is already marked for removal.
pub async fn commit_apply_only<D: Dispatcher + Send>(
    config: &mut ConfigTree,
    template: &TemplateTree,
    registry: &ModuleRegistry,
    dispatcher: &mut D,
) -> Result<CommitOutcome, Error> {
    let touched = collect_touched_modules(config.root(), template);
    Debug::TouchedModules(&touched).log();
    let order = routecfg_modules::resolve(&touched, registry)?;
    Debug::ModuleOrder(&order).log();

    run_pass(config, template, &order, dispatcher, CommitPhase::Apply, DispatchMode::Live).await?;

    config.finalize_commit();
    Ok(CommitOutcome { modules_touched: order })
}

async fn run_pass<D: Dispatcher + Send>(
    config: &mut ConfigTree,
    template: &TemplateTree,
    order: &[String],
    dispatcher: &mut D,
    phase: CommitPhase,
    mode: DispatchMode,
) -> Result<(), Error> {
    let mut prepared: Vec<&String> = Vec::new();
    for module in order {
        if let Err(err) = run_module_bracket(template, config, dispatcher, module, phase, mode).await {
            if phase == CommitPhase::Prepare {
                for done in &prepared {
                    Debug::ModuleTransaction(done, CommitPhase::Abort, mode).log();
                }
            }
            return Err(err);
        }
        prepared.push(module);
    }
    visit(config, template, dispatcher, Vec::new(), mode).await?;
    Ok(())
}

// Dispatches the `%modinfo` action(s) declared on the node where
// `module`'s metadata lives, once per pass. This schema format has a
// single action list per command name rather than separate
// start/end-transaction bodies, so both the prepare and apply brackets
// dispatch the same declared action, distinguished only by `mode` and
// logged under the matching `CommitPhase` (see DESIGN.md).
async fn run_module_bracket<D: Dispatcher + Send>(
    template: &TemplateTree,
    config: &ConfigTree,
    dispatcher: &mut D,
    module: &str,
    phase: CommitPhase,
    mode: DispatchMode,
) -> Result<(), Error> {
    let Some((path, tnode)) = find_modinfo_node(template, module) else {
        return Ok(());
    };
    Debug::ModuleTransaction(module, phase, mode).log();
    let default_target = default_target_for(template, &path);
    if let Some(actions) = tnode.commands.get("modinfo") {
        for action in actions {
            let expanded = expand_action(action, template, config, &path, default_target)?;
            dispatch_one(dispatcher, mode, &expanded, &path, "modinfo").await?;
        }
    }
    Ok(())
}

fn find_modinfo_node<'t>(template: &'t TemplateTree, module: &str) -> Option<(Vec<String>, &'t TemplateNode)> {
    find_modinfo_at(template.root(), &mut Vec::new(), module)
}

fn find_modinfo_at<'t>(
    node: &'t TemplateNode,
    path: &mut Vec<String>,
    module: &str,
) -> Option<(Vec<String>, &'t TemplateNode)> {
    if node.module_name == module && node.commands.has("modinfo") {
        return Some((path.clone(), node));
    }
    for child in &node.children {
        path.push(child.segname.clone());
        if let Some(found) = find_modinfo_at(child, path, module) {
            return Some(found);
        }
        path.pop();
    }
    None
}

// Recursively dispatches node life-cycle actions in commit order,
// returning whether an ancestor still needs to fire `%activate` on
// this traversal's behalf.
fn visit<'a, D: Dispatcher + Send>(
    config: &'a mut ConfigTree,
    template: &'a TemplateTree,
    dispatcher: &'a mut D,
    at: Vec<String>,
    mode: DispatchMode,
) -> BoxFuture<'a, Result<bool, Error>> {
    Box::pin(async move {
        let at_strs: Vec<&str> = at.iter().map(String::as_str).collect();
        let Some(node) = config.find(&at_strs) else {
            return Ok(false);
        };
        let deleted = node.deleted;
        let state = node.state();

        let Some(tnode) = template.find_by_path(&at_strs) else {
            return Ok(false);
        };

        if deleted {
            if let Some(actions) = tnode.commands.get("delete") {
                let default_target = default_target_for(template, &at);
                for action in actions {
                    let expanded = expand_action(action, template, config, &at, default_target)?;
                    let outcome = dispatch_one(dispatcher, mode, &expanded, &at, "delete").await?;
                    install_returns(config, &at, outcome);
                }
            }
            Debug::DeleteShortCircuit(&at.join(".")).log();
            return Ok(false);
        }

        if !subtree_changed(node) {
            Debug::SubtreeSkipped(&at.join(".")).log();
            return Ok(false);
        }

        let own_needs_activate = matches!(state, NodeState::New);

        if tnode.is_settable_leaf() {
            if matches!(state, NodeState::New | NodeState::Modified) {
                if let Some(actions) = tnode.commands.get("set") {
                    let default_target = default_target_for(template, &at);
                    for action in actions {
                        let expanded = expand_action(action, template, config, &at, default_target)?;
                        let outcome = dispatch_one(dispatcher, mode, &expanded, &at, "set").await?;
                        install_returns(config, &at, outcome);
                    }
                }
            }
        } else if matches!(state, NodeState::New) {
            if let Some(actions) = tnode.commands.get("create") {
                let default_target = default_target_for(template, &at);
                for action in actions {
                    let expanded = expand_action(action, template, config, &at, default_target)?;
                    let outcome = dispatch_one(dispatcher, mode, &expanded, &at, "create").await?;
                    install_returns(config, &at, outcome);
                }
            }
        }

        let child_segnames = {
            let node = config.find(&at_strs).expect("node is present, checked above");
            ordered_child_segnames(node, template)
        };

        let mut bubbled_activate = false;
        for segname in child_segnames {
            let mut child_at = at.clone();
            child_at.push(segname);
            if visit(&mut *config, template, &mut *dispatcher, child_at, mode).await? {
                bubbled_activate = true;
            }
        }

        if matches!(state, NodeState::Modified) {
            if let Some(actions) = tnode.commands.get("update") {
                let default_target = default_target_for(template, &at);
                for action in actions {
                    let expanded = expand_action(action, template, config, &at, default_target)?;
                    dispatch_one(dispatcher, mode, &expanded, &at, "update").await?;
                }
            }
        }

        let needs_activate = own_needs_activate || bubbled_activate;
        if needs_activate {
            if let Some(actions) = tnode.commands.get("activate") {
                Debug::NeedsActivate(&at.join(".")).log();
                let default_target = default_target_for(template, &at);
                for action in actions {
                    let expanded = expand_action(action, template, config, &at, default_target)?;
                    dispatch_one(dispatcher, mode, &expanded, &at, "activate").await?;
                }
                return Ok(false);
            }
        }
        Ok(needs_activate)
    })
}

async fn dispatch_one<D: Dispatcher + Send>(
    dispatcher: &mut D,
    mode: DispatchMode,
    action: &Action,
    path: &[String],
    command: &str,
) -> Result<ActionOutcome, Error> {
    let path_str = path.join(".");
    Debug::Dispatching(&path_str, command, mode).log();
    dispatcher
        .dispatch(mode, action)
        .await
        .map_err(|source| Error::Action { path: path_str, command: command.to_string(), source })
}

fn install_returns(config: &mut ConfigTree, path: &[String], outcome: ActionOutcome) {
    if outcome.captured.is_empty() {
        return;
    }
    let path_strs: Vec<&str> = path.iter().map(String::as_str).collect();
    if let Some(node) = config.find_mut(&path_strs) {
        for (var, atom) in outcome.captured {
            node.variables.insert(var, atom);
        }
    }
}

fn subtree_changed(node: &ConfigNode) -> bool {
    !matches!(node.state(), NodeState::Clean) || node.children.iter().any(subtree_changed)
}

// Walks ancestors nearest-first so a closer `%default-target` wins, per
// §4.5's static resolution of the bare `"$"` target shortcut. Not
// inherited at parse time (only the declaring node carries it), so this
// is recomputed per dispatch rather than baked into the schema.
fn default_target_for<'t>(template: &'t TemplateTree, at: &[String]) -> Option<&'t str> {
    let mut result = template.root().default_target_name.as_deref();
    for depth in 1..=at.len() {
        let prefix: Vec<&str> = at[..depth].iter().map(String::as_str).collect();
        if let Some(tnode) = template.find_by_path(&prefix) {
            if let Some(name) = tnode.default_target_name.as_deref() {
                result = Some(name);
            }
        }
    }
    result
}

// Collects the module names of every non-clean node in the pending
// tree (§4.7), deduplicated in discovery order.
fn collect_touched_modules(root: &ConfigNode, template: &TemplateTree) -> Vec<String> {
    let mut touched = Vec::new();
    collect_touched_at(root, template, &mut Vec::new(), &mut touched);
    touched
}

fn collect_touched_at(
    node: &ConfigNode,
    template: &TemplateTree,
    path: &mut Vec<String>,
    touched: &mut Vec<String>,
) {
    if !node.is_root() && !matches!(node.state(), NodeState::Clean) {
        let path_strs: Vec<&str> = path.iter().map(String::as_str).collect();
        if let Some(tnode) = template.find_by_path(&path_strs) {
            if !touched.contains(&tnode.module_name) {
                touched.push(tnode.module_name.clone());
            }
        }
    }
    for child in &node.children {
        path.push(child.segname.clone());
        collect_touched_at(child, template, path, touched);
        path.pop();
    }
}

// Orders `node`'s children for traversal (§4.2, §4.6, §8 ordering
// scenario): a tag family sorts by its own `order` policy on the
// instance's key, or -- when the tag itself declares no policy -- by
// whichever direct child leaf of the tag does, read off each instance's
// current value for that leaf. Anything else keeps insertion order.
fn ordered_child_segnames(node: &ConfigNode, template: &TemplateTree) -> Vec<String> {
    let mut indexed: Vec<(usize, &ConfigNode)> = node.children.iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| match (sort_key(a, template), sort_key(b, template)) {
        (Some(ka), Some(kb)) => ka.cmp(&kb).then(ia.cmp(ib)),
        _ => ia.cmp(ib),
    });
    indexed.into_iter().map(|(_, c)| c.segname.clone()).collect()
}

fn sort_key(child: &ConfigNode, template: &TemplateTree) -> Option<(i64, String)> {
    if !child.is_tag {
        return None;
    }
    let path_strs: Vec<&str> = child.template_path.iter().map(String::as_str).collect();
    let tag_tnode = template.find_by_path(&path_strs)?;

    if tag_tnode.order != OrderPolicy::Unsorted {
        return Some(order_key(&child.segname, tag_tnode.order));
    }

    let ordered_leaf = tag_tnode
        .children
        .iter()
        .find(|c| c.segname != "@" && c.order != OrderPolicy::Unsorted)?;
    let leaf_value = child
        .find_child(&ordered_leaf.segname)
        .and_then(|leaf| leaf.value.as_ref())
        .map(|v| v.to_string())
        .unwrap_or_default();
    Some(order_key(&leaf_value, ordered_leaf.order))
}

fn order_key(text: &str, policy: OrderPolicy) -> (i64, String) {
    match policy {
        OrderPolicy::SortedNumeric => (leading_number(text), text.to_string()),
        OrderPolicy::SortedAlphabetic | OrderPolicy::Unsorted => (0, text.to_string()),
    }
}

fn leading_number(s: &str) -> i64 {
    let digits: String = s
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use routecfg_action::testing::FakeDispatcher;
    use routecfg_config::ConfigNode;
    use routecfg_modules::ModuleRegistry;
    use routecfg_template::{TemplateNode, parser as tparser};
    use routecfg_value::{Operator, TypedValue};

    use super::*;

    fn template_with(text: &str) -> TemplateTree {
        let mut root = TemplateNode::new_void("", "");
        tparser::parse_into(text, "t.tp", &mut root).unwrap();
        TemplateTree::from_parsed_root(root).unwrap()
    }

    fn new_child(segname: &str, path: Vec<String>, is_tag: bool, is_leaf: bool) -> ConfigNode {
        ConfigNode::new_child(segname, path, is_tag, is_leaf, 1, 7, Utc::now())
    }

    #[tokio::test]
    async fn create_then_set_on_first_commit() {
        let template = template_with(
            r#"
            interfaces {
                interface @: txt {
                    %create: program "/bin/true";
                    mtu: u32 = 1500 {
                        %set: program "/bin/true";
                    };
                };
            };
            "#,
        );

        let mut config = ConfigTree::new();
        let mut eth0 = new_child("eth0", vec!["interfaces".to_string(), "eth0".to_string()], true, true);
        eth0.value = Some(TypedValue::Text("eth0".to_string()));
        eth0.has_value = true;
        let mut mtu = new_child(
            "mtu",
            vec!["interfaces".to_string(), "eth0".to_string(), "mtu".to_string()],
            false,
            true,
        );
        mtu.value = Some(TypedValue::UInt32(1400));
        mtu.operator = Operator::Assign;
        mtu.has_value = true;
        eth0.children.push(mtu);
        let mut interfaces = new_child("interfaces", vec!["interfaces".to_string()], false, false);
        interfaces.existence_committed = true;
        interfaces.value_committed = true;
        interfaces.children.push(eth0);
        config.root_mut().children.push(interfaces);

        let registry = ModuleRegistry::new();
        let mut dispatcher = FakeDispatcher::new();
        commit(&mut config, &template, &registry, &mut dispatcher).await.unwrap();

        // One %create and one %set, each dispatched once per pass (dry-run then live).
        assert_eq!(dispatcher.calls, vec!["/bin/true".to_string(); 4]);
        let eth0 = config.find(&["interfaces", "eth0"]).unwrap();
        assert_eq!(eth0.state(), NodeState::Clean);
    }

    #[tokio::test]
    async fn delete_short_circuits_children() {
        let template = template_with(
            r#"
            interfaces {
                interface @: txt {
                    %delete: program "/bin/true";
                    mtu: u32 = 1500 {
                        %set: program "/bin/true";
                    };
                };
            };
            "#,
        );

        let mut config = ConfigTree::new();
        let mut eth0 = new_child("eth0", vec!["interfaces".to_string(), "eth0".to_string()], true, true);
        eth0.value = Some(TypedValue::Text("eth0".to_string()));
        eth0.has_value = true;
        eth0.existence_committed = true;
        eth0.value_committed = true;
        eth0.deleted = true;
        let mut mtu = new_child(
            "mtu",
            vec!["interfaces".to_string(), "eth0".to_string(), "mtu".to_string()],
            false,
            true,
        );
        mtu.value = Some(TypedValue::UInt32(1400));
        mtu.operator = Operator::Assign;
        mtu.has_value = true;
        mtu.existence_committed = true;
        mtu.value_committed = true;
        eth0.children.push(mtu);
        let mut interfaces = new_child("interfaces", vec!["interfaces".to_string()], false, false);
        interfaces.existence_committed = true;
        interfaces.value_committed = true;
        interfaces.children.push(eth0);
        config.root_mut().children.push(interfaces);

        let registry = ModuleRegistry::new();
        let mut dispatcher = FakeDispatcher::new();
        commit(&mut config, &template, &registry, &mut dispatcher).await.unwrap();

        // %delete fires once per pass; the mtu child never gets its own turn.
        assert_eq!(dispatcher.calls, vec!["/bin/true".to_string(), "/bin/true".to_string()]);
    }

    #[test]
    fn order_policy_sorts_tag_instances_by_child_leaf() {
        let template = template_with(
            r#"
            routing {
                route @: ipv4net {
                    %create: program "/bin/true";
                    priority: u32 {
                        %order sorted-numeric;
                    };
                };
            };
            "#,
        );

        let mut config = ConfigTree::new();
        let mut routing = new_child("routing", vec!["routing".to_string()], false, false);
        routing.existence_committed = true;
        routing.value_committed = true;
        for (net, priority) in [("10.0.0.0/24", 30u32), ("10.0.1.0/24", 10u32), ("10.0.2.0/24", 20u32)] {
            let mut route = new_child(net, vec!["routing".to_string(), net.to_string()], true, true);
            route.value = Some(TypedValue::parse(routecfg_value::ValueKind::Ipv4Net, net).unwrap());
            route.has_value = true;
            let mut priority_node = new_child(
                "priority",
                vec!["routing".to_string(), net.to_string(), "priority".to_string()],
                false,
                true,
            );
            priority_node.value = Some(TypedValue::UInt32(priority));
            priority_node.operator = Operator::Assign;
            priority_node.has_value = true;
            priority_node.existence_committed = true;
            priority_node.value_committed = true;
            route.children.push(priority_node);
            routing.children.push(route);
        }
        config.root_mut().children.push(routing);

        let segnames = ordered_child_segnames(config.find(&["routing"]).unwrap(), &template);
        assert_eq!(segnames, vec!["10.0.1.0/24", "10.0.2.0/24", "10.0.0.0/24"]);
    }

    #[tokio::test]
    async fn activation_bubbles_to_nearest_declaring_ancestor() {
        let template = template_with(
            r#"
            interfaces {
                interface @: txt {
                    %create: program "/bin/true";
                    %activate: program "/bin/activate";
                    mtu: u32 = 1500;
                };
            };
            "#,
        );

        let mut config = ConfigTree::new();
        let mut eth0 = new_child("eth0", vec!["interfaces".to_string(), "eth0".to_string()], true, true);
        eth0.value = Some(TypedValue::Text("eth0".to_string()));
        eth0.has_value = true;
        let mut interfaces = new_child("interfaces", vec!["interfaces".to_string()], false, false);
        interfaces.existence_committed = true;
        interfaces.value_committed = true;
        interfaces.children.push(eth0);
        config.root_mut().children.push(interfaces);

        let registry = ModuleRegistry::new();
        let mut dispatcher = FakeDispatcher::new();
        commit(&mut config, &template, &registry, &mut dispatcher).await.unwrap();

        assert!(dispatcher.calls.contains(&"/bin/true".to_string()));
        assert!(dispatcher.calls.contains(&"/bin/activate".to_string()));
    }

    #[tokio::test]
    async fn mandatory_reference_failure_aborts_before_any_dispatch() {
        let template = template_with(
            r#"
            protocols {
                ospf {
                    router-id: ipv4;
                    area @: ipv4 {
                        %create: program "/bin/true";
                        interface @: txt {
                            %mandatory "$(protocols.ospf.router-id)";
                        };
                    };
                };
            };
            "#,
        );

        let mut config = ConfigTree::new();
        let area_path = vec!["protocols".to_string(), "ospf".to_string(), "area".to_string(), "0.0.0.0".to_string()];
        let mut iface_path = area_path.clone();
        iface_path.push("interface".to_string());
        iface_path.push("ge-0/0/0".to_string());
        let iface = new_child("ge-0/0/0", iface_path, true, true);
        let mut area = new_child("0.0.0.0", area_path, true, true);
        area.value = Some(TypedValue::parse(routecfg_value::ValueKind::Ipv4Addr, "0.0.0.0").unwrap());
        area.has_value = true;
        area.children.push(iface);
        let mut ospf = new_child("ospf", vec!["protocols".to_string(), "ospf".to_string()], false, false);
        ospf.existence_committed = true;
        ospf.value_committed = true;
        ospf.children.push(area);
        let mut protocols = new_child("protocols", vec!["protocols".to_string()], false, false);
        protocols.existence_committed = true;
        protocols.value_committed = true;
        protocols.children.push(ospf);
        config.root_mut().children.push(protocols);

        let registry = ModuleRegistry::new();
        let mut dispatcher = FakeDispatcher::new();
        let err = commit(&mut config, &template, &registry, &mut dispatcher).await.unwrap_err();

        assert!(matches!(err, Error::Config(routecfg_config::Error::Reference(_))));
        assert!(dispatcher.calls.is_empty());
    }

    #[tokio::test]
    async fn disallowed_value_aborts_before_any_dispatch() {
        let template = template_with(
            r#"
            interfaces {
                interface @: txt {
                    mtu: u32 {
                        %set: program "/bin/true";
                        %allow-range [64..9216];
                    };
                };
            };
            "#,
        );

        let mut config = ConfigTree::new();
        let mut eth0 = new_child("eth0", vec!["interfaces".to_string(), "eth0".to_string()], true, true);
        eth0.value = Some(TypedValue::Text("eth0".to_string()));
        eth0.has_value = true;
        eth0.existence_committed = true;
        eth0.value_committed = true;
        let mut mtu = new_child(
            "mtu",
            vec!["interfaces".to_string(), "eth0".to_string(), "mtu".to_string()],
            false,
            true,
        );
        mtu.value = Some(TypedValue::UInt32(40));
        mtu.operator = Operator::Assign;
        mtu.has_value = true;
        eth0.children.push(mtu);
        let mut interfaces = new_child("interfaces", vec!["interfaces".to_string()], false, false);
        interfaces.existence_committed = true;
        interfaces.value_committed = true;
        interfaces.children.push(eth0);
        config.root_mut().children.push(interfaces);

        let registry = ModuleRegistry::new();
        let mut dispatcher = FakeDispatcher::new();
        let err = commit(&mut config, &template, &registry, &mut dispatcher).await.unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(dispatcher.calls.is_empty());

        config.discard_changes();
        assert!(config.find(&["interfaces", "eth0", "mtu"]).is_none());
    }

    #[test]
    fn subtree_changed_detects_nested_modification() {
        let mut parent = new_child("parent", vec!["parent".to_string()], false, false);
        parent.existence_committed = true;
        parent.value_committed = true;
        let mut child = new_child("child", vec!["parent".to_string(), "child".to_string()], false, true);
        child.existence_committed = true;
        child.value_committed = false;
        parent.children.push(child);
        assert!(subtree_changed(&parent));
    }
}
