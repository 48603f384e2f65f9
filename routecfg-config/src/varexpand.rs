//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! Resolves a `$(...)` reference against a live configuration tree,
//! rather than just the schema (§4.2, §C4). `TemplateTree::find_varname_node`
//! does the path arithmetic; this module walks the resulting path into
//! the configuration tree and decides what the reference ultimately
//! names.

use routecfg_template::{TemplateNode, TemplateTree, VarRef, VarRefKind};

use crate::debug::Debug;
use crate::node::ConfigNode;
use crate::tree::ConfigTree;

// What a resolved `$(...)` reference ultimately names, once both the
// schema path and the live tree have been consulted.
#[derive(Debug)]
pub enum VarResolution<'a> {
    NodeValue(&'a ConfigNode),
    NodeOperator(&'a ConfigNode),
    NodeId(&'a ConfigNode),
    Named(&'a ConfigNode, String),
    TemplateDefault(&'a TemplateNode),
    None,
}

// Resolves `var_ref`, written on the node at `at`, against `config`.
// `ignore_deleted`: a reference to a node currently scheduled for
// deletion resolves to `None` rather than its stale value, matching the
// commit engine's use when expanding an action about to run in the
// `Apply` phase of a subtree that is itself being deleted.
pub fn resolve<'a>(
    config: &'a ConfigTree,
    template: &TemplateTree,
    at: &[String],
    var_ref: &VarRef,
    ignore_deleted: bool,
) -> VarResolution<'a> {
    let Some(path) = template.find_varname_node(at, var_ref) else {
        return resolve_named(config, template, at, var_ref, ignore_deleted);
    };
    let path_strs: Vec<&str> = path.iter().map(String::as_str).collect();

    if matches!(var_ref.kind, VarRefKind::Default) {
        return match template.find_by_path(&path_strs) {
            Some(tnode) => VarResolution::TemplateDefault(tnode),
            None => VarResolution::None,
        };
    }

    let Some(node) = config.find(&path_strs) else {
        return VarResolution::None;
    };
    if ignore_deleted && node.deleted {
        return VarResolution::None;
    }

    let resolution = match &var_ref.kind {
        VarRefKind::Value => VarResolution::NodeValue(node),
        VarRefKind::Operator => VarResolution::NodeOperator(node),
        VarRefKind::NodeId => VarResolution::NodeId(node),
        VarRefKind::Named(name) => VarResolution::Named(node, name.clone()),
        VarRefKind::Default => unreachable!("handled above"),
    };
    Debug::VarRefResolved(&path.join("."), &node.segname).log();
    resolution
}

// `find_varname_node` failed, meaning the last path segment is not a
// declared template child at all. The reference may still name a value
// an action captured onto its node via a return spec rather than one
// configured through the schema (§4.6, §11 `%modinfo`/return handling):
// strip the last segment, resolve the *parent* through the schema as
// usual, and check the live parent node's captured-variable map for the
// final segment as a key.
fn resolve_named<'a>(
    config: &'a ConfigTree,
    template: &TemplateTree,
    at: &[String],
    var_ref: &VarRef,
    ignore_deleted: bool,
) -> VarResolution<'a> {
    if var_ref.path.len() < 2 {
        return VarResolution::None;
    }
    let Some((name, parent_path)) = var_ref.path.split_last() else {
        return VarResolution::None;
    };
    let parent_ref = VarRef {
        path: parent_path.to_vec(),
        kind: VarRefKind::Value,
    };
    let Some(path) = template.find_varname_node(at, &parent_ref) else {
        return VarResolution::None;
    };
    let path_strs: Vec<&str> = path.iter().map(String::as_str).collect();
    let Some(node) = config.find(&path_strs) else {
        return VarResolution::None;
    };
    if ignore_deleted && node.deleted {
        return VarResolution::None;
    }
    // The parent resolved against the schema even though `name` itself
    // never did -- strong enough evidence this is a captured-variable
    // reference rather than a typo. Whether `name` has actually been
    // captured yet is the caller's concern (it may not have run this
    // commit, see §11 scenario S5); report the resolution regardless.
    Debug::VarRefResolved(&path.join("."), &node.segname).log();
    VarResolution::Named(node, name.clone())
}

// Evaluates a `~VAR` backtick-negation reference (§C5): resolves `VAR`
// as a boolean node value and returns its negation rendered as text.
// Anything other than a `~`-prefixed boolean reference is not a
// backtick expression this crate understands and resolves to `None`.
pub fn resolve_backtick(
    config: &ConfigTree,
    template: &TemplateTree,
    at: &[String],
    text: &str,
) -> Option<String> {
    let rest = text.strip_prefix('~')?;
    let var_ref = VarRef::parse(rest);
    match resolve(config, template, at, &var_ref, true) {
        VarResolution::NodeValue(node) => {
            let current = matches!(node.value, Some(routecfg_value::TypedValue::Bool(true)));
            Some((!current).to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use routecfg_template::parser as tparser;

    use super::*;

    fn sample() -> (TemplateTree, ConfigTree) {
        let mut root = routecfg_template::TemplateNode::new_void("", "");
        tparser::parse_into(
            r#"
            interfaces {
                interface @: txt {
                    mtu: u32 = 1500;
                };
            };
            "#,
            "t.tp",
            &mut root,
        )
        .unwrap();
        let template = TemplateTree::from_parsed_root(root).unwrap();

        let now = Utc::now();
        let mut mtu = ConfigNode::new_child(
            "mtu",
            vec!["interfaces".to_string(), "eth0".to_string(), "mtu".to_string()],
            false,
            true,
            1,
            7,
            now,
        );
        mtu.value = Some(routecfg_value::TypedValue::UInt32(9000));
        mtu.has_value = true;

        let mut eth0 = ConfigNode::new_child(
            "eth0",
            vec!["interfaces".to_string(), "eth0".to_string()],
            false,
            true,
            1,
            7,
            now,
        );
        eth0.value = Some(routecfg_value::TypedValue::Text("eth0".to_string()));
        eth0.has_value = true;
        eth0.children.push(mtu);

        let mut interfaces = ConfigNode::new_child(
            "interfaces",
            vec!["interfaces".to_string()],
            false,
            false,
            1,
            7,
            now,
        );
        interfaces.children.push(eth0);

        let mut config = ConfigTree::new();
        config.root_mut().children.push(interfaces);

        (template, config)
    }

    #[test]
    fn resolves_self_value() {
        let (template, config) = sample();
        let at = vec!["interfaces".to_string(), "eth0".to_string()];
        let var_ref = VarRef::parse("@.mtu");
        match resolve(&config, &template, &at, &var_ref, false) {
            VarResolution::NodeValue(node) => {
                assert_eq!(node.value, Some(routecfg_value::TypedValue::UInt32(9000)));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn unresolvable_child_segment_falls_back_to_named() {
        // "nope" is not a declared child of eth0, but eth0 itself resolves
        // fine against the schema, so this is treated as a reference to a
        // captured action-return variable rather than a dangling path.
        let (template, config) = sample();
        let at = vec!["interfaces".to_string(), "eth0".to_string()];
        let var_ref = VarRef::parse("@.nope");
        match resolve(&config, &template, &at, &var_ref, false) {
            VarResolution::Named(node, name) => {
                assert_eq!(node.segname, "eth0");
                assert_eq!(name, "nope");
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn missing_reference_resolves_to_none_when_parent_itself_is_unknown() {
        let (template, config) = sample();
        let at = vec!["interfaces".to_string(), "eth0".to_string()];
        let var_ref = VarRef::parse("bogus.ancestor.nope");
        assert!(matches!(
            resolve(&config, &template, &at, &var_ref, false),
            VarResolution::None
        ));
    }

    #[test]
    fn named_reference_reads_captured_variable() {
        let (template, mut config) = sample();
        {
            let eth0 = config.find_mut(&["interfaces", "eth0"]).unwrap();
            eth0.variables.insert(
                "key".to_string(),
                routecfg_action::ReturnAtom::Text("abc123".to_string()),
            );
        }
        let at = vec!["interfaces".to_string(), "eth0".to_string()];
        let var_ref = VarRef::parse("@.key");
        match resolve(&config, &template, &at, &var_ref, false) {
            VarResolution::Named(node, name) => {
                assert_eq!(name, "key");
                assert_eq!(
                    node.variables.get(&name),
                    Some(&routecfg_action::ReturnAtom::Text("abc123".to_string()))
                );
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }
}
