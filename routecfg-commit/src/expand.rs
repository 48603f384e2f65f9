//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! Substitutes every `$(...)` and backtick placeholder in an action
//! body's raw text against the live configuration tree (§4.5, §4.6),
//! immediately before the body is handed to a dispatcher.

use routecfg_action::action::CallArg;
use routecfg_action::{Action, RemoteCall, ReturnAtom, SubprocessCall};
use routecfg_config::ConfigTree;
use routecfg_config::varexpand::{self, VarResolution};
use routecfg_template::{TemplateTree, VarRef};

use crate::error::Error;

// Expands every placeholder in `action`'s raw text, producing a concrete
// action ready for a dispatcher. `at` is the template path of the node
// the action is declared on; `default_target` is that node's inherited
// `default_target_name`, used for the bare `"$"` target shortcut.
pub fn expand_action(
    action: &Action,
    template: &TemplateTree,
    config: &ConfigTree,
    at: &[String],
    default_target: Option<&str>,
) -> Result<Action, Error> {
    match action {
        Action::Remote(call) => Ok(Action::Remote(expand_remote_call(call, template, config, at, default_target)?)),
        Action::Subprocess(call) => {
            Ok(Action::Subprocess(SubprocessCall {
                command_line: substitute_text(&call.command_line, template, config, at)?,
                stdout_var: call.stdout_var.clone(),
                stderr_var: call.stderr_var.clone(),
            }))
        }
    }
}

fn expand_remote_call(
    call: &RemoteCall,
    template: &TemplateTree,
    config: &ConfigTree,
    at: &[String],
    default_target: Option<&str>,
) -> Result<RemoteCall, Error> {
    let target = expand_target(&call.target, template, config, at, default_target)?;
    let mut args = Vec::with_capacity(call.args.len());
    for arg in &call.args {
        args.push(CallArg {
            name: arg.name.clone(),
            kind: arg.kind,
            value: substitute_text(&arg.value, template, config, at)?,
        });
    }
    Ok(RemoteCall {
        target,
        method: call.method.clone(),
        args,
        returns: call.returns.clone(),
    })
}

// A target beginning with a literal, unparenthesized `$` names "the
// declaring module's default target" (§4.5); everything else, including
// a target that itself embeds `$(...)` references, goes through the
// ordinary substitution scan.
fn expand_target(
    text: &str,
    template: &TemplateTree,
    config: &ConfigTree,
    at: &[String],
    default_target: Option<&str>,
) -> Result<String, Error> {
    if let Some(rest) = text.strip_prefix('$') {
        if !rest.starts_with('(') {
            return Ok(format!("{}{rest}", default_target.unwrap_or_default()));
        }
    }
    substitute_text(text, template, config, at)
}

// Scans `text` for `$(...)` and `` `...` `` spans and replaces each with
// its resolved rendering, leaving everything else untouched. Mirrors the
// span-finding logic of `routecfg_action::token`, which only extracts
// spans rather than splicing replacements in.
fn substitute_text(text: &str, template: &TemplateTree, config: &ConfigTree, at: &[String]) -> Result<String, Error> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '$' && chars.get(i + 1) == Some(&'(') {
            let start = i + 2;
            let mut j = start;
            let mut depth = 1;
            while j < chars.len() && depth > 0 {
                match chars[j] {
                    '(' => depth += 1,
                    ')' => depth -= 1,
                    _ => {}
                }
                if depth > 0 {
                    j += 1;
                }
            }
            let inner: String = chars[start..j].iter().collect();
            out.push_str(&render_var_ref(&inner, template, config, at)?);
            i = j + 1;
            continue;
        }

        if chars[i] == '`' {
            let start = i + 1;
            let mut j = start;
            while j < chars.len() && chars[j] != '`' {
                j += 1;
            }
            let inner: String = chars[start..j].iter().collect();
            let rendered = varexpand::resolve_backtick(config, template, at, &format!("`{inner}`"))
                .or_else(|| varexpand::resolve_backtick(config, template, at, &inner))
                .ok_or_else(|| Error::Reference(format!("unresolved backtick expression: `{inner}`")))?;
            out.push_str(&rendered);
            i = j + 1;
            continue;
        }

        out.push(chars[i]);
        i += 1;
    }

    Ok(out)
}

fn render_var_ref(text: &str, template: &TemplateTree, config: &ConfigTree, at: &[String]) -> Result<String, Error> {
    let var_ref = VarRef::parse(text);
    match varexpand::resolve(config, template, at, &var_ref, true) {
        VarResolution::NodeValue(node) => node
            .value
            .as_ref()
            .map(|v| v.to_string())
            .ok_or_else(|| Error::Reference(format!("'{text}' names a node with no value"))),
        VarResolution::NodeOperator(node) => Ok(node.operator.to_string()),
        VarResolution::NodeId(node) => Ok(node.node_id_string()),
        VarResolution::TemplateDefault(tnode) => tnode
            .default
            .as_ref()
            .map(|v| v.to_string())
            .ok_or_else(|| Error::Reference(format!("'{text}' names a node with no default"))),
        VarResolution::Named(node, name) => match node.variables.get(&name) {
            Some(atom) => Ok(render_atom(atom)),
            None => {
                tracing::warn!(reference = %text, node = %node.segname, "captured variable not yet set, expanding to empty string");
                Ok(String::new())
            }
        },
        VarResolution::None => Err(Error::Reference(format!("unresolved variable reference: {text}"))),
    }
}

fn render_atom(atom: &ReturnAtom) -> String {
    atom.to_string()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use routecfg_action::Action;
    use routecfg_config::ConfigNode;
    use routecfg_template::{TemplateNode, parser as tparser};
    use routecfg_value::{Operator, TypedValue};

    use super::*;

    fn sample() -> (TemplateTree, ConfigTree) {
        let mut root = TemplateNode::new_void("", "");
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
        mtu.value = Some(TypedValue::UInt32(9000));
        mtu.operator = Operator::Assign;
        mtu.has_value = true;

        let mut eth0 = ConfigNode::new_child(
            "eth0",
            vec!["interfaces".to_string(), "eth0".to_string()],
            true,
            true,
            1,
            7,
            now,
        );
        eth0.value = Some(TypedValue::Text("eth0".to_string()));
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
    fn expands_remote_call_args() {
        let (template, config) = sample();
        let at = vec!["interfaces".to_string(), "eth0".to_string(), "mtu".to_string()];
        let action = Action::parse(r#"xrl "fea/1.0/set_mtu?ifname:txt=$(interfaces.eth0)&mtu:u32=$(@)""#).unwrap();
        let expanded = expand_action(&action, &template, &config, &at, None).unwrap();
        let Action::Remote(call) = expanded else {
            panic!("expected remote call");
        };
        assert_eq!(call.args[0].value, "eth0");
        assert_eq!(call.args[1].value, "9000");
    }

    #[test]
    fn bare_dollar_target_resolves_to_default_target() {
        let (template, config) = sample();
        let at = vec!["interfaces".to_string(), "eth0".to_string(), "mtu".to_string()];
        let action = Action::parse(r#"xrl "$/1.0/set_mtu?mtu:u32=$(@)""#).unwrap();
        let expanded = expand_action(&action, &template, &config, &at, Some("fea")).unwrap();
        let Action::Remote(call) = expanded else {
            panic!("expected remote call");
        };
        assert_eq!(call.target, "fea/1.0");
    }

    #[test]
    fn missing_named_variable_expands_to_empty_string() {
        let (template, config) = sample();
        let at = vec!["interfaces".to_string(), "eth0".to_string()];
        let action = Action::parse(r#"xrl "keymgr/1.0/set_fp?fp:txt=$(@.key)""#).unwrap();
        let expanded = expand_action(&action, &template, &config, &at, None).unwrap();
        let Action::Remote(call) = expanded else {
            panic!("expected remote call");
        };
        assert_eq!(call.args[0].value, "");
    }

    #[test]
    fn subprocess_command_line_is_expanded() {
        let (template, config) = sample();
        let at = vec!["interfaces".to_string(), "eth0".to_string(), "mtu".to_string()];
        let action = Action::parse(r#"program "/sbin/ifconfig eth0 mtu $(@)""#).unwrap();
        let expanded = expand_action(&action, &template, &config, &at, None).unwrap();
        let Action::Subprocess(call) = expanded else {
            panic!("expected subprocess call");
        };
        assert_eq!(call.command_line, "/sbin/ifconfig eth0 mtu 9000");
    }
}
