//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! Renders a `ConfigNode` subtree back out as configuration text (§6,
//! §11 supplemented `show_subtree` feature).

use chrono::{DateTime, Utc};
use routecfg_template::{TemplateNode, TemplateTree};
use routecfg_value::Operator;

use crate::node::ConfigNode;

// Controls what a render includes. `Default` renders everything, which
// is what `%commit`-time state dumps and `show_subtree` without
// arguments both want.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions {
    // Include the top-level node's own line, not just its children.
    pub show_top: bool,
    // Omit leaves whose current value equals the template default.
    pub suppress_defaults: bool,
    // Append each node's `client:instance@position` node-id as a comment.
    pub numbered: bool,
}

impl ConfigNode {
    pub fn render(&self, template: &TemplateTree, options: RenderOptions) -> String {
        let mut out = String::new();
        if options.show_top && !self.is_root() {
            render_node(self, tnode_for(template, self), options, 0, &mut out);
        } else {
            render_children(self, template.root(), options, 0, &mut out);
        }
        out
    }
}

// Writes `tree`'s root subtree as a complete configuration file (§6):
// the XORP-style header comment (format version, generating host/user,
// timestamp) followed by `ConfigNode::render`'s body. `load`'s parser
// already treats any `/* ... */` block as whitespace (§6), so the
// header this produces round-trips back through `parser::parse`
// untouched -- `save -> load -> save` differs only in the timestamp
// line.
pub fn render_file(
    tree: &ConfigNode,
    template: &TemplateTree,
    options: RenderOptions,
    host: &str,
    user: &str,
    now: DateTime<Utc>,
) -> String {
    let header = format!(
        "/* XORP configuration file\n * Configuration format: 1.1\n * Generated by {user} on {host} at {}\n */\n",
        now.to_rfc2822(),
    );
    header + &tree.render(template, options)
}

fn tnode_for<'a>(template: &'a TemplateTree, node: &ConfigNode) -> &'a TemplateNode {
    let path: Vec<&str> = node.template_path.iter().map(String::as_str).collect();
    template.find_by_typed_path(
        &path
            .iter()
            .map(|segment| (*segment, None))
            .collect::<Vec<_>>(),
    )
    .unwrap_or_else(|| template.root())
}

// Children are walked in the live tree's own order, which the merge and
// node-id-position machinery already keep consistent with each tag's
// `OrderPolicy` (§4.3 `update_node_id_position`); rendering does not
// re-sort.
fn render_children(
    node: &ConfigNode,
    tnode: &TemplateNode,
    options: RenderOptions,
    indent: usize,
    out: &mut String,
) {
    for child in node.children.iter().filter(|c| !c.deleted) {
        let child_tnode = resolve_child_tnode(tnode, child);
        if options.suppress_defaults
            && child.is_default_value(child_tnode.and_then(|t| t.default.as_ref()))
        {
            continue;
        }
        render_node(child, child_tnode.unwrap_or(tnode), options, indent, out);
    }
}

fn resolve_child_tnode<'a>(parent: &'a TemplateNode, child: &ConfigNode) -> Option<&'a TemplateNode> {
    if let Some(direct) = parent.find_child(&child.segname) {
        return Some(direct);
    }
    parent.children.iter().find(|c| c.is_tag)
}

fn render_node(
    node: &ConfigNode,
    tnode: &TemplateNode,
    options: RenderOptions,
    indent: usize,
    out: &mut String,
) {
    let pad = "    ".repeat(indent);
    let comment = if options.numbered {
        format!(" /* {} */", node.node_id_string())
    } else {
        String::new()
    };

    if node.is_tag {
        out.push_str(&format!(
            "{pad}{} \"{}\"{comment} {{\n",
            tnode.segname, node.segname
        ));
        render_children(node, tnode, options, indent + 1, out);
        out.push_str(&format!("{pad}}};\n"));
    } else if let Some(value) = &node.value {
        let op = if node.operator == Operator::Assign || node.operator == Operator::None {
            ":".to_string()
        } else {
            node.operator.to_string()
        };
        let rendered = match value {
            routecfg_value::TypedValue::Text(_)
            | routecfg_value::TypedValue::Arith(_)
            | routecfg_value::TypedValue::UrlFile(_)
            | routecfg_value::TypedValue::UrlFtp(_)
            | routecfg_value::TypedValue::UrlHttp(_)
            | routecfg_value::TypedValue::UrlTftp(_) => format!("\"{value}\""),
            _ => value.to_string(),
        };
        out.push_str(&format!("{pad}{} {op} {rendered}{comment};\n", node.segname));
    } else if node.children.is_empty() {
        out.push_str(&format!("{pad}{}{comment};\n", node.segname));
    } else {
        out.push_str(&format!("{pad}{}{comment} {{\n", node.segname));
        render_children(node, tnode, options, indent + 1, out);
        out.push_str(&format!("{pad}}};\n"));
    }
}
