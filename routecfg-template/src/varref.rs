//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! Parses the `$(...)` variable-reference syntax shared by template
//! commands and configuration-time expansion. Resolution against a
//! concrete tree (template or configuration) is the caller's job; this
//! module only turns the raw text into a structured request.

// What a variable reference ultimately asks for, once a node has been
// located.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VarRefKind {
    // `$(@)` or `$(path)`: the referenced node's current value.
    Value,
    // `$(<>)`: the referenced node's operator.
    Operator,
    // `$(#)`: the referenced node's node-id.
    NodeId,
    // `$(path)DEFAULT` (trailing literal, no parens): the referenced
    // node's template default.
    Default,
    // A named variable set on the referenced node by a prior action's
    // return spec, e.g. `$(@.key)` where `key` was captured rather than
    // configured.
    Named(String),
}

// A parsed `$(...)` reference: how to locate the node, and what to
// fetch from it once found.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VarRef {
    // Path segments, first-to-last. An empty path means "the current
    // node". The special segment `"@"` means "start the walk from the
    // current node" (rather than searching ancestors for a name match).
    pub path: Vec<String>,
    pub kind: VarRefKind,
}

// ===== impl VarRef =====

impl VarRef {
    // Parses the raw text found inside `$(...)`.
    pub fn parse(text: &str) -> VarRef {
        let text = text.trim();

        if text == "@" {
            return VarRef {
                path: vec!["@".to_string()],
                kind: VarRefKind::Value,
            };
        }
        if text == "<>" {
            return VarRef {
                path: vec!["@".to_string()],
                kind: VarRefKind::Operator,
            };
        }
        if text == "#" {
            return VarRef {
                path: vec!["@".to_string()],
                kind: VarRefKind::NodeId,
            };
        }

        let (body, kind_suffix) = if let Some(stripped) = text.strip_suffix("<>") {
            (stripped.trim_end_matches('.'), Some(VarRefKind::Operator))
        } else if let Some(stripped) = text.strip_suffix("#") {
            (stripped.trim_end_matches('.'), Some(VarRefKind::NodeId))
        } else if let Some(stripped) = text.strip_suffix("DEFAULT") {
            (stripped.trim_end_matches('.'), Some(VarRefKind::Default))
        } else {
            (text, None)
        };

        let path: Vec<String> = body.split('.').map(str::to_string).collect();
        let kind = kind_suffix.unwrap_or(VarRefKind::Value);

        VarRef { path, kind }
    }

    // Whether the walk begins from the current node rather than by
    // searching ancestors for a name match.
    pub fn starts_at_self(&self) -> bool {
        matches!(self.path.first().map(String::as_str), Some("@"))
    }
}
