//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use routecfg_action::Action;
use routecfg_value::{Operator, TypedValue, ValueKind, ValueRange};

// Render/commit order for a tag node's value-children.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OrderPolicy {
    #[default]
    Unsorted,
    SortedNumeric,
    SortedAlphabetic,
}

// A flag that carries a human-readable reason, e.g. `%deprecated "…"`.
pub type Reason = String;

// A named command (`%create`, `%set`, ...) with its ordered action list.
// `%modinfo` is stored the same way as any other command; the commit
// engine recognizes it by name to bracket transactions rather than to
// dispatch it as a node action.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandSet(pub std::collections::BTreeMap<String, Vec<Action>>);

impl CommandSet {
    pub fn get(&self, command: &str) -> Option<&[Action]> {
        self.0.get(command).map(Vec::as_slice)
    }

    pub fn insert(&mut self, command: impl Into<String>, action: Action) {
        self.0.entry(command.into()).or_default().push(action);
    }

    pub fn has(&self, command: &str) -> bool {
        self.0.contains_key(command)
    }
}

// A single schema node. `kind = None` marks a VOID grouping node; value
// nodes always carry `Some(kind)`.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateNode {
    pub segname: String,
    pub kind: Option<ValueKind>,
    pub is_tag: bool,
    pub default: Option<TypedValue>,
    pub help_short: Option<String>,
    pub help_long: Option<String>,
    pub module_name: String,
    pub default_target_name: Option<String>,
    pub order: OrderPolicy,
    pub deprecated: Option<Reason>,
    pub user_hidden: Option<Reason>,
    pub read_only: Option<Reason>,
    pub permanent: Option<Reason>,
    pub mandatory_config_nodes: Vec<String>,
    pub unique_in: Option<String>,
    pub commands: CommandSet,
    pub allowed_values: Vec<(TypedValue, Option<String>)>,
    pub allowed_ranges: Vec<(ValueRange, Option<String>)>,
    pub allowed_operators: Vec<Operator>,
    pub child_number: usize,
    pub children: Vec<TemplateNode>,

    // Filled in by the expansion pass: the resolved relative path from
    // this node's unique-in scope ancestor, with tag-level steps
    // recorded as `@:=<typestr>` per §4.2.
    pub unique_in_resolved: Option<String>,
}

// ===== impl TemplateNode =====

impl TemplateNode {
    pub fn new_void(segname: impl Into<String>, module_name: impl Into<String>) -> Self {
        TemplateNode {
            segname: segname.into(),
            kind: None,
            is_tag: false,
            default: None,
            help_short: None,
            help_long: None,
            module_name: module_name.into(),
            default_target_name: None,
            order: OrderPolicy::default(),
            deprecated: None,
            user_hidden: None,
            read_only: None,
            permanent: None,
            mandatory_config_nodes: Vec::new(),
            unique_in: None,
            commands: CommandSet::default(),
            allowed_values: Vec::new(),
            allowed_ranges: Vec::new(),
            allowed_operators: Vec::new(),
            child_number: 0,
            children: Vec::new(),
            unique_in_resolved: None,
        }
    }

    pub fn is_value_type(&self) -> bool {
        self.kind.is_some()
    }

    pub fn is_root(&self) -> bool {
        self.segname.is_empty()
    }

    // A leaf is "effectively value-bearing" for `%set` purposes: it has
    // a kind, and it is not itself the tag's key placeholder (`@`).
    pub fn is_settable_leaf(&self) -> bool {
        self.is_value_type() && self.segname != "@"
    }

    pub fn find_child(&self, segname: &str) -> Option<&TemplateNode> {
        self.children.iter().find(|c| c.segname == segname)
    }

    pub fn find_child_mut(&mut self, segname: &str) -> Option<&mut TemplateNode> {
        self.children.iter_mut().find(|c| c.segname == segname)
    }

    // The allowed-operator set, falling back to a kind-appropriate
    // default when the schema declared none (§11 supplemented feature).
    pub fn allowed_operators(&self) -> Vec<Operator> {
        if !self.allowed_operators.is_empty() {
            return self.allowed_operators.clone();
        }
        match self.kind {
            Some(kind) if kind.is_ordered() => {
                vec![Operator::Assign, Operator::Eq, Operator::Ne]
            }
            Some(_) => vec![Operator::Assign],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allowed_operators_for_ordered_kind() {
        let mut node = TemplateNode::new_void("mtu", "test");
        node.kind = Some(ValueKind::UInt32);
        let ops = node.allowed_operators();
        assert!(ops.contains(&Operator::Assign));
        assert!(ops.contains(&Operator::Gte) == false);
    }
}
