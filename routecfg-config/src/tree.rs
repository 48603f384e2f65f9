//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use chrono::{DateTime, Utc};
use routecfg_template::TemplateTree;
use routecfg_value::{Operator, TypedValue};

use crate::debug::Debug;
use crate::error::Error;
use crate::node::{ConfigNode, NodeId};

// The live configuration tree (§C3). Wraps a single synthetic root
// `ConfigNode` (`template_path` empty, always committed) under which
// every real node hangs.
#[derive(Clone, Debug)]
pub struct ConfigTree {
    root: ConfigNode,
}

// ===== impl ConfigTree =====

impl ConfigTree {
    pub fn new() -> Self {
        ConfigTree { root: ConfigNode::new_root() }
    }

    pub fn root(&self) -> &ConfigNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut ConfigNode {
        &mut self.root
    }

    pub fn find(&self, path: &[&str]) -> Option<&ConfigNode> {
        let mut current = &self.root;
        for segment in path {
            current = current.find_child(segment)?;
        }
        Some(current)
    }

    pub fn find_mut(&mut self, path: &[&str]) -> Option<&mut ConfigNode> {
        let mut current = &mut self.root;
        for segment in path {
            current = current.find_child_mut(segment)?;
        }
        Some(current)
    }

    // Every node whose template module is `module_name`, in tree order.
    // Used by the commit engine to scope Pass-1/Pass-2 traversal and by
    // the module dependency resolver to find a module's configured
    // nodes.
    pub fn find_module<'a>(&'a self, template: &TemplateTree, module_name: &str) -> Vec<&'a ConfigNode> {
        let mut out = Vec::new();
        Self::collect_module(&self.root, template, module_name, &mut out);
        out
    }

    fn collect_module<'a>(
        node: &'a ConfigNode,
        template: &TemplateTree,
        module_name: &str,
        out: &mut Vec<&'a ConfigNode>,
    ) {
        if !node.is_root() {
            let path: Vec<&str> = node.template_path.iter().map(String::as_str).collect();
            if let Some(tnode) = template.find_by_path(&path) {
                if tnode.module_name == module_name {
                    out.push(node);
                }
            }
        }
        for child in &node.children {
            Self::collect_module(child, template, module_name, out);
        }
    }

    // Sets a leaf's value and operator directly, bypassing the delta
    // merge path. Used by callers (e.g. the session facade's
    // programmatic API) that already hold a resolved `ConfigNode` path
    // rather than a parsed delta subtree.
    pub fn set_value(
        &mut self,
        template: &TemplateTree,
        path: &[&str],
        value: TypedValue,
        operator: Operator,
        user: u32,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let tnode = template
            .find_by_path(path)
            .ok_or_else(|| Error::UnknownPath(path.join(".")))?;
        value.check_allowed_values(&tnode.allowed_values.iter().map(|(v, _)| v.clone()).collect::<Vec<_>>())?;
        value.check_allowed_ranges(&tnode.allowed_ranges.iter().map(|(r, _)| r.clone()).collect::<Vec<_>>())?;
        if !tnode.allowed_operators().contains(&operator) {
            return Err(Error::Reference(format!(
                "operator '{operator}' is not permitted on '{}'",
                path.join(".")
            )));
        }
        let node = self
            .find_mut(path)
            .ok_or_else(|| Error::UnknownPath(path.join(".")))?;
        apply_leaf(node, value, operator, user, now, true);
        Ok(())
    }

    // Merges `delta`'s children structurally into the tree rooted at
    // `path` (§4.3). `provisional` marks the merge as part of an
    // in-progress pending change: new nodes stay uncommitted and
    // changed leaves keep their pre-change committed snapshot until the
    // commit engine finalizes or rolls back. A non-provisional merge
    // (used when loading an already-committed configuration file)
    // commits every node it creates immediately.
    pub fn merge_delta(
        &mut self,
        template: &TemplateTree,
        path: &[&str],
        delta: &ConfigNode,
        clientid: u32,
        user: u32,
        now: DateTime<Utc>,
        provisional: bool,
    ) -> Result<(), Error> {
        Debug::MergeDelta(&path.join(".")).log();
        let target = self
            .find_mut(path)
            .ok_or_else(|| Error::UnknownPath(path.join(".")))?;
        // `target` is reached via an explicit path rather than recursion
        // from its own parent, so it can never itself be a tag instance
        // (every caller merges from the root); `fallback_gen` is never
        // consulted at this level.
        let mut scratch_gen = 0u32;
        Self::merge_node(target, &mut scratch_gen, delta, template, clientid, user, now, provisional)
    }

    // `fallback_gen` is the node-ID generator counter to use for
    // `target`'s new children when `target` is itself a tag instance
    // (§4.3 effective-parent redirect): XORP's
    // `ConfigTreeNode::allocate_unique_node_id()` computes
    // `effective_parent = _parent->parent()` in exactly this case, so
    // that every sibling tag instance's leaf children draw from one
    // shared generator instead of each instance restarting its own.
    // When `target` is not a tag, `target`'s own counter is used and
    // `fallback_gen` is ignored.
    fn merge_node(
        target: &mut ConfigNode,
        fallback_gen: &mut u32,
        delta: &ConfigNode,
        template: &TemplateTree,
        clientid: u32,
        user: u32,
        now: DateTime<Utc>,
        provisional: bool,
    ) -> Result<(), Error> {
        let target_is_tag = target.is_tag;
        let target_path = target.template_path.clone();
        let (target_children, target_gen) = target.children_and_gen();

        for delta_child in &delta.children {
            if let Some(existing) = target_children.iter_mut().find(|c| c.segname == delta_child.segname) {
                existing.deleted = false;
                if delta_child.has_value {
                    apply_leaf(
                        existing,
                        delta_child.value.clone().expect("has_value implies value"),
                        delta_child.operator,
                        user,
                        now,
                        provisional,
                    );
                }
                let child_gen = if target_is_tag { &mut *fallback_gen } else { &mut *target_gen };
                Self::merge_node(existing, child_gen, delta_child, template, clientid, user, now, provisional)?;
                continue;
            }

            let mut child_path = target_path.clone();
            child_path.push(delta_child.segname.clone());
            let child_path_strs: Vec<&str> = child_path.iter().map(String::as_str).collect();
            let tnode = template
                .find_by_path(&child_path_strs)
                .ok_or_else(|| Error::UnknownPath(child_path.join(".")))?;

            let mut child = ConfigNode::new_child(
                delta_child.segname.clone(),
                child_path,
                tnode.is_tag,
                tnode.is_value_type() || tnode.is_tag,
                clientid,
                user,
                now,
            );
            let gen = if target_is_tag { &mut *fallback_gen } else { &mut *target_gen };
            let instance_id = *gen;
            *gen += 1;
            let node_id = NodeId { client_id: clientid, instance_id };
            Debug::NodeIdAllocated(&child.segname, &node_id.to_string()).log();
            child.node_id = node_id;
            child.node_id_position = target_children
                .iter()
                .rev()
                .find(|c| !c.deleted)
                .map(|c| c.node_id.instance_id)
                .unwrap_or(0);

            if !provisional {
                child.existence_committed = true;
                child.committed_user_id = user;
                child.committed_modification_time = now;
            }

            if delta_child.has_value {
                apply_leaf(
                    &mut child,
                    delta_child.value.clone().expect("has_value implies value"),
                    delta_child.operator,
                    user,
                    now,
                    provisional,
                );
            }

            target_children.push(child);
            let inserted = target_children.last_mut().expect("just pushed");
            let child_gen = if target_is_tag { &mut *fallback_gen } else { &mut *target_gen };
            Self::merge_node(inserted, child_gen, delta_child, template, clientid, user, now, provisional)?;
        }
        Ok(())
    }

    // Marks every configuration subtree named by a terminal (leaf, in
    // the deletion-tree sense: childless) node of `deletion` as deleted
    // (§4.3). A deletion path with no matching configuration node is a
    // hard error.
    pub fn merge_deletion(
        &mut self,
        path: &[&str],
        deletion: &ConfigNode,
        user: u32,
        now: DateTime<Utc>,
        provisional: bool,
    ) -> Result<(), Error> {
        Debug::MergeDeletion(&path.join(".")).log();
        let target = self
            .find_mut(path)
            .ok_or_else(|| Error::UnknownPath(path.join(".")))?;
        Self::merge_deletion_node(target, deletion, user, now, provisional)
    }

    fn merge_deletion_node(
        target: &mut ConfigNode,
        deletion: &ConfigNode,
        user: u32,
        now: DateTime<Utc>,
        provisional: bool,
    ) -> Result<(), Error> {
        for d_child in &deletion.children {
            let segname = d_child.segname.clone();
            let existing = target
                .find_child_mut(&segname)
                .ok_or_else(|| Error::DeletionMismatch(segname.clone()))?;

            if !d_child.children.is_empty() {
                Self::merge_deletion_node(existing, d_child, user, now, provisional)?;
                continue;
            }

            if provisional && existing.existence_committed {
                existing.deleted = true;
                existing.value_committed = false;
                existing.user_id = user;
                existing.modification_time = now;
            } else {
                target.children.retain(|c| c.segname != segname);
            }
        }
        Ok(())
    }

    // Seeds every absent template child slot that carries a default
    // with a committed node holding that default (§11
    // `add_default_children`). Does not invent tag instances; walks
    // only nodes already present in the tree.
    pub fn add_default_children(
        &mut self,
        template: &TemplateTree,
        clientid: u32,
        user: u32,
        now: DateTime<Utc>,
    ) {
        Self::fill_defaults(&mut self.root, template, clientid, user, now);
    }

    fn fill_defaults(
        node: &mut ConfigNode,
        template: &TemplateTree,
        clientid: u32,
        user: u32,
        now: DateTime<Utc>,
    ) {
        let path: Vec<&str> = node.template_path.iter().map(String::as_str).collect();
        if let Some(tnode) = template.find_by_path(&path) {
            if !tnode.is_tag {
                for tchild in &tnode.children {
                    if tchild.segname == "@" {
                        continue;
                    }
                    let Some(default) = &tchild.default else {
                        continue;
                    };
                    if node.find_child(&tchild.segname).is_some() {
                        continue;
                    }
                    let mut child_path = node.template_path.clone();
                    child_path.push(tchild.segname.clone());
                    let mut child = ConfigNode::new_child(
                        tchild.segname.clone(),
                        child_path,
                        tchild.is_tag,
                        tchild.is_value_type(),
                        clientid,
                        user,
                        now,
                    );
                    child.value = Some(default.clone());
                    child.operator = Operator::Assign;
                    child.has_value = true;
                    child.existence_committed = true;
                    child.value_committed = true;
                    child.committed_value = child.value.clone();
                    child.committed_operator = Operator::Assign;
                    child.committed_user_id = user;
                    child.committed_modification_time = now;
                    child.node_id = node.allocate_child_id(clientid);
                    child.node_id_position = node
                        .children
                        .iter()
                        .rev()
                        .find(|c| !c.deleted)
                        .map(|c| c.node_id.instance_id)
                        .unwrap_or(0);
                    node.children.push(child);
                }
            }
        }
        for child in &mut node.children {
            Self::fill_defaults(child, template, clientid, user, now);
        }
    }

    // Recomputes every node's `node_id_position` from its current
    // ordered sibling list (§11 `update_node_id_position`). Needed after
    // a deletion is finalized and a formerly-intermediate sibling
    // becomes the new tail a future insertion's position must chain
    // from. Mirrors the effective-parent redirect used at allocation
    // time: a tag instance's children chain their position off the
    // cursor that belongs to the tag's own parent, shared across every
    // sibling instance, rather than each instance restarting at zero.
    pub fn update_node_id_position(&mut self) {
        let mut root_cursor = 0u32;
        Self::reposition(&mut self.root, &mut root_cursor);
    }

    fn reposition(node: &mut ConfigNode, own_children_cursor: &mut u32) {
        for child in &mut node.children {
            if child.deleted {
                continue;
            }
            child.node_id_position = *own_children_cursor;
            *own_children_cursor = child.node_id.instance_id;
        }
        for child in &mut node.children {
            if child.is_tag {
                Self::reposition(child, own_children_cursor);
            } else {
                let mut fresh_cursor = 0u32;
                Self::reposition(child, &mut fresh_cursor);
            }
        }
    }

    // Promotes every uncommitted or modified node to clean, and removes
    // subtrees marked `deleted` (§4.3, run once Pass-2 of a commit
    // succeeds).
    pub fn finalize_commit(&mut self) {
        Self::finalize(&mut self.root);
        self.update_node_id_position();
    }

    fn finalize(node: &mut ConfigNode) {
        node.children.retain(|c| !c.deleted);
        for child in &mut node.children {
            child.existence_committed = true;
            child.value_committed = true;
            child.committed_value = child.value.clone();
            child.committed_operator = child.operator;
            child.committed_user_id = child.user_id;
            child.committed_modification_time = child.modification_time;
            Self::finalize(child);
        }
    }

    // Reverts every uncommitted node back to its last committed state
    // (§4.3, run when Pass-1 of a commit fails): new nodes are dropped,
    // modified leaves revert to their committed value/operator, and
    // nodes marked for deletion are un-marked.
    pub fn discard_changes(&mut self) {
        Self::discard(&mut self.root);
    }

    fn discard(node: &mut ConfigNode) {
        node.children.retain(|c| c.existence_committed);
        for child in &mut node.children {
            if !child.value_committed {
                child.value = child.committed_value.clone();
                child.operator = child.committed_operator;
                child.value_committed = true;
            }
            child.deleted = false;
            Self::discard(child);
        }
    }

    // Structural equality over the whole tree, per `ConfigNode::equals_node`.
    pub fn equals(&self, other: &ConfigTree, compare_node_id: bool) -> bool {
        Self::equals_at(&self.root, &other.root, compare_node_id)
    }

    fn equals_at(a: &ConfigNode, b: &ConfigNode, compare_node_id: bool) -> bool {
        if a.children.len() != b.children.len() {
            return false;
        }
        if !a.is_root() && !a.equals_node(b, compare_node_id) {
            return false;
        }
        a.children
            .iter()
            .zip(&b.children)
            .all(|(a, b)| a.segname == b.segname && Self::equals_at(a, b, compare_node_id))
    }

    // The nodes present in `self` that are new or (when
    // `retain_value_changed`) changed relative to `them`. Brand-new
    // subtrees are retained in full; only the changed branches of an
    // otherwise-shared subtree are retained elsewhere.
    pub fn retain_different(&self, them: &ConfigTree, retain_value_changed: bool) -> ConfigTree {
        let mut root = self.root.clone();
        root.children = diff_different(&self.root.children, &them.root.children, retain_value_changed);
        ConfigTree { root }
    }

    // The nodes present in `self` but absent from `them`, i.e. what
    // disappeared going from `self` to `them`. Each missing subtree is
    // retained as a terminal (childless) deletion marker, matching what
    // `merge_deletion` expects as "a leaf of the deletion tree".
    pub fn retain_deletions(&self, them: &ConfigTree) -> ConfigTree {
        let mut root = self.root.clone();
        root.children = diff_missing(&self.root.children, &them.root.children);
        ConfigTree { root }
    }

    // The nodes present and structurally equal in both `self` and `them`.
    pub fn retain_common(&self, them: &ConfigTree) -> ConfigTree {
        let mut root = self.root.clone();
        root.children = diff_common(&self.root.children, &them.root.children);
        ConfigTree { root }
    }

    // Computes the structural delta and deletion trees that move `self`
    // to `new_tree` (§C8 `apply_change`'s post-commit broadcast):
    // `merge_delta` the delta then `merge_deletion` the deletion against
    // a clone of `self` reproduces `new_tree`.
    pub fn diff(&self, new_tree: &ConfigTree) -> (ConfigTree, ConfigTree) {
        let delta = new_tree.retain_different(self, true);
        let deletion = self.retain_deletions(new_tree);
        (delta, deletion)
    }

    // Full Pass-1-style validation walk (§C3 `check_config_tree`):
    // allowed-value/range/operator checks, and that every
    // `mandatory_config_nodes` reference currently resolves. Read-only
    // violations are hard errors; a deprecated node in active use is
    // only logged, not rejected, matching the warn-not-reject posture
    // `%deprecated` has everywhere else in this schema (see DESIGN.md).
    pub fn check_config_tree(&self, template: &TemplateTree) -> Result<(), Error> {
        Self::check_node(&self.root, template, self)
    }

    fn check_node(node: &ConfigNode, template: &TemplateTree, config: &ConfigTree) -> Result<(), Error> {
        if !node.is_root() && !node.deleted {
            let path: Vec<&str> = node.template_path.iter().map(String::as_str).collect();
            if let Some(tnode) = template.find_by_path(&path) {
                if tnode.read_only.is_some() && node.user_id != 0 {
                    return Err(Error::Reference(format!(
                        "'{}' is read-only",
                        node.template_path.join(".")
                    )));
                }
                if tnode.deprecated.is_some() && node.has_value {
                    tracing::warn!(path = %node.template_path.join("."), "configuring a deprecated node");
                }
                if let Some(value) = &node.value {
                    let allowed_values: Vec<_> = tnode.allowed_values.iter().map(|(v, _)| v.clone()).collect();
                    let allowed_ranges: Vec<_> = tnode.allowed_ranges.iter().map(|(r, _)| r.clone()).collect();
                    value.check_allowed_values(&allowed_values)?;
                    value.check_allowed_ranges(&allowed_ranges)?;
                    if !tnode.allowed_operators().contains(&node.operator) {
                        return Err(Error::Reference(format!(
                            "operator '{}' is not permitted on '{}'",
                            node.operator,
                            node.template_path.join(".")
                        )));
                    }
                }
                for reference in &tnode.mandatory_config_nodes {
                    let var_ref = routecfg_template::VarRef::parse(reference);
                    if let crate::varexpand::VarResolution::None =
                        crate::varexpand::resolve(config, template, &node.template_path, &var_ref, true)
                    {
                        return Err(Error::Reference(format!(
                            "mandatory reference '{reference}' of '{}' does not resolve",
                            node.template_path.join(".")
                        )));
                    }
                }
                if let Some(unique_in) = &tnode.unique_in {
                    Self::check_unique_in(node, unique_in, template, config)?;
                }
            }
        }
        for child in &node.children {
            Self::check_node(child, template, config)?;
        }
        Ok(())
    }

    // `%unique-in "$(ref)"` (§4.2, §8 invariant): `ref` names the
    // ancestor scope the same way a mandatory reference does. This
    // node's value must not be repeated at the same relative position
    // under any other instance of the nearest tag between that ancestor
    // and this node; a scope with no enclosing tag has nothing to
    // compare against and is not an error (see DESIGN.md).
    fn check_unique_in(
        node: &ConfigNode,
        unique_in: &str,
        template: &TemplateTree,
        config: &ConfigTree,
    ) -> Result<(), Error> {
        let Some(value) = &node.value else {
            return Ok(());
        };
        let var_ref = routecfg_template::VarRef::parse(unique_in);
        let Some(ancestor_path) = template.find_varname_node(&node.template_path, &var_ref) else {
            return Ok(());
        };
        let Some(tag_len) = Self::nearest_enclosing_tag_len(node, config, ancestor_path.len()) else {
            return Ok(());
        };
        let tag_path = &node.template_path[..tag_len];
        let Some((_, parent_path)) = tag_path.split_last() else {
            return Ok(());
        };
        let parent_strs: Vec<&str> = parent_path.iter().map(String::as_str).collect();
        let Some(parent) = config.find(&parent_strs) else {
            return Ok(());
        };
        let suffix = &node.template_path[tag_len..];

        for sibling in &parent.children {
            if sibling.deleted || !sibling.is_tag || sibling.template_path == tag_path {
                continue;
            }
            let mut current = sibling;
            let mut matched = true;
            for segment in suffix {
                match current.find_child(segment) {
                    Some(next) => current = next,
                    None => {
                        matched = false;
                        break;
                    }
                }
            }
            if matched && !current.deleted && current.value.as_ref() == Some(value) {
                return Err(Error::Reference(format!(
                    "'{}' duplicates a sibling value in unique-in scope '{unique_in}'",
                    node.template_path.join(".")
                )));
            }
        }
        Ok(())
    }

    // Walks `node`'s own path upward from just above `ancestor_len`,
    // returning the length of the nearest prefix that names a tag
    // instance in the live tree.
    fn nearest_enclosing_tag_len(node: &ConfigNode, config: &ConfigTree, ancestor_len: usize) -> Option<usize> {
        if ancestor_len >= node.template_path.len() {
            return None;
        }
        for len in (ancestor_len..node.template_path.len()).rev() {
            let prefix: Vec<&str> = node.template_path[..len].iter().map(String::as_str).collect();
            if let Some(candidate) = config.find(&prefix) {
                if candidate.is_tag {
                    return Some(len);
                }
            }
        }
        None
    }
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_leaf(
    node: &mut ConfigNode,
    value: TypedValue,
    operator: Operator,
    user: u32,
    now: DateTime<Utc>,
    provisional: bool,
) {
    let changed = node.value.as_ref() != Some(&value) || node.operator != operator;
    if !changed {
        return;
    }
    if provisional && node.existence_committed && node.value_committed {
        node.committed_value = node.value.clone();
        node.committed_operator = node.operator;
    }
    node.value = Some(value);
    node.operator = operator;
    node.has_value = true;
    node.user_id = user;
    node.modification_time = now;
    if provisional {
        node.value_committed = false;
    } else {
        node.value_committed = true;
        node.committed_value = node.value.clone();
        node.committed_operator = node.operator;
        node.committed_user_id = user;
        node.committed_modification_time = now;
    }
}

fn diff_different(a: &[ConfigNode], b: &[ConfigNode], retain_value_changed: bool) -> Vec<ConfigNode> {
    let mut out = Vec::new();
    for node in a {
        let counterpart = b.iter().find(|c| c.segname == node.segname);
        let mut clone = node.clone();
        clone.children = match counterpart {
            Some(c) => diff_different(&node.children, &c.children, retain_value_changed),
            None => node.children.clone(),
        };
        let value_changed = retain_value_changed
            && counterpart.is_some_and(|c| node.value != c.value || node.operator != c.operator);
        if counterpart.is_none() || value_changed || !clone.children.is_empty() {
            out.push(clone);
        }
    }
    out
}

fn diff_missing(a: &[ConfigNode], b: &[ConfigNode]) -> Vec<ConfigNode> {
    let mut out = Vec::new();
    for node in a {
        match b.iter().find(|c| c.segname == node.segname) {
            None => {
                let mut clone = node.clone();
                clone.children.clear();
                out.push(clone);
            }
            Some(c) => {
                let kept = diff_missing(&node.children, &c.children);
                if !kept.is_empty() {
                    let mut clone = node.clone();
                    clone.children = kept;
                    out.push(clone);
                }
            }
        }
    }
    out
}

fn diff_common(a: &[ConfigNode], b: &[ConfigNode]) -> Vec<ConfigNode> {
    let mut out = Vec::new();
    for node in a {
        if let Some(c) = b.iter().find(|c| c.segname == node.segname) {
            if node.value == c.value && node.operator == c.operator {
                let mut clone = node.clone();
                clone.children = diff_common(&node.children, &c.children);
                out.push(clone);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use routecfg_template::{parser as tparser, TemplateNode};
    use routecfg_value::TypedValue;

    use super::*;

    fn sample_template() -> TemplateTree {
        let mut root = TemplateNode::new_void("", "");
        tparser::parse_into(
            r#"
            interfaces {
                interface @: txt {
                    mtu: u32 = 1500;
                    enabled: bool = true;
                };
            };
            "#,
            "t.tp",
            &mut root,
        )
        .unwrap();
        TemplateTree::from_parsed_root(root).unwrap()
    }

    fn delta_mtu(value: u32) -> ConfigNode {
        let now = Utc::now();
        let mut root = ConfigNode::new_root();
        let mut interfaces = ConfigNode::new_child("interfaces", vec![], false, false, 0, 0, now);
        let mut eth0 = ConfigNode::new_child("eth0", vec![], false, true, 0, 0, now);
        eth0.value = Some(TypedValue::Text("eth0".to_string()));
        eth0.has_value = true;
        let mut mtu = ConfigNode::new_child("mtu", vec![], false, true, 0, 0, now);
        mtu.value = Some(TypedValue::UInt32(value));
        mtu.operator = Operator::Assign;
        mtu.has_value = true;
        eth0.children.push(mtu);
        interfaces.children.push(eth0);
        root.children.push(interfaces);
        root
    }

    #[test]
    fn merge_delta_creates_new_nodes() {
        let template = sample_template();
        let mut tree = ConfigTree::new();
        let delta = delta_mtu(9000);
        tree.merge_delta(&template, &[], &delta, 1, 7, Utc::now(), true).unwrap();

        let mtu = tree.find(&["interfaces", "eth0", "mtu"]).unwrap();
        assert_eq!(mtu.value, Some(TypedValue::UInt32(9000)));
        assert_eq!(mtu.state(), crate::node::NodeState::New);
    }

    fn delta_two_interfaces() -> ConfigNode {
        let now = Utc::now();
        let mut root = ConfigNode::new_root();
        let mut interfaces = ConfigNode::new_child("interfaces", vec![], false, false, 0, 0, now);
        for name in ["eth0", "eth1"] {
            let mut iface = ConfigNode::new_child(name, vec![], false, true, 0, 0, now);
            iface.value = Some(TypedValue::Text(name.to_string()));
            iface.has_value = true;
            let mut mtu = ConfigNode::new_child("mtu", vec![], false, true, 0, 0, now);
            mtu.value = Some(TypedValue::UInt32(1500));
            mtu.operator = Operator::Assign;
            mtu.has_value = true;
            let mut enabled = ConfigNode::new_child("enabled", vec![], false, true, 0, 0, now);
            enabled.value = Some(TypedValue::Bool(true));
            enabled.operator = Operator::Assign;
            enabled.has_value = true;
            iface.children.push(mtu);
            iface.children.push(enabled);
            interfaces.children.push(iface);
        }
        root.children.push(interfaces);
        root
    }

    // §8 testable invariant 2: node_id uniqueness holds within the
    // tag's grandparent scope, not just within one tag instance. Two
    // sibling `interface` instances each with two leaf children must
    // draw all four instance IDs from one shared generator.
    #[test]
    fn node_ids_are_unique_across_sibling_tag_instances() {
        let template = sample_template();
        let mut tree = ConfigTree::new();
        let delta = delta_two_interfaces();
        tree.merge_delta(&template, &[], &delta, 1, 7, Utc::now(), true).unwrap();

        let eth0 = tree.find(&["interfaces", "eth0"]).unwrap();
        let eth1 = tree.find(&["interfaces", "eth1"]).unwrap();
        let mut ids: Vec<u32> = Vec::new();
        for iface in [eth0, eth1] {
            for leaf in &iface.children {
                ids.push(leaf.node_id.instance_id);
            }
        }
        let mut dedup = ids.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(ids.len(), 4);
        assert_eq!(dedup.len(), ids.len(), "leaf node IDs collided across sibling tag instances: {ids:?}");
    }

    #[test]
    fn merge_delta_twice_is_idempotent() {
        let template = sample_template();
        let mut tree = ConfigTree::new();
        let delta = delta_mtu(9000);
        tree.merge_delta(&template, &[], &delta, 1, 7, Utc::now(), true).unwrap();
        tree.finalize_commit();
        tree.merge_delta(&template, &[], &delta, 1, 7, Utc::now(), true).unwrap();

        let mtu = tree.find(&["interfaces", "eth0", "mtu"]).unwrap();
        assert_eq!(mtu.state(), crate::node::NodeState::Clean);
    }

    #[test]
    fn merge_deletion_unknown_path_is_hard_error() {
        let mut tree = ConfigTree::new();
        let now = Utc::now();
        let mut deletion = ConfigNode::new_root();
        deletion.children.push(ConfigNode::new_child("nope", vec![], false, false, 0, 0, now));
        let err = tree.merge_deletion(&[], &deletion, 7, now, true).unwrap_err();
        assert!(matches!(err, Error::DeletionMismatch(_)));
    }

    #[test]
    fn merge_deletion_marks_committed_node_deleted() {
        let template = sample_template();
        let mut tree = ConfigTree::new();
        let now = Utc::now();
        tree.merge_delta(&template, &[], &delta_mtu(9000), 1, 7, now, true).unwrap();
        tree.finalize_commit();

        let mut deletion = ConfigNode::new_root();
        let mut interfaces = ConfigNode::new_child("interfaces", vec![], false, false, 0, 0, now);
        interfaces.children.push(ConfigNode::new_child("eth0", vec![], false, true, 0, 0, now));
        deletion.children.push(interfaces);
        tree.merge_deletion(&[], &deletion, 7, now, true).unwrap();

        let eth0 = tree.find(&["interfaces", "eth0"]).unwrap();
        assert_eq!(eth0.state(), crate::node::NodeState::Deleted);
        // §4.3 short-circuit: the deletion targeted "eth0" as a terminal
        // node, so "mtu" underneath is untouched.
        let mtu = tree.find(&["interfaces", "eth0", "mtu"]).unwrap();
        assert!(!mtu.deleted);
    }

    #[test]
    fn add_default_children_seeds_absent_defaults() {
        let template = sample_template();
        let mut tree = ConfigTree::new();
        let now = Utc::now();
        tree.merge_delta(&template, &[], &delta_mtu(9000), 1, 7, now, true).unwrap();
        tree.finalize_commit();

        tree.add_default_children(&template, 1, 0, now);
        let enabled = tree.find(&["interfaces", "eth0", "enabled"]).unwrap();
        assert_eq!(enabled.value, Some(TypedValue::Bool(true)));
        assert_eq!(enabled.state(), crate::node::NodeState::Clean);
    }

    #[test]
    fn diff_round_trips_through_merge() {
        let template = sample_template();
        let mut before = ConfigTree::new();
        before.merge_delta(&template, &[], &delta_mtu(1500), 1, 7, Utc::now(), true).unwrap();
        before.finalize_commit();

        let mut after = before.clone();
        after.merge_delta(&template, &[], &delta_mtu(9000), 1, 7, Utc::now(), true).unwrap();
        after.finalize_commit();

        let (delta, deletion) = before.diff(&after);
        let mut reconstructed = before.clone();
        reconstructed
            .merge_delta(&template, &[], &delta.root, 1, 7, Utc::now(), false)
            .unwrap();
        reconstructed.merge_deletion(&[], &deletion.root, 7, Utc::now(), false).unwrap();

        assert!(reconstructed.equals(&after, false));
    }

    #[test]
    fn check_config_tree_rejects_out_of_range_value() {
        let mut root = TemplateNode::new_void("", "");
        tparser::parse_into(
            r#"
            mtu: u32 = 1500 {
                %allow-range [68..9000];
            };
            "#,
            "t.tp",
            &mut root,
        )
        .unwrap();
        let template = TemplateTree::from_parsed_root(root).unwrap();
        let mut tree = ConfigTree::new();
        let now = Utc::now();
        tree.set_value(&template, &["mtu"], TypedValue::UInt32(40), Operator::Assign, 7, now)
            .unwrap_err();
    }

    fn peers_template() -> TemplateTree {
        let mut root = TemplateNode::new_void("", "");
        tparser::parse_into(
            r#"
            peers {
                peer @: txt {
                    asn: u32 {
                        %unique-in "peers";
                    };
                };
            };
            "#,
            "t.tp",
            &mut root,
        )
        .unwrap();
        TemplateTree::from_parsed_root(root).unwrap()
    }

    fn peer_delta(name: &str, asn: u32, now: DateTime<Utc>) -> ConfigNode {
        let mut root = ConfigNode::new_root();
        let mut peers = ConfigNode::new_child("peers", vec![], false, false, 0, 0, now);
        let mut peer = ConfigNode::new_child(name, vec![], true, true, 0, 0, now);
        peer.value = Some(TypedValue::Text(name.to_string()));
        peer.has_value = true;
        let mut asn_node = ConfigNode::new_child("asn", vec![], false, true, 0, 0, now);
        asn_node.value = Some(TypedValue::UInt32(asn));
        asn_node.operator = Operator::Assign;
        asn_node.has_value = true;
        peer.children.push(asn_node);
        peers.children.push(peer);
        root.children.push(peers);
        root
    }

    #[test]
    fn check_config_tree_rejects_duplicate_unique_in_value() {
        let template = peers_template();
        let mut tree = ConfigTree::new();
        let now = Utc::now();
        tree.merge_delta(&template, &[], &peer_delta("peerA", 65000, now), 1, 7, now, true).unwrap();
        tree.merge_delta(&template, &[], &peer_delta("peerB", 65000, now), 1, 7, now, true).unwrap();

        let err = tree.check_config_tree(&template).unwrap_err();
        assert!(matches!(err, Error::Reference(_)));
    }

    #[test]
    fn check_config_tree_allows_distinct_unique_in_values() {
        let template = peers_template();
        let mut tree = ConfigTree::new();
        let now = Utc::now();
        tree.merge_delta(&template, &[], &peer_delta("peerA", 65000, now), 1, 7, now, true).unwrap();
        tree.merge_delta(&template, &[], &peer_delta("peerB", 65001, now), 1, 7, now, true).unwrap();

        tree.check_config_tree(&template).unwrap();
    }
}
