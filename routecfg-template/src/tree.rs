//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use std::path::Path;

use routecfg_value::ValueKind;

use crate::debug::Debug;
use crate::error::Error;
use crate::node::TemplateNode;
use crate::parser;
use crate::varref::{VarRef, VarRefKind};

// The process-global schema, loaded once at startup and held behind a
// shared immutable borrow for the remainder of the process lifetime.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateTree {
    root: TemplateNode,
}

// ===== impl TemplateTree =====

impl TemplateTree {
    // Reads every `*.tp` file in `dir`, builds the tree, then runs the
    // expansion and validation passes. Files are loaded in directory
    // listing order; within a file, later declarations extend earlier
    // ones at the same path.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let mut root = TemplateNode::new_void("", "");

        let mut entries: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("tp"))
            .collect();
        entries.sort();

        if entries.is_empty() {
            return Err(Error::parse(
                dir.to_str(),
                None,
                "no *.tp schema files found in directory",
            ));
        }

        for path in entries {
            let path_str = path.to_string_lossy().to_string();
            Debug::LoadingFile(&path_str).log();
            let text = std::fs::read_to_string(&path)?;
            parser::parse_into(&text, &path_str, &mut root)?;
        }

        let mut tree = TemplateTree { root };
        tree.expand()?;
        tree.check()?;
        tree.check_referred_variables()?;
        Ok(tree)
    }

    pub fn root(&self) -> &TemplateNode {
        &self.root
    }

    // Builds a tree directly from an already-parsed root, running the
    // same expand/check passes as `load` but skipping the filesystem.
    // Exposed for crates downstream of this one that need a concrete
    // `TemplateTree` in their own tests without a `*.tp` fixture directory.
    #[cfg(any(test, feature = "testing"))]
    pub fn from_parsed_root(root: TemplateNode) -> Result<Self, Error> {
        let mut tree = TemplateTree { root };
        tree.expand()?;
        tree.check()?;
        tree.check_referred_variables()?;
        Ok(tree)
    }

    pub fn tree_str(&self) -> String {
        format!("{:#?}", self.root)
    }

    // Expansion pass: resolves `unique_in` references into the
    // ancestor-relative, tag-aware form used at commit time, and checks
    // every `$(...)` reference an action carries resolves somewhere in
    // the schema (§11 `check_referred_variables`).
    fn expand(&mut self) -> Result<(), Error> {
        let root_path = String::new();
        Debug::Expanding(&root_path).log();
        Self::expand_node(&mut self.root)
    }

    fn expand_node(node: &mut TemplateNode) -> Result<(), Error> {
        if let Some(unique_in) = node.unique_in.clone() {
            node.unique_in_resolved = Some(resolve_unique_in_path(&unique_in));
        }
        for action in node.commands.0.values().flatten() {
            for reference in action.referenced_variables() {
                if reference.is_empty() {
                    return Err(Error::Reference(reference));
                }
            }
        }
        for child in &mut node.children {
            Self::expand_node(child)?;
        }
        Ok(())
    }

    // Validation pass: rejects schema combinations that cannot be
    // realized, e.g. `%set` on a non-leaf, or a `read_only` node that
    // is not also `permanent`; also resolves every `mandatory` and
    // `unique-in` reference against the schema itself (§4.1 step 2).
    fn check(&self) -> Result<(), Error> {
        Debug::Validating("").log();
        self.check_node(&self.root, &mut Vec::new())
    }

    fn check_node(&self, node: &TemplateNode, path: &mut Vec<String>) -> Result<(), Error> {
        if node.commands.has("set") && !node.is_settable_leaf() {
            return Err(Error::Validation(format!(
                "node '{}' has a %set command but is not a value-bearing leaf",
                node.segname
            )));
        }
        if node.read_only.is_some() && node.permanent.is_none() {
            return Err(Error::Validation(format!(
                "node '{}' is read-only but not permanent",
                node.segname
            )));
        }
        if node.is_tag && node.default.is_some() {
            return Err(Error::Validation(format!(
                "tag node '{}' cannot carry a default value",
                node.segname
            )));
        }
        for reference in &node.mandatory_config_nodes {
            let var_ref = VarRef::parse(reference);
            match self.find_varname_node(path, &var_ref) {
                Some(resolved) if self.is_single_valued_in_same_module(node, path, &resolved) => {}
                _ => return Err(Error::Reference(reference.clone())),
            }
        }
        if let Some(unique_in) = &node.unique_in {
            let var_ref = VarRef::parse(unique_in);
            match self.find_varname_node(path, &var_ref) {
                Some(resolved) if self.is_strict_ancestor_in_same_module(node, path, &resolved) => {}
                _ => return Err(Error::Reference(unique_in.clone())),
            }
        }
        for child in &node.children {
            path.push(child.segname.clone());
            self.check_node(child, path)?;
            path.pop();
        }
        Ok(())
    }

    // A mandatory reference must land on a value-bearing leaf, with no
    // tag node crossed between the referring node and it (spec
    // invariant: "no intervening tag between the referring node and
    // the referenced one"), and must stay inside the referring node's
    // own module.
    fn is_single_valued_in_same_module(
        &self,
        referring: &TemplateNode,
        at: &[String],
        resolved: &[String],
    ) -> bool {
        let Some(target) = self.find_by_path(&resolved.iter().map(String::as_str).collect::<Vec<_>>()) else {
            return false;
        };
        if target.is_tag || target.module_name != referring.module_name {
            return false;
        }
        !self.crosses_tag_boundary(at, resolved)
    }

    // A unique-in reference must resolve to a strict ancestor of the
    // referring node, in the same module.
    fn is_strict_ancestor_in_same_module(
        &self,
        referring: &TemplateNode,
        at: &[String],
        resolved: &[String],
    ) -> bool {
        if resolved.len() >= at.len() || resolved != &at[..resolved.len()] {
            return false;
        }
        let Some(target) = self.find_by_path(&resolved.iter().map(String::as_str).collect::<Vec<_>>()) else {
            return false;
        };
        target.module_name == referring.module_name
    }

    // Walks the schema along `resolved`, starting past the prefix it
    // shares with `at`, and reports whether any node strictly before
    // the final one is a tag.
    fn crosses_tag_boundary(&self, at: &[String], resolved: &[String]) -> bool {
        let common = at.iter().zip(resolved.iter()).take_while(|(a, b)| a == b).count();
        let mut current = &self.root;
        for (index, segment) in resolved.iter().enumerate() {
            let Some(next) = current.find_child(segment).or_else(|| {
                current.children.iter().find(|c| c.is_tag && c.find_child("@").is_some())
            }) else {
                return false;
            };
            current = next;
            if index >= common && index + 1 < resolved.len() && current.is_tag {
                return true;
            }
        }
        false
    }

    // Finds the node at `segments`, dispatching ambiguous segments
    // under a tag by attempting to parse them as the tag's value kind,
    // preferring a specific-kind match over a TEXT fallback.
    pub fn find_by_path(&self, segments: &[&str]) -> Option<&TemplateNode> {
        let mut current = &self.root;
        for segment in segments {
            current = find_step(current, segment)?;
        }
        Some(current)
    }

    // Like `find_by_path` but disambiguates using the caller's declared
    // type for each segment rather than attempting a parse.
    pub fn find_by_typed_path(
        &self,
        segments: &[(&str, Option<ValueKind>)],
    ) -> Option<&TemplateNode> {
        let mut current = &self.root;
        for (segment, kind) in segments {
            current = if let Some(direct) = current.find_child(segment) {
                direct
            } else {
                current.children.iter().find(|child| {
                    child.is_tag
                        && child
                            .find_child("@")
                            .is_some_and(|key| kind.is_none() || key.kind == *kind)
                })?
            };
        }
        Some(current)
    }

    // Resolves a `$(...)` reference relative to `at`, the path of the
    // node the reference appears on. Returns the resolved node's path
    // segments, per the search order described in §4.2: start at `@`
    // (self) or walk up to the named ancestor, then descend.
    pub fn find_varname_node(&self, at: &[String], var_ref: &VarRef) -> Option<Vec<String>> {
        if var_ref.starts_at_self() {
            let mut path = at.to_vec();
            for segment in &var_ref.path[1..] {
                path.push(segment.clone());
            }
            if self.find_by_path(&path.iter().map(String::as_str).collect::<Vec<_>>())
                .is_some()
            {
                return Some(path);
            }
            return None;
        }

        let anchor_name = var_ref.path.first()?;
        for depth in (0..=at.len()).rev() {
            let candidate_path = &at[..depth];
            let candidate_str: Vec<&str> = candidate_path.iter().map(String::as_str).collect();
            let node = self.find_by_path(&candidate_str)?;
            if node.segname == *anchor_name || (depth == 0 && node.is_root()) {
                let mut path: Vec<String> = candidate_path.to_vec();
                if node.segname != *anchor_name {
                    path.push(anchor_name.clone());
                }
                for segment in &var_ref.path[1..] {
                    path.push(segment.clone());
                }
                let path_str: Vec<&str> = path.iter().map(String::as_str).collect();
                if self.find_by_path(&path_str).is_some() {
                    return Some(path);
                }
            }
        }
        None
    }

    // §11: every `$(...)` reference an action carries must resolve
    // against this tree's addressable variable space (ancestors,
    // descendants of the declaring node). Checked independently of any
    // live configuration tree, at template-load time.
    pub fn check_referred_variables(&self) -> Result<(), Error> {
        self.check_referred_at(&self.root, &mut Vec::new())
    }

    fn check_referred_at(&self, node: &TemplateNode, path: &mut Vec<String>) -> Result<(), Error> {
        for action in node.commands.0.values().flatten() {
            for reference in action.referenced_variables() {
                let var_ref = VarRef::parse(&reference);
                if self.find_varname_node(path, &var_ref).is_none()
                    && !self.resolves_as_named_variable(path, &var_ref)
                {
                    return Err(Error::Reference(reference));
                }
            }
        }
        for child in &node.children {
            path.push(child.segname.clone());
            self.check_referred_at(child, path)?;
            path.pop();
        }
        Ok(())
    }

    // A reference whose full path does not name a schema node may still be
    // legal: it may name a variable a prior action's return spec captures
    // onto a node at commit time (§4.5), which this tree has no record of.
    // Accept it at load time provided the path with its last segment
    // stripped resolves to a real node -- the node the captured variable
    // would live on.
    fn resolves_as_named_variable(&self, at: &[String], var_ref: &VarRef) -> bool {
        if var_ref.path.len() < 2 {
            return false;
        }
        let Some((_, parent_path)) = var_ref.path.split_last() else {
            return false;
        };
        let parent_ref = VarRef {
            path: parent_path.to_vec(),
            kind: VarRefKind::Value,
        };
        self.find_varname_node(at, &parent_ref).is_some()
    }
}

// A path segment that isn't a literal declared child name is tried
// against every tag child's key kind: if it parses, the segment names
// one *instance* of that tag, and the tag node itself (not its `@` key
// leaf) is what the walk continues from, since the tag's other
// children (its real settable leaves) hang directly off it and are
// shared by every instance.
fn find_step<'a>(node: &'a TemplateNode, segment: &str) -> Option<&'a TemplateNode> {
    if let Some(direct) = node.find_child(segment) {
        return Some(direct);
    }
    // Several sibling tags may all accept `segment` (a `txt`-keyed tag
    // parses anything), so collect every match and prefer a kind more
    // specific than TEXT over a TEXT fallback, instead of returning
    // whichever candidate happens to come first in declaration order.
    let mut best: Option<(&TemplateNode, ValueKind)> = None;
    for child in &node.children {
        if !child.is_tag {
            continue;
        }
        let Some(kind) = child.find_child("@").and_then(|key| key.kind) else {
            continue;
        };
        if routecfg_value::TypedValue::parse(kind, segment).is_err() {
            continue;
        }
        match best {
            Some((_, ValueKind::Text)) if kind != ValueKind::Text => best = Some((child, kind)),
            None => best = Some((child, kind)),
            _ => {}
        }
    }
    best.map(|(child, _)| child)
}

// Converts a dotted `unique-in` reference into the `@:=<typestr>`-tagged
// relative form described in §4.2. The conversion is purely syntactic
// here; the commit engine resolves it against the live tree.
fn resolve_unique_in_path(reference: &str) -> String {
    reference
        .split('.')
        .map(|segment| if segment == "@" { "@:=txt".to_string() } else { segment.to_string() })
        .collect::<Vec<_>>()
        .join(".")
}
