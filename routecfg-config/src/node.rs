//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use routecfg_action::ReturnAtom;
use routecfg_value::{Operator, TypedValue};

// A node's stable identifier, unique among the siblings of its effective
// parent (§4.3). The client that created the node is carried alongside
// the generator's own counter rather than folded into one integer, since
// nothing in this workspace needs the bit-packed wire form the high-bits
// phrasing in the spec describes -- only the pair itself.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct NodeId {
    pub client_id: u32,
    pub instance_id: u32,
}

impl NodeId {
    pub const ROOT: NodeId = NodeId { client_id: 0, instance_id: 0 };
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.client_id, self.instance_id)
    }
}

// The four states a node's commit bookkeeping can be in (§4.3). Derived
// from `existence_committed`/`value_committed`/`deleted` rather than
// stored directly, so the three flags can never drift out of sync with
// what `state()` reports.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeState {
    Clean,
    New,
    Modified,
    Deleted,
}

// A live, typed node of the configuration tree. Owns its children
// outright; `template_path` is the only link back to the schema, since
// the template tree is process-global and borrowed, never owned, by a
// configuration node (see DESIGN.md).
#[derive(Clone, Debug)]
pub struct ConfigNode {
    pub segname: String,
    pub template_path: Vec<String>,
    pub is_tag: bool,
    // Whether this node's template is a value type and it is not a tag's
    // own key placeholder sitting directly under a tag -- i.e. whether it
    // is a settable leaf in the §3 sense.
    pub is_leaf_value: bool,

    pub has_value: bool,
    pub value: Option<TypedValue>,
    pub operator: Operator,
    pub committed_value: Option<TypedValue>,
    pub committed_operator: Operator,

    pub user_id: u32,
    pub committed_user_id: u32,
    pub modification_time: DateTime<Utc>,
    pub committed_modification_time: DateTime<Utc>,

    pub node_id: NodeId,
    pub node_id_position: u32,
    pub clientid: u32,

    pub existence_committed: bool,
    pub value_committed: bool,
    pub deleted: bool,

    pub variables: HashMap<String, ReturnAtom>,
    pub children: Vec<ConfigNode>,

    // This node's own generator for children created directly under it
    // (used when this node is the "effective parent" of a new child --
    // see `ConfigTree::insert_child`).
    next_child_instance: u32,
}

// ===== impl ConfigNode =====

impl ConfigNode {
    pub fn new_root() -> Self {
        ConfigNode {
            segname: String::new(),
            template_path: Vec::new(),
            is_tag: false,
            is_leaf_value: false,
            has_value: false,
            value: None,
            operator: Operator::None,
            committed_value: None,
            committed_operator: Operator::None,
            user_id: 0,
            committed_user_id: 0,
            modification_time: DateTime::<Utc>::UNIX_EPOCH,
            committed_modification_time: DateTime::<Utc>::UNIX_EPOCH,
            node_id: NodeId::ROOT,
            node_id_position: 0,
            clientid: 0,
            existence_committed: true,
            value_committed: true,
            deleted: false,
            variables: HashMap::new(),
            children: Vec::new(),
            next_child_instance: 1,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_child(
        segname: impl Into<String>,
        template_path: Vec<String>,
        is_tag: bool,
        is_leaf_value: bool,
        clientid: u32,
        user_id: u32,
        now: DateTime<Utc>,
    ) -> Self {
        ConfigNode {
            segname: segname.into(),
            template_path,
            is_tag,
            is_leaf_value,
            has_value: false,
            value: None,
            operator: Operator::None,
            committed_value: None,
            committed_operator: Operator::None,
            user_id,
            committed_user_id: 0,
            modification_time: now,
            committed_modification_time: DateTime::<Utc>::UNIX_EPOCH,
            node_id: NodeId::default(),
            node_id_position: 0,
            clientid,
            existence_committed: false,
            value_committed: false,
            deleted: false,
            variables: HashMap::new(),
            children: Vec::new(),
            next_child_instance: 1,
        }
    }

    pub fn find_child(&self, segname: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|c| c.segname == segname)
    }

    pub fn find_child_mut(&mut self, segname: &str) -> Option<&mut ConfigNode> {
        self.children.iter_mut().find(|c| c.segname == segname)
    }

    pub fn is_root(&self) -> bool {
        self.template_path.is_empty()
    }

    // §4.3 state machine: one of clean/new/modified/deleted, derived
    // from the three commit flags.
    pub fn state(&self) -> NodeState {
        if self.deleted {
            NodeState::Deleted
        } else if !self.existence_committed {
            NodeState::New
        } else if !self.value_committed {
            NodeState::Modified
        } else {
            NodeState::Clean
        }
    }

    // Draws the next instance ID from this node's own generator, to be
    // used when `self` is the effective parent of a newly-inserted
    // child (§4.3 node ID allocation).
    pub fn allocate_child_id(&mut self, client_id: u32) -> NodeId {
        let instance_id = self.next_child_instance;
        self.next_child_instance += 1;
        NodeId { client_id, instance_id }
    }

    // Splits `self` into its children list and its own generator counter
    // as two disjoint borrows, so a caller can look for an existing
    // child (or push a new one) while still holding a live reference to
    // the counter -- needed when a tag-instance child's children must
    // draw IDs from `self` rather than from the child itself (§4.3
    // effective-parent redirect, `conf_tree_node.cc`'s
    // `allocate_unique_node_id`).
    pub(crate) fn children_and_gen(&mut self) -> (&mut Vec<ConfigNode>, &mut u32) {
        (&mut self.children, &mut self.next_child_instance)
    }

    // §11 `is_default_value`: whether the node's *current* value equals
    // its template default, independent of commit state.
    pub fn is_default_value(&self, default: Option<&TypedValue>) -> bool {
        match (&self.value, default) {
            (Some(v), Some(d)) => v == d,
            _ => false,
        }
    }

    // The full rendered node-id string used in wire output and
    // "numbered" configuration rendering: `client:instance@position`.
    pub fn node_id_string(&self) -> String {
        format!("{}@{}", self.node_id, self.node_id_position)
    }

    // Structural equality per §3: ignores timestamps and owners, compares
    // segname, tag-ness, value, operator, template identity and
    // leaf-ness, and -- when asked -- node_id. Does not recurse into
    // children; `ConfigTree` equality walks the tree calling this at
    // every level.
    pub fn equals_node(&self, other: &ConfigNode, compare_node_id: bool) -> bool {
        self.segname == other.segname
            && self.is_tag == other.is_tag
            && self.is_leaf_value == other.is_leaf_value
            && self.template_path == other.template_path
            && self.value == other.value
            && self.operator == other.operator
            && (!compare_node_id || self.node_id == other.node_id)
    }
}
