//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

//! The live configuration tree (§C3): structural storage, merge of
//! client-submitted delta/deletion subtrees, node-id allocation,
//! variable resolution against a concrete tree, a configuration-text
//! codec, and rendering.

mod debug;
pub mod error;
pub mod node;
pub mod parser;
pub mod render;
pub mod tree;
pub mod varexpand;

pub use error::Error;
pub use node::{ConfigNode, NodeId, NodeState};
pub use render::RenderOptions;
pub use tree::ConfigTree;
pub use varexpand::VarResolution;
