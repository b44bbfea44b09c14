//! Arena-backed transform hierarchy.
//!
//! Every node lives in a single `Vec` owned by [`SceneGraph`]; parent and child
//! links are [`NodeId`]s into that arena. World transforms are recomputed
//! eagerly, top-down, whenever a link or a local transform changes.

use cgmath::SquareMatrix;
use log::{debug, warn};

use crate::error::SceneError;
use crate::math::{multiply, Mat4};

use super::mesh::Mesh;
use super::node::{NodeId, SceneNode};

#[derive(Debug, Default, Clone)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parentless node whose local and world transforms both start as `transform`.
    pub fn create_node(&mut self, transform: Mat4, mesh: Option<Mesh>, name: Option<&str>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode::new(id, transform, mesh, name));
        debug!("created scene node {}", id);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.index())
    }

    fn node(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        self.get(id).ok_or(SceneError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order
    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter()
    }

    /// Parentless nodes in creation order. These are the scene's top-level entries.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|node| node.parent.is_none())
            .map(|node| node.id)
    }

    /// First node in creation order carrying `name`
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|node| node.name.as_deref() == Some(name))
            .map(|node| node.id)
    }

    /// `true` when `ancestor` appears strictly above `node` in the hierarchy.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.get(node).and_then(|n| n.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Every node below `id` in depth-first pre-order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(node) = self.get(id) else {
            return out;
        };

        let mut stack: Vec<NodeId> = node.children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(child) = self.get(current) {
                stack.extend(child.children.iter().rev().copied());
            }
        }
        out
    }

    /// Attaches `node` under `parent`, detaching it from any previous parent,
    /// then refreshes the world transforms of the moved subtree.
    ///
    /// Self-parenting and cycles are rejected and leave the graph untouched.
    /// Re-attaching to the current parent only refreshes transforms.
    pub fn set_parent(&mut self, node: NodeId, parent: NodeId) -> Result<(), SceneError> {
        let old_parent = self.node(node)?.parent;
        self.node(parent)?;

        if node == parent {
            warn!("refusing to parent {} to itself", node);
            return Err(SceneError::SelfParent(node));
        }
        if self.is_ancestor(node, parent) {
            warn!("refusing to parent {} under its descendant {}", node, parent);
            return Err(SceneError::Cycle { node, parent });
        }

        if old_parent != Some(parent) {
            if let Some(old) = old_parent {
                self.nodes[old.index()].children.retain(|child| *child != node);
            }
            self.nodes[node.index()].parent = Some(parent);
            self.nodes[parent.index()].children.push(node);
            debug!("attached {} under {}", node, parent);
        }

        self.update_world_transform(node)
    }

    /// Recomputes `world = parent.world * local` for `id` and every node below it.
    ///
    /// Walks top-down with an explicit stack so deep hierarchies cannot
    /// overflow the call stack. Links are only read, never rewritten.
    pub fn update_world_transform(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.node(id)?;

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let parent_world = match self.nodes[current.index()].parent {
                Some(parent) => self.nodes[parent.index()].world_transform,
                None => Mat4::identity(),
            };

            let node = &mut self.nodes[current.index()];
            node.world_transform = multiply(parent_world, node.local_transform);
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(())
    }

    /// Replaces the local transform of `id` and propagates it through its subtree.
    pub fn update_transform(&mut self, id: NodeId, local: Mat4) -> Result<(), SceneError> {
        self.get_mut(id).ok_or(SceneError::UnknownNode(id))?.local_transform = local;
        self.update_world_transform(id)
    }
}
