use std::fmt;

use crate::math::Mat4;

use super::mesh::Mesh;

/// Stable handle to a node inside a [`SceneGraph`](super::SceneGraph).
///
/// Ids are assigned in creation order by the graph that owns the node and are
/// never reused. An id is only meaningful for the graph that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw numeric value, mostly useful for logging and UI
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single entry in the transform hierarchy.
///
/// Links and transforms are only mutated through the owning graph so that
/// `world_transform` always equals `parent.world_transform * local_transform`.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub(crate) id: NodeId,
    pub(crate) name: Option<String>,
    pub(crate) local_transform: Mat4,
    pub(crate) world_transform: Mat4,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) mesh: Option<Mesh>,
}

impl SceneNode {
    pub(crate) fn new(id: NodeId, transform: Mat4, mesh: Option<Mesh>, name: Option<&str>) -> Self {
        Self {
            id,
            name: name.map(str::to_owned),
            local_transform: transform,
            world_transform: transform,
            parent: None,
            children: Vec::new(),
            mesh,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn local_transform(&self) -> Mat4 {
        self.local_transform
    }

    /// Cached cumulative transform from the root to this node
    pub fn world_transform(&self) -> Mat4 {
        self.world_transform
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in attachment order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Mutable access to the geometry payload. Materials may be swapped at
    /// runtime; transforms and links stay under the graph's control.
    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        self.mesh.as_mut()
    }

    /// Label used in logs and the debug overlay
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{} {}", name, self.id),
            None => format!("node {}", self.id),
        }
    }
}
