//! In-memory scene graph.
//!
//! A minimal parent/child hierarchy of named nodes with local transforms.
//! World transforms are composed on demand by walking the parent chain; the
//! scenes this game builds hold a few dozen nodes, so nothing is cached.

use ecosort_common::{NodeId, WorldError};
use glam::{Mat4, Vec3};

use crate::world::{SpatialWorld, Transform};

/// A single node in the scene graph.
#[derive(Debug, Clone)]
struct SceneNode {
    /// Human-readable name (bone names, model names)
    name: String,
    /// Parent node, `None` only for the root
    parent: Option<NodeId>,
    /// Direct children in insertion order
    children: Vec<NodeId>,
    /// Transform relative to the parent
    local: Transform,
}

/// Arena-backed scene graph with a permanent root node.
///
/// Slots of despawned nodes stay empty; handles are never reused.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: Vec<Option<SceneNode>>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a scene containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        let root = SceneNode {
            name: "scene".to_string(),
            parent: None,
            children: Vec::new(),
            local: Transform::IDENTITY,
        };
        Self {
            nodes: vec![Some(root)],
            root: NodeId::from_raw(0),
        }
    }

    /// The scene root.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// Always false: the root is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether a handle still resolves to a live node.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    /// Spawns a node under `parent`.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        parent: NodeId,
        local: Transform,
    ) -> Result<NodeId, WorldError> {
        if !self.contains(parent) {
            return Err(WorldError::NodeNotFound(parent));
        }

        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(Some(SceneNode {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            local,
        }));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Spawns a node directly under the scene root.
    pub fn spawn_at_root(
        &mut self,
        name: impl Into<String>,
        local: Transform,
    ) -> Result<NodeId, WorldError> {
        self.spawn(name, self.root, local)
    }

    /// Name of a node.
    #[must_use]
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.name.as_str())
    }

    /// Parent of a node (`None` for the root or unknown nodes).
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    /// Direct children of a node.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map_or(&[], |n| n.children.as_slice())
    }

    /// Composed world matrix of a node.
    #[must_use]
    pub fn world_matrix(&self, node: NodeId) -> Option<Mat4> {
        let mut current = self.node(node)?;
        let mut matrix = current.local.to_matrix();
        while let Some(parent) = current.parent {
            current = self.node(parent)?;
            matrix = current.local.to_matrix() * matrix;
        }
        Some(matrix)
    }

    /// True when `ancestor` is `node` or lies on its parent chain.
    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    fn node(&self, node: NodeId) -> Option<&SceneNode> {
        self.nodes.get(node.raw() as usize).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut SceneNode, WorldError> {
        self.nodes
            .get_mut(node.raw() as usize)
            .and_then(Option::as_mut)
            .ok_or(WorldError::NodeNotFound(node))
    }

    fn unlink_from_parent(&mut self, node: NodeId) -> Result<(), WorldError> {
        if let Some(parent) = self.parent(node) {
            self.node_mut(parent)?.children.retain(|child| *child != node);
        }
        Ok(())
    }
}

impl SpatialWorld for SceneGraph {
    fn world_position(&self, node: NodeId) -> Option<Vec3> {
        self.world_matrix(node).map(|m| m.w_axis.truncate())
    }

    fn world_scale(&self, node: NodeId) -> Option<Vec3> {
        self.world_matrix(node)
            .map(|m| m.to_scale_rotation_translation().0)
    }

    fn local_transform(&self, node: NodeId) -> Option<Transform> {
        self.node(node).map(|n| n.local)
    }

    fn set_local_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), WorldError> {
        self.node_mut(node)?.local = transform;
        Ok(())
    }

    fn attach(&mut self, child: NodeId, parent: NodeId) -> Result<(), WorldError> {
        if !self.contains(child) {
            return Err(WorldError::NodeNotFound(child));
        }
        if !self.contains(parent) {
            return Err(WorldError::NodeNotFound(parent));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(WorldError::Cycle { child, parent });
        }

        self.unlink_from_parent(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn detach(&mut self, node: NodeId) -> Result<(), WorldError> {
        if node == self.root {
            return Err(WorldError::RootDetach);
        }
        if !self.contains(node) {
            return Err(WorldError::NodeNotFound(node));
        }

        self.unlink_from_parent(node)?;

        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            if let Some(slot) = self.nodes.get_mut(current.raw() as usize) {
                if let Some(removed) = slot.take() {
                    pending.extend(removed.children);
                }
            }
        }
        Ok(())
    }

    fn find_descendant(&self, root: NodeId, needle: &str) -> Option<NodeId> {
        let needle = needle.to_lowercase();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            if node.name.to_lowercase().contains(&needle) {
                return Some(current);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_position_composes_parent_chain() {
        let mut scene = SceneGraph::new();
        let parent = scene
            .spawn_at_root("parent", Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)).with_scale(Vec3::splat(2.0)))
            .expect("spawn parent");
        let child = scene
            .spawn("child", parent, Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)))
            .expect("spawn child");

        let pos = scene.world_position(child).expect("child position");
        assert!((pos - Vec3::new(12.0, 0.0, 0.0)).length() < 1e-4);

        let scale = scene.world_scale(child).expect("child scale");
        assert!((scale - Vec3::splat(2.0)).length() < 1e-4);
    }

    #[test]
    fn test_attach_moves_child_between_parents() {
        let mut scene = SceneGraph::new();
        let a = scene.spawn_at_root("a", Transform::IDENTITY).expect("a");
        let b = scene.spawn_at_root("b", Transform::IDENTITY).expect("b");
        let item = scene.spawn("item", a, Transform::IDENTITY).expect("item");

        scene.attach(item, b).expect("attach");

        assert_eq!(scene.parent(item), Some(b));
        assert!(scene.children(a).is_empty());
        assert_eq!(scene.children(b), &[item]);
    }

    #[test]
    fn test_attach_rejects_cycles() {
        let mut scene = SceneGraph::new();
        let a = scene.spawn_at_root("a", Transform::IDENTITY).expect("a");
        let b = scene.spawn("b", a, Transform::IDENTITY).expect("b");

        assert_eq!(scene.attach(a, b), Err(WorldError::Cycle { child: a, parent: b }));
        assert_eq!(scene.attach(a, a), Err(WorldError::Cycle { child: a, parent: a }));
    }

    #[test]
    fn test_detach_removes_subtree() {
        let mut scene = SceneGraph::new();
        let a = scene.spawn_at_root("a", Transform::IDENTITY).expect("a");
        let b = scene.spawn("b", a, Transform::IDENTITY).expect("b");

        scene.detach(a).expect("detach");

        assert!(!scene.contains(a));
        assert!(!scene.contains(b));
        assert!(scene.world_position(b).is_none());
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.detach(a), Err(WorldError::NodeNotFound(a)));
    }

    #[test]
    fn test_root_cannot_be_detached() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        assert_eq!(scene.detach(root), Err(WorldError::RootDetach));
    }

    #[test]
    fn test_find_descendant_is_case_insensitive_depth_first() {
        let mut scene = SceneGraph::new();
        let character = scene.spawn_at_root("character", Transform::IDENTITY).expect("character");
        let arm = scene.spawn("Arm_L", character, Transform::IDENTITY).expect("arm");
        let hand = scene.spawn("mixamorig:LeftHand", arm, Transform::IDENTITY).expect("hand");
        let _other = scene.spawn("RightHand", character, Transform::IDENTITY).expect("other");

        assert_eq!(scene.find_descendant(character, "hand"), Some(hand));
        assert_eq!(scene.find_descendant(character, "foot"), None);
    }
}
