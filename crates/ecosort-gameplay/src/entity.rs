//! Trash items, bins, and the registry that holds them.

use ecosort_common::{Category, EntityId, NodeId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Anything the proximity engine can measure: it lives at a scene node.
pub trait Located {
    /// Scene node whose world position represents this entity.
    fn world_handle(&self) -> NodeId;
}

/// A pickup-able piece of trash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrashItem {
    /// Unique identifier
    id: EntityId,
    /// Waste category, fixed at spawn
    category: Category,
    /// Scene node of the item model
    node: NodeId,
    /// Real-world size to preserve when the item is re-parented
    base_scale: Vec3,
    /// Decorative floating label
    label: Option<NodeId>,
}

impl TrashItem {
    /// Creates a trash item bound to a scene node.
    #[must_use]
    pub fn new(category: Category, node: NodeId, base_scale: Vec3) -> Self {
        Self {
            id: EntityId::new(),
            category,
            node,
            base_scale,
            label: None,
        }
    }

    /// Attaches a label node.
    #[must_use]
    pub fn with_label(mut self, label: NodeId) -> Self {
        self.label = Some(label);
        self
    }

    /// Returns the item's unique ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the item's category.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Returns the canonical world-space scale.
    #[must_use]
    pub const fn base_scale(&self) -> Vec3 {
        self.base_scale
    }

    /// Returns the label node, if any.
    #[must_use]
    pub const fn label(&self) -> Option<NodeId> {
        self.label
    }
}

impl Located for TrashItem {
    fn world_handle(&self) -> NodeId {
        self.node
    }
}

/// A categorized bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bin {
    id: EntityId,
    category: Category,
    node: NodeId,
}

impl Bin {
    /// Creates a bin bound to a scene node.
    #[must_use]
    pub fn new(category: Category, node: NodeId) -> Self {
        Self {
            id: EntityId::new(),
            category,
            node,
        }
    }

    /// Returns the bin's unique ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the category this bin accepts.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Whether `item` belongs in this bin.
    #[must_use]
    pub fn accepts(&self, item: &TrashItem) -> bool {
        self.category == item.category()
    }
}

impl Located for Bin {
    fn world_handle(&self) -> NodeId {
        self.node
    }
}

/// Live sets of floor trash and bins.
///
/// Trash leaves the registry when it is picked up and never comes back; the
/// carried item lives in the interaction state instead, so the two sets never
/// overlap.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    /// Trash lying on the floor
    trash: Vec<TrashItem>,
    /// All bins
    bins: Vec<Bin>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trash item to the floor set.
    pub fn add_trash(&mut self, item: TrashItem) -> EntityId {
        let id = item.id();
        self.trash.push(item);
        id
    }

    /// Removes a trash item by identity. Absent items are a no-op.
    pub fn remove_trash(&mut self, id: EntityId) -> Option<TrashItem> {
        let index = self.trash.iter().position(|item| item.id() == id)?;
        Some(self.trash.swap_remove(index))
    }

    /// Adds a bin.
    pub fn add_bin(&mut self, bin: Bin) -> EntityId {
        let id = bin.id();
        self.bins.push(bin);
        id
    }

    /// Trash currently on the floor (unordered).
    #[must_use]
    pub fn trash(&self) -> &[TrashItem] {
        &self.trash
    }

    /// All bins (unordered).
    #[must_use]
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Whether an item is on the floor.
    #[must_use]
    pub fn contains_trash(&self, id: EntityId) -> bool {
        self.trash.iter().any(|item| item.id() == id)
    }

    /// Number of floor items.
    #[must_use]
    pub fn trash_count(&self) -> usize {
        self.trash.len()
    }

    /// Number of bins.
    #[must_use]
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_trash_matches_identity() {
        let mut registry = EntityRegistry::new();
        let a = registry.add_trash(TrashItem::new(Category::Organic, NodeId::from_raw(1), Vec3::ONE));
        let b = registry.add_trash(TrashItem::new(Category::Organic, NodeId::from_raw(2), Vec3::ONE));

        let removed = registry.remove_trash(a).expect("a present");
        assert_eq!(removed.id(), a);
        assert!(!registry.contains_trash(a));
        assert!(registry.contains_trash(b));
        assert_eq!(registry.trash_count(), 1);
    }

    #[test]
    fn test_remove_absent_trash_is_noop() {
        let mut registry = EntityRegistry::new();
        registry.add_trash(TrashItem::new(Category::General, NodeId::from_raw(1), Vec3::ONE));

        assert!(registry.remove_trash(EntityId::from_raw(u64::MAX)).is_none());
        assert_eq!(registry.trash_count(), 1);
    }

    #[test]
    fn test_bin_accepts_matching_category() {
        let bin = Bin::new(Category::Recyclable, NodeId::from_raw(3));
        let can = TrashItem::new(Category::Recyclable, NodeId::from_raw(4), Vec3::ONE);
        let peel = TrashItem::new(Category::Organic, NodeId::from_raw(5), Vec3::ONE);

        assert!(bin.accepts(&can));
        assert!(!bin.accepts(&peel));
    }
}
