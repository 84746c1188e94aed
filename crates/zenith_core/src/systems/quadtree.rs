//! `quadtree` - spatial index over transform positions
//!
//! The component carries no data; joining the system just opts the entity
//! into the index. The tree is rebuilt from scratch every frame, which keeps
//! it trivially consistent with entities that moved or left.

use super::transform::Transform;
use super::TRANSFORM;
use crate::ecs::{Component, ComponentError, EntityId, EntityRef, System, SystemState};
use crate::math::Rect;
use glam::Vec2;
use serde_json::Value;
use tracing::trace;

pub const DEFAULT_NODE_CAPACITY: usize = 8;
pub const DEFAULT_MAX_DEPTH: usize = 6;

#[derive(Debug)]
struct Node {
    region: Rect,
    depth: usize,
    points: Vec<(EntityId, Vec2)>,
    children: Option<Box<[Node; 4]>>,
}

impl Node {
    fn new(region: Rect, depth: usize) -> Self {
        Self {
            region,
            depth,
            points: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, id: EntityId, point: Vec2, capacity: usize, max_depth: usize) -> bool {
        if !self.region.contains(point) {
            return false;
        }

        if let Some(children) = &mut self.children {
            return children
                .iter_mut()
                .any(|child| child.insert(id, point, capacity, max_depth));
        }

        self.points.push((id, point));
        if self.points.len() > capacity && self.depth < max_depth {
            self.split(capacity, max_depth);
        }
        true
    }

    fn split(&mut self, capacity: usize, max_depth: usize) {
        let [a, b, c, d] = self.region.quadrants();
        let depth = self.depth + 1;
        let mut children = Box::new([
            Node::new(a, depth),
            Node::new(b, depth),
            Node::new(c, depth),
            Node::new(d, depth),
        ]);
        for (id, point) in self.points.drain(..) {
            // Edges are shared; the first quadrant that accepts wins.
            children
                .iter_mut()
                .any(|child| child.insert(id, point, capacity, max_depth));
        }
        self.children = Some(children);
    }

    fn query(&self, area: &Rect, out: &mut Vec<EntityId>) {
        if !self.region.intersects(area) {
            return;
        }
        out.extend(
            self.points
                .iter()
                .filter(|(_, point)| area.contains(*point))
                .map(|(id, _)| *id),
        );
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(area, out);
            }
        }
    }
}

/// Region quadtree of points keyed by entity id.
#[derive(Debug)]
pub struct Quadtree {
    root: Node,
    capacity: usize,
    max_depth: usize,
    len: usize,
}

impl Quadtree {
    pub fn new(region: Rect, capacity: usize, max_depth: usize) -> Self {
        Self {
            root: Node::new(region, 0),
            capacity: capacity.max(1),
            max_depth,
            len: 0,
        }
    }

    pub fn region(&self) -> Rect {
        self.root.region
    }

    /// Returns `false` for points outside the tree's region.
    pub fn insert(&mut self, id: EntityId, point: Vec2) -> bool {
        let inserted = self.root.insert(id, point, self.capacity, self.max_depth);
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Ids of every point inside `area` (edges inclusive).
    pub fn query(&self, area: &Rect) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.root.query(area, &mut out);
        out
    }

    pub fn clear(&mut self) {
        self.root = Node::new(self.root.region, 0);
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug)]
pub struct QuadtreeSystem {
    tree: Quadtree,
}

impl QuadtreeSystem {
    pub fn new(region: Rect, capacity: usize, max_depth: usize) -> Self {
        Self {
            tree: Quadtree::new(region, capacity, max_depth),
        }
    }

    /// Entities whose position was inside `area` at the last update.
    pub fn query(&self, area: &Rect) -> Vec<EntityId> {
        self.tree.query(area)
    }

    pub fn tree(&self) -> &Quadtree {
        &self.tree
    }
}

impl System for QuadtreeSystem {
    fn dependencies(&self) -> &[&'static str] {
        &[TRANSFORM]
    }

    fn dispose(&mut self, _state: &mut SystemState) {
        self.tree.clear();
    }

    fn create_component(
        &mut self,
        _options: &Value,
        _entity: &EntityRef,
    ) -> Result<Component, ComponentError> {
        Ok(Box::new(()))
    }

    fn update(&mut self, entities: &[EntityRef], _delta: f32, _time: f64) {
        self.tree.clear();
        let mut outside = 0usize;
        for entity in entities {
            let entity = entity.borrow();
            let (Some(id), Some(transform)) = (entity.id(), entity.component::<Transform>(TRANSFORM))
            else {
                continue;
            };
            if !self.tree.insert(id, transform.position.truncate()) {
                outside += 1;
            }
        }
        trace!(indexed = self.tree.len(), outside, "quadtree rebuilt");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::World;
    use crate::systems::{TransformSystem, QUADTREE};
    use serde_json::json;

    #[test]
    fn splits_and_still_finds_everything() {
        let mut tree = Quadtree::new(Rect::from_size(100.0, 100.0), 2, 4);
        for i in 0..20u64 {
            assert!(tree.insert(i, Vec2::new(i as f32 * 5.0, i as f32 * 5.0)));
        }
        assert!(!tree.insert(99, Vec2::new(-1.0, 0.0)));
        assert_eq!(tree.len(), 20);

        let mut all = tree.query(&tree.region());
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());

        let mut corner = tree.query(&Rect::new(0.0, 0.0, 12.0, 12.0));
        corner.sort_unstable();
        assert_eq!(corner, vec![0, 1, 2]);
    }

    #[test]
    fn depth_limit_keeps_coincident_points_in_one_leaf() {
        let mut tree = Quadtree::new(Rect::from_size(10.0, 10.0), 1, 3);
        for i in 0..10 {
            assert!(tree.insert(i, Vec2::new(1.0, 1.0)));
        }
        assert_eq!(tree.query(&Rect::new(0.0, 0.0, 2.0, 2.0)).len(), 10);
    }

    #[test]
    fn world_update_rebuilds_the_index() {
        let mut world = World::new();
        world.register_system(TRANSFORM, TransformSystem).unwrap();
        world
            .register_system(QUADTREE, QuadtreeSystem::new(Rect::from_size(100.0, 100.0), 4, 4))
            .unwrap();

        let near = world
            .create_entity(
                crate::ecs::ComponentManifest::new()
                    .with(TRANSFORM, json!({ "position": { "x": 10, "y": 10 } }))
                    .with(QUADTREE, json!({})),
            )
            .unwrap();
        world
            .create_entity(
                crate::ecs::ComponentManifest::new()
                    .with(TRANSFORM, json!({ "position": { "x": 90, "y": 90 } }))
                    .with(QUADTREE, json!({})),
            )
            .unwrap();
        world.update(0.016, 16.0);

        let quadtree = world.system::<QuadtreeSystem>(QUADTREE).unwrap();
        assert_eq!(quadtree.query(&Rect::new(0.0, 0.0, 50.0, 50.0)), vec![near.id().unwrap()]);
        assert_eq!(quadtree.tree().len(), 2);
    }
}
