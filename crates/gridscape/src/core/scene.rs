//! Retained scene graph.
//!
//! Nodes live in a flat arena and are addressed by generational [`NodeId`]s,
//! so a handle to a node that was torn down by a rebuild simply stops
//! resolving instead of aliasing a new node.
//!
//! Fixed skeleton, created once and never removed:
//! ```text
//! stage
//! └── world          camera offset/scale, plus shake jitter
//!     ├── layers     disposable; rebuilt from state on every build
//!     └── effects    persistent effect space; effect nodes only
//! ```

use std::rc::Rc;

use glam::Vec2;

use crate::api::types::{EntityId, GridPos};
use crate::assets::atlas::TextureSlice;
use crate::components::layer::SceneLayer;
use crate::components::sprite::Color;

/// Handle of a node in a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// A handle that never resolves.
    pub const DANGLING: NodeId = NodeId {
        index: u32::MAX,
        generation: 0,
    };
}

/// Outline parameters for shapes and lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f32,
    pub color: Color,
}

impl Stroke {
    pub const fn new(width: f32, color: Color) -> Self {
        Self { width, color }
    }
}

/// What a node draws. Geometry is in node-local pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Groups children; draws nothing itself.
    Container,
    /// Textured quad. `anchor` is the fraction of `size` that sits on the node position.
    Sprite {
        slice: Rc<TextureSlice>,
        size: Vec2,
        anchor: Vec2,
    },
    /// Axis-aligned rectangle with its top-left corner at the node position.
    Rect {
        size: Vec2,
        fill: Color,
        stroke: Option<Stroke>,
    },
    /// Filled circle centered on the node position.
    Circle {
        radius: f32,
        fill: Color,
        stroke: Option<Stroke>,
    },
    /// Stroked circle centered on the node position.
    Ring { radius: f32, stroke: Stroke },
    /// Segment from the node position to `to` (local).
    Line { to: Vec2, stroke: Stroke },
    /// Quadratic curve from the node position through `control` to `to` (local).
    Curve {
        control: Vec2,
        to: Vec2,
        stroke: Stroke,
    },
    /// Text label. `anchor` is the fraction of the text box on the node position.
    Text {
        content: String,
        color: Color,
        font_size: f32,
        anchor: Vec2,
    },
}

/// Semantic marker used for lookups and tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Layer(SceneLayer),
    Tile(GridPos),
    TerrainMarker(GridPos),
    Entity(EntityId),
    HealthBar,
    HealthFill,
    Decoration,
    Tether,
    RangeCell(GridPos),
    AoeCell(GridPos),
    Effect,
}

/// A single scene node.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Position relative to the parent.
    pub position: Vec2,
    /// Scale relative to the parent.
    pub scale: Vec2,
    /// Opacity, multiplied down the hierarchy.
    pub alpha: f32,
    /// Invisible nodes and their subtrees are skipped when drawing.
    pub visible: bool,
    /// Whether pointer events hit-test against this node.
    pub interactive: bool,
    pub tag: Option<NodeTag>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            alpha: 1.0,
            visible: true,
            interactive: false,
            tag: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn container() -> Self {
        Self::new(NodeKind::Container)
    }

    // -- Builder pattern --

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec2::splat(scale);
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_tag(mut self, tag: NodeTag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Accumulated transform of a node in stage space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub translation: Vec2,
    pub scale: Vec2,
    pub alpha: f32,
}

impl WorldTransform {
    pub const IDENTITY: WorldTransform = WorldTransform {
        translation: Vec2::ZERO,
        scale: Vec2::ONE,
        alpha: 1.0,
    };

    /// Map a node-local point to stage space.
    pub fn apply(&self, local: Vec2) -> Vec2 {
        self.translation + local * self.scale
    }

    /// Map a stage-space point back to node-local space.
    pub fn inverse_apply(&self, stage: Vec2) -> Vec2 {
        (stage - self.translation) / self.scale
    }

    fn child(&self, node: &Node, extra: Vec2) -> WorldTransform {
        WorldTransform {
            translation: self.apply(node.position + extra),
            scale: self.scale * node.scale,
            alpha: self.alpha * node.alpha,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-backed node hierarchy.
#[derive(Debug)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    stage: NodeId,
    world: NodeId,
    layers: NodeId,
    effects: NodeId,
    world_jitter: Vec2,
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut graph = Self {
            slots: Vec::with_capacity(256),
            free: Vec::new(),
            live: 0,
            stage: NodeId::DANGLING,
            world: NodeId::DANGLING,
            layers: NodeId::DANGLING,
            effects: NodeId::DANGLING,
            world_jitter: Vec2::ZERO,
        };
        graph.stage = graph.insert(Node::container());
        graph.world = graph.add(graph.stage, Node::container());
        graph.layers = graph.add(graph.world, Node::container());
        graph.effects = graph.add(graph.world, Node::container());
        graph
    }

    pub fn stage(&self) -> NodeId {
        self.stage
    }

    /// The camera-positioned container holding both layers and effects.
    pub fn world(&self) -> NodeId {
        self.world
    }

    /// Parent of the disposable scene layers.
    pub fn layers_root(&self) -> NodeId {
        self.layers
    }

    /// Parent of effect nodes; untouched by rebuilds.
    pub fn effects_root(&self) -> NodeId {
        self.effects
    }

    /// Current container of a scene layer, if a build has created it.
    pub fn layer(&self, layer: SceneLayer) -> Option<NodeId> {
        self.children(self.layers)
            .iter()
            .copied()
            .find(|&id| self.get(id).and_then(|n| n.tag.as_ref()) == Some(&NodeTag::Layer(layer)))
    }

    /// Temporary offset added on top of the world position (camera shake).
    pub fn set_world_jitter(&mut self, jitter: Vec2) {
        self.world_jitter = jitter;
    }

    pub fn world_jitter(&self) -> Vec2 {
        self.world_jitter
    }

    /// World position as drawn: camera offset plus any jitter.
    pub fn effective_world_offset(&self) -> Vec2 {
        self.get(self.world).map_or(Vec2::ZERO, |n| n.position) + self.world_jitter
    }

    fn insert(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Attach a node under `parent`, on top of its existing children.
    ///
    /// Adding under a stale parent inserts nothing and returns [`NodeId::DANGLING`].
    pub fn add(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        if !self.contains(parent) {
            log::warn!("dropping node added under a stale parent");
            return NodeId::DANGLING;
        }
        node.parent = Some(parent);
        node.children.clear();
        let id = self.insert(node);
        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Remove a node and its whole subtree. The skeleton nodes cannot be removed.
    /// Returns the number of nodes freed.
    pub fn remove(&mut self, id: NodeId) -> usize {
        if [self.stage, self.world, self.layers, self.effects].contains(&id) {
            return 0;
        }
        let Some(parent) = self.get(id).map(|n| n.parent) else {
            return 0;
        };
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|&c| c != id);
        }
        self.free_subtree(id)
    }

    /// Remove every child of `id`, keeping `id` itself.
    pub fn clear_children(&mut self, id: NodeId) -> usize {
        let children = match self.get_mut(id) {
            Some(n) => std::mem::take(&mut n.children),
            None => return 0,
        };
        children.into_iter().map(|c| self.free_subtree(c)).sum()
    }

    fn free_subtree(&mut self, id: NodeId) -> usize {
        let Some(slot) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
        else {
            return 0;
        };
        let Some(node) = slot.node.take() else {
            return 0;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        1 + node
            .children
            .into_iter()
            .map(|c| self.free_subtree(c))
            .sum::<usize>()
    }

    /// Drop all layer and effect nodes and reset the camera.
    pub fn reset(&mut self) {
        self.clear_children(self.layers);
        self.clear_children(self.effects);
        self.world_jitter = Vec2::ZERO;
        let world = self.world;
        if let Some(w) = self.get_mut(world) {
            w.position = Vec2::ZERO;
            w.scale = Vec2::ONE;
        }
    }

    /// Number of live nodes, skeleton included.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of nodes below `id`, not counting `id`.
    pub fn descendant_count(&self, id: NodeId) -> usize {
        self.children(id)
            .iter()
            .map(|&c| 1 + self.descendant_count(c))
            .sum()
    }

    /// First node carrying `tag`, in paint order.
    pub fn find(&self, tag: &NodeTag) -> Option<NodeId> {
        let mut found = None;
        self.walk_from(self.stage, WorldTransform::IDENTITY, false, &mut |id, node, _| {
            if found.is_none() && node.tag.as_ref() == Some(tag) {
                found = Some(id);
            }
        });
        found
    }

    /// Stage-space transform of a node, composed through all its ancestors.
    pub fn world_transform(&self, id: NodeId) -> Option<WorldTransform> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.get(current)?;
            chain.push(current);
            cursor = node.parent;
        }
        let mut transform = WorldTransform::IDENTITY;
        for &ancestor in chain.iter().rev() {
            let node = self.get(ancestor)?;
            transform = transform.child(node, self.jitter_for(ancestor));
        }
        Some(transform)
    }

    fn jitter_for(&self, id: NodeId) -> Vec2 {
        if id == self.world {
            self.world_jitter
        } else {
            Vec2::ZERO
        }
    }

    /// Visit visible nodes depth-first in paint order (parents before children,
    /// earlier siblings before later ones) with their stage transforms.
    pub fn walk(&self, mut visit: impl FnMut(NodeId, &Node, &WorldTransform)) {
        self.walk_from(self.stage, WorldTransform::IDENTITY, true, &mut visit);
    }

    fn walk_from(
        &self,
        id: NodeId,
        parent: WorldTransform,
        visible_only: bool,
        visit: &mut dyn FnMut(NodeId, &Node, &WorldTransform),
    ) {
        let Some(node) = self.get(id) else { return };
        if visible_only && !node.visible {
            return;
        }
        let transform = parent.child(node, self.jitter_for(id));
        visit(id, node, &transform);
        for &child in &node.children {
            self.walk_from(child, transform, visible_only, visit);
        }
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
