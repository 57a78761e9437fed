//! Tree model (§3.6, §4.8): the main stroke tree plus any number of named
//! views over the same strokes.

use uim_identity::RandomId;

use crate::error::ModelError;

/// A contiguous sub-range of a stroke's spline, used when a stroke is
/// split across two or more tree nodes (§3.6 "Fragment"). `from_t`/
/// `to_t` locate the sub-range within `from_point_index`'s and
/// `to_point_index`'s own interpolation segments.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fragment {
    pub from_point_index: u32,
    pub to_point_index: u32,
    pub from_t: f32,
    pub to_t: f32,
}

impl Fragment {
    /// Checks `0 ≤ from_point_index ≤ to_point_index` and that both
    /// t-values lie in `[0, 1]` (§3.6, §7 "OutOfRange").
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.from_point_index > self.to_point_index {
            return Err(ModelError::OutOfRange {
                field: "to_point_index",
                value: self.to_point_index as f64,
                min: self.from_point_index as f64,
                max: u32::MAX as f64,
            });
        }
        for (field, t) in [("from_t", self.from_t), ("to_t", self.to_t)] {
            if !(0.0..=1.0).contains(&t) {
                return Err(ModelError::OutOfRange {
                    field,
                    value: t as f64,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        Ok(())
    }
}

/// Axis-aligned bounds of a subtree's geometry (§3.6 "bbox?", §4.8
/// "bbox recomputation is lazy").
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    pub fn from_point(x: f32, y: f32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    pub fn include(self, x: f32, y: f32) -> Self {
        Self {
            min_x: self.min_x.min(x),
            min_y: self.min_y.min(y),
            max_x: self.max_x.max(x),
            max_y: self.max_y.max(y),
        }
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// A node in an ink tree: either a group of children or a reference to a
/// stroke (§3.6).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InkNode {
    StrokeGroup {
        id: RandomId,
        children: Vec<InkNode>,
        /// Union of every descendant's bbox, filled in by
        /// [`crate::InkModel::recompute_bounds`]; `None` until the first
        /// recompute, or if the group has no geometry yet.
        bbox: Option<BoundingBox>,
    },
    StrokeRef {
        id: RandomId,
        stroke_id: RandomId,
        fragment: Option<Fragment>,
    },
}

impl InkNode {
    pub fn new_group(children: Vec<InkNode>) -> Self {
        Self::StrokeGroup {
            id: RandomId::new(),
            children,
            bbox: None,
        }
    }

    pub fn new_stroke_ref(stroke_id: RandomId, fragment: Option<Fragment>) -> Self {
        Self::StrokeRef {
            id: RandomId::new(),
            stroke_id,
            fragment,
        }
    }

    /// A group node under a specific id, for the codec layer restoring
    /// the identity a document was written with.
    pub fn new_group_with_id(id: RandomId, children: Vec<InkNode>, bbox: Option<BoundingBox>) -> Self {
        Self::StrokeGroup { id, children, bbox }
    }

    /// A stroke-ref node under a specific id; see
    /// [`Self::new_group_with_id`].
    pub fn new_stroke_ref_with_id(
        id: RandomId,
        stroke_id: RandomId,
        fragment: Option<Fragment>,
    ) -> Self {
        Self::StrokeRef {
            id,
            stroke_id,
            fragment,
        }
    }

    pub fn id(&self) -> RandomId {
        match self {
            Self::StrokeGroup { id, .. } | Self::StrokeRef { id, .. } => *id,
        }
    }

    /// This node's bbox: the stored value for a group, or `None` for a
    /// stroke-ref (whose bbox is derived live from its stroke, not
    /// stored on the node).
    pub fn bbox(&self) -> Option<BoundingBox> {
        match self {
            Self::StrokeGroup { bbox, .. } => *bbox,
            Self::StrokeRef { .. } => None,
        }
    }

    /// Depth-first, pre-order walk over this node and its descendants.
    pub fn walk_pre_order<'a>(&'a self, visit: &mut impl FnMut(&'a InkNode)) {
        visit(self);
        if let Self::StrokeGroup { children, .. } = self {
            for child in children {
                child.walk_pre_order(visit);
            }
        }
    }

    /// Every stroke id reachable from this node, including through
    /// fragments.
    pub fn stroke_ids(&self) -> Vec<RandomId> {
        let mut out = Vec::new();
        self.walk_pre_order(&mut |node| {
            if let Self::StrokeRef { stroke_id, .. } = node {
                out.push(*stroke_id);
            }
        });
        out
    }

    /// Clones this node and, depending on the two flags, some or all of
    /// its descendants, all under fresh node ids (§4.8 "clone-subtree":
    /// "optionally copying child stroke-refs ... and optionally child
    /// groups recursively"). `copy_stroke_refs` keeps or drops immediate
    /// stroke-ref children; `recurse_groups` keeps or drops nested group
    /// children (and, transitively, everything under them). The root
    /// node itself is always cloned regardless of either flag.
    pub fn clone_subtree(&self, copy_stroke_refs: bool, recurse_groups: bool) -> Self {
        self.clone_subtree_with_mapping(copy_stroke_refs, recurse_groups).0
    }

    /// As [`Self::clone_subtree`], additionally returning the `(old id,
    /// new id)` pairs for every node the clone kept, in pre-order — the
    /// caller's hook for re-subjecting semantic triples onto the clone's
    /// new URIs (§4.8 "semantic triples whose subject is a cloned node
    /// are re-subjected to the new URIs").
    pub fn clone_subtree_with_mapping(
        &self,
        copy_stroke_refs: bool,
        recurse_groups: bool,
    ) -> (Self, Vec<(RandomId, RandomId)>) {
        let mut mapping = Vec::new();
        let clone = clone_with_mapping(self, copy_stroke_refs, recurse_groups, &mut mapping);
        (clone, mapping)
    }
}

fn clone_with_mapping(
    node: &InkNode,
    copy_stroke_refs: bool,
    recurse_groups: bool,
    mapping: &mut Vec<(RandomId, RandomId)>,
) -> InkNode {
    let new_id = RandomId::new();
    mapping.push((node.id(), new_id));
    match node {
        InkNode::StrokeGroup { children, bbox, .. } => {
            let children = children
                .iter()
                .filter_map(|child| match child {
                    InkNode::StrokeRef { .. } if !copy_stroke_refs => None,
                    InkNode::StrokeGroup { .. } if !recurse_groups => None,
                    _ => Some(clone_with_mapping(child, copy_stroke_refs, recurse_groups, mapping)),
                })
                .collect();
            InkNode::StrokeGroup {
                id: new_id,
                children,
                bbox: *bbox,
            }
        }
        InkNode::StrokeRef {
            stroke_id,
            fragment,
            ..
        } => InkNode::StrokeRef {
            id: new_id,
            stroke_id: *stroke_id,
            fragment: *fragment,
        },
    }
}

/// The lifecycle state of an [`InkTree`]: detached trees have no URI and
/// are not yet part of the model's namespace (§4.8).
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TreeState {
    #[default]
    Detached,
    Registered,
}

/// One tree of ink nodes: the model's single main tree, or one of its
/// named views (§3.6).
#[derive(Clone, Debug)]
pub struct InkTree {
    name: Option<String>,
    root: Option<InkNode>,
    state: TreeState,
    node_ids: Vec<RandomId>,
}

impl InkTree {
    /// A detached main tree, with no name and no root yet.
    pub fn new_main() -> Self {
        Self {
            name: None,
            root: None,
            state: TreeState::Detached,
            node_ids: Vec::new(),
        }
    }

    /// A detached named view tree.
    pub fn new_view(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            root: None,
            state: TreeState::Detached,
            node_ids: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_main(&self) -> bool {
        self.name.is_none()
    }

    pub fn root(&self) -> Option<&InkNode> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut InkNode> {
        self.root.as_mut()
    }

    pub fn state(&self) -> &TreeState {
        &self.state
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.state, TreeState::Registered)
    }

    /// Sets the tree's root and marks it registered, rebuilding the node
    /// index. Fails if the tree is already registered (§4.8
    /// "AlreadyAttached").
    pub fn attach(&mut self, root: InkNode) -> Result<(), ModelError> {
        if self.is_registered() {
            return Err(ModelError::AlreadyAttached(
                self.name.clone().unwrap_or_else(|| "main".to_owned()),
            ));
        }
        self.reindex(&root);
        self.root = Some(root);
        self.state = TreeState::Registered;
        Ok(())
    }

    /// Detaches the tree, clearing its root and node index, and returns
    /// to [`TreeState::Detached`].
    pub fn detach(&mut self) {
        self.root = None;
        self.node_ids.clear();
        self.state = TreeState::Detached;
    }

    fn reindex(&mut self, root: &InkNode) {
        self.node_ids.clear();
        root.walk_pre_order(&mut |node| self.node_ids.push(node.id()));
    }

    pub fn contains_node(&self, id: RandomId) -> bool {
        self.node_ids.contains(&id)
    }

    pub fn node_ids(&self) -> &[RandomId] {
        &self.node_ids
    }

    /// Every stroke id reachable from the root, or empty if detached.
    pub fn stroke_ids(&self) -> Vec<RandomId> {
        self.root.as_ref().map(InkNode::stroke_ids).unwrap_or_default()
    }

    pub fn find(&self, id: RandomId) -> Option<&InkNode> {
        let mut found = None;
        if let Some(root) = &self.root {
            root.walk_pre_order(&mut |node| {
                if found.is_none() && node.id() == id {
                    found = Some(node);
                }
            });
        }
        found
    }
}
