//! The `InkModel` root aggregate (§3.7, §4.8) tying together input
//! configuration, sensor data, strokes, brushes, trees, and the semantic
//! graph, with the cross-cutting invariants I1-I5 enforced on every
//! mutation that can violate them.

use uim_identity::RandomId;
use uim_units::Matrix4;

use crate::error::ModelError;
use crate::ink::{BrushRepository, PathPointPropertiesRepository, Stroke};
use crate::input::InputConfigRepository;
use crate::repo::OrderedRepo;
use crate::semantic::{self, Triple, TripleStore};
use crate::sensor::SensorDataRepository;
use crate::tree::{BoundingBox, Fragment, InkNode, InkTree};

/// The RIFF container format version a model was read from, or will be
/// written as (§4.9).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Version {
    /// Read-only legacy format; its `uim:<uuid>/<tree>` URIs are upgraded
    /// to the current scheme on load.
    V3_0_0,
    /// The current read/write format.
    V3_1_0,
}

impl Default for Version {
    fn default() -> Self {
        Self::V3_1_0
    }
}

/// Owns every [`Stroke`], keyed by its `RandomId`.
#[derive(Debug, Default)]
pub struct StrokeRepository {
    strokes: OrderedRepo<u128, Stroke>,
}

impl StrokeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stroke: Stroke) -> RandomId {
        let id = stroke.id();
        self.strokes.insert(id.id().value(), stroke);
        id
    }

    pub fn get(&self, id: RandomId) -> Result<&Stroke, ModelError> {
        self.strokes
            .get(id.id().value())
            .ok_or_else(|| ModelError::NotFound {
                what: "Stroke",
                id: id.to_h_form(),
            })
    }

    pub fn contains(&self, id: RandomId) -> bool {
        self.strokes.contains(id.id().value())
    }

    pub fn iter(&self) -> impl Iterator<Item = (RandomId, &Stroke)> {
        self.strokes
            .iter()
            .map(|(value, stroke)| (RandomId::from_u128(value), stroke))
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

/// The in-memory representation of a Universal Ink Model document.
pub struct InkModel {
    pub version: Version,
    pub unit_scale_factor: f64,
    pub transform: Matrix4,
    pub properties: Vec<(String, String)>,
    pub input_config: InputConfigRepository,
    pub sensor_data: SensorDataRepository,
    pub strokes: StrokeRepository,
    pub brushes: BrushRepository,
    /// The deduplicated style-properties palette strokes are written
    /// against on the wire (§4.5 "indexed style palette"); kept current
    /// automatically by [`Self::add_stroke`].
    pub path_point_properties: PathPointPropertiesRepository,
    main_tree: InkTree,
    view_trees: Vec<InkTree>,
    pub triples: TripleStore,
}

impl Default for InkModel {
    fn default() -> Self {
        Self::new()
    }
}

impl InkModel {
    pub fn new() -> Self {
        Self {
            version: Version::default(),
            unit_scale_factor: 1.0,
            transform: Matrix4::identity(),
            properties: Vec::new(),
            input_config: InputConfigRepository::new(),
            sensor_data: SensorDataRepository::new(),
            strokes: StrokeRepository::new(),
            brushes: BrushRepository::new(),
            path_point_properties: PathPointPropertiesRepository::new(),
            main_tree: InkTree::new_main(),
            view_trees: Vec::new(),
            triples: TripleStore::new(),
        }
    }

    pub fn main_tree(&self) -> &InkTree {
        &self.main_tree
    }

    pub fn view(&self, name: &str) -> Option<&InkTree> {
        self.view_trees.iter().find(|t| t.name() == Some(name))
    }

    pub fn views(&self) -> impl Iterator<Item = &InkTree> {
        self.view_trees.iter()
    }

    /// Records a stroke's data, also depositing its style properties in
    /// the shared palette (§4.5). Does not place the stroke in any tree;
    /// callers must also reference it from the main tree for the model
    /// to validate (I1).
    pub fn add_stroke(&mut self, stroke: Stroke) -> RandomId {
        self.path_point_properties.add(stroke.style.properties);
        self.strokes.insert(stroke)
    }

    /// Registers `root` as the main tree (§4.8). Every stroke the subtree
    /// references must already be in [`Self::strokes`] (I1).
    pub fn attach_main_tree(&mut self, root: InkNode) -> Result<(), ModelError> {
        self.check_strokes_exist(&root)?;
        self.main_tree.attach(root)
    }

    /// Registers a new named view over a subtree whose strokes must all
    /// already appear in the main tree (I1, "views only reference strokes
    /// that exist in the main tree").
    pub fn attach_view(&mut self, name: impl Into<String>, root: InkNode) -> Result<(), ModelError> {
        let name = name.into();
        if self.view(&name).is_some() {
            return Err(ModelError::DuplicateUri(semantic::uri_view(&name)));
        }
        let main_strokes = self.main_tree.stroke_ids();
        for stroke_id in root.stroke_ids() {
            if !main_strokes.contains(&stroke_id) {
                return Err(ModelError::MissingStrokeInMainTree(stroke_id.to_h_form()));
            }
        }
        let mut tree = InkTree::new_view(name);
        tree.attach(root)?;
        self.view_trees.push(tree);
        Ok(())
    }

    pub fn detach_view(&mut self, name: &str) -> Result<(), ModelError> {
        let position = self
            .view_trees
            .iter()
            .position(|t| t.name() == Some(name))
            .ok_or_else(|| ModelError::NotFound {
                what: "view",
                id: name.to_owned(),
            })?;
        let uri = semantic::uri_view(name);
        self.triples.remove_by_subject(&uri);
        self.view_trees.remove(position);
        Ok(())
    }

    /// Finds a node by id in the main tree or any view, returning it
    /// alongside the tree-qualifier ("main" or the view's name) it lives
    /// under.
    fn find_node(&self, id: RandomId) -> Option<(&str, &InkNode)> {
        if self.main_tree.contains_node(id) {
            return self.main_tree.find(id).map(|node| ("main", node));
        }
        self.view_trees.iter().find_map(|view| {
            if !view.contains_node(id) {
                return None;
            }
            view.find(id).map(|node| (view.name().unwrap_or(""), node))
        })
    }

    /// Clones a node (and, per the two flags, some or all of its
    /// descendants) under fresh node ids (§4.8 "clone-subtree"). The
    /// clone is returned detached; the caller attaches it wherever it
    /// belongs. Every semantic triple whose subject named one of the
    /// cloned-away nodes is duplicated onto the clone's new URI, under
    /// both its bare (`uim:<id>`) and tree-qualified (`uim:<tree>/<id>`)
    /// forms — the originals are left in place.
    pub fn clone_node(
        &mut self,
        node_id: RandomId,
        copy_stroke_refs: bool,
        recurse_groups: bool,
    ) -> Result<InkNode, ModelError> {
        let (tree_name, clone, mapping) = {
            let (tree_name, original) =
                self.find_node(node_id).ok_or_else(|| ModelError::NotFound {
                    what: "tree node",
                    id: node_id.to_h_form(),
                })?;
            let tree_name = tree_name.to_owned();
            let (clone, mapping) =
                original.clone_subtree_with_mapping(copy_stroke_refs, recurse_groups);
            (tree_name, clone, mapping)
        };

        let mut new_triples = Vec::new();
        for (old_id, new_id) in &mapping {
            let forms = [
                (semantic::uri_node(*old_id), semantic::uri_node(*new_id)),
                (
                    semantic::uri_tree_node(&tree_name, *old_id),
                    semantic::uri_tree_node(&tree_name, *new_id),
                ),
            ];
            for (old_uri, new_uri) in forms {
                for triple in self.triples.filter(Some(&old_uri), None, None) {
                    new_triples.push(Triple::new(
                        new_uri.clone(),
                        triple.predicate.clone(),
                        triple.object.clone(),
                    ));
                }
            }
        }
        for triple in new_triples {
            self.triples.add(triple);
        }

        Ok(clone)
    }

    fn check_strokes_exist(&self, root: &InkNode) -> Result<(), ModelError> {
        for stroke_id in root.stroke_ids() {
            if !self.strokes.contains(stroke_id) {
                return Err(ModelError::NotFound {
                    what: "Stroke",
                    id: stroke_id.to_h_form(),
                });
            }
        }
        Ok(())
    }

    /// Adds a triple, rejecting subjects that don't name a node
    /// registered anywhere in the model (I5).
    pub fn add_triple(&mut self, triple: Triple) -> Result<(), ModelError> {
        if !self.uri_is_registered(&triple.subject) {
            return Err(ModelError::NotFound {
                what: "triple subject",
                id: triple.subject.clone(),
            });
        }
        self.triples.add(triple);
        Ok(())
    }

    fn uri_is_registered(&self, uri: &str) -> bool {
        if let Some(stroke_suffix) = uri.strip_prefix("uim:stroke/") {
            if let Ok(id) = stroke_suffix.parse::<RandomId>() {
                return self.strokes.contains(id);
            }
            return false;
        }
        if let Some(rest) = uri.strip_prefix("uim:view/") {
            return self.view(rest).is_some();
        }
        // Named-entity URIs are content-addressed subjects, not node
        // references: I5 only binds "a triple subject that *is a node
        // URI*", and named entities are never registered in a tree.
        if uri.starts_with("uim:ne/") {
            return true;
        }
        if let Some(rest) = uri.strip_prefix("uim:") {
            if let Some((tree, id)) = rest.split_once('/') {
                if let Ok(id) = id.parse::<RandomId>() {
                    let in_tree = if tree == "main" {
                        self.main_tree.contains_node(id)
                    } else {
                        self.view(tree).is_some_and(|t| t.contains_node(id))
                    };
                    return in_tree;
                }
                return false;
            }
            if let Ok(id) = rest.parse::<RandomId>() {
                return self.main_tree.contains_node(id)
                    || self.view_trees.iter().any(|t| t.contains_node(id));
            }
        }
        false
    }

    /// Checks every cross-cutting invariant (I1-I5) the aggregate must
    /// hold after construction or deserialization.
    pub fn validate(&self) -> Result<(), ModelError> {
        // I1: every tree's strokes exist in the stroke repository, and
        // every view's strokes additionally exist in the main tree. A
        // model need not have a main tree at all (§3.7 "main_tree?").
        if let Some(root) = self.main_tree.root() {
            self.check_strokes_exist(root)?;
        }
        let main_strokes = self.main_tree.stroke_ids();
        for view in &self.view_trees {
            if let Some(root) = view.root() {
                for stroke_id in root.stroke_ids() {
                    if !main_strokes.contains(&stroke_id) {
                        return Err(ModelError::MissingStrokeInMainTree(stroke_id.to_h_form()));
                    }
                }
            }
        }

        // I2: node URIs are unique across the main tree and every view.
        let mut seen = std::collections::HashSet::new();
        for id in self.main_tree.node_ids() {
            if !seen.insert(*id) {
                return Err(ModelError::DuplicateUri(semantic::uri_node(*id)));
            }
        }
        for view in &self.view_trees {
            for id in view.node_ids() {
                if !seen.insert(*id) {
                    return Err(ModelError::DuplicateUri(semantic::uri_node(*id)));
                }
            }
        }

        // I3: every stroke's sensor_data_id, if set, resolves.
        for (_, stroke) in self.strokes.iter() {
            if let Some(sensor_id) = stroke.sensor_data_id {
                if !self.sensor_data.contains(sensor_id) {
                    return Err(ModelError::NotFound {
                        what: "SensorData",
                        id: sensor_id.to_h_form(),
                    });
                }
            }
        }

        // I5: every triple subject names a node that is actually
        // registered in the model.
        for triple in self.triples.iter() {
            if !self.uri_is_registered(&triple.subject) {
                return Err(ModelError::NotFound {
                    what: "triple subject",
                    id: triple.subject.clone(),
                });
            }
        }

        Ok(())
    }

    /// Recomputes every group's bbox on the main tree and every view,
    /// bottom-up from each referenced stroke's X/Y spline extents (§4.8
    /// "bbox recomputation is lazy").
    pub fn recompute_bounds(&mut self) {
        if let Some(root) = self.main_tree.root_mut() {
            recompute_node_bbox(root, &self.strokes);
        }
        for view in &mut self.view_trees {
            if let Some(root) = view.root_mut() {
                recompute_node_bbox(root, &self.strokes);
            }
        }
    }
}

fn recompute_node_bbox(node: &mut InkNode, strokes: &StrokeRepository) -> Option<BoundingBox> {
    match node {
        InkNode::StrokeGroup { children, bbox, .. } => {
            let mut union = None;
            for child in children.iter_mut() {
                if let Some(child_bbox) = recompute_node_bbox(child, strokes) {
                    union = Some(match union {
                        Some(existing) => BoundingBox::union(existing, child_bbox),
                        None => child_bbox,
                    });
                }
            }
            *bbox = union;
            union
        }
        InkNode::StrokeRef {
            stroke_id,
            fragment,
            ..
        } => stroke_bbox(strokes, *stroke_id, *fragment),
    }
}

fn stroke_bbox(
    strokes: &StrokeRepository,
    stroke_id: RandomId,
    fragment: Option<Fragment>,
) -> Option<BoundingBox> {
    let stroke = strokes.get(stroke_id).ok()?;
    let (from, to) = match fragment {
        Some(f) => (f.from_point_index as usize, f.to_point_index as usize),
        None => {
            let point_count = stroke.spline.point_count();
            if point_count == 0 {
                return None;
            }
            (0, point_count - 1)
        }
    };

    let mut bbox = None;
    for index in from..=to {
        if let Some((x, y)) = stroke.spline.xy(index) {
            bbox = Some(match bbox {
                Some(existing) => BoundingBox::include(existing, x, y),
                None => BoundingBox::from_point(x, y),
            });
        }
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ink::{LayoutMask, PathPointProperties, Spline, Style};

    fn sample_stroke() -> Stroke {
        let spline = Spline {
            layout_mask: LayoutMask::new(LayoutMask::XY).unwrap(),
            values: vec![0.0, 0.0, 1.0, 1.0],
        };
        let style = Style::new(PathPointProperties::default(), None);
        Stroke::new(spline, style)
    }

    #[test]
    fn empty_model_with_empty_main_tree_validates() {
        let mut model = InkModel::new();
        model.attach_main_tree(InkNode::new_group(vec![])).unwrap();
        model.validate().unwrap();
    }

    #[test]
    fn model_with_no_main_tree_at_all_validates() {
        // §3.7 "main_tree?": a brand-new model has no main tree attached
        // yet and that is still a valid, encodable state.
        let model = InkModel::new();
        assert!(model.main_tree().root().is_none());
        model.validate().unwrap();
    }

    #[test]
    fn attaching_main_tree_with_unknown_stroke_fails() {
        let mut model = InkModel::new();
        let node = InkNode::new_stroke_ref(RandomId::new(), None);
        let err = model.attach_main_tree(node).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }

    #[test]
    fn view_referencing_stroke_outside_main_tree_fails() {
        let mut model = InkModel::new();
        let stroke = sample_stroke();
        let stroke_id = model.add_stroke(stroke);
        model.attach_main_tree(InkNode::new_group(vec![])).unwrap();

        let view_root = InkNode::new_stroke_ref(stroke_id, None);
        let err = model.attach_view("hwr", view_root).unwrap_err();
        assert!(matches!(err, ModelError::MissingStrokeInMainTree(_)));
    }

    #[test]
    fn view_referencing_a_main_tree_stroke_succeeds() {
        let mut model = InkModel::new();
        let stroke = sample_stroke();
        let stroke_id = model.add_stroke(stroke);
        let main_root = InkNode::new_group(vec![InkNode::new_stroke_ref(stroke_id, None)]);
        model.attach_main_tree(main_root).unwrap();

        let view_root = InkNode::new_stroke_ref(stroke_id, None);
        model.attach_view("hwr", view_root).unwrap();
        model.validate().unwrap();
        assert!(model.view("hwr").is_some());
    }

    #[test]
    fn triple_with_unregistered_subject_is_rejected() {
        let mut model = InkModel::new();
        model.attach_main_tree(InkNode::new_group(vec![])).unwrap();
        let err = model
            .add_triple(Triple::new("uim:stroke/not-registered", "p", "o"))
            .unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }

    #[test]
    fn triple_on_a_registered_stroke_is_accepted() {
        let mut model = InkModel::new();
        let stroke = sample_stroke();
        let stroke_id = model.add_stroke(stroke);
        let main_root = InkNode::new_group(vec![InkNode::new_stroke_ref(stroke_id, None)]);
        model.attach_main_tree(main_root).unwrap();

        model
            .add_triple(Triple::new(semantic::uri_stroke(stroke_id), "is-a", "stroke"))
            .unwrap();
        model.validate().unwrap();
    }

    #[test]
    fn recompute_bounds_unions_stroke_extents_up_the_tree() {
        let mut model = InkModel::new();
        let stroke_a = model.add_stroke(Stroke::new(
            Spline {
                layout_mask: LayoutMask::new(LayoutMask::XY).unwrap(),
                values: vec![0.0, 0.0, 2.0, 3.0],
            },
            Style::new(PathPointProperties::default(), None),
        ));
        let stroke_b = model.add_stroke(Stroke::new(
            Spline {
                layout_mask: LayoutMask::new(LayoutMask::XY).unwrap(),
                values: vec![-1.0, 5.0, 4.0, -2.0],
            },
            Style::new(PathPointProperties::default(), None),
        ));
        model
            .attach_main_tree(InkNode::new_group(vec![
                InkNode::new_stroke_ref(stroke_a, None),
                InkNode::new_group(vec![InkNode::new_stroke_ref(stroke_b, None)]),
            ]))
            .unwrap();

        model.recompute_bounds();

        let root_bbox = model.main_tree().root().unwrap().bbox().unwrap();
        assert_eq!(root_bbox.min_x, -1.0);
        assert_eq!(root_bbox.min_y, -2.0);
        assert_eq!(root_bbox.max_x, 4.0);
        assert_eq!(root_bbox.max_y, 5.0);
    }

    #[test]
    fn detaching_a_view_cascades_triple_removal() {
        let mut model = InkModel::new();
        let stroke = sample_stroke();
        let stroke_id = model.add_stroke(stroke);
        let main_root = InkNode::new_group(vec![InkNode::new_stroke_ref(stroke_id, None)]);
        model.attach_main_tree(main_root).unwrap();
        model
            .attach_view("hwr", InkNode::new_stroke_ref(stroke_id, None))
            .unwrap();
        model
            .add_triple(Triple::new(semantic::uri_view("hwr"), "label", "word"))
            .unwrap();

        model.detach_view("hwr").unwrap();
        assert!(model.view("hwr").is_none());
        assert_eq!(model.triples.filter(Some(&semantic::uri_view("hwr")), None, None).count(), 0);
    }

    #[test]
    fn clone_node_re_subjects_triples_onto_the_clones_new_uris() {
        let mut model = InkModel::new();
        let stroke = sample_stroke();
        let stroke_id = model.add_stroke(stroke);
        let leaf = InkNode::new_stroke_ref(stroke_id, None);
        let leaf_id = leaf.id();
        let main_root = InkNode::new_group(vec![leaf]);
        model.attach_main_tree(main_root).unwrap();

        model
            .add_triple(Triple::new(semantic::uri_tree_node("main", leaf_id), "label", "word"))
            .unwrap();

        let clone = model.clone_node(leaf_id, true, true).unwrap();
        assert_ne!(clone.id(), leaf_id);
        assert_eq!(clone.stroke_ids(), vec![stroke_id]);

        let new_subject = semantic::uri_tree_node("main", clone.id());
        let copied: Vec<_> = model.triples.filter(Some(&new_subject), None, None).collect();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].object, "word");

        // the original fact is untouched, not moved.
        let original_subject = semantic::uri_tree_node("main", leaf_id);
        assert_eq!(model.triples.filter(Some(&original_subject), None, None).count(), 1);
    }

    #[test]
    fn clone_node_rejects_unknown_ids() {
        let mut model = InkModel::new();
        model.attach_main_tree(InkNode::new_group(vec![])).unwrap();
        let err = model.clone_node(RandomId::new(), true, true).unwrap_err();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }
}
