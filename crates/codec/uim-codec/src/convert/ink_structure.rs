//! INKS chunk conversion: [`uim_model::tree`] <-> [`uim_proto`].
//!
//! Trees are flattened pre-order into a flat `repeated InkNode`, each
//! node carrying its `depth` from the root (§4.9's depth-marker framing,
//! matched for byte/schema compatibility with real Wacom-produced 3.1.0
//! documents), so neither direction recurses: encoding walks an explicit
//! stack of `(sibling iterator, depth)` frames, and decoding rebuilds
//! parents by popping its open-group stack until the top has depth
//! `d - 1` before attaching the next node of depth `d`.

use uim_model::tree::{BoundingBox, Fragment, InkNode, InkTree};

use crate::error::{CodecError, Result};

use super::id::{random_id_from_proto, random_id_to_proto};

fn fragment_to_proto(fragment: Fragment) -> uim_proto::Fragment {
    uim_proto::Fragment {
        from_point_index: fragment.from_point_index,
        to_point_index: fragment.to_point_index,
        from_t: fragment.from_t,
        to_t: fragment.to_t,
    }
}

fn fragment_from_proto(proto: &uim_proto::Fragment) -> Result<Fragment> {
    let fragment = Fragment {
        from_point_index: proto.from_point_index,
        to_point_index: proto.to_point_index,
        from_t: proto.from_t,
        to_t: proto.to_t,
    };
    fragment.validate()?;
    Ok(fragment)
}

fn bbox_to_proto(bbox: BoundingBox) -> uim_proto::BoundingBox {
    uim_proto::BoundingBox {
        min_x: bbox.min_x,
        min_y: bbox.min_y,
        max_x: bbox.max_x,
        max_y: bbox.max_y,
    }
}

fn bbox_from_proto(proto: &uim_proto::BoundingBox) -> BoundingBox {
    BoundingBox {
        min_x: proto.min_x,
        min_y: proto.min_y,
        max_x: proto.max_x,
        max_y: proto.max_y,
    }
}

/// Pre-order flattening with an explicit depth marker on every node
/// (root depth 0). Walks a stack of `(sibling iterator, depth)` frames
/// rather than recursing, so flattening depth is bounded by available
/// heap, not Rust stack frames.
fn flatten(root: &InkNode, out: &mut Vec<uim_proto::InkNode>) {
    use uim_proto::ink_node::Kind;

    fn push_node(node: &InkNode, depth: u32, out: &mut Vec<uim_proto::InkNode>) {
        match node {
            InkNode::StrokeGroup { id, bbox, .. } => out.push(uim_proto::InkNode {
                id: Some(random_id_to_proto(*id)),
                depth,
                kind: Some(Kind::Group(uim_proto::GroupNode {
                    bbox: bbox.map(bbox_to_proto),
                })),
            }),
            InkNode::StrokeRef {
                id,
                stroke_id,
                fragment,
            } => out.push(uim_proto::InkNode {
                id: Some(random_id_to_proto(*id)),
                depth,
                kind: Some(Kind::StrokeRef(uim_proto::StrokeRef {
                    stroke_id: Some(random_id_to_proto(*stroke_id)),
                    fragment: fragment.map(fragment_to_proto),
                })),
            }),
        }
    }

    push_node(root, 0, out);
    let mut stack: Vec<(std::slice::Iter<'_, InkNode>, u32)> = Vec::new();
    if let InkNode::StrokeGroup { children, .. } = root {
        stack.push((children.iter(), 1));
    }

    while let Some((frame, depth)) = stack.last_mut() {
        let depth = *depth;
        match frame.next() {
            Some(child) => {
                push_node(child, depth, out);
                if let InkNode::StrokeGroup { children, .. } = child {
                    stack.push((children.iter(), depth + 1));
                }
            }
            None => {
                stack.pop();
            }
        }
    }
}

/// Rebuilds a tree from its depth-marked pre-order flattening without
/// recursion: a stack of still-open group frames. Before attaching a
/// node of depth `d`, pops every frame whose depth is `>= d` (each pop
/// finalizes that group and attaches it to its own parent, or completes
/// the tree if the stack empties), leaving the new top at depth `d - 1`.
fn unflatten(nodes: &[uim_proto::InkNode]) -> Result<Option<InkNode>> {
    use uim_proto::ink_node::Kind;

    struct Frame {
        id: uim_identity::RandomId,
        depth: u32,
        children: Vec<InkNode>,
        bbox: Option<BoundingBox>,
    }

    fn attach(stack: &mut Vec<Frame>, completed: &mut Option<InkNode>, node: InkNode) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => *completed = Some(node),
        }
    }

    let mut stack: Vec<Frame> = Vec::new();
    let mut completed: Option<InkNode> = None;

    for proto_node in nodes {
        let id = proto_node
            .id
            .as_ref()
            .map(random_id_from_proto)
            .ok_or_else(|| CodecError::FormatError("ink tree node missing id".into()))?;
        let depth = proto_node.depth;

        if depth == 0 && (completed.is_some() || !stack.is_empty()) {
            return Err(CodecError::FormatError(
                "ink tree flattening has more than one root".into(),
            ));
        }

        while let Some(top) = stack.last() {
            if top.depth < depth {
                break;
            }
            let frame = stack.pop().expect("just matched Some");
            let finished = InkNode::new_group_with_id(frame.id, frame.children, frame.bbox);
            attach(&mut stack, &mut completed, finished);
        }

        if depth > 0 {
            let parent_depth = stack.last().map(|frame| frame.depth);
            if parent_depth != Some(depth - 1) {
                return Err(CodecError::FormatError(
                    "ink tree node depth breaks pre-order nesting".into(),
                ));
            }
        }

        match &proto_node.kind {
            Some(Kind::Group(group)) => {
                stack.push(Frame {
                    id,
                    depth,
                    children: Vec::new(),
                    bbox: group.bbox.as_ref().map(bbox_from_proto),
                });
            }
            Some(Kind::StrokeRef(stroke_ref)) => {
                let stroke_id = stroke_ref
                    .stroke_id
                    .as_ref()
                    .map(random_id_from_proto)
                    .ok_or_else(|| {
                        CodecError::FormatError("ink tree stroke_ref missing stroke_id".into())
                    })?;
                let fragment = stroke_ref
                    .fragment
                    .as_ref()
                    .map(fragment_from_proto)
                    .transpose()?;
                let node = InkNode::new_stroke_ref_with_id(id, stroke_id, fragment);
                attach(&mut stack, &mut completed, node);
            }
            None => {
                return Err(CodecError::FormatError(
                    "ink tree node has neither group nor stroke_ref".into(),
                ));
            }
        }
    }

    while let Some(frame) = stack.pop() {
        let finished = InkNode::new_group_with_id(frame.id, frame.children, frame.bbox);
        attach(&mut stack, &mut completed, finished);
    }

    Ok(completed)
}

pub(crate) fn tree_to_proto(tree: &InkTree) -> uim_proto::InkTree {
    let mut nodes = Vec::new();
    if let Some(root) = tree.root() {
        flatten(root, &mut nodes);
    }
    uim_proto::InkTree {
        name: tree.name().map(|n| n.to_owned()),
        nodes,
    }
}

pub(crate) fn main_tree_from_proto(proto: &uim_proto::InkTree) -> Result<InkTree> {
    let mut tree = InkTree::new_main();
    if let Some(root) = unflatten(&proto.nodes)? {
        tree.attach(root)?;
    }
    Ok(tree)
}

pub(crate) fn view_tree_from_proto(proto: &uim_proto::InkTree) -> Result<InkTree> {
    let name = proto
        .name
        .clone()
        .ok_or_else(|| CodecError::FormatError("view tree missing name".into()))?;
    let mut tree = InkTree::new_view(name);
    if let Some(root) = unflatten(&proto.nodes)? {
        tree.attach(root)?;
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uim_identity::RandomId;

    #[test]
    fn single_leaf_round_trips() {
        let mut tree = InkTree::new_main();
        let stroke_id = RandomId::new();
        tree.attach(InkNode::new_stroke_ref(stroke_id, None))
            .unwrap();

        let proto = tree_to_proto(&tree);
        assert_eq!(proto.nodes.len(), 1);
        let restored = main_tree_from_proto(&proto).unwrap();
        assert_eq!(restored.stroke_ids(), vec![stroke_id]);
    }

    #[test]
    fn nested_groups_round_trip_structure_and_ids() {
        let mut tree = InkTree::new_main();
        let a = RandomId::new();
        let b = RandomId::new();
        let root = InkNode::new_group(vec![
            InkNode::new_group(vec![InkNode::new_stroke_ref(a, None)]),
            InkNode::new_stroke_ref(b, None),
        ]);
        let root_id = root.id();
        tree.attach(root).unwrap();

        let proto = tree_to_proto(&tree);
        assert_eq!(proto.nodes.len(), 4);
        let restored = main_tree_from_proto(&proto).unwrap();
        assert_eq!(restored.root().unwrap().id(), root_id);
        assert_eq!(restored.stroke_ids(), vec![a, b]);
        assert_eq!(restored.node_ids().len(), 4);
    }

    #[test]
    fn empty_tree_round_trips_to_detached() {
        let tree = InkTree::new_view("hwr");
        let proto = tree_to_proto(&tree);
        assert!(proto.nodes.is_empty());
        let restored = view_tree_from_proto(&proto).unwrap();
        assert!(!restored.is_registered());
        assert_eq!(restored.name(), Some("hwr"));
    }

    #[test]
    fn fragment_round_trips() {
        let mut tree = InkTree::new_main();
        let stroke_id = RandomId::new();
        let fragment = Fragment {
            from_point_index: 2,
            to_point_index: 9,
            from_t: 0.1,
            to_t: 0.9,
        };
        tree.attach(InkNode::new_stroke_ref(stroke_id, Some(fragment)))
            .unwrap();

        let proto = tree_to_proto(&tree);
        let restored = main_tree_from_proto(&proto).unwrap();
        match restored.root().unwrap() {
            InkNode::StrokeRef {
                fragment: Some(f), ..
            } => assert_eq!(*f, fragment),
            other => panic!("expected stroke ref with fragment, got {other:?}"),
        }
    }

    #[test]
    fn fragment_with_t_outside_unit_interval_is_rejected_on_decode() {
        let bad = uim_proto::Fragment {
            from_point_index: 0,
            to_point_index: 1,
            from_t: 0.0,
            to_t: 1.5,
        };
        assert!(fragment_from_proto(&bad).is_err());
    }

    #[test]
    fn nested_groups_flatten_with_depth_markers() {
        let mut tree = InkTree::new_main();
        let a = RandomId::new();
        let b = RandomId::new();
        let root = InkNode::new_group(vec![
            InkNode::new_group(vec![InkNode::new_stroke_ref(a, None)]),
            InkNode::new_stroke_ref(b, None),
        ]);
        tree.attach(root).unwrap();

        let proto = tree_to_proto(&tree);
        let depths: Vec<u32> = proto.nodes.iter().map(|node| node.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 1]);
    }

    #[test]
    fn a_second_root_level_node_is_rejected_on_decode() {
        let mut tree = InkTree::new_main();
        tree.attach(InkNode::new_stroke_ref(RandomId::new(), None))
            .unwrap();
        let mut proto = tree_to_proto(&tree);
        proto.nodes.push(uim_proto::InkNode {
            id: Some(random_id_to_proto(RandomId::new())),
            depth: 0,
            kind: Some(uim_proto::ink_node::Kind::StrokeRef(uim_proto::StrokeRef {
                stroke_id: Some(random_id_to_proto(RandomId::new())),
                fragment: None,
            })),
        });

        assert!(main_tree_from_proto(&proto).is_err());
    }

    #[test]
    fn a_node_skipping_a_depth_level_is_rejected_on_decode() {
        let bad = uim_proto::InkTree {
            name: None,
            nodes: vec![
                uim_proto::InkNode {
                    id: Some(random_id_to_proto(RandomId::new())),
                    depth: 0,
                    kind: Some(uim_proto::ink_node::Kind::Group(uim_proto::GroupNode {
                        bbox: None,
                    })),
                },
                uim_proto::InkNode {
                    id: Some(random_id_to_proto(RandomId::new())),
                    depth: 2,
                    kind: Some(uim_proto::ink_node::Kind::StrokeRef(uim_proto::StrokeRef {
                        stroke_id: Some(random_id_to_proto(RandomId::new())),
                        fragment: None,
                    })),
                },
            ],
        };

        assert!(main_tree_from_proto(&bad).is_err());
    }

    #[test]
    fn group_bbox_round_trips() {
        let mut tree = InkTree::new_main();
        let stroke_id = RandomId::new();
        let bbox = BoundingBox::from_point(1.0, 2.0).include(3.0, 4.0);
        let root = InkNode::new_group_with_id(
            RandomId::new(),
            vec![InkNode::new_stroke_ref(stroke_id, None)],
            Some(bbox),
        );
        tree.attach(root).unwrap();

        let proto = tree_to_proto(&tree);
        let restored = main_tree_from_proto(&proto).unwrap();
        assert_eq!(restored.root().unwrap().bbox(), Some(bbox));
    }
}
