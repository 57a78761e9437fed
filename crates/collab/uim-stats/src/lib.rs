//! Read-only statistics analyzer (§6 "External interfaces", external
//! collaborator). A single pass over an [`InkModel`] producing a nested
//! [`Statistics`] value; never holds a reference back into the model.

use std::collections::BTreeMap;

use uim_model::tree::{InkNode, InkTree};
use uim_model::InkModel;

/// Node-count breakdown for one tree (the main tree or a named view).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeStatistics {
    pub name: String,
    pub group_count: usize,
    pub stroke_ref_count: usize,
}

impl TreeStatistics {
    pub fn node_count(&self) -> usize {
        self.group_count + self.stroke_ref_count
    }
}

/// Aggregate statistics over an entire document.
#[derive(Clone, Debug, PartialEq)]
pub struct Statistics {
    pub stroke_count: usize,
    pub sensor_frame_count: usize,
    pub vector_brush_count: usize,
    pub raster_brush_count: usize,
    pub trees: Vec<TreeStatistics>,
    /// Sorted by predicate so output is deterministic regardless of
    /// insertion order.
    pub triple_counts_by_predicate: Vec<(String, usize)>,
    pub total_sample_count: usize,
    /// One entry per stroke, in stroke-repository iteration order.
    pub points_per_stroke: Vec<usize>,
}

/// Computes [`Statistics`] for `model` in a single read-only traversal.
pub fn analyze(model: &InkModel) -> Statistics {
    let points_per_stroke: Vec<usize> = model
        .strokes
        .iter()
        .map(|(_, stroke)| stroke.spline.point_count())
        .collect();
    let total_sample_count = points_per_stroke.iter().sum();

    let mut trees = vec![tree_statistics("main", model.main_tree())];
    for view in model.views() {
        trees.push(tree_statistics(view.name().unwrap_or("(unnamed)"), view));
    }

    let mut predicate_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for triple in model.triples.iter() {
        *predicate_counts.entry(triple.predicate.as_str()).or_insert(0) += 1;
    }
    let triple_counts_by_predicate = predicate_counts
        .into_iter()
        .map(|(predicate, count)| (predicate.to_owned(), count))
        .collect();

    Statistics {
        stroke_count: model.strokes.len(),
        sensor_frame_count: model.sensor_data.len(),
        vector_brush_count: model.brushes.vector_brushes().count(),
        raster_brush_count: model.brushes.raster_brushes().count(),
        trees,
        triple_counts_by_predicate,
        total_sample_count,
        points_per_stroke,
    }
}

fn tree_statistics(name: &str, tree: &InkTree) -> TreeStatistics {
    let mut group_count = 0;
    let mut stroke_ref_count = 0;
    if let Some(root) = tree.root() {
        root.walk_pre_order(&mut |node| match node {
            InkNode::StrokeGroup { .. } => group_count += 1,
            InkNode::StrokeRef { .. } => stroke_ref_count += 1,
        });
    }
    TreeStatistics {
        name: name.to_owned(),
        group_count,
        stroke_ref_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uim_model::ink::{LayoutMask, PathPointProperties, Spline, Style};
    use uim_model::semantic::Triple;
    use uim_model::tree::InkNode;

    fn sample_stroke(point_count: usize) -> uim_model::ink::Stroke {
        let spline = Spline {
            layout_mask: LayoutMask::new(LayoutMask::XY).unwrap(),
            values: (0..point_count).flat_map(|i| [i as f32, i as f32]).collect(),
        };
        uim_model::ink::Stroke::new(spline, Style::new(PathPointProperties::default(), None))
    }

    #[test]
    fn counts_strokes_and_samples() {
        let mut model = InkModel::new();
        let a = model.add_stroke(sample_stroke(3));
        let b = model.add_stroke(sample_stroke(5));
        model
            .attach_main_tree(InkNode::new_group(vec![
                InkNode::new_stroke_ref(a, None),
                InkNode::new_stroke_ref(b, None),
            ]))
            .unwrap();

        let stats = analyze(&model);
        assert_eq!(stats.stroke_count, 2);
        assert_eq!(stats.points_per_stroke, vec![3, 5]);
        assert_eq!(stats.total_sample_count, 8);
    }

    #[test]
    fn tree_statistics_count_groups_and_stroke_refs() {
        let mut model = InkModel::new();
        let stroke_id = model.add_stroke(sample_stroke(1));
        let root = InkNode::new_group(vec![InkNode::new_group(vec![InkNode::new_stroke_ref(
            stroke_id, None,
        )])]);
        model.attach_main_tree(root).unwrap();

        let stats = analyze(&model);
        let main = &stats.trees[0];
        assert_eq!(main.name, "main");
        assert_eq!(main.group_count, 2);
        assert_eq!(main.stroke_ref_count, 1);
        assert_eq!(main.node_count(), 3);
    }

    #[test]
    fn triple_counts_are_grouped_by_predicate_and_sorted() {
        let mut model = InkModel::new();
        let stroke_id = model.add_stroke(sample_stroke(1));
        model
            .attach_main_tree(InkNode::new_group(vec![InkNode::new_stroke_ref(stroke_id, None)]))
            .unwrap();
        model
            .add_triple(Triple::new(
                uim_model::semantic::uri_stroke(stroke_id),
                "is-a",
                "stroke",
            ))
            .unwrap();
        model
            .add_triple(Triple::new(
                uim_model::semantic::uri_stroke(stroke_id),
                "is-a",
                "ink",
            ))
            .unwrap();

        let stats = analyze(&model);
        assert_eq!(stats.triple_counts_by_predicate, vec![("is-a".to_owned(), 2)]);
    }
}
