//! Text/semantics extractor (§6 "External interfaces", external
//! collaborator). Reads a named view tree plus the triple store and
//! reconstructs word and named-entity records by following the `IS`,
//! `HAS_CONTENT`, `HAS_LANGUAGE`, and `PART_OF_NAMED_ENTITY` predicates
//! (§8 worked scenario 3). Read-only: never mutates the model.

use thiserror::Error;
use uim_model::semantic::{self, TripleStore};
use uim_model::tree::{InkNode, InkTree};
use uim_model::InkModel;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("view {0:?} does not exist")]
    UnknownView(String),
    #[error("view {0:?} has no root")]
    DetachedView(String),
    #[error("word node {0} references a stroke that is not in the model")]
    MissingStroke(String),
}

/// Axis-aligned extent of the strokes a word covers, in document units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingBox {
    fn empty() -> Self {
        Self {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        }
    }

    fn include(&mut self, x: f32, y: f32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

/// A named entity a word is `PART_OF_NAMED_ENTITY` of, with whatever
/// well-known properties the triple store carries about it.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    pub uri: String,
    pub unique_id: Option<String>,
    pub article_url: Option<String>,
}

/// One `IS WORD` group node reconstructed from the view tree plus its
/// triples.
#[derive(Clone, Debug, PartialEq)]
pub struct WordRecord {
    pub node_uri: String,
    pub text: Option<String>,
    pub language: Option<String>,
    pub bounding_box: BoundingBox,
    pub entity: Option<EntityRecord>,
}

/// Extracts every word in the named view of `model` (§6 "Text/semantics
/// extractor").
pub fn extract(model: &InkModel, view_name: &str) -> Result<Vec<WordRecord>, ExtractError> {
    let view = model
        .view(view_name)
        .ok_or_else(|| ExtractError::UnknownView(view_name.to_owned()))?;
    let root = view
        .root()
        .ok_or_else(|| ExtractError::DetachedView(view_name.to_owned()))?;

    let mut words = Vec::new();
    collect_words(model, view, view_name, root, &mut words)?;
    Ok(words)
}

fn collect_words(
    model: &InkModel,
    view: &InkTree,
    view_name: &str,
    node: &InkNode,
    out: &mut Vec<WordRecord>,
) -> Result<(), ExtractError> {
    let uri = semantic::uri_tree_node(view_name, node.id());
    if is_word(&model.triples, &uri) {
        out.push(word_record(model, node, &uri)?);
    }
    if let InkNode::StrokeGroup { children, .. } = node {
        for child in children {
            collect_words(model, view, view_name, child, out)?;
        }
    }
    Ok(())
}

fn is_word(triples: &TripleStore, uri: &str) -> bool {
    triples.filter(Some(uri), Some("IS"), Some("WORD")).next().is_some()
}

fn word_record(model: &InkModel, node: &InkNode, uri: &str) -> Result<WordRecord, ExtractError> {
    let text = single_object(&model.triples, uri, "HAS_CONTENT");
    let language = single_object(&model.triples, uri, "HAS_LANGUAGE");
    let entity = single_object(&model.triples, uri, "PART_OF_NAMED_ENTITY")
        .map(|entity_uri| entity_record(&model.triples, entity_uri));

    let mut bounding_box = BoundingBox::empty();
    for stroke_id in node.stroke_ids() {
        let stroke = model
            .strokes
            .get(stroke_id)
            .map_err(|_| ExtractError::MissingStroke(stroke_id.to_h_form()))?;
        for i in 0..stroke.spline.point_count() {
            let point = stroke.spline.point(i).expect("index within point_count");
            bounding_box.include(point[0], point[1]);
        }
    }

    Ok(WordRecord {
        node_uri: uri.to_owned(),
        text,
        language,
        bounding_box,
        entity,
    })
}

fn entity_record(triples: &TripleStore, uri: String) -> EntityRecord {
    EntityRecord {
        unique_id: single_object(triples, &uri, "HAS_UNIQUE_ID"),
        article_url: single_object(triples, &uri, "HAS_ARTICLE_URL"),
        uri,
    }
}

fn single_object(triples: &TripleStore, subject: &str, predicate: &str) -> Option<String> {
    triples
        .filter(Some(subject), Some(predicate), None)
        .next()
        .map(|triple| triple.object.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uim_model::ink::{LayoutMask, PathPointProperties, Spline, Style};
    use uim_model::semantic::Triple;

    fn stroke_over(points: &[(f32, f32)]) -> uim_model::ink::Stroke {
        let values = points.iter().flat_map(|(x, y)| [*x, *y]).collect();
        let spline = Spline {
            layout_mask: LayoutMask::new(LayoutMask::XY).unwrap(),
            values,
        };
        uim_model::ink::Stroke::new(spline, Style::new(PathPointProperties::default(), None))
    }

    #[test]
    fn extracts_a_word_with_its_bounding_box_and_named_entity() {
        let mut model = InkModel::new();
        let stroke_a = model.add_stroke(stroke_over(&[(0.0, 0.0), (1.0, 2.0)]));
        let stroke_b = model.add_stroke(stroke_over(&[(3.0, -1.0), (5.0, 4.0)]));
        model
            .attach_main_tree(InkNode::new_group(vec![
                InkNode::new_stroke_ref(stroke_a, None),
                InkNode::new_stroke_ref(stroke_b, None),
            ]))
            .unwrap();

        let word_root = InkNode::new_group(vec![
            InkNode::new_stroke_ref(stroke_a, None),
            InkNode::new_stroke_ref(stroke_b, None),
        ]);
        let word_uri = semantic::uri_tree_node("hwr", word_root.id());
        model.attach_view("hwr", word_root).unwrap();

        model.add_triple(Triple::new(word_uri.clone(), "IS", "WORD")).unwrap();
        model
            .add_triple(Triple::new(word_uri.clone(), "HAS_CONTENT", "ink"))
            .unwrap();
        model
            .add_triple(Triple::new(word_uri.clone(), "HAS_LANGUAGE", "en_US"))
            .unwrap();
        let ne_uri = "uim:ne/Q127418";
        model
            .add_triple(Triple::new(word_uri.clone(), "PART_OF_NAMED_ENTITY", ne_uri))
            .unwrap();
        model
            .add_triple(Triple::new(ne_uri, "HAS_UNIQUE_ID", "Q127418"))
            .unwrap();
        model
            .add_triple(Triple::new(
                ne_uri,
                "HAS_ARTICLE_URL",
                "https://en.wikipedia.org/wiki/Ink",
            ))
            .unwrap();

        let words = extract(&model, "hwr").unwrap();
        assert_eq!(words.len(), 1);
        let word = &words[0];
        assert_eq!(word.text.as_deref(), Some("ink"));
        assert_eq!(word.language.as_deref(), Some("en_US"));
        assert_eq!(word.bounding_box.min_x, 0.0);
        assert_eq!(word.bounding_box.max_x, 5.0);
        assert_eq!(word.bounding_box.min_y, -1.0);
        assert_eq!(word.bounding_box.max_y, 4.0);

        let entity = word.entity.as_ref().unwrap();
        assert_eq!(entity.unique_id.as_deref(), Some("Q127418"));
        assert_eq!(
            entity.article_url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Ink")
        );
    }

    #[test]
    fn unknown_view_is_reported() {
        let model = InkModel::new();
        assert!(matches!(extract(&model, "missing"), Err(ExtractError::UnknownView(_))));
    }
}
