//! BRSH chunk conversion: [`uim_model::ink`] brush types <-> [`uim_proto`].

use uim_model::ink::{
    BrushPrototype, BrushRepository, FillTexture, RasterBrush, RotationMode, ShapeTextures,
    VectorBrush,
};

use crate::error::{CodecError, Result};

fn rotation_mode_to_proto(mode: RotationMode) -> i32 {
    use uim_proto::RotationMode as P;
    (match mode {
        RotationMode::None => P::RotationNone,
        RotationMode::Trajectory => P::RotationTrajectory,
        RotationMode::Random => P::RotationRandom,
    }) as i32
}

fn rotation_mode_from_proto(tag: i32) -> Result<RotationMode> {
    use uim_proto::RotationMode as P;
    match P::try_from(tag) {
        Ok(P::RotationNone) => Ok(RotationMode::None),
        Ok(P::RotationTrajectory) => Ok(RotationMode::Trajectory),
        Ok(P::RotationRandom) => Ok(RotationMode::Random),
        _ => Err(CodecError::FormatError(format!(
            "unknown rotation mode tag {tag}"
        ))),
    }
}

fn prototype_to_proto(prototype: &BrushPrototype) -> uim_proto::BrushPrototype {
    use uim_proto::brush_prototype::Kind;
    let kind = match prototype {
        BrushPrototype::Inline {
            min_scale,
            points,
            indices,
        } => Kind::Inline(uim_proto::InlinePrototype {
            min_scale: *min_scale,
            points: points.iter().flat_map(|(x, y)| [*x, *y]).collect(),
            indices: indices.clone().unwrap_or_default(),
        }),
        BrushPrototype::Uri { min_scale, uri } => Kind::Uri(uim_proto::UriPrototype {
            min_scale: *min_scale,
            uri: uri.clone(),
        }),
    };
    uim_proto::BrushPrototype { kind: Some(kind) }
}

fn prototype_from_proto(proto: &uim_proto::BrushPrototype) -> Result<BrushPrototype> {
    use uim_proto::brush_prototype::Kind;
    match &proto.kind {
        Some(Kind::Inline(inline)) => {
            if inline.points.len() % 2 != 0 {
                return Err(CodecError::FormatError(
                    "brush prototype point list has an odd number of floats".into(),
                ));
            }
            let points = inline.points.chunks_exact(2).map(|p| (p[0], p[1])).collect();
            let indices = if inline.indices.is_empty() {
                None
            } else {
                Some(inline.indices.clone())
            };
            Ok(BrushPrototype::Inline {
                min_scale: inline.min_scale,
                points,
                indices,
            })
        }
        Some(Kind::Uri(uri)) => Ok(BrushPrototype::Uri {
            min_scale: uri.min_scale,
            uri: uri.uri.clone(),
        }),
        None => Err(CodecError::FormatError(
            "brush prototype has neither inline points nor a uri".into(),
        )),
    }
}

fn shape_textures_to_proto(textures: &ShapeTextures) -> uim_proto::ShapeTextures {
    use uim_proto::shape_textures::Kind;
    let kind = match textures {
        ShapeTextures::Inline(textures) => Kind::Inline(uim_proto::InlineTextures {
            textures: textures.clone(),
        }),
        ShapeTextures::Uris(uris) => Kind::Uris(uim_proto::UriTextures { uris: uris.clone() }),
    };
    uim_proto::ShapeTextures { kind: Some(kind) }
}

fn shape_textures_from_proto(proto: &uim_proto::ShapeTextures) -> Result<ShapeTextures> {
    use uim_proto::shape_textures::Kind;
    match &proto.kind {
        Some(Kind::Inline(inline)) => Ok(ShapeTextures::Inline(inline.textures.clone())),
        Some(Kind::Uris(uris)) => Ok(ShapeTextures::Uris(uris.uris.clone())),
        None => Err(CodecError::FormatError(
            "raster brush shape textures have neither inline bytes nor uris".into(),
        )),
    }
}

fn fill_texture_to_proto(texture: &FillTexture) -> uim_proto::FillTexture {
    use uim_proto::fill_texture::Kind;
    let kind = match texture {
        FillTexture::Inline(bytes) => Kind::Inline(bytes.clone()),
        FillTexture::Uri(uri) => Kind::Uri(uri.clone()),
    };
    uim_proto::FillTexture { kind: Some(kind) }
}

fn fill_texture_from_proto(proto: &uim_proto::FillTexture) -> Result<FillTexture> {
    use uim_proto::fill_texture::Kind;
    match &proto.kind {
        Some(Kind::Inline(bytes)) => Ok(FillTexture::Inline(bytes.clone())),
        Some(Kind::Uri(uri)) => Ok(FillTexture::Uri(uri.clone())),
        None => Err(CodecError::FormatError(
            "raster brush fill texture has neither inline bytes nor a uri".into(),
        )),
    }
}

pub(crate) fn to_proto(repo: &BrushRepository) -> uim_proto::Brushes {
    uim_proto::Brushes {
        vector_brushes: repo
            .vector_brushes()
            .map(|brush| uim_proto::VectorBrush {
                name: brush.name.clone(),
                prototypes: brush.prototypes.iter().map(prototype_to_proto).collect(),
                spacing: brush.spacing,
            })
            .collect(),
        raster_brushes: repo
            .raster_brushes()
            .map(|brush| uim_proto::RasterBrush {
                name: brush.name.clone(),
                spacing: brush.spacing,
                scattering: brush.scattering,
                rotation_mode: rotation_mode_to_proto(brush.rotation_mode),
                shape_textures: brush.shape_textures.as_ref().map(shape_textures_to_proto),
                fill_texture: brush.fill_texture.as_ref().map(fill_texture_to_proto),
            })
            .collect(),
    }
}

pub(crate) fn from_proto(proto: &uim_proto::Brushes) -> Result<BrushRepository> {
    let mut repo = BrushRepository::new();

    for brush in &proto.vector_brushes {
        let prototypes = brush
            .prototypes
            .iter()
            .map(prototype_from_proto)
            .collect::<Result<Vec<_>>>()?;
        repo.add_vector_brush(VectorBrush {
            name: brush.name.clone(),
            prototypes,
            spacing: brush.spacing,
        })?;
    }

    for brush in &proto.raster_brushes {
        let shape_textures = brush
            .shape_textures
            .as_ref()
            .map(shape_textures_from_proto)
            .transpose()?;
        let fill_texture = brush
            .fill_texture
            .as_ref()
            .map(fill_texture_from_proto)
            .transpose()?;
        repo.add_raster_brush(RasterBrush {
            name: brush.name.clone(),
            spacing: brush.spacing,
            scattering: brush.scattering,
            rotation_mode: rotation_mode_from_proto(brush.rotation_mode)?,
            shape_textures,
            fill_texture,
        })?;
    }

    Ok(repo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_vector_brush_round_trips() {
        let mut repo = BrushRepository::new();
        repo.add_vector_brush(VectorBrush {
            name: "pencil".to_owned(),
            prototypes: vec![
                BrushPrototype::Inline {
                    min_scale: 0.5,
                    points: vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)],
                    indices: Some(vec![0, 1, 2]),
                },
                BrushPrototype::Uri {
                    min_scale: 1.0,
                    uri: "will://brush/3.0/prototype/dot".to_owned(),
                },
            ],
            spacing: 0.1,
        })
        .unwrap();

        let proto = to_proto(&repo);
        let restored = from_proto(&proto).unwrap();
        let brush = restored.vector_brushes().next().unwrap();
        assert_eq!(brush.name, "pencil");
        assert_eq!(brush.prototypes.len(), 2);
        assert!(matches!(brush.prototypes[0], BrushPrototype::Inline { .. }));
        assert!(matches!(brush.prototypes[1], BrushPrototype::Uri { .. }));
    }

    #[test]
    fn raster_brush_with_inline_textures_round_trips() {
        let mut repo = BrushRepository::new();
        repo.add_raster_brush(RasterBrush {
            name: "charcoal".to_owned(),
            spacing: 0.2,
            scattering: 0.05,
            rotation_mode: RotationMode::Trajectory,
            shape_textures: Some(ShapeTextures::Inline(vec![vec![1, 2, 3]])),
            fill_texture: Some(FillTexture::Uri("will://brush/3.0/fill/solid".to_owned())),
        })
        .unwrap();

        let proto = to_proto(&repo);
        let restored = from_proto(&proto).unwrap();
        let brush = restored.raster_brushes().next().unwrap();
        assert_eq!(brush.name, "charcoal");
        assert_eq!(brush.rotation_mode, RotationMode::Trajectory);
        assert!(matches!(brush.shape_textures, Some(ShapeTextures::Inline(_))));
        assert!(matches!(brush.fill_texture, Some(FillTexture::Uri(_))));
    }

    #[test]
    fn raster_brush_without_either_texture_is_rejected() {
        let mut repo = BrushRepository::new();
        let err = repo
            .add_raster_brush(RasterBrush {
                name: "empty".to_owned(),
                spacing: 0.0,
                scattering: 0.0,
                rotation_mode: RotationMode::None,
                shape_textures: None,
                fill_texture: None,
            })
            .unwrap_err();
        assert!(matches!(err, uim_model::ModelError::InvalidArgument(_)));
    }
}
