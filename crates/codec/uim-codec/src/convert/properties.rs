//! PRPS chunk conversion: document properties, unit scale, and transform
//! <-> [`uim_proto`].

use uim_units::Matrix4;

use crate::error::{CodecError, Result};

pub(crate) struct Properties {
    pub entries: Vec<(String, String)>,
    pub unit_scale_factor: f64,
    pub transform: Matrix4,
}

pub(crate) fn to_proto(properties: &Properties) -> uim_proto::Properties {
    uim_proto::Properties {
        entries: properties
            .entries
            .iter()
            .map(|(key, value)| uim_proto::Property {
                key: key.clone(),
                value: value.clone(),
            })
            .collect(),
        unit_scale_factor: properties.unit_scale_factor,
        transform: Some(uim_proto::Matrix4 {
            values: properties.transform.to_row_major().to_vec(),
        }),
    }
}

pub(crate) fn from_proto(proto: &uim_proto::Properties) -> Result<Properties> {
    let entries = proto
        .entries
        .iter()
        .map(|p| (p.key.clone(), p.value.clone()))
        .collect();
    let transform = match &proto.transform {
        Some(matrix) => {
            let values: [f32; 16] = matrix.values.as_slice().try_into().map_err(|_| {
                CodecError::FormatError(format!(
                    "transform matrix has {} values, expected 16",
                    matrix.values.len()
                ))
            })?;
            Matrix4::from_row_major(&values)
        }
        None => Matrix4::identity(),
    };
    Ok(Properties {
        entries,
        unit_scale_factor: proto.unit_scale_factor,
        transform,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_entries_and_identity_transform() {
        let properties = Properties {
            entries: vec![("author".to_owned(), "jane".to_owned())],
            unit_scale_factor: 2.5,
            transform: Matrix4::identity(),
        };
        let proto = to_proto(&properties);
        let restored = from_proto(&proto).unwrap();
        assert_eq!(restored.entries, properties.entries);
        assert_eq!(restored.unit_scale_factor, 2.5);
        assert!(restored.transform.is_identity());
    }

    #[test]
    fn missing_transform_defaults_to_identity() {
        let proto = uim_proto::Properties {
            entries: vec![],
            unit_scale_factor: 1.0,
            transform: None,
        };
        let restored = from_proto(&proto).unwrap();
        assert!(restored.transform.is_identity());
    }
}
