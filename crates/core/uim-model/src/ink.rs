//! Ink data model (§3.4, §4.5, §4.6): splines, strokes, and the two brush
//! families a stroke can reference.

use uim_identity::{HashBuilder, HashId, PrecisionScheme, RandomId};

use crate::error::ModelError;
use crate::input::SensorChannelType;
use crate::repo::OrderedRepo;

/// Per-point spline attributes, packed into a 17-bit mask (§3.4, §4.5
/// "LayoutMask"). Bit order doubles as the strided-array column order:
/// when decoding a flat `Vec<f32>` of values, columns appear in
/// ascending bit order. `X`/`Y` are ordinary mask bits like every other
/// column, not an implicit always-present prefix — a stroke may in
/// principle omit them, though in practice every real document sets
/// both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutMask(u32);

impl LayoutMask {
    pub const X: u32 = 1 << 0;
    pub const Y: u32 = 1 << 1;
    pub const Z: u32 = 1 << 2;
    pub const SIZE: u32 = 1 << 3;
    pub const ROTATION: u32 = 1 << 4;
    pub const RED: u32 = 1 << 5;
    pub const GREEN: u32 = 1 << 6;
    pub const BLUE: u32 = 1 << 7;
    pub const ALPHA: u32 = 1 << 8;
    pub const SCALE_X: u32 = 1 << 9;
    pub const SCALE_Y: u32 = 1 << 10;
    pub const SCALE_Z: u32 = 1 << 11;
    pub const OFFSET_X: u32 = 1 << 12;
    pub const OFFSET_Y: u32 = 1 << 13;
    pub const OFFSET_Z: u32 = 1 << 14;
    pub const TANGENT_X: u32 = 1 << 15;
    pub const TANGENT_Y: u32 = 1 << 16;

    /// Convenience combination for the common bare-position stroke.
    pub const XY: u32 = Self::X | Self::Y;

    const ALL_BITS: u32 = (1 << 17) - 1;

    pub const EMPTY: Self = Self(0);

    pub fn new(bits: u32) -> Result<Self, ModelError> {
        if bits & !Self::ALL_BITS != 0 {
            return Err(ModelError::InvalidArgument(format!(
                "layout mask {bits:#x} uses bits outside the 17-bit range"
            )));
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn with(self, bit: u32) -> Self {
        Self(self.0 | bit)
    }

    pub fn contains(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    /// Number of columns set, including X/Y.
    pub fn stride(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Column order matching the bit layout, lowest bit first.
    pub fn columns(self) -> Vec<u32> {
        (0..17)
            .map(|bit| 1u32 << bit)
            .filter(|bit| self.contains(*bit))
            .collect()
    }
}

// ---------------------------------------------------------------------

/// Per-point visual properties addressed by content (§4.5): two strokes
/// sharing identical values share one `PathPointProperties`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathPointProperties {
    pub size: f32,
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub scale_z: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub offset_z: f32,
}

impl PathPointProperties {
    pub fn id(&self) -> HashId {
        HashBuilder::new("PathPointProperties")
            .push_float(self.size as f64)
            .push_float(self.red as f64)
            .push_float(self.green as f64)
            .push_float(self.blue as f64)
            .push_float(self.alpha as f64)
            .push_float(self.rotation as f64)
            .push_float(self.scale_x as f64)
            .push_float(self.scale_y as f64)
            .push_float(self.scale_z as f64)
            .push_float(self.offset_x as f64)
            .push_float(self.offset_y as f64)
            .push_float(self.offset_z as f64)
            .finish()
    }
}

/// A stroke's rendering style: the default per-point properties plus the
/// brush used to render it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style {
    pub properties: PathPointProperties,
    pub brush_uri: Option<String>,
    /// Seed for the brush's particle generator, if it has one (§3.4
    /// "particles-random-seed").
    pub particles_random_seed: Option<u32>,
    /// URI naming the rasterization pipeline to render this stroke with
    /// (§3.4 "render-mode-uri"). Defaults to
    /// [`Self::DEFAULT_RENDER_MODE_URI`] when not overridden.
    pub render_mode_uri: String,
}

impl Style {
    /// §3.4's documented default for `render-mode-uri`.
    pub const DEFAULT_RENDER_MODE_URI: &'static str =
        "will://rasterization/3.0/blend-mode/SourceOver";

    pub fn new(properties: PathPointProperties, brush_uri: Option<String>) -> Self {
        Self {
            properties,
            brush_uri,
            particles_random_seed: None,
            render_mode_uri: Self::DEFAULT_RENDER_MODE_URI.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------

/// A Catmull-Rom spline: whatever columns [`LayoutMask`] selects, stored
/// as one flat, strided value array.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spline {
    pub layout_mask: LayoutMask,
    /// Flattened rows of `layout_mask.stride()` values each, in ascending
    /// bit order.
    pub values: Vec<f32>,
}

impl Spline {
    pub fn point_count(&self) -> usize {
        let row_len = self.layout_mask.stride();
        if row_len == 0 {
            return 0;
        }
        self.values.len() / row_len
    }

    /// Validates that `values.len()` is an exact multiple of the row
    /// stride implied by `layout_mask` (§4.5 "ill-formed spline").
    pub fn validate(&self) -> Result<(), ModelError> {
        let row_len = self.layout_mask.stride();
        if row_len > 0 && self.values.len() % row_len != 0 {
            return Err(ModelError::InvalidArgument(format!(
                "spline has {} values, not a multiple of row stride {row_len}",
                self.values.len()
            )));
        }
        Ok(())
    }

    /// The value of every column present for point `index`, in ascending
    /// bit order.
    pub fn point(&self, index: usize) -> Option<&[f32]> {
        let row_len = self.layout_mask.stride();
        let start = index.checked_mul(row_len)?;
        self.values.get(start..start + row_len)
    }

    /// The X/Y position of point `index`, if the mask carries both
    /// columns (§4.8 "stroke bboxes come from min/max of the X/Y spline
    /// channels").
    pub fn xy(&self, index: usize) -> Option<(f32, f32)> {
        let point = self.point(index)?;
        let columns = self.layout_mask.columns();
        let x = columns.iter().position(|&bit| bit == LayoutMask::X)?;
        let y = columns.iter().position(|&bit| bit == LayoutMask::Y)?;
        Some((point[x], point[y]))
    }
}

/// Explicit routing from a sensor attribute kind to the channel that
/// supplies it, for a stroke's strided-array export (§4.5 "sensor
/// attributes ... come from the referenced sensor frame via the
/// stroke's `sensor_data_mapping` if set or 1:1 by index otherwise").
/// Absent, export falls back to resolving each requested sensor
/// attribute against whichever channel of the stroke's own sensor frame
/// declares that `SensorChannelType`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorDataMapping {
    entries: Vec<(SensorChannelType, HashId)>,
}

impl SensorDataMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `kind` to `channel_id`, overwriting any previous routing
    /// for the same kind.
    pub fn set(&mut self, kind: SensorChannelType, channel_id: HashId) {
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = channel_id,
            None => self.entries.push((kind, channel_id)),
        }
    }

    pub fn get(&self, kind: &SensorChannelType) -> Option<HashId> {
        self.entries.iter().find(|(k, _)| k == kind).map(|(_, id)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SensorChannelType, HashId)> {
        self.entries.iter().map(|(kind, id)| (kind, *id))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------

/// A single recorded ink stroke: a random identity over an immutable
/// spline (§3.4).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stroke {
    id: RandomId,
    pub sensor_data_id: Option<RandomId>,
    pub sensor_data_offset: u32,
    pub sensor_data_mapping: Option<SensorDataMapping>,
    pub precision: Option<PrecisionScheme>,
    pub spline: Spline,
    pub style: Style,
    pub random_seed: Option<u32>,
}

impl Stroke {
    pub fn new(spline: Spline, style: Style) -> Self {
        Self {
            id: RandomId::new(),
            sensor_data_id: None,
            sensor_data_offset: 0,
            sensor_data_mapping: None,
            precision: None,
            spline,
            style,
            random_seed: None,
        }
    }

    pub fn id(&self) -> RandomId {
        self.id
    }

    /// Rebuilds a stroke under a specific id, for the codec layer
    /// restoring the identity a document was written with.
    pub fn with_id(id: RandomId, mut stroke: Self) -> Self {
        stroke.id = id;
        stroke
    }

    /// Fixed-point encoding of a position value under this stroke's
    /// precision scheme, or the identity scale if none was set.
    pub fn quantize_position(&self, value: f64) -> i64 {
        self.quantize(self.precision.map_or(0, PrecisionScheme::position), value)
    }

    pub fn quantize_size(&self, value: f64) -> i64 {
        self.quantize(self.precision.map_or(0, PrecisionScheme::size), value)
    }

    pub fn quantize_rotation(&self, value: f64) -> i64 {
        self.quantize(self.precision.map_or(0, PrecisionScheme::rotation), value)
    }

    pub fn quantize_scale(&self, value: f64) -> i64 {
        self.quantize(self.precision.map_or(0, PrecisionScheme::scale), value)
    }

    pub fn quantize_offset(&self, value: f64) -> i64 {
        self.quantize(self.precision.map_or(0, PrecisionScheme::offset), value)
    }

    fn quantize(&self, digits: u8, value: f64) -> i64 {
        (value * PrecisionScheme::scale_factor_for(digits)).round() as i64
    }
}

// ---------------------------------------------------------------------

/// A vector brush: a named, ordered list of shape prototypes plus a
/// spacing factor (§3.4 "VectorBrush"). The inline-vs-URI polymorphism
/// lives on each [`BrushPrototype`], not on the brush as a whole.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VectorBrush {
    pub name: String,
    pub prototypes: Vec<BrushPrototype>,
    pub spacing: f32,
}

impl VectorBrush {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One shape a [`VectorBrush`] can stamp along a stroke: either an
/// inline polygon or a reference to one defined elsewhere, each carrying
/// its own minimum scale (§3.4 "either an inline polygon ... or a URI
/// with min-scale").
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BrushPrototype {
    Inline {
        min_scale: f32,
        points: Vec<(f32, f32)>,
        indices: Option<Vec<u32>>,
    },
    Uri {
        min_scale: f32,
        uri: String,
    },
}

impl BrushPrototype {
    pub fn min_scale(&self) -> f32 {
        match self {
            Self::Inline { min_scale, .. } | Self::Uri { min_scale, .. } => *min_scale,
        }
    }
}

/// Either inline texture bytes or a list of URIs for a raster brush's
/// shape textures — exclusive per §4.6 "mutual exclusion".
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShapeTextures {
    Inline(Vec<Vec<u8>>),
    Uris(Vec<String>),
}

/// Either inline texture bytes or a URI for a raster brush's fill
/// texture — exclusive per §4.6 "mutual exclusion".
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillTexture {
    Inline(Vec<u8>),
    Uri(String),
}

/// A raster brush: per-field inline/URI exclusivity for its shape and
/// fill textures (§3.4 "RasterBrush"), not a whole-brush reference.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RasterBrush {
    pub name: String,
    pub spacing: f32,
    pub scattering: f32,
    pub rotation_mode: RotationMode,
    pub shape_textures: Option<ShapeTextures>,
    pub fill_texture: Option<FillTexture>,
}

impl RasterBrush {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RotationMode {
    None,
    Trajectory,
    Random,
}

// ---------------------------------------------------------------------

/// Owns every brush the model defines, vector and raster alike, keyed by
/// name (§4.6 "ids collide only when names collide": brush names are
/// unique across both families, not just within one).
#[derive(Debug, Default)]
pub struct BrushRepository {
    vector: Vec<VectorBrush>,
    raster: Vec<RasterBrush>,
}

impl BrushRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn name_taken(&self, name: &str) -> bool {
        self.vector.iter().any(|b| b.name() == name) || self.raster.iter().any(|b| b.name() == name)
    }

    pub fn add_vector_brush(&mut self, brush: VectorBrush) -> Result<(), ModelError> {
        if self.name_taken(brush.name()) {
            return Err(ModelError::InvalidArgument(format!(
                "brush named {:?} already exists",
                brush.name()
            )));
        }
        self.vector.push(brush);
        Ok(())
    }

    pub fn add_raster_brush(&mut self, brush: RasterBrush) -> Result<(), ModelError> {
        if brush.shape_textures.is_none() && brush.fill_texture.is_none() {
            return Err(ModelError::InvalidArgument(
                "raster brush needs a shape texture, a fill texture, or both".into(),
            ));
        }
        if self.name_taken(brush.name()) {
            return Err(ModelError::InvalidArgument(format!(
                "brush named {:?} already exists",
                brush.name()
            )));
        }
        self.raster.push(brush);
        Ok(())
    }

    pub fn vector_brush(&self, name: &str) -> Option<&VectorBrush> {
        self.vector.iter().find(|b| b.name() == name)
    }

    pub fn raster_brush(&self, name: &str) -> Option<&RasterBrush> {
        self.raster.iter().find(|b| b.name() == name)
    }

    /// Removes the named vector brush. A no-op, not an error, if no such
    /// brush exists (§9 Open Question: "remove is a no-op on unknown
    /// name").
    pub fn remove_vector_brush(&mut self, name: &str) {
        self.vector.retain(|b| b.name() != name);
    }

    /// Removes the named raster brush; see [`Self::remove_vector_brush`].
    pub fn remove_raster_brush(&mut self, name: &str) {
        self.raster.retain(|b| b.name() != name);
    }

    pub fn vector_brushes(&self) -> impl Iterator<Item = &VectorBrush> {
        self.vector.iter()
    }

    pub fn raster_brushes(&self) -> impl Iterator<Item = &RasterBrush> {
        self.raster.iter()
    }
}

/// Keyed store of `PathPointProperties`, shared across strokes by content
/// (§4.5).
#[derive(Debug, Default)]
pub struct PathPointPropertiesRepository {
    items: OrderedRepo<u128, PathPointProperties>,
}

impl PathPointPropertiesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, properties: PathPointProperties) -> HashId {
        let id = properties.id();
        self.items.insert(id.id().value(), properties);
        id
    }

    pub fn get(&self, id: HashId) -> Result<&PathPointProperties, ModelError> {
        self.items.get(id.id().value()).ok_or_else(|| ModelError::NotFound {
            what: "PathPointProperties",
            id: id.to_h_form(),
        })
    }

    /// Every entry in insertion order, the order the wire palette is
    /// written in (§4.5 "indexed style palette").
    pub fn iter(&self) -> impl Iterator<Item = (HashId, &PathPointProperties)> {
        self.items
            .iter()
            .map(|(value, properties)| (HashId::from_u128(value), properties))
    }

    /// The palette position `id` would be written at, for codecs that
    /// reference entries by index rather than by id.
    pub fn index_of(&self, id: HashId) -> Option<usize> {
        self.iter().position(|(entry_id, _)| entry_id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_mask_stride_counts_set_bits() {
        let mask = LayoutMask::new(LayoutMask::XY | LayoutMask::SIZE | LayoutMask::RED).unwrap();
        assert_eq!(mask.stride(), 4);
        assert_eq!(
            mask.columns(),
            vec![LayoutMask::X, LayoutMask::Y, LayoutMask::SIZE, LayoutMask::RED]
        );
    }

    #[test]
    fn layout_mask_rejects_bits_outside_17() {
        assert!(LayoutMask::new(1 << 17).is_err());
    }

    #[test]
    fn spline_point_count_matches_row_stride() {
        let mask = LayoutMask::new(LayoutMask::XY | LayoutMask::SIZE).unwrap();
        let spline = Spline {
            layout_mask: mask,
            values: vec![0.0, 0.0, 1.0, 1.0, 1.0, 2.0],
        };
        spline.validate().unwrap();
        assert_eq!(spline.point_count(), 2);
        assert_eq!(spline.point(1), Some(&[1.0, 1.0, 2.0][..]));
        assert_eq!(spline.xy(1), Some((1.0, 1.0)));
    }

    #[test]
    fn spline_with_bad_stride_fails_validation() {
        let mask = LayoutMask::new(LayoutMask::XY | LayoutMask::SIZE).unwrap();
        let spline = Spline {
            layout_mask: mask,
            values: vec![0.0, 0.0, 1.0],
        };
        assert!(spline.validate().is_err());
    }

    #[test]
    fn identical_path_point_properties_share_an_id() {
        let a = PathPointProperties {
            size: 1.0,
            ..Default::default()
        };
        let b = PathPointProperties {
            size: 1.0,
            ..Default::default()
        };
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn brush_names_must_be_unique_within_a_family() {
        let mut repo = BrushRepository::new();
        repo.add_vector_brush(VectorBrush {
            name: "pencil".into(),
            prototypes: vec![BrushPrototype::Uri {
                min_scale: 1.0,
                uri: "will://brush/3.0/Pencil".into(),
            }],
            spacing: 0.1,
        })
        .unwrap();
        let err = repo
            .add_vector_brush(VectorBrush {
                name: "pencil".into(),
                prototypes: vec![BrushPrototype::Uri {
                    min_scale: 1.0,
                    uri: "will://brush/3.0/OtherPencil".into(),
                }],
                spacing: 0.1,
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidArgument(_)));
    }

    #[test]
    fn brush_names_must_be_unique_across_families() {
        // §4.6: "ids collide only when names collide" binds across both
        // brush families, not just within one — a vector brush and a
        // raster brush sharing a name would otherwise hash to the same
        // brush-uri identity.
        let mut repo = BrushRepository::new();
        repo.add_vector_brush(VectorBrush {
            name: "wash".into(),
            prototypes: vec![BrushPrototype::Uri {
                min_scale: 1.0,
                uri: "will://brush/3.0/VectorWash".into(),
            }],
            spacing: 0.1,
        })
        .unwrap();
        let err = repo
            .add_raster_brush(RasterBrush {
                name: "wash".into(),
                spacing: 1.0,
                scattering: 0.0,
                rotation_mode: RotationMode::None,
                shape_textures: None,
                fill_texture: Some(FillTexture::Uri("will://texture/3.0/Wash".into())),
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidArgument(_)));
    }

    #[test]
    fn inline_vector_brush_prototype_carries_its_own_min_scale_and_points() {
        let prototype = BrushPrototype::Inline {
            min_scale: 0.5,
            points: vec![(0.0, 0.0), (1.0, 0.0), (0.5, 1.0)],
            indices: Some(vec![0, 1, 2]),
        };
        assert_eq!(prototype.min_scale(), 0.5);
    }

    #[test]
    fn raster_brush_needs_a_texture() {
        let mut repo = BrushRepository::new();
        let err = repo
            .add_raster_brush(RasterBrush {
                name: "empty".into(),
                spacing: 1.0,
                scattering: 0.0,
                rotation_mode: RotationMode::None,
                shape_textures: None,
                fill_texture: None,
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidArgument(_)));
    }

    #[test]
    fn raster_brush_with_only_a_fill_texture_is_accepted() {
        let mut repo = BrushRepository::new();
        repo.add_raster_brush(RasterBrush {
            name: "wash".into(),
            spacing: 1.0,
            scattering: 0.0,
            rotation_mode: RotationMode::None,
            shape_textures: None,
            fill_texture: Some(FillTexture::Uri("will://texture/3.0/Wash".into())),
        })
        .unwrap();
    }

    #[test]
    fn removing_an_unknown_brush_is_a_silent_no_op() {
        let mut repo = BrushRepository::new();
        repo.remove_vector_brush("nonexistent");
        repo.remove_raster_brush("nonexistent");
    }

    #[test]
    fn sensor_data_mapping_routes_attribute_kinds_to_channels() {
        let mut mapping = SensorDataMapping::new();
        assert!(mapping.is_empty());
        let pressure_channel = HashBuilder::new("SensorChannel").push_str("pressure").finish();
        mapping.set(SensorChannelType::Pressure, pressure_channel);
        assert_eq!(mapping.get(&SensorChannelType::Pressure), Some(pressure_channel));
        assert_eq!(mapping.get(&SensorChannelType::Altitude), None);

        let other_pressure_channel = HashBuilder::new("SensorChannel").push_str("pressure-2").finish();
        mapping.set(SensorChannelType::Pressure, other_pressure_channel);
        assert_eq!(mapping.get(&SensorChannelType::Pressure), Some(other_pressure_channel));
        assert_eq!(mapping.iter().count(), 1);
    }

    #[test]
    fn path_point_properties_repository_exposes_a_stable_palette_index() {
        let mut repo = PathPointPropertiesRepository::new();
        let a = PathPointProperties {
            size: 1.0,
            ..Default::default()
        };
        let b = PathPointProperties {
            size: 2.0,
            ..Default::default()
        };
        let a_id = repo.add(a);
        let b_id = repo.add(b);
        assert_eq!(repo.index_of(a_id), Some(0));
        assert_eq!(repo.index_of(b_id), Some(1));
        assert_eq!(repo.len(), 2);

        // Re-adding content already in the palette is idempotent on id and
        // keeps its original index.
        let a_again_id = repo.add(a);
        assert_eq!(a_again_id, a_id);
        assert_eq!(repo.index_of(a_id), Some(0));
        assert_eq!(repo.len(), 2);
    }
}
