/// A 4x4 affine transform matrix, stored row-major.
///
/// This is the ink model's global transform (§3.7): applied to local
/// spline coordinates before `unit_scale_factor` converts them into
/// device-independent pixels. Defaults to the identity matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix4(pub [[f32; 4]; 4]);

impl Matrix4 {
    pub const IDENTITY: Self = Self([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Row-major flattened form, as used on the wire (16 floats).
    pub fn to_row_major(&self) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for (row, values) in self.0.iter().enumerate() {
            out[row * 4..row * 4 + 4].copy_from_slice(values);
        }
        out
    }

    pub fn from_row_major(values: &[f32; 16]) -> Self {
        let mut m = [[0.0f32; 4]; 4];
        for (row, slot) in m.iter_mut().enumerate() {
            slot.copy_from_slice(&values[row * 4..row * 4 + 4]);
        }
        Self(m)
    }

    /// Standard row-vector-on-the-right matrix multiplication: `self * rhs`.
    pub fn multiply(&self, rhs: &Self) -> Self {
        let mut out = [[0.0f32; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.0[i][k] * rhs.0[k][j];
                }
                out[i][j] = sum;
            }
        }
        Self(out)
    }

    /// Applies the transform to a 3D point, treating it as homogeneous
    /// `[x, y, z, 1]` and dividing out `w` if it isn't 1.
    pub fn transform_point(&self, point: [f32; 3]) -> [f32; 3] {
        let [x, y, z] = point;
        let m = &self.0;
        let tx = m[0][0] * x + m[0][1] * y + m[0][2] * z + m[0][3];
        let ty = m[1][0] * x + m[1][1] * y + m[1][2] * z + m[1][3];
        let tz = m[2][0] * x + m[2][1] * y + m[2][2] * z + m[2][3];
        let tw = m[3][0] * x + m[3][1] * y + m[3][2] * z + m[3][3];
        if (tw - 1.0).abs() < f32::EPSILON || tw == 0.0 {
            [tx, ty, tz]
        } else {
            [tx / tw, ty / tw, tz / tw]
        }
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
