/// Bit-shift of each 6-bit precision subfield within the packed 32-bit word
/// (§4.2).
const SHIFT_POSITION: u32 = 0;
const SHIFT_SIZE: u32 = 6;
const SHIFT_ROTATION: u32 = 12;
const SHIFT_SCALE: u32 = 18;
const SHIFT_OFFSET: u32 = 24;
const SUBFIELD_MASK: u32 = 0x3F;

/// Five per-channel-family decimal-precision counts packed into one 32-bit
/// word: position, size, rotation, scale, offset, each 6 bits wide.
///
/// Governs the power-of-10 scale applied when a stroke's spline encodes its
/// floats as fixed-point varints on the wire. Absent (all-zero) means "no
/// scaling, round-trip as floats".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PrecisionScheme(u32);

impl PrecisionScheme {
    pub fn new(position: u8, size: u8, rotation: u8, scale: u8, offset: u8) -> Self {
        let mut bits = 0u32;
        bits |= (position as u32 & SUBFIELD_MASK) << SHIFT_POSITION;
        bits |= (size as u32 & SUBFIELD_MASK) << SHIFT_SIZE;
        bits |= (rotation as u32 & SUBFIELD_MASK) << SHIFT_ROTATION;
        bits |= (scale as u32 & SUBFIELD_MASK) << SHIFT_SCALE;
        bits |= (offset as u32 & SUBFIELD_MASK) << SHIFT_OFFSET;
        Self(bits)
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// `true` when every subfield is zero — the encoder writes no scheme
    /// at all in this case (§4.2).
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    fn subfield(self, shift: u32) -> u8 {
        ((self.0 >> shift) & SUBFIELD_MASK) as u8
    }

    pub fn position(self) -> u8 {
        self.subfield(SHIFT_POSITION)
    }

    pub fn size(self) -> u8 {
        self.subfield(SHIFT_SIZE)
    }

    pub fn rotation(self) -> u8 {
        self.subfield(SHIFT_ROTATION)
    }

    pub fn scale(self) -> u8 {
        self.subfield(SHIFT_SCALE)
    }

    pub fn offset(self) -> u8 {
        self.subfield(SHIFT_OFFSET)
    }

    /// `10^precision`, the factor a value in this family is multiplied by
    /// before rounding to an integer for varint encoding.
    pub fn scale_factor_for(precision: u8) -> f64 {
        10f64.powi(precision as i32)
    }
}
