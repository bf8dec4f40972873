//! Bit equation evaluation.
//!
//! A swizzle equation describes, for every block address bit above the
//! element bits, which coordinate bits XOR together to produce it. Equation
//! evaluation is the primitive behind every address query; everything else
//! is block bookkeeping around it.

/// Upper bound on equation width: a 256 KiB block with 8 bit elements.
pub const MAX_EQUATION_BITS: usize = 18;

/// Coordinate contributions to a single address bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EqBit {
    pub x: u16,
    pub y: u16,
    pub z: u16,
    pub s: u8,
}

impl EqBit {
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.x == 0 && self.y == 0 && self.z == 0 && self.s == 0
    }

    /// Number of distinct coordinate bits feeding this address bit.
    #[inline]
    fn contributor_count(&self) -> u32 {
        self.x.count_ones() + self.y.count_ones() + self.z.count_ones() + self.s.count_ones()
    }
}

/// An ordered list of address bits above the element bits.
///
/// Bit `i` of the evaluated offset corresponds to byte address bit
/// `i + elem_log2`; the offset itself is element granular. Equations are
/// built once per configuration by the pattern cache and shared read only
/// across all queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwizzleEquation {
    bits: [EqBit; MAX_EQUATION_BITS],
    num_bits: u8,
    elem_log2: u8,
}

impl SwizzleEquation {
    pub(crate) fn new(elem_log2: u32) -> Self {
        Self {
            bits: [EqBit::default(); MAX_EQUATION_BITS],
            num_bits: 0,
            elem_log2: elem_log2 as u8,
        }
    }

    pub(crate) fn push(&mut self, bit: EqBit) {
        self.bits[self.num_bits as usize] = bit;
        self.num_bits += 1;
    }

    pub(crate) fn bit_mut(&mut self, i: usize) -> &mut EqBit {
        &mut self.bits[i]
    }

    /// Number of address bits the equation produces.
    #[inline]
    pub fn num_bits(&self) -> u32 {
        u32::from(self.num_bits)
    }

    /// log2 of the element byte size the equation was built for.
    #[inline]
    pub fn elem_log2(&self) -> u32 {
        u32::from(self.elem_log2)
    }

    /// The contributions of address bit `i`.
    #[inline]
    pub fn bit(&self, i: usize) -> &EqBit {
        &self.bits[i]
    }

    /// Evaluates the equation at a coordinate, producing the element
    /// granular offset. Shift left by [Self::elem_log2] for bytes.
    ///
    /// Each output bit XOR reduces the selected bits of x, y, z and the
    /// sample index. Coordinate bits outside every mask are ignored, so
    /// callers may pass full surface coordinates rather than block local
    /// ones.
    pub fn eval(&self, x: u32, y: u32, z: u32, sample: u32) -> u32 {
        let mut offset = 0u32;
        for i in 0..usize::from(self.num_bits) {
            let bit = &self.bits[i];
            let parity = (x & u32::from(bit.x)).count_ones()
                + (y & u32::from(bit.y)).count_ones()
                + (z & u32::from(bit.z)).count_ones()
                + (sample & u32::from(bit.s)).count_ones();
            offset |= (parity & 1) << i;
        }
        offset
    }

    /// Expands the per bit representation into a column oriented one:
    /// for every coordinate bit, the set of address bits it feeds.
    ///
    /// Higher level callers use this for bit provenance, such as locating
    /// the highest order y contribution for stereo and slice XOR
    /// derivation.
    pub fn as_columns(&self) -> EquationColumns {
        let mut columns = EquationColumns::default();
        for i in 0..usize::from(self.num_bits) {
            let bit = &self.bits[i];
            for c in 0..16 {
                if bit.x & (1 << c) != 0 {
                    columns.x[c] |= 1 << i;
                }
                if bit.y & (1 << c) != 0 {
                    columns.y[c] |= 1 << i;
                }
                if bit.z & (1 << c) != 0 {
                    columns.z[c] |= 1 << i;
                }
            }
            for c in 0..8 {
                if bit.s & (1 << c) != 0 {
                    columns.s[c] |= 1 << i;
                }
            }
        }
        columns
    }

    /// The highest equation bit with a y contribution, together with the
    /// highest y coordinate bit feeding it.
    pub fn highest_y_bit(&self) -> Option<(u32, u32)> {
        (0..usize::from(self.num_bits))
            .rev()
            .find(|&i| self.bits[i].y != 0)
            .map(|i| (i as u32, 15 - u32::from(self.bits[i].y.leading_zeros() as u16)))
    }

    /// Data asset consistency check, run from debug builds and the test
    /// suite, never on the query path.
    ///
    /// Non XOR equations must be single assignment: every address bit
    /// sourced from exactly one coordinate bit. XOR equations must cover
    /// the whole in block coordinate space; an uncovered bit would alias
    /// two coordinates to one address.
    pub(crate) fn validate(
        &self,
        width_log2: u32,
        height_log2: u32,
        depth_log2: u32,
        frag_log2: u32,
        xor_capable: bool,
    ) {
        let mut x_cover = 0u16;
        let mut y_cover = 0u16;
        let mut z_cover = 0u16;
        let mut s_cover = 0u8;
        for i in 0..usize::from(self.num_bits) {
            let bit = &self.bits[i];
            assert!(!bit.is_empty(), "empty equation bit {i}");
            if !xor_capable {
                assert_eq!(1, bit.contributor_count(), "multi bit on non XOR mode");
            }
            x_cover |= bit.x;
            y_cover |= bit.y;
            z_cover |= bit.z;
            s_cover |= bit.s;
        }
        assert_eq!((1u16 << width_log2) - 1, x_cover & ((1 << width_log2) - 1));
        assert_eq!(x_cover >> width_log2, 0, "x contribution above the block");
        assert_eq!((1u16 << height_log2) - 1, y_cover);
        assert_eq!((1u16 << depth_log2) - 1, z_cover);
        assert_eq!((1u8 << frag_log2) - 1, s_cover);
    }
}

/// Column oriented equation view. Entry `c` of each array holds, as a bit
/// mask of equation bit indices, the address bits that coordinate bit `c`
/// feeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EquationColumns {
    pub x: [u32; 16],
    pub y: [u32; 16],
    pub z: [u32; 16],
    pub s: [u32; 8],
}
