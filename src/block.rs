//! Block geometry derivation.
//!
//! A block is the smallest self contained tiling unit of a swizzle mode.
//! Its extent in elements depends only on the mode, the element size, and
//! the fragment count, never on the surface dimensions. Geometry is pure
//! derived data and is recomputed on demand rather than cached.
use crate::{SwizzleFamily, SwizzleMode};

/// Extent and byte size of one tiling block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    /// Width in elements.
    pub width: u32,
    /// Height in elements.
    pub height: u32,
    /// Depth in elements. 1 for thin blocks.
    pub depth: u32,
    /// Total byte size, always a power of two.
    pub bytes: u64,
}

impl BlockGeometry {
    #[inline]
    pub(crate) fn width_log2(&self) -> u32 {
        crate::log2(u64::from(self.width))
    }

    #[inline]
    pub(crate) fn height_log2(&self) -> u32 {
        crate::log2(u64::from(self.height))
    }

    #[inline]
    pub(crate) fn depth_log2(&self) -> u32 {
        crate::log2(u64::from(self.depth))
    }
}

/// Side length in elements of one compressed data block, the granularity
/// tracked by metadata surfaces.
pub(crate) const COMPRESSED_BLOCK_EXTENT: u32 = 8;
pub(crate) const COMPRESSED_BLOCK_EXTENT_LOG2: u32 = 3;

/// Computes the block extent for `mode`. Returns [None] for linear
/// surfaces, which tile nothing.
///
/// The bit budget of a block is `block_size_log2 - elem_log2`; depth and
/// render optimized modes spend `frag_log2` of it on sample interleaving.
/// Thin blocks split the remainder between x and y, width first. Thick
/// blocks split into thirds, width first then height.
pub(crate) fn block_geometry(
    mode: SwizzleMode,
    elem_log2: u32,
    frag_log2: u32,
    thick: bool,
) -> Option<BlockGeometry> {
    let block_size_log2 = mode.block_size_log2()?;
    let sample_bits = match mode.family() {
        SwizzleFamily::Depth | SwizzleFamily::Render => frag_log2,
        SwizzleFamily::Standard | SwizzleFamily::Display => 0,
    };
    let coord_bits = block_size_log2 - elem_log2 - sample_bits;

    let (width_log2, height_log2, depth_log2) = if thick {
        let base = coord_bits / 3;
        let rem = coord_bits % 3;
        (
            base + u32::from(rem >= 1),
            base + u32::from(rem == 2),
            base,
        )
    } else {
        ((coord_bits + 1) / 2, coord_bits / 2, 0)
    };

    Some(BlockGeometry {
        width: 1 << width_log2,
        height: 1 << height_log2,
        depth: 1 << depth_log2,
        bytes: 1 << block_size_log2,
    })
}
