//! Compressed metadata surfaces.
//!
//! Depth and color surfaces carry a companion metadata surface holding
//! per block compression state: a hierarchical depth summary for depth
//! targets and a compression key for color targets. One metadata element
//! covers an 8x8 block of data elements, and metadata elements group into
//! metadata blocks sized so a whole cache line of metadata lands on one
//! pipe. Pipe aligned layouts scale the block up by the pipe and packer
//! count so concurrent clients never share a cache line across pipes.
use crate::block::{BlockGeometry, COMPRESSED_BLOCK_EXTENT, COMPRESSED_BLOCK_EXTENT_LOG2};
use crate::mipinfo::{mip_walk, MipLayout};
use crate::pattern::build_meta_equation;
use crate::{
    AddrContext, AddrCoord, AddrError, ResourceDim, SurfaceDescriptor, SwizzleFamily,
};

/// Which metadata surface accompanies the data surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKind {
    /// Hierarchical depth summary, 4 bytes per 8x8 block, 256 byte cache
    /// lines. Depth swizzle modes only.
    HierDepth,
    /// Color compression key, 1 byte per 8x8 block, 64 byte cache lines.
    ColorKey,
}

impl MetaKind {
    const fn cache_line_log2(self) -> u32 {
        match self {
            MetaKind::HierDepth => 8,
            MetaKind::ColorKey => 6,
        }
    }

    /// log2 of the bytes in one metadata element.
    const fn elem_bytes_log2(self) -> u32 {
        match self {
            MetaKind::HierDepth => 2,
            MetaKind::ColorKey => 0,
        }
    }
}

/// Layout of a metadata surface. Widths and heights are in data elements
/// covered, so callers compare them directly against the data surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaSurfaceInfo {
    /// Covered width of the base mip, aligned to the metadata block.
    pub pitch: u32,
    /// Covered height of the base mip, aligned to the metadata block.
    pub height: u32,
    /// Metadata bytes for one slice.
    pub slice_size: u64,
    /// Metadata bytes for the whole surface.
    pub total_size: u64,
    /// Required base alignment in bytes.
    pub base_align: u64,
    /// One metadata block: data element coverage and metadata byte size.
    pub block: BlockGeometry,
    /// Per mip layout in data element coverage terms.
    pub mips: Vec<MipLayout>,
}

pub(crate) fn meta_surface_info(
    context: &AddrContext,
    desc: &SurfaceDescriptor,
    kind: MetaKind,
    pipe_aligned: bool,
) -> Result<MetaSurfaceInfo, AddrError> {
    desc.validate()?;
    validate_kind(desc, kind)?;

    let block = meta_block(context, desc, kind, pipe_aligned);
    let surf_depth = if desc.dim == ResourceDim::Dim3 {
        desc.depth_or_array_size
    } else {
        1
    };
    // Metadata has no mip tail; every mip rounds up to whole blocks.
    let walk = mip_walk(desc.width, desc.height, surf_depth, desc.mip_count, &block, None);

    let num_slices = if desc.dim == ResourceDim::Dim3 {
        1
    } else {
        u64::from(desc.depth_or_array_size)
    };
    let base_align = if pipe_aligned {
        block.bytes
    } else {
        1 << kind.cache_line_log2()
    };
    Ok(MetaSurfaceInfo {
        pitch: walk.mips[0].pitch,
        height: walk.mips[0].aligned_height,
        slice_size: walk.slice_size,
        total_size: walk.slice_size * num_slices,
        base_align,
        block,
        mips: walk.mips,
    })
}

pub(crate) fn meta_address_from_coord(
    context: &AddrContext,
    desc: &SurfaceDescriptor,
    kind: MetaKind,
    coord: &AddrCoord,
    pipe_aligned: bool,
    pipe_bank_xor: u32,
) -> Result<u64, AddrError> {
    let info = meta_surface_info(context, desc, kind, pipe_aligned)?;
    if coord.mip >= desc.mip_count || coord.slice >= desc.depth_or_array_size {
        return Err(AddrError::InvalidParams("coordinate out of range"));
    }
    if coord.mip > 0 {
        // Mip tail interleaving of metadata is not implemented; sizes are
        // still reported per mip above.
        return Err(AddrError::NotImplemented);
    }
    if coord.x >= desc.width || coord.y >= desc.height {
        return Err(AddrError::InvalidParams("coordinate outside the surface"));
    }

    let block = &info.block;
    let meta_x = coord.x >> COMPRESSED_BLOCK_EXTENT_LOG2;
    let meta_y = coord.y >> COMPRESSED_BLOCK_EXTENT_LOG2;
    let block_x = u64::from(coord.x / block.width);
    let block_y = u64::from(coord.y / block.height);
    let pitch_in_blocks = u64::from(info.pitch / block.width);
    let block_index = block_y * pitch_in_blocks + block_x;

    // Coverage of one block in metadata elements per axis.
    let elems_w_log2 = crate::log2(u64::from(block.width)) - COMPRESSED_BLOCK_EXTENT_LOG2;
    let elems_h_log2 = crate::log2(u64::from(block.height)) - COMPRESSED_BLOCK_EXTENT_LOG2;
    let eq = build_meta_equation(context.config(), elems_w_log2, elems_h_log2, pipe_aligned);
    let mut block_offset = u64::from(eq.eval(meta_x, meta_y, 0, 0)) << kind.elem_bytes_log2();
    if pipe_aligned {
        block_offset ^= (u64::from(pipe_bank_xor) << context.config().pipe_interleave_log2())
            & (block.bytes - 1);
    }

    let slice_term = if desc.dim == ResourceDim::Dim3 {
        0
    } else {
        u64::from(coord.slice) * info.slice_size
    };
    Ok(slice_term + block_index * block.bytes + block_offset)
}

fn validate_kind(desc: &SurfaceDescriptor, kind: MetaKind) -> Result<(), AddrError> {
    // Metadata exists only for the XOR capable macro modes; the memory
    // controller derives its pipe routing from the data layout's XOR bits.
    if !desc.swizzle_mode.is_xor() {
        return Err(AddrError::NotSupported);
    }
    match kind {
        MetaKind::HierDepth => {
            if desc.swizzle_mode.family() != SwizzleFamily::Depth {
                return Err(AddrError::NotSupported);
            }
        }
        MetaKind::ColorKey => {
            if desc.swizzle_mode.family() == SwizzleFamily::Depth {
                return Err(AddrError::NotSupported);
            }
        }
    }
    Ok(())
}

/// Geometry of one metadata block in data element coverage terms.
fn meta_block(
    context: &AddrContext,
    desc: &SurfaceDescriptor,
    kind: MetaKind,
    pipe_aligned: bool,
) -> BlockGeometry {
    let config = context.config();
    // Metadata elements per block: one cache line's worth, scaled by the
    // pipe and packer count when pipe aligned.
    let mut elem_bits = kind.cache_line_log2() - kind.elem_bytes_log2();
    if pipe_aligned {
        // XOR modes are macro tiled, so a block size always exists.
        let data_block_log2 = desc.swizzle_mode.block_size_log2().unwrap_or(12);
        elem_bits += config.pipes_log2() + config.packers_log2();
        // When the pipe routing bits would outrun both the compressed
        // block and the data block, the block grows by the overlap.
        let pipe_span = config.pipes_log2() + u32::from(config.pipes_log2() > 0);
        elem_bits += pipe_span
            .saturating_sub(data_block_log2.max(2 * COMPRESSED_BLOCK_EXTENT_LOG2));
        if desc.bits_per_element == 16 && desc.fragment_count == 8 {
            // Dense fragment metadata halves the per line coverage of the
            // pipe anchored layout.
            elem_bits = elem_bits.saturating_sub(1);
        }
    }
    let width_log2 = (elem_bits + 1) / 2;
    let height_log2 = elem_bits / 2;
    BlockGeometry {
        width: COMPRESSED_BLOCK_EXTENT << width_log2,
        height: COMPRESSED_BLOCK_EXTENT << height_log2,
        depth: 1,
        bytes: 1 << (elem_bits + kind.elem_bytes_log2()),
    }
}
