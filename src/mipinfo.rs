//! Aligned surface layout: pitch, slice size, mip chain and mip tail.
use std::cmp::max;

use crate::block::{block_geometry, BlockGeometry};
use crate::{pow2_align, AddrContext, AddrError, BlockClass, ResourceDim, SurfaceDescriptor, UsageFlags};

/// Linear surfaces align their pitch to this many elements so every row
/// starts on a fetchable boundary regardless of element size.
const LINEAR_PITCH_ALIGN: u32 = 256;
const LINEAR_BASE_ALIGN: u64 = 256;

/// Layout of a single mip level within its slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipLayout {
    /// Logical width in elements.
    pub width: u32,
    /// Logical height in elements.
    pub height: u32,
    /// Logical depth in elements.
    pub depth: u32,
    /// Block aligned pitch in elements.
    pub pitch: u32,
    /// Block aligned height in elements.
    pub aligned_height: u32,
    /// Block aligned depth in elements.
    pub aligned_depth: u32,
    /// Byte offset within the slice. Mips sharing the tail block share
    /// this offset.
    pub offset: u64,
    /// Whether this mip lives in the shared tail block.
    pub in_tail: bool,
    /// Sub block x offset in elements for tail mips.
    pub tail_x: u32,
    /// Sub block y offset in elements for tail mips.
    pub tail_y: u32,
}

/// Computed layout of a whole surface, cached by the caller across
/// coordinate queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceInfo {
    /// Aligned pitch of the base mip in elements.
    pub pitch: u32,
    /// Aligned height of the base mip in elements. Stereo surfaces report
    /// both eyes stacked.
    pub height: u32,
    /// Aligned depth for volumes, array size otherwise.
    pub depth: u32,
    /// Byte size of one slice: one array layer, or the whole volume for
    /// 3D resources.
    pub slice_size: u64,
    /// Byte size of the whole surface.
    pub total_size: u64,
    /// Required base address alignment in bytes, a power of two.
    pub base_align: u64,
    /// The tiling block, or the linear row chunk for linear surfaces.
    pub block: BlockGeometry,
    /// Per mip layout, `mip_count` entries.
    pub mips: Vec<MipLayout>,
    /// First mip stored in the shared tail block, `mip_count` if none.
    pub first_mip_in_tail: u32,
    /// Whether the whole chain, base mip included, lives in the tail.
    pub mip_chain_in_tail: bool,
    /// Address salt for the right eye of a stereo surface.
    pub stereo_right_xor: u64,
}

pub(crate) fn surface_info(
    context: &AddrContext,
    desc: &SurfaceDescriptor,
) -> Result<SurfaceInfo, AddrError> {
    desc.validate()?;
    match desc.swizzle_mode.class() {
        BlockClass::Linear => linear_info(desc),
        _ => tiled_info(context, desc),
    }
}

fn linear_info(desc: &SurfaceDescriptor) -> Result<SurfaceInfo, AddrError> {
    let bytes_per_elem = u64::from(desc.bits_per_element / 8);
    let mut mips = Vec::with_capacity(desc.mip_count as usize);
    let mut offset = 0u64;
    for m in 0..desc.mip_count {
        let width = max(desc.width >> m, 1);
        let height = max(desc.height >> m, 1);
        let pitch = pow2_align(u64::from(width), u64::from(LINEAR_PITCH_ALIGN)) as u32;
        mips.push(MipLayout {
            width,
            height,
            depth: 1,
            pitch,
            aligned_height: height,
            aligned_depth: 1,
            offset,
            in_tail: false,
            tail_x: 0,
            tail_y: 0,
        });
        offset += u64::from(pitch) * u64::from(height) * bytes_per_elem;
    }
    let slice_size = offset;
    Ok(SurfaceInfo {
        pitch: mips[0].pitch,
        height: mips[0].height,
        depth: desc.depth_or_array_size,
        slice_size,
        total_size: slice_size * u64::from(desc.depth_or_array_size),
        base_align: LINEAR_BASE_ALIGN,
        block: BlockGeometry {
            width: LINEAR_PITCH_ALIGN,
            height: 1,
            depth: 1,
            bytes: u64::from(LINEAR_PITCH_ALIGN) * bytes_per_elem,
        },
        mips,
        first_mip_in_tail: desc.mip_count,
        mip_chain_in_tail: false,
        stereo_right_xor: 0,
    })
}

fn tiled_info(context: &AddrContext, desc: &SurfaceDescriptor) -> Result<SurfaceInfo, AddrError> {
    let mode = desc.swizzle_mode;
    let thick = desc.is_thick();
    let block = block_geometry(mode, desc.elem_log2(), desc.frag_log2(), thick)
        .ok_or(AddrError::NotSupported)?;
    let class = mode.class();

    let surf_depth = if desc.dim == ResourceDim::Dim3 {
        desc.depth_or_array_size
    } else {
        1
    };
    let tail_cap = if class.is_macro() {
        // Safe to unwrap: macro classes always report a block size.
        Some(tail_capacity(class.block_size_log2().unwrap_or(12)))
    } else {
        None
    };
    let walk = mip_walk(
        desc.width,
        desc.height,
        surf_depth,
        desc.mip_count,
        &block,
        tail_cap,
    );

    let mut slice_size = walk.slice_size;
    let mut height = walk.mips[0].aligned_height;
    let mut stereo_right_xor = 0u64;
    if desc.usage.contains(UsageFlags::STEREO) {
        // Both eyes stack vertically; the right eye starts at the aligned
        // per eye height. When that start lands on an odd block row the
        // right eye's addresses pick up a y parity flip, reported as a
        // salt the caller XORs into right eye queries.
        let eye_height = height;
        height = eye_height * 2;
        slice_size *= 2;
        if let Some(eq) = context.equation(mode, desc.dim, desc.elem_log2(), desc.frag_log2()) {
            if let Some((eq_bit, y_bit)) = eq.highest_y_bit() {
                if (eye_height >> (y_bit + 1)) & 1 == 1 {
                    stereo_right_xor = 1 << (eq_bit + desc.elem_log2());
                }
            }
        }
    }

    let num_slices = if desc.dim == ResourceDim::Dim3 {
        1
    } else {
        u64::from(desc.depth_or_array_size)
    };
    Ok(SurfaceInfo {
        pitch: walk.mips[0].pitch,
        height,
        depth: if desc.dim == ResourceDim::Dim3 {
            walk.mips[0].aligned_depth
        } else {
            desc.depth_or_array_size
        },
        slice_size,
        total_size: slice_size * num_slices,
        base_align: block.bytes,
        block,
        mips: walk.mips,
        first_mip_in_tail: walk.first_mip_in_tail,
        mip_chain_in_tail: walk.first_mip_in_tail == 0,
        stereo_right_xor,
    })
}

/// Number of trailing mips one block can hold.
pub(crate) fn tail_capacity(block_size_log2: u32) -> u32 {
    if block_size_log2 <= 11 {
        1 + (1 << block_size_log2.saturating_sub(9))
    } else {
        block_size_log2 - 4
    }
}

/// Sub block placement of a tail mip by rank. Ranks alternate halving of
/// x then y, a pure function of the rank and block extent. Tail entry
/// requires a mip to fit half the block in both axes, which keeps every
/// rank's rectangle disjoint from the others.
pub(crate) fn mip_tail_coord(rank: u32, block: &BlockGeometry) -> (u32, u32) {
    let shift = rank / 2 + 1;
    if rank % 2 == 0 {
        (checked_half(block.width, shift), 0)
    } else {
        (0, checked_half(block.height, shift))
    }
}

fn checked_half(extent: u32, shift: u32) -> u32 {
    if shift >= 32 {
        0
    } else {
        extent >> shift
    }
}

pub(crate) struct MipWalk {
    pub mips: Vec<MipLayout>,
    pub slice_size: u64,
    pub first_mip_in_tail: u32,
}

/// Walks a mip chain against a block geometry, accumulating per mip
/// offsets and packing the trailing mips into one shared block when a
/// tail capacity is given. Also used for metadata surfaces with the
/// metadata block substituted.
pub(crate) fn mip_walk(
    width: u32,
    height: u32,
    depth: u32,
    mip_count: u32,
    block: &BlockGeometry,
    tail_cap: Option<u32>,
) -> MipWalk {
    let in_tail = |m: u32| -> bool {
        let Some(cap) = tail_cap else { return false };
        let mw = max(width >> m, 1);
        let mh = max(height >> m, 1);
        let md = max(depth >> m, 1);
        mw <= block.width / 2
            && mh <= block.height / 2
            && (block.depth == 1 || md <= max(block.depth / 2, 1))
            && mip_count - m <= cap
    };
    let first_mip_in_tail = (0..mip_count).find(|&m| in_tail(m)).unwrap_or(mip_count);

    let mut mips = Vec::with_capacity(mip_count as usize);
    let mut offset = 0u64;
    for m in 0..mip_count {
        let mw = max(width >> m, 1);
        let mh = max(height >> m, 1);
        let md = max(depth >> m, 1);
        if m < first_mip_in_tail {
            let pitch = pow2_align(u64::from(mw), u64::from(block.width)) as u32;
            let aligned_height = pow2_align(u64::from(mh), u64::from(block.height)) as u32;
            let aligned_depth = pow2_align(u64::from(md), u64::from(block.depth)) as u32;
            mips.push(MipLayout {
                width: mw,
                height: mh,
                depth: md,
                pitch,
                aligned_height,
                aligned_depth,
                offset,
                in_tail: false,
                tail_x: 0,
                tail_y: 0,
            });
            let blocks = u64::from(pitch / block.width)
                * u64::from(aligned_height / block.height)
                * u64::from(aligned_depth / block.depth);
            offset += blocks * block.bytes;
        } else {
            let (tail_x, tail_y) = mip_tail_coord(m - first_mip_in_tail, block);
            mips.push(MipLayout {
                width: mw,
                height: mh,
                depth: md,
                pitch: block.width,
                aligned_height: block.height,
                aligned_depth: block.depth,
                offset,
                in_tail: true,
                tail_x,
                tail_y,
            });
        }
    }
    let mut slice_size = offset;
    if first_mip_in_tail < mip_count {
        slice_size += block.bytes;
    }
    MipWalk {
        mips,
        slice_size,
        first_mip_in_tail,
    }
}
