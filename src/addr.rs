//! Coordinate to byte address computation.
use crate::mipinfo::surface_info;
use crate::{AddrContext, AddrError, BlockClass, ResourceDim, SurfaceDescriptor};

/// A surface coordinate for an address query.
///
/// For 3D resources `slice` is the z coordinate; for arrays it is the
/// layer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct AddrCoord {
    pub x: u32,
    pub y: u32,
    pub slice: u32,
    pub mip: u32,
    pub sample: u32,
}

pub(crate) fn address_from_coord(
    context: &AddrContext,
    desc: &SurfaceDescriptor,
    coord: &AddrCoord,
    pipe_bank_xor: u32,
) -> Result<u64, AddrError> {
    desc.validate()?;
    validate_coord(desc, coord)?;

    let info = surface_info(context, desc)?;
    let mip = &info.mips[coord.mip as usize];
    if coord.x >= mip.width || coord.y >= mip.height {
        return Err(AddrError::InvalidParams("coordinate outside the mip"));
    }

    match desc.swizzle_mode.class() {
        BlockClass::Linear => {
            let bytes_per_elem = u64::from(desc.bits_per_element / 8);
            Ok(u64::from(coord.slice) * info.slice_size
                + mip.offset
                + u64::from(coord.y) * u64::from(mip.pitch) * bytes_per_elem
                + u64::from(coord.x) * bytes_per_elem)
        }
        _ => tiled_address(context, desc, coord, &info, pipe_bank_xor),
    }
}

fn validate_coord(desc: &SurfaceDescriptor, coord: &AddrCoord) -> Result<(), AddrError> {
    if coord.mip >= desc.mip_count {
        return Err(AddrError::InvalidParams("mip level out of range"));
    }
    if coord.slice >= desc.depth_or_array_size {
        return Err(AddrError::InvalidParams("slice out of range"));
    }
    if coord.sample >= desc.sample_count {
        return Err(AddrError::InvalidParams("sample out of range"));
    }
    Ok(())
}

fn tiled_address(
    context: &AddrContext,
    desc: &SurfaceDescriptor,
    coord: &AddrCoord,
    info: &crate::SurfaceInfo,
    pipe_bank_xor: u32,
) -> Result<u64, AddrError> {
    let elem_log2 = desc.elem_log2();
    // Multisample surfaces evaluate the fragment indexed equation
    // directly; single sample surfaces use the cached per mode entry.
    // Both come out of the same cache built at init.
    let equation = context
        .equation(desc.swizzle_mode, desc.dim, elem_log2, desc.frag_log2())
        .ok_or(AddrError::NotSupported)?;

    let block = &info.block;
    let mip = &info.mips[coord.mip as usize];
    let is_3d = desc.dim == ResourceDim::Dim3;
    let z = if is_3d { coord.slice } else { 0 };

    let (x, y) = if mip.in_tail {
        // Tail mips live at fixed sub block coordinates of the shared
        // tail block.
        (coord.x + mip.tail_x, coord.y + mip.tail_y)
    } else {
        (coord.x, coord.y)
    };

    let block_x = u64::from(x / block.width);
    let block_y = u64::from(y / block.height);
    let block_z = u64::from(z / block.depth);
    let pitch_in_blocks = u64::from(mip.pitch / block.width);
    let height_in_blocks = u64::from(mip.aligned_height / block.height);
    let block_index = (block_z * height_in_blocks + block_y) * pitch_in_blocks + block_x;

    let mut block_offset = u64::from(equation.eval(x, y, z, coord.sample)) << elem_log2;
    if desc.swizzle_mode.is_xor() {
        block_offset ^= pipe_bank_salt(context, pipe_bank_xor, block.bytes);
    }

    let slice_term = if is_3d {
        0
    } else {
        u64::from(coord.slice) * info.slice_size
    };
    Ok(slice_term + mip.offset + block_index * block.bytes + block_offset)
}

/// Shifts the caller salt to the pipe interleave position and masks it to
/// the block. Applying the same salt twice restores the address.
fn pipe_bank_salt(context: &AddrContext, pipe_bank_xor: u32, block_bytes: u64) -> u64 {
    (u64::from(pipe_bank_xor) << context.config().pipe_interleave_log2()) & (block_bytes - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SwizzleMode, UsageFlags};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn context() -> AddrContext {
        AddrContext::from_register(0b000_001_000_011).unwrap()
    }

    fn color_2d(mode: SwizzleMode) -> SurfaceDescriptor {
        SurfaceDescriptor {
            width: 256,
            height: 256,
            depth_or_array_size: 1,
            bits_per_element: 32,
            sample_count: 1,
            fragment_count: 1,
            mip_count: 1,
            dim: ResourceDim::Dim2,
            swizzle_mode: mode,
            usage: UsageFlags::COLOR,
        }
    }

    fn at(x: u32, y: u32) -> AddrCoord {
        AddrCoord {
            x,
            y,
            ..Default::default()
        }
    }

    #[test]
    fn adjacent_x_differs_by_element_size() {
        let context = context();
        let desc = color_2d(SwizzleMode::S64kbX);
        let a = context.address_from_coord(&desc, &at(0, 0), 0).unwrap();
        let b = context.address_from_coord(&desc, &at(1, 0), 0).unwrap();
        assert_eq!(4, b - a);
    }

    #[test]
    fn linear_addressing_is_row_major() {
        let context = context();
        let desc = color_2d(SwizzleMode::Linear);
        let info = context.surface_info(&desc).unwrap();
        let addr = context.address_from_coord(&desc, &at(3, 2), 0).unwrap();
        assert_eq!(u64::from(info.pitch) * 2 * 4 + 3 * 4, addr);
    }

    #[test]
    fn addresses_stay_unique_within_a_block() {
        let context = context();
        let desc = color_2d(SwizzleMode::S64kbX);
        // 128x128 block at 32 bits per element.
        let mut seen = vec![false; 65536];
        for y in 0..128 {
            for x in 0..128 {
                let addr = context.address_from_coord(&desc, &at(x, y), 0).unwrap();
                assert!(addr < 65536);
                assert_eq!(0, addr % 4);
                let slot = (addr / 4) as usize;
                assert!(!seen[slot], "({x}, {y}) aliases");
                seen[slot] = true;
            }
        }
    }

    #[test]
    fn pipe_bank_xor_is_self_inverse() {
        let context = context();
        let desc = color_2d(SwizzleMode::S64kbX);
        let mut rng = StdRng::from_seed([7u8; 32]);
        for _ in 0..256 {
            let x = rng.gen_range(0..256);
            let y = rng.gen_range(0..256);
            let salt = rng.gen_range(0..64);
            let plain = context.address_from_coord(&desc, &at(x, y), 0).unwrap();
            let salted = context.address_from_coord(&desc, &at(x, y), salt).unwrap();
            let salt_bytes = pipe_bank_salt(&context, salt, 65536);
            assert_eq!(plain, salted ^ salt_bytes);
        }
    }

    #[test]
    fn non_xor_mode_ignores_salt() {
        let context = context();
        let desc = color_2d(SwizzleMode::S64kb);
        let a = context.address_from_coord(&desc, &at(37, 91), 0).unwrap();
        let b = context.address_from_coord(&desc, &at(37, 91), 0x15).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn second_block_row_starts_after_a_block_row_of_bytes() {
        let context = context();
        let desc = color_2d(SwizzleMode::S64kbX);
        // Two blocks per row at 256 elements wide.
        let first = context.address_from_coord(&desc, &at(0, 0), 0).unwrap();
        let below = context.address_from_coord(&desc, &at(0, 128), 0).unwrap();
        assert_eq!(2 * 65536, below - first);
    }

    #[test]
    fn array_slices_are_slice_size_apart() {
        let context = context();
        let mut desc = color_2d(SwizzleMode::S64kbX);
        desc.depth_or_array_size = 4;
        let info = context.surface_info(&desc).unwrap();
        let base = context.address_from_coord(&desc, &at(5, 9), 0).unwrap();
        let layer = context
            .address_from_coord(
                &desc,
                &AddrCoord {
                    x: 5,
                    y: 9,
                    slice: 3,
                    ..Default::default()
                },
                0,
            )
            .unwrap();
        assert_eq!(base + 3 * info.slice_size, layer);
    }

    #[test]
    fn tail_mips_address_inside_the_tail_block() {
        let context = context();
        let mut desc = color_2d(SwizzleMode::S64kbX);
        desc.mip_count = 8;
        let info = context.surface_info(&desc).unwrap();
        let tail_base = info.mips[info.first_mip_in_tail as usize].offset;
        for mip in info.first_mip_in_tail..8 {
            let addr = context
                .address_from_coord(
                    &desc,
                    &AddrCoord {
                        mip,
                        ..Default::default()
                    },
                    0,
                )
                .unwrap();
            assert!(addr >= tail_base, "mip {mip}");
            assert!(addr < tail_base + 65536, "mip {mip}");
        }
    }

    #[test]
    fn distinct_tail_mips_never_collide() {
        let context = context();
        let mut desc = color_2d(SwizzleMode::S64kbX);
        desc.mip_count = 8;
        let info = context.surface_info(&desc).unwrap();
        let mut seen = std::collections::HashSet::new();
        for mip in info.first_mip_in_tail..8 {
            let layout = &info.mips[mip as usize];
            for y in 0..layout.height {
                for x in 0..layout.width {
                    let addr = context
                        .address_from_coord(&desc, &AddrCoord { x, y, mip, ..Default::default() }, 0)
                        .unwrap();
                    assert!(seen.insert(addr), "mip {mip} ({x}, {y}) collides");
                }
            }
        }
    }

    #[test]
    fn msaa_samples_are_distinct() {
        let context = context();
        let mut desc = color_2d(SwizzleMode::Z64kbX);
        desc.usage = UsageFlags::DEPTH;
        desc.sample_count = 4;
        desc.fragment_count = 4;
        let mut seen = std::collections::HashSet::new();
        for sample in 0..4 {
            for y in 0..8 {
                for x in 0..8 {
                    let addr = context
                        .address_from_coord(
                            &desc,
                            &AddrCoord {
                                x,
                                y,
                                sample,
                                ..Default::default()
                            },
                            0,
                        )
                        .unwrap();
                    assert!(seen.insert(addr));
                }
            }
        }
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let context = context();
        let desc = color_2d(SwizzleMode::S64kbX);
        assert!(matches!(
            context.address_from_coord(&desc, &at(256, 0), 0),
            Err(AddrError::InvalidParams(_))
        ));
        assert!(matches!(
            context.address_from_coord(
                &desc,
                &AddrCoord {
                    mip: 1,
                    ..Default::default()
                },
                0
            ),
            Err(AddrError::InvalidParams(_))
        ));
    }
}
