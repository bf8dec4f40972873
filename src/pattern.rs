//! Lookup and construction of swizzle equations.
//!
//! The cache is populated once while building an [crate::AddrContext] and
//! treated as immutable afterwards. Construction starts from the micro tile
//! orders in the generated [crate::data] asset and extends them: macro bits
//! continue the interleave above the micro tile, thick modes rotate z into
//! the fill order, and XOR capable modes fold pipe and packer bits into the
//! block offset. Every XOR term pulls only coordinate bits whose primary
//! address position is strictly higher, which keeps the mapping invertible.
use crate::block::block_geometry;
use crate::config::AddrConfig;
use crate::data;
use crate::equation::{EqBit, SwizzleEquation};
use crate::modes::{ModeFlags, SwizzleFamily, SwizzleMode};
use crate::surface::ResourceDim;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
    S,
}

const MAX_ELEM_LOG2: u32 = 4;
const MAX_FRAG_LOG2: u32 = 3;
const ELEM_CLASSES: usize = MAX_ELEM_LOG2 as usize + 1;
const FRAG_CLASSES: usize = MAX_FRAG_LOG2 as usize + 1;

/// All equations for one device configuration.
pub(crate) struct EquationCache {
    entries: Vec<Option<SwizzleEquation>>,
}

impl EquationCache {
    pub(crate) fn build(config: &AddrConfig) -> Self {
        let mut entries = vec![None; SwizzleMode::ALL.len() * 2 * ELEM_CLASSES * FRAG_CLASSES];
        let mut count = 0;
        for mode in SwizzleMode::ALL {
            for thick in [false, true] {
                if thick && !mode.flags().contains(ModeFlags::THICK) {
                    continue;
                }
                for elem_log2 in 0..=MAX_ELEM_LOG2 {
                    for frag_log2 in 0..=MAX_FRAG_LOG2 {
                        if frag_log2 > 0 && !mode.flags().contains(ModeFlags::MSAA) {
                            continue;
                        }
                        if let Some(eq) =
                            build_equation(config, mode, elem_log2, frag_log2, thick)
                        {
                            entries[index(mode, thick, elem_log2, frag_log2)] = Some(eq);
                            count += 1;
                        }
                    }
                }
            }
        }
        log::debug!(
            "built {count} swizzle equations for configuration class {}",
            config.config_class()
        );
        Self { entries }
    }

    /// Returns the equation for a combination, or [None] when the
    /// combination is legal but has no defined layout.
    pub(crate) fn lookup(
        &self,
        mode: SwizzleMode,
        dim: ResourceDim,
        elem_log2: u32,
        frag_log2: u32,
    ) -> Option<&SwizzleEquation> {
        if elem_log2 > MAX_ELEM_LOG2 || frag_log2 > MAX_FRAG_LOG2 {
            return None;
        }
        let thick = dim == ResourceDim::Dim3 && mode.flags().contains(ModeFlags::THICK);
        self.entries[index(mode, thick, elem_log2, frag_log2)].as_ref()
    }
}

/// Flat cache index. The enumeration order mirrors the hardware's
/// configuration order: the per configuration pipe and packer class is
/// fixed for a cache, so the remaining key is mode crossed with the
/// element size class and fragment count.
fn index(mode: SwizzleMode, thick: bool, elem_log2: u32, frag_log2: u32) -> usize {
    (((mode as usize * 2) + usize::from(thick)) * ELEM_CLASSES + elem_log2 as usize)
        * FRAG_CLASSES
        + frag_log2 as usize
}

fn micro_order(family: SwizzleFamily, elem_log2: u32) -> &'static [u8] {
    let table = match family {
        SwizzleFamily::Standard => &data::MICRO_ORDER_STANDARD,
        SwizzleFamily::Display => &data::MICRO_ORDER_DISPLAY,
        SwizzleFamily::Depth => &data::MICRO_ORDER_DEPTH,
        SwizzleFamily::Render => &data::MICRO_ORDER_RENDER,
    };
    table[elem_log2 as usize]
}

fn build_equation(
    config: &AddrConfig,
    mode: SwizzleMode,
    elem_log2: u32,
    frag_log2: u32,
    thick: bool,
) -> Option<SwizzleEquation> {
    let geometry = block_geometry(mode, elem_log2, frag_log2, thick)?;
    let block_size_log2 = mode.block_size_log2()?;
    let num_bits = block_size_log2 - elem_log2;
    let width_log2 = geometry.width_log2();
    let height_log2 = geometry.height_log2();
    let depth_log2 = geometry.depth_log2();

    // Primary assignment: every in block coordinate bit claims exactly one
    // address bit. Sample bits sit lowest, then the micro tile order from
    // the asset, then the macro continuation.
    let mut primaries: Vec<(Axis, u32)> = Vec::with_capacity(num_bits as usize);
    let mut used_x = 0;
    let mut used_y = 0;
    let mut used_z = 0;
    for s in 0..frag_log2 {
        primaries.push((Axis::S, s));
    }
    if thick {
        // Volume blocks rotate x, y, z evenly from the lowest bit.
        let mut turn = 0;
        while (primaries.len() as u32) < num_bits {
            for k in 0..3 {
                let (axis, used, cap) = match (turn + k) % 3 {
                    0 => (Axis::X, &mut used_x, width_log2),
                    1 => (Axis::Y, &mut used_y, height_log2),
                    _ => (Axis::Z, &mut used_z, depth_log2),
                };
                if *used < cap {
                    primaries.push((axis, *used));
                    *used += 1;
                    break;
                }
            }
            turn += 1;
        }
    } else {
        for &code in micro_order(mode.family(), elem_log2) {
            if primaries.len() as u32 == num_bits {
                break;
            }
            match code & data::AXIS_MASK {
                data::AXIS_X if used_x < width_log2 => {
                    primaries.push((Axis::X, used_x));
                    used_x += 1;
                }
                data::AXIS_Y if used_y < height_log2 => {
                    primaries.push((Axis::Y, used_y));
                    used_y += 1;
                }
                _ => {}
            }
        }
        // Macro bits continue above the micro tile, y leading so bank
        // oriented address bits favor vertical spread.
        let mut want_y = true;
        while (primaries.len() as u32) < num_bits {
            if (want_y && used_y < height_log2) || used_x == width_log2 {
                primaries.push((Axis::Y, used_y));
                used_y += 1;
            } else {
                primaries.push((Axis::X, used_x));
                used_x += 1;
            }
            want_y = !want_y;
        }
    }
    debug_assert_eq!(used_x, width_log2);
    debug_assert_eq!(used_y, height_log2);
    debug_assert_eq!(used_z, depth_log2);

    let mut eq = SwizzleEquation::new(elem_log2);
    for &(axis, index) in &primaries {
        let mut bit = EqBit::default();
        match axis {
            Axis::X => bit.x = 1 << index,
            Axis::Y => bit.y = 1 << index,
            Axis::Z => bit.z = 1 << index,
            Axis::S => bit.s = 1 << index,
        }
        eq.push(bit);
    }

    if mode.is_xor() {
        // Pipe bits start at the interleave boundary, packer bits above
        // them. Each XOR source is the primary of a strictly higher
        // address bit, so the linear map stays triangular and invertible.
        let pipe_base = config.pipe_interleave_log2().saturating_sub(elem_log2);
        let pipes = config.pipes_log2().min(num_bits.saturating_sub(pipe_base));
        apply_xor_span(&mut eq, &primaries, pipe_base, pipes, num_bits);
        let bank_base = pipe_base + pipes;
        let banks = config
            .packers_log2()
            .min(num_bits.saturating_sub(bank_base));
        apply_xor_span(&mut eq, &primaries, bank_base, banks, num_bits);
    }

    #[cfg(debug_assertions)]
    eq.validate(width_log2, height_log2, depth_log2, frag_log2, mode.is_xor());

    Some(eq)
}

/// Equation over metadata element coordinates within a metadata block.
/// Morton interleave with y leading, pipe bits folded into the low address
/// bits when the surface is pipe aligned. The result evaluates metadata
/// element offsets; the caller scales to bytes.
pub(crate) fn build_meta_equation(
    config: &AddrConfig,
    width_log2: u32,
    height_log2: u32,
    pipe_aligned: bool,
) -> SwizzleEquation {
    let num_bits = width_log2 + height_log2;
    let mut primaries: Vec<(Axis, u32)> = Vec::with_capacity(num_bits as usize);
    let mut used_x = 0;
    let mut used_y = 0;
    let mut want_y = true;
    while (primaries.len() as u32) < num_bits {
        if (want_y && used_y < height_log2) || used_x == width_log2 {
            primaries.push((Axis::Y, used_y));
            used_y += 1;
        } else {
            primaries.push((Axis::X, used_x));
            used_x += 1;
        }
        want_y = !want_y;
    }

    let mut eq = SwizzleEquation::new(0);
    for &(axis, index) in &primaries {
        let mut bit = EqBit::default();
        match axis {
            Axis::X => bit.x = 1 << index,
            Axis::Y => bit.y = 1 << index,
            _ => unreachable!(),
        }
        eq.push(bit);
    }
    if pipe_aligned {
        let pipes = config.pipes_log2().min(num_bits);
        apply_xor_span(&mut eq, &primaries, 0, pipes, num_bits);
    }

    #[cfg(debug_assertions)]
    eq.validate(width_log2, height_log2, 0, 0, pipe_aligned);

    eq
}

/// Folds XOR contributions into `span` address bits starting at `base`.
/// Bit `base + k` picks up the primaries of bits `base + k + span` and
/// `base + k + 2 * span` when those exist.
fn apply_xor_span(
    eq: &mut SwizzleEquation,
    primaries: &[(Axis, u32)],
    base: u32,
    span: u32,
    num_bits: u32,
) {
    for k in 0..span {
        let dst = (base + k) as usize;
        for m in [span, span * 2] {
            let src = base + k + m;
            if src < num_bits {
                let (axis, index) = primaries[src as usize];
                let bit = eq.bit_mut(dst);
                match axis {
                    Axis::X => bit.x ^= 1 << index,
                    Axis::Y => bit.y ^= 1 << index,
                    Axis::Z => bit.z ^= 1 << index,
                    Axis::S => bit.s ^= 1 << index,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AddrConfig;

    fn configs() -> Vec<AddrConfig> {
        // One pipe/one packer, eight pipes/two packers, and the widest
        // supported configuration.
        [0b000_000_000_000u32, 0b000_001_000_011, 0b010_011_011_110]
            .iter()
            .map(|&r| AddrConfig::from_register(r).unwrap())
            .collect()
    }

    fn for_each_entry(config: &AddrConfig, mut f: impl FnMut(SwizzleMode, bool, u32, u32, &SwizzleEquation)) {
        let cache = EquationCache::build(config);
        for mode in SwizzleMode::ALL {
            for thick in [false, true] {
                for elem_log2 in 0..=MAX_ELEM_LOG2 {
                    for frag_log2 in 0..=MAX_FRAG_LOG2 {
                        let dim = if thick {
                            ResourceDim::Dim3
                        } else {
                            ResourceDim::Dim2
                        };
                        if thick && !mode.flags().contains(ModeFlags::THICK) {
                            continue;
                        }
                        if let Some(eq) = cache.lookup(mode, dim, elem_log2, frag_log2) {
                            f(mode, thick, elem_log2, frag_log2, eq);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn every_entry_satisfies_the_coverage_invariant() {
        for config in configs() {
            for_each_entry(&config, |mode, thick, elem_log2, frag_log2, eq| {
                let geometry = block_geometry(mode, elem_log2, frag_log2, thick).unwrap();
                eq.validate(
                    geometry.width_log2(),
                    geometry.height_log2(),
                    geometry.depth_log2(),
                    frag_log2,
                    mode.is_xor(),
                );
            });
        }
    }

    #[test]
    fn equations_are_injective_over_the_block() {
        // Exhaustive enumeration for every block of 64 KiB or less.
        for config in configs() {
            for_each_entry(&config, |mode, thick, elem_log2, frag_log2, eq| {
                let geometry = block_geometry(mode, elem_log2, frag_log2, thick).unwrap();
                if geometry.bytes > 65536 {
                    return;
                }
                let mut seen = vec![false; 1 << eq.num_bits()];
                for z in 0..geometry.depth {
                    for y in 0..geometry.height {
                        for x in 0..geometry.width {
                            for s in 0..1u32 << frag_log2 {
                                let offset = eq.eval(x, y, z, s) as usize;
                                assert!(
                                    !seen[offset],
                                    "{mode:?} elem_log2={elem_log2} frag_log2={frag_log2} \
                                     aliases at ({x}, {y}, {z}, {s})"
                                );
                                seen[offset] = true;
                            }
                        }
                    }
                }
                assert!(seen.iter().all(|&v| v), "{mode:?} offset space not filled");
            });
        }
    }

    #[test]
    fn linear_has_no_equation() {
        let cache = EquationCache::build(&configs()[0]);
        assert!(cache
            .lookup(SwizzleMode::Linear, ResourceDim::Dim2, 2, 0)
            .is_none());
    }

    #[test]
    fn fragments_on_display_modes_are_unsupported() {
        let cache = EquationCache::build(&configs()[1]);
        assert!(cache
            .lookup(SwizzleMode::D64kbX, ResourceDim::Dim2, 2, 2)
            .is_none());
        assert!(cache
            .lookup(SwizzleMode::Z64kbX, ResourceDim::Dim2, 2, 2)
            .is_some());
    }

    #[test]
    fn xor_modes_reference_pipe_bits() {
        let config = configs()[1];
        let cache = EquationCache::build(&config);
        let eq = cache
            .lookup(SwizzleMode::S64kbX, ResourceDim::Dim2, 2, 0)
            .unwrap();
        let pipe_bit = (config.pipe_interleave_log2() - 2) as usize;
        // The first pipe bit has its primary plus folded contributions.
        let bit = eq.bit(pipe_bit);
        let contributors =
            bit.x.count_ones() + bit.y.count_ones() + bit.z.count_ones() + bit.s.count_ones();
        assert!(contributors > 1);
    }

    #[test]
    fn meta_equations_are_injective() {
        for config in configs() {
            for pipe_aligned in [false, true] {
                let eq = build_meta_equation(&config, 5, 5, pipe_aligned);
                let mut seen = vec![false; 1 << 10];
                for y in 0..32 {
                    for x in 0..32 {
                        let offset = eq.eval(x, y, 0, 0) as usize;
                        assert!(!seen[offset], "({x}, {y}) aliases");
                        seen[offset] = true;
                    }
                }
            }
        }
    }

    #[test]
    fn non_xor_modes_are_single_assignment() {
        for config in configs() {
            for_each_entry(&config, |mode, _, _, _, eq| {
                if mode.is_xor() {
                    return;
                }
                for i in 0..eq.num_bits() as usize {
                    let bit = eq.bit(i);
                    let contributors = bit.x.count_ones()
                        + bit.y.count_ones()
                        + bit.z.count_ones()
                        + bit.s.count_ones();
                    assert_eq!(1, contributors, "{mode:?} bit {i}");
                }
            });
        }
    }
}
