//! Swizzle mode selection.
//!
//! Callers describe the surface and how it will be used; the selector
//! returns one recommended mode plus the full legal set so a caller with
//! extra constraints can fall back without re-running validation. Class
//! selection trades padding waste against block size: bigger blocks give
//! better locality but round small surfaces up harder, so a class is only
//! chosen while its padded size stays within a budget of the smallest
//! legal layout.
use crate::modes::{BlockClass, ModeFlags, SwizzleFamily, SwizzleMode, SwizzleModeSet};
use crate::surface::{ResourceDim, SurfaceDescriptor, UsageFlags};
use crate::{AddrContext, AddrError};

/// Default padding budget: a class may use up to twice the minimal size.
const DEFAULT_SIZE_RATIO: f32 = 2.0;
/// Tighter budget applied when the caller optimizes for space.
const SPACE_SIZE_RATIO: f32 = 1.5;

/// Input to [AddrContext::preferred_layout].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRequest {
    pub width: u32,
    pub height: u32,
    /// Depth for 3D resources, array size otherwise.
    pub depth_or_array_size: u32,
    pub bits_per_element: u32,
    pub sample_count: u32,
    pub mip_count: u32,
    pub dim: ResourceDim,
    pub usage: UsageFlags,
    /// Always pick the smallest legal layout, ignoring the size budget.
    pub force_minimal: bool,
    /// Replaces the default padding budget when set. A class is legal while
    /// its total size is at most this multiple of the minimal layout.
    pub size_budget_ratio: Option<f32>,
    /// Tightens the default budget without forcing the minimum.
    pub optimize_for_space: bool,
}

/// Result of mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutChoice {
    /// The recommended mode.
    pub mode: SwizzleMode,
    /// Every mode the surface could legally use, the recommendation
    /// included.
    pub legal: SwizzleModeSet,
}

pub(crate) fn preferred_layout(
    context: &AddrContext,
    request: &LayoutRequest,
) -> Result<LayoutChoice, AddrError> {
    // Mode independent attribute errors surface as such rather than as an
    // empty candidate set.
    descriptor(request, SwizzleMode::Linear).validate_basic()?;

    let mut legal = SwizzleModeSet::empty();
    for mode in SwizzleMode::ALL {
        if mode_is_legal(context, request, mode) {
            legal |= mode.bit();
        }
    }
    if legal.is_empty() {
        return Err(AddrError::NotSupported);
    }

    // One candidate per block class, families ordered by usage.
    let order = family_order(request);
    let mut candidates: Vec<(SwizzleMode, u64)> = Vec::new();
    for class in [
        BlockClass::Macro256kb,
        BlockClass::Macro64kb,
        BlockClass::Macro4kb,
        BlockClass::Micro256b,
        BlockClass::Linear,
    ] {
        if let Some(mode) = mode_in_class(legal, class, &order) {
            let info = context.surface_info(&descriptor(request, mode))?;
            candidates.push((mode, info.total_size));
        }
    }

    let min_size = candidates
        .iter()
        .map(|&(_, size)| size)
        .min()
        .unwrap_or_default();
    let mode = if request.force_minimal {
        // Classes are ordered largest first, so on ties the smaller block
        // wins.
        candidates
            .iter()
            .rev()
            .min_by_key(|&&(_, size)| size)
            .map(|&(mode, _)| mode)
    } else {
        // A ratio below 1.0 could not admit any candidate; it degrades to
        // the minimal layout instead of failing.
        let ratio = request
            .size_budget_ratio
            .unwrap_or(if request.optimize_for_space {
                SPACE_SIZE_RATIO
            } else {
                DEFAULT_SIZE_RATIO
            })
            .max(1.0);
        let budget = (min_size as f64 * f64::from(ratio)) as u64;
        candidates
            .iter()
            .find(|&&(_, size)| size <= budget)
            .map(|&(mode, _)| mode)
    };
    // At least one candidate exists whenever the legal set is nonempty.
    let mode = mode.ok_or(AddrError::NotSupported)?;

    log::debug!(
        "selected {mode:?} for {}x{} bpe {} usage {:?} (legal {legal:?})",
        request.width,
        request.height,
        request.bits_per_element,
        request.usage,
    );
    Ok(LayoutChoice { mode, legal })
}

fn descriptor(request: &LayoutRequest, mode: SwizzleMode) -> SurfaceDescriptor {
    SurfaceDescriptor {
        width: request.width,
        height: request.height,
        depth_or_array_size: request.depth_or_array_size,
        bits_per_element: request.bits_per_element,
        sample_count: request.sample_count,
        fragment_count: request.sample_count,
        mip_count: request.mip_count,
        dim: request.dim,
        swizzle_mode: mode,
        usage: request.usage,
    }
}

fn mode_is_legal(context: &AddrContext, request: &LayoutRequest, mode: SwizzleMode) -> bool {
    let desc = descriptor(request, mode);
    if desc.validate().is_err() {
        return false;
    }
    let usage = request.usage;
    // Sparse residency commits memory in 64 KiB granules, so the block
    // must match the granule exactly.
    if usage.contains(UsageFlags::SPARSE) && mode.class() != BlockClass::Macro64kb {
        return false;
    }
    if usage.contains(UsageFlags::DISPLAY) {
        if mode != SwizzleMode::Linear && !mode.flags().contains(ModeFlags::DISPLAY) {
            return false;
        }
        if mode == SwizzleMode::D256kbX && !context.config().allows_256kb_display() {
            return false;
        }
    }
    if usage.contains(UsageFlags::BLOCK_COMPRESSED)
        && mode != SwizzleMode::Linear
        && (mode.family() != SwizzleFamily::Standard || mode.class() == BlockClass::Micro256b)
    {
        return false;
    }
    // Depth and stencil access always goes through the tiled depth
    // pipeline, so only macro blocks qualify.
    if usage.intersects(UsageFlags::DEPTH | UsageFlags::STENCIL) && !mode.class().is_macro() {
        return false;
    }
    // Tiled modes additionally need an equation in this configuration.
    mode == SwizzleMode::Linear
        || context
            .equation(mode, desc.dim, desc.elem_log2(), desc.frag_log2())
            .is_some()
}

fn family_order(request: &LayoutRequest) -> [SwizzleFamily; 4] {
    let usage = request.usage;
    if usage.intersects(UsageFlags::DEPTH | UsageFlags::STENCIL) {
        [
            SwizzleFamily::Depth,
            SwizzleFamily::Standard,
            SwizzleFamily::Display,
            SwizzleFamily::Render,
        ]
    } else if request.sample_count > 1 {
        // Multisampled color resolves fastest in the render optimized
        // order.
        [
            SwizzleFamily::Render,
            SwizzleFamily::Depth,
            SwizzleFamily::Standard,
            SwizzleFamily::Display,
        ]
    } else if usage.contains(UsageFlags::DISPLAY) {
        [
            SwizzleFamily::Display,
            SwizzleFamily::Standard,
            SwizzleFamily::Render,
            SwizzleFamily::Depth,
        ]
    } else {
        [
            SwizzleFamily::Standard,
            SwizzleFamily::Display,
            SwizzleFamily::Render,
            SwizzleFamily::Depth,
        ]
    }
}

/// The preferred legal mode of one block class: first by family order,
/// XOR variants ahead of their plain siblings.
fn mode_in_class(
    legal: SwizzleModeSet,
    class: BlockClass,
    order: &[SwizzleFamily; 4],
) -> Option<SwizzleMode> {
    for &family in order {
        for xor in [true, false] {
            for mode in SwizzleMode::ALL {
                if mode.class() == class
                    && mode.family() == family
                    && mode.is_xor() == xor
                    && legal.contains(mode.bit())
                {
                    return Some(mode);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> AddrContext {
        AddrContext::from_register(0b000_001_000_011).unwrap()
    }

    fn request(width: u32, height: u32, usage: UsageFlags) -> LayoutRequest {
        LayoutRequest {
            width,
            height,
            depth_or_array_size: 1,
            bits_per_element: 32,
            sample_count: 1,
            mip_count: 1,
            dim: ResourceDim::Dim2,
            usage,
            force_minimal: false,
            size_budget_ratio: None,
            optimize_for_space: false,
        }
    }

    #[test]
    fn color_surface_prefers_standard_xor() {
        let choice = context()
            .preferred_layout(&request(1024, 1024, UsageFlags::COLOR))
            .unwrap();
        assert_eq!(SwizzleMode::S256kbX, choice.mode);
        assert!(choice.legal.contains(SwizzleModeSet::LINEAR));
        assert!(choice.legal.contains(choice.mode.bit()));
    }

    #[test]
    fn display_surface_uses_a_display_mode() {
        let choice = context()
            .preferred_layout(&request(1920, 1080, UsageFlags::DISPLAY))
            .unwrap();
        assert_eq!(SwizzleFamily::Display, choice.mode.family());
        assert!(choice.mode.is_xor());
        // 256 KiB display blocks need 16 or more pipes.
        assert!(!choice.legal.contains(SwizzleModeSet::D256KB_X));
    }

    #[test]
    fn depth_surface_uses_the_depth_family() {
        let choice = context()
            .preferred_layout(&request(1024, 1024, UsageFlags::DEPTH))
            .unwrap();
        assert_eq!(SwizzleFamily::Depth, choice.mode.family());
        assert!(!choice.legal.contains(SwizzleModeSet::S64KB));
        assert!(!choice.legal.contains(SwizzleModeSet::D256B));
    }

    #[test]
    fn msaa_color_prefers_the_render_family() {
        let mut request = request(512, 512, UsageFlags::COLOR);
        request.sample_count = 4;
        let choice = context().preferred_layout(&request).unwrap();
        assert_eq!(SwizzleFamily::Render, choice.mode.family());
        assert!(!choice.legal.contains(SwizzleModeSet::LINEAR));
    }

    #[test]
    fn wide_elements_fall_back_to_linear() {
        let mut request = request(512, 512, UsageFlags::COLOR);
        request.bits_per_element = 96;
        let choice = context().preferred_layout(&request).unwrap();
        assert_eq!(SwizzleMode::Linear, choice.mode);
        assert_eq!(SwizzleModeSet::LINEAR, choice.legal);
    }

    #[test]
    fn block_compressed_msaa_is_invalid() {
        let mut request = request(512, 512, UsageFlags::BLOCK_COMPRESSED);
        request.sample_count = 4;
        assert!(matches!(
            context().preferred_layout(&request),
            Err(AddrError::InvalidParams(_))
        ));
    }

    #[test]
    fn small_surfaces_stay_in_small_blocks() {
        let choice = context()
            .preferred_layout(&request(16, 16, UsageFlags::COLOR))
            .unwrap();
        // A 64 KiB block would pad a 1 KiB surface 64x.
        assert_eq!(BlockClass::Micro256b, choice.mode.class());
    }

    #[test]
    fn block_compressed_skips_micro_blocks() {
        let choice = context()
            .preferred_layout(&request(16, 16, UsageFlags::BLOCK_COMPRESSED))
            .unwrap();
        assert_ne!(BlockClass::Micro256b, choice.mode.class());
        assert_eq!(SwizzleFamily::Standard, choice.mode.family());
        assert!(!choice.legal.contains(SwizzleModeSet::S256B));
        assert!(!choice.legal.contains(SwizzleModeSet::D64KB_X));
    }

    #[test]
    fn force_minimal_picks_the_smallest_layout() {
        let mut request = request(256, 256, UsageFlags::COLOR);
        request.force_minimal = true;
        let choice = context().preferred_layout(&request).unwrap();
        let info = context()
            .surface_info(&descriptor(&request, choice.mode))
            .unwrap();
        for mode in SwizzleMode::ALL {
            if choice.legal.contains(mode.bit()) {
                let other = context()
                    .surface_info(&descriptor(&request, mode))
                    .unwrap();
                assert!(info.total_size <= other.total_size, "{mode:?}");
            }
        }
    }

    #[test]
    fn explicit_budget_overrides_the_default() {
        // A generous budget admits a block the default budget rejects.
        let mut generous = request(128, 128, UsageFlags::COLOR);
        generous.size_budget_ratio = Some(16.0);
        let choice = context().preferred_layout(&generous).unwrap();
        assert_eq!(BlockClass::Macro256kb, choice.mode.class());

        let default_choice = context()
            .preferred_layout(&request(128, 128, UsageFlags::COLOR))
            .unwrap();
        assert_ne!(BlockClass::Macro256kb, default_choice.mode.class());

        let mut strict = request(256, 256, UsageFlags::COLOR);
        strict.size_budget_ratio = Some(1.0);
        let minimal = context().preferred_layout(&strict).unwrap();
        let info = context()
            .surface_info(&descriptor(&strict, minimal.mode))
            .unwrap();
        assert_eq!(256 * 256 * 4, info.total_size);
    }

    #[test]
    fn sub_unit_budget_degrades_to_the_minimal_layout() {
        let mut request = request(300, 300, UsageFlags::COLOR);
        request.size_budget_ratio = Some(0.5);
        let choice = context().preferred_layout(&request).unwrap();
        // 300x300 pads least in 256 byte micro blocks.
        assert_eq!(BlockClass::Micro256b, choice.mode.class());
    }

    #[test]
    fn sparse_surfaces_require_the_residency_granule() {
        let choice = context()
            .preferred_layout(&request(1024, 1024, UsageFlags::COLOR | UsageFlags::SPARSE))
            .unwrap();
        assert_eq!(BlockClass::Macro64kb, choice.mode.class());
        for mode in SwizzleMode::ALL {
            if choice.legal.contains(mode.bit()) {
                assert_eq!(BlockClass::Macro64kb, mode.class());
            }
        }
    }

    #[test]
    fn volumes_pick_a_thick_mode() {
        let mut request = request(64, 64, UsageFlags::COLOR);
        request.dim = ResourceDim::Dim3;
        request.depth_or_array_size = 16;
        let choice = context().preferred_layout(&request).unwrap();
        assert!(choice.mode.flags().contains(ModeFlags::THICK));
    }

    #[test]
    fn one_dimensional_surfaces_are_linear() {
        let mut request = request(4096, 1, UsageFlags::COLOR);
        request.dim = ResourceDim::Dim1;
        let choice = context().preferred_layout(&request).unwrap();
        assert_eq!(SwizzleMode::Linear, choice.mode);
    }

    #[test]
    fn conflicting_usage_has_no_legal_mode() {
        let result = context().preferred_layout(&request(
            1024,
            1024,
            UsageFlags::DEPTH | UsageFlags::DISPLAY,
        ));
        assert_eq!(Err(AddrError::NotSupported), result);
    }
}
