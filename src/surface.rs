//! Surface descriptors and attribute validation.
use bitflags::bitflags;

use crate::{log2, AddrError, BlockClass, ModeFlags, SwizzleFamily, SwizzleMode};

/// Resource dimensionality.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum ResourceDim {
    Dim1,
    Dim2,
    Dim3,
}

bitflags! {
    /// How the surface will be used. Drives validation and layout policy.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct UsageFlags: u32 {
        const DEPTH = 1 << 0;
        const STENCIL = 1 << 1;
        const COLOR = 1 << 2;
        const DISPLAY = 1 << 3;
        /// Sparse / partially resident surface.
        const SPARSE = 1 << 4;
        /// Stereo surface with both eyes stacked vertically.
        const STEREO = 1 << 5;
        /// BCn style block compressed format.
        const BLOCK_COMPRESSED = 1 << 6;
    }
}

/// Caller owned description of a surface. Read only input to every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    /// Logical width in elements. For block compressed formats this is the
    /// width in compression blocks, not pixels.
    pub width: u32,
    /// Logical height in elements.
    pub height: u32,
    /// Depth for 3D resources, array size otherwise.
    pub depth_or_array_size: u32,
    /// Bits per element. 8, 16, 32, 64 or 128; 96 is legal for linear only.
    pub bits_per_element: u32,
    pub sample_count: u32,
    pub fragment_count: u32,
    pub mip_count: u32,
    pub dim: ResourceDim,
    pub swizzle_mode: SwizzleMode,
    pub usage: UsageFlags,
}

/// Hardware limit on samples per element.
pub(crate) const MAX_SAMPLES: u32 = 8;

/// Largest extent in elements the hardware addresses per axis. Layout
/// arithmetic relies on aligned extents staying well inside `u32`.
pub(crate) const MAX_SURFACE_EXTENT: u32 = 16384;

impl SurfaceDescriptor {
    /// log2 of the element byte size. 96 bit formats truncate to the lower
    /// power of two; they are rejected for every tiled mode before this
    /// matters.
    #[inline]
    pub(crate) fn elem_log2(&self) -> u32 {
        log2(u64::from(self.bits_per_element / 8))
    }

    #[inline]
    pub(crate) fn frag_log2(&self) -> u32 {
        log2(u64::from(self.fragment_count))
    }

    /// Mode independent attribute sanity. Run once per descriptor.
    pub fn validate_basic(&self) -> Result<(), AddrError> {
        if self.width == 0 || self.height == 0 || self.depth_or_array_size == 0 {
            return Err(AddrError::InvalidParams("zero surface dimension"));
        }
        if self.width > MAX_SURFACE_EXTENT
            || self.height > MAX_SURFACE_EXTENT
            || self.depth_or_array_size > MAX_SURFACE_EXTENT
        {
            return Err(AddrError::InvalidParams("surface dimension exceeds 16384"));
        }
        if self.mip_count == 0 {
            return Err(AddrError::InvalidParams("zero mip count"));
        }
        match self.bits_per_element {
            8 | 16 | 32 | 64 | 96 | 128 => {}
            _ => return Err(AddrError::InvalidParams("unsupported element size")),
        }
        if self.sample_count > MAX_SAMPLES {
            return Err(AddrError::InvalidParams("sample count exceeds 8"));
        }
        if !matches!(self.sample_count, 1 | 2 | 4 | 8) {
            return Err(AddrError::InvalidParams("non power of two sample count"));
        }
        if self.fragment_count != self.sample_count {
            return Err(AddrError::InvalidParams(
                "fragment count differs from sample count",
            ));
        }
        if self.sample_count > 1 {
            if self.usage.contains(UsageFlags::BLOCK_COMPRESSED) {
                return Err(AddrError::InvalidParams(
                    "multisampling with a block compressed format",
                ));
            }
            if self.dim == ResourceDim::Dim3 {
                return Err(AddrError::InvalidParams("multisampled 3D resource"));
            }
        }
        if self.usage.contains(UsageFlags::STEREO) {
            if self.dim != ResourceDim::Dim2 || self.mip_count > 1 {
                return Err(AddrError::InvalidParams(
                    "stereo requires a single mip 2D surface",
                ));
            }
        }
        let max_dim = self.width.max(self.height).max(match self.dim {
            ResourceDim::Dim3 => self.depth_or_array_size,
            _ => 1,
        });
        if self.mip_count > log2(u64::from(max_dim)) + 1 {
            return Err(AddrError::InvalidParams("mip count exceeds dimensions"));
        }
        Ok(())
    }

    /// Mode specific sanity, independent of [Self::validate_basic]. Callers
    /// probing several modes against fixed attributes re-run only this pass.
    pub fn validate_for_mode(&self) -> Result<(), AddrError> {
        let mode = self.swizzle_mode;
        let class = mode.class();
        let family = mode.family();

        if self.bits_per_element == 96 && class != BlockClass::Linear {
            return Err(AddrError::InvalidParams("96 bit elements must be linear"));
        }
        if self.sample_count > 1 {
            if class == BlockClass::Linear {
                return Err(AddrError::InvalidParams("multisampled linear surface"));
            }
            // Multisample layouts exist only for the depth and render
            // optimized XOR modes.
            if !mode.flags().contains(ModeFlags::MSAA) {
                return Err(AddrError::NotSupported);
            }
        }
        match self.dim {
            ResourceDim::Dim1 => {
                if class != BlockClass::Linear {
                    return Err(AddrError::NotSupported);
                }
            }
            ResourceDim::Dim2 => {}
            ResourceDim::Dim3 => {
                // Volumes need linear or a thick capable standard mode.
                if class != BlockClass::Linear && !mode.flags().contains(ModeFlags::THICK) {
                    return Err(AddrError::NotSupported);
                }
            }
        }
        // The scanout path fetches at most 64 bits per element.
        if family == SwizzleFamily::Display && self.bits_per_element > 64 {
            return Err(AddrError::NotSupported);
        }
        if self.usage.intersects(UsageFlags::DEPTH | UsageFlags::STENCIL)
            && class.is_macro()
            && family != SwizzleFamily::Depth
        {
            return Err(AddrError::NotSupported);
        }
        if self.usage.contains(UsageFlags::STEREO) && !mode.is_xor() {
            return Err(AddrError::NotSupported);
        }
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<(), AddrError> {
        self.validate_basic()?;
        self.validate_for_mode()
    }

    /// Whether this descriptor uses thick (volume) blocks.
    #[inline]
    pub(crate) fn is_thick(&self) -> bool {
        self.dim == ResourceDim::Dim3 && self.swizzle_mode.flags().contains(ModeFlags::THICK)
    }
}
