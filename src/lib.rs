//! # radeon_addr
//! radeon_addr is a CPU implementation of GCN/RDNA style surface tiling
//! address computation.
//!
//! Texture and render target surfaces in GPU local memory are stored in
//! tiled ("swizzled") layouts selected by a [SwizzleMode]. This crate
//! computes the aligned pitch, height, slice size, and per mip layout for a
//! surface, the exact byte address of any (x, y, slice, sample, mip)
//! coordinate, and the same information for the compressed metadata
//! surfaces that accompany color and depth surfaces.
//!
//! # Getting Started
//! All queries go through an [AddrContext] built once from the device's
//! addressing configuration register. The context is immutable after
//! construction and safe to share across threads.
/*!
```rust
use radeon_addr::{
    AddrContext, ResourceDim, SurfaceDescriptor, SwizzleMode, UsageFlags,
};
# fn main() -> Result<(), radeon_addr::AddrError> {
// 8 pipes, 256 byte pipe interleave, 2 packers, 1 shader array.
let context = AddrContext::from_register(0b000_001_000_011)?;

let surface = SurfaceDescriptor {
    width: 256,
    height: 256,
    depth_or_array_size: 1,
    bits_per_element: 32,
    sample_count: 1,
    fragment_count: 1,
    mip_count: 1,
    dim: ResourceDim::Dim2,
    swizzle_mode: SwizzleMode::S64kbX,
    usage: UsageFlags::COLOR,
};

let info = context.surface_info(&surface)?;
assert_eq!(0, info.pitch % info.block.width);
# Ok(())
# }
```
*/
//! The layouts computed here must match the memory controller bit for bit.
//! The per configuration bit orderings are consumed as a generated data
//! asset (see [data::PATTERN_ASSET_VERSION]) rather than derived at runtime.
mod addr;
mod block;
mod config;
pub mod data;
mod equation;
mod layout;
mod meta;
mod mipinfo;
mod modes;
mod pattern;
mod surface;

pub use addr::AddrCoord;
pub use block::BlockGeometry;
pub use config::AddrConfig;
pub use equation::{EquationColumns, SwizzleEquation, MAX_EQUATION_BITS};
pub use layout::{LayoutChoice, LayoutRequest};
pub use meta::{MetaKind, MetaSurfaceInfo};
pub use mipinfo::{MipLayout, SurfaceInfo};
pub use modes::{BlockClass, ModeFlags, SwizzleFamily, SwizzleMode, SwizzleModeSet};
pub use surface::{ResourceDim, SurfaceDescriptor, UsageFlags};

use pattern::EquationCache;

/// Errors returned by addressing queries.
///
/// Internal consistency of the generated pattern asset (equation coverage,
/// table sizes) is checked with debug assertions and by the test suite, not
/// reported through this type. A violated assertion means a corrupt data
/// asset, not a bad request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AddrError {
    /// The surface attributes are malformed or contradict each other.
    #[error("invalid surface parameters: {0}")]
    InvalidParams(&'static str),
    /// The attributes are legal but the requested combination has no
    /// defined equation or layout on this hardware.
    #[error("the requested mode and attribute combination is not supported")]
    NotSupported,
    /// The combination is recognized but intentionally unimplemented,
    /// such as metadata coordinate queries above mip level 0.
    #[error("the requested combination is not implemented")]
    NotImplemented,
}

/// Entry point for all addressing queries.
///
/// Holds the decoded [AddrConfig] and the equation cache built from the
/// pattern asset during construction. All query methods take `&self` and
/// perform only in-memory arithmetic and table lookups.
pub struct AddrContext {
    config: AddrConfig,
    equations: EquationCache,
}

impl AddrContext {
    /// Builds a context from an already decoded configuration.
    pub fn new(config: AddrConfig) -> Self {
        let equations = EquationCache::build(&config);
        Self { config, equations }
    }

    /// Decodes the addressing configuration register and builds a context.
    ///
    /// Fails with [AddrError::InvalidParams] if any register field holds an
    /// unrecognized encoding. No partially initialized context is produced.
    pub fn from_register(register: u32) -> Result<Self, AddrError> {
        Ok(Self::new(AddrConfig::from_register(register)?))
    }

    /// The decoded device configuration.
    pub fn config(&self) -> &AddrConfig {
        &self.config
    }

    /// Computes the aligned layout of a surface.
    ///
    /// The returned [SurfaceInfo] is expected to be cached by the caller
    /// across repeated coordinate queries for the same surface.
    pub fn surface_info(&self, desc: &SurfaceDescriptor) -> Result<SurfaceInfo, AddrError> {
        mipinfo::surface_info(self, desc)
    }

    /// Computes the absolute byte address of a surface coordinate.
    ///
    /// `pipe_bank_xor` is the caller supplied salt XORed into the address at
    /// the pipe interleave bit position for XOR capable modes.
    pub fn address_from_coord(
        &self,
        desc: &SurfaceDescriptor,
        coord: &AddrCoord,
        pipe_bank_xor: u32,
    ) -> Result<u64, AddrError> {
        addr::address_from_coord(self, desc, coord, pipe_bank_xor)
    }

    /// Computes the layout of a compressed metadata surface.
    pub fn meta_surface_info(
        &self,
        desc: &SurfaceDescriptor,
        kind: MetaKind,
        pipe_aligned: bool,
    ) -> Result<MetaSurfaceInfo, AddrError> {
        meta::meta_surface_info(self, desc, kind, pipe_aligned)
    }

    /// Computes the byte address of the metadata element covering the data
    /// surface coordinate in `coord`.
    pub fn meta_address_from_coord(
        &self,
        desc: &SurfaceDescriptor,
        kind: MetaKind,
        coord: &AddrCoord,
        pipe_aligned: bool,
        pipe_bank_xor: u32,
    ) -> Result<u64, AddrError> {
        meta::meta_address_from_coord(self, desc, kind, coord, pipe_aligned, pipe_bank_xor)
    }

    /// Selects a swizzle mode for the requested usage.
    ///
    /// Returns the chosen mode together with the full legal mode set for
    /// diagnostics and caller side fallback.
    pub fn preferred_layout(&self, request: &LayoutRequest) -> Result<LayoutChoice, AddrError> {
        layout::preferred_layout(self, request)
    }

    pub(crate) fn equation(
        &self,
        mode: SwizzleMode,
        dim: ResourceDim,
        elem_log2: u32,
        frag_log2: u32,
    ) -> Option<&SwizzleEquation> {
        self.equations.lookup(mode, dim, elem_log2, frag_log2)
    }
}

/// Calculates the division of `x` by `d` but rounds up rather than truncating.
#[inline]
pub const fn div_round_up(x: u64, d: u64) -> u64 {
    (x + d - 1) / d
}

/// Rounds `x` up to the next multiple of the power of two `align`.
///
/// The result is always at least `x`, and aligning an already aligned value
/// leaves it unchanged.
/**
```rust
use radeon_addr::pow2_align;

assert_eq!(256, pow2_align(200, 256));
assert_eq!(256, pow2_align(256, 256));
```
 */
#[inline]
pub const fn pow2_align(x: u64, align: u64) -> u64 {
    (x + align - 1) & !(align - 1)
}

/// Integer log2 of a nonzero value, truncating.
#[inline]
pub(crate) const fn log2(x: u64) -> u32 {
    63 - x.leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow2_align_at_least_input_and_idempotent() {
        for x in 0..4096u64 {
            for shift in 0..12 {
                let align = 1 << shift;
                let aligned = pow2_align(x, align);
                assert!(aligned >= x);
                assert_eq!(0, aligned % align);
                assert_eq!(aligned, pow2_align(aligned, align));
            }
        }
    }

    #[test]
    fn div_round_up_exact_and_partial() {
        assert_eq!(2, div_round_up(8, 4));
        assert_eq!(3, div_round_up(9, 4));
        assert_eq!(10, div_round_up(10, 1));
    }

    #[test]
    fn log2_powers() {
        assert_eq!(0, log2(1));
        assert_eq!(8, log2(256));
        assert_eq!(16, log2(65536));
    }
}
