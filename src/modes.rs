//! The swizzle mode universe and per mode capability data.
use bitflags::bitflags;

/// An enumeration of the supported tiling schemes.
///
/// The letter prefix names the swizzle family (`S` standard, `D` display,
/// `Z` depth optimized, `R` render optimized), the number is the block
/// size, and the `X` suffix marks XOR capable variants that fold pipe and
/// packer bits into the block offset.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[repr(u32)]
pub enum SwizzleMode {
    Linear = 0,
    S256b,
    D256b,
    S4kb,
    D4kb,
    S4kbX,
    D4kbX,
    S64kb,
    D64kb,
    S64kbX,
    D64kbX,
    Z64kbX,
    R64kbX,
    S256kbX,
    D256kbX,
    Z256kbX,
    R256kbX,
}

/// Block size class of a swizzle mode, resolved once per descriptor.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BlockClass {
    Linear,
    Micro256b,
    Macro4kb,
    Macro64kb,
    Macro256kb,
}

impl BlockClass {
    /// log2 of the block byte size, [None] for linear surfaces.
    #[inline]
    pub const fn block_size_log2(self) -> Option<u32> {
        match self {
            BlockClass::Linear => None,
            BlockClass::Micro256b => Some(8),
            BlockClass::Macro4kb => Some(12),
            BlockClass::Macro64kb => Some(16),
            BlockClass::Macro256kb => Some(18),
        }
    }

    /// Whether this class is macro tiled (4 KiB or larger blocks).
    #[inline]
    pub const fn is_macro(self) -> bool {
        matches!(
            self,
            BlockClass::Macro4kb | BlockClass::Macro64kb | BlockClass::Macro256kb
        )
    }
}

/// Swizzle family of a mode.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SwizzleFamily {
    Standard,
    Display,
    Depth,
    Render,
}

bitflags! {
    /// Capability flags attached to each swizzle mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModeFlags: u32 {
        /// Pipe and packer bits XOR into the block offset.
        const XOR = 1 << 0;
        /// Usable for 3D resources with volume blocks.
        const THICK = 1 << 1;
        /// Accepts multi sample surfaces.
        const MSAA = 1 << 2;
        /// Usable for scanout.
        const DISPLAY = 1 << 3;
    }
}

bitflags! {
    /// A set of swizzle modes, one bit per [SwizzleMode] discriminant.
    ///
    /// Returned by the preferred layout query so callers can fall back to
    /// another legal mode without asking again.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SwizzleModeSet: u32 {
        const LINEAR = 1 << 0;
        const S256B = 1 << 1;
        const D256B = 1 << 2;
        const S4KB = 1 << 3;
        const D4KB = 1 << 4;
        const S4KB_X = 1 << 5;
        const D4KB_X = 1 << 6;
        const S64KB = 1 << 7;
        const D64KB = 1 << 8;
        const S64KB_X = 1 << 9;
        const D64KB_X = 1 << 10;
        const Z64KB_X = 1 << 11;
        const R64KB_X = 1 << 12;
        const S256KB_X = 1 << 13;
        const D256KB_X = 1 << 14;
        const Z256KB_X = 1 << 15;
        const R256KB_X = 1 << 16;
    }
}

impl SwizzleMode {
    /// Every mode, ordered by discriminant.
    pub const ALL: [SwizzleMode; 17] = [
        SwizzleMode::Linear,
        SwizzleMode::S256b,
        SwizzleMode::D256b,
        SwizzleMode::S4kb,
        SwizzleMode::D4kb,
        SwizzleMode::S4kbX,
        SwizzleMode::D4kbX,
        SwizzleMode::S64kb,
        SwizzleMode::D64kb,
        SwizzleMode::S64kbX,
        SwizzleMode::D64kbX,
        SwizzleMode::Z64kbX,
        SwizzleMode::R64kbX,
        SwizzleMode::S256kbX,
        SwizzleMode::D256kbX,
        SwizzleMode::Z256kbX,
        SwizzleMode::R256kbX,
    ];

    /// The mode's block size class.
    pub const fn class(self) -> BlockClass {
        match self {
            SwizzleMode::Linear => BlockClass::Linear,
            SwizzleMode::S256b | SwizzleMode::D256b => BlockClass::Micro256b,
            SwizzleMode::S4kb | SwizzleMode::D4kb | SwizzleMode::S4kbX | SwizzleMode::D4kbX => {
                BlockClass::Macro4kb
            }
            SwizzleMode::S64kb
            | SwizzleMode::D64kb
            | SwizzleMode::S64kbX
            | SwizzleMode::D64kbX
            | SwizzleMode::Z64kbX
            | SwizzleMode::R64kbX => BlockClass::Macro64kb,
            SwizzleMode::S256kbX
            | SwizzleMode::D256kbX
            | SwizzleMode::Z256kbX
            | SwizzleMode::R256kbX => BlockClass::Macro256kb,
        }
    }

    /// The mode's swizzle family. Linear surfaces report [SwizzleFamily::Standard].
    pub const fn family(self) -> SwizzleFamily {
        match self {
            SwizzleMode::Linear
            | SwizzleMode::S256b
            | SwizzleMode::S4kb
            | SwizzleMode::S4kbX
            | SwizzleMode::S64kb
            | SwizzleMode::S64kbX
            | SwizzleMode::S256kbX => SwizzleFamily::Standard,
            SwizzleMode::D256b
            | SwizzleMode::D4kb
            | SwizzleMode::D4kbX
            | SwizzleMode::D64kb
            | SwizzleMode::D64kbX
            | SwizzleMode::D256kbX => SwizzleFamily::Display,
            SwizzleMode::Z64kbX | SwizzleMode::Z256kbX => SwizzleFamily::Depth,
            SwizzleMode::R64kbX | SwizzleMode::R256kbX => SwizzleFamily::Render,
        }
    }

    /// Capability flags for this mode.
    pub const fn flags(self) -> ModeFlags {
        match self {
            SwizzleMode::Linear | SwizzleMode::S256b => ModeFlags::empty(),
            SwizzleMode::D256b => ModeFlags::DISPLAY,
            SwizzleMode::S4kb => ModeFlags::THICK,
            SwizzleMode::D4kb => ModeFlags::DISPLAY,
            SwizzleMode::S4kbX => ModeFlags::XOR.union(ModeFlags::THICK),
            SwizzleMode::D4kbX => ModeFlags::XOR.union(ModeFlags::DISPLAY),
            SwizzleMode::S64kb => ModeFlags::THICK,
            SwizzleMode::D64kb => ModeFlags::DISPLAY,
            SwizzleMode::S64kbX | SwizzleMode::S256kbX => ModeFlags::XOR.union(ModeFlags::THICK),
            SwizzleMode::D64kbX | SwizzleMode::D256kbX => {
                ModeFlags::XOR.union(ModeFlags::DISPLAY)
            }
            SwizzleMode::Z64kbX
            | SwizzleMode::R64kbX
            | SwizzleMode::Z256kbX
            | SwizzleMode::R256kbX => ModeFlags::XOR.union(ModeFlags::MSAA),
        }
    }

    /// Whether pipe and packer bits XOR into addresses for this mode.
    #[inline]
    pub const fn is_xor(self) -> bool {
        self.flags().contains(ModeFlags::XOR)
    }

    /// log2 of the block byte size, [None] for [SwizzleMode::Linear].
    #[inline]
    pub const fn block_size_log2(self) -> Option<u32> {
        self.class().block_size_log2()
    }

    /// The corresponding single bit mode set.
    #[inline]
    pub const fn bit(self) -> SwizzleModeSet {
        SwizzleModeSet::from_bits_truncate(1 << self as u32)
    }
}
