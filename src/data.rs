//! Generated hardware description asset for swizzle bit orderings.
//!
//! This module is data, not logic: the tables below describe, for each
//! swizzle family and element size class, the order in which coordinate
//! bits fill the 256 byte micro tile (the address bits above the element
//! and below bit 8). The equation builder in `pattern` extends these
//! orders into full block equations. Treat the tables as an opaque,
//! versioned asset; regenerating them for a new hardware revision must not
//! require touching any other module.

/// Version of the pattern tables. Bumped when the hardware description
/// this asset was generated from changes.
pub const PATTERN_ASSET_VERSION: u32 = 2;

/// Axis code for an x coordinate bit. Low bits hold the bit index.
pub const AXIS_X: u8 = 0x00;
/// Axis code for a y coordinate bit.
pub const AXIS_Y: u8 = 0x40;
/// Mask selecting the axis from a code.
pub const AXIS_MASK: u8 = 0xc0;
/// Mask selecting the coordinate bit index from a code.
pub const INDEX_MASK: u8 = 0x3f;

const fn x(i: u8) -> u8 {
    AXIS_X | i
}

const fn y(i: u8) -> u8 {
    AXIS_Y | i
}

/// Micro tile fill order for the standard family, indexed by element size
/// log2 (8 through 128 bits per element). Entry `e` holds the
/// `8 - e` address bits above the element, lowest first.
pub const MICRO_ORDER_STANDARD: [&[u8]; 5] = [
    &[x(0), y(0), x(1), y(1), x(2), y(2), x(3), y(3)],
    &[x(0), y(0), x(1), y(1), x(2), y(2), x(3)],
    &[x(0), y(0), x(1), y(1), x(2), y(2)],
    &[x(0), y(0), x(1), y(1), x(2)],
    &[x(0), y(0), x(1), y(1)],
];

/// Micro tile fill order for the display family. Two x bits lead so that
/// scanout bursts stay contiguous within a row.
pub const MICRO_ORDER_DISPLAY: [&[u8]; 5] = [
    &[x(0), x(1), y(0), y(1), x(2), y(2), x(3), y(3)],
    &[x(0), x(1), y(0), y(1), x(2), y(2), x(3)],
    &[x(0), x(1), y(0), y(1), x(2), y(2)],
    &[x(0), x(1), y(0), y(1), x(2)],
    &[x(0), x(1), y(0), y(1)],
];

/// Micro tile fill order for the depth family. The y bit leads; sample
/// bits, when present, are inserted below these by the equation builder.
pub const MICRO_ORDER_DEPTH: [&[u8]; 5] = [
    &[y(0), x(0), y(1), x(1), y(2), x(2), y(3), x(3)],
    &[y(0), x(0), y(1), x(1), y(2), x(2), x(3)],
    &[y(0), x(0), y(1), x(1), y(2), x(2)],
    &[y(0), x(0), y(1), x(1), x(2)],
    &[y(0), x(0), y(1), x(1)],
];

/// Micro tile fill order for the render family.
pub const MICRO_ORDER_RENDER: [&[u8]; 5] = [
    &[x(0), y(0), y(1), x(1), x(2), y(2), y(3), x(3)],
    &[x(0), y(0), y(1), x(1), x(2), y(2), x(3)],
    &[x(0), y(0), y(1), x(1), x(2), y(2)],
    &[x(0), y(0), y(1), x(1), x(2)],
    &[x(0), y(0), y(1), x(1)],
];
