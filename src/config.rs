//! Decoding of the device's global addressing configuration.
use crate::AddrError;

// Register field layout, low to high:
//   [2:0]  log2 pipe count, 0..=6
//   [5:3]  pipe interleave size encoding, 256 << e bytes, e in 0..=3
//   [8:6]  log2 packer count, 0..=3
//   [11:9] log2 shader array count, 0..=2
const PIPES_SHIFT: u32 = 0;
const INTERLEAVE_SHIFT: u32 = 3;
const PACKERS_SHIFT: u32 = 6;
const SHADER_ARRAYS_SHIFT: u32 = 9;
const FIELD_MASK: u32 = 0x7;

pub(crate) const MAX_PIPES_LOG2: u32 = 6;
pub(crate) const MAX_PACKERS_LOG2: u32 = 3;
const MAX_INTERLEAVE_ENCODING: u32 = 3;
const MAX_SHADER_ARRAYS_LOG2: u32 = 2;

/// The device's global addressing parameters, decoded once.
///
/// Every calculator takes the configuration by shared reference. Nothing
/// mutates it after [AddrConfig::from_register] succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddrConfig {
    pipes_log2: u32,
    pipe_interleave_log2: u32,
    packers_log2: u32,
    shader_arrays_log2: u32,
}

impl AddrConfig {
    /// Decodes the addressing configuration register.
    ///
    /// Returns [AddrError::InvalidParams] for any unrecognized field
    /// encoding. Decoding either fully succeeds or produces nothing.
    pub fn from_register(register: u32) -> Result<Self, AddrError> {
        let pipes_log2 = (register >> PIPES_SHIFT) & FIELD_MASK;
        let interleave = (register >> INTERLEAVE_SHIFT) & FIELD_MASK;
        let packers_log2 = (register >> PACKERS_SHIFT) & FIELD_MASK;
        let shader_arrays_log2 = (register >> SHADER_ARRAYS_SHIFT) & FIELD_MASK;

        if pipes_log2 > MAX_PIPES_LOG2 {
            return Err(AddrError::InvalidParams("unrecognized pipe count"));
        }
        if interleave > MAX_INTERLEAVE_ENCODING {
            return Err(AddrError::InvalidParams(
                "unrecognized pipe interleave size",
            ));
        }
        if packers_log2 > MAX_PACKERS_LOG2 {
            return Err(AddrError::InvalidParams("unrecognized packer count"));
        }
        if shader_arrays_log2 > MAX_SHADER_ARRAYS_LOG2 {
            return Err(AddrError::InvalidParams("unrecognized shader array count"));
        }

        let config = Self {
            pipes_log2,
            pipe_interleave_log2: 8 + interleave,
            packers_log2,
            shader_arrays_log2,
        };
        log::debug!(
            "decoded addressing config: {} pipes, {} byte interleave, {} packers, {} shader arrays",
            config.num_pipes(),
            config.pipe_interleave_bytes(),
            1u32 << config.packers_log2,
            1u32 << config.shader_arrays_log2,
        );
        Ok(config)
    }

    /// log2 of the pipe count.
    #[inline]
    pub const fn pipes_log2(&self) -> u32 {
        self.pipes_log2
    }

    /// Number of memory pipes.
    #[inline]
    pub const fn num_pipes(&self) -> u32 {
        1 << self.pipes_log2
    }

    /// log2 of the pipe interleave size in bytes.
    ///
    /// This is the lowest address bit that pipe swizzling may touch; the
    /// caller supplied pipe/bank salt is applied starting at this bit.
    #[inline]
    pub const fn pipe_interleave_log2(&self) -> u32 {
        self.pipe_interleave_log2
    }

    /// Pipe interleave size in bytes.
    #[inline]
    pub const fn pipe_interleave_bytes(&self) -> u64 {
        1 << self.pipe_interleave_log2
    }

    /// log2 of the packer count.
    #[inline]
    pub const fn packers_log2(&self) -> u32 {
        self.packers_log2
    }

    /// log2 of the shader array count.
    #[inline]
    pub const fn shader_arrays_log2(&self) -> u32 {
        self.shader_arrays_log2
    }

    /// Index of this configuration in the hardware enumeration order:
    /// pipe count doublings crossed with the packer bucket. The pattern
    /// cache reproduces this order when indexing generated entries.
    #[inline]
    pub(crate) const fn config_class(&self) -> u32 {
        self.pipes_log2 * (MAX_PACKERS_LOG2 + 1) + self.packers_log2
    }

    /// Whether 256 KiB display blocks are available on this configuration.
    ///
    /// Small device families route scanout through a narrower path and
    /// disallow the largest display block size.
    #[inline]
    pub(crate) const fn allows_256kb_display(&self) -> bool {
        self.pipes_log2 >= 4
    }
}
