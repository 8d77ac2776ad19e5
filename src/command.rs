//! Karma command word encoding
//!
//! A command word is one machine word handed to the host in the
//! command register of every hypercall:
//!
//! ```text
//!  bits 27..   unused (zero)
//!  bits 24..26 argument-register count (0-4, 3-bit field)
//!  bits 16..23 device id
//!  bits  0..15 opcode (bit 0 = write flag)
//! ```
//!
//! Encoding is pure bit placement. Range checking is the caller's
//! contract: device ids come from [`DeviceId`], opcodes from the
//! per-device tables in [`crate::device`].

use core::fmt;

use crate::device::DeviceId;
use crate::platform::{DEVICE_MASK, OPCODE_MASK, REG_COUNT_MASK, REG_COUNT_SHIFT};

/// Encoded command word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Command(usize);

impl Command {
    /// Wrap an already encoded word.
    #[inline]
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }

    /// Opcode field, write flag included.
    #[inline]
    pub const fn opcode(self) -> u16 {
        (self.0 & OPCODE_MASK) as u16
    }

    /// Device field, still in place.
    #[inline]
    pub const fn device_bits(self) -> usize {
        self.0 & DEVICE_MASK
    }

    pub fn device(self) -> Option<DeviceId> {
        DeviceId::from_bits(self.0)
    }

    /// Argument-register count carried in bits 24..26.
    #[inline]
    pub const fn register_count(self) -> usize {
        (self.0 >> REG_COUNT_SHIFT) & REG_COUNT_MASK
    }

    #[inline]
    pub const fn is_write(self) -> bool {
        self.0 & 1 != 0
    }

    /// Mark the call as a write: the host consumes the argument.
    #[inline]
    pub const fn with_write(self) -> Self {
        Self(self.0 | 1)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("device", &self.device())
            .field("opcode", &format_args!("{:#x}", self.opcode()))
            .field("regs", &self.register_count())
            .finish()
    }
}

impl From<Command> for usize {
    fn from(cmd: Command) -> usize {
        cmd.0
    }
}

/// Pack a device id and an opcode into one command word.
#[inline]
pub const fn make_command(device: DeviceId, opcode: u16) -> Command {
    Command(device.bits() | opcode as usize)
}

/// OR `count` (masked to 3 bits) into bits 24..26 of `cmd`.
///
/// Only the transport's 1-4 argument entry points call this; the
/// zero-argument path leaves the field empty.
#[inline]
pub const fn set_register_count(cmd: Command, count: usize) -> Command {
    Command(cmd.0 | ((count & REG_COUNT_MASK) << REG_COUNT_SHIFT))
}
