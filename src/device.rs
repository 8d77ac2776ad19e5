//! Karma device table
//!
//! Device ids and their per-device opcode tables. Opcodes are always
//! even: bit 0 of the opcode field is the write flag, set by the adapter
//! when the host consumes a value (see [`crate::command::Command::with_write`]).

use crate::platform::DEVICE_SHIFT;

/// Virtual device classes addressed through the command word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceId {
    /// Generic VMM services (clock, exit)
    Karma = 0,
    Gic = 1,
    Timer = 2,
    Serial = 3,
    Net = 4,
    Framebuffer = 5,
    Block = 6,
    Pci = 7,
    /// Inter-VM shared memory, producer side
    ChrProducer = 8,
    /// Inter-VM shared memory, consumer side
    ChrConsumer = 9,
    /// Memory management (DMA window, address translation)
    Mem = 10,
}

impl DeviceId {
    pub const ALL: [DeviceId; 11] = [
        DeviceId::Karma,
        DeviceId::Gic,
        DeviceId::Timer,
        DeviceId::Serial,
        DeviceId::Net,
        DeviceId::Framebuffer,
        DeviceId::Block,
        DeviceId::Pci,
        DeviceId::ChrProducer,
        DeviceId::ChrConsumer,
        DeviceId::Mem,
    ];

    /// The id placed in its command-word field.
    #[inline]
    pub const fn bits(self) -> usize {
        (self as usize) << DEVICE_SHIFT
    }

    /// Look up the device whose field bits are `bits` (other bits ignored).
    pub fn from_bits(bits: usize) -> Option<Self> {
        let id = (bits & crate::platform::DEVICE_MASK) >> DEVICE_SHIFT;
        Self::ALL.iter().copied().find(|d| *d as usize == id)
    }
}

pub mod karma {
    pub const GET_KHZ_CPU: u16 = 0x00;
    pub const EXIT: u16 = 0x02;
}

pub mod gic {
    pub const ENABLE: u16 = 0x02;
    pub const ACK: u16 = 0x04;
    pub const SET_CPU: u16 = 0x06;
    pub const GET_BASE_REG: u16 = 0x08;
}

pub mod timer {
    pub const ENABLE: u16 = 0x00;
    pub const INIT: u16 = 0x02;
    pub const GET_BASE_REG: u16 = 0x04;
}

pub mod serial {
    pub const EARLY_PUTCHAR: u16 = 0x06;
}

pub mod mem {
    pub const DMA_BASE: u16 = 0x00;
    pub const GUEST_PHYS_TO_HOST_PHYS: u16 = 0x02;
}

pub mod pci {
    pub const PROBE: u16 = 0x00;
    pub const CONF1_READ: u16 = 0x02;
    pub const CONF1_WRITE: u16 = 0x04;
    pub const ENABLE_IRQ: u16 = 0x06;
    pub const IOMAP: u16 = 0x08;
}
