//! Crate error type

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A hypercall was requested before `global::init` resolved a backend.
    #[error("hypercall transport used before backend resolution")]
    TransportUninitialized,

    #[error("karma gic controller {0} out of range")]
    ControllerOutOfRange(u32),

    #[error("irq {0} is not served by this controller")]
    LineOutOfRange(u32),

    #[error("failed to map host range {phys:#x} (+{size:#x})")]
    MapFailed { phys: usize, size: usize },

    #[error("shared block needs {needed:#x} bytes, window is {window:#x}")]
    SharedBlockTooSmall { needed: usize, window: usize },

    #[error("host address {0:#x} is misaligned")]
    Misaligned(usize),

    /// The host answered with its failure sentinel.
    #[error("host rejected the request")]
    HostRejected,

    #[error("no such device")]
    NoDevice,

    #[error("invalid device tree blob")]
    InvalidDeviceTree,

    #[error("empty cpu mask")]
    EmptyCpuMask,

    /// Address arithmetic on a host-provided value wrapped.
    #[error("address arithmetic overflow")]
    AddressOverflow,
}
