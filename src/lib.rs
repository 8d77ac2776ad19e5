#![cfg_attr(not(test), no_std)]
#![cfg_attr(
    any(target_arch = "mips", target_arch = "mips64"),
    feature(asm_experimental_arch)
)]

//! Guest side of the Karma VMM paravirtual interface.
//!
//! - [`command`]: packs device id, opcode and slot count into one word
//! - [`hypercall`]: traps into the VMM with that word and up to four
//!   in/out register slots, through the backend picked at boot
//! - [`vchip`]: the karma GIC, a virtual interrupt controller driven by
//!   bitmasks in memory shared with the host
//!
//! Device adapters used during bring-up live under [`devices`].

pub mod arch;
pub mod command;
pub mod device;
pub mod devices;
pub mod dtb;
pub mod error;
pub mod global;
pub mod hypercall;
pub mod platform;
pub mod shared;
pub mod vchip;

pub use command::{make_command, set_register_count, Command};
pub use device::DeviceId;
pub use error::{Error, Result};
pub use hypercall::Hypercall;
pub use shared::{GicSharedState, GuestPlatform, Published};
pub use vchip::{AckPolicy, Dispatch, KarmaGic};

#[cfg(any(target_arch = "x86_64", target_arch = "mips", target_arch = "mips64"))]
pub use arch::Backend;
