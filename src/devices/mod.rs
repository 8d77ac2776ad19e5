//! Guest-side Karma device adapters
//!
//! Thin helpers over [`Hypercall`](crate::hypercall::Hypercall) for the
//! devices the core depends on during bring-up. Each one only builds a
//! command word, moves arguments through the slots and interprets the
//! host's answer; device logic stays with the guest drivers.
//!
//! Requests too large for the register slots are handed over by address
//! through [`Published`](crate::shared::Published).

pub mod karma;
pub mod mem;
pub mod pci;
pub mod serial;
