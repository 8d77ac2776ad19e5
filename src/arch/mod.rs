//! Architecture-specific code
//!
//! This module contains the hypercall trap backends for x86-64 (SVM and
//! VMX flavours) and MIPS VZ, plus the [`Backend`] sum type that the
//! rest of the crate dispatches through.

pub mod mips;
pub mod traits;

#[cfg(target_arch = "x86_64")]
pub mod x86;

#[cfg(any(target_arch = "x86_64", target_arch = "mips", target_arch = "mips64"))]
mod backend;

#[cfg(any(target_arch = "x86_64", target_arch = "mips", target_arch = "mips64"))]
pub use backend::Backend;
