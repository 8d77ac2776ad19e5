//! x86-64 Karma guest support
//!
//! This module provides:
//! - CPUID vendor probe selecting the trap flavour
//! - `vmmcall` (SVM) and `vmcall` (VMX) hypercall traps

pub mod cpuid;
pub mod trap;

pub use cpuid::*;
pub use trap::*;
