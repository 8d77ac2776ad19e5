//! MIPS VZ Karma guest support
//!
//! The VZ guest exits to the VMM through `hypcall`. There is a single
//! trap encoding: the base opcode with the hypcall code placed at
//! bits 11..21. Register convention:
//! - $a0: command word
//! - $a1, $a2, $a3, $t0: argument slots 1-4, in/out

use crate::platform::{HYPCALL_CODE_MASK, HYPCALL_CODE_SHIFT, HYPCALL_OPCODE};

/// Compose the `hypcall` instruction word for `code` (10-bit field).
pub const fn hypcall_word(code: u32) -> u32 {
    HYPCALL_OPCODE | ((code & HYPCALL_CODE_MASK) << HYPCALL_CODE_SHIFT)
}

#[cfg(any(target_arch = "mips", target_arch = "mips64"))]
mod trap;

#[cfg(any(target_arch = "mips", target_arch = "mips64"))]
pub use trap::Vz;
