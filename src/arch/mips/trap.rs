/// VZ `hypcall` trap
use crate::arch::traits::HypercallTrap;
use crate::command::Command;
use crate::platform::HYPCALL_KARMA_DEV_OP;

use super::hypcall_word;

const KARMA_DEV_OP: u32 = hypcall_word(HYPCALL_KARMA_DEV_OP);

/// The only MIPS backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vz;

impl HypercallTrap for Vz {
    #[inline]
    fn trap0(&self, cmd: Command) {
        // SAFETY: hypcall exits to the VMM and resumes at the next
        // instruction; the host may write guest memory.
        unsafe {
            core::arch::asm!(
                ".word {op}",
                op = const KARMA_DEV_OP,
                in("$4") cmd.raw(),
                options(nostack),
            );
        }
    }

    #[inline]
    fn trap1(&self, cmd: Command, r1: &mut usize) {
        unsafe {
            core::arch::asm!(
                ".word {op}",
                op = const KARMA_DEV_OP,
                in("$4") cmd.raw(),
                inout("$5") *r1,
                options(nostack),
            );
        }
    }

    #[inline]
    fn trap2(&self, cmd: Command, r1: &mut usize, r2: &mut usize) {
        unsafe {
            core::arch::asm!(
                ".word {op}",
                op = const KARMA_DEV_OP,
                in("$4") cmd.raw(),
                inout("$5") *r1,
                inout("$6") *r2,
                options(nostack),
            );
        }
    }

    #[inline]
    fn trap3(&self, cmd: Command, r1: &mut usize, r2: &mut usize, r3: &mut usize) {
        unsafe {
            core::arch::asm!(
                ".word {op}",
                op = const KARMA_DEV_OP,
                in("$4") cmd.raw(),
                inout("$5") *r1,
                inout("$6") *r2,
                inout("$7") *r3,
                options(nostack),
            );
        }
    }

    #[inline]
    fn trap4(
        &self,
        cmd: Command,
        r1: &mut usize,
        r2: &mut usize,
        r3: &mut usize,
        r4: &mut usize,
    ) {
        unsafe {
            core::arch::asm!(
                ".word {op}",
                op = const KARMA_DEV_OP,
                in("$4") cmd.raw(),
                inout("$5") *r1,
                inout("$6") *r2,
                inout("$7") *r3,
                inout("$8") *r4,
                options(nostack),
            );
        }
    }
}
