/// x86-64 hypercall traps
///
/// Register convention shared by both flavours:
/// - RCX: command word
/// - RDX, RBX, RSI, RDI: argument slots 1-4, in/out
///
/// RBX cannot be named as an asm operand, so slot 2 travels through a
/// scratch register that is exchanged with RBX around the trap.
use crate::arch::traits::HypercallTrap;
use crate::command::Command;

macro_rules! karma_trap {
    ($(#[$meta:meta])* $name:ident, $insn:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl HypercallTrap for $name {
            #[inline]
            fn trap0(&self, cmd: Command) {
                // SAFETY: the trap exits to the VMM and resumes at the next
                // instruction; the host may write guest memory.
                unsafe {
                    core::arch::asm!(
                        $insn,
                        in("rcx") cmd.raw(),
                        options(nostack),
                    );
                }
            }

            #[inline]
            fn trap1(&self, cmd: Command, r1: &mut usize) {
                unsafe {
                    core::arch::asm!(
                        $insn,
                        in("rcx") cmd.raw(),
                        inout("rdx") *r1,
                        options(nostack),
                    );
                }
            }

            #[inline]
            fn trap2(&self, cmd: Command, r1: &mut usize, r2: &mut usize) {
                unsafe {
                    core::arch::asm!(
                        "xchg {r2}, rbx",
                        $insn,
                        "xchg {r2}, rbx",
                        r2 = inout(reg) *r2,
                        in("rcx") cmd.raw(),
                        inout("rdx") *r1,
                        options(nostack),
                    );
                }
            }

            #[inline]
            fn trap3(&self, cmd: Command, r1: &mut usize, r2: &mut usize, r3: &mut usize) {
                unsafe {
                    core::arch::asm!(
                        "xchg {r2}, rbx",
                        $insn,
                        "xchg {r2}, rbx",
                        r2 = inout(reg) *r2,
                        in("rcx") cmd.raw(),
                        inout("rdx") *r1,
                        inout("rsi") *r3,
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
                        "xchg {r2}, rbx",
                        $insn,
                        "xchg {r2}, rbx",
                        r2 = inout(reg) *r2,
                        in("rcx") cmd.raw(),
                        inout("rdx") *r1,
                        inout("rsi") *r3,
                        inout("rdi") *r4,
                        options(nostack),
                    );
                }
            }
        }
    };
}

karma_trap!(
    /// AMD-V host: `vmmcall`
    Svm,
    "vmmcall"
);

karma_trap!(
    /// Intel VT-x host: `vmcall`
    Vmx,
    "vmcall"
);
