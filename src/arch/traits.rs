//! Architecture-Portable Trait Definitions
//!
//! These traits sit at the seams between the protocol core and the
//! trap instructions of each architecture, so the command/vIRQ logic
//! never names a concrete instruction.

use crate::command::Command;
use crate::error::Result;

/// One trap into the host per call.
///
/// `cmd` goes into the command register unchanged; the register count
/// has already been applied by [`crate::hypercall::Hypercall`]. Every
/// `rN` is in/out: the host may overwrite it.
pub trait HypercallTrap {
    fn trap0(&self, cmd: Command);
    fn trap1(&self, cmd: Command, r1: &mut usize);
    fn trap2(&self, cmd: Command, r1: &mut usize, r2: &mut usize);
    fn trap3(&self, cmd: Command, r1: &mut usize, r2: &mut usize, r3: &mut usize);
    fn trap4(
        &self,
        cmd: Command,
        r1: &mut usize,
        r2: &mut usize,
        r3: &mut usize,
        r4: &mut usize,
    );
}

impl<T: HypercallTrap + ?Sized> HypercallTrap for &T {
    fn trap0(&self, cmd: Command) {
        (**self).trap0(cmd)
    }
    fn trap1(&self, cmd: Command, r1: &mut usize) {
        (**self).trap1(cmd, r1)
    }
    fn trap2(&self, cmd: Command, r1: &mut usize, r2: &mut usize) {
        (**self).trap2(cmd, r1, r2)
    }
    fn trap3(&self, cmd: Command, r1: &mut usize, r2: &mut usize, r3: &mut usize) {
        (**self).trap3(cmd, r1, r2, r3)
    }
    fn trap4(
        &self,
        cmd: Command,
        r1: &mut usize,
        r2: &mut usize,
        r3: &mut usize,
        r4: &mut usize,
    ) {
        (**self).trap4(cmd, r1, r2, r3, r4)
    }
}

/// Interrupt chip operations as the guest's IRQ framework calls them.
/// `irq` is the guest-framework interrupt number.
pub trait InterruptChip {
    fn mask(&self, irq: u32) -> Result<()>;
    fn unmask(&self, irq: u32) -> Result<()>;
    fn mask_ack(&self, irq: u32) -> Result<()>;
    /// Disable is mask on every karma chip.
    fn disable(&self, irq: u32) -> Result<()> {
        self.mask(irq)
    }
}
